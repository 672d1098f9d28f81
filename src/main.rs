mod args;

use args::Cli;
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use swarmctl::{BackupStore, Dispatcher, DockerCli, Lifecycle, Settings};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let cli = match Cli::try_parse_from(args::normalize_args(std::env::args_os())) {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // --help and --version are not failures
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    init_tracing(cli.verbose);

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    let invocation = cli.invocation();
    // Reject a bad action selection before reading config or touching the cluster
    invocation.action()?;

    let settings = Settings::resolve(cli.overrides())?;
    tracing::debug!(?settings, "Starting");

    let cluster = Arc::new(DockerCli::new(settings.docker_bin.clone()));
    let lifecycle = Lifecycle::new(cluster).with_parallelism(settings.parallel);
    let dispatcher = Dispatcher::new(lifecycle, BackupStore::new(settings.backup_file));

    let outcome = dispatcher.dispatch(&invocation).await?;
    println!("{outcome}");
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "swarmctl=debug" } else { "swarmctl=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}
