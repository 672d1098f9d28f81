use clap::Parser;
use std::ffi::OsString;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use swarmctl::matcher::split_fragments;
use swarmctl::{Invocation, Overrides, UnmatchedPolicy};

#[derive(Parser, Debug)]
#[command(name = "swarmctl")]
#[command(version)]
#[command(about = "Stop, restart, back up and restore Docker Swarm services", long_about = None)]
pub(crate) struct Cli {
    /// Comma separated names of services (case-insensitive substrings)
    #[arg(long, value_name = "LIST", default_value = "")]
    pub services: String,

    /// Restart the specified services
    #[arg(long)]
    pub restart: bool,

    /// Stop the specified services
    #[arg(long)]
    pub stop: bool,

    /// Backup running services
    #[arg(long)]
    pub backup: bool,

    /// Restore services from backup
    #[arg(long)]
    pub restore: bool,

    /// Operate on all running services
    #[arg(long)]
    pub all: bool,

    /// Fail if any requested service matches nothing
    #[arg(long)]
    pub strict: bool,

    /// How many services to operate on at once (default: 1)
    #[arg(long, value_name = "N")]
    pub parallel: Option<NonZeroUsize>,

    /// Backup file to write or restore (default: swarm-service-backup.txt)
    #[arg(long, value_name = "FILE")]
    pub backup_file: Option<PathBuf>,

    /// Log every control-plane command
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn invocation(&self) -> Invocation {
        Invocation {
            services: split_fragments(&self.services),
            restart: self.restart,
            stop: self.stop,
            backup: self.backup,
            restore: self.restore,
            all: self.all,
            unmatched: if self.strict {
                UnmatchedPolicy::Reject
            } else {
                UnmatchedPolicy::Ignore
            },
        }
    }

    pub fn overrides(&self) -> Overrides {
        Overrides {
            backup_file: self.backup_file.clone(),
            parallel: self.parallel,
        }
    }
}

/// Accepts Go-style single-dash long flags (`-services=a,b`, `-restart`)
/// by rewriting them to `--services=a,b`, `--restart`.
///
/// Single-letter short flags and everything after `--` are left alone.
pub(crate) fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut out = Vec::new();
    let mut passthrough = false;

    for (idx, arg) in args.into_iter().enumerate() {
        if idx == 0 || passthrough {
            out.push(arg);
            continue;
        }
        let rewritten = match arg.to_str() {
            Some("--") => {
                passthrough = true;
                None
            }
            Some(s) if is_single_dash_long(s) => Some(OsString::from(format!("-{s}"))),
            _ => None,
        };
        out.push(rewritten.unwrap_or(arg));
    }
    out
}

fn is_single_dash_long(arg: &str) -> bool {
    let Some(rest) = arg.strip_prefix('-') else {
        return false;
    };
    let name = rest.split('=').next().unwrap_or_default();
    !rest.starts_with('-') && name.len() > 1 && name.chars().all(|c| c.is_ascii_alphabetic() || c == '-')
}
