//! Resolves user-supplied name fragments to deployed service names.

use crate::cluster::ClusterAdapter;
use crate::error::{Result, SwarmError};
use tracing::{debug, warn};

/// What to do with a fragment that matches no deployed service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnmatchedPolicy {
    /// Drop it with a warning.
    #[default]
    Ignore,
    /// Fail the whole invocation.
    Reject,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchOutcome {
    /// One entry per matched fragment, in fragment order. May contain duplicates.
    pub matched: Vec<String>,
    /// Fragments that matched nothing, in input order.
    pub unmatched: Vec<String>,
}

/// Splits a comma separated list, dropping blank entries.
pub fn split_fragments(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// For each fragment, picks the first live name containing it (case-insensitive).
///
/// Empty fragments are skipped: they would match every name.
pub fn match_fragments<S: AsRef<str>>(live: &[String], fragments: &[S]) -> MatchOutcome {
    let lowered: Vec<String> = live.iter().map(|n| n.to_lowercase()).collect();
    let mut outcome = MatchOutcome::default();

    for fragment in fragments {
        let fragment = fragment.as_ref();
        if fragment.is_empty() {
            continue;
        }
        let needle = fragment.to_lowercase();
        match lowered.iter().position(|name| name.contains(&needle)) {
            Some(idx) => outcome.matched.push(live[idx].clone()),
            None => outcome.unmatched.push(fragment.to_string()),
        }
    }
    outcome
}

/// Lists live services once and matches `fragments` against them.
pub async fn filter_services<S: AsRef<str>>(
    cluster: &dyn ClusterAdapter,
    fragments: &[S],
    policy: UnmatchedPolicy,
) -> Result<MatchOutcome> {
    if fragments.iter().all(|f| f.as_ref().is_empty()) {
        return Ok(MatchOutcome::default());
    }

    let live = cluster.list_services().await?;
    let outcome = match_fragments(&live, fragments);
    debug!(matched = ?outcome.matched, unmatched = ?outcome.unmatched, "Filtered services");

    if !outcome.unmatched.is_empty() {
        match policy {
            UnmatchedPolicy::Ignore => {
                warn!(fragments = ?outcome.unmatched, "No deployed service matches, skipping")
            }
            UnmatchedPolicy::Reject => {
                return Err(SwarmError::UnmatchedServices(outcome.unmatched))
            }
        }
    }
    Ok(outcome)
}
