//! Import pipeline configuration.
//!
//! Constructed explicitly and passed into the pipeline; no module-level
//! state. `from_env` exists for deployments that need to register extra
//! league renames without a release.
//!
//! Environment variables:
//! - `TURNERING_LEAGUE_ALIASES`: extra equivalence pairs as
//!   `Old Name=New Name;Other Old=Other New`

use crate::leagues::LeagueEquivalences;

/// Cap on the number of problems quoted in a validation failure message.
pub const DEFAULT_MAX_REPORTED_PROBLEMS: usize = 10;

/// Configuration for one staged-import publish run.
#[derive(Debug, Clone)]
pub struct ImportConfig {
    /// League rename equivalence classes used by hold-id resolution and
    /// gender inference.
    pub leagues: LeagueEquivalences,
    /// Cap on the number of problems quoted in a validation failure.
    pub max_reported_problems: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            leagues: LeagueEquivalences::default(),
            max_reported_problems: DEFAULT_MAX_REPORTED_PROBLEMS,
        }
    }
}

impl ImportConfig {
    /// Default configuration plus any league alias pairs registered via
    /// `TURNERING_LEAGUE_ALIASES`.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(pairs) = std::env::var("TURNERING_LEAGUE_ALIASES") {
            for pair in pairs.split(';') {
                if let Some((a, b)) = pair.split_once('=') {
                    config.leagues = config.leagues.with_pair(a, b);
                }
            }
        }

        config
    }
}
