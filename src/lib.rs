//! Floorball Tournament Import Core
//!
//! Staged-import normalization and stable-identity resolution for a
//! floorball tournament platform: spreadsheet exports of clubs, teams and
//! matches are normalized, deduplicated and linked against the current
//! team universe. Surrogate ids are deterministic hashes of natural keys,
//! so rosters, lineups and live event logs keyed by hold-id survive full
//! re-imports even though every row is regenerated.

pub mod config;
pub mod dates;
pub mod gender;
pub mod identity;
pub mod leagues;
pub mod logging;
pub mod publish;
pub mod resolve;
pub mod row;
pub mod staged;
pub mod store;
pub mod teams;
pub mod text;
