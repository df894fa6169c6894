//! End-to-end publish pipeline: staged rows to a canonical snapshot.
//!
//! Each publish run recomputes the full picture from one staged import
//! (nothing incremental): normalize the three sheets, validate, build the
//! club and team universe, then enrich every match with an inferred gender
//! and resolved hold-ids. Surrogate ids are deterministic hashes of
//! natural keys, so republishing the same import yields byte-identical
//! records and externally-keyed data survives the replacement.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::ImportConfig;
use crate::gender::Gender;
use crate::identity::{match_natural_key, stable_id};
use crate::resolve::{attach_hold_ids, infer_match_gender, HoldIdResolver, TeamGenderIndex};
use crate::row::Row;
use crate::staged::{
    normalize_staged_clubs, normalize_staged_matches, normalize_staged_teams,
    validate_staged_matches, Validation,
};
use crate::store::SnapshotStore;
use crate::teams::{dedupe_teams, ClubIndex, ClubRecord, TeamRecord};
use rustc_hash::FxHashMap;

/// One staged import: a full snapshot of the three sheets, as stored by
/// the upload layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagedImport {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub filename: Option<String>,
    pub kampe: Vec<Row>,
    pub holdliste: Vec<Row>,
    pub klubliste: Vec<Row>,
}

/// A referee identity on a match. Only produced when both the name and
/// the external id are present; partial links are not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Referee {
    pub name: String,
    pub id: String,
}

/// A canonical match row with resolved team links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: String,
    pub external_id: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub venue: Option<String>,
    pub result: Option<String>,
    pub referee1: Option<Referee>,
    pub referee2: Option<Referee>,
    pub gender: Option<Gender>,
    pub league: Option<String>,
    pub stage: Option<String>,
    pub pool: Option<String>,
    pub home_team: String,
    pub home_hold_id: Option<String>,
    pub away_team: String,
    pub away_hold_id: Option<String>,
    pub source_import_id: String,
}

/// How well hold-id resolution went for one snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldIdResolutionStats {
    pub matches_total: usize,
    pub home_resolved: usize,
    pub away_resolved: usize,
    pub both_resolved: usize,
    pub any_resolved: usize,
}

/// The canonical output of one publish run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishedSnapshot {
    pub source_import_id: String,
    pub clubs: Vec<ClubRecord>,
    pub teams: Vec<TeamRecord>,
    pub matches: Vec<MatchRecord>,
    pub resolution: HoldIdResolutionStats,
}

/// Operator-facing summary of a publish run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishReport {
    pub import_id: String,
    pub filename: Option<String>,
    pub resolution: HoldIdResolutionStats,
    /// Club records written.
    pub club_count: usize,
    /// Staged team rows consumed (pre-merge).
    pub team_count: usize,
    /// Staged match rows consumed (pre-dedupe).
    pub match_count: usize,
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Ingen import fundet endnu.")]
    NoImport,
    #[error("Kan ikke uploade til databasen pga. fejl i Kampprogram:\n{message}")]
    Validation { message: String },
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

fn referee_link(name: &str, id: &str) -> Option<Referee> {
    if name.is_empty() || id.is_empty() {
        return None;
    }
    Some(Referee {
        name: name.to_string(),
        id: id.to_string(),
    })
}

/// Build the canonical snapshot for one staged import.
///
/// Fails with [`PublishError::Validation`] when the match programme
/// contains malformed times; every other data oddity degrades to skipped
/// rows or unresolved links, never to a partial snapshot.
pub fn build_snapshot(
    import: &StagedImport,
    config: &ImportConfig,
) -> Result<PublishedSnapshot, PublishError> {
    let clubs = normalize_staged_clubs(&import.klubliste);
    let teams = normalize_staged_teams(&import.holdliste);
    let matches = normalize_staged_matches(&import.kampe);

    debug!(
        clubs = clubs.len(),
        teams = teams.len(),
        matches = matches.len(),
        import_id = %import.id,
        "normalized staged rows"
    );

    if let Validation::Failed { message } =
        validate_staged_matches(&matches, config.max_reported_problems)
    {
        return Err(PublishError::Validation { message });
    }

    let gender_index = TeamGenderIndex::build(&teams, &config.leagues);

    // Stitch seasons first: rows without a hold-id adopt the one their
    // name unambiguously resolves to, so renames collapse onto one team.
    let teams = attach_hold_ids(&teams, &config.leagues);

    // The club list is frequently incomplete; the team list fills the gaps.
    let club_index = ClubIndex::build(&clubs, &teams);
    let team_records = dedupe_teams(&teams, &club_index);

    // Matches resolve against every staged name variant, not just the
    // merged record's final name.
    let resolver = HoldIdResolver::from_staged(&teams, &config.leagues);

    // Dedupe matches by stable id: first-seen position, last-seen value.
    let mut match_records: Vec<MatchRecord> = Vec::new();
    let mut match_index: FxHashMap<String, usize> = FxHashMap::default();

    for m in &matches {
        let match_gender = infer_match_gender(m, &gender_index, &config.leagues);

        let id = stable_id(
            "match",
            &match_natural_key(
                m.external_id.as_deref(),
                m.date,
                &m.time_text,
                &m.home_team,
                &m.away_team,
                &m.league,
            ),
        );

        let record = MatchRecord {
            id: id.clone(),
            external_id: m.external_id.clone(),
            date: m.date,
            time: m.time,
            venue: non_empty(m.venue.clone()),
            result: non_empty(m.result.clone()),
            referee1: referee_link(&m.referee1, &m.referee1_id),
            referee2: referee_link(&m.referee2, &m.referee2_id),
            gender: match_gender,
            league: non_empty(m.league.clone()),
            stage: non_empty(m.stage.clone()),
            pool: non_empty(m.pool.clone()),
            home_team: m.home_team.clone(),
            home_hold_id: resolver
                .resolve(&m.league, match_gender, &m.home_team)
                .map(str::to_string),
            away_team: m.away_team.clone(),
            away_hold_id: resolver
                .resolve(&m.league, match_gender, &m.away_team)
                .map(str::to_string),
            source_import_id: import.id.clone(),
        };

        match match_index.get(&id) {
            None => {
                match_index.insert(id, match_records.len());
                match_records.push(record);
            }
            Some(&i) => match_records[i] = record,
        }
    }

    let resolution = resolution_stats(&match_records);
    info!(
        import_id = %import.id,
        matches_total = resolution.matches_total,
        home_resolved = resolution.home_resolved,
        away_resolved = resolution.away_resolved,
        both_resolved = resolution.both_resolved,
        "hold-id resolution complete"
    );

    Ok(PublishedSnapshot {
        source_import_id: import.id.clone(),
        clubs: club_index.into_records(),
        teams: team_records,
        matches: match_records,
        resolution,
    })
}

fn resolution_stats(matches: &[MatchRecord]) -> HoldIdResolutionStats {
    let mut stats = HoldIdResolutionStats {
        matches_total: matches.len(),
        ..Default::default()
    };
    for m in matches {
        let h = m.home_hold_id.as_deref().is_some_and(|s| !s.trim().is_empty());
        let a = m.away_hold_id.as_deref().is_some_and(|s| !s.trim().is_empty());
        if h {
            stats.home_resolved += 1;
        }
        if a {
            stats.away_resolved += 1;
        }
        if h && a {
            stats.both_resolved += 1;
        }
        if h || a {
            stats.any_resolved += 1;
        }
    }
    stats
}

/// Publish the most recent staged import through the injected store.
pub fn publish_latest(
    store: &mut dyn SnapshotStore,
    config: &ImportConfig,
) -> Result<PublishReport, PublishError> {
    let import = store.latest_import()?.ok_or(PublishError::NoImport)?;

    let staged_team_count = normalize_staged_teams(&import.holdliste).len();
    let staged_match_count = normalize_staged_matches(&import.kampe).len();

    let snapshot = build_snapshot(&import, config)?;
    store.replace_snapshot(&snapshot)?;

    info!(
        import_id = %import.id,
        clubs = snapshot.clubs.len(),
        teams = snapshot.teams.len(),
        matches = snapshot.matches.len(),
        "snapshot published"
    );

    Ok(PublishReport {
        import_id: import.id,
        filename: import.filename,
        resolution: snapshot.resolution,
        club_count: snapshot.clubs.len(),
        team_count: staged_team_count,
        match_count: staged_match_count,
    })
}
