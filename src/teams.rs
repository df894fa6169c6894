//! Club records and the cross-season team merge.
//!
//! Clubs are derived from the Klubliste sheet AND from Holdliste rows,
//! since the club list is frequently incomplete. Team candidates are then
//! folded into one record per stable identity key: rows for the same team
//! across seasons, stages and pools collapse deterministically, preferring
//! newer and more complete data.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dates::parse_season_start_year;
use crate::gender::Gender;
use crate::identity::{club_natural_key, stable_id, team_natural_key};
use crate::staged::{StagedClub, StagedTeam};

/// A canonical club row for the published snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClubRecord {
    pub id: String,
    pub club_no: String,
    pub name: String,
}

/// A canonical team row for the published snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamRecord {
    pub id: String,
    pub club_id: String,
    pub league: String,
    pub name: String,
    pub hold_id: Option<String>,
    pub gender: Option<Gender>,
    pub season_start_year: Option<i32>,
}

/// Club records plus the lookups the team merge needs.
#[derive(Debug, Default)]
pub struct ClubIndex {
    records: Vec<ClubRecord>,
    seen: FxHashMap<String, usize>,
    id_by_no: FxHashMap<String, String>,
    id_by_name: FxHashMap<String, String>,
}

impl ClubIndex {
    /// Build the club universe from the club list and the team list, in
    /// that order; first-seen wins per identity key.
    pub fn build(clubs: &[StagedClub], teams: &[StagedTeam]) -> Self {
        let mut index = ClubIndex::default();
        for c in clubs {
            index.add(&c.club_no, &c.name);
        }
        for t in teams {
            index.add(&t.club_no, &t.club_name);
        }

        for record in &index.records {
            if !record.club_no.is_empty() {
                index
                    .id_by_no
                    .insert(record.club_no.to_lowercase(), record.id.clone());
            }
            if !record.name.is_empty() {
                index
                    .id_by_name
                    .insert(record.name.to_lowercase(), record.id.clone());
            }
        }
        index
    }

    fn add(&mut self, club_no: &str, name: &str) {
        let no = club_no.trim();
        let nm = name.trim();
        if no.is_empty() && nm.is_empty() {
            return;
        }

        let key = club_natural_key(no, nm);
        if self.seen.contains_key(&key) {
            return;
        }

        let id = stable_id("club", &key);
        self.seen.insert(key, self.records.len());
        self.records.push(ClubRecord {
            id,
            club_no: no.to_string(),
            name: if nm.is_empty() { no.to_string() } else { nm.to_string() },
        });
    }

    pub fn records(&self) -> &[ClubRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<ClubRecord> {
        self.records
    }

    /// Resolve a team row's club: by number first, then by name.
    pub fn club_id_for(&self, club_no: &str, club_name: &str) -> Option<&str> {
        let no = club_no.trim();
        if !no.is_empty() {
            if let Some(id) = self.id_by_no.get(&no.to_lowercase()) {
                return Some(id);
            }
        }
        let nm = club_name.trim();
        if !nm.is_empty() {
            if let Some(id) = self.id_by_name.get(&nm.to_lowercase()) {
                return Some(id);
            }
        }
        None
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Fold team candidates into one record per stable identity key.
///
/// The fold runs in input order. Merge rules per colliding key:
/// - an existing non-empty hold-id is never overwritten
/// - a strictly newer season takes the name and gender
/// - on equal or unknown seasons the longer name wins
/// - the season start year keeps the maximum seen
///
/// Candidates whose club cannot be resolved are skipped.
pub fn dedupe_teams(teams: &[StagedTeam], clubs: &ClubIndex) -> Vec<TeamRecord> {
    let mut records: Vec<TeamRecord> = Vec::new();
    let mut by_id: FxHashMap<String, usize> = FxHashMap::default();

    for t in teams {
        let club_id = match clubs.club_id_for(&t.club_no, &t.club_name) {
            Some(id) => id.to_string(),
            None => {
                debug!(
                    team = %t.team_name,
                    club_no = %t.club_no,
                    club_name = %t.club_name,
                    "skipping team candidate: club not in index"
                );
                continue;
            }
        };

        let league = t.league.trim().to_string();
        let name = t.team_name.trim().to_string();
        let hold_key = t.hold_id.trim().to_string();
        let season_start_year = parse_season_start_year(&t.season);

        let club_part = if !t.club_no.trim().is_empty() {
            t.club_no.trim()
        } else {
            t.club_name.trim()
        };
        let id_key = team_natural_key(&hold_key, club_part, &league, &name);
        let id = stable_id("team", &id_key);

        let next = TeamRecord {
            id: id.clone(),
            club_id,
            league,
            name,
            hold_id: if hold_key.is_empty() { None } else { Some(hold_key) },
            gender: t.gender,
            season_start_year,
        };

        match by_id.get(&id) {
            None => {
                by_id.insert(id, records.len());
                records.push(next);
            }
            Some(&i) => merge_into(&mut records[i], next),
        }
    }

    records
}

fn merge_into(prev: &mut TeamRecord, next: TeamRecord) {
    let has_newer_season = match (next.season_start_year, prev.season_start_year) {
        (Some(n), Some(p)) => n > p,
        (Some(_), None) => true,
        _ => false,
    };

    let name = if has_newer_season {
        if next.name.is_empty() {
            prev.name.clone()
        } else {
            next.name
        }
    } else if char_len(&next.name) > char_len(&prev.name) {
        next.name
    } else {
        prev.name.clone()
    };

    prev.hold_id = prev.hold_id.take().or(next.hold_id);
    prev.gender = if has_newer_season {
        next.gender.or(prev.gender)
    } else {
        prev.gender.or(next.gender)
    };
    prev.season_start_year = match (prev.season_start_year, next.season_start_year) {
        (Some(p), Some(n)) => Some(p.max(n)),
        (Some(p), None) => Some(p),
        (None, Some(n)) => Some(n),
        (None, None) => None,
    };
    prev.name = name;
}
