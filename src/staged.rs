//! Staged import normalization: raw sheet rows to typed candidates.
//!
//! One staged import is a full snapshot of three sheets (Klubliste,
//! Holdliste, Kampprogram). The normalizers here turn the loosely-typed
//! rows into candidate records, skipping rows that lack the required
//! fields; spreadsheets routinely contain blank trailing rows, and a row
//! that is useless for one entity type may still be fine for another.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::dates::{format_date_da, parse_excel_date_cell, parse_excel_time_cell};
use crate::gender::{normalize_gender_like, Gender};
use crate::row::Row;

/// A club candidate from the Klubliste sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedClub {
    pub club_no: String,
    pub name: String,
}

/// A team candidate from one Holdliste row. Rows are deduplicated within
/// a season, but the same team legitimately appears once per season; the
/// cross-season collapse happens later in the merge step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagedTeam {
    pub season: String,
    pub club_no: String,
    pub club_name: String,
    pub league: String,
    pub team_name: String,
    pub hold_id: String,
    pub gender: Option<Gender>,
}

/// A match candidate from one Kampprogram row. Team fields are free-text
/// names at this stage; hold-id resolution happens in the publish step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagedMatch {
    pub external_id: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub date_text: String,
    pub time_text: String,
    pub venue: String,
    pub result: String,
    pub referee1: String,
    pub referee1_id: String,
    pub referee2: String,
    pub referee2_id: String,
    pub gender: Option<Gender>,
    pub league: String,
    pub stage: String,
    pub pool: String,
    pub home_team: String,
    pub away_team: String,
}

fn club_no_of(row: &Row) -> String {
    row.lookup(
        &["KlubID", "Klub Id", "KlubNr", "Klubnr", "Id"],
        &["klubid", "klubnr"],
    )
}

/// Normalize Klubliste rows into club candidates, first-seen per identity
/// key, sorted by club number (name when the number is missing).
pub fn normalize_staged_clubs(klubliste: &[Row]) -> Vec<StagedClub> {
    let mut out: Vec<StagedClub> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for row in klubliste {
        let club_no = club_no_of(row);
        let name = row.lookup(
            &["Forening", "Klubnavn", "Klub", "Navn", "Klub navn"],
            &["forening", "klubnavn", "navn"],
        );

        if club_no.is_empty() && name.is_empty() {
            continue;
        }

        let key = if !club_no.is_empty() {
            format!("no:{}", club_no.to_lowercase())
        } else {
            format!("name:{}", name.to_lowercase())
        };
        if !seen.insert(key) {
            continue;
        }

        let name = if name.is_empty() { club_no.clone() } else { name };
        out.push(StagedClub { club_no, name });
    }

    out.sort_by(|a, b| {
        let ka = if a.club_no.is_empty() { &a.name } else { &a.club_no };
        let kb = if b.club_no.is_empty() { &b.name } else { &b.club_no };
        ka.cmp(kb)
    });
    out
}

/// Normalize Holdliste rows into team candidates.
///
/// A row must carry a club (number or name), a league and a team name;
/// anything less is dropped silently. The dedupe key keeps the season so
/// that name variants across seasons survive to the merge step.
pub fn normalize_staged_teams(holdliste: &[Row]) -> Vec<StagedTeam> {
    let mut out: Vec<StagedTeam> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for row in holdliste {
        let season = row.lookup(
            &["Season", "Sæson", "Saeson"],
            &["sæson", "saeson", "season"],
        );

        let hold_id = row.lookup(
            &[
                "HoldID", "Hold Id", "HoldId", "HoldNr", "Holdnr", "TeamID", "Team Id", "TeamId",
            ],
            &["holdid", "teamid"],
        );

        let club_no = club_no_of(row);
        let club_name = row.lookup(
            &["Forening", "Klub", "Klubnavn", "Klub navn"],
            &["forening", "klubnavn", "klub"],
        );
        let league = row.lookup(&["Liga", "Række", "Raekke", "Turnering"], &["liga"]);
        let team_name = row.lookup(&["Hold", "Holdnavn", "Hold navn", "Team"], &["hold"]);

        let gender_raw = row.lookup(&["Køn", "Koen", "Gender"], &["køn", "koen", "gender"]);
        let gender = normalize_gender_like(&gender_raw);

        if club_no.is_empty() && club_name.is_empty() && league.is_empty() && team_name.is_empty() {
            continue;
        }
        if (club_no.is_empty() && club_name.is_empty()) || league.is_empty() || team_name.is_empty()
        {
            continue;
        }

        let club_part = if !club_no.is_empty() { &club_no } else { &club_name };
        let key = format!(
            "{}|{}|{}|{}|{}",
            club_part.to_lowercase(),
            league.to_lowercase(),
            team_name.to_lowercase(),
            gender.map(|g| g.as_str()).unwrap_or(""),
            season.to_lowercase()
        );
        if !seen.insert(key) {
            continue;
        }

        let club_name = if club_name.is_empty() { club_no.clone() } else { club_name };
        out.push(StagedTeam {
            season,
            club_no,
            club_name,
            league,
            team_name,
            hold_id,
            gender,
        });
    }

    out
}

/// Normalize Kampprogram rows into match candidates. A row survives when
/// any of the schedule fields is present.
pub fn normalize_staged_matches(kampe: &[Row]) -> Vec<StagedMatch> {
    let mut out: Vec<StagedMatch> = Vec::new();

    for row in kampe {
        let date_cell = row.cell_for(&["dato"], &["dato", "date"]);
        let time_cell = row.cell_for(&["tid"], &["tid", "time"]);

        let date = date_cell.and_then(parse_excel_date_cell);
        let time_parsed = time_cell.and_then(parse_excel_time_cell);

        let external_id = {
            let s = row.lookup(
                &["KampID", "Kamp Id", "KampNr", "Kampnr", "Nr", "MatchID"],
                &["kampid", "kamp"],
            );
            if s.is_empty() {
                None
            } else {
                Some(s)
            }
        };

        let league = row.lookup(&["Liga", "Række", "Raekke"], &["liga"]);
        let stage = row.lookup(&["Stadie", "Stage"], &["stadie"]);
        let pool = row.lookup(&["Pulje"], &["pulje"]);
        let venue = row.lookup(&["Sted", "Hal", "Spillested", "Bane"], &["sted"]);
        let result = row.lookup(&["Resultat", "Result", "Score"], &["result"]);
        let gender_raw = row.lookup(&["Køn", "Koen", "Gender"], &["køn", "koen", "gender"]);
        let home_team = row.lookup(&["Hjemmehold", "Hjemme", "Home"], &["hjem"]);
        let away_team = row.lookup(&["Udehold", "Ude", "Away"], &["ude"]);

        let referee1 = row
            .first_exact(&["Dommer1", "Dommer 1", "Dommer 1 Navn", "Dommer 1 navn"])
            .non_empty_or(|| row.first_matching(|k| k.contains("dommer1") && !k.contains("id")));
        let referee1_id = row
            .first_exact(&[
                "Dommer1_ID", "Dommer1ID", "Dommer1 Id", "Dommer 1 ID", "Dommer 1_ID",
            ])
            .non_empty_or(|| {
                row.first_matching(|k| {
                    (k.contains("dommer1") && k.contains("id")) || k.contains("dommer1_id")
                })
            });
        let referee2 = row
            .first_exact(&["Dommer2", "Dommer 2", "Dommer 2 Navn", "Dommer 2 navn"])
            .non_empty_or(|| row.first_matching(|k| k.contains("dommer2") && !k.contains("id")));
        let referee2_id = row
            .first_exact(&[
                "Dommer2_ID", "Dommer2ID", "Dommer2 Id", "Dommer 2 ID", "Dommer 2_ID",
            ])
            .non_empty_or(|| {
                row.first_matching(|k| {
                    (k.contains("dommer2") && k.contains("id")) || k.contains("dommer2_id")
                })
            });

        let has_any = external_id.is_some()
            || !league.is_empty()
            || !pool.is_empty()
            || !venue.is_empty()
            || !home_team.is_empty()
            || !away_team.is_empty()
            || date.is_some()
            || time_parsed.is_some();
        if !has_any {
            continue;
        }

        out.push(StagedMatch {
            external_id,
            date,
            time: time_parsed.as_ref().map(|t| t.time),
            date_text: format_date_da(date),
            time_text: time_parsed.map(|t| t.text).unwrap_or_default(),
            venue,
            result,
            referee1,
            referee1_id,
            referee2,
            referee2_id,
            gender: normalize_gender_like(&gender_raw),
            league,
            stage,
            pool,
            home_team,
            away_team,
        });
    }

    out
}

trait NonEmptyOr {
    fn non_empty_or(self, fallback: impl FnOnce() -> String) -> String;
}

impl NonEmptyOr for String {
    fn non_empty_or(self, fallback: impl FnOnce() -> String) -> String {
        if self.is_empty() {
            fallback()
        } else {
            self
        }
    }
}

/// Result of the pre-publish validation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Ok,
    Failed { message: String },
}

impl Validation {
    pub fn is_ok(&self) -> bool {
        matches!(self, Validation::Ok)
    }
}

fn is_hh_mm(text: &str) -> bool {
    let b = text.as_bytes();
    b.len() == 5
        && b[0].is_ascii_digit()
        && b[1].is_ascii_digit()
        && b[2] == b':'
        && b[3].is_ascii_digit()
        && b[4].is_ascii_digit()
}

/// Validate staged matches: any non-empty time text must be exactly
/// `hh:mm`. Problems are collected (never thrown) and capped at
/// `max_problems`, joined by newlines in the operator-facing message.
pub fn validate_staged_matches(matches: &[StagedMatch], max_problems: usize) -> Validation {
    let mut problems: Vec<String> = Vec::new();

    for m in matches {
        if !m.time_text.is_empty() && !is_hh_mm(&m.time_text) {
            problems.push(format!(
                "Tid skal være hh:mm for kamp: {} - {} (fandt '{}')",
                if m.home_team.is_empty() { "?" } else { &m.home_team },
                if m.away_team.is_empty() { "?" } else { &m.away_team },
                m.time_text
            ));
        }
    }

    if problems.is_empty() {
        Validation::Ok
    } else {
        problems.truncate(max_problems);
        Validation::Failed {
            message: problems.join("\n"),
        }
    }
}
