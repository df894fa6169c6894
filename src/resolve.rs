//! Hold-id resolution and match gender inference.
//!
//! The match programme references teams by free-text name; the durable
//! link other subsystems need is the external hold-id. This module builds
//! lookup tables over the team universe and resolves names against them,
//! most specific key first. A key that maps to more than one hold-id is
//! dropped from every table: resolution returns unresolved rather than
//! guessing.
//!
//! The same tables also stitch team rows across seasons: a Holdliste row
//! without a hold-id adopts the hold-id its name unambiguously resolves
//! to, so a renamed team keeps one identity from season to season.

use rustc_hash::FxHashMap;
use std::collections::HashSet;
use tracing::debug;

use crate::gender::{gender_hint, Gender};
use crate::leagues::LeagueEquivalences;
use crate::staged::{StagedMatch, StagedTeam};
use crate::teams::TeamRecord;
use crate::text::{canonical_key, loose_team_key};

/// Genders observed for one lookup key. Only an unambiguous observation
/// counts as a signal.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct GenderSet {
    men: bool,
    women: bool,
}

impl GenderSet {
    fn add(&mut self, g: Gender) {
        match g {
            Gender::Men => self.men = true,
            Gender::Women => self.women = true,
        }
    }

    fn only(&self) -> Option<Gender> {
        match (self.men, self.women) {
            (true, false) => Some(Gender::Men),
            (false, true) => Some(Gender::Women),
            _ => None,
        }
    }
}

/// Index of known team genders by `(equivalent league, canonical name)`.
#[derive(Debug, Default)]
pub struct TeamGenderIndex {
    by_league_and_name: FxHashMap<String, GenderSet>,
}

impl TeamGenderIndex {
    /// Build from the staged team candidates (pre-merge: every season row
    /// contributes its observation).
    pub fn build(teams: &[StagedTeam], leagues: &LeagueEquivalences) -> Self {
        let mut by_league_and_name: FxHashMap<String, GenderSet> = FxHashMap::default();

        for t in teams {
            let Some(g) = t.gender else { continue };
            let league = t.league.trim();
            let name_key = canonical_key(&t.team_name);
            if league.is_empty() || name_key.is_empty() {
                continue;
            }
            for l in leagues.equivalents(league) {
                let key = format!("{}|{}", l.to_lowercase(), name_key);
                by_league_and_name.entry(key).or_default().add(g);
            }
        }

        Self { by_league_and_name }
    }

    fn unambiguous(&self, league_lower: &str, name_key: &str) -> Option<Gender> {
        self.by_league_and_name
            .get(&format!("{}|{}", league_lower, name_key))
            .and_then(GenderSet::only)
    }
}

/// Infer a match's gender: explicit field first, then the unique gender
/// shared by the two teams' candidates, then a league+pool text hint.
/// `None` propagates when every signal is ambiguous or absent.
pub fn infer_match_gender(
    m: &StagedMatch,
    genders: &TeamGenderIndex,
    leagues: &LeagueEquivalences,
) -> Option<Gender> {
    if let Some(g) = m.gender {
        return Some(g);
    }

    let league = m.league.trim();
    let home_key = canonical_key(&m.home_team);
    let away_key = canonical_key(&m.away_team);

    let mut seen_any = false;
    let mut combined = GenderSet::default();
    for l in leagues.equivalents(league) {
        let lk = l.to_lowercase();
        if !home_key.is_empty() {
            if let Some(g) = genders.unambiguous(&lk, &home_key) {
                combined.add(g);
                seen_any = true;
            }
        }
        if !away_key.is_empty() {
            if let Some(g) = genders.unambiguous(&lk, &away_key) {
                combined.add(g);
                seen_any = true;
            }
        }
    }

    if seen_any {
        if let Some(only) = combined.only() {
            return Some(only);
        }
        // The two sides disagree; that is not a signal, fall through.
    }

    gender_hint(format!("{} {}", m.league, m.pool).trim())
}

/// Unambiguous hold-id lookup tables over a team universe.
///
/// Four tables, probed most specific first per equivalent league spelling:
/// 1. `(league, gender, canonical name)`
/// 2. `(league, canonical name)`
/// 3. `(league, gender, loose name)`
/// 4. `(league, loose name)`
#[derive(Debug)]
pub struct HoldIdResolver {
    leagues: LeagueEquivalences,
    by_league_gender_name: FxHashMap<String, String>,
    by_league_name: FxHashMap<String, String>,
    by_league_gender_loose: FxHashMap<String, String>,
    by_league_loose: FxHashMap<String, String>,
}

impl HoldIdResolver {
    /// Build from staged team rows: every season's name variant
    /// contributes, so the match programme can reference a team by any of
    /// its recent spellings.
    pub fn from_staged(teams: &[StagedTeam], leagues: &LeagueEquivalences) -> Self {
        Self::from_parts(
            teams
                .iter()
                .map(|t| (t.league.as_str(), t.team_name.as_str(), t.gender, t.hold_id.as_str())),
            leagues,
        )
    }

    /// Build from published team records, for downstream consumers that
    /// resolve names against a persisted snapshot.
    pub fn from_records(teams: &[TeamRecord], leagues: &LeagueEquivalences) -> Self {
        Self::from_parts(
            teams.iter().map(|t| {
                (
                    t.league.as_str(),
                    t.name.as_str(),
                    t.gender,
                    t.hold_id.as_deref().unwrap_or(""),
                )
            }),
            leagues,
        )
    }

    fn from_parts<'a>(
        parts: impl Iterator<Item = (&'a str, &'a str, Option<Gender>, &'a str)>,
        leagues: &LeagueEquivalences,
    ) -> Self {
        let mut name_candidates: FxHashMap<String, HashSet<String>> = FxHashMap::default();
        let mut gender_name_candidates: FxHashMap<String, HashSet<String>> = FxHashMap::default();
        let mut loose_candidates: FxHashMap<String, HashSet<String>> = FxHashMap::default();
        let mut gender_loose_candidates: FxHashMap<String, HashSet<String>> = FxHashMap::default();

        for (league, name, gender, hold_id) in parts {
            let league = league.trim();
            let name_key = canonical_key(name);
            let loose_key = loose_team_key(name);
            let hold_id = hold_id.trim();
            if league.is_empty() || name_key.is_empty() || hold_id.is_empty() {
                continue;
            }

            for l in leagues.equivalents(league) {
                let lk = l.to_lowercase();
                add_candidate(&mut name_candidates, format!("{}|{}", lk, name_key), hold_id);
                if !loose_key.is_empty() {
                    add_candidate(
                        &mut loose_candidates,
                        format!("{}|{}", lk, loose_key),
                        hold_id,
                    );
                }
                if let Some(g) = gender {
                    add_candidate(
                        &mut gender_name_candidates,
                        format!("{}|{}|{}", lk, g.as_str(), name_key),
                        hold_id,
                    );
                    if !loose_key.is_empty() {
                        add_candidate(
                            &mut gender_loose_candidates,
                            format!("{}|{}|{}", lk, g.as_str(), loose_key),
                            hold_id,
                        );
                    }
                }
            }
        }

        Self {
            leagues: leagues.clone(),
            by_league_gender_name: keep_unambiguous(gender_name_candidates),
            by_league_name: keep_unambiguous(name_candidates),
            by_league_gender_loose: keep_unambiguous(gender_loose_candidates),
            by_league_loose: keep_unambiguous(loose_candidates),
        }
    }

    /// Resolve one team reference to a hold-id, or `None` when no
    /// unambiguous key matches under any equivalent league spelling.
    pub fn resolve(&self, league: &str, gender: Option<Gender>, team_name: &str) -> Option<&str> {
        let league = league.trim();
        let key = canonical_key(team_name);
        if league.is_empty() || key.is_empty() {
            return None;
        }

        let loose = loose_team_key(team_name);

        for l in self.leagues.equivalents(league) {
            let lk = l.to_lowercase();

            if let Some(g) = gender {
                if let Some(id) = self
                    .by_league_gender_name
                    .get(&format!("{}|{}|{}", lk, g.as_str(), key))
                {
                    return Some(id);
                }
            }

            if let Some(id) = self.by_league_name.get(&format!("{}|{}", lk, key)) {
                return Some(id);
            }

            if !loose.is_empty() {
                if let Some(g) = gender {
                    if let Some(id) = self
                        .by_league_gender_loose
                        .get(&format!("{}|{}|{}", lk, g.as_str(), loose))
                    {
                        return Some(id);
                    }
                }
                if let Some(id) = self.by_league_loose.get(&format!("{}|{}", lk, loose)) {
                    return Some(id);
                }
            }
        }

        None
    }
}

/// Season-to-season stitching: rows without a hold-id adopt the hold-id
/// their name unambiguously resolves to, before identity assignment. A
/// renamed team thereby keeps one identity across seasons; names that
/// resolve to nothing (or ambiguously) are left untouched.
pub fn attach_hold_ids(teams: &[StagedTeam], leagues: &LeagueEquivalences) -> Vec<StagedTeam> {
    let resolver = HoldIdResolver::from_staged(teams, leagues);

    teams
        .iter()
        .map(|t| {
            if !t.hold_id.trim().is_empty() {
                return t.clone();
            }
            match resolver.resolve(&t.league, t.gender, &t.team_name) {
                Some(hold_id) => {
                    debug!(
                        team = %t.team_name,
                        league = %t.league,
                        hold_id = %hold_id,
                        "attached hold-id to season row"
                    );
                    let mut attached = t.clone();
                    attached.hold_id = hold_id.to_string();
                    attached
                }
                None => t.clone(),
            }
        })
        .collect()
}

fn add_candidate(map: &mut FxHashMap<String, HashSet<String>>, key: String, hold_id: &str) {
    map.entry(key).or_default().insert(hold_id.to_string());
}

fn keep_unambiguous(candidates: FxHashMap<String, HashSet<String>>) -> FxHashMap<String, String> {
    let mut out = FxHashMap::default();
    for (key, set) in candidates {
        if set.len() == 1 {
            out.insert(key, set.into_iter().next().unwrap_or_default());
        } else {
            debug!(key = %key, candidates = set.len(), "dropping ambiguous hold-id key");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team(league: &str, name: &str, hold_id: &str, gender: Option<Gender>) -> TeamRecord {
        TeamRecord {
            id: format!("team_{}", hold_id),
            club_id: "club_x".into(),
            league: league.into(),
            name: name.into(),
            hold_id: if hold_id.is_empty() { None } else { Some(hold_id.into()) },
            gender,
            season_start_year: None,
        }
    }

    fn staged(league: &str, name: &str, hold_id: &str, gender: Option<Gender>) -> StagedTeam {
        StagedTeam {
            season: String::new(),
            club_no: "12".into(),
            club_name: "Klub".into(),
            league: league.into(),
            team_name: name.into(),
            hold_id: hold_id.into(),
            gender,
        }
    }

    fn match_row(league: &str, pool: &str, home: &str, away: &str) -> StagedMatch {
        StagedMatch {
            external_id: None,
            date: None,
            time: None,
            date_text: String::new(),
            time_text: String::new(),
            venue: String::new(),
            result: String::new(),
            referee1: String::new(),
            referee1_id: String::new(),
            referee2: String::new(),
            referee2_id: String::new(),
            gender: None,
            league: league.into(),
            stage: String::new(),
            pool: pool.into(),
            home_team: home.into(),
            away_team: away.into(),
        }
    }

    #[test]
    fn test_resolve_exact_name() {
        let leagues = LeagueEquivalences::default();
        let teams = vec![team("Liga1", "Bagsværd IF 1", "500", Some(Gender::Men))];
        let resolver = HoldIdResolver::from_records(&teams, &leagues);

        assert_eq!(
            resolver.resolve("Liga1", Some(Gender::Men), "Bagsværd IF 1"),
            Some("500")
        );
        // Gender-agnostic fallback still hits the unambiguous name table.
        assert_eq!(resolver.resolve("Liga1", None, "bagsvaerd if 1"), Some("500"));
        assert_eq!(resolver.resolve("Liga2", None, "Bagsværd IF 1"), None);
        assert_eq!(resolver.resolve("Liga1", None, "Ukendt Hold"), None);
    }

    #[test]
    fn test_resolve_loose_name_fallback() {
        let leagues = LeagueEquivalences::default();
        let teams = vec![team("Liga1", "Benløse FC", "600", None)];
        let resolver = HoldIdResolver::from_records(&teams, &leagues);

        // "Benløse IF" only matches once the FC/IF suffixes are stripped.
        assert_eq!(resolver.resolve("Liga1", None, "Benløse IF"), Some("600"));
    }

    #[test]
    fn test_ambiguous_keys_dropped_from_all_tables() {
        let leagues = LeagueEquivalences::default();
        // Two distinct hold-ids behind the same canonical name.
        let teams = vec![
            team("Liga1", "Team A", "1", Some(Gender::Men)),
            team("Liga1", "Team A", "2", Some(Gender::Men)),
        ];
        let resolver = HoldIdResolver::from_records(&teams, &leagues);
        assert_eq!(resolver.resolve("Liga1", Some(Gender::Men), "Team A"), None);
        assert_eq!(resolver.resolve("Liga1", None, "Team A"), None);
    }

    #[test]
    fn test_gendered_key_disambiguates() {
        let leagues = LeagueEquivalences::default();
        // Same name, one men's and one women's team: the name-only key is
        // ambiguous but the gendered key resolves.
        let teams = vec![
            team("Liga1", "Bagsværd 1", "500", Some(Gender::Men)),
            team("Liga1", "Bagsværd 1", "700", Some(Gender::Women)),
        ];
        let resolver = HoldIdResolver::from_records(&teams, &leagues);

        assert_eq!(
            resolver.resolve("Liga1", Some(Gender::Men), "Bagsværd 1"),
            Some("500")
        );
        assert_eq!(
            resolver.resolve("Liga1", Some(Gender::Women), "Bagsværd 1"),
            Some("700")
        );
        assert_eq!(resolver.resolve("Liga1", None, "Bagsværd 1"), None);
    }

    #[test]
    fn test_league_alias_symmetry() {
        let leagues = LeagueEquivalences::default();
        let teams = vec![team("Select Ligaen", "Bagsværd 1", "500", Some(Gender::Men))];
        let resolver = HoldIdResolver::from_records(&teams, &leagues);

        assert_eq!(
            resolver.resolve("Unihoc Floorball Liga", Some(Gender::Men), "Bagsværd 1"),
            Some("500")
        );

        let teams = vec![team(
            "Unihoc Floorball Liga",
            "Bagsværd 1",
            "500",
            Some(Gender::Men),
        )];
        let resolver = HoldIdResolver::from_records(&teams, &leagues);
        assert_eq!(
            resolver.resolve("Select Ligaen", Some(Gender::Men), "Bagsværd 1"),
            Some("500")
        );
    }

    #[test]
    fn test_attach_hold_ids_stitches_renamed_season_row() {
        let leagues = LeagueEquivalences::default();
        let teams = vec![
            staged("Liga1", "Bagsværd IF 1", "500", Some(Gender::Men)),
            // Next season's export renamed the team and dropped the id.
            staged("Liga1", "Bagsværd 1", "", None),
        ];
        let attached = attach_hold_ids(&teams, &leagues);
        assert_eq!(attached[0].hold_id, "500");
        assert_eq!(attached[1].hold_id, "500");
    }

    #[test]
    fn test_attach_hold_ids_leaves_unresolvable_rows_alone() {
        let leagues = LeagueEquivalences::default();
        let teams = vec![
            staged("Liga1", "Bagsværd IF 1", "500", Some(Gender::Men)),
            staged("Liga1", "Helt Andet Hold", "", None),
        ];
        let attached = attach_hold_ids(&teams, &leagues);
        assert_eq!(attached[1].hold_id, "");
    }

    #[test]
    fn test_attach_hold_ids_refuses_ambiguity() {
        let leagues = LeagueEquivalences::default();
        let teams = vec![
            staged("Liga1", "Team A", "1", None),
            staged("Liga1", "Team A", "2", None),
            staged("Liga1", "Team A", "", None),
        ];
        let attached = attach_hold_ids(&teams, &leagues);
        assert_eq!(attached[2].hold_id, "");
    }

    #[test]
    fn test_infer_gender_explicit_field_wins() {
        let leagues = LeagueEquivalences::default();
        let genders = TeamGenderIndex::build(&[], &leagues);
        // Text hints say men; the explicit field says women and must win.
        let mut m = match_row("Herreligaen", "", "A", "B");
        m.gender = Some(Gender::Women);
        assert_eq!(infer_match_gender(&m, &genders, &leagues), Some(Gender::Women));
    }

    #[test]
    fn test_infer_gender_from_team_candidates() {
        let leagues = LeagueEquivalences::default();
        let genders = TeamGenderIndex::build(
            &[
                staged("Liga1", "Bagsværd 1", "", Some(Gender::Women)),
                staged("Liga1", "Anden Klub", "", Some(Gender::Women)),
            ],
            &leagues,
        );
        let m = match_row("Liga1", "", "Bagsværd 1", "Anden Klub");
        assert_eq!(infer_match_gender(&m, &genders, &leagues), Some(Gender::Women));
    }

    #[test]
    fn test_infer_gender_disagreeing_teams_falls_to_hint() {
        let leagues = LeagueEquivalences::default();
        let genders = TeamGenderIndex::build(
            &[
                staged("Liga1", "Hold A", "", Some(Gender::Men)),
                staged("Liga1", "Hold B", "", Some(Gender::Women)),
            ],
            &leagues,
        );
        // Teams disagree; pool text decides.
        let m = match_row("Liga1", "Damepulje", "Hold A", "Hold B");
        assert_eq!(infer_match_gender(&m, &genders, &leagues), Some(Gender::Women));

        // Teams disagree and no hint: unresolved.
        let m = match_row("Liga1", "Pulje B", "Hold A", "Hold B");
        assert_eq!(infer_match_gender(&m, &genders, &leagues), None);
    }

    #[test]
    fn test_infer_gender_ambiguous_candidate_is_no_signal() {
        let leagues = LeagueEquivalences::default();
        // The same name was seen as both men's and women's team: its set
        // has two members and contributes nothing.
        let genders = TeamGenderIndex::build(
            &[
                staged("Liga1", "Hold A", "", Some(Gender::Men)),
                staged("Liga1", "Hold A", "", Some(Gender::Women)),
            ],
            &leagues,
        );
        let m = match_row("Liga1", "", "Hold A", "Ukendt");
        assert_eq!(infer_match_gender(&m, &genders, &leagues), None);
    }
}
