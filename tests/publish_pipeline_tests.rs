//! Publish pipeline tests against an injected in-memory store.

use turnering_import::config::ImportConfig;
use turnering_import::publish::{publish_latest, PublishError};
use turnering_import::row::{CellValue, Row};
use turnering_import::store::{MemorySnapshotStore, SnapshotStore};

fn text_row(pairs: &[(&str, &str)]) -> Row {
    Row::from_pairs(
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), CellValue::Text(v.to_string())))
            .collect(),
    )
}

fn seed_store() -> MemorySnapshotStore {
    let mut store = MemorySnapshotStore::new();
    store.record_import(
        Some("turnering.xlsx"),
        vec![
            text_row(&[
                ("KampID", "K1"),
                ("Liga", "Liga1"),
                ("Dato", "01-09-2024"),
                ("Tid", "18:30"),
                ("Hjemmehold", "Bagsværd IF 1"),
                ("Udehold", "Anden Klub"),
            ]),
            text_row(&[
                ("KampID", "K2"),
                ("Liga", "Liga1"),
                ("Hjemmehold", "Anden Klub"),
                ("Udehold", "Bagsværd IF 1"),
            ]),
        ],
        vec![
            text_row(&[
                ("Season", "2024-2025"),
                ("KlubID", "12"),
                ("Klub", "Bagsværd IF"),
                ("Liga", "Liga1"),
                ("Hold", "Bagsværd IF 1"),
                ("HoldID", "500"),
                ("Køn", "Mand"),
            ]),
            text_row(&[
                ("Season", "2024-2025"),
                ("KlubID", "13"),
                ("Klub", "Anden Klub"),
                ("Liga", "Liga1"),
                ("Hold", "Anden Klub"),
                ("HoldID", "600"),
                ("Køn", "Mand"),
            ]),
        ],
        vec![
            text_row(&[("KlubID", "12"), ("Forening", "Bagsværd IF")]),
            text_row(&[("KlubID", "13"), ("Forening", "Anden Klub")]),
        ],
    );
    store
}

#[test]
fn test_publish_latest_writes_snapshot_and_reports() {
    let mut store = seed_store();
    let report = publish_latest(&mut store, &ImportConfig::default()).unwrap();

    assert_eq!(report.filename.as_deref(), Some("turnering.xlsx"));
    assert_eq!(report.club_count, 2);
    assert_eq!(report.team_count, 2);
    assert_eq!(report.match_count, 2);
    assert_eq!(report.resolution.matches_total, 2);
    assert_eq!(report.resolution.both_resolved, 2);

    let snapshot = store.snapshot().expect("snapshot written");
    assert_eq!(snapshot.clubs.len(), 2);
    assert_eq!(snapshot.teams.len(), 2);
    assert_eq!(snapshot.matches.len(), 2);

    let k1 = snapshot
        .matches
        .iter()
        .find(|m| m.external_id.as_deref() == Some("K1"))
        .unwrap();
    assert_eq!(k1.home_hold_id.as_deref(), Some("500"));
    assert_eq!(k1.away_hold_id.as_deref(), Some("600"));
    assert_eq!(k1.date, chrono::NaiveDate::from_ymd_opt(2024, 9, 1));
    assert_eq!(k1.time, chrono::NaiveTime::from_hms_opt(18, 30, 0));
}

#[test]
fn test_publish_twice_yields_identical_ids() {
    let mut store = seed_store();
    publish_latest(&mut store, &ImportConfig::default()).unwrap();
    let first: Vec<(String, String)> = store
        .snapshot()
        .unwrap()
        .teams
        .iter()
        .map(|t| (t.id.clone(), t.hold_id.clone().unwrap_or_default()))
        .collect();

    publish_latest(&mut store, &ImportConfig::default()).unwrap();
    let second: Vec<(String, String)> = store
        .snapshot()
        .unwrap()
        .teams
        .iter()
        .map(|t| (t.id.clone(), t.hold_id.clone().unwrap_or_default()))
        .collect();

    assert_eq!(first, second, "republishing must not regenerate identities");
}

#[test]
fn test_publish_without_import_is_an_error() {
    let mut store = MemorySnapshotStore::new();
    match publish_latest(&mut store, &ImportConfig::default()) {
        Err(PublishError::NoImport) => {}
        other => panic!("expected NoImport, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_latest_import_wins() {
    let mut store = seed_store();
    // A later, smaller import replaces the first one entirely.
    store.record_import(
        Some("rettelse.xlsx"),
        vec![],
        vec![text_row(&[
            ("KlubID", "99"),
            ("Klub", "Ny Klub"),
            ("Liga", "Liga2"),
            ("Hold", "Ny Klub 1"),
            ("HoldID", "900"),
        ])],
        vec![],
    );

    let report = publish_latest(&mut store, &ImportConfig::default()).unwrap();
    assert_eq!(report.filename.as_deref(), Some("rettelse.xlsx"));

    let snapshot = store.snapshot().unwrap();
    assert_eq!(snapshot.teams.len(), 1);
    assert_eq!(snapshot.teams[0].hold_id.as_deref(), Some("900"));
    assert_eq!(snapshot.matches.len(), 0);
}
