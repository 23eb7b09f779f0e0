//! Facade flows against a durable SQLite store, including restarts

use chrono::{DateTime, Local, TimeZone, Utc};
use std::path::Path;
use std::sync::{Arc, Mutex};

use questlog::challenges::ChallengeKind;
use questlog::quests::NewQuest;
use questlog::store::SqliteStore;
use questlog::{Challenge, EngineEvent, QuestLog};

fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Local
        .with_ymd_and_hms(2025, 5, day, hour, 0, 0)
        .single()
        .unwrap()
        .with_timezone(&Utc)
}

fn open(path: &Path) -> QuestLog<SqliteStore> {
    QuestLog::open(path).unwrap()
}

fn ids(batch: &[Challenge]) -> Vec<uuid::Uuid> {
    batch.iter().map(|c| c.id).collect()
}

#[test]
fn test_progress_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("questlog.db");
    let now = at(23, 15);

    let quest_id = {
        let app = open(&db);
        app.ledger().onboard("Ana", "fox").unwrap();
        let list = app
            .quests()
            .create_at(NewQuest::new("Water plants", 60), now)
            .unwrap();
        let completion = app.complete_quest_at(list[0].id, now).unwrap();
        assert_eq!(completion.grant.unwrap().current_xp, 60);
        app.ledger().record_streak_tick().unwrap();
        list[0].id
    };

    let app = open(&db);
    let user = app.ledger().user().unwrap();
    assert_eq!(user.name, "Ana");
    assert_eq!((user.level, user.current_xp, user.streak), (1, 60, 1));

    let quest = app.quests().get(quest_id).unwrap();
    assert!(quest.is_completed);
    assert_eq!(quest.xp_value, 60);
}

#[test]
fn test_challenge_batch_stable_within_day_across_restart() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("questlog.db");

    let first = {
        let app = open(&db);
        app.refresh_challenges_at(at(23, 9)).unwrap()
    };
    assert_eq!(first.len(), 10);

    let app = open(&db);
    let same_day = app.refresh_challenges_at(at(23, 21)).unwrap();
    assert_eq!(ids(&first), ids(&same_day));

    let next_day = app.refresh_challenges_at(at(24, 7)).unwrap();
    assert_eq!(next_day.len(), 10);
    assert!(next_day.iter().all(|c| !first.iter().any(|o| o.id == c.id)));
    assert!(next_day.iter().all(|c| c.date == at(24, 7)));
}

#[test]
fn test_challenge_completion_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("questlog.db");
    let now = at(23, 16);

    {
        let app = open(&db);
        app.ledger().onboard("Ana", "fox").unwrap();
        for title in ["one", "two", "three"] {
            let list = app.quests().create_at(NewQuest::new(title, 10), now).unwrap();
            let id = list.iter().find(|q| q.title == title).unwrap().id;
            app.complete_quest_at(id, now).unwrap();
        }
    }

    let app = open(&db);
    let batch = app.refresh_challenges_at(now).unwrap();
    let find = |kind: ChallengeKind| batch.iter().find(|c| c.kind == kind).unwrap();
    assert!(find(ChallengeKind::ThreeQuestsToday).is_completed);
    assert!(!find(ChallengeKind::ThreeDayStreak).is_completed);
    assert_eq!(app.ledger().user().unwrap().current_xp, 30);
}

#[test]
fn test_reset_is_durable() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("questlog.db");

    {
        let app = open(&db);
        app.ledger().onboard("Ana", "fox").unwrap();
        app.quests().create(NewQuest::new("Stretch", 20)).unwrap();
        app.reset_all().unwrap();
    }

    let app = open(&db);
    assert!(app.ledger().user().is_none());
    assert!(app.quests().quests().is_empty());
    assert!(app.challenges().challenges().is_empty());
}

#[test]
fn test_single_level_up_per_grant() {
    let dir = tempfile::tempdir().unwrap();
    let app = open(&dir.path().join("questlog.db"));
    app.ledger().onboard("Ana", "fox").unwrap();

    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    app.subscribe(move |e| sink.lock().unwrap().push(e.clone()));

    app.ledger().grant_xp(90).unwrap();
    let grant = app.ledger().grant_xp(500).unwrap();
    assert_eq!((grant.level, grant.current_xp), (2, 490));

    let level_ups = events
        .lock()
        .unwrap()
        .iter()
        .filter(|e| matches!(e, EngineEvent::LevelUp(_)))
        .count();
    assert_eq!(level_ups, 1);
}

#[test]
fn test_deleted_quest_stays_deleted() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("questlog.db");

    let id = {
        let app = open(&db);
        let list = app.quests().create(NewQuest::new("Call mom", 15)).unwrap();
        app.quests().delete(list[0].id).unwrap();
        list[0].id
    };

    let app = open(&db);
    assert!(app.quests().get(id).is_none());
    assert!(app.quests().delete(id).unwrap_err().is_not_found());
}

#[test]
fn test_components_write_concurrently() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("questlog.db");

    {
        let app = Arc::new(open(&db));
        app.ledger().onboard("Ana", "fox").unwrap();

        let granting = {
            let app = app.clone();
            std::thread::spawn(move || {
                for _ in 0..30 {
                    app.ledger().grant_xp(1).unwrap();
                }
            })
        };
        let creating = {
            let app = app.clone();
            std::thread::spawn(move || {
                for i in 0..15 {
                    app.quests().create(NewQuest::new(format!("q{i}"), 5)).unwrap();
                }
            })
        };
        granting.join().unwrap();
        creating.join().unwrap();
        app.flush().unwrap();
    }

    let app = open(&db);
    assert_eq!(app.ledger().user().unwrap().current_xp, 30);
    assert_eq!(app.quests().quests().len(), 15);
    assert_eq!(app.challenges().challenges().len(), 10);
}
