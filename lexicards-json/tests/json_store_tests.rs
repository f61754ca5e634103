use lexicards_core::{
    compute_due, schedule, CardStatus, CoreError, Grade, NewCard, Repository, SessionExclusions,
};
use lexicards_json::JsonStore;
use std::fs;

const T0: i64 = 1_700_000_000_000;

#[tokio::test]
async fn cards_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let id = {
        let store = JsonStore::open_in(dir.path()).await.unwrap();
        let mut new = NewCard::new("river", "dòng sông");
        new.example = Some("The river is wide.".into());
        let card = store.add_card(new, T0).await.unwrap();
        let graded = schedule(&card, Grade::Correct, T0).unwrap();
        store.update_card(&graded).await.unwrap();
        card.id
    };

    let store = JsonStore::open_in(dir.path()).await.unwrap();
    let card = store.get_card(id).await.unwrap();
    assert_eq!(card.english, "river");
    assert_eq!(card.example.as_deref(), Some("The river is wide."));
    assert_eq!(card.status, CardStatus::Learning);
    assert_eq!(card.step_index, 1);
    assert_eq!(card.last_review, Some(T0));
}

#[tokio::test]
async fn writes_backups() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonStore::open_in(dir.path()).await.unwrap();
    store.add_card(NewCard::new("sky", "bầu trời"), T0).await.unwrap();

    let backups: Vec<_> = fs::read_dir(dir.path().join("backups"))
        .unwrap()
        .filter_map(|e| e.ok())
        .collect();
    assert!(!backups.is_empty());
    assert!(backups.len() <= lexicards_json::DEFAULT_MAX_BACKUPS);
}

#[tokio::test]
async fn bare_legacy_array_is_migrated_and_rewritten() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("lexicards.json");
    let id = uuid::Uuid::new_v4();
    let legacy = serde_json::json!([
        {
            "id": id,
            "english": "moon",
            "vietnamese": "mặt trăng",
            "createdAt": T0,
            "status": "review",
            "nextReview": T0 + 86_400_000,
            "interval": 6,
            "reviewCount": 4,
            "easeFactor": 2.36
        }
    ]);
    fs::write(&file, serde_json::to_string(&legacy).unwrap()).unwrap();

    let store = JsonStore::open_in(dir.path()).await.unwrap();
    let card = store.get_card(id).await.unwrap();
    assert_eq!(card.status, CardStatus::Learned);
    assert_eq!(card.interval, 6.0);
    assert_eq!(card.reps, 4);

    let on_disk: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&file).unwrap()).unwrap();
    assert_eq!(on_disk["version"], 2);
    assert_eq!(on_disk["cards"][0]["status"], "learned");
    assert!(on_disk["cards"][0].get("easeFactor").is_none());
}

#[tokio::test]
async fn unknown_status_fails_to_open() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("lexicards.json");
    let bad = serde_json::json!({
        "version": 2,
        "cards": [{
            "id": uuid::Uuid::new_v4(),
            "english": "x",
            "vietnamese": "y",
            "createdAt": T0,
            "status": "mastered",
            "interval": 0,
            "stepIndex": 0,
            "nextReview": T0,
            "lapses": 0,
            "reps": 0
        }]
    });
    fs::write(&file, serde_json::to_string(&bad).unwrap()).unwrap();

    match JsonStore::open_in(dir.path()).await {
        Err(CoreError::InvalidState(_)) => {}
        Err(e) => panic!("unexpected error: {e}"),
        Ok(_) => panic!("store opened with an unknown status"),
    }
}

#[tokio::test]
async fn delete_and_replace() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonStore::open_in(dir.path()).await.unwrap();
    let a = store.add_card(NewCard::new("a", "á"), T0).await.unwrap();
    let b = store.add_card(NewCard::new("b", "bê"), T0 + 1).await.unwrap();

    store.delete_card(a.id).await.unwrap();
    assert!(matches!(store.delete_card(a.id).await, Err(CoreError::NotFound(_))));
    assert_eq!(store.list_cards().await.unwrap().len(), 1);

    store.replace_all(vec![a.clone(), b.clone()]).await.unwrap();
    let listed = store.list_cards().await.unwrap();
    assert_eq!(listed.iter().map(|c| c.id).collect::<Vec<_>>(), vec![a.id, b.id]);
}

#[tokio::test]
async fn failed_write_leaves_state_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonStore::open_in(dir.path()).await.unwrap();
    let card = store.add_card(NewCard::new("stone", "hòn đá"), T0).await.unwrap();

    // A plain file where the backups directory should be makes every write fail.
    let backups = dir.path().join("backups");
    fs::remove_dir_all(&backups).unwrap();
    fs::write(&backups, b"not a directory").unwrap();

    let graded = schedule(&card, Grade::Correct, T0).unwrap();
    assert!(matches!(store.update_card(&graded).await, Err(CoreError::Storage(_))));
    assert_eq!(store.get_card(card.id).await.unwrap(), card);

    assert!(store.add_card(NewCard::new("sand", "cát"), T0).await.is_err());
    assert!(store.delete_card(card.id).await.is_err());
    assert_eq!(store.list_cards().await.unwrap(), vec![card.clone()]);

    fs::remove_file(&backups).unwrap();
    let reopened = JsonStore::open_in(dir.path()).await.unwrap();
    assert_eq!(reopened.get_card(card.id).await.unwrap(), card);
}

#[tokio::test]
async fn same_timestamp_cards_list_in_stable_order() {
    let dir = tempfile::tempdir().unwrap();
    let first = {
        let store = JsonStore::open_in(dir.path()).await.unwrap();
        for (en, vi) in [("one", "một"), ("two", "hai"), ("three", "ba"), ("four", "bốn")] {
            store.add_card(NewCard::new(en, vi), T0).await.unwrap();
        }
        store.list_cards().await.unwrap()
    };
    let mut ids: Vec<_> = first.iter().map(|c| c.id).collect();
    let listed = ids.clone();
    ids.sort();
    assert_eq!(listed, ids);

    let store = JsonStore::open_in(dir.path()).await.unwrap();
    let again = store.list_cards().await.unwrap();
    assert_eq!(again, first);

    let due = compute_due(&again, &SessionExclusions::new(), T0);
    assert_eq!(due.iter().map(|c| c.id).collect::<Vec<_>>(), ids);
}
