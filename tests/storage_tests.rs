//! Storage Persistence Tests
//!
//! Verify that client state written through the SQLite storage survives reopening
//! the database file, the way browser storage survives a page reload.
//!
//! Run with: `cargo test --test storage_tests`

use std::sync::Arc;
use study_buddy::identity::SessionIdentity;
use study_buddy::storage::{CHAT_HISTORY_KEY, THEME_KEY, USER_ID_KEY};
use study_buddy::theme::{ThemePreference, ThemeStore};
use study_buddy::{ChatEntry, Database, HeadlessView, HistoryPolicy, HistoryStore, Storage};

/// Test basic get/set/remove against an in-memory database
#[tokio::test]
async fn test_database_get_set_remove() {
    let db = Database::new(":memory:").await.unwrap();

    assert_eq!(db.get(THEME_KEY).await.unwrap(), None);
    db.set(THEME_KEY, "light").await.unwrap();
    db.set(THEME_KEY, "dark").await.unwrap();
    assert_eq!(db.get(THEME_KEY).await.unwrap(), Some("dark".to_string()));
    assert_eq!(db.keys().await.unwrap(), vec![THEME_KEY.to_string()]);

    db.remove(THEME_KEY).await.unwrap();
    db.remove(THEME_KEY).await.unwrap();
    assert_eq!(db.get(THEME_KEY).await.unwrap(), None);
    assert!(db.keys().await.unwrap().is_empty());
}

/// Test that identity, theme and history survive reopening the file
#[tokio::test]
async fn test_state_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("study_buddy.db");
    let path = path.to_str().unwrap();

    let identity = {
        let storage: Arc<dyn Storage> = Arc::new(Database::new(path).await.unwrap());
        let identity = SessionIdentity::load_or_create(storage.as_ref()).await;

        let themes = ThemeStore::new(storage.clone(), Arc::new(HeadlessView::new()));
        themes.set(ThemePreference::Light).await;

        let history = HistoryStore::new(storage, 3, HistoryPolicy::Persistent);
        for text in ["one", "two", "three", "four"] {
            history.append(ChatEntry::user(text)).await;
        }
        identity
    };

    let db = Database::new(path).await.unwrap();
    assert_eq!(
        db.keys().await.unwrap(),
        vec![
            CHAT_HISTORY_KEY.to_string(),
            THEME_KEY.to_string(),
            USER_ID_KEY.to_string()
        ]
    );

    let storage: Arc<dyn Storage> = Arc::new(db);
    assert_eq!(SessionIdentity::load_or_create(storage.as_ref()).await, identity);

    let themes = ThemeStore::new(storage.clone(), Arc::new(HeadlessView::new()));
    assert_eq!(themes.get().await, ThemePreference::Light);

    let history = HistoryStore::new(storage, 3, HistoryPolicy::Persistent);
    let texts: Vec<_> = history.load_all().await.into_iter().map(|e| e.text).collect();
    assert_eq!(texts, vec!["two", "three", "four"]);
}

/// Test that a locked database reports an error instead of a missing key,
/// so the stored identity is never replaced
#[tokio::test]
async fn test_locked_database_read_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("study_buddy.db");
    let path = path.to_str().unwrap();

    let db = Database::new(path).await.unwrap();
    let identity = SessionIdentity::load_or_create(&db).await;

    let writer = sqlite::open(path).unwrap();
    writer.execute("BEGIN EXCLUSIVE").unwrap();

    assert!(db.get(USER_ID_KEY).await.is_err());
    assert!(db.keys().await.is_err());
    let during_lock = SessionIdentity::load_or_create(&db).await;
    assert_ne!(during_lock, identity);

    writer.execute("ROLLBACK").unwrap();

    assert_eq!(
        db.get(USER_ID_KEY).await.unwrap().as_deref(),
        Some(identity.as_str())
    );
    assert_eq!(SessionIdentity::load_or_create(&db).await, identity);
}
