use super::*;
use models::Role;
use uuid::Uuid;

fn user(name: &str) -> User {
    User {
        id: Uuid::new_v4(),
        name: name.to_owned(),
        email: format!("{}@example.com", name.to_lowercase()),
        role: Role::Client,
        phone: None,
        address: None,
        created_at: None,
    }
}

fn session(name: &str) -> Session {
    Session { token: format!("tok-{name}"), user: user(name) }
}

#[test]
fn new_store_without_storage_entries_is_anonymous() {
    let store = SessionStore::in_memory();
    assert!(store.current().is_none());
    assert!(!store.is_authenticated());
    assert!(store.token().is_none());
}

#[test]
fn set_persists_token_and_user_keys() {
    let storage = Arc::new(MemoryStorage::new());
    let store = SessionStore::new(storage.clone());
    let s = session("Alice");
    store.set(s.clone());

    assert_eq!(storage.get(TOKEN_KEY).as_deref(), Some("tok-Alice"));
    let stored: User = serde_json::from_str(&storage.get(USER_KEY).unwrap()).unwrap();
    assert_eq!(stored, s.user);
    assert_eq!(store.current(), Some(s));
}

#[test]
fn restores_session_from_storage() {
    let storage = Arc::new(MemoryStorage::new());
    let s = session("Bob");
    storage.set(TOKEN_KEY, &s.token).unwrap();
    storage.set(USER_KEY, &serde_json::to_string(&s.user).unwrap()).unwrap();

    let store = SessionStore::new(storage);
    assert_eq!(store.current(), Some(s));
}

#[test]
fn corrupt_user_entry_clears_both_keys() {
    let storage = Arc::new(MemoryStorage::new());
    storage.set(TOKEN_KEY, "tok").unwrap();
    storage.set(USER_KEY, "{not json").unwrap();

    let store = SessionStore::new(storage.clone());
    assert!(store.current().is_none());
    assert!(storage.get(TOKEN_KEY).is_none());
    assert!(storage.get(USER_KEY).is_none());
}

#[test]
fn token_without_user_is_discarded() {
    let storage = Arc::new(MemoryStorage::new());
    storage.set(TOKEN_KEY, "orphan").unwrap();

    let store = SessionStore::new(storage.clone());
    assert!(store.current().is_none());
    assert!(storage.get(TOKEN_KEY).is_none());
}

#[test]
fn clear_reports_only_the_first_removal() {
    let store = SessionStore::in_memory();
    store.set(session("Carol"));

    assert!(store.clear());
    assert!(!store.clear());
    assert!(store.current().is_none());
}

#[test]
fn set_replaces_existing_session() {
    let store = SessionStore::in_memory();
    store.set(session("Dan"));
    let second = session("Eve");
    store.set(second.clone());
    assert_eq!(store.current(), Some(second));
}

#[test]
fn update_user_keeps_token() {
    let store = SessionStore::in_memory();
    let s = session("Fay");
    store.set(s.clone());
    let mut renamed = s.user.clone();
    renamed.name = "Fay Renamed".to_owned();

    store.update_user(renamed.clone());
    let current = store.current().unwrap();
    assert_eq!(current.token, s.token);
    assert_eq!(current.user, renamed);
}

#[test]
fn update_user_without_session_is_a_no_op() {
    let store = SessionStore::in_memory();
    store.update_user(user("Ghost"));
    assert!(store.current().is_none());
}

#[tokio::test]
async fn subscribers_observe_login_and_logout() {
    let store = SessionStore::in_memory();
    let mut rx = store.subscribe();

    store.set(session("Hal"));
    rx.changed().await.unwrap();
    assert!(rx.borrow_and_update().is_some());

    store.clear();
    rx.changed().await.unwrap();
    assert!(rx.borrow_and_update().is_none());
}

#[test]
fn file_storage_survives_a_new_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("session.json");
    let s = session("Ivy");

    SessionStore::new(Arc::new(FileStorage::new(&path))).set(s.clone());
    let reopened = SessionStore::new(Arc::new(FileStorage::new(&path)));
    assert_eq!(reopened.current(), Some(s));

    assert!(reopened.clear());
    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(!raw.contains(TOKEN_KEY));
}

#[test]
fn file_storage_missing_file_reads_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::new(dir.path().join("absent.json"));
    assert!(storage.get(TOKEN_KEY).is_none());
    storage.remove(TOKEN_KEY).unwrap();
}
