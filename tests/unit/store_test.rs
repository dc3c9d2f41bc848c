//! Unit tests for shared booth sessions

use rand::rngs::StdRng;
use rand::SeedableRng;
use selfie_booth::{
    booth::{Operation, SessionStore},
    AppError,
};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn ready_store() -> (Arc<SessionStore>, uuid::Uuid) {
    let store = Arc::new(SessionStore::new(1, Duration::from_secs(60)));
    let session = store.create();
    let mut guard = session.lock();
    guard.accept_consent();
    guard
        .capture("data:image/jpeg;base64,/9j/4AAQ".to_string())
        .unwrap();
    guard
        .pick_theme(&["Wizard".to_string()], &mut StdRng::seed_from_u64(1))
        .unwrap();
    let id = guard.id();
    drop(guard);
    (store, id)
}

#[test]
fn test_only_one_operation_in_flight() {
    let (store, id) = ready_store();
    let styles = vec!["cinematic".to_string()];

    let handles: Vec<_> = (0..8)
        .map(|seed| {
            let store = store.clone();
            let styles = styles.clone();
            thread::spawn(move || {
                let session = store.get(&id).unwrap();
                let mut guard = session.lock();
                guard.begin_transform(&styles, &mut StdRng::seed_from_u64(seed))
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| matches!(e, AppError::Busy)));

    let session = store.get(&id).unwrap();
    assert_eq!(session.lock().processing(), Some(Operation::Transform));
}

#[test]
fn test_busy_sessions_survive_pruning() {
    let store = SessionStore::new(1, Duration::ZERO);
    let idle = store.create();
    let busy = store.create();
    {
        let mut guard = busy.lock();
        guard.accept_consent();
        guard
            .capture("data:image/jpeg;base64,/9j/4AAQ".to_string())
            .unwrap();
        guard
            .pick_theme(&["Wizard".to_string()], &mut StdRng::seed_from_u64(1))
            .unwrap();
        guard
            .begin_transform(&["cinematic".to_string()], &mut StdRng::seed_from_u64(1))
            .unwrap();
    }

    thread::sleep(Duration::from_millis(5));
    assert_eq!(store.prune(), 1);
    assert!(store.get(&idle.lock().id()).is_err());
    assert!(store.get(&busy.lock().id()).is_ok());
}
