use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};

fn counting_scope(counter: &Arc<AtomicUsize>) -> Scope<&'static str> {
    let counter = Arc::clone(counter);
    Scope::new("db-session", move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })
}

#[test]
fn test_release_runs_once() {
    let released = Arc::new(AtomicUsize::new(0));
    let scope = counting_scope(&released);

    scope.release().unwrap();
    assert_eq!(released.load(Ordering::SeqCst), 1);
}

#[test]
fn test_drop_releases_abandoned_scope() {
    let released = Arc::new(AtomicUsize::new(0));
    {
        let _scope = counting_scope(&released);
    }
    assert_eq!(released.load(Ordering::SeqCst), 1);
}

#[test]
fn test_release_error_is_reported() {
    let scope = Scope::new((), || Err(release_error("connection already closed")));
    let err = scope.release().unwrap_err();
    assert!(matches!(err, Error::ScopeRelease(msg) if msg.contains("already closed")));
}

#[test]
fn test_unmanaged_scope() {
    let scope = Scope::unmanaged(vec![1, 2]);
    assert_eq!(scope.resources().len(), 2);
    assert!(scope.release().is_ok());
}

#[test]
fn test_fn_provisioner_gives_fresh_scopes() {
    let acquired = Arc::new(AtomicUsize::new(0));
    let released = Arc::new(AtomicUsize::new(0));

    let acquired_in = Arc::clone(&acquired);
    let released_in = Arc::clone(&released);
    let provisioner = FnProvisioner::new(move || {
        let n = acquired_in.fetch_add(1, Ordering::SeqCst);
        let released = Arc::clone(&released_in);
        Ok((n, move || {
            released.fetch_add(1, Ordering::SeqCst);
            Ok::<(), Error>(())
        }))
    });

    let first = provisioner.acquire().unwrap();
    let second = provisioner.acquire().unwrap();
    assert_ne!(first.id(), second.id());
    assert_eq!(*first.resources(), 0);
    assert_eq!(*second.resources(), 1);

    first.release().unwrap();
    second.release().unwrap();
    assert_eq!(released.load(Ordering::SeqCst), 2);
}

#[test]
fn test_fn_provisioner_propagates_failure() {
    let provisioner = FnProvisioner::new(|| -> Result<((), fn() -> Result<()>)> {
        Err(Error::ScopeAcquire("pool exhausted".to_string()))
    });
    assert!(matches!(provisioner.acquire(), Err(Error::ScopeAcquire(_))));
}

#[test]
fn test_mock_provisioner() {
    let mut mock = MockScopeProvisioner::new();
    mock.expect_acquire()
        .times(2)
        .returning(|| Ok(Scope::unmanaged(42)));

    assert_eq!(*mock.acquire().unwrap().resources(), 42);
    assert_eq!(*mock.acquire().unwrap().resources(), 42);
}
