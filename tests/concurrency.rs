/// Concurrent access tests
///
/// Invocations interleave on one runtime; these tests verify that the root's
/// singleton cache is the only shared state and that first construction of a
/// singleton happens at most once even when its build suspends.

use ferrous_invoke::{BoxError, ComponentSpec, DiError, Resolver};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug)]
struct Connection {
    serial: usize,
}

fn slow_singleton_spec(builds: Arc<AtomicUsize>) -> ComponentSpec {
    let mut spec = ComponentSpec::new();
    spec.add_singleton("conn", move |_| {
        let builds = builds.clone();
        async move {
            let serial = builds.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(Connection { serial })
        }
    });
    spec.add_scoped("request", |_| async { Ok(String::from("request")) });
    spec
}

#[tokio::test]
async fn test_interleaved_first_resolution_builds_once() {
    let builds = Arc::new(AtomicUsize::new(0));
    let root = slow_singleton_spec(builds.clone()).build(()).unwrap();
    let s1 = root.scope().unwrap();
    let s2 = root.scope().unwrap();

    let (a, b, c) = tokio::join!(
        s1.resolve::<Connection>("conn"),
        s2.resolve::<Connection>("conn"),
        root.resolve::<Connection>("conn"),
    );
    let (a, b, c) = (a.unwrap(), b.unwrap(), c.unwrap());

    assert_eq!(builds.load(Ordering::SeqCst), 1);
    assert!(Arc::ptr_eq(&a, &b));
    assert!(Arc::ptr_eq(&b, &c));
    assert_eq!(a.serial, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_first_resolution_builds_once() {
    let builds = Arc::new(AtomicUsize::new(0));
    let root = slow_singleton_spec(builds.clone()).build(()).unwrap();

    let mut handles = Vec::new();
    for _ in 0..16 {
        let root = root.clone();
        handles.push(tokio::spawn(async move {
            let scope = root.scope()?;
            scope.resolve::<Connection>("conn").await
        }));
    }

    let mut instances = Vec::new();
    for handle in handles {
        instances.push(handle.await.unwrap().unwrap());
    }

    assert_eq!(builds.load(Ordering::SeqCst), 1);
    assert!(instances.iter().all(|c| Arc::ptr_eq(c, &instances[0])));
}

#[tokio::test]
async fn test_failed_singleton_build_is_retried() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let a = attempts.clone();

    let mut spec = ComponentSpec::new();
    spec.add_singleton("flaky", move |_| {
        let attempt = a.fetch_add(1, Ordering::SeqCst);
        async move {
            tokio::task::yield_now().await;
            if attempt == 0 {
                Err::<String, BoxError>("transient outage".into())
            } else {
                Ok(format!("attempt-{}", attempt))
            }
        }
    });

    let root = spec.build(()).unwrap();
    assert!(matches!(
        root.resolve::<String>("flaky").await,
        Err(DiError::Build { name, .. }) if name == "flaky"
    ));

    let first = root.resolve::<String>("flaky").await.unwrap();
    let second = root.scope().unwrap().resolve::<String>("flaky").await.unwrap();
    assert_eq!(*first, "attempt-1");
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_waiters_retry_after_in_flight_failure() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let a = attempts.clone();

    let mut spec = ComponentSpec::new();
    spec.add_singleton("flaky", move |_| {
        let attempt = a.fetch_add(1, Ordering::SeqCst);
        async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            if attempt == 0 {
                Err::<usize, BoxError>("first build fails".into())
            } else {
                Ok(attempt)
            }
        }
    });

    let root = spec.build(()).unwrap();
    let (first, second) = tokio::join!(
        root.resolve::<usize>("flaky"),
        root.resolve::<usize>("flaky"),
    );

    // The failure is not shared: the waiting resolution runs its own build
    assert!(first.is_err());
    assert_eq!(*second.unwrap(), 1);
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_scoped_instances_stay_isolated_under_parallel_invocations() {
    let builds = Arc::new(AtomicUsize::new(0));
    let b = builds.clone();

    let mut spec = ComponentSpec::new();
    spec.add_scoped("request", move |_| {
        let serial = b.fetch_add(1, Ordering::SeqCst);
        async move {
            tokio::task::yield_now().await;
            Ok(serial)
        }
    });
    let root = spec.build(()).unwrap();

    let mut handles = Vec::new();
    for _ in 0..32 {
        let root = root.clone();
        handles.push(tokio::spawn(async move {
            let scope = root.scope()?;
            let first = scope.resolve::<usize>("request").await?;
            tokio::task::yield_now().await;
            let again = scope.resolve::<usize>("request").await?;
            assert!(Arc::ptr_eq(&first, &again));
            Ok::<_, DiError>(*first)
        }));
    }

    let mut serials = Vec::new();
    for handle in handles {
        serials.push(handle.await.unwrap().unwrap());
    }
    serials.sort_unstable();
    serials.dedup();

    assert_eq!(serials.len(), 32);
    assert_eq!(builds.load(Ordering::SeqCst), 32);
}
