use ferrous_ioc::{
    Autowired, ComponentCollection, ComponentDefinition, Container, ContainerConfig, DiError, Resolver, Stage,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

fn lazy_config() -> ContainerConfig {
    ContainerConfig::default().with_eager_init(false)
}

#[test]
fn concurrent_lookups_create_once() {
    let created = Arc::new(AtomicUsize::new(0));
    let counter = created.clone();

    let mut components = ComponentCollection::with_config(lazy_config());
    components
        .register(
            ComponentDefinition::builder::<String>("slow")
                .constructor(move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(20));
                    Ok("done".to_string())
                })
                .build(),
        )
        .unwrap();
    let container = components.build().unwrap();

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let container = container.clone();
            thread::spawn(move || container.get::<String>("slow").unwrap())
        })
        .collect();
    let results: Vec<Arc<String>> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(created.load(Ordering::SeqCst), 1);
    assert!(results.iter().all(|r| Arc::ptr_eq(r, &results[0])));
}

#[test]
fn waiters_see_the_owners_failure() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = attempts.clone();
    let (started_tx, started_rx) = mpsc::channel();
    let started_tx = parking_lot::Mutex::new(started_tx);

    let mut components = ComponentCollection::with_config(lazy_config());
    components
        .register(
            ComponentDefinition::builder::<u8>("doomed")
                .constructor(move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    let _ = started_tx.lock().send(());
                    thread::sleep(Duration::from_millis(200));
                    Err("doomed".into())
                })
                .build(),
        )
        .unwrap();
    let container = components.build().unwrap();

    let owner = {
        let container = container.clone();
        thread::spawn(move || container.get::<u8>("doomed"))
    };
    started_rx.recv().unwrap();
    let waiter = {
        let container = container.clone();
        thread::spawn(move || container.get::<u8>("doomed"))
    };

    for result in [owner.join().unwrap(), waiter.join().unwrap()] {
        let err = result.unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Instantiate));
        assert!(err.to_string().contains("doomed"));
    }
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}

struct A {
    b: Autowired<B>,
}

struct B {
    a: Autowired<A>,
}

fn cross_thread_pair(config: ContainerConfig) -> Container {
    // both constructors must be running at once, one on each thread
    let barrier = Arc::new(Barrier::new(2));
    let (ba, bb) = (barrier.clone(), barrier);

    let mut components = ComponentCollection::with_config(config);
    components
        .register(
            ComponentDefinition::builder::<A>("a")
                .constructor(move |_| {
                    ba.wait();
                    Ok(A { b: Autowired::new() })
                })
                .autowire::<B, _>("b", |a| &a.b)
                .build(),
        )
        .unwrap()
        .register(
            ComponentDefinition::builder::<B>("b")
                .constructor(move |_| {
                    bb.wait();
                    Ok(B { a: Autowired::new() })
                })
                .autowire::<A, _>("a", |b| &b.a)
                .build(),
        )
        .unwrap();
    components.build().unwrap()
}

#[test]
fn cross_thread_field_cycle_does_not_deadlock() {
    let container = cross_thread_pair(lazy_config());

    let t1 = {
        let container = container.clone();
        thread::spawn(move || container.get::<A>("a"))
    };
    let t2 = {
        let container = container.clone();
        thread::spawn(move || container.get::<B>("b"))
    };
    let a = t1.join().unwrap().unwrap();
    let b = t2.join().unwrap().unwrap();

    assert!(Arc::ptr_eq(&a.b.get_required(), &b));
    assert!(Arc::ptr_eq(&b.a.get_required(), &a));
}

#[test]
fn cross_thread_cycle_without_early_references_fails_instead_of_hanging() {
    let container = cross_thread_pair(lazy_config().with_circular_references(false));

    let t1 = {
        let container = container.clone();
        thread::spawn(move || container.get::<A>("a").map(|_| ()))
    };
    let t2 = {
        let container = container.clone();
        thread::spawn(move || container.get::<B>("b").map(|_| ()))
    };
    let results = [t1.join().unwrap(), t2.join().unwrap()];

    // the thread that closes the loop reports the cycle; the other sees it as a failure
    assert!(results.iter().all(Result::is_err));
    assert!(results
        .iter()
        .any(|r| matches!(r, Err(DiError::Circular { .. }))));
}

#[test]
fn waiting_past_the_deadline_times_out() {
    let (started_tx, started_rx) = mpsc::channel();
    let started_tx = parking_lot::Mutex::new(started_tx);

    let config = lazy_config().with_wait_timeout(Duration::from_millis(50));
    let mut components = ComponentCollection::with_config(config);
    components
        .register(
            ComponentDefinition::builder::<u8>("slow")
                .constructor(move |_| {
                    let _ = started_tx.lock().send(());
                    thread::sleep(Duration::from_millis(400));
                    Ok(1)
                })
                .build(),
        )
        .unwrap();
    let container = components.build().unwrap();

    let owner = {
        let container = container.clone();
        thread::spawn(move || container.get::<u8>("slow"))
    };
    started_rx.recv().unwrap();

    match container.get::<u8>("slow") {
        Err(DiError::ResolutionTimeout { name, waited, .. }) => {
            assert_eq!(name, "slow");
            assert!(waited >= Duration::from_millis(50));
        }
        other => panic!("expected ResolutionTimeout, got {other:?}"),
    }

    assert_eq!(*owner.join().unwrap().unwrap(), 1);
    assert_eq!(*container.get::<u8>("slow").unwrap(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn lookups_from_blocking_tasks() {
    let mut components = ComponentCollection::with_config(lazy_config());
    components
        .register(ComponentDefinition::builder::<Vec<u32>>("table").constructor(|_| Ok((0..100).collect())).build())
        .unwrap();
    let container = components.build().unwrap();

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let container = container.clone();
            tokio::task::spawn_blocking(move || container.get::<Vec<u32>>("table").unwrap().len())
        })
        .collect();
    for task in tasks {
        assert_eq!(task.await.unwrap(), 100);
    }
}
