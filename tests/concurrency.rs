use std::{
    sync::{Arc, Barrier, atomic::{AtomicUsize, Ordering}},
    thread,
    time::Duration
};
use trellis::Container;

const THREADS: usize = 16;

#[test]
fn it_registers_from_many_threads() {
    let container = Container::new();
    container.namespace("workers", |_| Ok(())).unwrap();
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles = (0..THREADS)
        .map(|i| {
            let container = container.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                container.register(&format!("workers.w{i}"), move || i)
            })
        })
        .collect::<Vec<_>>();

    for handle in handles {
        handle.join().unwrap().unwrap();
    }

    assert_eq!(container.keys(true).count(), THREADS);
    for i in 0..THREADS {
        assert_eq!(container.resolve::<usize>(&format!("workers.w{i}")).unwrap(), i);
    }
}

#[test]
fn it_runs_memoized_producer_once_under_contention() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    let container = Container::new();
    container.register_memoized("slow", move || {
        thread::sleep(Duration::from_millis(10));
        counter.fetch_add(1, Ordering::SeqCst)
    }).unwrap();

    let barrier = Arc::new(Barrier::new(THREADS));
    let handles = (0..THREADS)
        .map(|_| {
            let container = container.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                container.resolve_shared::<usize>("slow").unwrap()
            })
        })
        .collect::<Vec<_>>();

    let values = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .collect::<Vec<_>>();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(values.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
}

#[test]
fn it_resolves_nested_dependencies_from_many_threads() {
    let container = Container::new();
    container.register("base", || 40usize).unwrap();
    container.register_transient("answer", |c: Container| {
        let base = c.resolve::<usize>("base")?;
        Ok(base + 2)
    }).unwrap();

    let handles = (0..THREADS)
        .map(|_| {
            let container = container.clone();
            thread::spawn(move || container.resolve::<usize>("answer"))
        })
        .collect::<Vec<_>>();

    for handle in handles {
        assert_eq!(handle.join().unwrap().unwrap(), 42);
    }
}

#[test]
fn it_keeps_container_usable_after_panic() {
    let container = Container::new();
    container.register_transient("panics", || -> i32 { panic!("producer failed") }).unwrap();
    container.register("db", || 1).unwrap();

    let cloned = container.clone();
    let result = thread::spawn(move || cloned.resolve::<i32>("panics")).join();

    assert!(result.is_err());
    assert_eq!(container.resolve::<i32>("db").unwrap(), 1);
    container.register("cache", || 2).unwrap();
}
