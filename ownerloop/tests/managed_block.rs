use ownerloop::{Executor, LoopBuilder};
use ownerloop::fault::ResourceExhausted;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

#[test]
fn test_managed_block_returns_when_already_satisfied() {
    let main = LoopBuilder::new("main").build();

    main.managed_block(|| true);

    assert_eq!(main.blocking_depth(), 0);
}

#[test]
fn test_managed_block_runs_queued_task_it_depends_on() {
    let main = LoopBuilder::new("main").build();
    let done = Arc::new(AtomicBool::new(false));

    let producer = {
        let main = main.clone();
        let done = done.clone();
        thread::spawn(move || {
            main.execute(move || done.store(true, Ordering::SeqCst))
                .unwrap();
        })
    };
    producer.join().unwrap();

    main.managed_block(|| done.load(Ordering::SeqCst));

    assert!(done.load(Ordering::SeqCst));
    assert_eq!(main.pending_count(), 0);
}

#[test]
fn test_managed_block_wakes_on_late_submission() {
    let main = LoopBuilder::new("main")
        .idle_wait(Duration::from_millis(50))
        .build();
    let done = Arc::new(AtomicBool::new(false));

    let producer = {
        let main = main.clone();
        let done = done.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(30));
            main.execute(move || done.store(true, Ordering::SeqCst))
                .unwrap();
        })
    };

    let start = Instant::now();
    main.managed_block(|| done.load(Ordering::SeqCst));

    assert!(start.elapsed() < Duration::from_secs(5));
    producer.join().unwrap();
}

#[test]
fn test_managed_block_predicate_driven_deadline() {
    let main = LoopBuilder::new("main").build();
    let deadline = Instant::now() + Duration::from_millis(20);

    main.managed_block(|| Instant::now() >= deadline);

    assert!(Instant::now() >= deadline);
    assert_eq!(main.blocking_depth(), 0);
}

#[test]
fn test_nested_managed_blocks() {
    let main = LoopBuilder::new("main").build();
    let outer_done = Arc::new(AtomicBool::new(false));
    let inner_done = Arc::new(AtomicBool::new(false));
    let deepest = Arc::new(AtomicUsize::new(0));

    // The first task blocks on the second one from inside the outer block.
    {
        let nested = main.clone();
        let outer_done = outer_done.clone();
        let inner_done = inner_done.clone();
        main.schedule(main.wrap_runnable(Box::new(move || {
            nested.managed_block(|| inner_done.load(Ordering::SeqCst));
            outer_done.store(true, Ordering::SeqCst);
        })))
        .unwrap();
    }
    {
        let observer = main.clone();
        let inner_done = inner_done.clone();
        let deepest = deepest.clone();
        main.schedule(main.wrap_runnable(Box::new(move || {
            deepest.store(observer.blocking_depth(), Ordering::SeqCst);
            inner_done.store(true, Ordering::SeqCst);
        })))
        .unwrap();
    }

    main.managed_block(|| outer_done.load(Ordering::SeqCst));

    assert_eq!(deepest.load(Ordering::SeqCst), 2);
    assert_eq!(main.blocking_depth(), 0);
    assert!(!main.is_blocking());
}

#[test]
fn test_depth_restored_after_fatal_fault() {
    let main = LoopBuilder::new("main").build();

    main.tell(|| panic::panic_any(ResourceExhausted::new("heap")))
        .unwrap();

    let result = panic::catch_unwind(AssertUnwindSafe(|| main.managed_block(|| false)));

    let payload = result.unwrap_err();
    assert!(payload.is::<ResourceExhausted>());
    assert_eq!(main.blocking_depth(), 0);
}

#[test]
fn test_depth_restored_after_predicate_panics() {
    let main = LoopBuilder::new("main").build();

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        main.managed_block(|| panic!("predicate failed"))
    }));

    assert!(result.is_err());
    assert_eq!(main.blocking_depth(), 0);
}

#[test]
fn test_recoverable_fault_does_not_end_managed_block() {
    let main = LoopBuilder::new("main").build();
    let done = Arc::new(AtomicBool::new(false));

    main.tell(|| panic!("recoverable")).unwrap();

    let d = done.clone();
    main.tell(move || d.store(true, Ordering::SeqCst)).unwrap();

    main.managed_block(|| done.load(Ordering::SeqCst));
    assert_eq!(main.blocking_depth(), 0);
}

#[test]
fn test_join_waits_on_handle_from_other_thread() {
    let main = LoopBuilder::new("main").build();

    let producer = {
        let main = main.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            main.submit(|| vec![1, 2, 3]).unwrap()
        })
    };

    while !producer.is_finished() {
        main.wait_for_tasks();
    }

    let handle = producer.join().unwrap();
    assert_eq!(main.join(&handle), &vec![1, 2, 3]);
}
