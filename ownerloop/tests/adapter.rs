use ownerloop::{Executor, Job, LoopBuilder, wrap_executor};
use std::sync::{Arc, Mutex, mpsc};
use std::thread;

/// A collaborator that only needs to hand work off.
fn record_greeting<E: Executor>(executor: &E, log: &Arc<Mutex<Vec<String>>>) {
    let log = log.clone();
    let name = executor.name().to_owned();

    executor
        .tell(move || log.lock().unwrap().push(format!("hello from {name}")))
        .unwrap();
}

#[test]
fn test_collaborator_runs_on_owner_loop() {
    let main = LoopBuilder::new("main").build();
    let log = Arc::new(Mutex::new(Vec::new()));

    record_greeting(&*main, &log);
    assert!(log.lock().unwrap().is_empty());

    main.run_all_tasks();
    assert_eq!(*log.lock().unwrap(), vec!["hello from main"]);
}

#[test]
fn test_collaborator_runs_on_adapter() {
    let inline = wrap_executor("inline", |job: Job| job());
    let log = Arc::new(Mutex::new(Vec::new()));

    record_greeting(&inline, &log);

    assert_eq!(*log.lock().unwrap(), vec!["hello from inline"]);
}

#[test]
fn test_adapter_over_worker_thread() {
    let (transmitter, receiver) = mpsc::channel::<Job>();
    let worker = thread::spawn(move || {
        for job in receiver {
            job();
        }
    });

    let transmitter = Mutex::new(transmitter);
    let background = wrap_executor("background", move |job| {
        let _ = transmitter.lock().unwrap().send(job);
    });

    let handle = background
        .ask(|done| Box::new(move || done.complete(thread::current().id())))
        .unwrap();

    assert_ne!(*handle.wait(), thread::current().id());

    drop(background);
    worker.join().unwrap();
}

#[test]
fn test_adapter_feeding_owner_loop() {
    let main = LoopBuilder::new("main").build();

    let forward = {
        let main = main.clone();
        wrap_executor("forward", move |job: Job| {
            let _ = main.schedule(main.wrap_runnable(job));
        })
    };

    let handle = forward
        .ask(|done| Box::new(move || done.complete("forwarded")))
        .unwrap();
    assert!(!handle.is_done());

    assert_eq!(*main.join(&handle), "forwarded");
}
