//! FIFO, single-flight and failure isolation of AsyncTaskQueue

use command_core::{AsyncTaskQueue, TaskError, TaskOutcome};
use rand::Rng;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::runtime::Handle;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn completion_order_matches_submission_order() {
    let queue = AsyncTaskQueue::new("fifo");
    let completed = Arc::new(Mutex::new(Vec::new()));

    let latencies: Vec<u64> = {
        let mut rng = rand::thread_rng();
        (0..20).map(|_| rng.gen_range(0..15)).collect()
    };

    for (index, latency) in latencies.into_iter().enumerate() {
        let completed = Arc::clone(&completed);
        queue.add_fn(format!("task-{}", index), move || async move {
            tokio::time::sleep(Duration::from_millis(latency)).await;
            completed.lock().unwrap().push(index);
            Ok(())
        });
    }

    queue.wait_idle().await;

    let order = completed.lock().unwrap().clone();
    assert_eq!(order, (0..20).collect::<Vec<_>>());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn never_more_than_one_task_in_flight() {
    let queue = AsyncTaskQueue::new("single-flight");
    let in_flight = Arc::new(AtomicUsize::new(0));
    let max_seen = Arc::new(AtomicUsize::new(0));

    // Submit from several producers at once while the queue is draining
    let mut producers = Vec::new();
    for producer in 0..4 {
        let queue = queue.clone();
        let in_flight = Arc::clone(&in_flight);
        let max_seen = Arc::clone(&max_seen);
        producers.push(tokio::spawn(async move {
            for i in 0..10 {
                let in_flight = Arc::clone(&in_flight);
                let max_seen = Arc::clone(&max_seen);
                queue.add_fn(format!("p{}-{}", producer, i), move || async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    max_seen.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(1)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    Ok(())
                });
                tokio::task::yield_now().await;
            }
        }));
    }
    for producer in producers {
        producer.await.unwrap();
    }

    queue.wait_idle().await;

    assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    assert_eq!(queue.stats().completed, 40);
}

#[tokio::test]
async fn failing_task_does_not_block_the_next() {
    let queue = AsyncTaskQueue::new("failures");
    let ran = Arc::new(Mutex::new(Vec::new()));

    let log = Arc::clone(&ran);
    let t1 = queue.add_fn("Task1", move || async move {
        log.lock().unwrap().push("Task1");
        Ok(())
    });
    let t2 = queue.add_fn("Task2", || async { Err(TaskError::failed("rejected")) });
    let log = Arc::clone(&ran);
    let t3 = queue.add_fn("Task3", move || async move {
        log.lock().unwrap().push("Task3");
        Ok(())
    });

    assert!(t1.outcome().await.is_completed());
    assert_eq!(
        t2.outcome().await,
        TaskOutcome::Failed(TaskError::Failed("rejected".into()))
    );
    assert!(t3.outcome().await.is_completed());

    queue.wait_idle().await;
    assert_eq!(queue.pending_count(), 0);
    assert!(!queue.is_draining());
    assert_eq!(*ran.lock().unwrap(), vec!["Task1", "Task3"]);

    let stats = queue.stats();
    assert_eq!(stats.submitted, 3);
    assert_eq!(stats.completed, 2);
    assert_eq!(stats.failed, 1);
}

#[tokio::test]
async fn task_added_while_draining_runs_after_queued_ones() {
    let queue = AsyncTaskQueue::new("nested");
    let order = Arc::new(Mutex::new(Vec::new()));

    // The first task enqueues a follow-up while it is itself running
    let inner_queue = queue.clone();
    let log = Arc::clone(&order);
    queue.add_fn("outer", move || async move {
        let follow_up_log = Arc::clone(&log);
        inner_queue.add_fn("follow-up", move || async move {
            follow_up_log.lock().unwrap().push("follow-up");
            Ok(())
        });
        log.lock().unwrap().push("outer");
        Ok(())
    });
    let log = Arc::clone(&order);
    queue.add_fn("second", move || async move {
        log.lock().unwrap().push("second");
        Ok(())
    });

    queue.wait_idle().await;
    assert_eq!(*order.lock().unwrap(), vec!["outer", "second", "follow-up"]);
}

#[tokio::test]
async fn queue_can_target_an_explicit_runtime() {
    let queue = AsyncTaskQueue::with_runtime("explicit", Handle::current());
    let handle = queue.add_fn("noop", || async { Ok(()) });

    assert_eq!(handle.name(), "noop");
    assert!(handle.outcome().await.is_completed());
    assert_eq!(queue.running_task(), None);
}
