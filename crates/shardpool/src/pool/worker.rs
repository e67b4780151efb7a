//! The worker loop.
//!
//! A worker is bound to one queue for its whole life. It runs jobs one at a
//! time and exits once the queue is disconnected and drained. A panicking task
//! is caught per job, so one bad task cannot starve the rest of its queue.

use crate::{Job, Task, stats::Counters};
use crossbeam_channel::Receiver;
use std::{
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};

pub(crate) fn worker_loop(
    worker_id: usize,
    queue_index: usize,
    rx: Receiver<Job>,
    counters: Arc<Counters>,
) {
    #[cfg(feature = "tracing")]
    tracing::debug!("Worker {} started on queue {}", worker_id, queue_index);
    #[cfg(not(feature = "tracing"))]
    let _ = queue_index;

    for job in rx.iter() {
        run_job(worker_id, job, &counters);
    }

    #[cfg(feature = "tracing")]
    tracing::debug!("Worker {} stopped: queue {} drained", worker_id, queue_index);
}

/// Runs one job to completion. A callback only runs if its task returned
/// normally.
pub(crate) fn run_job(worker_id: usize, job: Job, counters: &Counters) {
    match job {
        Job::Single(task) => {
            run_guarded(worker_id, task, counters);
        }
        Job::WithCallback { task, callback } => {
            if run_guarded(worker_id, task, counters) {
                run_guarded(worker_id, callback, counters);
            }
        }
    }
    counters.record_completed();
}

fn run_guarded(_worker_id: usize, task: Task, counters: &Counters) -> bool {
    match panic::catch_unwind(AssertUnwindSafe(task)) {
        Ok(()) => true,
        Err(_payload) => {
            counters.record_panicked();
            #[cfg(feature = "tracing")]
            tracing::error!(
                "Worker {} recovered from task panic: {}",
                _worker_id,
                panic_message(_payload.as_ref())
            );
            false
        }
    }
}

#[cfg(any(feature = "tracing", test))]
fn panic_message(payload: &(dyn core::any::Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "<non-string panic payload>"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn callback_follows_task() {
        let counters = Counters::default();
        let log = Arc::new(Mutex::new(Vec::new()));
        let (task_log, callback_log) = (Arc::clone(&log), Arc::clone(&log));

        run_job(
            0,
            Job::with_callback(
                move || task_log.lock().unwrap().push("task"),
                move || callback_log.lock().unwrap().push("callback"),
            ),
            &counters,
        );

        assert_eq!(*log.lock().unwrap(), vec!["task", "callback"]);
        assert_eq!(counters.snapshot().completed, 1);
    }

    #[test]
    fn panicking_task_skips_its_callback() {
        let counters = Counters::default();
        let called = Arc::new(Mutex::new(false));
        let flag = Arc::clone(&called);

        run_job(
            0,
            Job::with_callback(|| panic!("boom"), move || *flag.lock().unwrap() = true),
            &counters,
        );

        assert!(!*called.lock().unwrap());
        let stats = counters.snapshot();
        assert_eq!(stats.panicked, 1);
        assert_eq!(stats.completed, 1);
    }

    #[test]
    fn panicking_callback_is_contained() {
        let counters = Counters::default();
        run_job(0, Job::with_callback(|| {}, || panic!("late")), &counters);
        assert_eq!(counters.snapshot().panicked, 1);
    }

    #[test]
    fn loop_survives_panics_and_drains() {
        let counters = Arc::new(Counters::default());
        let (tx, rx) = crossbeam_channel::bounded(8);
        let ran = Arc::new(Mutex::new(0));

        tx.send(Job::new(|| panic!("first"))).unwrap();
        for _ in 0..3 {
            let ran = Arc::clone(&ran);
            tx.send(Job::new(move || *ran.lock().unwrap() += 1)).unwrap();
        }
        drop(tx);

        worker_loop(0, 0, rx, Arc::clone(&counters));

        assert_eq!(*ran.lock().unwrap(), 3);
        let stats = counters.snapshot();
        assert_eq!(stats.completed, 4);
        assert_eq!(stats.panicked, 1);
    }

    #[test]
    fn panic_message_reads_common_payloads() {
        let payload = panic::catch_unwind(|| panic!("static")).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "static");

        let payload = panic::catch_unwind(|| panic!("owned {}", 7)).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "owned 7");

        let payload = panic::catch_unwind(|| std::panic::panic_any(42_u8)).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "<non-string panic payload>");
    }
}
