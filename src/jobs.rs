//! # Background Jobs and Node Ops
//!
//! Two ways of moving work off the UI thread's critical path:
//!
//! - [`schedule_job`] runs a closure on a worker thread and returns a
//!   [`Job`] handle to poll or block on.
//! - [`JobScheduler::schedule_node_op`] queues a closure that edits the scene
//!   graph; the loop that owns the frame runs all queued ops at a safe point
//!   with [`JobScheduler::execute_node_ops`], before committing.

use std::collections::VecDeque;
use std::thread;

use futures::channel::oneshot;
use parking_lot::Mutex;

use crate::error::{Result, SgError};

/// Handle to the result of a background job
pub struct Job<T> {
    receiver: oneshot::Receiver<T>,
    result: Option<T>,
    finished: bool,
}

impl<T> Job<T> {
    /// True once the job has finished, successfully or not
    pub fn is_ready(&mut self) -> bool {
        if self.finished {
            return true;
        }
        match self.receiver.try_recv() {
            Ok(Some(value)) => {
                self.result = Some(value);
                self.finished = true;
            }
            Ok(None) => {}
            Err(oneshot::Canceled) => self.finished = true,
        }
        self.finished
    }

    /// Blocks until the job is done and returns its result
    pub fn get(mut self) -> Result<T> {
        if let Some(value) = self.result.take() {
            return Ok(value);
        }
        if self.finished {
            return Err(SgError::JobCancelled);
        }
        futures::executor::block_on(self.receiver).map_err(|_| SgError::JobCancelled)
    }
}

/// Runs `job` on a new worker thread
///
/// If the job panics its sender is dropped and [`Job::get`] reports
/// [`SgError::JobCancelled`].
pub fn schedule_job<T, F>(job: F) -> Job<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (sender, receiver) = oneshot::channel();
    thread::spawn(move || {
        // The handle may have been dropped; nobody is waiting then
        let _ = sender.send(job());
    });
    Job {
        receiver,
        result: None,
        finished: false,
    }
}

/// A deferred scene graph edit
pub type NodeOp = Box<dyn FnOnce() -> Result<()> + Send>;

/// Queue of scene graph edits waiting for the owning loop
#[derive(Default)]
pub struct JobScheduler {
    node_ops: Mutex<VecDeque<NodeOp>>,
}

impl JobScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule_node_op<F>(&self, op: F)
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        self.node_ops.lock().push_back(Box::new(op));
    }

    pub fn pending_node_ops(&self) -> usize {
        self.node_ops.lock().len()
    }

    /// Runs every queued op in order, returning how many ran
    ///
    /// Failing ops are logged and skipped. Ops queued while draining run on
    /// the next call.
    pub fn execute_node_ops(&self) -> usize {
        let ops: Vec<NodeOp> = self.node_ops.lock().drain(..).collect();
        let count = ops.len();
        for op in ops {
            if let Err(e) = op() {
                log::error!("node op failed: {e}");
            }
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sg::factory::create_node;
    use std::sync::Arc;

    #[test]
    fn test_job_result_is_delivered() {
        let job = schedule_job(|| (1..=10).sum::<i32>());
        assert_eq!(job.get().unwrap(), 55);
    }

    #[test]
    fn test_panicking_job_is_cancelled() {
        let mut job = schedule_job(|| -> i32 { panic!("worker failed") });
        while !job.is_ready() {
            thread::yield_now();
        }
        assert!(matches!(job.get(), Err(SgError::JobCancelled)));
    }

    #[test]
    fn test_node_ops_run_in_order_and_survive_errors() {
        let scheduler = Arc::new(JobScheduler::new());
        let node = create_node("value", "int").unwrap();

        let target = node.clone();
        scheduler.schedule_node_op(move || target.set_value(1).map(|_| ()));
        scheduler.schedule_node_op(|| Err(SgError::JobCancelled));
        let target = node.clone();
        scheduler.schedule_node_op(move || target.set_value(2).map(|_| ()));
        assert_eq!(scheduler.pending_node_ops(), 3);

        // Ops only run when drained
        assert_eq!(node.value_as::<i32>().unwrap(), 0);
        assert_eq!(scheduler.execute_node_ops(), 3);
        assert_eq!(node.value_as::<i32>().unwrap(), 2);
        assert_eq!(scheduler.execute_node_ops(), 0);
    }
}
