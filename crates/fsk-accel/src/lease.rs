//! Exclusive accelerator lease management.
//!
//! One accelerator is shared by every concurrently running task in the
//! process; at most one task holds it at a time. Acquisition is a blocking
//! FIFO wait (ticket queue, no priorities), interruptible by task
//! cancellation. Release is idempotent so both the normal path and the
//! failure-cleanup path may call it without corrupting the bookkeeping or
//! waking more waiters than intended.
//!
//! The manager is an explicit instance injected into every writer rather
//! than a process-wide singleton; callers that share one instance get the
//! one-exclusive-resource semantics, and tests can substitute their own.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use tracing::debug;

use fsk_common::{FskError, Result, TaskAttemptId};

use crate::cancel::CancelToken;

// Cancellation poll interval for blocked waiters.
const WAIT_SLICE: Duration = Duration::from_millis(20);

#[derive(Debug, Default)]
struct LeaseState {
    holder: Option<TaskAttemptId>,
    queue: VecDeque<u64>,
    next_ticket: u64,
}

/// FIFO manager for the single shared accelerator.
#[derive(Debug, Default)]
pub struct AccelLeaseManager {
    state: Mutex<LeaseState>,
    turn: Condvar,
}

impl AccelLeaseManager {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Blocks until the accelerator is available to `task`, honoring arrival
    /// order among waiters.
    ///
    /// # Errors
    /// Returns [`FskError::Canceled`] when `cancel` fires while waiting; the
    /// waiter's queue slot is removed so later arrivals are not stalled.
    pub fn acquire(self: &Arc<Self>, task: TaskAttemptId, cancel: &CancelToken) -> Result<AccelLease> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let ticket = state.next_ticket;
        state.next_ticket += 1;
        state.queue.push_back(ticket);

        loop {
            if cancel.is_canceled() {
                state.queue.retain(|t| *t != ticket);
                // The head slot may have shifted; let the new head re-check.
                self.turn.notify_all();
                return Err(FskError::Canceled(format!(
                    "task {task} canceled while waiting for accelerator"
                )));
            }
            if state.holder.is_none() && state.queue.front() == Some(&ticket) {
                state.queue.pop_front();
                state.holder = Some(task);
                debug!(%task, "accelerator lease acquired");
                return Ok(AccelLease {
                    manager: Arc::clone(self),
                    task,
                    released: false,
                });
            }
            let (next, _timeout) = self
                .turn
                .wait_timeout(state, WAIT_SLICE)
                .unwrap_or_else(|e| e.into_inner());
            state = next;
        }
    }

    /// Releases the lease if `task` currently holds it; a no-op otherwise.
    ///
    /// Both the normal path and failure cleanup call this, so a double
    /// release must neither fail nor make the accelerator look available
    /// twice.
    pub fn release_if_held(&self, task: &TaskAttemptId) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.holder.as_ref() == Some(task) {
            state.holder = None;
            debug!(%task, "accelerator lease released");
            self.turn.notify_all();
        }
    }

    /// Current holder, if any.
    #[must_use]
    pub fn holder(&self) -> Option<TaskAttemptId> {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).holder
    }

    /// Number of tasks currently queued behind the holder.
    #[must_use]
    pub fn waiters(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .queue
            .len()
    }
}

/// Scoped hold on the accelerator.
///
/// Dropping the guard releases the lease if [`AccelLease::release`] was not
/// already called, so no exit path can leak the accelerator.
#[derive(Debug)]
pub struct AccelLease {
    manager: Arc<AccelLeaseManager>,
    task: TaskAttemptId,
    released: bool,
}

impl AccelLease {
    /// Hands the accelerator back early, before any non-accelerator work.
    ///
    /// Idempotent; the `Drop` backstop becomes a no-op afterwards.
    pub fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.manager.release_if_held(&self.task);
        }
    }

    #[must_use]
    pub fn task(&self) -> &TaskAttemptId {
        &self.task
    }
}

impl Drop for AccelLease {
    fn drop(&mut self) {
        self.release();
    }
}
