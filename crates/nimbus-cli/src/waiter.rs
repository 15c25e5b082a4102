//! The task waiter: polls asynchronous control-plane tasks to completion.
//!
//! Mutating commands get back a list of task IDs. Each task moves through
//! `Submitted → Polling → {Succeeded, Failed, TimedOut}`; the waiter polls
//! the status endpoint sequentially, in submission order, sleeping a fixed
//! interval between polls, until every task is terminal or its deadline
//! passes. A succeeded task is handed to a [`TaskResultResolver`] exactly
//! once to fetch the resource it produced.
//!
//! The waiter is a pure observer: it never mutates remote state, and a
//! local abort (Ctrl-C) stops polling without touching the remote task.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::{sleep, Instant};
use tracing::{debug, trace, warn};

use nimbus_api::tasks;
use nimbus_api::{ApiClient, ApiError, TaskId, TaskInfo, TaskState};

/// Error type resolvers may return: resource-specific follow-up logic
/// decides what counts as a failure.
pub type ResolveFailure = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised during the wait phase.
#[derive(Debug, Error)]
pub enum WaitError {
    /// The remote system reported the task failed; message verbatim.
    #[error("task {task} failed: {message}")]
    TaskFailed {
        /// The failed task.
        task: TaskId,
        /// Remote error message.
        message: String,
    },

    /// The local deadline passed before the task reached a terminal state.
    /// A local policy decision, distinct from a remote failure.
    #[error("task {task} did not finish within {waited_secs}s")]
    Timeout {
        /// The task still running at the deadline.
        task: TaskId,
        /// The configured deadline in seconds.
        waited_secs: u64,
    },

    /// A status poll failed with something other than "not found yet".
    #[error("polling task {task} failed: {source}")]
    Poll {
        /// The task being polled.
        task: TaskId,
        /// The underlying API error.
        #[source]
        source: ApiError,
    },

    /// The post-task follow-up fetch failed.
    #[error("resolving result of task {task} failed: {source}")]
    Resolve {
        /// The completed task whose result could not be resolved.
        task: TaskId,
        /// The underlying cause.
        #[source]
        source: ResolveFailure,
    },

    /// The user aborted the wait; the remote task keeps running.
    #[error("interrupted while waiting for tasks; remote tasks keep running")]
    Interrupted,
}

/// Source of task status, the seam between the waiter and the API.
pub trait TaskStatusSource {
    /// Fetch the current state of a task.
    fn task(&self, id: &TaskId) -> impl Future<Output = Result<TaskInfo, ApiError>> + Send;
}

impl TaskStatusSource for ApiClient {
    async fn task(&self, id: &TaskId) -> Result<TaskInfo, ApiError> {
        tasks::get(self, id).await
    }
}

/// Maps a completed task to the resource it produced.
///
/// One implementation per command: "fetch the instance this task created",
/// "confirm the instance is gone", and so on. Invoked exactly once per
/// succeeded task.
pub trait TaskResultResolver {
    /// The record rendered for the task.
    type Output;

    /// Resolve the completed task into its produced resource.
    fn resolve(
        &self,
        task: &TaskId,
    ) -> impl Future<Output = Result<Self::Output, ResolveFailure>> + Send;
}

/// Outcome of waiting on a batch of tasks.
///
/// Tasks progress independently: a failure stops waiting on that task
/// only, and the rest of the batch still runs to its own terminal state.
#[derive(Debug)]
pub struct WaitReport<T> {
    /// Resolved outputs of succeeded tasks, in submission order.
    pub results: Vec<T>,
    /// Failures, in submission order.
    pub failures: Vec<WaitError>,
}

impl<T> WaitReport<T> {
    /// Collapse the report into a command verdict: the results if every
    /// task succeeded, otherwise the first failure.
    pub fn into_result(mut self) -> Result<Vec<T>, WaitError> {
        if self.failures.is_empty() {
            Ok(self.results)
        } else {
            Err(self.failures.remove(0))
        }
    }
}

/// Polls tasks to completion and resolves their results.
#[derive(Debug)]
pub struct TaskWaiter<'a, S> {
    source: &'a S,
    timeout: Duration,
    poll_interval: Duration,
}

impl<'a, S: TaskStatusSource + Sync> TaskWaiter<'a, S> {
    /// Create a waiter with a per-wait deadline and poll interval.
    #[must_use]
    pub const fn new(source: &'a S, timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            source,
            timeout,
            poll_interval,
        }
    }

    /// Wait for every task in submission order, resolving each success.
    ///
    /// The resolver is invoked exactly once per succeeded task. Failures
    /// are recorded per task and do not stop the rest of the batch.
    pub async fn wait_all<R>(&self, ids: &[TaskId], resolver: &R) -> WaitReport<R::Output>
    where
        R: TaskResultResolver + Sync,
    {
        let mut report = WaitReport {
            results: Vec::with_capacity(ids.len()),
            failures: Vec::new(),
        };
        for id in ids {
            match self.wait_one(id).await {
                Ok(()) => match resolver.resolve(id).await {
                    Ok(output) => report.results.push(output),
                    Err(source) => {
                        let err = WaitError::Resolve {
                            task: id.clone(),
                            source,
                        };
                        warn!(task = %id, error = %err, "task result resolution failed");
                        report.failures.push(err);
                    }
                },
                Err(err) => {
                    warn!(task = %id, error = %err, "task did not succeed");
                    report.failures.push(err);
                }
            }
        }
        report
    }

    /// Poll one task until it reaches a terminal state or the deadline.
    async fn wait_one(&self, id: &TaskId) -> Result<(), WaitError> {
        let deadline = Instant::now() + self.timeout;
        loop {
            match self.source.task(id).await {
                Ok(info) => {
                    trace!(task = %id, state = %info.state, "task poll");
                    match info.state {
                        TaskState::Finished => {
                            debug!(task = %id, "task finished");
                            return Ok(());
                        }
                        TaskState::Error => {
                            return Err(WaitError::TaskFailed {
                                task: id.clone(),
                                message: info
                                    .error
                                    .unwrap_or_else(|| "task failed without a message".into()),
                            });
                        }
                        TaskState::New | TaskState::Running => {}
                    }
                }
                // The task endpoint may not know a just-submitted task yet;
                // a typed 404 counts as still running, nothing else does.
                Err(err) if err.is_not_found() => {
                    trace!(task = %id, "task not reported yet");
                }
                Err(source) => {
                    return Err(WaitError::Poll {
                        task: id.clone(),
                        source,
                    });
                }
            }
            if Instant::now() >= deadline {
                return Err(WaitError::Timeout {
                    task: id.clone(),
                    waited_secs: self.timeout.as_secs(),
                });
            }
            sleep(self.poll_interval).await;
        }
    }
}

/// Run a wait future, aborting promptly on Ctrl-C.
///
/// Aborting never cancels the remote task; it only stops local polling.
pub async fn interruptible<F, T>(wait: F) -> Result<T, WaitError>
where
    F: Future<Output = T>,
{
    tokio::select! {
        result = wait => Ok(result),
        _ = tokio::signal::ctrl_c() => Err(WaitError::Interrupted),
    }
}

/// Resolver adapter for delete confirmation.
///
/// Wraps a resolver that fetches the deleted resource. A typed not-found
/// from the fetch is the success outcome; a successful fetch means the
/// resource still exists (failure); any other error propagates unchanged.
#[derive(Debug)]
pub struct DeleteConfirmation<R> {
    inner: R,
    resource_id: String,
}

impl<R> DeleteConfirmation<R> {
    /// Wrap a fetch resolver for the named resource.
    pub fn new(inner: R, resource_id: impl Into<String>) -> Self {
        Self {
            inner,
            resource_id: resource_id.into(),
        }
    }
}

impl<R> TaskResultResolver for DeleteConfirmation<R>
where
    R: TaskResultResolver + Sync,
    R::Output: Send,
{
    type Output = ();

    async fn resolve(&self, task: &TaskId) -> Result<(), ResolveFailure> {
        match self.inner.resolve(task).await {
            Ok(_) => Err(format!(
                "resource {} still exists after delete",
                self.resource_id
            )
            .into()),
            Err(err) => {
                if err
                    .downcast_ref::<ApiError>()
                    .is_some_and(ApiError::is_not_found)
                {
                    Ok(())
                } else {
                    Err(err)
                }
            }
        }
    }
}
