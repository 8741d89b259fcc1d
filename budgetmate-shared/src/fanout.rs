/// Structured fan-out for independent reads
///
/// [`TaskGroup`] runs a handful of futures on the tokio runtime and joins
/// them. The first failure is kept and flips a shared
/// [`CancellationToken`]; tasks that have not started their work yet see the
/// token and skip it. Work already in flight is left to finish, so only
/// read-only, idempotent work belongs in a group.
///
/// Each spawned task hands back a [`Slot`] that holds its value once
/// [`TaskGroup::wait`] has returned `Ok`. A skipped task leaves its slot
/// empty.
///
/// # Example
///
/// ```
/// use budgetmate_shared::fanout::TaskGroup;
///
/// # async fn example() -> Result<(), budgetmate_shared::fanout::FanOutError<std::io::Error>> {
/// let mut group = TaskGroup::new();
/// let a = group.spawn(async { Ok::<_, std::io::Error>(2) });
/// let b = group.spawn(async { Ok::<_, std::io::Error>(3) });
/// group.wait().await?;
///
/// assert_eq!(a.take(), Some(2));
/// assert_eq!(b.take(), Some(3));
/// # Ok(())
/// # }
/// ```

use std::future::Future;
use std::sync::Arc;
use tokio::sync::{oneshot, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum FanOutError<E> {
    /// A task returned an error
    #[error("fan-out task failed: {0}")]
    Task(E),

    /// A task panicked or was aborted
    #[error("fan-out task did not complete: {0}")]
    Join(String),
}

/// Receiver for one task's value
#[derive(Debug)]
pub struct Slot<T> {
    rx: oneshot::Receiver<T>,
}

impl<T> Slot<T> {
    /// Takes the value, if the task produced one.
    pub fn take(mut self) -> Option<T> {
        self.rx.try_recv().ok()
    }
}

pub struct TaskGroup<E> {
    tasks: JoinSet<Result<(), E>>,
    cancel: CancellationToken,
    limit: Option<Arc<Semaphore>>,
}

impl<E> Default for TaskGroup<E>
where
    E: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<E> TaskGroup<E>
where
    E: Send + 'static,
{
    pub fn new() -> Self {
        Self {
            tasks: JoinSet::new(),
            cancel: CancellationToken::new(),
            limit: None,
        }
    }

    /// At most `max_concurrent` tasks run at once; the rest queue.
    pub fn with_limit(max_concurrent: usize) -> Self {
        Self {
            limit: Some(Arc::new(Semaphore::new(max_concurrent.max(1)))),
            ..Self::new()
        }
    }

    /// Token cancelled on the first failure. Callers may also cancel it.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Spawns `work`. It is skipped if the group is already cancelled by the
    /// time it would start.
    pub fn spawn<T, F>(&mut self, work: F) -> Slot<T>
    where
        T: Send + 'static,
        F: Future<Output = Result<T, E>> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let cancel = self.cancel.clone();
        let limit = self.limit.clone();

        self.tasks.spawn(async move {
            let _permit = match limit {
                Some(semaphore) => semaphore.acquire_owned().await.ok(),
                None => None,
            };

            if cancel.is_cancelled() {
                debug!("Skipping fan-out task after sibling failure");
                return Ok(());
            }

            match work.await {
                Ok(value) => {
                    let _ = tx.send(value);
                    Ok(())
                }
                Err(e) => {
                    cancel.cancel();
                    Err(e)
                }
            }
        });

        Slot { rx }
    }

    /// Joins every task. Returns the first error observed; later errors are
    /// dropped.
    pub async fn wait(mut self) -> Result<(), FanOutError<E>> {
        let mut first_error = None;

        while let Some(joined) = self.tasks.join_next().await {
            let failure = match joined {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => FanOutError::Task(e),
                Err(e) => {
                    warn!(error = %e, "Fan-out task did not complete");
                    FanOutError::Join(e.to_string())
                }
            };

            self.cancel.cancel();
            if first_error.is_none() {
                first_error = Some(failure);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
