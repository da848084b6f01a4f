use crate::common::{BackgroundExecutor, Task};
use crate::errors::{ErrorKind, OpsError, OpsResult};
use parking_lot::Mutex;
use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use uuid::Uuid;

type Source<R> = Arc<dyn Fn() -> OpsResult<R> + Send + Sync>;
type Observer<R> = Box<dyn FnOnce(OpsResult<R>) + Send>;

/// A cold, single-result computation scheduled on a background executor.
///
/// # Purpose
/// Nothing runs when a `Deferred` is created. Every call to
/// [`subscribe`](Deferred::subscribe) schedules one complete, independent run
/// of the underlying operation on the executor and hands exactly one
/// `Ok(value)` or `Err(error)` to that subscriber's observer.
///
/// # Cancellation
/// [`Subscription::unsubscribe`] only detaches the observer. A run that has
/// not started yet is skipped; a run that already started keeps going until
/// the store work finishes, and its result is dropped.
///
/// # Usage
/// ```rust,ignore
/// let deferred = store.delete().objects(users).prepare()?.as_deferred();
/// let subscription = deferred.subscribe(|result| match result {
///     Ok(results) => log::info!("deleted {} users", results.len()),
///     Err(e) => log::error!("delete failed: {}", e),
/// });
/// ```
pub struct Deferred<R> {
    source: Source<R>,
    executor: Arc<dyn BackgroundExecutor>,
}

impl<R> Clone for Deferred<R> {
    fn clone(&self) -> Self {
        Deferred {
            source: self.source.clone(),
            executor: self.executor.clone(),
        }
    }
}

impl<R: Send + 'static> Deferred<R> {
    pub(crate) fn new(
        source: impl Fn() -> OpsResult<R> + Send + Sync + 'static,
        executor: Arc<dyn BackgroundExecutor>,
    ) -> Self {
        Deferred {
            source: Arc::new(source),
            executor,
        }
    }

    /// Schedules one run and delivers its result to `observer`.
    ///
    /// If the executor rejects the run, the observer receives the rejection
    /// error right away on the calling thread.
    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: FnOnce(OpsResult<R>) + Send + 'static,
    {
        let subscription = Subscription::new();
        let observer: Arc<Mutex<Option<Observer<R>>>> =
            Arc::new(Mutex::new(Some(Box::new(observer))));

        let source = self.source.clone();
        let task_subscription = subscription.clone();
        let task_observer = observer.clone();
        let task: Task = Box::new(move || {
            if task_subscription.is_unsubscribed() {
                log::debug!("Subscription {} cancelled before start", task_subscription.id());
                return;
            }
            let result = source();
            task_subscription.deliver(&task_observer, result);
        });

        if let Err(e) = self.executor.execute(task) {
            log::error!("Failed to schedule deferred operation: {}", e);
            subscription.deliver(&observer, Err(e));
        }
        subscription
    }

    /// Subscribes and blocks the current thread until the result arrives.
    pub fn wait(&self) -> OpsResult<R> {
        let (sender, receiver) = mpsc::channel();
        self.subscribe(move |result| {
            // receiver only goes away if the waiting thread is gone
            let _ = sender.send(result);
        });
        receiver.recv().map_err(|_| {
            OpsError::new(
                "Deferred operation finished without a result",
                ErrorKind::InternalError,
            )
        })?
    }
}

impl<R> Debug for Deferred<R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deferred").finish_non_exhaustive()
    }
}

/// Handle to one subscription of a [`Deferred`].
#[derive(Clone)]
pub struct Subscription {
    inner: Arc<SubscriptionInner>,
}

struct SubscriptionInner {
    id: Uuid,
    unsubscribed: AtomicBool,
    completed: AtomicBool,
}

impl Subscription {
    fn new() -> Self {
        Subscription {
            inner: Arc::new(SubscriptionInner {
                id: Uuid::new_v4(),
                unsubscribed: AtomicBool::new(false),
                completed: AtomicBool::new(false),
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    /// Detaches the observer. Does not interrupt store work already running.
    pub fn unsubscribe(&self) {
        self.inner.unsubscribed.store(true, Ordering::Release);
    }

    pub fn is_unsubscribed(&self) -> bool {
        self.inner.unsubscribed.load(Ordering::Acquire)
    }

    /// True once the observer has received its result.
    pub fn is_completed(&self) -> bool {
        self.inner.completed.load(Ordering::Acquire)
    }

    fn deliver<R>(&self, observer: &Mutex<Option<Observer<R>>>, result: OpsResult<R>) {
        let Some(observer) = observer.lock().take() else {
            return;
        };
        if self.is_unsubscribed() {
            log::debug!("Dropping result of cancelled subscription {}", self.id());
            return;
        }
        self.inner.completed.store(true, Ordering::Release);
        observer(result);
    }
}

impl Debug for Subscription {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id())
            .field("unsubscribed", &self.is_unsubscribed())
            .field("completed", &self.is_completed())
            .finish()
    }
}
