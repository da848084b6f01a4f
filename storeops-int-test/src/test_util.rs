use parking_lot::Mutex;
use std::backtrace::Backtrace;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use storeops::common::SubscriberRef;
use storeops::errors::{ErrorKind, OpsError, OpsResult};
use storeops::operation::{DefaultDeleteResolver, DefaultPutResolver, DeleteResult, Resolver};
use storeops::row;
use storeops::store::memory::InMemoryStore;
use storeops::store::{
    Changes, DeleteQuery, InsertQuery, Store, StoreProvider, TypeMapping, UpdateQuery,
};

pub const USERS: &str = "users";
pub const AUDIT: &str = "audit";

/// Runs a test with retry logic and error handling.
/// `after` always runs once `before` succeeded, even when the test fails.
pub fn run_test<T, B, A>(before: B, test: T, after: A)
where
    T: Fn(TestContext) -> OpsResult<()>,
    B: Fn() -> OpsResult<TestContext>,
    A: Fn(TestContext) -> OpsResult<()>,
{
    const MAX_RETRIES: u32 = 3;
    let mut last_error: Option<String> = None;

    for attempt in 1..=MAX_RETRIES {
        let start_time = Instant::now();

        let result = std::panic::catch_unwind(AssertUnwindSafe(|| {
            let backtrace = Backtrace::capture();
            match before() {
                Ok(ctx) => match test(ctx.clone()) {
                    Ok(_) => after(ctx)
                        .map_err(|e| (format!("After run failed: {:?}", e), backtrace.to_string())),
                    Err(e) => {
                        let _ = after(ctx);
                        Err((format!("Test failed: {:?}", e), backtrace.to_string()))
                    }
                },
                Err(e) => Err((format!("Before run failed: {:?}", e), backtrace.to_string())),
            }
        }));

        let elapsed = start_time.elapsed();
        let error = match result {
            Ok(Ok(_)) => return,
            Ok(Err((e, bt))) => {
                if !bt.is_empty() && !bt.contains("disabled") {
                    log::debug!("Backtrace:\n{}", bt);
                }
                e
            }
            Err(panic_err) => {
                if let Some(s) = panic_err.downcast_ref::<&str>() {
                    format!("Panic: {}", s)
                } else if let Some(s) = panic_err.downcast_ref::<String>() {
                    format!("Panic: {}", s)
                } else {
                    "Panic: unknown payload".to_string()
                }
            }
        };

        if attempt < MAX_RETRIES {
            log::warn!(
                "Test attempt {}/{} failed (took {:?}): {}",
                attempt,
                MAX_RETRIES,
                elapsed,
                error
            );
            thread::sleep(Duration::from_millis(100 * attempt as u64));
        }
        last_error = Some(error);
    }

    panic!(
        "Test failed after {} attempts. Last error: {}",
        MAX_RETRIES,
        last_error.unwrap_or_default()
    );
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
}

impl User {
    pub fn new(id: &str, email: &str, name: &str) -> Self {
        User {
            id: id.to_string(),
            email: email.to_string(),
            name: name.to_string(),
        }
    }
}

pub fn user_delete_resolver() -> DefaultDeleteResolver<User> {
    DefaultDeleteResolver::new(|user: &User| {
        DeleteQuery::builder().table(USERS).key(&user.id).build()
    })
}

pub fn user_put_resolver() -> DefaultPutResolver<User> {
    DefaultPutResolver::new(
        |user: &User| InsertQuery::builder().table(USERS).key(&user.id).build(),
        |user: &User| UpdateQuery::builder().table(USERS).key(&user.id).build(),
        |user: &User| Ok(row! { "email" => user.email, "name" => user.name }),
    )
}

/// Deletes the user and records the deletion in the audit table.
pub struct AuditedDeleteResolver;

impl Resolver<User> for AuditedDeleteResolver {
    type Outcome = DeleteResult;

    fn perform_operation(&self, store: &Store, user: &User) -> OpsResult<DeleteResult> {
        let query = DeleteQuery::builder().table(USERS).key(&user.id).build()?;
        let deleted = store.internal().delete(&query)?;

        let audit = InsertQuery::builder().table(AUDIT).build()?;
        store
            .internal()
            .insert(&audit, row! { "deleted_user" => user.id })?;
        Ok(DeleteResult::new_instance(deleted, [USERS, AUDIT]))
    }
}

/// Delete resolver failing for one user id.
pub struct FailingDeleteResolver {
    pub failing_id: String,
}

impl Resolver<User> for FailingDeleteResolver {
    type Outcome = DeleteResult;

    fn perform_operation(&self, store: &Store, user: &User) -> OpsResult<DeleteResult> {
        if user.id == self.failing_id {
            return Err(OpsError::new(
                &format!("user {} is locked", user.id),
                ErrorKind::StoreOperationError,
            ));
        }
        user_delete_resolver().perform_operation(store, user)
    }
}

#[derive(Clone)]
pub struct TestContext {
    store: Store,
    changes: Arc<Mutex<Vec<Changes>>>,
    subscriber: Arc<Mutex<Option<SubscriberRef>>>,
}

impl TestContext {
    pub fn store(&self) -> Store {
        self.store.clone()
    }

    /// Change sets received so far, in delivery order.
    pub fn received_changes(&self) -> Vec<Changes> {
        self.changes.lock().clone()
    }

    pub fn wait_for_changes(&self, count: usize) {
        awaitility::at_most(Duration::from_secs(2)).until(|| self.changes.lock().len() >= count);
    }

    pub fn count(&self, table: &str) -> OpsResult<usize> {
        self.store.internal().count(table)
    }
}

/// Creates an in-memory store with type mappings for [`User`] and a change
/// observer recording every change set.
pub fn create_test_context() -> OpsResult<TestContext> {
    let mapping = TypeMapping::<User>::builder()
        .delete_resolver(user_delete_resolver())
        .put_resolver(user_put_resolver())
        .build()?;

    let store = Store::builder()
        .provider(InMemoryStore::new())
        .add_type_mapping(mapping)
        .build()?;

    let changes = Arc::new(Mutex::new(Vec::new()));
    let changes_clone = changes.clone();
    let subscriber = store.observe_changes(move |c: Changes| {
        changes_clone.lock().push(c);
        Ok(())
    })?;

    Ok(TestContext {
        store,
        changes,
        subscriber: Arc::new(Mutex::new(subscriber)),
    })
}

/// Inserts `count` users with ids `u1..=u<count>`, without notifying.
pub fn seed_users(ctx: &TestContext, count: usize) -> OpsResult<Vec<User>> {
    let mut users = Vec::with_capacity(count);
    for i in 1..=count {
        let user = User::new(
            &format!("u{}", i),
            &format!("user{}@example.com", i),
            &format!("User {}", i),
        );
        let query = InsertQuery::builder().table(USERS).key(&user.id).build()?;
        ctx.store
            .internal()
            .insert(&query, row! { "email" => user.email, "name" => user.name })?;
        users.push(user);
    }
    Ok(users)
}

pub fn cleanup(ctx: TestContext) -> OpsResult<()> {
    if let Some(subscriber) = ctx.subscriber.lock().take() {
        ctx.store.stop_observing(subscriber)?;
    }
    ctx.store.close()
}
