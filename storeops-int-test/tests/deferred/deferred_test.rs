use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use storeops::errors::{OpsError, OpsResult};
use storeops::operation::{
    resolver_fn, DeleteResult, DeleteResults, PreparedOperation, Resolver,
};
use storeops::store::Store;
use storeops_int_test::test_util::{
    cleanup, create_test_context, run_test, seed_users, user_delete_resolver,
    FailingDeleteResolver, User, USERS,
};

#[test]
fn test_deferred_delete() {
    run_test(
        create_test_context,
        |ctx| {
            let users = seed_users(&ctx, 3)?;
            let deferred = ctx
                .store()
                .delete()
                .objects(users)
                .prepare()?
                .as_deferred();

            // cold until subscribed
            assert_eq!(ctx.count(USERS)?, 3);

            let received: Arc<Mutex<Option<OpsResult<DeleteResults<User>>>>> =
                Arc::new(Mutex::new(None));
            let received_clone = received.clone();
            let subscription = deferred.subscribe(move |result| {
                *received_clone.lock() = Some(result);
            });

            awaitility::at_most(Duration::from_secs(2)).until(|| received.lock().is_some());
            assert!(subscription.is_completed());
            let results = received.lock().take().unwrap()?;
            assert_eq!(results.len(), 3);
            assert_eq!(ctx.count(USERS)?, 0);
            ctx.wait_for_changes(1);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_two_subscribers_run_the_batch_twice() {
    run_test(
        create_test_context,
        |ctx| {
            let users = seed_users(&ctx, 3)?;
            let invocations = Arc::new(AtomicUsize::new(0));
            let counter = invocations.clone();
            let counting = resolver_fn(move |store: &Store, user: &User| {
                counter.fetch_add(1, Ordering::SeqCst);
                user_delete_resolver().perform_operation(store, user)
            });

            let deferred = ctx
                .store()
                .delete()
                .objects(users)
                .with_delete_resolver(counting)
                .prepare()?
                .as_deferred();

            let first = deferred.wait()?;
            let second = deferred.wait()?;

            assert_eq!(invocations.load(Ordering::SeqCst), 6);
            assert_eq!(first.number_of_rows_deleted(), 3);
            assert_eq!(second.number_of_rows_deleted(), 0);
            ctx.wait_for_changes(2);
            assert_eq!(ctx.received_changes().len(), 2);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_deferred_error_is_terminal_event() {
    run_test(
        create_test_context,
        |ctx| {
            let users = seed_users(&ctx, 2)?;
            let deferred = ctx
                .store()
                .delete()
                .objects(users)
                .with_delete_resolver(FailingDeleteResolver {
                    failing_id: "u1".to_string(),
                })
                .prepare()?
                .as_deferred();

            let error: Arc<Mutex<Option<OpsError>>> = Arc::new(Mutex::new(None));
            let error_clone = error.clone();
            deferred.subscribe(move |result| {
                *error_clone.lock() = result.err();
            });

            awaitility::at_most(Duration::from_secs(2)).until(|| error.lock().is_some());
            assert_eq!(error.lock().as_ref().unwrap().message(), "user u1 is locked");
            assert_eq!(ctx.count(USERS)?, 2);
            assert!(ctx.received_changes().is_empty());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_deferred_single_object() {
    run_test(
        create_test_context,
        |ctx| {
            let users = seed_users(&ctx, 1)?;
            let result: DeleteResult = ctx
                .store()
                .delete()
                .object(users[0].clone())
                .prepare()?
                .as_deferred()
                .wait()?;
            assert_eq!(result.number_of_rows_deleted(), 1);
            Ok(())
        },
        cleanup,
    )
}
