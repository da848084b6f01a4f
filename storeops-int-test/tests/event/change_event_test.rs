use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use storeops::errors::{ErrorKind, OpsError};
use storeops::operation::PreparedOperation;
use storeops::store::Changes;
use storeops_int_test::test_util::{
    cleanup, create_test_context, run_test, seed_users, AuditedDeleteResolver, AUDIT, USERS,
};

fn wait_for_event<F: Fn() -> bool>(timeout_ms: u64, check: F) {
    awaitility::at_most(Duration::from_millis(timeout_ms)).until(check);
}

#[test]
fn test_table_observer_filters_changes() {
    run_test(
        create_test_context,
        |ctx| {
            let audit_changes = Arc::new(Mutex::new(Vec::<Changes>::new()));
            let audit_clone = audit_changes.clone();
            let subscriber = ctx.store().observe_changes_in_table(AUDIT, move |changes: Changes| {
                audit_clone.lock().push(changes);
                Ok(())
            })?;

            let users = seed_users(&ctx, 2)?;
            ctx.store()
                .delete()
                .object(users[0].clone())
                .prepare()?
                .execute_as_blocking()?;
            ctx.store()
                .delete()
                .object(users[1].clone())
                .with_delete_resolver(AuditedDeleteResolver)
                .prepare()?
                .execute_as_blocking()?;

            ctx.wait_for_changes(2);
            wait_for_event(1000, || audit_changes.lock().len() == 1);
            assert!(audit_changes.lock()[0].affected_tables().contains(USERS));

            if let Some(subscriber) = subscriber {
                ctx.store().stop_observing(subscriber)?;
            }
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_failing_listener_does_not_fail_batch() {
    run_test(
        create_test_context,
        |ctx| {
            ctx.store().observe_changes(|_: Changes| {
                Err(OpsError::new("listener broke", ErrorKind::EventError))
            })?;

            let users = seed_users(&ctx, 2)?;
            let results = ctx
                .store()
                .delete()
                .objects(users)
                .prepare()?
                .execute_as_blocking()?;

            assert_eq!(results.len(), 2);
            assert_eq!(ctx.count(USERS)?, 0);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_stopped_observer_receives_nothing() {
    run_test(
        create_test_context,
        |ctx| {
            let seen = Arc::new(Mutex::new(0usize));
            let seen_clone = seen.clone();
            let subscriber = ctx.store().observe_changes(move |_: Changes| {
                *seen_clone.lock() += 1;
                Ok(())
            })?;
            if let Some(subscriber) = subscriber {
                ctx.store().stop_observing(subscriber)?;
            }

            let users = seed_users(&ctx, 1)?;
            ctx.store()
                .delete()
                .objects(users)
                .prepare()?
                .execute_as_blocking()?;

            ctx.wait_for_changes(1);
            assert_eq!(*seen.lock(), 0);
            Ok(())
        },
        cleanup,
    )
}
