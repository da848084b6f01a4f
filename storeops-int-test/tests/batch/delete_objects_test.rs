use storeops::errors::ErrorKind;
use storeops::operation::PreparedOperation;
use storeops::store::memory::InMemoryStore;
use storeops::store::Store;
use storeops_int_test::test_util::{
    cleanup, create_test_context, run_test, seed_users, AuditedDeleteResolver,
    FailingDeleteResolver, User, AUDIT, USERS,
};

#[test]
fn test_delete_objects_in_transaction() {
    run_test(
        create_test_context,
        |ctx| {
            let users = seed_users(&ctx, 3)?;
            let results = ctx
                .store()
                .delete()
                .objects(users.clone())
                .prepare()?
                .execute_as_blocking()?;

            assert_eq!(results.len(), 3);
            for user in &users {
                assert!(results.was_deleted(user));
            }
            assert_eq!(ctx.count(USERS)?, 0);

            ctx.wait_for_changes(1);
            let changes = ctx.received_changes();
            assert_eq!(changes.len(), 1);
            assert!(changes[0].affected_tables().contains(USERS));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_delete_objects_without_transaction() {
    run_test(
        create_test_context,
        |ctx| {
            let users = seed_users(&ctx, 3)?;
            ctx.store()
                .delete()
                .objects(users)
                .use_transaction(false)
                .prepare()?
                .execute_as_blocking()?;

            ctx.wait_for_changes(3);
            assert_eq!(ctx.received_changes().len(), 3);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_delete_objects_union_of_tables() {
    run_test(
        create_test_context,
        |ctx| {
            let users = seed_users(&ctx, 2)?;
            ctx.store()
                .delete()
                .objects(users)
                .with_delete_resolver(AuditedDeleteResolver)
                .prepare()?
                .execute_as_blocking()?;

            assert_eq!(ctx.count(AUDIT)?, 2);
            ctx.wait_for_changes(1);
            let changes = ctx.received_changes();
            assert_eq!(changes.len(), 1);
            assert_eq!(changes[0].affected_tables().len(), 2);
            assert!(changes[0].affected_tables().contains(AUDIT));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_failed_transactional_delete_rolls_back() {
    run_test(
        create_test_context,
        |ctx| {
            let users = seed_users(&ctx, 3)?;
            let err = ctx
                .store()
                .delete()
                .objects(users)
                .with_delete_resolver(FailingDeleteResolver {
                    failing_id: "u2".to_string(),
                })
                .prepare()?
                .execute_as_blocking()
                .err()
                .unwrap();

            assert_eq!(err.kind(), &ErrorKind::StoreOperationError);
            assert_eq!(err.message(), "user u2 is locked");
            assert_eq!(ctx.count(USERS)?, 3);
            assert!(!ctx.store().internal().in_transaction());
            assert!(ctx.received_changes().is_empty());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_failed_non_transactional_delete_keeps_earlier_deletes() {
    run_test(
        create_test_context,
        |ctx| {
            let users = seed_users(&ctx, 3)?;
            let result = ctx
                .store()
                .delete()
                .objects(users)
                .use_transaction(false)
                .with_delete_resolver(FailingDeleteResolver {
                    failing_id: "u2".to_string(),
                })
                .prepare()?
                .execute_as_blocking();

            assert!(result.is_err());
            assert_eq!(ctx.count(USERS)?, 2);
            ctx.wait_for_changes(1);
            assert_eq!(ctx.received_changes().len(), 1);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_delete_duplicate_objects() {
    run_test(
        create_test_context,
        |ctx| {
            let users = seed_users(&ctx, 2)?;
            let batch = vec![users[0].clone(), users[1].clone(), users[0].clone()];
            let results = ctx
                .store()
                .delete()
                .objects(batch)
                .prepare()?
                .execute_as_blocking()?;

            assert_eq!(results.len(), 2);
            // the second delete of the same user found nothing
            assert!(results.was_not_deleted(&users[0]));
            assert!(results.was_deleted(&users[1]));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_delete_single_object() {
    run_test(
        create_test_context,
        |ctx| {
            let users = seed_users(&ctx, 2)?;
            let result = ctx
                .store()
                .delete()
                .object(users[1].clone())
                .prepare()?
                .execute_as_blocking()?;

            assert_eq!(result.number_of_rows_deleted(), 1);
            assert_eq!(ctx.count(USERS)?, 1);
            ctx.wait_for_changes(1);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_delete_empty_batch() {
    run_test(
        create_test_context,
        |ctx| {
            let results = ctx
                .store()
                .delete()
                .objects(Vec::<User>::new())
                .prepare()?
                .execute_as_blocking()?;
            assert!(results.is_empty());
            assert!(ctx.received_changes().is_empty());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_missing_resolver_is_configuration_error() {
    let store = Store::new(InMemoryStore::new());
    let err = store
        .delete()
        .objects(vec![User::new("u1", "a@b.c", "A")])
        .prepare()
        .err()
        .unwrap();
    assert_eq!(err.kind(), &ErrorKind::ConfigurationError);
}
