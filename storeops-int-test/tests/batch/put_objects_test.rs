use storeops::errors::ErrorKind;
use storeops::operation::{resolver_fn, PreparedOperation, PutResult};
use storeops::row;
use storeops::store::{InsertQuery, Store};
use storeops_int_test::test_util::{cleanup, create_test_context, run_test, seed_users, User, USERS};

#[test]
fn test_put_objects_upserts() {
    run_test(
        create_test_context,
        |ctx| {
            let mut users = seed_users(&ctx, 2)?;
            users[0].name = "Renamed".to_string();
            users.push(User::new("u9", "new@example.com", "Newcomer"));

            let results = ctx
                .store()
                .put()
                .objects(users.clone())
                .prepare()?
                .execute_as_blocking()?;

            assert_eq!(results.number_of_inserts(), 1);
            assert_eq!(results.number_of_updates(), 2);
            assert!(results.get(&users[2]).unwrap().was_inserted());
            assert_eq!(ctx.count(USERS)?, 3);

            let renamed = ctx.store().internal().get(USERS, "u1")?.unwrap();
            assert_eq!(renamed.get("name").map(String::as_str), Some("Renamed"));

            ctx.wait_for_changes(1);
            assert_eq!(ctx.received_changes().len(), 1);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_put_constraint_violation_rolls_back() {
    run_test(
        create_test_context,
        |ctx| {
            let strict_insert = resolver_fn(|store: &Store, user: &User| {
                let query = InsertQuery::builder().table(USERS).key(&user.id).build()?;
                let id = store.internal().insert(&query, row! { "name" => user.name })?;
                Ok(PutResult::new_insert_result(&id, [USERS]))
            });

            let users = vec![
                User::new("a", "a@example.com", "A"),
                User::new("a", "a@example.com", "A again"),
            ];
            let err = ctx
                .store()
                .put()
                .objects(users)
                .with_put_resolver(strict_insert)
                .prepare()?
                .execute_as_blocking()
                .err()
                .unwrap();

            assert_eq!(err.kind(), &ErrorKind::ConstraintViolation);
            assert_eq!(ctx.count(USERS)?, 0);
            assert!(ctx.received_changes().is_empty());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_put_single_object() {
    run_test(
        create_test_context,
        |ctx| {
            let result = ctx
                .store()
                .put()
                .object(User::new("solo", "solo@example.com", "Solo"))
                .prepare()?
                .execute_as_blocking()?;

            assert_eq!(result.inserted_id(), Some("solo"));
            ctx.wait_for_changes(1);
            Ok(())
        },
        cleanup,
    )
}
