use super::*;
use crate::{
    error::{ErrorClass, ErrorOrigin},
    model::FieldConfig,
    obs::{CollectionCounters, metrics_report},
    store::{Direction, MemoryStore},
    test_support::{StepDefaults, users_schema},
};
use serde_json::{Map, Value, json};

fn db() -> Db<MemoryStore> {
    let mut db = Db::new(MemoryStore::new(), DocdexConfig::default())
        .unwrap()
        .with_defaults(StepDefaults::starting_at(1_000));
    db.register("users", &users_schema()).unwrap();
    db.register("groups", &Schema::new().field("name", FieldConfig::new().unique()))
        .unwrap();

    db
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => panic!("object literal expected"),
    }
}

#[tokio::test]
async fn insert_fills_defaults_and_indexes() {
    let db = db();
    let users = db.collection("users").unwrap();

    let alice = users
        .insert(object(json!({ "email": "a@x.io", "role": "admin" })))
        .await
        .unwrap();

    assert_eq!(alice["id"], "id-1");
    assert_eq!(alice["created"], 1_000);
    assert_eq!(alice["modified"], 1_000);

    let store = db.store();
    assert_eq!(store.hash("users:email")["a@x.io"], "id-1");
    assert_eq!(
        store.sorted_set("users:role:admin"),
        [("id-1".to_string(), 1_000.0)]
    );
    assert_eq!(users.get("id-1").await.unwrap(), Some(alice));
    assert_eq!(store.calls("EXEC"), 1);
}

#[tokio::test]
async fn insert_rejects_taken_ids_and_values() {
    let db = db();
    let users = db.collection("users").unwrap();
    users
        .insert(object(json!({ "id": "u1", "email": "a@x.io" })))
        .await
        .unwrap();

    let same_id = users.insert(object(json!({ "id": "u1" }))).await;
    assert!(matches!(same_id, Err(DbError::Conflict(ref c)) if c.field == "id"));

    let same_email = users
        .insert(object(json!({ "id": "u2", "email": "a@x.io" })))
        .await;
    assert!(matches!(same_email, Err(DbError::Conflict(ref c)) if c.owner == "u1"));

    assert_eq!(users.get("u2").await.unwrap(), None);
}

#[tokio::test]
async fn replace_keeps_created_and_moves_indexes() {
    let db = db();
    let users = db.collection("users").unwrap();
    users
        .insert(object(json!({ "id": "u1", "email": "a@x.io", "role": "admin" })))
        .await
        .unwrap();

    let replaced = users
        .replace("u1", object(json!({ "id": "other", "email": "b@x.io", "role": "staff" })))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(replaced["id"], "u1");
    assert_eq!(replaced["created"], 1_000);
    assert_eq!(replaced["modified"], 1_001);

    let store = db.store();
    assert!(!store.hash("users:email").contains_key("a@x.io"));
    assert_eq!(store.hash("users:email")["b@x.io"], "u1");
    assert!(store.sorted_set("users:role:admin").is_empty());
    assert_eq!(store.sorted_set("users:role:staff").len(), 1);

    assert_eq!(users.replace("ghost", Map::new()).await.unwrap(), None);
}

#[tokio::test]
async fn patch_merges_into_the_stored_record() {
    let db = db();
    let users = db.collection("users").unwrap();
    users
        .insert(object(json!({
            "id": "u1",
            "email": "a@x.io",
            "role": "admin",
            "profile": { "city": "Oslo", "zip": "0150" }
        })))
        .await
        .unwrap();

    let patched = users
        .patch(
            "u1",
            &object(json!({ "id": "u9", "role": null, "profile": { "zip": "0151" } })),
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(patched["id"], "u1");
    assert!(!patched.contains_key("role"));
    assert_eq!(patched["profile"], json!({ "city": "Oslo", "zip": "0151" }));
    assert_eq!(patched["email"], "a@x.io");
    assert!(db.store().sorted_set("users:role:admin").is_empty());

    assert_eq!(users.patch("ghost", &Map::new()).await.unwrap(), None);
}

#[tokio::test]
async fn delete_removes_record_and_index_entries() {
    let db = db();
    let users = db.collection("users").unwrap();
    users
        .insert(object(json!({ "id": "u1", "email": "a@x.io", "role": "admin" })))
        .await
        .unwrap();

    assert!(users.delete("u1").await.unwrap());
    assert!(db.store().snapshot().is_empty());
    assert!(!users.delete("u1").await.unwrap());
}

#[tokio::test]
async fn get_many_keeps_a_slot_per_requested_id() {
    let db = db();
    let users = db.collection("users").unwrap();
    for id in ["u1", "u3"] {
        users.insert(object(json!({ "id": id }))).await.unwrap();
    }

    let ids = ["u1", "u2", "u3"].map(String::from);
    let found = users.get_many(&ids).await.unwrap();

    assert_eq!(found.len(), 3);
    assert_eq!(found[0].as_ref().unwrap()["id"], "u1");
    assert!(found[1].is_none());
    assert_eq!(found[2].as_ref().unwrap()["id"], "u3");
    assert!(users.get_many(&[]).await.unwrap().is_empty());
}

#[tokio::test]
async fn failed_batches_leave_no_trace() {
    let db = db();
    let users = db.collection("users").unwrap();
    db.store()
        .fail_next_exec(StoreError::Unavailable("connection reset".into()));

    let result = users
        .insert(object(json!({ "id": "u1", "email": "a@x.io" })))
        .await;

    assert!(matches!(result, Err(DbError::Store(StoreError::Unavailable(_)))));
    assert!(db.store().snapshot().is_empty());
}

#[tokio::test]
async fn generic_accessors_use_declared_indexes() {
    let db = db();
    let users = db.collection("users").unwrap();
    for (id, role) in [("u1", "admin"), ("u2", "staff"), ("u3", "admin")] {
        users
            .insert(object(json!({ "id": id, "email": format!("{id}@x.io"), "role": role })))
            .await
            .unwrap();
    }

    let found = users.get_by("email", "u2@x.io").await.unwrap().unwrap();
    assert_eq!(found["id"], "u2");
    assert_eq!(users.get_by("email", "nobody@x.io").await.unwrap(), None);

    let admins = users
        .list_by("role", "admin", &ListOptions::new().order(Direction::Asc))
        .await
        .unwrap();
    let ids: Vec<_> = admins.iter().map(|u| u["id"].clone()).collect();
    assert_eq!(ids, [json!("u1"), json!("u3")]);

    let err = users.get_by("role", "admin").await.unwrap_err();
    let DbError::Internal(err) = err else {
        panic!("expected an internal error");
    };
    assert_eq!(err.class, ErrorClass::Unsupported);
    assert_eq!(err.origin, ErrorOrigin::Query);

    assert!(users.list_by("email", "x", &ListOptions::new()).await.is_err());
}

#[tokio::test]
async fn list_defaults_to_newest_first() {
    let db = db();
    let users = db.collection("users").unwrap();
    for id in ["a", "b", "c"] {
        users.insert(object(json!({ "id": id }))).await.unwrap();
    }

    let page = users.list(&ListOptions::new().size(2)).await.unwrap();
    let ids: Vec<_> = page.iter().map(|u| u["id"].clone()).collect();

    assert_eq!(ids, [json!("c"), json!("b")]);
}

#[tokio::test]
async fn relations_link_both_directions() {
    let db = db();
    let members = db.intersects("users", "groups").unwrap();

    members.link("u1", "g1").await.unwrap();
    members.link("u1", "g1").await.unwrap();
    members.link("u2", "g1").await.unwrap();

    let store = db.store();
    assert_eq!(store.sorted_set("users:u1:groups").len(), 1);
    assert_eq!(
        members.left_ids("g1", &ListOptions::new().order(Direction::Asc)).await.unwrap(),
        ["u1", "u2"]
    );

    members.unlink("u1", "g1").await.unwrap();
    assert!(store.sorted_set("users:u1:groups").is_empty());
    assert_eq!(members.left_ids("g1", &ListOptions::new()).await.unwrap(), ["u2"]);

    assert!(members.link("", "g1").await.is_err());
}

#[test]
fn relations_over_reference_keys_are_rejected() {
    let mut db = db();
    db.register("accounts", &Schema::new()).unwrap();

    // users.account already fills `accounts:<id>:users`
    let Err(err) = db.intersects("accounts", "users") else {
        panic!("relation must not share the reference index key");
    };
    assert_eq!(err.class, ErrorClass::Conflict);
    assert_eq!(err.origin, ErrorOrigin::Schema);
    assert!(db.intersects("users", "accounts").is_err());
}

// The global sink is shared by every test, so only this test's collection
// is read and only deltas are compared.
fn counters(collection: &str) -> CollectionCounters {
    metrics_report()
        .counters
        .and_then(|state| state.collections.get(collection).cloned())
        .unwrap_or_default()
}

#[tokio::test]
async fn lifecycle_events_reach_the_global_metrics() {
    let mut db = db();
    let ledgers = db
        .register("ledgers", &Schema::new().field("code", FieldConfig::new().unique()))
        .unwrap();
    let before = counters("ledgers");

    ledgers
        .insert(object(json!({ "id": "l1", "code": "a" })))
        .await
        .unwrap();
    let after_insert = counters("ledgers");
    assert_eq!(after_insert.write_calls, before.write_calls + 1);
    // unique:code, order:created, order:modified
    assert_eq!(after_insert.index_inserts, before.index_inserts + 3);

    let conflict = ledgers
        .insert(object(json!({ "id": "l2", "code": "a" })))
        .await;
    assert!(matches!(conflict, Err(DbError::Conflict(_))));
    let after_conflict = counters("ledgers");
    assert_eq!(after_conflict.unique_violations, before.unique_violations + 1);
    assert_eq!(after_conflict.write_calls, after_insert.write_calls);

    db.store()
        .zadd("ledgers:created", 9_999.0, "ghost")
        .await
        .unwrap();
    let page = ledgers.list(&ListOptions::new()).await.unwrap();
    assert_eq!(page.len(), 1);

    let after_list = counters("ledgers");
    assert_eq!(after_list.dangling_members, before.dangling_members + 1);
    assert_eq!(after_list.list_calls, before.list_calls + 1);
    assert_eq!(after_list.rows_listed, before.rows_listed + 1);
}

#[test]
fn unknown_collections_are_not_found() {
    let db = db();

    let Err(err) = db.collection("posts") else {
        panic!("posts is not registered");
    };
    assert_eq!(err.class, ErrorClass::NotFound);
    assert!(db.intersects("users", "posts").is_err());
}

#[test]
fn invalid_config_is_rejected_up_front() {
    let mut config = DocdexConfig::default();
    config.list.default_page_size = 0;

    assert!(Db::new(MemoryStore::new(), config).is_err());
}
