use std::sync::Arc;

use schemabind::drivers::InMemoryTestDriver;
use schemabind::stores::InMemoryCatalogStore;
use schemabind::traits::{CatalogStore, DatabaseDriver};
use schemabind::{BindType, SchemaBindError, SchemaIntrospector, TypeResolver};

fn resolver_for(
    driver: &Arc<InMemoryTestDriver>,
    store: &Arc<InMemoryCatalogStore>,
) -> TypeResolver {
    let driver: Arc<dyn DatabaseDriver> = Arc::clone(driver) as Arc<dyn DatabaseDriver>;
    let store: Arc<dyn CatalogStore> = Arc::clone(store) as Arc<dyn CatalogStore>;
    let introspector = SchemaIntrospector::new(driver, Arc::clone(&store), "public");
    TypeResolver::new(store, introspector)
}

fn shop_driver() -> InMemoryTestDriver {
    InMemoryTestDriver::new()
        .with_table("orders", &[("id", "INT"), ("total", "DECIMAL")])
        .with_table(
            "Users",
            &[
                ("ID", "BIGINT"),
                ("Name", "VARCHAR"),
                ("avatar", "BLOB"),
                ("created", "DATETIME"),
            ],
        )
}

fn assert_unresolved(err: SchemaBindError, table: &str, column: &str) {
    match err {
        SchemaBindError::UnresolvedColumn { table: t, column: c } => {
            assert_eq!(t, table);
            assert_eq!(c, column);
        }
        other => panic!("Expected UnresolvedColumn error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_rebuilt_types_follow_native_types() {
    let driver = Arc::new(
        InMemoryTestDriver::new().with_table(
            "everything",
            &[
                ("a", "TINYINT"),
                ("b", "MEDIUMINT"),
                ("c", "CHAR"),
                ("d", "TIMESTAMP"),
                ("e", "LONGTEXT"),
                ("f", "NUMERIC"),
                ("g", "DOUBLE"),
                ("h", "BLOB"),
                ("i", "VARBINARY"),
            ],
        ),
    );
    let store = Arc::new(InMemoryCatalogStore::new());
    let resolver = resolver_for(&driver, &store);

    let columns = ["a", "b", "c", "d", "e", "f", "g", "h", "i"];
    let natives = [
        "TINYINT", "MEDIUMINT", "CHAR", "TIMESTAMP", "LONGTEXT", "NUMERIC", "DOUBLE", "BLOB",
        "VARBINARY",
    ];
    let types = resolver.resolve("everything", &columns).await.unwrap();

    let expected: Vec<BindType> = natives.iter().map(|n| BindType::from_native_type(n)).collect();
    assert_eq!(types, expected);
    assert_eq!(resolver.rebuild_count(), 1);
}

#[tokio::test]
async fn test_warm_lookups_do_not_rebuild() {
    let driver = Arc::new(shop_driver());
    let store = Arc::new(InMemoryCatalogStore::new());
    let resolver = resolver_for(&driver, &store);

    let first = resolver.resolve("orders", &["id", "total"]).await.unwrap();
    assert_eq!(resolver.rebuild_count(), 1);

    let second = resolver.resolve("orders", &["id", "total"]).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(resolver.rebuild_count(), 1);
    assert_eq!(driver.metadata_query_count(), 1);
    assert_eq!(store.load_count(), 1);
    assert_eq!(store.save_count(), 1);
}

#[tokio::test]
async fn test_persisted_catalog_is_reused_by_new_resolver() {
    let driver = Arc::new(shop_driver());
    let store = Arc::new(InMemoryCatalogStore::new());

    resolver_for(&driver, &store)
        .resolve("orders", &["total"])
        .await
        .unwrap();

    let fresh = resolver_for(&driver, &store);
    let types = fresh.resolve("orders", &["total"]).await.unwrap();
    assert_eq!(types, vec![BindType::Decimal]);
    assert_eq!(fresh.rebuild_count(), 0);
    assert_eq!(driver.metadata_query_count(), 1);
}

#[tokio::test]
async fn test_missing_table_rebuilds_once_then_fails() {
    let driver = Arc::new(shop_driver());
    let store = Arc::new(InMemoryCatalogStore::new());
    let resolver = resolver_for(&driver, &store);

    let err = resolver.resolve("invoices", &["id"]).await.unwrap_err();
    assert_unresolved(err, "invoices", "id");
    assert_eq!(resolver.rebuild_count(), 1);
    assert_eq!(driver.metadata_query_count(), 1);
}

#[tokio::test]
async fn test_new_table_is_picked_up_by_rebuild() {
    let driver = Arc::new(shop_driver());
    let store = Arc::new(InMemoryCatalogStore::new());
    let resolver = resolver_for(&driver, &store);

    resolver.resolve("orders", &["id"]).await.unwrap();
    assert_eq!(resolver.rebuild_count(), 1);

    driver.add_table("invoices", &[("number", "VARCHAR"), ("amount", "FLOAT")]);
    let types = resolver.resolve("invoices", &["amount", "number"]).await.unwrap();
    assert_eq!(types, vec![BindType::Decimal, BindType::String]);
    assert_eq!(resolver.rebuild_count(), 2);

    // The rebuilt snapshot still serves the old table
    resolver.resolve("orders", &["total"]).await.unwrap();
    assert_eq!(resolver.rebuild_count(), 2);
}

#[tokio::test]
async fn test_several_missing_columns_share_one_rebuild() {
    let driver = Arc::new(InMemoryTestDriver::new().with_table("orders", &[("id", "INT")]));
    let store = Arc::new(InMemoryCatalogStore::new());
    let resolver = resolver_for(&driver, &store);

    resolver.resolve("orders", &["id"]).await.unwrap();

    driver.drop_table("orders");
    driver.add_table(
        "orders",
        &[("id", "INT"), ("note", "TEXT"), ("paid", "DECIMAL")],
    );

    let types = resolver.resolve("orders", &["note", "paid", "id"]).await.unwrap();
    assert_eq!(
        types,
        vec![BindType::String, BindType::Decimal, BindType::Integer]
    );
    assert_eq!(resolver.rebuild_count(), 2);
}

#[tokio::test]
async fn test_missing_column_fails_after_single_rebuild() {
    let driver = Arc::new(shop_driver());
    let store = Arc::new(InMemoryCatalogStore::new());
    let resolver = resolver_for(&driver, &store);

    resolver.resolve("orders", &["id"]).await.unwrap();

    let err = resolver
        .resolve("orders", &["id", "totl", "also_missing"])
        .await
        .unwrap_err();
    assert_unresolved(err, "orders", "totl");
    assert_eq!(resolver.rebuild_count(), 2);
}

#[tokio::test]
async fn test_lookups_ignore_case() {
    let driver = Arc::new(shop_driver());
    let store = Arc::new(InMemoryCatalogStore::new());
    let resolver = resolver_for(&driver, &store);

    let upper = resolver.resolve("Users", &["ID"]).await.unwrap();
    let lower = resolver.resolve("users", &["id"]).await.unwrap();
    assert_eq!(upper, lower);
    assert_eq!(upper, vec![BindType::Integer]);
    assert_eq!(resolver.rebuild_count(), 1);
}

#[tokio::test]
async fn test_result_order_follows_request_order() {
    let driver = Arc::new(shop_driver());
    let store = Arc::new(InMemoryCatalogStore::new());
    let resolver = resolver_for(&driver, &store);

    let forward = resolver
        .resolve("users", &["name", "avatar", "id"])
        .await
        .unwrap();
    let reversed = resolver
        .resolve("users", &["id", "avatar", "name"])
        .await
        .unwrap();

    assert_eq!(
        forward,
        vec![BindType::String, BindType::Binary, BindType::Integer]
    );
    assert_eq!(
        reversed,
        vec![BindType::Integer, BindType::Binary, BindType::String]
    );
}

#[tokio::test]
async fn test_metadata_table_bypasses_catalog() {
    let driver = Arc::new(shop_driver());
    let store = Arc::new(InMemoryCatalogStore::new());
    let resolver = resolver_for(&driver, &store);

    let types = resolver
        .resolve("INFORMATION_SCHEMA.COLUMNS", &["TABLE_SCHEMA"])
        .await
        .unwrap();
    assert_eq!(types, vec![BindType::String]);

    assert_eq!(store.load_count(), 0);
    assert_eq!(resolver.rebuild_count(), 0);
    driver.assert_query_count(0);
}

#[tokio::test]
async fn test_metadata_table_rejects_other_columns() {
    let driver = Arc::new(shop_driver());
    let store = Arc::new(InMemoryCatalogStore::new());
    let resolver = resolver_for(&driver, &store);

    let err = resolver
        .resolve("information_schema.columns", &["table_name"])
        .await
        .unwrap_err();
    assert_unresolved(err, "information_schema.columns", "table_name");
    assert_eq!(resolver.rebuild_count(), 0);
    assert_eq!(store.load_count(), 0);
}

#[tokio::test]
async fn test_unrecognized_native_type_cannot_resolve() {
    let driver = Arc::new(
        InMemoryTestDriver::new().with_table("events", &[("id", "INT"), ("kind", "ENUM")]),
    );
    let store = Arc::new(InMemoryCatalogStore::new());
    let resolver = resolver_for(&driver, &store);

    // The rest of the table is still usable
    assert_eq!(
        resolver.resolve("events", &["id"]).await.unwrap(),
        vec![BindType::Integer]
    );

    let err = resolver.resolve("events", &["kind"]).await.unwrap_err();
    assert_unresolved(err, "events", "kind");

    let document = store.document().unwrap();
    assert!(!document.contains("kind"));
}

#[tokio::test]
async fn test_unrecognized_native_type_fails_without_repeated_rebuilds() {
    let driver = Arc::new(
        InMemoryTestDriver::new().with_table("docs", &[("id", "INT"), ("body", "jsonb")]),
    );
    let store = Arc::new(InMemoryCatalogStore::new());
    let resolver = resolver_for(&driver, &store);

    for _ in 0..3 {
        let err = resolver.resolve("docs", &["body"]).await.unwrap_err();
        assert_unresolved(err, "docs", "body");
    }

    // Only the first request rebuilt; later ones fail from the snapshot
    assert_eq!(resolver.rebuild_count(), 1);
    assert_eq!(store.save_count(), 1);
    assert_eq!(driver.metadata_query_count(), 1);

    let err = resolver.resolve("docs", &["id", "body"]).await.unwrap_err();
    assert_unresolved(err, "docs", "body");
    assert_eq!(resolver.rebuild_count(), 1);

    let document: serde_json::Value = serde_json::from_str(&store.document().unwrap()).unwrap();
    assert_eq!(document, serde_json::json!({ "docs": { "id": "i" } }));
}

#[tokio::test]
async fn test_corrupt_persisted_catalog_is_rebuilt() {
    let driver = Arc::new(shop_driver());
    let store = Arc::new(InMemoryCatalogStore::with_document("{ not json"));
    let resolver = resolver_for(&driver, &store);

    let types = resolver.resolve("orders", &["id"]).await.unwrap();
    assert_eq!(types, vec![BindType::Integer]);
    assert_eq!(resolver.rebuild_count(), 1);

    let document: serde_json::Value = serde_json::from_str(&store.document().unwrap()).unwrap();
    assert_eq!(document["orders"]["total"], "d");
}

#[tokio::test]
async fn test_rebuild_replaces_whole_catalog() {
    let driver = Arc::new(shop_driver());
    let store = Arc::new(InMemoryCatalogStore::new());
    let resolver = resolver_for(&driver, &store);

    resolver.resolve("orders", &["id"]).await.unwrap();

    driver.drop_table("Users");
    resolver.rebuild().await.unwrap();

    let document: serde_json::Value = serde_json::from_str(&store.document().unwrap()).unwrap();
    assert!(document.get("users").is_none());
    assert_eq!(
        document,
        serde_json::json!({ "orders": { "id": "i", "total": "d" } })
    );

    let err = resolver.resolve("users", &["id"]).await.unwrap_err();
    assert_unresolved(err, "users", "id");
}

#[tokio::test]
async fn test_empty_column_list_touches_nothing() {
    let driver = Arc::new(shop_driver());
    let store = Arc::new(InMemoryCatalogStore::new());
    let resolver = resolver_for(&driver, &store);

    let no_columns: [&str; 0] = [];
    let types = resolver.resolve("anything", &no_columns).await.unwrap();
    assert!(types.is_empty());
    assert_eq!(store.load_count(), 0);
    driver.assert_query_count(0);
}

#[tokio::test]
async fn test_rebuild_fails_when_driver_is_unreachable() {
    let driver = Arc::new(shop_driver());
    driver.set_unreachable(true);
    let store = Arc::new(InMemoryCatalogStore::new());
    let resolver = resolver_for(&driver, &store);

    let err = resolver.resolve("orders", &["id"]).await.unwrap_err();
    assert!(matches!(err, SchemaBindError::ConnectionFailed(_)));
    assert_eq!(resolver.rebuild_count(), 0);
    assert_eq!(store.save_count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_resolutions_converge() {
    let driver = Arc::new(shop_driver());
    let store = Arc::new(InMemoryCatalogStore::new());
    let resolver = Arc::new(resolver_for(&driver, &store));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let resolver = Arc::clone(&resolver);
            tokio::spawn(async move {
                if i % 2 == 0 {
                    resolver.resolve("orders", &["total", "id"]).await
                } else {
                    resolver.resolve("users", &["name"]).await
                }
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let types = handle.await.unwrap().unwrap();
        if i % 2 == 0 {
            assert_eq!(types, vec![BindType::Decimal, BindType::Integer]);
        } else {
            assert_eq!(types, vec![BindType::String]);
        }
    }

    // Redundant rebuilds are allowed, but every one is a full snapshot
    assert!(resolver.rebuild_count() >= 1);
    assert_eq!(store.save_count(), resolver.rebuild_count());
    let document: serde_json::Value = serde_json::from_str(&store.document().unwrap()).unwrap();
    assert_eq!(document["users"]["avatar"], "b");
    assert_eq!(document["orders"]["id"], "i");
}
