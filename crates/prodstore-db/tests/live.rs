//! Live integration tests for prodstore-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. The `migrations` path is relative to the crate root
//! (`crates/prodstore-db/`), so `"../../migrations"` resolves to the workspace
//! migration directory.

use prodstore_core::{project_fields, Patch, ProductBody, ProductPatch, ProjectionError, Stores};
use prodstore_db::{
    apply_merge_patch, apply_patch, delete_product, get_product, insert_product, list_products,
    replace_product, DbError, PgProductStore, ProductStore,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn stores(entries: &[(&str, f64)]) -> Stores {
    entries
        .iter()
        .map(|(name, price)| ((*name).to_string(), *price))
        .collect()
}

fn tea_body() -> ProductBody {
    ProductBody {
        name: Some("tea".to_string()),
        quantity: Some(2.5),
        unit: Some("liters".to_string()),
        stores: Some(stores(&[("storeA", 3000.0), ("storeB", 6000.0)])),
    }
}

async fn insert_tea(pool: &sqlx::PgPool) -> i64 {
    insert_product(pool, &tea_body())
        .await
        .expect("insert_product failed")
}

// ---------------------------------------------------------------------------
// Section 1: Create / read / delete
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn insert_then_get_round_trips_every_field(pool: sqlx::PgPool) {
    let id = insert_tea(&pool).await;

    let fetched = get_product(&pool, id).await.expect("get_product failed");
    assert_eq!(fetched, tea_body().into_product(id));
}

#[sqlx::test(migrations = "../../migrations")]
async fn insert_assigns_distinct_ids(pool: sqlx::PgPool) {
    let first = insert_tea(&pool).await;
    let second = insert_tea(&pool).await;
    assert_ne!(first, second);
}

#[sqlx::test(migrations = "../../migrations")]
async fn insert_with_empty_body_stores_nulls(pool: sqlx::PgPool) {
    let id = insert_product(&pool, &ProductBody::default())
        .await
        .expect("insert_product failed");

    let fetched = get_product(&pool, id).await.expect("get_product failed");
    assert!(fetched.name.is_none());
    assert!(fetched.quantity.is_none());
    assert!(fetched.stores.is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn list_products_returns_rows_in_id_order(pool: sqlx::PgPool) {
    let first = insert_tea(&pool).await;
    let second = insert_tea(&pool).await;

    let products = list_products(&pool).await.expect("list_products failed");
    let ids: Vec<i64> = products.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![first, second]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn list_products_empty_table(pool: sqlx::PgPool) {
    let products = list_products(&pool).await.expect("list_products failed");
    assert!(products.is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
async fn get_product_unknown_id_is_not_found(pool: sqlx::PgPool) {
    let result = get_product(&pool, 424_242).await;
    assert!(
        matches!(result, Err(DbError::NotFound(424_242))),
        "expected NotFound, got {result:?}"
    );
}

#[sqlx::test(migrations = "../../migrations")]
async fn delete_product_removes_row(pool: sqlx::PgPool) {
    let id = insert_tea(&pool).await;

    delete_product(&pool, id).await.expect("delete_product failed");

    let result = get_product(&pool, id).await;
    assert!(matches!(result, Err(DbError::NotFound(_))));
}

#[sqlx::test(migrations = "../../migrations")]
async fn delete_product_unknown_id_is_not_found(pool: sqlx::PgPool) {
    let result = delete_product(&pool, 424_242).await;
    assert!(matches!(result, Err(DbError::NotFound(424_242))));
}

// ---------------------------------------------------------------------------
// Section 2: Full replace vs partial patch
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn replace_clears_fields_missing_from_body(pool: sqlx::PgPool) {
    let id = insert_tea(&pool).await;

    let body = ProductBody {
        name: Some("green tea".to_string()),
        quantity: Some(1.0),
        unit: None,
        stores: None,
    };
    let replaced = replace_product(&pool, id, &body)
        .await
        .expect("replace_product failed");

    assert_eq!(replaced.id, id);
    assert_eq!(replaced.name.as_deref(), Some("green tea"));
    assert!(replaced.unit.is_none(), "replace must clear unit");
    assert!(replaced.stores.is_none(), "replace must clear stores");
}

#[sqlx::test(migrations = "../../migrations")]
async fn replace_unknown_id_is_not_found(pool: sqlx::PgPool) {
    let result = replace_product(&pool, 424_242, &tea_body()).await;
    assert!(matches!(result, Err(DbError::NotFound(424_242))));
}

#[sqlx::test(migrations = "../../migrations")]
async fn patch_leaves_missing_fields_untouched(pool: sqlx::PgPool) {
    let id = insert_tea(&pool).await;

    let patch = ProductPatch {
        name: Patch::Set("green tea".to_string()),
        ..ProductPatch::default()
    };
    let projection = project_fields(&patch).expect("projection");
    let patched = apply_patch(&pool, id, &projection)
        .await
        .expect("apply_patch failed");

    assert_eq!(patched.id, id);
    assert_eq!(patched.name.as_deref(), Some("green tea"));
    assert_eq!(patched.unit.as_deref(), Some("liters"));
    assert_eq!(patched.quantity, Some(2.5));
    assert_eq!(patched.stores, tea_body().stores);
}

#[sqlx::test(migrations = "../../migrations")]
async fn patch_writes_zero_quantity(pool: sqlx::PgPool) {
    let id = insert_tea(&pool).await;

    let patch = ProductPatch {
        quantity: Patch::Set(0.0),
        ..ProductPatch::default()
    };
    let projection = project_fields(&patch).expect("projection");
    let patched = apply_patch(&pool, id, &projection)
        .await
        .expect("apply_patch failed");

    assert_eq!(patched.quantity, Some(0.0));
}

#[sqlx::test(migrations = "../../migrations")]
async fn patch_with_explicit_null_clears_column(pool: sqlx::PgPool) {
    let id = insert_tea(&pool).await;

    let patch: ProductPatch = serde_json::from_str(r#"{"unit": null}"#).expect("decode");
    let projection = project_fields(&patch).expect("projection");
    let patched = apply_patch(&pool, id, &projection)
        .await
        .expect("apply_patch failed");

    assert!(patched.unit.is_none());
    assert_eq!(patched.name.as_deref(), Some("tea"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn patch_replaces_whole_stores_map(pool: sqlx::PgPool) {
    let id = insert_tea(&pool).await;

    let patch = ProductPatch {
        stores: Patch::Set(stores(&[("storeC", 1000.0)])),
        ..ProductPatch::default()
    };
    let projection = project_fields(&patch).expect("projection");
    let patched = apply_patch(&pool, id, &projection)
        .await
        .expect("apply_patch failed");

    assert_eq!(patched.stores, Some(stores(&[("storeC", 1000.0)])));
}

#[sqlx::test(migrations = "../../migrations")]
async fn patch_unknown_id_is_not_found(pool: sqlx::PgPool) {
    let patch = ProductPatch {
        name: Patch::Set("ghost".to_string()),
        ..ProductPatch::default()
    };
    let projection = project_fields(&patch).expect("projection");
    let result = apply_patch(&pool, 424_242, &projection).await;
    assert!(matches!(result, Err(DbError::NotFound(424_242))));
}

// ---------------------------------------------------------------------------
// Section 3: Stores merge patch
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn merge_patch_overwrites_and_adds_keys(pool: sqlx::PgPool) {
    let id = insert_tea(&pool).await;

    let merged = apply_merge_patch(&pool, id, &stores(&[("storeB", 0.0), ("storeC", 1000.0)]))
        .await
        .expect("apply_merge_patch failed");

    assert_eq!(
        merged.stores,
        Some(stores(&[
            ("storeA", 3000.0),
            ("storeB", 0.0),
            ("storeC", 1000.0)
        ]))
    );
    assert_eq!(merged.name.as_deref(), Some("tea"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn merge_patch_is_idempotent(pool: sqlx::PgPool) {
    let id = insert_tea(&pool).await;
    let patch = stores(&[("storeB", 3.0), ("storeC", 4.0)]);

    let once = apply_merge_patch(&pool, id, &patch)
        .await
        .expect("first merge failed");
    let twice = apply_merge_patch(&pool, id, &patch)
        .await
        .expect("second merge failed");

    assert_eq!(once.stores, twice.stores);
}

#[sqlx::test(migrations = "../../migrations")]
async fn merge_patch_onto_null_stores_starts_from_empty(pool: sqlx::PgPool) {
    let id = insert_product(&pool, &ProductBody::default())
        .await
        .expect("insert_product failed");

    let merged = apply_merge_patch(&pool, id, &stores(&[("storeA", 10.0)]))
        .await
        .expect("apply_merge_patch failed");

    assert_eq!(merged.stores, Some(stores(&[("storeA", 10.0)])));
}

#[sqlx::test(migrations = "../../migrations")]
async fn empty_merge_patch_keeps_null_stores(pool: sqlx::PgPool) {
    let id = insert_product(&pool, &ProductBody::default())
        .await
        .expect("insert_product failed");

    let merged = apply_merge_patch(&pool, id, &Stores::new())
        .await
        .expect("apply_merge_patch failed");
    assert_eq!(merged.stores, None);

    let fetched = get_product(&pool, id).await.expect("get_product failed");
    assert_eq!(fetched.stores, None);
}

#[sqlx::test(migrations = "../../migrations")]
async fn empty_merge_patch_leaves_existing_map_unchanged(pool: sqlx::PgPool) {
    let id = insert_tea(&pool).await;

    let merged = apply_merge_patch(&pool, id, &Stores::new())
        .await
        .expect("apply_merge_patch failed");

    assert_eq!(
        merged.stores,
        Some(stores(&[("storeA", 3000.0), ("storeB", 6000.0)]))
    );
    assert_eq!(merged.name.as_deref(), Some("tea"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn empty_merge_patch_unknown_id_is_not_found(pool: sqlx::PgPool) {
    let result = apply_merge_patch(&pool, 424_242, &Stores::new()).await;
    assert!(matches!(result, Err(DbError::NotFound(424_242))));
}

#[sqlx::test(migrations = "../../migrations")]
async fn merge_patch_unknown_id_is_not_found(pool: sqlx::PgPool) {
    let result = apply_merge_patch(&pool, 424_242, &stores(&[("storeA", 1.0)])).await;
    assert!(matches!(result, Err(DbError::NotFound(424_242))));
}

// ---------------------------------------------------------------------------
// Section 4: PgProductStore
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn store_patch_with_no_fields_fails_before_touching_row(pool: sqlx::PgPool) {
    let store = PgProductStore::new(pool.clone());
    let id = store
        .create_product(tea_body())
        .await
        .expect("create_product failed");

    let result = store.patch_product(id, ProductPatch::default()).await;
    assert!(
        matches!(
            result,
            Err(DbError::Projection(ProjectionError::NoFieldsToUpdate))
        ),
        "expected NoFieldsToUpdate, got {result:?}"
    );

    let unchanged = store.get_product(id).await.expect("get_product failed");
    assert_eq!(unchanged, tea_body().into_product(id));
}

#[sqlx::test(migrations = "../../migrations")]
async fn store_patch_keeps_id_stable(pool: sqlx::PgPool) {
    let store = PgProductStore::new(pool);
    let id = store
        .create_product(tea_body())
        .await
        .expect("create_product failed");

    let patched = store
        .patch_product(
            id,
            ProductPatch {
                unit: Patch::Set("ml".to_string()),
                ..ProductPatch::default()
            },
        )
        .await
        .expect("patch_product failed");
    let merged = store
        .patch_stores(id, stores(&[("storeD", 5.0)]))
        .await
        .expect("patch_stores failed");

    assert_eq!(patched.id, id);
    assert_eq!(merged.id, id);
    assert_eq!(merged.unit.as_deref(), Some("ml"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn store_ping_succeeds_on_live_pool(pool: sqlx::PgPool) {
    let store = PgProductStore::new(pool);
    store.ping().await.expect("ping failed");
}
