//! CustomerStore and PurchaseHistory interface tests.
//!
//! These tests verify the contract of the customer store traits.
//! Each storage implementation should run these tests. Phones and ids are
//! unique per test so the functions can share one database.

use coffeemania::interfaces::{CustomerStore, NewCustomer, PurchaseHistory, StoreError};
use coffeemania::ledger::{Ledger, PurchaseAction};
use futures::future::join_all;

fn new_customer(id: &str, name: &str, phone: &str, created_at: &str) -> NewCustomer {
    NewCustomer {
        id: id.to_string(),
        name: name.to_string(),
        phone: phone.to_string(),
        created_at: created_at.to_string(),
    }
}

const T0: &str = "2024-01-01T10:00:00.000000Z";
const T1: &str = "2024-01-01T10:00:01.000000Z";
const T2: &str = "2024-01-01T10:00:02.000000Z";

// =============================================================================
// create / get
// =============================================================================

pub async fn test_create_and_get<S: CustomerStore>(store: &S) {
    let created = store
        .create(new_customer("cs_create01", "Anna", "+test-create-1", T0))
        .await
        .expect("create should succeed");

    assert_eq!(created.purchase_count, 0);
    assert_eq!(created.created_at, T0);
    assert_eq!(created.updated_at, T0);

    let fetched = store
        .get("cs_create01")
        .await
        .expect("get should succeed")
        .expect("customer should exist");
    assert_eq!(fetched, created);
}

pub async fn test_get_nonexistent<S: CustomerStore>(store: &S) {
    let result = store.get("cs_missing0").await.expect("get should succeed");
    assert!(result.is_none(), "unknown id should be None");
}

pub async fn test_duplicate_phone_conflicts<S: CustomerStore>(store: &S) {
    store
        .create(new_customer("cs_dup0001", "Anna", "+test-dup-1", T0))
        .await
        .unwrap();

    let result = store
        .create(new_customer("cs_dup0002", "Boris", "+test-dup-1", T1))
        .await;
    assert!(
        matches!(result, Err(StoreError::Conflict(_))),
        "duplicate phone should conflict, got {:?}",
        result
    );
    assert!(store.get("cs_dup0002").await.unwrap().is_none());
}

// =============================================================================
// list / search
// =============================================================================

pub async fn test_list_newest_first<S: CustomerStore>(store: &S) {
    store
        .create(new_customer("cs_list001", "List Old", "+test-list-1", T0))
        .await
        .unwrap();
    store
        .create(new_customer("cs_list002", "List New", "+test-list-2", T2))
        .await
        .unwrap();

    let ids: Vec<String> = store
        .list()
        .await
        .expect("list should succeed")
        .into_iter()
        .map(|c| c.id)
        .filter(|id| id.starts_with("cs_list"))
        .collect();
    assert_eq!(ids, vec!["cs_list002", "cs_list001"]);
}

pub async fn test_search_name_and_phone<S: CustomerStore>(store: &S) {
    store
        .create(new_customer("cs_srch001", "Marguerite", "+test-srch-77", T0))
        .await
        .unwrap();

    let by_name = store.search("MARGUER").await.expect("search should succeed");
    assert_eq!(by_name.len(), 1);
    assert_eq!(by_name[0].id, "cs_srch001");

    let by_phone = store.search("srch-77").await.unwrap();
    assert_eq!(by_phone.len(), 1);

    assert!(store.search("nobody-here").await.unwrap().is_empty());
}

pub async fn test_search_folds_unicode_case<S: CustomerStore>(store: &S) {
    store
        .create(new_customer("cs_uni0001", "Анна Петрова", "+test-uni-1", T0))
        .await
        .unwrap();

    for query in ["анна", "ПЕТР", "нА пЕт"] {
        let result = store.search(query).await.expect("search should succeed");
        assert_eq!(result.len(), 1, "query {query:?}");
        assert_eq!(result[0].id, "cs_uni0001");
    }
}

pub async fn test_search_escapes_wildcards<S: CustomerStore>(store: &S) {
    store
        .create(new_customer("cs_wild001", "Wild 100% Card", "+test-wild-1", T0))
        .await
        .unwrap();
    store
        .create(new_customer("cs_wild002", "Wild 1000 Card", "+test-wild-2", T0))
        .await
        .unwrap();

    let result = store.search("100%").await.unwrap();
    assert_eq!(result.len(), 1, "% must match literally");
    assert_eq!(result[0].id, "cs_wild001");

    assert!(store.search("Wild_1").await.unwrap().is_empty(), "_ must match literally");
}

// =============================================================================
// update / delete / reset
// =============================================================================

pub async fn test_update<S: CustomerStore>(store: &S) {
    store
        .create(new_customer("cs_upd0001", "Anna", "+test-upd-1", T0))
        .await
        .unwrap();
    store
        .create(new_customer("cs_upd0002", "Boris", "+test-upd-2", T0))
        .await
        .unwrap();

    let updated = store
        .update("cs_upd0001", "Anna K", "+test-upd-3", T1)
        .await
        .expect("update should succeed");
    assert_eq!(updated.name, "Anna K");
    assert_eq!(updated.phone, "+test-upd-3");
    assert_eq!(updated.created_at, T0);
    assert_eq!(updated.updated_at, T1);

    // Keeping its own phone is not a conflict
    store
        .update("cs_upd0001", "Anna", "+test-upd-3", T2)
        .await
        .expect("same phone should be accepted");

    let conflict = store.update("cs_upd0001", "Anna", "+test-upd-2", T2).await;
    assert!(matches!(conflict, Err(StoreError::Conflict(_))));

    let missing = store.update("cs_upd_none", "X", "+test-upd-9", T2).await;
    assert!(matches!(missing, Err(StoreError::NotFound { .. })));
}

pub async fn test_delete_removes_history<S: CustomerStore + PurchaseHistory>(store: &S) {
    let ledger = Ledger::default();
    store
        .create(new_customer("cs_del0001", "Anna", "+test-del-1", T0))
        .await
        .unwrap();
    store.record_purchase("cs_del0001", &ledger, T1).await.unwrap();

    store.delete("cs_del0001").await.expect("delete should succeed");

    assert!(store.get("cs_del0001").await.unwrap().is_none());
    assert!(store.history("cs_del0001").await.unwrap().is_empty());

    let again = store.delete("cs_del0001").await;
    assert!(matches!(again, Err(StoreError::NotFound { .. })));

    // Phone is free again
    store
        .create(new_customer("cs_del0002", "Anna", "+test-del-1", T2))
        .await
        .expect("phone should be reusable after delete");
}

pub async fn test_reset_keeps_history<S: CustomerStore + PurchaseHistory>(store: &S) {
    let ledger = Ledger::default();
    store
        .create(new_customer("cs_rst0001", "Anna", "+test-rst-1", T0))
        .await
        .unwrap();
    store.record_purchase("cs_rst0001", &ledger, T1).await.unwrap();
    store.record_purchase("cs_rst0001", &ledger, T1).await.unwrap();

    store
        .reset_purchases("cs_rst0001", T2)
        .await
        .expect("reset should succeed");

    let customer = store.get("cs_rst0001").await.unwrap().unwrap();
    assert_eq!(customer.purchase_count, 0);
    assert_eq!(customer.updated_at, T2);
    assert_eq!(store.history("cs_rst0001").await.unwrap().len(), 2);

    let missing = store.reset_purchases("cs_rst_none", T2).await;
    assert!(matches!(missing, Err(StoreError::NotFound { .. })));
}

// =============================================================================
// record_purchase / history
// =============================================================================

pub async fn test_reward_cycle<S: CustomerStore + PurchaseHistory>(store: &S) {
    let ledger = Ledger::default();
    store
        .create(new_customer("cs_cyc0001", "Anna", "+test-cyc-1", T0))
        .await
        .unwrap();

    for expected in 1..=6u32 {
        let outcome = store
            .record_purchase("cs_cyc0001", &ledger, T1)
            .await
            .expect("purchase should succeed");
        assert_eq!(outcome.customer.purchase_count, expected);
        assert_eq!(outcome.transition.new_count, expected);
        assert_eq!(outcome.event.action, PurchaseAction::Purchase);
        assert_eq!(outcome.event.customer_id, "cs_cyc0001");
    }

    let outcome = store.record_purchase("cs_cyc0001", &ledger, T2).await.unwrap();
    assert!(outcome.transition.reward_granted);
    assert_eq!(outcome.customer.purchase_count, 0);
    assert_eq!(outcome.customer.updated_at, T2);
    assert_eq!(outcome.event.action, PurchaseAction::FreeCoffee);

    let history = store.history("cs_cyc0001").await.unwrap();
    assert_eq!(history.len(), 7, "one event per call");
    assert_eq!(history[0].action, PurchaseAction::FreeCoffee);
    assert_eq!(history[0].timestamp, T2);
    assert!(history[0].id > history[1].id);
    assert!(history.windows(2).all(|w| w[0].id > w[1].id), "newest first");
}

/// Timestamps come from the caller and may step backwards (clock
/// adjustments); history still follows the order purchases were applied.
pub async fn test_history_follows_application_order<S: CustomerStore + PurchaseHistory>(
    store: &S,
) {
    let ledger = Ledger::default();
    store
        .create(new_customer("cs_ord0001", "Anna", "+test-ord-1", T0))
        .await
        .unwrap();

    store.record_purchase("cs_ord0001", &ledger, T2).await.unwrap();
    store.record_purchase("cs_ord0001", &ledger, T1).await.unwrap();

    let history = store.history("cs_ord0001").await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].timestamp, T1, "latest applied purchase comes first");
    assert_eq!(history[1].timestamp, T2);
    assert!(history[0].id > history[1].id);
}

/// A purchase future dropped before completion must not leave the store
/// holding a lock or an open transaction.
pub async fn test_cancelled_purchase_leaves_store_usable<S: CustomerStore + PurchaseHistory>(
    store: &S,
) {
    let ledger = Ledger::default();
    store
        .create(new_customer("cs_cncl001", "Anna", "+test-cncl-1", T0))
        .await
        .unwrap();

    // Cut the purchase off at different await points
    for polls in 1..=4 {
        let mut purchase = store.record_purchase("cs_cncl001", &ledger, T1);
        for _ in 0..polls {
            if futures::poll!(&mut purchase).is_ready() {
                break;
            }
            tokio::task::yield_now().await;
        }
        drop(purchase);
    }

    store
        .record_purchase("cs_cncl001", &ledger, T2)
        .await
        .expect("purchase after a dropped one should succeed");

    // Dropped purchases either committed fully or not at all
    let customer = store.get("cs_cncl001").await.unwrap().unwrap();
    let history = store.history("cs_cncl001").await.unwrap();
    assert!(history.iter().all(|e| e.action == PurchaseAction::Purchase));
    assert_eq!(customer.purchase_count as usize, history.len());
    assert_eq!(history[0].timestamp, T2);

    store
        .create(new_customer("cs_cncl002", "Boris", "+test-cncl-2", T0))
        .await
        .expect("writes after a dropped purchase should succeed");
}

pub async fn test_purchase_unknown_customer<S: CustomerStore + PurchaseHistory>(store: &S) {
    let result = store
        .record_purchase("cs_pur_none", &Ledger::default(), T0)
        .await;
    assert!(matches!(result, Err(StoreError::NotFound { .. })));
    assert!(store.history("cs_pur_none").await.unwrap().is_empty());
}

pub async fn test_concurrent_purchases_serialize<S: CustomerStore + PurchaseHistory>(store: &S) {
    let ledger = Ledger::default();
    store
        .create(new_customer("cs_conc001", "Anna", "+test-conc-1", T0))
        .await
        .unwrap();

    let results = join_all(
        (0..20).map(|_| store.record_purchase("cs_conc001", &ledger, T1)),
    )
    .await;
    let granted = results
        .into_iter()
        .map(|r| r.expect("concurrent purchase should succeed"))
        .filter(|o| o.transition.reward_granted)
        .count();

    // 6 paid, 1 free, 6 paid, 1 free, 6 paid
    assert_eq!(granted, 2);
    let customer = store.get("cs_conc001").await.unwrap().unwrap();
    assert_eq!(customer.purchase_count, 6);
    assert_eq!(store.history("cs_conc001").await.unwrap().len(), 20);
}

// =============================================================================
// stats
// =============================================================================

pub async fn test_stats_counts<S: CustomerStore>(store: &S) {
    let ledger = Ledger::new(2);
    let before = store.stats(2).await.expect("stats should succeed");

    store
        .create(new_customer("cs_stat001", "Anna", "+test-stat-1", T0))
        .await
        .unwrap();
    store
        .create(new_customer("cs_stat002", "Boris", "+test-stat-2", T0))
        .await
        .unwrap();
    for _ in 0..2 {
        store.record_purchase("cs_stat001", &ledger, T1).await.unwrap();
    }
    for _ in 0..3 {
        store.record_purchase("cs_stat002", &ledger, T1).await.unwrap();
    }

    let after = store.stats(2).await.unwrap();
    assert_eq!(after.total_customers - before.total_customers, 2);
    // cs_stat001 holds 2 (ready), cs_stat002 was granted and holds 0
    assert_eq!(after.total_purchases - before.total_purchases, 2);
    assert_eq!(after.ready_for_free_coffee - before.ready_for_free_coffee, 1);
    assert_eq!(after.rewards_granted - before.rewards_granted, 1);
}

// =============================================================================
// Test runner macro
// =============================================================================

/// Run all CustomerStore and PurchaseHistory interface tests against a store.
#[macro_export]
macro_rules! run_customer_store_tests {
    ($store:expr) => {
        use $crate::storage::customer_store_tests::*;

        // create / get
        test_create_and_get($store).await;
        println!("  test_create_and_get: PASSED");

        test_get_nonexistent($store).await;
        println!("  test_get_nonexistent: PASSED");

        test_duplicate_phone_conflicts($store).await;
        println!("  test_duplicate_phone_conflicts: PASSED");

        // list / search
        test_list_newest_first($store).await;
        println!("  test_list_newest_first: PASSED");

        test_search_name_and_phone($store).await;
        println!("  test_search_name_and_phone: PASSED");

        test_search_escapes_wildcards($store).await;
        println!("  test_search_escapes_wildcards: PASSED");

        test_search_folds_unicode_case($store).await;
        println!("  test_search_folds_unicode_case: PASSED");

        // update / delete / reset
        test_update($store).await;
        println!("  test_update: PASSED");

        test_delete_removes_history($store).await;
        println!("  test_delete_removes_history: PASSED");

        test_reset_keeps_history($store).await;
        println!("  test_reset_keeps_history: PASSED");

        // purchases
        test_reward_cycle($store).await;
        println!("  test_reward_cycle: PASSED");

        test_history_follows_application_order($store).await;
        println!("  test_history_follows_application_order: PASSED");

        test_purchase_unknown_customer($store).await;
        println!("  test_purchase_unknown_customer: PASSED");

        test_cancelled_purchase_leaves_store_usable($store).await;
        println!("  test_cancelled_purchase_leaves_store_usable: PASSED");

        test_concurrent_purchases_serialize($store).await;
        println!("  test_concurrent_purchases_serialize: PASSED");

        test_stats_counts($store).await;
        println!("  test_stats_counts: PASSED");
    };
}
