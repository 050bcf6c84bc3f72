//! SettingsStore interface tests.

use coffeemania::interfaces::SettingsStore;

pub async fn test_get_unset<S: SettingsStore>(store: &S) {
    let value = store
        .get("test_unset_key")
        .await
        .expect("get should succeed");
    assert!(value.is_none(), "unset key should be None");
}

pub async fn test_set_and_get<S: SettingsStore>(store: &S) {
    store
        .set("test_set_key", "+7 900 000-00-00", "2024-01-01T10:00:00.000000Z")
        .await
        .expect("set should succeed");

    let value = store.get("test_set_key").await.unwrap();
    assert_eq!(value.as_deref(), Some("+7 900 000-00-00"));
}

pub async fn test_set_overwrites<S: SettingsStore>(store: &S) {
    store
        .set("test_overwrite_key", "first", "2024-01-01T10:00:00.000000Z")
        .await
        .unwrap();
    store
        .set("test_overwrite_key", "second", "2024-01-01T10:00:01.000000Z")
        .await
        .expect("overwrite should succeed");

    let value = store.get("test_overwrite_key").await.unwrap();
    assert_eq!(value.as_deref(), Some("second"));
}

pub async fn test_keys_are_isolated<S: SettingsStore>(store: &S) {
    store
        .set("test_iso_a", "a", "2024-01-01T10:00:00.000000Z")
        .await
        .unwrap();
    store
        .set("test_iso_b", "b", "2024-01-01T10:00:00.000000Z")
        .await
        .unwrap();

    assert_eq!(store.get("test_iso_a").await.unwrap().as_deref(), Some("a"));
    assert_eq!(store.get("test_iso_b").await.unwrap().as_deref(), Some("b"));
}

/// Run all SettingsStore interface tests against a store implementation.
#[macro_export]
macro_rules! run_settings_store_tests {
    ($store:expr) => {
        use $crate::storage::settings_store_tests::*;

        test_get_unset($store).await;
        println!("  test_get_unset: PASSED");

        test_set_and_get($store).await;
        println!("  test_set_and_get: PASSED");

        test_set_overwrites($store).await;
        println!("  test_set_overwrites: PASSED");

        test_keys_are_isolated($store).await;
        println!("  test_keys_are_isolated: PASSED");
    };
}
