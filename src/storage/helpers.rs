//! Helpers shared by the store implementations.

use chrono::{SecondsFormat, Utc};

use crate::interfaces::{Result, StoreError};
use crate::ledger::PurchaseAction;

/// Current UTC time as stored in timestamp columns.
///
/// Fixed microsecond precision keeps lexical and chronological order equal.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Build a `LIKE` pattern matching `query` as a literal substring.
///
/// `%`, `_` and the escape character itself are escaped with `\`; callers
/// must add `ESCAPE '\'` to the predicate.
pub fn contains_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Lowercased name and phone as stored in the `search_key` column.
///
/// Folded in Rust because SQLite's `lower()` only handles ASCII. Queries
/// must be folded with `str::to_lowercase` before [`contains_pattern`].
pub fn search_key(name: &str, phone: &str) -> String {
    format!("{}\n{}", name.to_lowercase(), phone.to_lowercase())
}

/// Convert a stored counter to the domain type.
pub fn purchase_count_from_db(value: i64) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| StoreError::Corrupt(format!("purchase count out of range: {}", value)))
}

/// Parse a stored history action.
pub fn action_from_db(value: &str) -> Result<PurchaseAction> {
    value
        .parse()
        .map_err(|e: crate::ledger::UnknownAction| StoreError::Corrupt(e.to_string()))
}

/// Whether a unique-violation error was raised by the phone column.
///
/// SQLite reports `UNIQUE constraint failed: customers.phone`; PostgreSQL
/// reports the constraint name `customers_phone_key`.
#[cfg(any(feature = "sqlite", feature = "postgres"))]
pub fn is_phone_conflict(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            db.constraint().is_some_and(|c| c.contains("phone")) || db.message().contains("phone")
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("ann"), "%ann%");
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(contains_pattern("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn test_search_key_folds_unicode() {
        assert_eq!(search_key("Анна Петрова", "+7 ABC"), "анна петрова\n+7 abc");
        assert!(search_key("ПЕТР", "").starts_with("петр"));
    }

    #[test]
    fn test_purchase_count_rejects_negative() {
        assert_eq!(purchase_count_from_db(3).unwrap(), 3);
        assert!(matches!(
            purchase_count_from_db(-1),
            Err(StoreError::Corrupt(_))
        ));
    }

    #[test]
    fn test_action_from_db() {
        assert_eq!(action_from_db("free_coffee").unwrap(), PurchaseAction::FreeCoffee);
        assert!(matches!(action_from_db("refund"), Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn test_timestamps_sort_lexically() {
        let a = now_timestamp();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = now_timestamp();
        assert!(a < b);
        assert!(a.ends_with('Z'));
    }
}
