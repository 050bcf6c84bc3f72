//! Database schema definitions using sea-query.
//!
//! These define the table and column identifiers for type-safe query building.

use sea_query::Iden;

/// Customers table schema.
#[derive(Iden)]
pub enum Customers {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "name"]
    Name,
    #[iden = "phone"]
    Phone,
    #[iden = "purchase_count"]
    PurchaseCount,
    #[iden = "created_at"]
    CreatedAt,
    #[iden = "updated_at"]
    UpdatedAt,
    /// Lowercased name and phone, matched by search.
    #[iden = "search_key"]
    SearchKey,
}

/// Purchase history table schema.
///
/// Append-only; rows go away only when their customer is deleted.
#[derive(Iden)]
pub enum PurchaseHistory {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "customer_id"]
    CustomerId,
    #[iden = "created_at"]
    CreatedAt,
    #[iden = "action"]
    Action,
}

/// Settings table schema.
#[derive(Iden)]
pub enum Settings {
    Table,
    #[iden = "key"]
    Key,
    #[iden = "value"]
    Value,
    #[iden = "updated_at"]
    UpdatedAt,
}

/// Columns selected whenever a full customer row is read.
pub const CUSTOMER_COLUMNS: [Customers; 6] = [
    Customers::Id,
    Customers::Name,
    Customers::Phone,
    Customers::PurchaseCount,
    Customers::CreatedAt,
    Customers::UpdatedAt,
];
