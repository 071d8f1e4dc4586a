//! Database schema definitions and column families.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// Primary account records, keyed by `account_id`.
    pub const ACCOUNTS: &str = "accounts";

    /// Unique email index: email -> `account_id`.
    pub const ACCOUNTS_BY_EMAIL: &str = "accounts_by_email";

    /// Unique mobile index: mobile -> `account_id`.
    pub const ACCOUNTS_BY_MOBILE: &str = "accounts_by_mobile";

    /// Ledger entries, keyed by `entry_id` (ULID).
    pub const LEDGER: &str = "ledger";

    /// Index: entries by account, keyed by `account_id || entry_id`.
    /// Value is empty (index only).
    pub const LEDGER_BY_ACCOUNT: &str = "ledger_by_account";

    /// Idea records, keyed by `idea_id`.
    pub const IDEAS: &str = "ideas";

    /// Index: ideas by account, keyed by `account_id || idea_id`.
    pub const IDEAS_BY_ACCOUNT: &str = "ideas_by_account";

    /// Index: ideas by status, keyed by `status_byte || idea_id`.
    /// Moved when an idea is decided.
    pub const IDEAS_BY_STATUS: &str = "ideas_by_status";

    /// Referral codes, keyed by the code string. Doubles as the uniqueness
    /// guard for code issuance.
    pub const REFERRAL_CODES: &str = "referral_codes";

    /// Payment orders, keyed by internal `order_id`.
    pub const ORDERS: &str = "orders";

    /// Unique index: gateway order id -> internal `order_id`.
    pub const ORDERS_BY_EXTERNAL: &str = "orders_by_external";

    /// Index: orders by account, keyed by `account_id || order_id`.
    pub const ORDERS_BY_ACCOUNT: &str = "orders_by_account";

    /// Withdrawal requests, keyed by `withdrawal_id`.
    pub const WITHDRAWALS: &str = "withdrawals";

    /// Index: withdrawals by account, keyed by `account_id || withdrawal_id`.
    pub const WITHDRAWALS_BY_ACCOUNT: &str = "withdrawals_by_account";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![
        cf::ACCOUNTS,
        cf::ACCOUNTS_BY_EMAIL,
        cf::ACCOUNTS_BY_MOBILE,
        cf::LEDGER,
        cf::LEDGER_BY_ACCOUNT,
        cf::IDEAS,
        cf::IDEAS_BY_ACCOUNT,
        cf::IDEAS_BY_STATUS,
        cf::REFERRAL_CODES,
        cf::ORDERS,
        cf::ORDERS_BY_EXTERNAL,
        cf::ORDERS_BY_ACCOUNT,
        cf::WITHDRAWALS,
        cf::WITHDRAWALS_BY_ACCOUNT,
    ]
}
