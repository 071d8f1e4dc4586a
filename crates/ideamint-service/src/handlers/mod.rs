//! API handlers.

pub mod accounts;
pub mod health;
pub mod ideas;
pub mod orders;
pub mod withdrawals;

/// Default page size for list endpoints.
pub const DEFAULT_PAGE_LIMIT: usize = 50;

/// Maximum page size a client may request.
pub const MAX_PAGE_LIMIT: usize = 200;

/// Pagination query parameters shared by list endpoints.
#[derive(Debug, serde::Deserialize)]
pub struct Pagination {
    /// Maximum number of items to return.
    pub limit: Option<usize>,
    /// Number of items to skip.
    pub offset: Option<usize>,
}

impl Pagination {
    /// Clamp to the configured bounds.
    #[must_use]
    pub fn bounds(&self) -> (usize, usize) {
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_LIMIT).min(MAX_PAGE_LIMIT);
        (limit, self.offset.unwrap_or(0))
    }
}
