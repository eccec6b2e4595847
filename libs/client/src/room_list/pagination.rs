//! Pagination configuration for room-list fetchers.

/// How a fetcher pages its results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationOptions {
    /// No pagination: every matching room is loaded at once.
    None,
    /// Default page size of 10.
    Default,
    /// Explicit page size. A non-positive value disables pagination.
    Custom(usize),
}

impl PaginationOptions {
    pub const DEFAULT_PAGE_SIZE: usize = 10;

    /// The effective page size, or `None` when pagination is disabled.
    pub fn page_size(self) -> Option<usize> {
        match self {
            PaginationOptions::None => None,
            PaginationOptions::Default => Some(Self::DEFAULT_PAGE_SIZE),
            PaginationOptions::Custom(0) => None,
            PaginationOptions::Custom(size) => Some(size),
        }
    }
}

impl Default for PaginationOptions {
    fn default() -> Self {
        PaginationOptions::None
    }
}
