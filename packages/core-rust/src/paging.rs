//! Pagination normalization for read-side operations.

use serde::{Deserialize, Serialize};

/// Normalized pagination parameters. Pure value type, no identity.
///
/// A `page_size` of 0 means "no limit" -- downstream consumers rely on this
/// to request unbounded listings, so [`PageRequest::limit`] returns `None`
/// for it rather than zero rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    pub page: u64,
    pub page_size: u64,
}

impl PageRequest {
    /// Normalizes raw pagination inputs: absent or negative values clamp to 0.
    #[must_use]
    pub fn normalize(page: Option<i64>, page_size: Option<i64>) -> Self {
        #[allow(clippy::cast_sign_loss)]
        fn clamp(value: Option<i64>) -> u64 {
            value.map_or(0, |v| v.max(0) as u64)
        }
        Self {
            page: clamp(page),
            page_size: clamp(page_size),
        }
    }

    /// Row offset of the first entry on this page.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.page * self.page_size
    }

    /// Row limit for this page, or `None` when the page size means
    /// "no limit".
    #[must_use]
    pub fn limit(&self) -> Option<u64> {
        if self.page_size == 0 {
            None
        } else {
            Some(self.page_size)
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::normalize(None, None)
    }
}
