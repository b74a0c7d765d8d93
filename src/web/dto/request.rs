//! Request DTOs for the HTTP API.

use serde::Deserialize;
use utoipa::IntoParams;
use validator::Validate;

/// Largest accepted page size.
pub const MAX_PAGE_SIZE: u32 = 100;

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    10
}

/// Pagination query for `GET /documents`.
#[derive(Debug, Clone, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListDocumentsQuery {
    /// Page number, starting at 1.
    #[serde(default = "default_page")]
    #[validate(range(min = 1, message = "page must be at least 1"))]
    pub page: u32,
    /// Items per page.
    #[serde(default = "default_page_size")]
    #[validate(range(min = 1, max = 100, message = "page_size must be between 1 and 100"))]
    pub page_size: u32,
}

impl Default for ListDocumentsQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            page_size: default_page_size(),
        }
    }
}

/// Query for the HTML index page.
///
/// Out-of-range values are clamped rather than rejected.
#[derive(Debug, Clone, Deserialize)]
pub struct IndexPageQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Flash code from the previous action.
    #[serde(default)]
    pub msg: Option<String>,
}

impl IndexPageQuery {
    pub fn page(&self) -> u32 {
        self.page.max(1)
    }

    pub fn page_size(&self) -> u32 {
        self.page_size.clamp(1, MAX_PAGE_SIZE)
    }
}
