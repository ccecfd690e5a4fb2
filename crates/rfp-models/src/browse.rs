//! Browse filtering and pagination over published RFPs.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::rfp::{Rfp, RfpStatus};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PER_PAGE: u32 = 20;
pub const MAX_PER_PAGE: u32 = 100;

/// Query string for `GET /rfps/browse`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct BrowseQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub per_page: Option<u32>,
}

impl BrowseQuery {
    /// 1-based page number, at least 1.
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(DEFAULT_PAGE).max(1)
    }

    /// Page size clamped to `1..=MAX_PER_PAGE`.
    pub fn per_page(&self) -> u32 {
        self.per_page
            .unwrap_or(DEFAULT_PER_PAGE)
            .clamp(1, MAX_PER_PAGE)
    }

    /// Trimmed category filter, `None` when empty.
    pub fn category_filter(&self) -> Option<&str> {
        self.category.as_deref().map(str::trim).filter(|c| !c.is_empty())
    }

    fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }

    /// Published, category equal, search a case-insensitive substring of
    /// title, description or company.
    pub fn matches(&self, rfp: &Rfp) -> bool {
        if rfp.status != RfpStatus::Published {
            return false;
        }
        if let Some(category) = self.category_filter() {
            if rfp.category != category {
                return false;
            }
        }
        match self.search_term() {
            Some(term) => [&rfp.title, &rfp.description, &rfp.company]
                .iter()
                .any(|field| field.to_lowercase().contains(&term)),
            None => true,
        }
    }

    /// Filter, order newest first, then cut out the requested page.
    pub fn apply(&self, rfps: Vec<Rfp>) -> Page<Rfp> {
        let mut matching: Vec<Rfp> = rfps.into_iter().filter(|r| self.matches(r)).collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Page::slice(matching, self.page(), self.per_page())
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
    pub total_pages: u32,
}

impl<T> Page<T> {
    /// Cut page `page` (1-based) of size `per_page` out of an ordered list.
    pub fn slice(all: Vec<T>, page: u32, per_page: u32) -> Self {
        let per_page = per_page.max(1);
        let page = page.max(1);
        let total = all.len();
        let total_pages = total.div_ceil(per_page as usize) as u32;
        let start = (page as usize - 1).saturating_mul(per_page as usize);
        let items = all
            .into_iter()
            .skip(start)
            .take(per_page as usize)
            .collect();

        Self {
            items,
            page,
            per_page,
            total: total as u64,
            total_pages,
        }
    }
}
