//! Paging DTOs

use serde::{Deserialize, Serialize};

use crate::domain::hero::Hero;

pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Page request
///
/// `index` is zero-based: page 0 skips nothing, page N skips `size * N`.
/// Sort keys are field names, prefixed with `-` for descending order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paging {
    #[serde(default)]
    pub index: u64,
    #[serde(default = "default_page_size")]
    pub size: u64,
    #[serde(default)]
    pub sort: Vec<String>,
}

fn default_page_size() -> u64 {
    DEFAULT_PAGE_SIZE
}

impl Default for Paging {
    fn default() -> Self {
        Self {
            index: 0,
            size: DEFAULT_PAGE_SIZE,
            sort: Vec::new(),
        }
    }
}

impl Paging {
    pub fn new(index: u64, size: u64) -> Self {
        Self {
            index,
            size,
            sort: Vec::new(),
        }
    }

    pub fn with_sort(mut self, sort: Vec<String>) -> Self {
        self.sort = sort;
        self
    }

    /// Number of matching items before this page
    pub fn skip(&self) -> u64 {
        self.size.saturating_mul(self.index)
    }
}

/// One page of heroes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResults {
    pub heroes: Vec<Hero>,
    /// Number of heroes on this page
    pub count: u64,
    /// Number of heroes matching the filters across all pages
    pub total: u64,
    pub index: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_index: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_index: Option<u64>,
}

impl ListResults {
    /// Assemble a page and work out its neighbours.
    ///
    /// A next page exists only when items remain past the end of this one.
    /// A previous index is only reported from page 2 onwards; page 1 does
    /// not point back to page 0.
    pub fn from_page(heroes: Vec<Hero>, total: u64, paging: &Paging) -> Self {
        let end_of_page = paging.skip().saturating_add(paging.size);

        let next_index = (total > end_of_page).then(|| paging.index + 1);
        let previous_index = (paging.index > 1).then(|| paging.index - 1);

        Self {
            count: heroes.len() as u64,
            heroes,
            total,
            index: paging.index,
            next_index,
            previous_index,
        }
    }
}
