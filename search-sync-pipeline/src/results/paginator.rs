//! Offset/limit pagination over fetched results.

use serde::Serialize;

use search_sync_shared::MappedResult;

/// Page size used when none is given.
pub const DEFAULT_PER_PAGE: usize = 15;

/// Page-at-a-time view over the results of one search call.
///
/// `total` is the engine's total hit count, which may exceed the number of
/// fetched results. Pages past the fetched results are empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Paginator {
    items: Vec<MappedResult>,
    total: u64,
    per_page: usize,
}

impl Paginator {
    pub(crate) fn new(items: Vec<MappedResult>, total: u64, per_page: usize) -> Self {
        let per_page = if per_page == 0 { DEFAULT_PER_PAGE } else { per_page };
        Self {
            items,
            total,
            per_page,
        }
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn per_page(&self) -> usize {
        self.per_page
    }

    /// Last page number according to the engine's total, never below 1.
    pub fn last_page(&self) -> usize {
        let total = usize::try_from(self.total).unwrap_or(usize::MAX);
        total.div_ceil(self.per_page).max(1)
    }

    /// Page `number`, 1-based. Page 0 is read as page 1.
    pub fn page(&self, number: usize) -> Page<'_> {
        let current_page = number.max(1);
        let offset = (current_page - 1).saturating_mul(self.per_page);
        let items = if offset >= self.items.len() {
            &self.items[..0]
        } else {
            let end = (offset + self.per_page).min(self.items.len());
            &self.items[offset..end]
        };

        let (from, to) = if items.is_empty() {
            (None, None)
        } else {
            (Some(offset + 1), Some(offset + items.len()))
        };

        Page {
            items,
            total: self.total,
            per_page: self.per_page,
            current_page,
            last_page: self.last_page(),
            from,
            to,
        }
    }

    /// Every page holding at least one fetched result, in order.
    pub fn pages(&self) -> impl Iterator<Item = Page<'_>> + '_ {
        let fetched = self.items.len().div_ceil(self.per_page);
        (1..=fetched).map(move |number| self.page(number))
    }

    pub fn into_items(self) -> Vec<MappedResult> {
        self.items
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<'a> {
    #[serde(rename = "data")]
    pub items: &'a [MappedResult],
    pub total: u64,
    pub per_page: usize,
    pub current_page: usize,
    pub last_page: usize,
    /// 1-based position of the first item, `None` on an empty page.
    pub from: Option<usize>,
    /// 1-based position of the last item, `None` on an empty page.
    pub to: Option<usize>,
}

impl Page<'_> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_more_pages(&self) -> bool {
        self.current_page < self.last_page
    }
}
