use serde::{Deserialize, Serialize};
use validator::Validate;

pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

fn one() -> i64 {
    1
}

fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

/// `?page=&limit=` query parameters, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Validate)]
pub struct PageRequest {
    #[validate(range(min = 1, message = "page must be at least 1"))]
    #[serde(default = "one")]
    pub page: i64,
    #[validate(range(min = 1, max = 100, message = "limit must be between 1 and 100"))]
    #[serde(default = "default_limit")]
    pub limit: i64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    pub fn new(page: i64, limit: i64) -> Self {
        Self { page, limit }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PageMeta {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub has_next: bool,
    pub has_previous: bool,
}

/// List envelope: `{results, pagination}`.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub results: Vec<T>,
    pub pagination: PageMeta,
}

impl<T> Page<T> {
    /// Wraps one already-sliced page of a result set of `total` rows.
    pub fn new(results: Vec<T>, total: i64, req: &PageRequest) -> Self {
        let end = req.offset().saturating_add(req.limit);
        Self {
            results,
            pagination: PageMeta {
                page: req.page,
                limit: req.limit,
                total,
                has_next: end < total,
                has_previous: req.page > 1,
            },
        }
    }

    /// Slices a fully materialized result set.
    pub fn from_vec(all: Vec<T>, req: &PageRequest) -> Self {
        let total = all.len() as i64;
        let start = usize::try_from(req.offset()).unwrap_or(usize::MAX);
        let results = all
            .into_iter()
            .skip(start)
            .take(req.limit as usize)
            .collect();
        Self::new(results, total, req)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            results: self.results.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}
