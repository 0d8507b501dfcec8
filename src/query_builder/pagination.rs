use serde::Serialize;

/// Represents LIMIT/OFFSET parameters for SQL queries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl Pagination {
    /// Create pagination from a 1-indexed page number and per-page count
    pub fn new(page: u64, per_page: u64) -> Self {
        let offset = page.saturating_sub(1).saturating_mul(per_page);
        Self {
            limit: Some(per_page),
            offset: Some(offset),
        }
    }

    /// Create pagination with only a limit
    pub fn limit_only(limit: u64) -> Self {
        Self {
            limit: Some(limit),
            offset: None,
        }
    }

    /// Create pagination with only an offset
    pub fn offset_only(offset: u64) -> Self {
        Self {
            limit: None,
            offset: Some(offset),
        }
    }

    /// Convert to SQL string
    pub fn to_sql(&self) -> String {
        let mut sql = String::new();

        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        if let Some(offset) = self.offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }

        sql
    }

    /// Total pages for a count, by ceiling division; never less than one
    pub fn total_pages(per_page: u64, total: u64) -> u64 {
        if per_page == 0 {
            return 1;
        }
        std::cmp::max(1, total.div_ceil(per_page))
    }
}

/// One page of results plus the metadata needed to render pagination
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub per_page: u64,
    pub current_page: u64,
    pub last_page: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, per_page: u64, current_page: u64) -> Self {
        Self {
            items,
            total,
            per_page,
            current_page,
            last_page: Pagination::total_pages(per_page, total),
        }
    }

    pub fn has_next_page(&self) -> bool {
        self.current_page < self.last_page
    }

    pub fn has_previous_page(&self) -> bool {
        self.current_page > 1
    }
}
