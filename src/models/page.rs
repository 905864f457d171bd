use serde::Deserialize;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Query string accepted by list endpoints: `?page=2&size=20&sort=name:asc`.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub sort: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// A requested ordering. `field` is the wire (camelCase) name; stores map it to
/// a column and ignore names they do not know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub field: String,
    pub direction: SortDirection,
}

impl Sort {
    /// Parses `field` or `field:direction`. Anything other than `asc` sorts descending.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.splitn(2, ':');
        let field = parts.next()?.trim();
        if field.is_empty() {
            return None;
        }
        let direction = match parts.next().map(str::trim) {
            Some("asc") => SortDirection::Asc,
            _ => SortDirection::Desc,
        };
        Some(Self {
            field: field.to_string(),
            direction,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
    pub sort: Option<Sort>,
}

impl PageRequest {
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.size)
    }
}

impl From<PageQuery> for PageRequest {
    fn from(query: PageQuery) -> Self {
        Self {
            page: query.page.unwrap_or(DEFAULT_PAGE).max(1),
            size: query
                .size
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .clamp(1, MAX_PAGE_SIZE),
            sort: query.sort.as_deref().and_then(Sort::parse),
        }
    }
}

/// One page of results plus the numbers needed for the response `meta`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub per_page: u32,
    pub current_page: u32,
    pub total_pages: u32,
    pub total_items: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: &PageRequest, total_items: u64) -> Self {
        let size = u64::from(request.size);
        let total_pages = ((total_items + size - 1) / size).max(1);
        Self {
            items,
            per_page: request.size,
            current_page: request.page,
            total_pages: u32::try_from(total_pages).unwrap_or(u32::MAX),
            total_items,
        }
    }
}
