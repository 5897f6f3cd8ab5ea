use serde::Deserialize;

pub const DEFAULT_PER_PAGE: u32 = 10;

/// Raw `?page&perPage&search` query. Numbers arrive as text so that a bad
/// value can be reported with a message instead of a bare rejection.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<String>,
    #[serde(rename = "perPage")]
    pub per_page: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

impl PageRequest {
    pub fn new(page: u32, per_page: u32) -> Self {
        Self { page: page.max(1), per_page: per_page.max(1) }
    }

    /// Page 1 is served without an offset.
    pub fn offset(&self) -> Option<u32> {
        if self.page <= 1 {
            None
        } else {
            Some((self.page - 1).saturating_mul(self.per_page))
        }
    }

    pub fn total_pages(&self, count: i64) -> i64 {
        let per_page = i64::from(self.per_page);
        (count.max(0) + per_page - 1) / per_page
    }
}

impl ListQuery {
    /// Missing or zero `page` means page 1; `perPage` defaults to
    /// [`DEFAULT_PER_PAGE`] and must be at least 1.
    pub fn page_request(&self) -> Result<PageRequest, &'static str> {
        let page = match non_blank(&self.page) {
            Some(raw) => raw.parse::<u32>().map_err(|_| "Invalid page")?,
            None => 1,
        };
        let per_page = match non_blank(&self.per_page) {
            Some(raw) => raw.parse::<u32>().map_err(|_| "Invalid perPage")?,
            None => DEFAULT_PER_PAGE,
        };
        if per_page == 0 {
            return Err("Invalid perPage");
        }
        Ok(PageRequest::new(page, per_page))
    }

    pub fn search_term(&self) -> &str {
        self.search.as_deref().map(str::trim).unwrap_or_default()
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Unicode lowercase form stored beside searchable text. SQLite only folds
/// ASCII, so searches compare folded columns against folded patterns.
pub fn fold_case(text: &str) -> String {
    text.to_lowercase()
}

/// Case-insensitive `LIKE` pattern matching `term` as a literal substring.
/// Pair with `ESCAPE '\'`.
pub fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in fold_case(term).chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}
