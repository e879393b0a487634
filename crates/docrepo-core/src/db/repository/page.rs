use serde::{Deserialize, Serialize};

///
/// PageInfo
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct PageInfo {
    pub page_number: Option<i64>,
    pub page_size: Option<i64>,
    pub total_count: u64,
    /// Resolved sort field name.
    pub sort_by: String,
    pub descending: bool,
}

///
/// PaginatedResult
///

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub page_info: PageInfo,
}

/// Skip and limit for a page. Only applies when both values are given;
/// values below 1 are clamped to 1.
pub(crate) fn page_window(page: Option<i64>, page_size: Option<i64>) -> Option<(u64, u64)> {
    let (page, size) = (page?.max(1), page_size?.max(1));
    let skip = (page - 1).saturating_mul(size);

    Some((
        u64::try_from(skip).unwrap_or(u64::MAX),
        u64::try_from(size).unwrap_or(u64::MAX),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_requires_both_values() {
        assert_eq!(page_window(Some(2), None), None);
        assert_eq!(page_window(None, Some(10)), None);
        assert_eq!(page_window(Some(3), Some(10)), Some((20, 10)));
    }

    #[test]
    fn window_clamps_values_below_one() {
        assert_eq!(page_window(Some(0), Some(5)), Some((0, 5)));
        assert_eq!(page_window(Some(-4), Some(0)), Some((0, 1)));
        assert_eq!(page_window(Some(3), Some(-1)), Some((2, 1)));
    }
}
