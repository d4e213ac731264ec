use serde::{Deserialize, Serialize};

/// Default number of items requested per page
pub const DEFAULT_PAGE_LIMIT: u32 = 20;

/// Paginated list envelope: `{items, limit, offset, has_more}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Page<T> {
    pub items: Vec<T>,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
    #[serde(default)]
    pub has_more: bool,
}

impl<T> Page<T> {
    /// Offset of the following page, if the service says there is one.
    ///
    /// `None` also when the next offset would not fit in a `u32`.
    pub fn next_offset(&self) -> Option<u32> {
        if !self.has_more {
            return None;
        }
        u32::try_from(self.items.len())
            .ok()
            .and_then(|n| self.offset.checked_add(n))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: u32,
    pub offset: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_LIMIT,
            offset: 0,
        }
    }
}

impl PageRequest {
    pub fn query(&self) -> String {
        format!("limit={}&offset={}", self.limit, self.offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_parses_and_advances() {
        let page: Page<u32> =
            serde_json::from_str(r#"{"items": [1, 2, 3], "limit": 3, "offset": 6, "has_more": true}"#)
                .unwrap();
        assert_eq!(page.items, vec![1, 2, 3]);
        assert_eq!(page.next_offset(), Some(9));
    }

    #[test]
    fn test_last_page_has_no_next() {
        let page: Page<u32> = serde_json::from_str(r#"{"items": [], "has_more": false}"#).unwrap();
        assert_eq!(page.limit, 0);
        assert_eq!(page.next_offset(), None);
    }

    #[test]
    fn test_next_offset_at_u32_limit() {
        let page: Page<u32> =
            serde_json::from_str(r#"{"items": [1], "offset": 4294967295, "has_more": true}"#).unwrap();
        assert_eq!(page.next_offset(), None);

        let page: Page<u32> =
            serde_json::from_str(r#"{"items": [1], "offset": 4294967294, "has_more": true}"#).unwrap();
        assert_eq!(page.next_offset(), Some(u32::MAX));
    }

    #[test]
    fn test_page_request_query() {
        assert_eq!(PageRequest::default().query(), "limit=20&offset=0");
        assert_eq!(PageRequest { limit: 5, offset: 10 }.query(), "limit=5&offset=10");
    }
}
