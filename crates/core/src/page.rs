use serde::{Deserialize, Serialize};

/// One-based page number for listings with a fixed page size.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub struct Page(u32);

impl Page {
    pub const FIRST: Page = Page(1);

    /// Pages below 1 are clamped to the first page.
    pub fn new(number: u32) -> Self {
        Self(number.max(1))
    }

    pub fn number(self) -> u32 {
        self.0
    }

    pub fn offset(self, page_size: u32) -> u64 {
        u64::from(self.0.saturating_sub(1)) * u64::from(page_size)
    }
}

impl From<u32> for Page {
    fn from(number: u32) -> Self {
        Self::new(number)
    }
}

impl From<Page> for u32 {
    fn from(page: Page) -> Self {
        page.0
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::FIRST
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_is_zero_based() {
        assert_eq!(Page::new(1).offset(21), 0);
        assert_eq!(Page::new(3).offset(21), 42);
    }

    #[test]
    fn page_zero_clamps_to_first() {
        assert_eq!(Page::new(0), Page::FIRST);
    }

    #[test]
    fn deserialized_page_zero_clamps_to_first() {
        let page: Page = serde_json::from_str("0").unwrap();
        assert_eq!(page, Page::FIRST);
        assert_eq!(page.offset(21), 0);
        assert_eq!(serde_json::to_string(&Page::new(4)).unwrap(), "4");
    }
}
