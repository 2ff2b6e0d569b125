use super::params::parse_number;

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 50;
pub const MAX_LIMIT: u64 = 200;

/// Page window of the listing: `page >= 1`, `limit` in `[1, MAX_LIMIT]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u64,
    pub limit: u64,
}

impl PageWindow {
    /// Fractions are truncated, out-of-range values clamped, garbage replaced
    /// by the defaults
    pub fn from_params(page: Option<&str>, limit: Option<&str>) -> Self {
        let page = parse_number(page, DEFAULT_PAGE as f64).trunc().max(1.0);
        let limit = parse_number(limit, DEFAULT_LIMIT as f64)
            .trunc()
            .clamp(1.0, MAX_LIMIT as f64);

        Self {
            // `as` saturates for very large pages
            page: page as u64,
            limit: limit as u64,
        }
    }

    /// Rows to skip; capped so the store can bind it as a signed integer
    pub fn offset(&self) -> u64 {
        (self.page - 1)
            .saturating_mul(self.limit)
            .min(i64::MAX as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert_eq!(
            PageWindow::from_params(None, None),
            PageWindow {
                page: DEFAULT_PAGE,
                limit: DEFAULT_LIMIT
            }
        );
        assert_eq!(
            PageWindow::from_params(Some("x"), Some("")),
            PageWindow { page: 1, limit: 50 }
        );
    }

    #[test]
    fn test_clamping() {
        assert_eq!(
            PageWindow::from_params(Some("0"), Some("0")),
            PageWindow { page: 1, limit: 1 }
        );
        assert_eq!(
            PageWindow::from_params(Some("-3"), Some("5000")),
            PageWindow { page: 1, limit: 200 }
        );
        assert_eq!(
            PageWindow::from_params(Some("2.9"), Some("10.5")),
            PageWindow { page: 2, limit: 10 }
        );
    }

    #[test]
    fn test_offset() {
        assert_eq!(PageWindow { page: 1, limit: 50 }.offset(), 0);
        assert_eq!(PageWindow { page: 3, limit: 20 }.offset(), 40);
        assert_eq!(
            PageWindow::from_params(Some("1e30"), Some("200")).offset(),
            i64::MAX as u64
        );
    }
}
