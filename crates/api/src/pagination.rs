//! Cursor pagination
//!
//! Reads are descending by timestamp. Handlers fetch `limit + 1` rows to
//! probe for a further page; when the probe hits, the tail row is trimmed
//! and its predecessor's timestamp becomes the opaque cursor.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Default page size when `limit` is absent or unusable.
pub const DEFAULT_LIMIT: usize = 50;

/// Hard cap on the page size.
pub const MAX_LIMIT: usize = 200;

/// Parsed pagination parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pagination {
    pub limit: usize,
    pub before: Option<DateTime<Utc>>,
}

impl Pagination {
    /// Parse query values leniently: non-numeric or non-positive limits
    /// fall back to the default, oversized limits clamp to the cap, and
    /// unparseable cursors are ignored.
    pub fn parse(limit: Option<&str>, before: Option<&str>) -> Self {
        let limit = limit
            .and_then(|raw| raw.parse::<usize>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_LIMIT)
            .min(MAX_LIMIT);

        let before = before
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|t| t.with_timezone(&Utc));

        Self { limit, before }
    }

    /// Rows to request from the store (the `+1` probe).
    pub fn fetch_limit(&self) -> i64 {
        (self.limit + 1) as i64
    }
}

/// A cursor-paginated response page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CursorPage<T> {
    pub data: Vec<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
    pub has_more: bool,
}

/// Trim a probed row set down to a page.
pub fn paginate<T>(
    mut rows: Vec<T>,
    limit: usize,
    ts_of: impl Fn(&T) -> DateTime<Utc>,
) -> CursorPage<T> {
    let has_more = rows.len() > limit;
    if has_more {
        rows.truncate(limit);
    }

    let next_cursor = if has_more {
        rows.last().map(|row| format_cursor(ts_of(row)))
    } else {
        None
    };

    CursorPage {
        data: rows,
        next_cursor,
        has_more,
    }
}

/// RFC3339 with nanoseconds, the cursor wire format.
pub fn format_cursor(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(secs: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, secs).unwrap()
    }

    #[test]
    fn test_parse_defaults() {
        assert_eq!(
            Pagination::parse(None, None),
            Pagination {
                limit: DEFAULT_LIMIT,
                before: None
            }
        );
    }

    #[test]
    fn test_parse_lenient_limit() {
        assert_eq!(Pagination::parse(Some("25"), None).limit, 25);
        assert_eq!(Pagination::parse(Some("abc"), None).limit, DEFAULT_LIMIT);
        assert_eq!(Pagination::parse(Some("0"), None).limit, DEFAULT_LIMIT);
        assert_eq!(Pagination::parse(Some("-3"), None).limit, DEFAULT_LIMIT);
        assert_eq!(Pagination::parse(Some("9999"), None).limit, MAX_LIMIT);
    }

    #[test]
    fn test_parse_before_cursor() {
        let page = Pagination::parse(None, Some("2024-06-01T12:00:05.000000000Z"));
        assert_eq!(page.before, Some(ts(5)));

        // Unparseable cursors are ignored.
        assert_eq!(Pagination::parse(None, Some("last tuesday")).before, None);
    }

    #[test]
    fn test_paginate_full_page_with_probe_hit() {
        // 4 rows fetched for limit 3: trim to 3, cursor on the last kept.
        let rows = vec![ts(9), ts(8), ts(7), ts(6)];
        let page = paginate(rows, 3, |t| *t);

        assert_eq!(page.data.len(), 3);
        assert!(page.has_more);
        assert_eq!(page.next_cursor.as_deref(), Some("2024-06-01T12:00:07.000000000Z"));
    }

    #[test]
    fn test_paginate_short_page() {
        let rows = vec![ts(9), ts(8)];
        let page = paginate(rows, 3, |t| *t);

        assert_eq!(page.data.len(), 2);
        assert!(!page.has_more);
        assert!(page.next_cursor.is_none());
    }

    #[test]
    fn test_paginate_empty() {
        let page = paginate(Vec::<DateTime<Utc>>::new(), 3, |t| *t);
        assert!(page.data.is_empty());
        assert!(!page.has_more);
        assert!(page.next_cursor.is_none());
    }

    #[test]
    fn test_cursor_round_trips_through_parse() {
        let cursor = format_cursor(ts(5));
        let parsed = Pagination::parse(None, Some(&cursor));
        assert_eq!(parsed.before, Some(ts(5)));
    }
}
