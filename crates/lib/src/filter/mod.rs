//! Spatial filtering, ordering and limiting for list reads.
//!
//! A [`ListQuery`] reduces a candidate set to the items that fit the requested
//! bounds and dimensions, sorts them by depth and truncates to the effective
//! limit. Raw query strings arrive as [`ListParams`] and are parsed here so that
//! malformed numbers surface as [`FilterError`]s.
//!
//! Bound checks come in two layers. A bound alone requires the coordinate to
//! lie in `[0, bound]`. When the matching size filter is also present the
//! item's centre offset must stay inside too: `pos + size / 2 <= bound`. Both
//! layers always apply.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};
use crate::item::PlacedItem;

pub mod errors;

pub use errors::FilterError;

/// Unparsed list parameters, exactly as received from a query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub limit: Option<String>,
    pub max_x: Option<String>,
    pub max_y: Option<String>,
    pub width: Option<String>,
    pub height: Option<String>,
}

impl ListParams {
    /// Parse every present parameter into a [`ListQuery`].
    ///
    /// Empty values are treated as absent. Bounds and sizes take any integer;
    /// a negative bound simply matches nothing. Only `limit` must be
    /// non-negative.
    pub fn parse(&self) -> Result<ListQuery, FilterError> {
        let limit = match parse_param("limit", self.limit.as_deref())? {
            Some(limit) => usize::try_from(limit).map_err(|_| FilterError::InvalidParameter {
                name: "limit",
                value: limit.to_string(),
            })?,
            None => 0,
        };
        Ok(ListQuery {
            limit,
            max_x: parse_param("maxX", self.max_x.as_deref())?,
            max_y: parse_param("maxY", self.max_y.as_deref())?,
            width: parse_param("width", self.width.as_deref())?,
            height: parse_param("height", self.height.as_deref())?,
        })
    }
}

impl TryFrom<ListParams> for ListQuery {
    type Error = FilterError;

    fn try_from(params: ListParams) -> Result<Self, Self::Error> {
        params.parse()
    }
}

fn parse_param(name: &'static str, raw: Option<&str>) -> Result<Option<i64>, FilterError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    raw.parse::<i64>()
        .map(Some)
        .map_err(|_| FilterError::InvalidParameter {
            name,
            value: raw.to_string(),
        })
}

/// A parsed list query.
///
/// `limit == 0` means "use the default". Every other field is optional and
/// disabled when `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub limit: usize,
    pub max_x: Option<i64>,
    pub max_y: Option<i64>,
    pub width: Option<i64>,
    pub height: Option<i64>,
}

impl ListQuery {
    /// Query with no filters and the default limit.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_max_x(mut self, max_x: i64) -> Self {
        self.max_x = Some(max_x);
        self
    }

    pub fn with_max_y(mut self, max_y: i64) -> Self {
        self.max_y = Some(max_y);
        self
    }

    pub fn with_width(mut self, width: i64) -> Self {
        self.width = Some(width);
        self
    }

    pub fn with_height(mut self, height: i64) -> Self {
        self.height = Some(height);
        self
    }

    /// The number of items this query may return.
    pub fn effective_limit(&self) -> usize {
        match self.limit {
            0 => DEFAULT_LIST_LIMIT,
            n => n.min(MAX_LIST_LIMIT),
        }
    }

    /// Check a single item against every active predicate.
    pub fn matches(&self, item: &PlacedItem) -> bool {
        within(item.position.y, self.max_y)
            && within(item.position.x, self.max_x)
            && self.width.is_none_or(|w| item.size.width == w)
            && self.height.is_none_or(|h| item.size.height == h)
            && centre_within(item.position.y, item.size.height, self.max_y, self.height)
            && centre_within(item.position.x, item.size.width, self.max_x, self.width)
    }

    /// Filter, sort ascending by depth and truncate.
    pub fn apply(&self, items: Vec<PlacedItem>) -> Vec<PlacedItem> {
        let mut matched: Vec<PlacedItem> = items
            .into_iter()
            .filter(|item| self.matches(item))
            .collect();
        matched.sort_by_key(|item| item.depth);
        matched.truncate(self.effective_limit());
        matched
    }
}

fn within(pos: i64, bound: Option<i64>) -> bool {
    bound.is_none_or(|max| (0..=max).contains(&pos))
}

/// `pos + size / 2 <= bound` evaluated without rounding: `2 * pos + size <= 2 * bound`.
fn centre_within(pos: i64, size: i64, bound: Option<i64>, size_filter: Option<i64>) -> bool {
    match (bound, size_filter) {
        (Some(max), Some(_)) => 2 * pos as i128 + size as i128 <= 2 * max as i128,
        _ => true,
    }
}
