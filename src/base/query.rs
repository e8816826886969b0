use serde::{Deserialize, Serialize};

use crate::models::column::ColumnId;
use crate::web::params::ListParams;

/// Tag placeholder some templates emit for "no tag selected"; treated
/// the same as an absent tag.
const TAG_PLACEHOLDER: &str = "None";

/// Sort order for article listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ArticleOrder {
    /// Created descending, the store's default order
    #[default]
    Newest,
    /// View count descending; ties fall back to the default order
    MostViewed,
}

impl ArticleOrder {
    /// Token understood in the `order` query parameter
    pub const TOTAL_VIEWS: &'static str = "total_views";
}

/// Query-specification value object handed to the store in one piece.
/// All filters compose conjunctively; the order is applied last and
/// never changes which rows are selected.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArticleQuery {
    /// Case-insensitive substring to look for in title or body
    pub search: Option<String>,
    /// Restrict to articles filed under this column
    pub column: Option<ColumnId>,
    /// Restrict to articles carrying this tag name
    pub tag: Option<String>,
    /// Listing order
    pub order: ArticleOrder,
}

/// Normalized parameter values, echoed back so the UI can round-trip
/// its current search/filter state. Absent or invalid inputs become
/// empty strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryEcho {
    pub search: String,
    pub order: String,
    pub column: String,
    pub tag: String,
}

impl ArticleQuery {
    /// Builds a query from raw request parameters, normalizing each one:
    /// empty search is dropped, a column token must be a digits-only
    /// string, the tag placeholder counts as no tag, and any order token
    /// other than `total_views` falls back to the default order. Invalid
    /// tokens are ignored silently, never an error.
    pub fn from_params(params: &ListParams) -> (Self, QueryEcho) {
        let mut query = ArticleQuery::default();
        let mut echo = QueryEcho::default();

        if let Some(search) = params.search.as_deref().filter(|s| !s.is_empty()) {
            query.search = Some(search.to_string());
            echo.search = search.to_string();
        }

        if let Some(column) = params.column.as_deref() {
            if let Some(id) = parse_column_token(column) {
                query.column = Some(id);
                echo.column = column.to_string();
            }
        }

        if let Some(tag) = params.tag.as_deref() {
            if !tag.is_empty() && tag != TAG_PLACEHOLDER {
                query.tag = Some(tag.to_string());
                echo.tag = tag.to_string();
            }
        }

        if params.order.as_deref() == Some(ArticleOrder::TOTAL_VIEWS) {
            query.order = ArticleOrder::MostViewed;
            echo.order = ArticleOrder::TOTAL_VIEWS.to_string();
        }

        (query, echo)
    }
}

/// Accepts only non-empty, digits-only column tokens ("7" but not "+7",
/// "7a" or ""), mirroring how the listing treats anything else as no
/// column filter.
fn parse_column_token(token: &str) -> Option<ColumnId> {
    if token.is_empty() || !token.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    token.parse::<i64>().ok().map(ColumnId)
}
