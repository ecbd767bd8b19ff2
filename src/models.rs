use serde::Deserialize;
use serde_json::{Map, Value};

/// Columns written for every review, in CSV order.
pub const REVIEW_FIELDS: [&str; 22] = [
    "recommendationid",
    "language",
    "review",
    "timestamp_created",
    "timestamp_updated",
    "voted_up",
    "votes_up",
    "votes_funny",
    "weighted_vote_score",
    "comment_count",
    "steam_purchase",
    "received_for_free",
    "written_during_early_access",
    "hidden_in_steam_china",
    "steam_china_location",
    "author_steamid",
    "author_num_games_owned",
    "author_num_reviews",
    "author_playtime_forever",
    "author_playtime_last_two_weeks",
    "author_playtime_at_review",
    "author_last_played",
];

/// Opaque pagination token. Empty means "from the start".
pub type Cursor = String;

/// The `success` flag, read before the page itself so a failure body
/// without `cursor` is reported as such.
#[derive(Debug, Deserialize)]
pub struct ApiStatus {
    #[serde(default)]
    pub success: Option<i64>,
}

/// One page of the `appreviews` response. `cursor` is required: a page
/// without one must not reset pagination to the start.
#[derive(Debug, Deserialize)]
pub struct ReviewPage {
    #[serde(default)]
    pub reviews: Vec<Map<String, Value>>,
    pub cursor: Cursor,
}

/// A projected review: one value per entry of [`REVIEW_FIELDS`].
#[derive(Debug, Clone, PartialEq)]
pub struct Review {
    values: Vec<Value>,
}

impl Review {
    pub(crate) fn from_values(values: Vec<Value>) -> Self {
        debug_assert_eq!(values.len(), REVIEW_FIELDS.len());
        Self { values }
    }

    /// Value of a named column, `None` for names outside [`REVIEW_FIELDS`].
    #[cfg(test)]
    pub fn get(&self, field: &str) -> Option<&Value> {
        REVIEW_FIELDS
            .iter()
            .position(|f| *f == field)
            .map(|i| &self.values[i])
    }

    /// Cells for one CSV row. Null becomes an empty cell.
    pub fn csv_row(&self) -> Vec<String> {
        self.values
            .iter()
            .map(|v| match v {
                Value::Null => String::new(),
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect()
    }
}
