use serde_json::{Map, Value};

use crate::models::{REVIEW_FIELDS, Review, ReviewPage};

const AUTHOR_PREFIX: &str = "author_";

/// Project every raw record of a page onto [`REVIEW_FIELDS`].
pub fn parse_reviews(page: &ReviewPage) -> Vec<Review> {
    page.reviews.iter().map(parse_review).collect()
}

/// Missing keys become null. `author_*` columns fall back to the nested
/// `author` object the live API returns.
pub fn parse_review(raw: &Map<String, Value>) -> Review {
    let author = raw.get("author").and_then(Value::as_object);

    let values = REVIEW_FIELDS
        .iter()
        .map(|field| {
            if let Some(v) = raw.get(*field) {
                return v.clone();
            }
            field
                .strip_prefix(AUTHOR_PREFIX)
                .and_then(|key| author.and_then(|a| a.get(key)))
                .cloned()
                .unwrap_or(Value::Null)
        })
        .collect();

    Review::from_values(values)
}
