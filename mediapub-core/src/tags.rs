//! Free-text tag validation.
//!
//! Operators type tags as one comma-separated line, e.g. `"frog, happy cat"`.
//! [`parse_tags`] applies the checks in a fixed order and reports the first
//! one that fails.

use std::collections::HashSet;

use crate::error::TagError;

/// Minimum number of distinct tags per record.
pub const MIN_TAGS: usize = 2;
/// Minimum length of a single tag.
pub const MIN_TAG_LEN: usize = 2;

/// Validate `text` and return its tags, trimmed and lower-cased, in input order.
pub fn parse_tags(text: &str) -> Result<Vec<String>, TagError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(TagError::Empty);
    }
    if !text
        .chars()
        .all(|c| c.is_alphabetic() || c.is_whitespace() || c == ',')
    {
        return Err(TagError::InvalidCharacters);
    }
    if !text.is_ascii() {
        return Err(TagError::NonAscii);
    }

    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if compact == "," || compact.replace(',', "").is_empty() {
        return Err(TagError::OnlySeparators);
    }
    if compact.starts_with(',')
        || compact.ends_with(',')
        || compact.split(',').any(str::is_empty)
    {
        return Err(TagError::MisplacedComma);
    }

    let tags: Vec<String> = text
        .split(',')
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();
    let unique: HashSet<&str> = tags.iter().map(String::as_str).collect();
    if tags.len() < MIN_TAGS
        || tags.iter().any(|t| t.len() < MIN_TAG_LEN)
        || unique.len() != tags.len()
    {
        return Err(TagError::TooFewOrDuplicate);
    }
    Ok(tags)
}
