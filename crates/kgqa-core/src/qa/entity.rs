//! Entity extraction and normalization

use super::intent::{DEFINITION_MARKERS, Intent};

/// Suffix that ends the entity in an image question ("X的图片")
pub const IMAGE_SUFFIX: &str = "的图片";

/// Suffix that ends the entity in a relation question ("X的关系")
pub const RELATION_SUFFIX: &str = "的关系";

/// Strip everything outside the word/whitespace classes, then trim.
///
/// Word characters are Unicode alphanumerics plus `_`, so CJK names survive.
/// Internal whitespace runs are kept as-is.
pub fn normalize(raw: &str) -> String {
    let kept: String = raw
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect();
    kept.trim().to_string()
}

/// Slice the entity mention out of a question for the given intent.
///
/// Returns `None` for [`Intent::Unknown`]. The result may be empty when the
/// question held nothing but markers and punctuation.
pub fn extract_entity(intent: Intent, question: &str) -> Option<String> {
    let raw = match intent {
        Intent::Definition => DEFINITION_MARKERS
            .iter()
            .fold(question.to_string(), |acc, marker| acc.replace(marker, "")),
        Intent::Image => prefix_before(question, IMAGE_SUFFIX).to_string(),
        Intent::Relation => prefix_before(question, RELATION_SUFFIX).to_string(),
        Intent::Unknown => return None,
    };

    Some(normalize(raw.trim()))
}

fn prefix_before<'a>(text: &'a str, separator: &str) -> &'a str {
    text.split(separator).next().unwrap_or(text)
}
