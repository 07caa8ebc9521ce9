//! Intent classification by surface markers

use serde::{Deserialize, Serialize};

/// Closed set of question intents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    /// "什么是X" / "介绍X": look up a topic's description
    Definition,
    /// "X的图片": look up an image attached to a topic
    Image,
    /// "X的关系": list topics directly related to X
    Relation,
    /// No marker matched
    Unknown,
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Intent::Definition => write!(f, "definition"),
            Intent::Image => write!(f, "image"),
            Intent::Relation => write!(f, "relation"),
            Intent::Unknown => write!(f, "unknown"),
        }
    }
}

/// Markers that select [`Intent::Definition`]
pub const DEFINITION_MARKERS: &[&str] = &["什么是", "介绍"];

/// Markers that select [`Intent::Image`]
pub const IMAGE_MARKERS: &[&str] = &["图片", "图像"];

/// Markers that select [`Intent::Relation`]
pub const RELATION_MARKERS: &[&str] = &["关系"];

/// A single classification rule: any marker present selects the intent
#[derive(Debug, Clone, Copy)]
pub struct IntentRule {
    pub markers: &'static [&'static str],
    pub intent: Intent,
}

impl IntentRule {
    pub fn matches(&self, question: &str) -> bool {
        self.markers.iter().any(|marker| question.contains(marker))
    }
}

/// Rules in priority order. The first matching rule wins, so a question
/// carrying several markers always resolves to the same intent.
pub const INTENT_RULES: &[IntentRule] = &[
    IntentRule {
        markers: DEFINITION_MARKERS,
        intent: Intent::Definition,
    },
    IntentRule {
        markers: IMAGE_MARKERS,
        intent: Intent::Image,
    },
    IntentRule {
        markers: RELATION_MARKERS,
        intent: Intent::Relation,
    },
];

/// Classify a question. Total: falls back to [`Intent::Unknown`].
pub fn classify(question: &str) -> Intent {
    INTENT_RULES
        .iter()
        .find(|rule| rule.matches(question))
        .map(|rule| rule.intent)
        .unwrap_or(Intent::Unknown)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition_markers() {
        assert_eq!(classify("什么是人工智能伦理与安全"), Intent::Definition);
        assert_eq!(classify("介绍一下差分隐私"), Intent::Definition);
    }

    #[test]
    fn test_image_markers() {
        assert_eq!(classify("后门攻击的图片"), Intent::Image);
        assert_eq!(classify("对抗样本的图像"), Intent::Image);
    }

    #[test]
    fn test_relation_marker() {
        assert_eq!(classify("人工智能伦理与安全的关系"), Intent::Relation);
    }

    #[test]
    fn test_unknown() {
        assert_eq!(classify("今天天气怎么样"), Intent::Unknown);
        assert_eq!(classify(""), Intent::Unknown);
    }

    #[test]
    fn test_priority_order() {
        // Definition beats image and relation
        assert_eq!(classify("什么是图片的关系"), Intent::Definition);
        assert_eq!(classify("介绍后门攻击的图片"), Intent::Definition);
        // Image beats relation
        assert_eq!(classify("图片之间的关系"), Intent::Image);
    }

    #[test]
    fn test_rule_table_order_matches_enum_priority() {
        let order: Vec<Intent> = INTENT_RULES.iter().map(|r| r.intent).collect();
        assert_eq!(order, vec![Intent::Definition, Intent::Image, Intent::Relation]);
    }

    #[test]
    fn test_display() {
        assert_eq!(Intent::Definition.to_string(), "definition");
        assert_eq!(Intent::Unknown.to_string(), "unknown");
    }
}
