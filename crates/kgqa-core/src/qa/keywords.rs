//! Keyword extraction from prior answers

use super::answer::{Answer, INTENT_UNKNOWN_TEXT, NOT_FOUND_TEXT, is_url};

/// Characters that separate keywords besides whitespace
const KEYWORD_SEPARATORS: &[char] = &[',', '，', '.', '。'];

fn is_separator(c: char) -> bool {
    c.is_whitespace() || KEYWORD_SEPARATORS.contains(&c)
}

/// Text an answer contributes to keyword extraction.
///
/// Sentinels contribute their message text. Null and list answers contribute
/// nothing.
fn keyword_source(answer: &Answer) -> Option<&str> {
    match answer {
        Answer::Text(text) => Some(text.as_str()),
        Answer::NotFound => Some(NOT_FOUND_TEXT),
        Answer::IntentUnknown => Some(INTENT_UNKNOWN_TEXT),
        Answer::Null | Answer::List(_) => None,
    }
}

/// Split textual answers into keywords.
///
/// URLs, null and list answers are skipped. Order is preserved and
/// duplicates are kept.
pub fn extract_keywords(answers: &[Answer]) -> Vec<String> {
    answers
        .iter()
        .filter_map(keyword_source)
        .filter(|text| !is_url(text))
        .flat_map(|text| text.split(is_separator))
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Answer {
        Answer::Text(s.to_string())
    }

    #[test]
    fn test_skips_urls_and_splits() {
        let answers = vec![text("http://x.com"), text("隐私 保护, 技术")];
        assert_eq!(extract_keywords(&answers), vec!["隐私", "保护", "技术"]);
    }

    #[test]
    fn test_full_width_punctuation() {
        let answers = vec![text("人工智能，伦理。安全.规范")];
        assert_eq!(
            extract_keywords(&answers),
            vec!["人工智能", "伦理", "安全", "规范"]
        );
    }

    #[test]
    fn test_skips_null_list_and_urls() {
        let answers = vec![
            Answer::Null,
            Answer::List(vec!["a".into()]),
            text("https://secure.example"),
        ];
        assert!(extract_keywords(&answers).is_empty());
    }

    #[test]
    fn test_sentinels_split_like_text() {
        assert_eq!(
            extract_keywords(&[Answer::NotFound]),
            vec!["对不起", "未找到相关信息"]
        );
        assert_eq!(
            extract_keywords(&[Answer::NotFound, Answer::IntentUnknown]),
            vec!["对不起", "未找到相关信息", "我不确定如何回答这个问题"]
        );
    }

    #[test]
    fn test_duplicates_retained_across_answers() {
        let answers = vec![text("a b"), text("b a")];
        assert_eq!(extract_keywords(&answers), vec!["a", "b", "b", "a"]);
    }

    #[test]
    fn test_separator_runs_produce_no_empty_tokens() {
        let answers = vec![text("  ,,，。 a \t\n b .. ")];
        assert_eq!(extract_keywords(&answers), vec!["a", "b"]);
    }

    #[test]
    fn test_uppercase_scheme_is_text() {
        let answers = vec![text("HTTP://X")];
        assert_eq!(extract_keywords(&answers), vec!["HTTP://X"]);
    }
}
