use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::matcher::{self, MatchOutcome};
use crate::token::TagToken;

static TAG_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<(?P<close>/)?(?P<name>[A-Za-z][A-Za-z0-9:_-]*)(?P<attrs>\s[^<>]*?)?(?P<slash>/)?>")
        .expect("tag pattern is valid")
});

/// Violations of the token-list invariants, detected after a scan.
/// （掃描後檢查到的記號清單不變量違反。）
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IndexError {
    #[error("token {index} has an empty or inverted span {start}..{end}")]
    EmptySpan { index: usize, start: usize, end: usize },
    #[error("token {index} starts at {start}, before the previous token ends at {previous_end}")]
    Unordered {
        index: usize,
        start: usize,
        previous_end: usize,
    },
    #[error("token {index} raw text is not delimited by '<' and '>'")]
    Undelimited { index: usize },
}

/// Scans `text` for tags in a single pass.
///
/// Malformed constructs (a lone `<`, a stray `>`, comments, doctypes) are not
/// emitted. The result is ordered by `start_offset`.
/// （單次掃描文字並產生依位置排序的標籤記號。）
pub fn tokenize(text: &str) -> Vec<TagToken> {
    let mut tokens = Vec::new();
    let mut byte_cursor = 0;
    let mut char_cursor = 0;

    for caps in TAG_PATTERN.captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        char_cursor += text[byte_cursor..whole.start()].chars().count();
        let start_offset = char_cursor;
        let raw_text = whole.as_str();
        char_cursor += raw_text.chars().count();
        byte_cursor = whole.end();

        let is_closing = caps.name("close").is_some();
        let name = caps
            .name("name")
            .map(|m| m.as_str().to_ascii_lowercase())
            .unwrap_or_default();
        tokens.push(TagToken {
            start_offset,
            end_offset: char_cursor,
            name,
            is_closing,
            is_self_closing: !is_closing && caps.name("slash").is_some(),
            raw_text: raw_text.to_string(),
        });
    }

    tokens
}

/// Ordered token list for one document snapshot, shared by every feature
/// that needs tag information (matching, auditing, navigation).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagIndex {
    tokens: Vec<TagToken>,
}

impl TagIndex {
    /// Tokenizes the snapshot and wraps the result.
    pub fn build(text: &str) -> Self {
        Self {
            tokens: tokenize(text),
        }
    }

    pub fn from_tokens(tokens: Vec<TagToken>) -> Self {
        Self { tokens }
    }

    pub fn tokens(&self) -> &[TagToken] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TagToken> {
        self.tokens.get(index)
    }

    /// Index of the token under `offset`; the token ending at `offset` wins
    /// over one starting there.
    pub fn token_at(&self, offset: usize) -> Option<usize> {
        matcher::token_at(&self.tokens, offset)
    }

    /// Resolves the tag under the cursor and its partner.
    pub fn match_at(&self, offset: usize) -> MatchOutcome<'_> {
        matcher::match_at(&self.tokens, offset)
    }

    /// Partner index of the token at `index`, if it has one.
    pub fn partner_of(&self, index: usize) -> Option<usize> {
        matcher::find_partner(&self.tokens, index)
    }

    /// Iterates tokens with the given (lowercase) name.
    pub fn named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a TagToken> + 'a {
        self.tokens.iter().filter(move |token| token.name == name)
    }

    /// Checks ordering and span invariants of the token list.
    pub fn validate(&self) -> Result<(), IndexError> {
        let mut previous_end = 0;
        for (index, token) in self.tokens.iter().enumerate() {
            if token.start_offset >= token.end_offset {
                return Err(IndexError::EmptySpan {
                    index,
                    start: token.start_offset,
                    end: token.end_offset,
                });
            }
            if index > 0 && token.start_offset < previous_end {
                return Err(IndexError::Unordered {
                    index,
                    start: token.start_offset,
                    previous_end,
                });
            }
            if !(token.raw_text.starts_with('<') && token.raw_text.ends_with('>')) {
                return Err(IndexError::Undelimited { index });
            }
            previous_end = token.end_offset;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(text: &str) -> Vec<(usize, usize, String, bool, bool)> {
        tokenize(text)
            .into_iter()
            .map(|t| (t.start_offset, t.end_offset, t.name, t.is_closing, t.is_self_closing))
            .collect()
    }

    #[test]
    fn recognises_opening_closing_and_self_closing() {
        assert_eq!(
            summary(r#"<div class="x"><br/><IMG src=a /></div>"#),
            vec![
                (0, 15, "div".to_string(), false, false),
                (15, 20, "br".to_string(), false, true),
                (20, 33, "img".to_string(), false, true),
                (33, 39, "div".to_string(), true, false),
            ]
        );
    }

    #[test]
    fn skips_malformed_fragments() {
        assert!(tokenize("a < b and c > d").is_empty());
        assert!(tokenize("<!-- note --><!DOCTYPE html>").is_empty());
        let tokens = tokenize("<p unclosed <b>x</b>");
        let names: Vec<_> = tokens.iter().map(|t| t.raw_text.as_str()).collect();
        assert_eq!(names, vec!["<b>", "</b>"]);
    }

    #[test]
    fn offsets_are_counted_in_characters() {
        let tokens = tokenize("héllo <em>wörld</em>");
        assert_eq!(tokens[0].span(), 6..10);
        assert_eq!(tokens[1].span(), 15..20);
    }

    #[test]
    fn closing_tag_with_slash_is_not_self_closing() {
        let tokens = tokenize("</p/>");
        assert_eq!(tokens.len(), 1);
        assert!(tokens[0].is_closing);
        assert!(!tokens[0].is_self_closing);
    }

    #[test]
    fn validate_accepts_scanned_tokens_and_rejects_overlap() {
        let index = TagIndex::build("<ul><li>A</li></ul>");
        assert_eq!(index.validate(), Ok(()));

        let mut tokens = index.tokens().to_vec();
        tokens.swap(0, 1);
        let broken = TagIndex::from_tokens(tokens);
        assert!(matches!(
            broken.validate(),
            Err(IndexError::Unordered { index: 1, .. })
        ));
    }
}
