use once_cell::sync::Lazy;
use regex::Regex;

// Quotes may be left unterminated; the value then runs to the end of the tag.
static ATTRIBUTE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?P<name>[^\s"'<>/=]+)(?:\s*=\s*(?:"(?P<dq>[^"]*)"?|'(?P<sq>[^']*)'?|(?P<bare>[^\s"'>]+)))?"#,
    )
    .expect("attribute pattern is valid")
});

/// Single `name=value` pair found inside a tag.
/// （標籤內的單一屬性。）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
    /// `false` for bare attributes such as `disabled`.
    pub has_value: bool,
}

/// Parses attributes from the text between the tag name and the closing `>`.
/// Missing values default to an empty string; malformed fragments are skipped.
pub fn parse_attributes(source: &str) -> Vec<Attribute> {
    ATTRIBUTE_PATTERN
        .captures_iter(source)
        .filter_map(|caps| {
            let name = caps.name("name")?.as_str().to_ascii_lowercase();
            let value = caps
                .name("dq")
                .or_else(|| caps.name("sq"))
                .or_else(|| caps.name("bare"));
            Some(Attribute {
                name,
                value: value.map(|m| m.as_str().to_string()).unwrap_or_default(),
                has_value: value.is_some(),
            })
        })
        .collect()
}
