use once_cell::sync::Lazy;
use regex::Regex;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{(?P<index>\d+)(?::(?P<default>[^}]*))?\}").expect("placeholder pattern is valid")
});

/// Defines a reusable code snippet entry.
/// （定義可重複使用的程式碼片段項目。）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnippetDefinition {
    pub trigger: String,
    pub body: String,
    pub description: Option<String>,
    pub language: Option<String>,
}

/// Text produced by expanding a snippet, with the caret position in characters.
/// （片段展開後的文字與游標位置。）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnippetExpansion {
    pub text: String,
    pub cursor: usize,
}

impl SnippetDefinition {
    pub fn new(trigger: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            trigger: trigger.into(),
            body: body.into(),
            description: None,
            language: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Replaces placeholders with their defaults and indents continuation lines.
    /// The caret lands on `${0}` when present, otherwise at the end.
    /// （以預設值取代佔位符，並縮排後續行。）
    pub fn expand(&self, indent: &str) -> SnippetExpansion {
        let mut resolved = String::with_capacity(self.body.len());
        let mut cursor_byte = None;
        let mut last = 0;
        for caps in PLACEHOLDER.captures_iter(&self.body) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            resolved.push_str(&self.body[last..whole.start()]);
            if &caps["index"] == "0" && cursor_byte.is_none() {
                cursor_byte = Some(resolved.len());
            }
            if let Some(default) = caps.name("default") {
                resolved.push_str(default.as_str());
            }
            last = whole.end();
        }
        resolved.push_str(&self.body[last..]);

        let cursor_byte = cursor_byte.unwrap_or(resolved.len());
        let newlines_before = resolved[..cursor_byte].matches('\n').count();
        let text = resolved.replace('\n', &format!("\n{indent}"));
        let cursor_byte = cursor_byte + newlines_before * indent.len();
        SnippetExpansion {
            cursor: text[..cursor_byte].chars().count(),
            text,
        }
    }
}

/// Collection of snippet definitions, usually loaded from user configuration.
/// （通常由使用者設定載入的片段定義集合。）
#[derive(Debug, Default)]
pub struct SnippetStore {
    entries: Vec<SnippetDefinition>,
}

impl SnippetStore {
    pub fn new(entries: Vec<SnippetDefinition>) -> Self {
        Self { entries }
    }

    /// Returns the built-in HTML snippets.
    /// （回傳內建的 HTML 片段。）
    pub fn builtin() -> Self {
        Self::new(vec![
            SnippetDefinition::new(
                "html5",
                "<!DOCTYPE html>\n<html lang=\"${1:en}\">\n<head>\n    <meta charset=\"UTF-8\">\n    <title>${2:Document}</title>\n</head>\n<body>\n    ${0}\n</body>\n</html>",
            )
            .with_description("HTML5 document skeleton")
            .with_language("html"),
            SnippetDefinition::new("a", "<a href=\"${1:#}\">${0}</a>")
                .with_description("Hyperlink")
                .with_language("html"),
            SnippetDefinition::new("img", "<img src=\"${1}\" alt=\"${2}\">${0}")
                .with_description("Image with alt text")
                .with_language("html"),
            SnippetDefinition::new("ul", "<ul>\n    <li>${0}</li>\n</ul>")
                .with_description("Unordered list")
                .with_language("html"),
            SnippetDefinition::new(
                "table",
                "<table>\n    <tr>\n        <th>${1:Header}</th>\n    </tr>\n    <tr>\n        <td>${0}</td>\n    </tr>\n</table>",
            )
            .with_description("Table with header row")
            .with_language("html"),
            SnippetDefinition::new("link", "<link rel=\"stylesheet\" href=\"${1:style.css}\">${0}")
                .with_description("Stylesheet link")
                .with_language("html"),
            SnippetDefinition::new("script", "<script src=\"${1:app.js}\"></script>${0}")
                .with_description("External script")
                .with_language("html"),
        ])
    }

    pub fn entries(&self) -> &[SnippetDefinition] {
        &self.entries
    }

    /// Finds a snippet by trigger; language-less snippets match any language.
    pub fn find(&self, trigger: &str, language: Option<&str>) -> Option<&SnippetDefinition> {
        self.entries.iter().find(|entry| {
            entry.trigger == trigger
                && match (entry.language.as_deref(), language) {
                    (None, _) | (_, None) => true,
                    (Some(expected), Some(actual)) => expected.eq_ignore_ascii_case(actual),
                }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_resolves_defaults_and_cursor() {
        let store = SnippetStore::builtin();
        let snippet = store.find("a", Some("html")).unwrap();
        let expansion = snippet.expand("");
        assert_eq!(expansion.text, "<a href=\"#\"></a>");
        assert_eq!(expansion.cursor, 12);
    }

    #[test]
    fn expand_indents_continuation_lines() {
        let store = SnippetStore::builtin();
        let expansion = store.find("ul", None).unwrap().expand("  ");
        assert_eq!(expansion.text, "<ul>\n      <li></li>\n  </ul>");
        assert_eq!(expansion.cursor, 15);
    }

    #[test]
    fn cursor_defaults_to_end_without_final_placeholder() {
        let snippet = SnippetDefinition::new("t", "<td>${1:x}</td>");
        let expansion = snippet.expand("");
        assert_eq!(expansion.text, "<td>x</td>");
        assert_eq!(expansion.cursor, 10);
    }

    #[test]
    fn find_respects_language() {
        let store = SnippetStore::new(vec![
            SnippetDefinition::new("x", "css").with_language("css"),
            SnippetDefinition::new("x", "html").with_language("html"),
        ]);
        assert_eq!(store.find("x", Some("HTML")).unwrap().body, "html");
        assert!(store.find("y", None).is_none());
    }
}
