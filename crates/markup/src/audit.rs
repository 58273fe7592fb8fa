//! Accessibility and structure checks that reuse the shared token list
//! instead of re-scanning the document text.

use crate::matcher::find_partner;
use crate::tokenizer::TagIndex;
use crate::token::TagToken;

/// HTML elements that never take a closing tag.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

const ARIA_ROLES: &[&str] = &[
    "alert", "alertdialog", "application", "article", "banner", "button", "cell", "checkbox",
    "columnheader", "combobox", "complementary", "contentinfo", "definition", "dialog",
    "directory", "document", "feed", "figure", "form", "grid", "gridcell", "group", "heading",
    "img", "link", "list", "listbox", "listitem", "log", "main", "marquee", "math", "menu",
    "menubar", "menuitem", "menuitemcheckbox", "menuitemradio", "meter", "navigation", "none",
    "note", "option", "presentation", "progressbar", "radio", "radiogroup", "region", "row",
    "rowgroup", "rowheader", "scrollbar", "search", "searchbox", "separator", "slider",
    "spinbutton", "status", "switch", "tab", "table", "tablist", "tabpanel", "term", "textbox",
    "timer", "toolbar", "tooltip", "tree", "treegrid", "treeitem",
];

pub fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

/// Severity attached to an audit finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn label(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

/// Category of an audit finding.
/// （稽核結果的類別。）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FindingKind {
    FirstHeadingNotH1 { level: u8 },
    SkippedHeadingLevel { from: u8, to: u8 },
    MultipleH1,
    MissingAlt,
    UnknownRole(String),
    EmptyAriaAttribute(String),
    UnclosedTag(String),
    StrayClosingTag(String),
}

impl FindingKind {
    pub fn severity(&self) -> Severity {
        match self {
            FindingKind::MissingAlt => Severity::Error,
            FindingKind::MultipleH1 | FindingKind::UnclosedTag(_) => Severity::Info,
            _ => Severity::Warning,
        }
    }

    pub fn message(&self) -> String {
        match self {
            FindingKind::FirstHeadingNotH1 { level } => {
                format!("first heading is h{level}, expected h1")
            }
            FindingKind::SkippedHeadingLevel { from, to } => {
                format!("heading level jumps from h{from} to h{to}")
            }
            FindingKind::MultipleH1 => "document contains more than one h1".to_string(),
            FindingKind::MissingAlt => "img element has no alt attribute".to_string(),
            FindingKind::UnknownRole(role) => format!("unknown ARIA role \"{role}\""),
            FindingKind::EmptyAriaAttribute(name) => format!("attribute {name} is empty"),
            FindingKind::UnclosedTag(name) => format!("<{name}> is never closed"),
            FindingKind::StrayClosingTag(name) => format!("</{name}> has no opening tag"),
        }
    }
}

/// A single problem found by the audit, anchored at a character offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub kind: FindingKind,
    pub offset: usize,
}

impl Finding {
    fn new(kind: FindingKind, token: &TagToken) -> Self {
        Self {
            kind,
            offset: token.start_offset,
        }
    }

    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }

    pub fn message(&self) -> String {
        self.kind.message()
    }
}

/// Runs every check and returns findings ordered by offset.
pub fn audit(index: &TagIndex) -> Vec<Finding> {
    let mut findings = Vec::new();
    findings.extend(check_headings(index));
    findings.extend(check_images(index));
    findings.extend(check_aria(index));
    findings.extend(check_balance(index));
    findings.sort_by_key(|finding| finding.offset);
    findings
}

fn heading_level(token: &TagToken) -> Option<u8> {
    let digit = token.name.strip_prefix('h')?;
    match digit.parse::<u8>() {
        Ok(level @ 1..=6) => Some(level),
        _ => None,
    }
}

/// Heading outline checks (h1 first, no skipped levels, single h1).
pub fn check_headings(index: &TagIndex) -> Vec<Finding> {
    let mut findings = Vec::new();
    let mut previous: Option<u8> = None;
    let mut h1_count = 0;

    for token in index.tokens().iter().filter(|token| token.is_opening()) {
        let Some(level) = heading_level(token) else {
            continue;
        };
        if level == 1 {
            h1_count += 1;
            if h1_count == 2 {
                findings.push(Finding::new(FindingKind::MultipleH1, token));
            }
        }
        match previous {
            None if level != 1 => {
                findings.push(Finding::new(FindingKind::FirstHeadingNotH1 { level }, token));
            }
            Some(from) if level > from + 1 => {
                findings.push(Finding::new(
                    FindingKind::SkippedHeadingLevel { from, to: level },
                    token,
                ));
            }
            _ => {}
        }
        previous = Some(level);
    }
    findings
}

/// `<img>` elements must carry an `alt` attribute (an empty value is allowed).
pub fn check_images(index: &TagIndex) -> Vec<Finding> {
    index
        .named("img")
        .filter(|token| !token.is_closing && token.attribute("alt").is_none())
        .map(|token| Finding::new(FindingKind::MissingAlt, token))
        .collect()
}

/// Role values must be known ARIA roles; `aria-*` attributes must not be empty.
pub fn check_aria(index: &TagIndex) -> Vec<Finding> {
    let mut findings = Vec::new();
    for token in index.tokens().iter().filter(|token| !token.is_closing) {
        for attr in token.attributes() {
            if attr.name == "role" {
                for role in attr.value.split_whitespace() {
                    let role = role.to_ascii_lowercase();
                    if !ARIA_ROLES.contains(&role.as_str()) {
                        findings.push(Finding::new(FindingKind::UnknownRole(role), token));
                    }
                }
            } else if attr.name.starts_with("aria-") && attr.value.trim().is_empty() {
                findings.push(Finding::new(
                    FindingKind::EmptyAriaAttribute(attr.name.clone()),
                    token,
                ));
            }
        }
    }
    findings
}

/// Opening tags without a partner (void elements excepted) and stray closers.
pub fn check_balance(index: &TagIndex) -> Vec<Finding> {
    let tokens = index.tokens();
    let mut findings = Vec::new();
    for (position, token) in tokens.iter().enumerate() {
        if token.is_self_closing || is_void_element(&token.name) {
            continue;
        }
        if find_partner(tokens, position).is_some() {
            continue;
        }
        let kind = if token.is_closing {
            FindingKind::StrayClosingTag(token.name.clone())
        } else {
            FindingKind::UnclosedTag(token.name.clone())
        };
        findings.push(Finding::new(kind, token));
    }
    findings
}
