use std::collections::BTreeMap;

use htmlpad_markup::{is_void_element, tokenize};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::text::{is_blank, measure_indent, split_lines, IndentPolicy};

// Block keywords that open an indented suite when the line ends in ':'.
static KEYWORD_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:async\s+def|def|class|if|elif|else|for|while|try|except|finally|with|match|case)\b.*:$",
    )
    .expect("keyword block pattern is valid")
});

/// 描述可折疊區塊。 / Represents a foldable region of lines.
///
/// `start_line` is the opener that stays visible; lines
/// `start_line + 1..=end_line` are hidden when the region is collapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FoldRegion {
    pub start_line: usize,
    pub end_line: usize,
    /// 起始行的縮排寬度。 / Indentation of the opener line.
    pub indent: usize,
}

impl FoldRegion {
    /// 隱藏的行數。 / Number of lines hidden when collapsed.
    pub fn hidden_len(&self) -> usize {
        self.end_line - self.start_line
    }

    /// 檢查行是否會被隱藏。 / Whether `line` is hidden by this region when collapsed.
    pub fn hides(&self, line: usize) -> bool {
        line > self.start_line && line <= self.end_line
    }

    /// 區段是否與行範圍相交（含起始行）。 / Whether the region (opener included) touches `first..=last`.
    pub fn intersects(&self, first: usize, last: usize) -> bool {
        self.start_line <= last && first <= self.end_line
    }
}

/// 可折疊區段表，以起始行為鍵。 / Region table keyed by opener line.
pub type FoldTable = BTreeMap<usize, FoldRegion>;

/// 折疊偵測選項。 / Options for fold detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FoldOptions {
    pub indent: IndentPolicy,
    /// 每一層縮排的寬度。 / Width of one indentation level, used by `fold_at_level`.
    pub indent_unit: usize,
    /// 是否將 HTML 開始標籤行視為可折疊。 / Treat lines opening an HTML element as fold starts.
    pub markup_openers: bool,
}

impl Default for FoldOptions {
    fn default() -> Self {
        Self {
            indent: IndentPolicy::Uniform,
            indent_unit: 4,
            markup_openers: true,
        }
    }
}

/// 判斷一行是否為折疊起點。 / Checks whether a line opens a foldable block.
pub fn is_fold_start(line: &str, options: &FoldOptions) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return false;
    }
    if trimmed.ends_with('{') {
        return true;
    }
    if trimmed.starts_with("/*") && !trimmed.contains("*/") {
        return true;
    }
    if trimmed.starts_with("<!--") && !trimmed.contains("-->") {
        return true;
    }
    if KEYWORD_BLOCK.is_match(trimmed) {
        return true;
    }
    options.markup_openers && opens_element(trimmed)
}

// A line starting with a non-void opening tag whose closer is not on the same line.
fn opens_element(trimmed: &str) -> bool {
    let tokens = tokenize(trimmed);
    let Some(first) = tokens.first() else {
        return false;
    };
    if first.start_offset != 0 || !first.is_opening() || is_void_element(&first.name) {
        return false;
    }
    let mut depth = 0usize;
    for token in tokens.iter().skip(1).filter(|t| t.name == first.name) {
        if token.is_opening() {
            depth += 1;
        } else if token.is_closing {
            if depth == 0 {
                return false;
            }
            depth -= 1;
        }
    }
    true
}

/// 計算整份文件的折疊區段。 / Computes the region table for a whole document.
///
/// A region runs from an opener to the line before the first following
/// non-blank line indented no deeper than the opener, or to the last line.
/// Regions that would hide nothing are dropped.
pub fn detect_regions(text: &str, options: &FoldOptions) -> FoldTable {
    let lines = split_lines(text);
    let indents: Vec<Option<usize>> = lines
        .iter()
        .map(|line| (!is_blank(line)).then(|| measure_indent(line, options.indent)))
        .collect();

    let mut table = FoldTable::new();
    for (start_line, line) in lines.iter().enumerate() {
        if !is_fold_start(line, options) {
            continue;
        }
        let Some(indent) = indents[start_line] else {
            continue;
        };
        let end_line = indents[start_line + 1..]
            .iter()
            .position(|candidate| matches!(candidate, Some(level) if *level <= indent))
            .map(|distance| start_line + distance)
            .unwrap_or(lines.len() - 1);
        if end_line > start_line {
            table.insert(
                start_line,
                FoldRegion {
                    start_line,
                    end_line,
                    indent,
                },
            );
        }
    }
    table
}
