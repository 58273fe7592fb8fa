use std::ops::Range;

use crate::attributes::{parse_attributes, Attribute};

/// Lexical kind of a tag token.
/// （標籤記號的詞法種類。）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
    Opening,
    Closing,
    SelfClosing,
}

impl TagKind {
    pub fn label(self) -> &'static str {
        match self {
            TagKind::Opening => "open",
            TagKind::Closing => "close",
            TagKind::SelfClosing => "self-closing",
        }
    }
}

/// A `<...>` construct recognised in the document text.
///
/// Offsets are character offsets into the scanned snapshot and the span is
/// half-open (`start_offset..end_offset`). Tokens are rebuilt on every scan
/// and never patched in place.
/// （於文件中辨識出的標籤記號，位移以字元計算。）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagToken {
    pub start_offset: usize,
    pub end_offset: usize,
    pub name: String,
    pub is_closing: bool,
    pub is_self_closing: bool,
    pub raw_text: String,
}

impl TagToken {
    pub fn kind(&self) -> TagKind {
        if self.is_closing {
            TagKind::Closing
        } else if self.is_self_closing {
            TagKind::SelfClosing
        } else {
            TagKind::Opening
        }
    }

    pub fn is_opening(&self) -> bool {
        self.kind() == TagKind::Opening
    }

    pub fn span(&self) -> Range<usize> {
        self.start_offset..self.end_offset
    }

    pub fn len(&self) -> usize {
        self.end_offset.saturating_sub(self.start_offset)
    }

    /// Whether the cursor offset touches this token. The end offset is
    /// inclusive so a caret placed right after `>` still resolves here.
    pub fn contains(&self, offset: usize) -> bool {
        self.start_offset <= offset && offset <= self.end_offset
    }

    /// Best-effort attribute pass over the raw tag text.
    /// （對原始標籤文字進行盡力而為的屬性解析。）
    pub fn attributes(&self) -> Vec<Attribute> {
        if self.is_closing {
            return Vec::new();
        }
        parse_attributes(self.attribute_source())
    }

    /// Looks up an attribute by (case-insensitive) name.
    pub fn attribute(&self, name: &str) -> Option<Attribute> {
        self.attributes()
            .into_iter()
            .find(|attr| attr.name.eq_ignore_ascii_case(name))
    }

    fn attribute_source(&self) -> &str {
        // `<` + optional `/` + name; names are ASCII so byte length matches.
        let head = 1 + usize::from(self.is_closing) + self.name.len();
        let body = self.raw_text.get(head..).unwrap_or("");
        let body = body.strip_suffix('>').unwrap_or(body);
        body.strip_suffix('/').unwrap_or(body)
    }
}
