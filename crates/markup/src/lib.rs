//! HTML markup scanning for HtmlPad editors.
//!
//! A single tokenizer pass produces the ordered tag list for a document
//! snapshot. The list is wrapped in a [`TagIndex`] that answers cursor
//! queries (tag under the caret and its partner) and feeds the markup audit
//! (heading outline, image alt text, ARIA attributes, unbalanced tags).

pub mod attributes;
pub mod audit;
pub mod matcher;
pub mod token;
pub mod tokenizer;

pub use attributes::{parse_attributes, Attribute};
pub use audit::{audit, is_void_element, Finding, FindingKind, Severity, VOID_ELEMENTS};
pub use matcher::{MatchOutcome, PairSide, TagPair};
pub use token::{TagKind, TagToken};
pub use tokenizer::{tokenize, IndexError, TagIndex};
