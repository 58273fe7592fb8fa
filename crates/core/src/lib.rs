pub mod bookmarks;
pub mod debounce;
pub mod document;
pub mod fold_state;
pub mod folding;
pub mod source;
pub mod text;

pub use bookmarks::{BookmarkManager, BookmarkSet};
pub use debounce::RescanDebouncer;
pub use document::{
    DocumentError, DocumentOptions, HtmlDocument, RescanReport, DEFAULT_RESCAN_DELAY,
};
pub use fold_state::{FoldChange, FoldTracker};
pub use folding::{detect_regions, is_fold_start, FoldOptions, FoldRegion, FoldTable};
pub use source::{decode, read_source, DecodedSource, SourceError};
pub use text::{measure_indent, IndentPolicy, LineIndex};
