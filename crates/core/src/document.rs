//! Per-tab document state: the text snapshot plus every index derived from it.
//!
//! Edits update the text immediately and restart the rescan debouncer; the
//! tag index and fold table are rebuilt wholesale when the debouncer fires
//! (or on `rescan_now`). Cursor queries answer from the last completed scan.

use std::ops::Range;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use htmlpad_markup::{audit, Finding, IndexError, MatchOutcome, TagIndex};
use thiserror::Error;
use tracing::{debug, error, trace, warn, Span};

use crate::debounce::RescanDebouncer;
use crate::fold_state::{FoldChange, FoldTracker};
use crate::folding::{detect_regions, FoldOptions, FoldRegion, FoldTable};
use crate::source::{read_source, SourceError};
use crate::text::{char_to_byte, LineIndex};

/// 預設的重新掃描延遲。 / Default delay between the last edit and a rescan.
pub const DEFAULT_RESCAN_DELAY: Duration = Duration::from_millis(300);

/// 文件操作錯誤。 / Errors raised by document operations.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("offset {offset} is out of bounds for document of length {len}")]
    OffsetOutOfBounds { offset: usize, len: usize },
    #[error("edit range {start}..{end} is inverted")]
    InvertedRange { start: usize, end: usize },
    #[error("tag index invariant violated: {0}")]
    TagIndex(#[from] IndexError),
    #[error("fold region {start_line}..={end_line} is invalid for {line_count} lines")]
    FoldRegion {
        start_line: usize,
        end_line: usize,
        line_count: usize,
    },
    #[error(transparent)]
    Source(#[from] SourceError),
}

/// 文件層級設定。 / Per-document configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentOptions {
    pub folding: FoldOptions,
    pub rescan_delay: Duration,
}

impl Default for DocumentOptions {
    fn default() -> Self {
        Self {
            folding: FoldOptions::default(),
            rescan_delay: DEFAULT_RESCAN_DELAY,
        }
    }
}

/// 重新掃描的摘要。 / Summary of a completed rescan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RescanReport {
    pub tokens: usize,
    pub regions: usize,
    pub line_count: usize,
    /// Collapsed regions dropped because they no longer match the new table.
    pub dropped_folds: Vec<FoldChange>,
}

/// 單一分頁的 HTML 文件。 / An open HTML document (one per editor tab).
#[derive(Debug)]
pub struct HtmlDocument {
    path: Option<PathBuf>,
    encoding: &'static str,
    text: String,
    lines: LineIndex,
    tags: TagIndex,
    folds: FoldTracker,
    options: DocumentOptions,
    debouncer: RescanDebouncer,
    revision: u64,
    scanned_revision: u64,
    span: Span,
}

impl HtmlDocument {
    /// 建立未命名文件並立即掃描。 / Creates an untitled document and scans it immediately.
    pub fn new(text: impl Into<String>, options: DocumentOptions) -> Self {
        Self::with_span(text, options, tracing::debug_span!("document", path = "untitled"))
    }

    /// 以呼叫端提供的日誌範圍建立文件。 / Creates a document logging under the caller's span.
    pub fn with_span(text: impl Into<String>, options: DocumentOptions, span: Span) -> Self {
        let text = text.into();
        let mut document = Self {
            path: None,
            encoding: "UTF-8",
            lines: LineIndex::build(&text),
            text,
            tags: TagIndex::default(),
            folds: FoldTracker::new(options.folding.indent_unit),
            options,
            debouncer: RescanDebouncer::new(options.rescan_delay),
            revision: 0,
            scanned_revision: 0,
            span,
        };
        if let Err(err) = document.rescan_now() {
            warn!(parent: &document.span, %err, "initial scan failed");
        }
        document
    }

    /// 從磁碟開啟文件。 / Opens and decodes a document from disk.
    pub fn open(path: impl AsRef<Path>, options: DocumentOptions) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        let decoded = read_source(path)?;
        let span = tracing::debug_span!("document", path = %path.display());
        let mut document = Self::with_span(decoded.text, options, span);
        document.path = Some(path.to_path_buf());
        document.encoding = decoded.encoding;
        debug!(parent: &document.span, encoding = decoded.encoding, "opened");
        Ok(document)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn set_path(&mut self, path: Option<PathBuf>) {
        self.path = path;
    }

    pub fn encoding(&self) -> &'static str {
        self.encoding
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn options(&self) -> &DocumentOptions {
        &self.options
    }

    pub fn line_count(&self) -> usize {
        self.lines.line_count()
    }

    pub fn char_len(&self) -> usize {
        self.lines.total_chars()
    }

    pub fn line_index(&self) -> &LineIndex {
        &self.lines
    }

    pub fn line_of_offset(&self, offset: usize) -> usize {
        self.lines.line_of(offset)
    }

    pub fn tags(&self) -> &TagIndex {
        &self.tags
    }

    pub fn folds(&self) -> &FoldTracker {
        &self.folds
    }

    pub fn regions(&self) -> &FoldTable {
        self.folds.regions()
    }

    /// 索引是否反映目前文字。 / Whether the indexes reflect the current text.
    pub fn is_index_current(&self) -> bool {
        self.revision == self.scanned_revision
    }

    pub fn rescan_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// 更新設定，下一次掃描時生效。 / Applies new options; they take effect on the next scan.
    pub fn set_options(&mut self, options: DocumentOptions, now: Instant) {
        self.options = options;
        self.folds.set_indent_unit(options.folding.indent_unit);
        self.debouncer.set_delay(options.rescan_delay);
        self.debouncer.schedule(now);
    }

    /// 取代整份文字。 / Replaces the whole text snapshot.
    pub fn set_text(&mut self, text: impl Into<String>, now: Instant) -> Vec<FoldChange> {
        self.text = text.into();
        self.lines = LineIndex::build(&self.text);
        self.revision += 1;
        self.debouncer.schedule(now);
        let dropped = self.folds.invalidate_lines(0, usize::MAX);
        debug!(parent: &self.span, dropped = dropped.len(), "text replaced");
        dropped
    }

    /// 以字元範圍套用編輯。 / Replaces the characters in `range` with `replacement`.
    ///
    /// Collapsed regions touching the edited lines are dropped at once and
    /// returned so the renderer can show their lines again. When the line
    /// count changes, every fold from the first edited line down is dropped.
    pub fn apply_edit(
        &mut self,
        range: Range<usize>,
        replacement: &str,
        now: Instant,
    ) -> Result<Vec<FoldChange>, DocumentError> {
        let len = self.char_len();
        if range.start > range.end {
            return Err(DocumentError::InvertedRange {
                start: range.start,
                end: range.end,
            });
        }
        if range.end > len {
            return Err(DocumentError::OffsetOutOfBounds {
                offset: range.end,
                len,
            });
        }

        let first_line = self.lines.line_of(range.start);
        let last_line = self.lines.line_of(range.end);
        let start_byte = char_to_byte(&self.text, range.start).ok_or(
            DocumentError::OffsetOutOfBounds {
                offset: range.start,
                len,
            },
        )?;
        let end_byte = char_to_byte(&self.text, range.end).ok_or(
            DocumentError::OffsetOutOfBounds {
                offset: range.end,
                len,
            },
        )?;

        let old_line_count = self.lines.line_count();
        self.text.replace_range(start_byte..end_byte, replacement);
        self.lines = LineIndex::build(&self.text);
        self.revision += 1;
        self.debouncer.schedule(now);

        // Lines below a line-count change have shifted; their folds are stale.
        let last_line = if self.lines.line_count() == old_line_count {
            last_line
        } else {
            usize::MAX
        };
        let dropped = self.folds.invalidate_lines(first_line, last_line);
        trace!(
            parent: &self.span,
            start = range.start,
            end = range.end,
            inserted = replacement.len(),
            dropped = dropped.len(),
            "edit applied"
        );
        Ok(dropped)
    }

    /// 延遲期滿時執行掃描。 / Runs the rescan if the debounce deadline has passed.
    pub fn poll_rescan(&mut self, now: Instant) -> Option<Result<RescanReport, DocumentError>> {
        if self.debouncer.poll(now) {
            Some(self.rescan_now())
        } else {
            None
        }
    }

    /// 立即重建標籤索引與折疊表。 / Rebuilds the tag index and fold table right away.
    ///
    /// If the new indexes violate their invariants the previous ones are kept
    /// and the error is returned; editing is never interrupted.
    pub fn rescan_now(&mut self) -> Result<RescanReport, DocumentError> {
        let _entered = self.span.enter();
        self.debouncer.cancel();

        let tags = TagIndex::build(&self.text);
        if let Err(err) = tags.validate() {
            error!(%err, "tag index rejected");
            return Err(err.into());
        }

        let line_count = self.lines.line_count();
        let regions = detect_regions(&self.text, &self.options.folding);
        if let Some(bad) = regions
            .values()
            .find(|region| region.end_line < region.start_line || region.end_line >= line_count)
        {
            error!(
                start_line = bad.start_line,
                end_line = bad.end_line,
                line_count,
                "fold table rejected"
            );
            return Err(DocumentError::FoldRegion {
                start_line: bad.start_line,
                end_line: bad.end_line,
                line_count,
            });
        }

        let region_count = regions.len();
        let dropped_folds = self.folds.replace_regions(regions);
        self.tags = tags;
        self.scanned_revision = self.revision;

        debug!(
            tokens = self.tags.len(),
            regions = region_count,
            dropped = dropped_folds.len(),
            "rescanned"
        );
        Ok(RescanReport {
            tokens: self.tags.len(),
            regions: region_count,
            line_count,
            dropped_folds,
        })
    }

    /// 查詢游標位置的標籤配對。 / Resolves the tag under the cursor and its partner.
    pub fn match_at(&self, cursor: usize) -> MatchOutcome<'_> {
        let outcome = self.tags.match_at(cursor);
        trace!(parent: &self.span, cursor, ?outcome, "tag match");
        outcome
    }

    /// 需要強調顯示的字元範圍。 / Character ranges to highlight for the cursor.
    pub fn highlight_ranges(&self, cursor: usize) -> Vec<Range<usize>> {
        self.match_at(cursor).highlight_ranges()
    }

    /// 對目前的標籤索引執行稽核。 / Audits the current tag index.
    pub fn audit(&self) -> Vec<Finding> {
        audit(&self.tags)
    }

    pub fn region_at(&self, line: usize) -> Option<&FoldRegion> {
        self.folds.region(line)
    }

    /// 折疊前確保區段表為最新。 / Rescans first if edits are pending.
    ///
    /// Returns `false` when the rescan fails; folding is then refused.
    fn sync_regions(&mut self) -> bool {
        self.is_index_current() || self.rescan_now().is_ok()
    }

    pub fn fold(&mut self, line: usize) -> Option<FoldChange> {
        if !self.sync_regions() {
            return None;
        }
        let change = self.folds.fold(line);
        debug!(parent: &self.span, line, applied = change.is_some(), "fold");
        change
    }

    pub fn unfold(&mut self, line: usize) -> Option<FoldChange> {
        let change = self.folds.unfold(line);
        debug!(parent: &self.span, line, applied = change.is_some(), "unfold");
        change
    }

    pub fn toggle_fold(&mut self, line: usize) -> Option<FoldChange> {
        if self.folds.is_folded(line) {
            self.unfold(line)
        } else {
            self.fold(line)
        }
    }

    pub fn fold_all(&mut self) -> usize {
        if !self.sync_regions() {
            return 0;
        }
        let count = self.folds.fold_all();
        debug!(parent: &self.span, count, "fold all");
        count
    }

    pub fn unfold_all(&mut self) -> usize {
        let count = self.folds.unfold_all();
        debug!(parent: &self.span, count, "unfold all");
        count
    }

    pub fn fold_at_level(&mut self, level: usize) -> usize {
        if !self.sync_regions() {
            return 0;
        }
        let count = self.folds.fold_at_level(level);
        debug!(parent: &self.span, level, count, "fold at level");
        count
    }

    pub fn is_line_visible(&self, line: usize) -> bool {
        self.folds.is_line_visible(line)
    }

    pub fn visible_lines(&self) -> Vec<usize> {
        self.folds.visible_lines(self.line_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = "<html>\n  <body>\n    <p>hi</p>\n  </body>\n</html>";

    #[test]
    fn new_document_is_scanned() {
        let doc = HtmlDocument::new(PAGE, DocumentOptions::default());
        assert!(doc.is_index_current());
        assert!(!doc.rescan_pending());
        assert_eq!(doc.tags().len(), 6);
        let starts: Vec<_> = doc.regions().keys().copied().collect();
        assert_eq!(starts, vec![0, 1]);
    }

    #[test]
    fn edit_defers_rescan_until_deadline() {
        let start = Instant::now();
        let mut doc = HtmlDocument::new("<b>x</b>", DocumentOptions::default());
        doc.apply_edit(8..8, "<i>y</i>", start).unwrap();
        assert!(!doc.is_index_current());
        assert_eq!(doc.tags().len(), 2);
        assert!(doc.poll_rescan(start + Duration::from_millis(10)).is_none());

        let report = doc
            .poll_rescan(start + DEFAULT_RESCAN_DELAY)
            .expect("rescan due")
            .expect("rescan ok");
        assert_eq!(report.tokens, 4);
        assert!(doc.is_index_current());
    }

    #[test]
    fn edit_rejects_out_of_range_offsets() {
        let mut doc = HtmlDocument::new("abc", DocumentOptions::default());
        let now = Instant::now();
        assert!(matches!(
            doc.apply_edit(2..9, "", now),
            Err(DocumentError::OffsetOutOfBounds { offset: 9, len: 3 })
        ));
        let (start, end) = (2, 1);
        assert!(matches!(
            doc.apply_edit(start..end, "", now),
            Err(DocumentError::InvertedRange { .. })
        ));
        assert_eq!(doc.text(), "abc");
    }

    #[test]
    fn edit_inside_folded_region_unfolds_it() {
        let mut doc = HtmlDocument::new(PAGE, DocumentOptions::default());
        doc.fold(1).unwrap();
        assert!(!doc.is_line_visible(2));

        let offset = doc.line_index().offset_of(2, 4).unwrap();
        let dropped = doc.apply_edit(offset..offset, "x", Instant::now()).unwrap();
        assert_eq!(dropped.len(), 1);
        assert!(dropped[0].now_visible);
        assert!(doc.is_line_visible(2));
    }

    #[test]
    fn line_count_change_drops_shifted_folds() {
        let mut doc = HtmlDocument::new(PAGE, DocumentOptions::default());
        doc.fold(1).unwrap();
        let now = Instant::now();
        let dropped = doc.apply_edit(0..0, "<!doctype html>\n", now).unwrap();
        assert_eq!(dropped.len(), 1);
        assert!(!doc.folds().is_folded(1));
        assert_eq!(doc.visible_lines().len(), doc.line_count());

        let report = doc.rescan_now().unwrap();
        assert!(report.dropped_folds.is_empty());
        assert_eq!(doc.visible_lines().len(), doc.line_count());
    }

    #[test]
    fn fold_below_inserted_line_is_dropped_not_shifted() {
        let mut doc = HtmlDocument::new(PAGE, DocumentOptions::default());
        doc.fold(1).unwrap();
        let offset = doc.line_index().line_start(1).unwrap();
        doc.apply_edit(offset..offset, "  <!-- nav -->\n", Instant::now())
            .unwrap();

        assert_eq!(doc.folds().collapsed().count(), 0);
        let lines: Vec<&str> = doc.text().split('\n').collect();
        let shown: Vec<&str> = doc.visible_lines().into_iter().map(|l| lines[l]).collect();
        assert!(shown.contains(&"  <body>"));
        assert!(shown.contains(&"    <p>hi</p>"));
    }

    #[test]
    fn edit_on_same_line_count_keeps_folds_elsewhere() {
        let mut doc = HtmlDocument::new(PAGE, DocumentOptions::default());
        doc.fold(1).unwrap();
        doc.apply_edit(5..5, " lang=\"en\"", Instant::now()).unwrap();
        assert!(doc.folds().is_folded(1));
    }

    #[test]
    fn folding_with_pending_edits_rescans_first() {
        let mut doc = HtmlDocument::new(PAGE, DocumentOptions::default());
        doc.apply_edit(0..0, "a\nb\nc\n", Instant::now()).unwrap();
        assert!(!doc.is_index_current());

        assert!(doc.fold(0).is_none());
        assert!(doc.is_index_current());
        let change = doc.fold(4).expect("body opener moved to line 4");
        assert_eq!((change.start_line, change.end_line), (4, 5));
        assert!(!doc.is_line_visible(5));
        assert!(doc.is_line_visible(6));
    }

    #[test]
    fn set_text_clears_fold_state() {
        let mut doc = HtmlDocument::new(PAGE, DocumentOptions::default());
        assert_eq!(doc.fold_all(), 2);
        let dropped = doc.set_text("<p>new</p>", Instant::now());
        assert_eq!(dropped.len(), 2);
        assert_eq!(doc.line_count(), 1);
    }
}
