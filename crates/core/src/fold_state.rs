use std::collections::BTreeMap;

use crate::folding::{FoldRegion, FoldTable};

/// 折疊狀態變更，提供給繪製層隱藏或顯示行。 / Visibility change emitted for the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FoldChange {
    pub start_line: usize,
    pub end_line: usize,
    pub now_visible: bool,
}

impl FoldChange {
    fn collapsed(region: &FoldRegion) -> Self {
        Self {
            start_line: region.start_line,
            end_line: region.end_line,
            now_visible: false,
        }
    }

    fn expanded(region: &FoldRegion) -> Self {
        Self {
            start_line: region.start_line,
            end_line: region.end_line,
            now_visible: true,
        }
    }
}

/// 管理單一文件的折疊狀態。 / Tracks collapsed regions for one document.
///
/// Collapsed entries keep the region snapshot captured at fold time. Hidden
/// lines are derived from that set, so folding then unfolding a region
/// restores the previous visibility exactly.
#[derive(Debug, Clone)]
pub struct FoldTracker {
    regions: FoldTable,
    collapsed: BTreeMap<usize, FoldRegion>,
    indent_unit: usize,
}

impl Default for FoldTracker {
    fn default() -> Self {
        Self::new(4)
    }
}

impl FoldTracker {
    /// 建立空的追蹤器。 / Creates an empty tracker.
    pub fn new(indent_unit: usize) -> Self {
        Self {
            regions: FoldTable::new(),
            collapsed: BTreeMap::new(),
            indent_unit: indent_unit.max(1),
        }
    }

    pub fn indent_unit(&self) -> usize {
        self.indent_unit
    }

    pub fn set_indent_unit(&mut self, indent_unit: usize) {
        self.indent_unit = indent_unit.max(1);
    }

    /// 列出可折疊區段。 / Returns the current region table.
    pub fn regions(&self) -> &FoldTable {
        &self.regions
    }

    pub fn region(&self, start_line: usize) -> Option<&FoldRegion> {
        self.regions.get(&start_line)
    }

    /// 以遞增順序列出已折疊區段。 / Iterates collapsed regions in ascending order.
    pub fn collapsed(&self) -> impl Iterator<Item = &FoldRegion> + '_ {
        self.collapsed.values()
    }

    pub fn is_folded(&self, start_line: usize) -> bool {
        self.collapsed.contains_key(&start_line)
    }

    /// 折疊指定區段。 / Collapses the region opened at `start_line`.
    ///
    /// Returns `None` if the line is not a fold start or is already folded.
    pub fn fold(&mut self, start_line: usize) -> Option<FoldChange> {
        if self.collapsed.contains_key(&start_line) {
            return None;
        }
        let region = *self.regions.get(&start_line)?;
        self.collapsed.insert(start_line, region);
        Some(FoldChange::collapsed(&region))
    }

    /// 展開指定區段。 / Expands a collapsed region.
    pub fn unfold(&mut self, start_line: usize) -> Option<FoldChange> {
        let region = self.collapsed.remove(&start_line)?;
        Some(FoldChange::expanded(&region))
    }

    /// 切換折疊狀態。 / Toggles the region opened at `start_line`.
    pub fn toggle(&mut self, start_line: usize) -> Option<FoldChange> {
        if self.is_folded(start_line) {
            self.unfold(start_line)
        } else {
            self.fold(start_line)
        }
    }

    /// 折疊全部區段，回傳新折疊的數量。 / Folds every region; returns how many were newly folded.
    pub fn fold_all(&mut self) -> usize {
        let starts: Vec<usize> = self.regions.keys().copied().collect();
        starts
            .into_iter()
            .filter(|&start| self.fold(start).is_some())
            .count()
    }

    /// 展開全部區段。 / Unfolds everything; returns how many were unfolded.
    pub fn unfold_all(&mut self) -> usize {
        let count = self.collapsed.len();
        self.collapsed.clear();
        count
    }

    /// 僅折疊指定層級。 / Folds regions whose opener sits exactly at `level * indent_unit`.
    pub fn fold_at_level(&mut self, level: usize) -> usize {
        let Some(target) = level.checked_mul(self.indent_unit) else {
            return 0;
        };
        let starts: Vec<usize> = self
            .regions
            .values()
            .filter(|region| region.indent == target)
            .map(|region| region.start_line)
            .collect();
        starts
            .into_iter()
            .filter(|&start| self.fold(start).is_some())
            .count()
    }

    /// 以重新計算的區段表取代舊表。 / Replaces the region table after a rescan.
    ///
    /// Collapsed entries whose recomputed region differs (or vanished) are
    /// dropped and reported as now visible.
    pub fn replace_regions(&mut self, regions: FoldTable) -> Vec<FoldChange> {
        self.regions = regions;
        let regions = &self.regions;
        let mut dropped = Vec::new();
        self.collapsed.retain(|start, snapshot| {
            let keep = regions.get(start) == Some(snapshot);
            if !keep {
                dropped.push(FoldChange::expanded(snapshot));
            }
            keep
        });
        dropped
    }

    /// 移除與編輯行相交的折疊。 / Drops collapsed regions touched by an edit spanning `first..=last`.
    pub fn invalidate_lines(&mut self, first: usize, last: usize) -> Vec<FoldChange> {
        let mut dropped = Vec::new();
        self.collapsed.retain(|_, snapshot| {
            let keep = !snapshot.intersects(first, last);
            if !keep {
                dropped.push(FoldChange::expanded(snapshot));
            }
            keep
        });
        dropped
    }

    /// 檢查行是否可見。 / Checks whether the given line should be visible.
    pub fn is_line_visible(&self, line: usize) -> bool {
        !self
            .collapsed
            .range(..line)
            .any(|(_, region)| region.hides(line))
    }

    /// 列出可見行。 / Enumerates visible lines up to the provided total.
    pub fn visible_lines(&self, total_lines: usize) -> Vec<usize> {
        (0..total_lines)
            .filter(|&line| self.is_line_visible(line))
            .collect()
    }

    /// 清除所有區段與折疊。 / Clears regions and fold state.
    pub fn clear(&mut self) {
        self.regions.clear();
        self.collapsed.clear();
    }
}
