use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// 管理書籤行號集合。 / Tracks bookmarked line numbers for one file.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BookmarkManager {
    bookmarks: BTreeSet<usize>,
}

impl BookmarkManager {
    /// 加入書籤；若原先已存在則回傳 `false`。 / Inserts a bookmark, returning false if it already existed.
    pub fn add(&mut self, line: usize) -> bool {
        self.bookmarks.insert(line)
    }

    /// 移除書籤。 / Removes a bookmark and returns whether it was present.
    pub fn remove(&mut self, line: usize) -> bool {
        self.bookmarks.remove(&line)
    }

    /// 切換書籤狀態並回傳新的狀態。 / Toggles a bookmark and returns the new state.
    pub fn toggle(&mut self, line: usize) -> bool {
        if self.bookmarks.remove(&line) {
            false
        } else {
            self.bookmarks.insert(line);
            true
        }
    }

    /// 檢查是否存在。 / Checks whether a bookmark exists on the given line.
    pub fn is_bookmarked(&self, line: usize) -> bool {
        self.bookmarks.contains(&line)
    }

    /// 取得下一個有效書籤，必要時從頭繞回。 / Next bookmark below `line_count` after `line`, wrapping around.
    ///
    /// Stale bookmarks at or beyond `line_count` are skipped.
    pub fn next_after(&self, line: usize, line_count: usize) -> Option<usize> {
        let from = line.saturating_add(1);
        let forward = if from < line_count {
            self.bookmarks.range(from..line_count).next().copied()
        } else {
            None
        };
        forward.or_else(|| self.bookmarks.range(..line_count).next().copied())
    }

    /// 取得前一個有效書籤，必要時從尾繞回。 / Previous valid bookmark before `line`, wrapping around.
    pub fn previous_before(&self, line: usize, line_count: usize) -> Option<usize> {
        self.bookmarks
            .range(..line.min(line_count))
            .next_back()
            .or_else(|| self.bookmarks.range(..line_count).next_back())
            .copied()
    }

    /// 以遞增順序列出所有書籤。 / Iterates bookmarks in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.bookmarks.iter().copied()
    }

    /// 清除所有書籤。 / Clears the tracked bookmarks.
    pub fn clear(&mut self) {
        self.bookmarks.clear();
    }

    /// 書籤數量。 / Returns number of bookmarks.
    pub fn len(&self) -> usize {
        self.bookmarks.len()
    }

    /// 是否為空。 / Indicates whether no bookmarks exist.
    pub fn is_empty(&self) -> bool {
        self.bookmarks.is_empty()
    }
}

impl FromIterator<usize> for BookmarkManager {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self {
            bookmarks: iter.into_iter().collect(),
        }
    }
}

/// 依檔案路徑分組的書籤。 / Bookmarks grouped by file path.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BookmarkSet {
    files: BTreeMap<PathBuf, BookmarkManager>,
}

impl BookmarkSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 切換書籤並回傳新的狀態。 / Toggles a bookmark, returning whether it is now set.
    pub fn toggle(&mut self, path: impl Into<PathBuf>, line: usize) -> bool {
        let path = path.into();
        let manager = self.files.entry(path.clone()).or_default();
        let now_set = manager.toggle(line);
        if manager.is_empty() {
            self.files.remove(&path);
        }
        now_set
    }

    pub fn add(&mut self, path: impl Into<PathBuf>, line: usize) -> bool {
        self.files.entry(path.into()).or_default().add(line)
    }

    pub fn remove(&mut self, path: &Path, line: usize) -> bool {
        let Some(manager) = self.files.get_mut(path) else {
            return false;
        };
        let removed = manager.remove(line);
        if manager.is_empty() {
            self.files.remove(path);
        }
        removed
    }

    /// 取代單一檔案的書籤。 / Replaces all bookmarks recorded for `path`.
    pub fn set_lines(&mut self, path: impl Into<PathBuf>, lines: impl IntoIterator<Item = usize>) {
        let manager: BookmarkManager = lines.into_iter().collect();
        let path = path.into();
        if manager.is_empty() {
            self.files.remove(&path);
        } else {
            self.files.insert(path, manager);
        }
    }

    pub fn get(&self, path: &Path) -> Option<&BookmarkManager> {
        self.files.get(path)
    }

    pub fn lines(&self, path: &Path) -> Vec<usize> {
        self.files
            .get(path)
            .map(|manager| manager.iter().collect())
            .unwrap_or_default()
    }

    pub fn next_after(&self, path: &Path, line: usize, line_count: usize) -> Option<usize> {
        self.files.get(path)?.next_after(line, line_count)
    }

    pub fn previous_before(&self, path: &Path, line: usize, line_count: usize) -> Option<usize> {
        self.files.get(path)?.previous_before(line, line_count)
    }

    pub fn clear_file(&mut self, path: &Path) -> bool {
        self.files.remove(path).is_some()
    }

    /// 移除已不存在的檔案。 / Drops entries for files that no longer exist; returns how many.
    pub fn retain_existing(&mut self) -> usize {
        let before = self.files.len();
        self.files.retain(|path, _| path.exists());
        before - self.files.len()
    }

    pub fn files(&self) -> impl Iterator<Item = (&Path, &BookmarkManager)> + '_ {
        self.files
            .iter()
            .map(|(path, manager)| (path.as_path(), manager))
    }

    pub fn len(&self) -> usize {
        self.files.values().map(BookmarkManager::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_and_iterate() {
        let mut manager = BookmarkManager::default();
        assert!(manager.toggle(5));
        assert!(manager.toggle(10));
        // 移除既有書籤時應回傳 false。 / Removing an existing bookmark should return false.
        assert!(!manager.toggle(5));
        assert_eq!(manager.len(), 1);
        assert!(manager.is_bookmarked(10));
        let collected: Vec<_> = manager.iter().collect();
        assert_eq!(collected, vec![10]);
    }

    #[test]
    fn navigation_skips_stale_lines_and_wraps() {
        let manager: BookmarkManager = [2, 5, 8, 40].into_iter().collect();
        assert_eq!(manager.next_after(2, 20), Some(5));
        assert_eq!(manager.next_after(8, 20), Some(2));
        assert_eq!(manager.previous_before(5, 20), Some(2));
        assert_eq!(manager.previous_before(1, 20), Some(8));
        assert_eq!(manager.next_after(30, 20), Some(2));
        assert_eq!(manager.next_after(0, 2), None);
    }

    #[test]
    fn set_groups_by_path_and_prunes_empty_files() {
        let mut set = BookmarkSet::new();
        let index = PathBuf::from("site/index.html");
        assert!(set.toggle(&index, 3));
        assert!(set.add(&index, 9));
        assert!(set.add("site/about.html", 1));
        assert_eq!(set.len(), 3);
        assert_eq!(set.lines(&index), vec![3, 9]);
        assert_eq!(set.next_after(&index, 3, 100), Some(9));

        assert!(!set.toggle(&index, 3));
        assert!(set.remove(&index, 9));
        assert!(set.get(&index).is_none());
        assert_eq!(set.files().count(), 1);
    }

    #[test]
    fn retain_existing_drops_missing_files() {
        let mut set = BookmarkSet::new();
        set.add(std::env::temp_dir(), 1);
        set.add("/definitely/not/here.html", 4);
        assert_eq!(set.retain_existing(), 1);
        assert_eq!(set.len(), 1);
    }
}
