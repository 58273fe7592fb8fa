use std::fs;
use std::io;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use htmlpad_core::BookmarkSet;

/// 管理書籤的持久化儲存。 / Persists bookmarks as `base64(path)=line,line,...` records.
#[derive(Debug)]
pub struct BookmarkStore {
    path: PathBuf,
    bookmarks: BookmarkSet,
}

impl BookmarkStore {
    /// 載入書籤並略過已不存在的檔案。 / Loads bookmarks, dropping files that no longer exist.
    ///
    /// A missing store yields an empty set. Line numbers that fail to parse
    /// are skipped; a record without `=` is rejected as invalid data.
    pub fn load(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut bookmarks = BookmarkSet::new();
        if !path.exists() {
            return Ok(Self { path, bookmarks });
        }

        let contents = fs::read_to_string(&path)?;
        for line in contents.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let (encoded, lines) = trimmed.split_once('=').ok_or_else(|| {
                io::Error::new(
                    ErrorKind::InvalidData,
                    format!("malformed bookmark entry: {trimmed}"),
                )
            })?;
            let file = decode_path(encoded)?;
            let numbers = lines
                .split(',')
                .filter_map(|value| value.trim().parse::<usize>().ok());
            bookmarks.set_lines(file, numbers);
        }
        bookmarks.retain_existing();

        Ok(Self { path, bookmarks })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 取得目前的書籤集合。 / Returns the loaded bookmarks.
    pub fn bookmarks(&self) -> &BookmarkSet {
        &self.bookmarks
    }

    /// 切換書籤並立即寫回。 / Toggles a bookmark and persists; returns the new state.
    pub fn toggle(&mut self, file: impl Into<PathBuf>, line: usize) -> io::Result<bool> {
        let now_set = self.bookmarks.toggle(file, line);
        self.persist()?;
        Ok(now_set)
    }

    /// 清除單一檔案的書籤。 / Clears one file's bookmarks and persists when changed.
    pub fn clear_file(&mut self, file: &Path) -> io::Result<bool> {
        let removed = self.bookmarks.clear_file(file);
        if removed {
            self.persist()?;
        }
        Ok(removed)
    }

    /// 以新的集合取代並寫回。 / Replaces the whole set and persists.
    pub fn replace(&mut self, bookmarks: BookmarkSet) -> io::Result<()> {
        self.bookmarks = bookmarks;
        self.persist()
    }

    fn persist(&self) -> io::Result<()> {
        let mut payload = String::new();
        for (file, manager) in self.bookmarks.files() {
            let lines: Vec<String> = manager.iter().map(|line| line.to_string()).collect();
            payload.push_str(&format!("{}={}\n", encode_path(file), lines.join(",")));
        }
        write_atomic(&self.path, payload.as_bytes())
    }
}

fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, data)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

fn encode_path(path: &Path) -> String {
    BASE64.encode(path_to_bytes(path))
}

fn decode_path(encoded: &str) -> io::Result<PathBuf> {
    let bytes = BASE64
        .decode(encoded.as_bytes())
        .map_err(|err| io::Error::new(ErrorKind::InvalidData, err))?;
    bytes_to_path(bytes)
}

#[cfg(unix)]
fn path_to_bytes(path: &Path) -> Vec<u8> {
    use std::os::unix::ffi::OsStrExt;
    path.as_os_str().as_bytes().to_vec()
}

#[cfg(unix)]
fn bytes_to_path(bytes: Vec<u8>) -> io::Result<PathBuf> {
    use std::ffi::OsString;
    use std::os::unix::ffi::OsStringExt;
    Ok(PathBuf::from(OsString::from_vec(bytes)))
}

#[cfg(windows)]
fn path_to_bytes(path: &Path) -> Vec<u8> {
    use std::os::windows::ffi::OsStrExt;
    path.as_os_str()
        .encode_wide()
        .flat_map(|unit| unit.to_le_bytes())
        .collect()
}

#[cfg(windows)]
fn bytes_to_path(bytes: Vec<u8>) -> io::Result<PathBuf> {
    use std::ffi::OsString;
    use std::os::windows::ffi::OsStringExt;

    if bytes.len() % 2 != 0 {
        return Err(io::Error::new(
            ErrorKind::InvalidData,
            "encoded path payload has an odd length",
        ));
    }

    let wide: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|chunk| u16::from_le_bytes([chunk[0], chunk[1]]))
        .collect();
    Ok(PathBuf::from(OsString::from_wide(&wide)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn malformed_record_is_rejected() {
        let dir = tempdir().unwrap();
        let store_path = dir.path().join("bookmarks.db");
        fs::write(&store_path, "not-a-record\n").unwrap();
        let err = BookmarkStore::load(&store_path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
    }

    #[test]
    fn bad_line_numbers_are_skipped() {
        let dir = tempdir().unwrap();
        let page = dir.path().join("page.html");
        fs::write(&page, "<p></p>").unwrap();
        let store_path = dir.path().join("bookmarks.db");
        fs::write(
            &store_path,
            format!("# bookmarks\n{}=3,x,-1, 7\n", encode_path(&page)),
        )
        .unwrap();

        let store = BookmarkStore::load(&store_path).unwrap();
        assert_eq!(store.bookmarks().lines(&page), vec![3, 7]);
    }
}
