//! Line and indentation helpers shared by folding and cursor queries.
//! Offsets are character offsets unless a function says otherwise.

/// 縮排寬度的計算方式。 / How leading whitespace is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndentPolicy {
    /// 空白與 Tab 皆計為一個單位。 / Every space or tab counts as one unit.
    #[default]
    Uniform,
    /// Tab 對齊至下一個 `tab_width` 的倍數。 / Tabs advance to the next multiple of `tab_width`.
    ///
    /// A `tab_width` of `0` measures like `Uniform`.
    Columns { tab_width: usize },
}

impl IndentPolicy {
    /// `0` keeps the uniform behaviour.
    pub fn from_tab_width(tab_width: usize) -> Self {
        if tab_width == 0 {
            IndentPolicy::Uniform
        } else {
            IndentPolicy::Columns { tab_width }
        }
    }
}

/// 計算行首縮排。 / Measures the leading indentation of a line.
pub fn measure_indent(line: &str, policy: IndentPolicy) -> usize {
    let mut width = 0;
    for ch in line.chars() {
        match ch {
            ' ' => width += 1,
            '\t' => match policy {
                IndentPolicy::Uniform | IndentPolicy::Columns { tab_width: 0 } => width += 1,
                IndentPolicy::Columns { tab_width } => {
                    width += tab_width - (width % tab_width);
                }
            },
            _ => break,
        }
    }
    width
}

/// 判斷是否為空白行。 / Whether the line holds only whitespace.
pub fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// 依 `\n` 切分行並移除 `\r`。 / Splits on `\n`, dropping a trailing `\r` from each line.
///
/// A trailing newline yields a final empty line, matching how an editor
/// counts lines.
pub fn split_lines(text: &str) -> Vec<&str> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect()
}

/// 字元位移轉位元組位移。 / Converts a character offset to a byte offset.
pub fn char_to_byte(text: &str, char_offset: usize) -> Option<usize> {
    if char_offset == 0 {
        return Some(0);
    }
    match text.char_indices().nth(char_offset) {
        Some((byte, _)) => Some(byte),
        None if text.chars().count() == char_offset => Some(text.len()),
        None => None,
    }
}

/// 行首位移表。 / Table of line start offsets (in characters) for one snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    starts: Vec<usize>,
    total_chars: usize,
}

impl Default for LineIndex {
    fn default() -> Self {
        Self {
            starts: vec![0],
            total_chars: 0,
        }
    }
}

impl LineIndex {
    pub fn build(text: &str) -> Self {
        let mut starts = vec![0];
        let mut total_chars = 0;
        for ch in text.chars() {
            total_chars += 1;
            if ch == '\n' {
                starts.push(total_chars);
            }
        }
        Self {
            starts,
            total_chars,
        }
    }

    pub fn line_count(&self) -> usize {
        self.starts.len()
    }

    pub fn total_chars(&self) -> usize {
        self.total_chars
    }

    /// 位移所在行（超出範圍時取最後一行）。 / Line containing `offset`, clamped to the last line.
    pub fn line_of(&self, offset: usize) -> usize {
        let offset = offset.min(self.total_chars);
        self.starts.partition_point(|&start| start <= offset) - 1
    }

    pub fn line_start(&self, line: usize) -> Option<usize> {
        self.starts.get(line).copied()
    }

    /// 行與欄（皆從 0 起算）轉位移。 / Converts a zero-based line/column pair to an offset.
    pub fn offset_of(&self, line: usize, column: usize) -> Option<usize> {
        let start = self.line_start(line)?;
        let end = self
            .starts
            .get(line + 1)
            .map(|next| next - 1)
            .unwrap_or(self.total_chars);
        let offset = start + column;
        (offset <= end).then_some(offset)
    }
}
