//! Source map for managing source files and computing source locations.
//!
//! The lexer and parser operate on borrowed `&str` slices; the
//! [`SourceMap`] owns the backing buffers and maps [`FileId`]s back to
//! file names and line/column positions for diagnostic presentation.

use std::sync::Arc;

use super::FileId;

/// A source file with its content and metadata
///
/// # Examples
///
/// ```
/// use hanc_util::span::SourceFile;
///
/// let file = SourceFile::new(0, "main.hn", "函数 主程序() { }");
/// assert_eq!(file.name(), "main.hn");
/// ```
#[derive(Clone)]
pub struct SourceFile {
    /// Unique file identifier
    id: FileId,
    /// File name (path or display name)
    name: String,
    /// File content
    content: Arc<str>,
    /// Precomputed line start offsets
    line_starts: Arc<[usize]>,
}

impl SourceFile {
    /// Create a new source file
    pub fn new(id: usize, name: impl Into<String>, content: impl Into<Arc<str>>) -> Self {
        let content = content.into();
        let line_starts = Self::compute_line_starts(&content);
        Self {
            id: FileId(id),
            name: name.into(),
            content,
            line_starts,
        }
    }

    fn compute_line_starts(content: &str) -> Arc<[usize]> {
        let mut line_starts = vec![0];
        for (i, ch) in content.char_indices() {
            if ch == '\n' {
                line_starts.push(i + 1);
            }
        }
        line_starts.into()
    }

    /// Get the file identifier
    #[inline]
    pub fn id(&self) -> FileId {
        self.id
    }

    /// Get the file name
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the file content
    #[inline]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Get the total number of lines
    #[inline]
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Compute the 1-based (line, column) of a byte offset
    ///
    /// The column counts bytes from the line start, matching the lexer's
    /// position tracking. Offsets past the end clamp to the last line.
    pub fn location(&self, offset: usize) -> (u32, u32) {
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let line_start = self.line_starts[line_idx];
        ((line_idx + 1) as u32, (offset - line_start + 1) as u32)
    }

    /// Slice the content of a byte range
    ///
    /// Returns `None` when the range is out of bounds or does not fall on
    /// UTF-8 boundaries.
    pub fn slice(&self, start: usize, end: usize) -> Option<&str> {
        self.content.get(start..end)
    }
}

/// Registry of all source files in a compilation
///
/// Files are assigned sequential [`FileId`]s in insertion order.
///
/// # Examples
///
/// ```
/// use hanc_util::span::SourceMap;
///
/// let mut map = SourceMap::new();
/// let id = map.add_file("lib.hn", "变量 x = 1;");
/// assert_eq!(map.file(id).unwrap().name(), "lib.hn");
/// ```
#[derive(Default)]
pub struct SourceMap {
    files: Vec<SourceFile>,
}

impl SourceMap {
    /// Create an empty source map
    pub fn new() -> Self {
        Self { files: Vec::new() }
    }

    /// Add a file and return its id
    pub fn add_file(&mut self, name: impl Into<String>, content: impl Into<Arc<str>>) -> FileId {
        let id = self.files.len();
        self.files.push(SourceFile::new(id, name, content));
        FileId(id)
    }

    /// Look up a file by id
    pub fn file(&self, id: FileId) -> Option<&SourceFile> {
        self.files.get(id.0)
    }

    /// Number of registered files
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the map is empty
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Iterate over all files in registration order
    pub fn iter(&self) -> impl Iterator<Item = &SourceFile> {
        self.files.iter()
    }
}
