//! Script output.
//!
//! Script programs write to the current output file in one of three modes:
//! unbuffered write-through, buffered line mode (the default), or page mode,
//! where writes land in a fixed rows × cols character grid that is dumped on
//! an explicit page-out with trailing spaces stripped from each row.

use std::fs::OpenOptions;
use std::io::Write;

/// Upper bound on page grid rows.
pub const MAX_ROWS: usize = 512;
/// Upper bound on page grid columns.
pub const MAX_COLS: usize = 512;

const LINE_BUFFER_CAPACITY: usize = 1024;

/// The three output modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Write through on every call.
    Unbuffered,
    /// Collect into a line buffer, flushing on overflow.
    Buffered,
    /// Write into a character grid, flushed by page-out.
    Page,
}

#[derive(Debug)]
enum Sink {
    Stdout,
    File {
        name: String,
        file: std::fs::File,
    },
    Memory {
        name: String,
        buffer: Vec<u8>,
    },
}

impl Sink {
    fn write_all(&mut self, bytes: &[u8]) {
        match self {
            Sink::Stdout => {
                let _ = std::io::stdout().write_all(bytes);
            }
            Sink::File { file, .. } => {
                let _ = file.write_all(bytes);
            }
            Sink::Memory { buffer, .. } => buffer.extend_from_slice(bytes),
        }
    }

    fn name(&self) -> &str {
        match self {
            Sink::Stdout => "stdout",
            Sink::File { name, .. } | Sink::Memory { name, .. } => name,
        }
    }
}

#[derive(Debug)]
struct PageGrid {
    rows: usize,
    cols: usize,
    cells: Vec<u8>,
    row: usize,
    col: usize,
}

impl PageGrid {
    fn new(rows: usize, cols: usize) -> Self {
        PageGrid {
            rows,
            cols,
            cells: vec![b' '; rows * cols],
            row: 1,
            col: 1,
        }
    }

    fn put(&mut self, c: char) {
        if c == '\n' {
            self.row = (self.row + 1).min(self.rows);
            self.col = 1;
            return;
        }
        if self.row <= self.rows && self.col <= self.cols {
            let byte = if c.is_ascii() { c as u8 } else { b'?' };
            self.cells[(self.row - 1) * self.cols + (self.col - 1)] = byte;
        }
        self.col += 1;
    }

    fn dump(&mut self) -> String {
        let mut out = String::with_capacity(self.rows * (self.cols + 1));
        for row in 0..self.rows {
            let line = &self.cells[row * self.cols..(row + 1) * self.cols];
            let end = line
                .iter()
                .rposition(|&b| b != b' ')
                .map_or(0, |p| p + 1);
            out.push_str(std::str::from_utf8(&line[..end]).unwrap_or(""));
            out.push('\n');
        }
        self.cells.fill(b' ');
        self.row = 1;
        self.col = 1;
        out
    }
}

/// The script output state: current mode, destination, and buffers.
#[derive(Debug)]
pub struct ScriptOutput {
    mode: OutputMode,
    sink: Sink,
    line_buffer: String,
    page: Option<PageGrid>,
}

impl ScriptOutput {
    /// Creates buffered output to stdout.
    #[must_use]
    pub fn stdout() -> Self {
        ScriptOutput {
            mode: OutputMode::Buffered,
            sink: Sink::Stdout,
            line_buffer: String::with_capacity(LINE_BUFFER_CAPACITY),
            page: None,
        }
    }

    /// Creates buffered output captured in memory, for embedding and tests.
    #[must_use]
    pub fn memory(name: &str) -> Self {
        ScriptOutput {
            mode: OutputMode::Buffered,
            sink: Sink::Memory {
                name: name.to_string(),
                buffer: Vec::new(),
            },
            line_buffer: String::with_capacity(LINE_BUFFER_CAPACITY),
            page: None,
        }
    }

    /// Creates buffered output to a file.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be opened.
    pub fn file(name: &str, append: bool) -> std::io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(append)
            .write(true)
            .truncate(!append)
            .open(name)?;
        Ok(ScriptOutput {
            mode: OutputMode::Buffered,
            sink: Sink::File {
                name: name.to_string(),
                file,
            },
            line_buffer: String::with_capacity(LINE_BUFFER_CAPACITY),
            page: None,
        })
    }

    /// Returns the current output file's name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.sink.name()
    }

    /// Returns the current output mode.
    #[must_use]
    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Replaces the destination, flushing what is pending first. The output
    /// mode is preserved.
    ///
    /// # Errors
    ///
    /// Returns an error when the new file cannot be opened.
    pub fn redirect_to_file(&mut self, name: &str, append: bool) -> std::io::Result<()> {
        self.flush();
        let file = OpenOptions::new()
            .create(true)
            .append(append)
            .write(true)
            .truncate(!append)
            .open(name)?;
        self.sink = Sink::File {
            name: name.to_string(),
            file,
        };
        Ok(())
    }

    /// Switches to unbuffered write-through mode.
    pub fn unbuffered_mode(&mut self) {
        self.flush();
        self.mode = OutputMode::Unbuffered;
        self.page = None;
    }

    /// Switches to buffered line mode, the default.
    pub fn line_mode(&mut self) {
        self.flush();
        self.mode = OutputMode::Buffered;
        self.page = None;
        self.line_buffer.clear();
    }

    /// Switches to page mode with a rows × cols grid.
    ///
    /// # Errors
    ///
    /// Returns a message when the dimensions are out of range.
    pub fn page_mode(&mut self, rows: usize, cols: usize) -> Result<(), String> {
        if rows < 1 || rows > MAX_ROWS || cols < 1 || cols > MAX_COLS {
            return Err(format!(
                "page size {rows}x{cols} is out of range (max {MAX_ROWS}x{MAX_COLS})"
            ));
        }
        self.flush();
        self.mode = OutputMode::Page;
        self.page = Some(PageGrid::new(rows, cols));
        Ok(())
    }

    /// Positions page output at a row and column.
    ///
    /// # Errors
    ///
    /// Returns a message outside page mode or outside the grid.
    pub fn pos(&mut self, row: usize, col: usize) -> Result<(), String> {
        let Some(page) = self.page.as_mut() else {
            return Err("pos is only meaningful in page mode".to_string());
        };
        if row < 1 || row > page.rows || col < 1 || col > page.cols {
            return Err(format!("position {row},{col} is outside the page"));
        }
        page.row = row;
        page.col = col;
        Ok(())
    }

    /// Positions page output at the start of a row.
    ///
    /// # Errors
    ///
    /// Returns a message outside page mode or outside the grid.
    pub fn row(&mut self, row: usize) -> Result<(), String> {
        self.pos(row, 1)
    }

    /// Positions output at a column. Clamped to the range 1..=100.
    pub fn col(&mut self, col: usize) {
        let col = col.clamp(1, 100);
        if let Some(page) = self.page.as_mut() {
            page.col = col;
        }
    }

    /// Dumps the page grid, trailing spaces stripped from each row, and
    /// clears it.
    ///
    /// # Errors
    ///
    /// Returns a message outside page mode.
    pub fn page_out(&mut self) -> Result<(), String> {
        let Some(page) = self.page.as_mut() else {
            return Err("pageout is only meaningful in page mode".to_string());
        };
        let text = page.dump();
        self.sink.write_all(text.as_bytes());
        Ok(())
    }

    /// Writes a string in the current mode.
    pub fn write_str(&mut self, s: &str) {
        match self.mode {
            OutputMode::Unbuffered => self.sink.write_all(s.as_bytes()),
            OutputMode::Buffered => {
                self.line_buffer.push_str(s);
                if self.line_buffer.len() >= LINE_BUFFER_CAPACITY {
                    self.flush();
                }
            }
            OutputMode::Page => {
                if let Some(page) = self.page.as_mut() {
                    for c in s.chars() {
                        page.put(c);
                    }
                }
            }
        }
    }

    /// Flushes the line buffer to the destination.
    pub fn flush(&mut self) {
        if !self.line_buffer.is_empty() {
            let pending = std::mem::take(&mut self.line_buffer);
            self.sink.write_all(pending.as_bytes());
        }
        if let Sink::File { file, .. } = &mut self.sink {
            let _ = file.flush();
        }
    }

    /// Returns everything written so far, for memory outputs.
    #[must_use]
    pub fn memory_contents(&mut self) -> Option<String> {
        self.flush();
        match &self.sink {
            Sink::Memory { buffer, .. } => Some(String::from_utf8_lossy(buffer).into_owned()),
            _ => None,
        }
    }
}

impl Drop for ScriptOutput {
    fn drop(&mut self) {
        self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffered_output_collects_writes() {
        let mut out = ScriptOutput::memory("report");
        out.write_str("hello ");
        out.write_str("world\n");
        assert_eq!(out.memory_contents().as_deref(), Some("hello world\n"));
    }

    #[test]
    fn test_page_mode_grid_and_pageout() {
        let mut out = ScriptOutput::memory("page");
        out.page_mode(3, 10).unwrap();
        out.write_str("top");
        out.pos(2, 4).unwrap();
        out.write_str("mid");
        out.page_out().unwrap();
        let text = out.memory_contents().unwrap();
        assert_eq!(text, "top\n   mid\n\n");
    }

    #[test]
    fn test_pos_outside_grid_is_an_error() {
        let mut out = ScriptOutput::memory("page");
        out.page_mode(2, 5).unwrap();
        assert!(out.pos(3, 1).is_err());
        assert!(out.pos(1, 6).is_err());
    }

    #[test]
    fn test_page_mode_bounds() {
        let mut out = ScriptOutput::memory("page");
        assert!(out.page_mode(0, 10).is_err());
        assert!(out.page_mode(10, MAX_COLS + 1).is_err());
    }

    #[test]
    fn test_line_mode_exits_page_mode() {
        let mut out = ScriptOutput::memory("page");
        out.page_mode(2, 5).unwrap();
        out.line_mode();
        assert_eq!(out.mode(), OutputMode::Buffered);
        assert!(out.page_out().is_err());
    }

    #[test]
    fn test_name() {
        let out = ScriptOutput::memory("report.txt");
        assert_eq!(out.name(), "report.txt");
    }
}
