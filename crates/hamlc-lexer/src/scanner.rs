use crate::line::{Block, Line};

/// Block tree builder.
///
/// Splits the source into non-blank lines, then groups every line with the
/// lines that follow it at a strictly greater indentation. Grouping compares
/// raw leading-whitespace counts only, so a document indented consistently
/// with tabs yields the same tree as one indented with spaces.
pub struct Scanner {
    lines: Vec<Line>,
    pos: usize,
    verbatim: fn(&str) -> bool,
}

impl Scanner {
    /// Create a scanner where every nested line becomes a child block.
    pub fn new(source: &str) -> Self {
        Self::with_verbatim(source, |_| false)
    }

    /// Create a scanner that keeps the nested lines of any line matching
    /// `verbatim` as raw body text instead of scanning them into children.
    pub fn with_verbatim(source: &str, verbatim: fn(&str) -> bool) -> Self {
        let lines = source
            .split('\n')
            .enumerate()
            .map(|(i, raw)| Line::new(i + 1, raw))
            .filter(|line| !line.is_blank())
            .collect();

        Self {
            lines,
            pos: 0,
            verbatim,
        }
    }

    /// Scan the whole source into top-level blocks.
    pub fn scan(source: &str) -> Vec<Block> {
        Scanner::new(source).build()
    }

    /// Consume the scanner and build the block tree.
    pub fn build(mut self) -> Vec<Block> {
        let end = self.lines.len();
        let blocks = self.scan_blocks(end, 0);
        tracing::trace!(lines = end, blocks = blocks.len(), "scanned source");
        blocks
    }

    /// Scan the lines in `self.pos..end` into sibling blocks at `depth`.
    fn scan_blocks(&mut self, end: usize, depth: usize) -> Vec<Block> {
        let mut blocks = Vec::new();

        while self.pos < end {
            let line = self.logical_line(end);

            let start = self.pos;
            while self.pos < end && self.lines[self.pos].indent > line.indent {
                self.pos += 1;
            }
            let nested_end = self.pos;

            let (children, body) = if (self.verbatim)(&line.text) {
                let body = self.lines[start..nested_end]
                    .iter()
                    .map(|l| l.raw.clone())
                    .collect();
                (Vec::new(), body)
            } else {
                self.pos = start;
                let children = self.scan_blocks(nested_end, depth + 1);
                (children, Vec::new())
            };
            self.pos = nested_end;

            blocks.push(Block {
                line,
                depth,
                children,
                body,
            });
        }

        blocks
    }

    /// Take the next line, joined with its continuation lines if it ends
    /// with the multiline marker.
    fn logical_line(&mut self, end: usize) -> Line {
        let first = self.lines[self.pos].clone();
        self.pos += 1;

        if !first.is_continued() {
            return first;
        }

        let start = self.pos;
        while self.pos < end && self.lines[self.pos].is_continued() {
            self.pos += 1;
        }

        first.join(&self.lines[start..self.pos])
    }
}
