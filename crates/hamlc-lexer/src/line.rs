/// Width of one rendered indentation level, in spaces.
pub const INDENT: usize = 2;

/// Trailing marker that continues a logical line onto the next source line.
pub const MULTILINE: char = '|';

/// Count the leading whitespace characters of `text`.
///
/// Tabs and spaces count one each; mixing them is not normalized.
pub fn indentation(text: &str) -> usize {
    text.chars().take_while(|c| c.is_whitespace()).count()
}

/// One logical source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// 1-based line number of the first physical line.
    pub number: usize,
    /// Leading whitespace characters in the source.
    pub indent: usize,
    /// The line with trailing whitespace removed.
    pub raw: String,
    /// The line with surrounding whitespace removed.
    pub text: String,
}

impl Line {
    pub fn new(number: usize, raw: &str) -> Self {
        let raw = raw.trim_end();
        Self {
            number,
            indent: indentation(raw),
            raw: raw.to_string(),
            text: raw.trim().to_string(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.text.is_empty()
    }

    /// Whether the line ends with the multiline marker.
    pub fn is_continued(&self) -> bool {
        self.raw.ends_with(MULTILINE)
    }

    /// Join this line with its continuation lines into one logical line,
    /// keeping this line's number and indentation.
    pub fn join(&self, rest: &[Line]) -> Self {
        let joined = std::iter::once(self)
            .chain(rest)
            .map(|l| l.text.trim_end_matches(MULTILINE).trim())
            .collect::<Vec<_>>()
            .join(" ");
        let raw = format!("{}{}", &self.raw[..self.leading_bytes()], joined);
        Self {
            number: self.number,
            indent: self.indent,
            raw,
            text: joined,
        }
    }

    fn leading_bytes(&self) -> usize {
        self.raw.len() - self.raw.trim_start().len()
    }
}

/// A line together with everything nested under it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub line: Line,
    /// Nesting level; top-level blocks are at depth 0.
    pub depth: usize,
    pub children: Vec<Block>,
    /// Raw nested lines of a verbatim block, in source order.
    pub body: Vec<String>,
}

impl Block {
    pub fn text(&self) -> &str {
        &self.line.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_indentation_spaces() {
        assert_eq!(indentation("    %p"), 4);
    }

    #[test]
    fn test_indentation_tabs_count_one_each() {
        assert_eq!(indentation("\t\t%p"), 2);
        assert_eq!(indentation(" \t %p"), 3);
    }

    #[test]
    fn test_indentation_none() {
        assert_eq!(indentation("%p"), 0);
        assert_eq!(indentation(""), 0);
    }

    #[test]
    fn test_line_trims() {
        let line = Line::new(3, "  %p foo  \r");
        assert_eq!(line.number, 3);
        assert_eq!(line.indent, 2);
        assert_eq!(line.raw, "  %p foo");
        assert_eq!(line.text, "%p foo");
    }

    #[test]
    fn test_line_blank() {
        assert!(Line::new(1, "   \t").is_blank());
        assert!(!Line::new(1, " x").is_blank());
    }

    #[test]
    fn test_join_continuations() {
        let first = Line::new(1, "  %p one |");
        let rest = vec![Line::new(2, "    two |"), Line::new(3, "three |")];
        let joined = first.join(&rest);
        assert_eq!(joined.text, "%p one two three");
        assert_eq!(joined.raw, "  %p one two three");
        assert_eq!(joined.indent, 2);
        assert_eq!(joined.number, 1);
    }
}
