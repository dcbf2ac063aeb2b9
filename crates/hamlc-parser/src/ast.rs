//! Node model for hamlc templates.
//!
//! A [`Document`] owns its top-level nodes; every [`Node`] owns its children.
//! Sibling relations are never stored. They are looked up on demand through
//! [`Siblings`], a view of one node inside its parent's child list.

use crate::element::ElementLine;

/// A parsed template. Its implicit root sits at depth -1.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub nodes: Vec<Node>,
}

impl Document {
    /// Total number of nodes in the tree.
    pub fn len(&self) -> usize {
        self.nodes.iter().map(Node::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// One node, built from one logical source line.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    /// The trimmed source line.
    pub source: String,
    /// 1-based source line number.
    pub line: usize,
    /// Nesting depth; one more than the parent's.
    pub depth: usize,
    pub children: Vec<Node>,
}

impl Node {
    /// Number of nodes in this subtree, including this one.
    pub fn len(&self) -> usize {
        1 + self.children.iter().map(Node::len).sum::<usize>()
    }

    pub fn as_code(&self) -> Option<&Code> {
        match &self.kind {
            NodeKind::Code(code) => Some(code),
            _ => None,
        }
    }

    pub fn as_element(&self) -> Option<&ElementLine> {
        match &self.kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }
}

/// Node variants.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Plain text, including escaped (`\`) and outer-strip (`>`) lines.
    Text(Text),

    /// `!!! keyword`
    Doctype(String),

    /// `%tag#id.class(...)` and friends.
    Element(ElementLine),

    /// `/ text` or `/[condition]`
    HtmlComment(Comment),

    /// `-# text`. Renders to nothing; its nested block is never parsed.
    HamlComment,

    /// `= expression` or `>= expression`
    Eval(Text),

    /// `- keyword expression`
    Code(Code),

    /// `:plain`, `:escaped`, `:cdata`, `:javascript`, `:css`
    Filter(Filter),
}

/// Text content with an optional outer-strip request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Text {
    pub text: String,
    pub outer_strip: bool,
}

/// An HTML comment. `condition` is set for `/[if IE]` forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub condition: Option<String>,
    pub text: String,
}

/// A control line split into its keyword and the rest of the line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Code {
    pub keyword: String,
    pub expression: String,
}

impl Code {
    /// Split `for item in items` into `for` and `item in items`.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let (keyword, expression) = text
            .split_once(char::is_whitespace)
            .unwrap_or((text, ""));
        Some(Self {
            keyword: keyword.to_string(),
            expression: expression.trim().to_string(),
        })
    }
}

/// A filter block and its verbatim body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub kind: FilterKind,
    /// Body lines as written in the source, trailing whitespace removed.
    pub body: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    Plain,
    Escaped,
    Cdata,
    Javascript,
    Css,
}

/// A node seen from inside its parent's child list.
#[derive(Debug, Clone, Copy)]
pub struct Siblings<'a> {
    nodes: &'a [Node],
    index: usize,
}

impl<'a> Siblings<'a> {
    /// View `nodes[index]`. Returns `None` when `index` is out of range.
    pub fn new(nodes: &'a [Node], index: usize) -> Option<Self> {
        (index < nodes.len()).then_some(Self { nodes, index })
    }

    pub fn node(&self) -> &'a Node {
        &self.nodes[self.index]
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// The sibling `offset` positions away: negative looks left, positive
    /// looks right. Offset 0 is not a sibling.
    pub fn get(&self, offset: isize) -> Option<&'a Node> {
        self.step(offset).map(|s| s.node())
    }

    /// Move the view `offset` positions along the sibling list.
    pub fn step(&self, offset: isize) -> Option<Self> {
        if offset == 0 {
            return None;
        }
        let index = self.index.checked_add_signed(offset)?;
        Self::new(self.nodes, index)
    }

    pub fn next(&self) -> Option<&'a Node> {
        self.get(1)
    }

    pub fn previous(&self) -> Option<&'a Node> {
        self.get(-1)
    }

    /// Siblings to the left, nearest first.
    pub fn left(&self) -> impl Iterator<Item = &'a Node> {
        self.nodes[..self.index].iter().rev()
    }

    /// Siblings to the right, nearest first.
    pub fn right(&self) -> &'a [Node] {
        &self.nodes[self.index + 1..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text_node(text: &str) -> Node {
        Node {
            kind: NodeKind::Text(Text {
                text: text.into(),
                outer_strip: false,
            }),
            source: text.into(),
            line: 1,
            depth: 0,
            children: Vec::new(),
        }
    }

    // =========================================================================
    // Code
    // =========================================================================

    #[test]
    fn test_code_keyword_and_expression() {
        let code = Code::parse("for item in items").unwrap();
        assert_eq!(code.keyword, "for");
        assert_eq!(code.expression, "item in items");
    }

    #[test]
    fn test_code_keyword_only() {
        let code = Code::parse("else").unwrap();
        assert_eq!(code.keyword, "else");
        assert_eq!(code.expression, "");
    }

    #[test]
    fn test_code_extra_whitespace() {
        let code = Code::parse("  if   x > 1  ").unwrap();
        assert_eq!(code.keyword, "if");
        assert_eq!(code.expression, "x > 1");
    }

    #[test]
    fn test_code_empty() {
        assert_eq!(Code::parse("   "), None);
    }

    // =========================================================================
    // Siblings
    // =========================================================================

    #[test]
    fn test_siblings_lookup() {
        let nodes = vec![text_node("a"), text_node("b"), text_node("c")];
        let b = Siblings::new(&nodes, 1).unwrap();
        assert_eq!(b.node().source, "b");
        assert_eq!(b.previous().unwrap().source, "a");
        assert_eq!(b.next().unwrap().source, "c");
        assert!(b.get(0).is_none());
        assert!(b.get(2).is_none());
        assert!(b.get(-2).is_none());
    }

    #[test]
    fn test_siblings_left_nearest_first() {
        let nodes = vec![text_node("a"), text_node("b"), text_node("c")];
        let c = Siblings::new(&nodes, 2).unwrap();
        let left: Vec<_> = c.left().map(|n| n.source.as_str()).collect();
        assert_eq!(left, vec!["b", "a"]);
        assert!(c.right().is_empty());
    }

    #[test]
    fn test_siblings_out_of_range() {
        let nodes = vec![text_node("a")];
        assert!(Siblings::new(&nodes, 1).is_none());
    }

    #[test]
    fn test_document_len_counts_descendants() {
        let mut parent = text_node("p");
        parent.children.push(text_node("c"));
        let doc = Document {
            nodes: vec![parent, text_node("q")],
        };
        assert_eq!(doc.len(), 3);
        assert!(!doc.is_empty());
    }
}
