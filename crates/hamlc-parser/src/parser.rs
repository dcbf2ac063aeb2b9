//! Document parser for hamlc.
//!
//! Turns the block tree from `hamlc-lexer` into a `Document`. Each block's
//! line is classified by its leading marker (see [`markers`](crate::markers))
//! and becomes exactly one [`Node`]; nested blocks become its children.

use crate::ast::{Code, Comment, Document, Filter, Node, NodeKind, Text};
use crate::element::ElementLine;
use crate::markers::{self, Marker};
use crate::ParseError;
use hamlc_lexer::{Block, Scanner};

/// hamlc document parser.
pub struct Parser {
    blocks: Vec<Block>,
}

impl Parser {
    /// Create a parser over an already scanned block tree.
    pub fn new(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    /// Parse source text into a document.
    pub fn parse(source: &str) -> Result<Document, ParseError> {
        let blocks = Scanner::with_verbatim(source, markers::is_verbatim).build();
        Parser::new(blocks).parse_document()
    }

    /// Build the document from the block tree.
    pub fn parse_document(self) -> Result<Document, ParseError> {
        let nodes = self
            .blocks
            .into_iter()
            .map(parse_block)
            .collect::<Result<Vec<_>, _>>()?;

        let document = Document { nodes };
        tracing::debug!(nodes = document.len(), "parsed document");
        Ok(document)
    }
}

/// Build one node and, recursively, its children.
fn parse_block(block: Block) -> Result<Node, ParseError> {
    let Block {
        line,
        depth,
        children,
        body,
    } = block;

    let error = |message: String| ParseError {
        message,
        line: line.number,
        depth,
    };

    let text = line.text.as_str();
    let kind = match markers::classify(text) {
        None => NodeKind::Text(Text {
            text: text.to_string(),
            outer_strip: false,
        }),

        Some((marker, rest)) => match marker {
            Marker::HamlComment => NodeKind::HamlComment,

            Marker::ConditionalComment => {
                let (condition, text) = rest
                    .split_once(']')
                    .ok_or_else(|| error("Expected ']' to close the comment condition".into()))?;
                NodeKind::HtmlComment(Comment {
                    condition: Some(condition.trim().to_string()),
                    text: text.trim().to_string(),
                })
            }

            Marker::HtmlComment => NodeKind::HtmlComment(Comment {
                condition: None,
                text: rest.trim().to_string(),
            }),

            Marker::Element => {
                NodeKind::Element(ElementLine::parse(text).map_err(|e| error(e.to_string()))?)
            }

            Marker::Code => NodeKind::Code(
                Code::parse(rest).ok_or_else(|| error("Expected a keyword after '-'".into()))?,
            ),

            Marker::Eval | Marker::StripEval => NodeKind::Eval(Text {
                text: rest.trim().to_string(),
                outer_strip: marker == Marker::StripEval,
            }),

            Marker::Doctype => NodeKind::Doctype(rest.trim_start_matches('!').trim().to_string()),

            Marker::Escape => NodeKind::Text(Text {
                text: rest.to_string(),
                outer_strip: false,
            }),

            Marker::StripText => NodeKind::Text(Text {
                text: rest.trim().to_string(),
                outer_strip: true,
            }),

            Marker::Filter(kind) => NodeKind::Filter(Filter { kind, body }),
        },
    };

    tracing::trace!(line = line.number, depth, kind = ?kind, "parsed node");

    // Comment bodies are swallowed; filter bodies were captured verbatim.
    let children = match kind {
        NodeKind::HamlComment | NodeKind::Filter(_) => Vec::new(),
        _ => children
            .into_iter()
            .map(parse_block)
            .collect::<Result<Vec<_>, _>>()?,
    };

    Ok(Node {
        kind,
        source: line.text,
        line: line.number,
        depth,
        children,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::FilterKind;
    use crate::element::Attributes;
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> Document {
        Parser::parse(source).unwrap()
    }

    fn first(source: &str) -> NodeKind {
        parse(source).nodes.remove(0).kind
    }

    fn text(text: &str, outer_strip: bool) -> Text {
        Text {
            text: text.into(),
            outer_strip,
        }
    }

    // =========================================================================
    // Structure
    // =========================================================================

    #[test]
    fn test_empty_document() {
        assert!(parse("").is_empty());
        assert!(parse("\n\n  \n").is_empty());
    }

    #[test]
    fn test_nested_depths() {
        let doc = parse("%p\n  %a\n    text\n%q");
        assert_eq!(doc.nodes.len(), 2);
        let p = &doc.nodes[0];
        assert_eq!(p.depth, 0);
        assert_eq!(p.children[0].depth, 1);
        assert_eq!(p.children[0].children[0].depth, 2);
        assert_eq!(doc.len(), 4);
    }

    #[test]
    fn test_line_numbers_skip_blank_lines() {
        let doc = parse("%p\n\n  foo");
        assert_eq!(doc.nodes[0].line, 1);
        assert_eq!(doc.nodes[0].children[0].line, 3);
    }

    #[test]
    fn test_source_is_trimmed_line() {
        let doc = parse("%p\n   %a.link  ");
        assert_eq!(doc.nodes[0].children[0].source, "%a.link");
    }

    #[test]
    fn test_multiline_joined_into_one_node() {
        let doc = parse("%p\n  one |\n  two |\n  three");
        let children = &doc.nodes[0].children;
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].kind, NodeKind::Text(text("one two", false)));
        assert_eq!(children[1].kind, NodeKind::Text(text("three", false)));
    }

    // =========================================================================
    // Marker dispatch
    // =========================================================================

    #[test]
    fn test_plain_text() {
        assert_eq!(first("hello world"), NodeKind::Text(text("hello world", false)));
    }

    #[test]
    fn test_escape_keeps_rest_of_line() {
        assert_eq!(first("\\%p not a tag"), NodeKind::Text(text("%p not a tag", false)));
    }

    #[test]
    fn test_strip_text() {
        assert_eq!(first("> glued"), NodeKind::Text(text("glued", true)));
    }

    #[test]
    fn test_eval() {
        assert_eq!(first("= user.name"), NodeKind::Eval(text("user.name", false)));
        assert_eq!(first(">= user.name"), NodeKind::Eval(text("user.name", true)));
    }

    #[test]
    fn test_doctype() {
        assert_eq!(first("!!! 5"), NodeKind::Doctype("5".into()));
        assert_eq!(first("!!!"), NodeKind::Doctype(String::new()));
        assert_eq!(first("!!!! XML"), NodeKind::Doctype("XML".into()));
    }

    #[test]
    fn test_element() {
        match first("%p.lead{'id': 1} Hello") {
            NodeKind::Element(el) => {
                assert_eq!(el.tag, "p");
                assert_eq!(el.classes, vec!["lead"]);
                assert_eq!(el.attributes, Attributes::Mapping("{'id': 1}".into()));
                assert_eq!(el.content, "Hello");
            }
            other => panic!("expected element, got {other:?}"),
        }
    }

    #[test]
    fn test_code() {
        let doc = parse("- for item in items\n  %li= item");
        let node = &doc.nodes[0];
        let code = node.as_code().unwrap();
        assert_eq!(code.keyword, "for");
        assert_eq!(code.expression, "item in items");
        assert_eq!(node.children.len(), 1);
    }

    #[test]
    fn test_html_comment() {
        assert_eq!(
            first("/ note"),
            NodeKind::HtmlComment(Comment {
                condition: None,
                text: "note".into(),
            })
        );
    }

    #[test]
    fn test_conditional_comment() {
        assert_eq!(
            first("/[if IE]"),
            NodeKind::HtmlComment(Comment {
                condition: Some("if IE".into()),
                text: String::new(),
            })
        );
    }

    #[test]
    fn test_haml_comment_swallows_block() {
        let doc = parse("-# hidden\n  %p{unbalanced\n%q");
        assert_eq!(doc.nodes.len(), 2);
        assert_eq!(doc.nodes[0].kind, NodeKind::HamlComment);
        assert!(doc.nodes[0].children.is_empty());
    }

    #[test]
    fn test_filter_body_is_verbatim() {
        let doc = parse(":plain\n  %p not parsed\n    - nor this\n%q");
        assert_eq!(doc.nodes.len(), 2);
        assert_eq!(
            doc.nodes[0].kind,
            NodeKind::Filter(Filter {
                kind: FilterKind::Plain,
                body: vec!["  %p not parsed".into(), "    - nor this".into()],
            })
        );
        assert!(doc.nodes[0].children.is_empty());
    }

    // =========================================================================
    // Errors
    // =========================================================================

    #[test]
    fn test_unbalanced_mapping_reports_line_and_depth() {
        let err = Parser::parse("%div\n  %p\n    %a{'href': 'x'").unwrap_err();
        assert_eq!(err.line, 3);
        assert_eq!(err.depth, 2);
        assert!(err.message.contains("Unbalanced '{'"));
    }

    #[test]
    fn test_unterminated_quote_in_list() {
        let err = Parser::parse("%a(href='x)").unwrap_err();
        assert_eq!(err.line, 1);
        assert_eq!(err.depth, 0);
    }

    #[test]
    fn test_code_without_keyword() {
        let err = Parser::parse("%p\n  -").unwrap_err();
        assert_eq!(err.message, "Expected a keyword after '-'");
        assert_eq!(err.depth, 1);
    }

    #[test]
    fn test_conditional_comment_without_bracket() {
        let err = Parser::parse("/[if IE").unwrap_err();
        assert!(err.message.contains("']'"));
    }

    #[test]
    fn test_error_display() {
        let err = Parser::parse("%p{").unwrap_err();
        assert!(err
            .to_string()
            .starts_with("Parse error at line 1 (depth 0): Unbalanced '{'"));
    }
}
