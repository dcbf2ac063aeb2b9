//! HTML renderer.
//!
//! Walks the node tree depth first. A parent renders its children first and
//! wraps their joined text in its own markup. Every output line is indented
//! by `INDENT * depth` spaces, whatever the source used.

use hamlc_lexer::INDENT;
use hamlc_parser::{
    Comment, Document, ElementLine, Evaluator, Filter, FilterKind, Node, NodeKind, Siblings,
};

use crate::attributes::{self, xhtml_escape};
use crate::target::Target;
use crate::{CodegenError, Warning};

/// Elements that never have a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "meta", "img", "link", "br", "hr", "input", "area", "param", "col", "base",
];

const DEFAULT_DOCTYPE: &str = r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Transitional//EN" "http://www.w3.org/TR/xhtml1/DTD/xhtml1-transitional.dtd">"#;

const DOCTYPES: &[(&str, &str)] = &[
    ("Strict", r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Strict//EN" "http://www.w3.org/TR/xhtml1/DTD/xhtml1-strict.dtd">"#),
    ("Frameset", r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Frameset//EN" "http://www.w3.org/TR/xhtml1/DTD/xhtml1-frameset.dtd">"#),
    ("5", "<!DOCTYPE html>"),
    ("1.1", r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.1//EN" "http://www.w3.org/TR/xhtml11/DTD/xhtml11.dtd">"#),
    ("Mobile", r#"<!DOCTYPE html PUBLIC "-//WAPFORUM//DTD XHTML Mobile 1.2//EN" "http://www.openmobilealliance.org/tech/DTD/xhtml-mobile12.dtd">"#),
    ("RDFa", r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML+RDFa 1.0//EN" "http://www.w3.org/MarkUp/DTD/xhtml-rdfa-1.dtd">"#),
    ("XML", r#"<?xml version="1.0" encoding="utf-8" ?>"#),
];

/// Look up the doctype line for a `!!!` keyword.
pub fn doctype(keyword: &str) -> &'static str {
    DOCTYPES
        .iter()
        .find(|(name, _)| *name == keyword)
        .map_or(DEFAULT_DOCTYPE, |(_, doctype)| doctype)
}

/// Output of one node.
///
/// `outer_strip` asks the parent's child loop to glue this text to its
/// neighbours with all whitespace between them removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderResult {
    pub text: String,
    pub outer_strip: bool,
}

impl RenderResult {
    fn plain(text: String) -> Self {
        Self {
            text,
            outer_strip: false,
        }
    }
}

pub struct Renderer<'a> {
    target: &'a mut dyn Target,
    evaluator: &'a dyn Evaluator,
    warnings: Vec<Warning>,
}

impl<'a> Renderer<'a> {
    pub fn new(target: &'a mut dyn Target, evaluator: &'a dyn Evaluator) -> Self {
        Self {
            target,
            evaluator,
            warnings: Vec::new(),
        }
    }

    /// Render a whole document. Non-empty output ends with one newline.
    pub fn render(&mut self, document: &Document) -> Result<String, CodegenError> {
        let mut html = self.render_children(&document.nodes)?;
        if !html.is_empty() {
            html.push('\n');
        }
        Ok(html)
    }

    /// Warnings collected so far.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }

    /// Render sibling nodes and join them with newlines, applying
    /// outer-strip requests between neighbours.
    fn render_children(&mut self, nodes: &[Node]) -> Result<String, CodegenError> {
        let mut out = String::new();
        let mut glue_next = false;

        for index in 0..nodes.len() {
            let Some(siblings) = Siblings::new(nodes, index) else {
                break;
            };
            let result = self.render_node(siblings)?;

            if result.outer_strip {
                out.truncate(out.trim_end().len());
                out.push_str(result.text.trim());
                glue_next = true;
                continue;
            }

            let text = if glue_next {
                result.text.trim_start()
            } else {
                result.text.as_str()
            };
            if text.is_empty() {
                continue;
            }
            if !out.is_empty() && !glue_next {
                out.push('\n');
            }
            out.push_str(text);
            glue_next = false;
        }

        Ok(out)
    }

    fn render_node(&mut self, siblings: Siblings<'_>) -> Result<RenderResult, CodegenError> {
        let node = siblings.node();
        let indent = indentation(node.depth);

        tracing::trace!(line = node.line, depth = node.depth, source = %node.source, "rendering node");

        let result = match &node.kind {
            NodeKind::Text(text) => RenderResult {
                text: self.with_children(format!("{indent}{}", text.text), node)?,
                outer_strip: text.outer_strip,
            },
            NodeKind::Eval(text) => {
                let own = format!("{indent}{}", self.target.eval(&text.text));
                RenderResult {
                    text: self.with_children(own, node)?,
                    outer_strip: text.outer_strip,
                }
            }
            NodeKind::Doctype(keyword) => RenderResult::plain(format!("{indent}{}", doctype(keyword))),
            NodeKind::HamlComment => RenderResult::default(),
            NodeKind::HtmlComment(comment) => RenderResult::plain(self.render_comment(comment, node)?),
            NodeKind::Element(element) => self.render_element(element, node)?,
            NodeKind::Code(_) => RenderResult::plain(self.render_code(siblings)?),
            NodeKind::Filter(filter) => RenderResult::plain(render_filter(filter, node.depth)),
        };

        Ok(result)
    }

    /// `own`, followed by the node's rendered children on the next lines.
    fn with_children(&mut self, own: String, node: &Node) -> Result<String, CodegenError> {
        let children = self.render_children(&node.children)?;
        Ok(join_lines([own, children]))
    }

    fn render_element(&mut self, element: &ElementLine, node: &Node) -> Result<RenderResult, CodegenError> {
        let indent = indentation(node.depth);
        let attributes = attributes::render(element, node.line, self.evaluator, &*self.target)?;
        let self_closing = element.self_closing || VOID_ELEMENTS.contains(&element.tag.as_str());

        let open = [element.tag.as_str(), attributes.as_str(), if self_closing { "/" } else { "" }]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        let mut html = format!("{indent}<{open}>");

        if !self_closing {
            let children = self.render_children(&node.children)?;
            let mut content = String::new();
            let mut close_indent = indent.as_str();

            if !element.content.is_empty() {
                if element.evaluate {
                    content.push_str(&self.target.eval(&element.content));
                } else {
                    content.push_str(&element.content);
                }
            }

            if children.is_empty() {
                close_indent = "";
            } else {
                content.push('\n');
                content.push_str(&children);
                content.push('\n');
            }

            if element.inner_strip {
                html.push_str(content.trim());
                close_indent = "";
            } else {
                html.push_str(&content);
            }

            html.push_str(close_indent);
            html.push_str("</");
            html.push_str(&element.tag);
            html.push('>');
        }

        Ok(RenderResult {
            text: html,
            outer_strip: element.outer_strip,
        })
    }

    fn render_comment(&mut self, comment: &Comment, node: &Node) -> Result<String, CodegenError> {
        let indent = indentation(node.depth);
        let (open, close) = match &comment.condition {
            Some(condition) => (format!("<!--[{condition}]>"), "<![endif]-->"),
            None => ("<!--".to_string(), "-->"),
        };

        let children = self.render_children(&node.children)?;
        if children.is_empty() {
            let inner = [open, comment.text.clone(), close.to_string()]
                .into_iter()
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            return Ok(format!("{indent}{inner}"));
        }

        let open = if comment.text.is_empty() {
            open
        } else {
            format!("{open} {}", comment.text)
        };
        Ok(join_lines([
            format!("{indent}{open}"),
            children,
            format!("{indent}{close}"),
        ]))
    }

    fn render_code(&mut self, siblings: Siblings<'_>) -> Result<String, CodegenError> {
        let node = siblings.node();
        let Some(code) = node.as_code() else {
            return Ok(String::new());
        };

        if !self.target.rules().is_empty() && self.target.rule(&code.keyword).is_none() {
            let warning = Warning {
                keyword: code.keyword.clone(),
                line: node.line,
            };
            tracing::warn!(target_name = self.target.name(), "{warning}");
            self.warnings.push(warning);
        }

        let block = self.target.block(siblings, code)?;
        let indent = indentation(node.depth);
        let children = self.render_children(&node.children)?;

        let open = if block.open.is_empty() {
            String::new()
        } else {
            format!("{indent}{}", block.open)
        };
        let close = if block.close.is_empty() {
            String::new()
        } else {
            format!("{indent}{}", block.close)
        };

        Ok(join_lines([open, children, close]))
    }
}

fn indentation(depth: usize) -> String {
    " ".repeat(INDENT * depth)
}

/// Join the non-empty parts with newlines.
fn join_lines<const N: usize>(parts: [String; N]) -> String {
    parts
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Remove up to one indentation unit of leading whitespace.
fn dedent(line: &str) -> &str {
    let mut rest = line;
    for _ in 0..INDENT {
        match rest.strip_prefix(char::is_whitespace) {
            Some(stripped) => rest = stripped,
            None => break,
        }
    }
    rest
}

fn render_filter(filter: &Filter, depth: usize) -> String {
    let indent = indentation(depth);
    let inner = indentation(depth + 1);
    let body: Vec<&str> = filter.body.iter().map(|line| dedent(line)).collect();

    match filter.kind {
        FilterKind::Plain => body.join("\n"),
        FilterKind::Escaped => body
            .iter()
            .map(|line| xhtml_escape(line))
            .collect::<Vec<_>>()
            .join("\n"),
        FilterKind::Cdata => join_lines([
            format!("{indent}<![CDATA["),
            body.join("\n"),
            format!("{indent}]]>"),
        ]),
        FilterKind::Javascript => join_lines([
            format!("{indent}<script type=\"text/javascript\">"),
            format!("{inner}//<![CDATA["),
            body.join("\n"),
            format!("{inner}//]]>"),
            format!("{indent}</script>"),
        ]),
        FilterKind::Css => join_lines([
            format!("{indent}<style type=\"text/css\">"),
            format!("{inner}/*<![CDATA[*/"),
            body.join("\n"),
            format!("{inner}/*]]>*/"),
            format!("{indent}</style>"),
        ]),
    }
}
