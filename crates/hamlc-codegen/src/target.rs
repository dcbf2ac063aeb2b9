//! Target backends.
//!
//! A backend maps control lines (`- if x`) and evaluated expressions (`= x`)
//! to the syntax of one downstream template engine. Most of that mapping is a
//! static [`Rule`] table; backends that need a structural rewrite override
//! [`Target::block`].

use std::fmt;
use std::str::FromStr;

use hamlc_parser::{Code, Node, NodeKind, Siblings};
use serde::Deserialize;

use crate::CodegenError;

/// Open template used when a keyword has no rule or the rule has no opener.
const DEFAULT_OPEN: &str = "{keyword} {expression}";

/// How one control keyword renders.
///
/// `open` and `close` are templates over `{keyword}` and `{expression}`;
/// a close template may also use `{head}`, the terminator of the chain the
/// keyword continues (`for ... else` closes like `for`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    pub keyword: &'static str,
    pub open: Option<&'static str>,
    pub close: Option<&'static str>,
    /// Keywords that, as the next sibling, continue this block instead of
    /// letting it close.
    pub continuation: &'static [&'static str],
}

impl Rule {
    const fn closed(keyword: &'static str, close: &'static str) -> Self {
        Self {
            keyword,
            open: None,
            close: Some(close),
            continuation: &[],
        }
    }

    const fn chained(
        keyword: &'static str,
        close: &'static str,
        continuation: &'static [&'static str],
    ) -> Self {
        Self {
            keyword,
            open: None,
            close: Some(close),
            continuation,
        }
    }

    const fn bare(keyword: &'static str) -> Self {
        Self {
            keyword,
            open: None,
            close: None,
            continuation: &[],
        }
    }

    const fn with_open(mut self, open: &'static str) -> Self {
        self.open = Some(open);
        self
    }
}

/// Rendered open and close lines of one control block. Either may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockOutput {
    pub open: String,
    pub close: String,
}

/// A target template dialect.
pub trait Target {
    /// Short lowercase name, also used in cache keys.
    fn name(&self) -> &'static str;

    /// Wrap a control statement in the dialect's statement delimiters.
    fn control(&self, statement: &str) -> String;

    /// Wrap an expression in the dialect's output delimiters.
    fn eval(&self, expression: &str) -> String;

    fn rules(&self) -> &'static [Rule];

    fn rule(&self, keyword: &str) -> Option<&'static Rule> {
        self.rules().iter().find(|rule| rule.keyword == keyword)
    }

    /// Render the control line at `siblings.node()`.
    fn block(&mut self, siblings: Siblings<'_>, code: &Code) -> Result<BlockOutput, CodegenError> {
        rule_block(self, siblings, code)
    }
}

/// Table-driven block rendering shared by every backend.
pub fn rule_block<T: Target + ?Sized>(
    target: &T,
    siblings: Siblings<'_>,
    code: &Code,
) -> Result<BlockOutput, CodegenError> {
    let rule = target.rule(&code.keyword);

    let open = fill(rule.and_then(|r| r.open).unwrap_or(DEFAULT_OPEN), code);
    let open = target.control(open.trim());

    let close = match rule.and_then(|r| r.close) {
        Some(close) if !continues(rule, siblings) => {
            let close = if close.contains("{head}") {
                let head = chain_terminator(target, siblings).ok_or_else(|| CodegenError::Target {
                    message: format!("`{}` does not continue an open block", code.keyword),
                    line: siblings.node().line,
                })?;
                close.replace("{head}", head)
            } else {
                close.to_string()
            };
            target.control(&fill(&close, code))
        }
        _ => String::new(),
    };

    Ok(BlockOutput { open, close })
}

fn fill(template: &str, code: &Code) -> String {
    template
        .replace("{keyword}", &code.keyword)
        .replace("{expression}", &code.expression)
}

/// Language comments render to nothing and do not break a chain.
fn is_chain_link(node: &Node) -> bool {
    !matches!(node.kind, NodeKind::HamlComment)
}

/// Whether the next sibling is a control line that continues `rule`.
fn continues(rule: Option<&Rule>, siblings: Siblings<'_>) -> bool {
    let Some(rule) = rule else {
        return false;
    };
    siblings
        .right()
        .iter()
        .find(|node| is_chain_link(node))
        .and_then(|node| node.as_code())
        .is_some_and(|next| rule.continuation.contains(&next.keyword.as_str()))
}

/// The close of the block that opened the chain ending at `siblings`, or
/// `None` when nothing to the left opens one.
///
/// Walks left over control lines that continue their left neighbour until
/// one that does not; that one heads the chain.
fn chain_terminator<T: Target + ?Sized>(target: &T, siblings: Siblings<'_>) -> Option<&'static str> {
    let continued = siblings.node().as_code()?;
    let mut head = None;
    let mut current = continued;

    for node in siblings.left().filter(|node| is_chain_link(node)) {
        let Some(code) = node.as_code() else {
            break;
        };
        let Some(rule) = target.rule(&code.keyword) else {
            break;
        };
        if !rule.continuation.contains(&current.keyword.as_str()) {
            break;
        }
        head = Some(rule);
        current = code;
    }

    head.and_then(|rule| rule.close)
        .filter(|close| !close.contains("{head}"))
}

// =========================================================================
// Backends
// =========================================================================

/// Identity backend: control lines and expressions are emitted as written.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTarget;

impl Target for DefaultTarget {
    fn name(&self) -> &'static str {
        "default"
    }

    fn control(&self, statement: &str) -> String {
        statement.to_string()
    }

    fn eval(&self, expression: &str) -> String {
        expression.to_string()
    }

    fn rules(&self) -> &'static [Rule] {
        &[]
    }
}

const TORNADO_RULES: &[Rule] = &[
    Rule::closed("for", "end"),
    Rule::closed("while", "end"),
    Rule::chained("if", "end", &["elif", "else"]),
    Rule::chained("elif", "end", &["elif", "else"]),
    Rule::closed("else", "end"),
    Rule::chained("try", "end", &["except", "else", "finally"]),
    Rule::chained("except", "end", &["except", "else", "finally"]),
    Rule::closed("finally", "end"),
    Rule::closed("block", "end"),
    Rule::closed("apply", "end"),
    Rule::bare("set"),
    Rule::bare("extends"),
    Rule::bare("include"),
    Rule::bare("import"),
    Rule::bare("from"),
    Rule::bare("module"),
];

/// Tornado templates: `{% ... %}` statements closed by `{% end %}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Tornado;

impl Target for Tornado {
    fn name(&self) -> &'static str {
        "tornado"
    }

    fn control(&self, statement: &str) -> String {
        format!("{{% {statement} %}}")
    }

    fn eval(&self, expression: &str) -> String {
        format!("{{{{ {expression} }}}}")
    }

    fn rules(&self) -> &'static [Rule] {
        TORNADO_RULES
    }
}

const JINJA_RULES: &[Rule] = &[
    Rule::chained("for", "endfor", &["else"]),
    Rule::chained("if", "endif", &["elif", "else"]),
    Rule::chained("elif", "endif", &["elif", "else"]),
    Rule::closed("else", "{head}"),
    Rule::closed("block", "endblock"),
    Rule::closed("macro", "endmacro"),
    Rule::closed("call", "endcall"),
    Rule::closed("filter", "endfilter"),
    Rule::closed("with", "endwith"),
    Rule::bare("set"),
    Rule::bare("extends"),
    Rule::bare("include"),
    Rule::bare("import"),
    Rule::bare("from"),
];

/// Jinja templates: `{% ... %}` statements with `end<keyword>` terminators.
#[derive(Debug, Clone, Copy, Default)]
pub struct Jinja;

impl Target for Jinja {
    fn name(&self) -> &'static str {
        "jinja"
    }

    fn control(&self, statement: &str) -> String {
        format!("{{% {statement} %}}")
    }

    fn eval(&self, expression: &str) -> String {
        format!("{{{{ {expression} }}}}")
    }

    fn rules(&self) -> &'static [Rule] {
        JINJA_RULES
    }
}

const UNDERSCORE_RULES: &[Rule] = &[
    Rule::closed("for", "}"),
    Rule::chained("if", "}", &["elif", "else"]).with_open("if ({expression}) {"),
    Rule::chained("elif", "}", &["elif", "else"]).with_open("} else if ({expression}) {"),
    Rule::closed("else", "}").with_open("} else {"),
    Rule::bare("set").with_open("var {expression};"),
];

/// Underscore.js templates: JavaScript statements inside `<% ... %>`.
///
/// `for item in items` has no JavaScript equivalent and is rewritten into an
/// index loop. Each rewritten loop gets its own counter variables, numbered
/// per backend instance.
#[derive(Debug, Clone, Default)]
pub struct Underscore {
    loops: usize,
}

impl Underscore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Target for Underscore {
    fn name(&self) -> &'static str {
        "underscore"
    }

    fn control(&self, statement: &str) -> String {
        format!("<% {statement} %>")
    }

    fn eval(&self, expression: &str) -> String {
        format!("<%= {expression} %>")
    }

    fn rules(&self) -> &'static [Rule] {
        UNDERSCORE_RULES
    }

    fn block(&mut self, siblings: Siblings<'_>, code: &Code) -> Result<BlockOutput, CodegenError> {
        if code.keyword != "for" {
            return rule_block(self, siblings, code);
        }

        let Some((var, collection)) = code.expression.split_once(" in ") else {
            return Err(CodegenError::Target {
                message: format!(
                    "Expected `<name> in <collection>` after `for`, got `{}`",
                    code.expression
                ),
                line: siblings.node().line,
            });
        };
        let (var, collection) = (var.trim(), collection.trim());

        self.loops += 1;
        let n = self.loops;

        Ok(BlockOutput {
            open: self.control(&format!(
                "for (var _i{n}=0,_length{n}={collection}.length;_i{n}<_length{n};_i{n}++){{var {var}={collection}[_i{n}];"
            )),
            close: self.control("}"),
        })
    }
}

// =========================================================================
// Target selection
// =========================================================================

/// Backend selector, as named in options and on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    #[default]
    Default,
    Tornado,
    Jinja,
    Underscore,
}

impl TargetKind {
    pub const ALL: [TargetKind; 4] = [
        TargetKind::Default,
        TargetKind::Tornado,
        TargetKind::Jinja,
        TargetKind::Underscore,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TargetKind::Default => "default",
            TargetKind::Tornado => "tornado",
            TargetKind::Jinja => "jinja",
            TargetKind::Underscore => "underscore",
        }
    }

    /// A fresh backend instance; per-compile state starts empty.
    pub fn create(self) -> Box<dyn Target> {
        match self {
            TargetKind::Default => Box::new(DefaultTarget),
            TargetKind::Tornado => Box::new(Tornado),
            TargetKind::Jinja => Box::new(Jinja),
            TargetKind::Underscore => Box::new(Underscore::new()),
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unknown target name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown target `{0}` (expected one of: default, tornado, jinja, underscore)")]
pub struct UnknownTarget(pub String);

impl FromStr for TargetKind {
    type Err = UnknownTarget;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TargetKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownTarget(s.to_string()))
    }
}
