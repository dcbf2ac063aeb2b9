//! Attribute merging and value formatting for element tags.
//!
//! The id, class and remaining attributes of an element come from up to
//! three places: the `#id.class` shorthand, a `(...)` list, and a `{...}`
//! mapping evaluated by the host [`Evaluator`]. They render in the order
//! `id`, `class`, then everything else in source order.

use std::collections::BTreeSet;

use hamlc_parser::{AttrValue, Attributes, ElementLine, Evaluator, Value};

use crate::target::Target;
use crate::CodegenError;

/// Prefix marking a mapping string value as an expression.
const EXPRESSION_MARKER: char = '=';

/// Delimiters of embedded template syntax; values containing one are not
/// escaped.
const TEMPLATE_DELIMITERS: [&str; 4] = ["#{", "{%", "{{", "<%"];

/// Escape `& < > "` for use in XHTML text and attribute values.
pub fn xhtml_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}

/// Render the attribute text of an element's open tag, without the leading
/// space. Empty when the element has no attributes to show.
pub fn render(
    element: &ElementLine,
    line: usize,
    evaluator: &dyn Evaluator,
    target: &dyn Target,
) -> Result<String, CodegenError> {
    let mut entries = collect(element, line, evaluator)?;
    let format = ValueFormat { target };

    let mut ids = Vec::new();
    format.flatten(&Value::from(element.id.as_str()), &mut ids);
    if let Some(id) = take(&mut entries, "id") {
        format.flatten_entry(&id, &mut ids);
    }

    let mut classes: BTreeSet<String> = element.classes.iter().cloned().collect();
    if let Some(class) = take(&mut entries, "class") {
        let mut extra = Vec::new();
        format.flatten_entry(&class, &mut extra);
        classes.extend(extra);
    }

    let mut parts = Vec::new();
    if !ids.is_empty() {
        parts.push(format!("id=\"{}\"", ids.join("_")));
    }
    if !classes.is_empty() {
        let classes: Vec<String> = classes.into_iter().collect();
        parts.push(format!("class=\"{}\"", classes.join(" ")));
    }
    for (key, entry) in &entries {
        let value = format.entry(entry);
        if !value.is_empty() {
            parts.push(format!("{key}=\"{value}\""));
        }
    }

    Ok(parts.join(" "))
}

/// One attribute value before formatting.
#[derive(Debug, Clone, PartialEq)]
enum Entry {
    /// A value from a `{...}` mapping. Strings starting with `=` are
    /// expressions.
    Mapped(Value),
    /// A quoted or numeric list value, emitted as written.
    Literal(String),
    /// An unquoted list value, emitted through the target's eval syntax.
    Expression(String),
}

/// Gather the attribute clause into ordered key/value entries.
fn collect(
    element: &ElementLine,
    line: usize,
    evaluator: &dyn Evaluator,
) -> Result<Vec<(Value, Entry)>, CodegenError> {
    match &element.attributes {
        Attributes::None => Ok(Vec::new()),

        Attributes::List(pairs) => {
            let mut entries: Vec<(Value, Entry)> = Vec::new();
            for (key, value) in pairs {
                let entry = match value {
                    AttrValue::Literal(s) | AttrValue::Number(s) => Entry::Literal(s.clone()),
                    AttrValue::Expression(expr) => Entry::Expression(expr.clone()),
                };
                let key = Value::from(key.as_str());
                match entries.iter_mut().find(|(k, _)| *k == key) {
                    Some(existing) => existing.1 = entry,
                    None => entries.push((key, entry)),
                }
            }
            Ok(entries)
        }

        Attributes::Mapping(text) => match evaluator.evaluate(text)? {
            Value::Map(entries) => Ok(entries
                .into_iter()
                .map(|(key, value)| (key, Entry::Mapped(value)))
                .collect()),
            other => {
                tracing::debug!(line, kind = other.type_name(), "attribute clause is not a mapping");
                Err(CodegenError::Mapping { line })
            }
        },
    }
}

/// Remove the entry for a string key.
fn take(entries: &mut Vec<(Value, Entry)>, key: &str) -> Option<Entry> {
    let index = entries.iter().position(|(k, _)| k.as_str() == Some(key))?;
    Some(entries.remove(index).1)
}

struct ValueFormat<'a> {
    target: &'a dyn Target,
}

impl ValueFormat<'_> {
    fn entry(&self, entry: &Entry) -> String {
        match entry {
            Entry::Mapped(value) => self.leaf(value),
            Entry::Literal(text) => self.finish(text.clone()),
            Entry::Expression(expr) => self.finish(self.target.eval(expr.trim())),
        }
    }

    /// Format one mapping value. Falsy values format as empty.
    fn leaf(&self, value: &Value) -> String {
        if !value.is_truthy() {
            return String::new();
        }

        let text = match value {
            Value::Str(s) => match s.strip_prefix(EXPRESSION_MARKER) {
                Some(expr) => self.target.eval(expr.trim()),
                None => s.clone(),
            },
            other => other.to_string(),
        };
        self.finish(text)
    }

    /// Values carrying template syntax keep it intact; the rest is escaped.
    fn finish(&self, text: String) -> String {
        if TEMPLATE_DELIMITERS.iter().any(|d| text.contains(d)) {
            text.replace('"', "'")
        } else {
            xhtml_escape(&text)
        }
    }

    fn flatten_entry(&self, entry: &Entry, out: &mut Vec<String>) {
        match entry {
            Entry::Mapped(value) => self.flatten(value, out),
            other => {
                let text = self.entry(other);
                if !text.is_empty() {
                    out.push(text);
                }
            }
        }
    }

    /// Append the formatted, non-empty leaves of `value`, depth first.
    fn flatten(&self, value: &Value, out: &mut Vec<String>) {
        match value {
            Value::List(items) => {
                for item in items {
                    self.flatten(item, out);
                }
            }
            leaf => {
                let text = self.leaf(leaf);
                if !text.is_empty() {
                    out.push(text);
                }
            }
        }
    }
}
