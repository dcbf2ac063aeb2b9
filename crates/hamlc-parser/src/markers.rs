//! Line-start markers.
//!
//! The table is ordered: a line is classified by the first entry whose prefix
//! it starts with, so longer markers sharing a first character (`-#` before
//! `-`, `/[` before `/`, `>=` before `>`) must come first.

use crate::ast::FilterKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    HamlComment,
    ConditionalComment,
    HtmlComment,
    Element,
    Code,
    Eval,
    StripEval,
    Doctype,
    Escape,
    StripText,
    Filter(FilterKind),
}

pub const MARKERS: &[(&str, Marker)] = &[
    ("-#", Marker::HamlComment),
    ("/[", Marker::ConditionalComment),
    ("/", Marker::HtmlComment),
    ("%", Marker::Element),
    ("#", Marker::Element),
    (".", Marker::Element),
    ("-", Marker::Code),
    ("=", Marker::Eval),
    (">=", Marker::StripEval),
    ("!!!", Marker::Doctype),
    ("\\", Marker::Escape),
    (">", Marker::StripText),
    (":plain", Marker::Filter(FilterKind::Plain)),
    (":javascript", Marker::Filter(FilterKind::Javascript)),
    (":css", Marker::Filter(FilterKind::Css)),
    (":cdata", Marker::Filter(FilterKind::Cdata)),
    (":escaped", Marker::Filter(FilterKind::Escaped)),
];

/// Classify a trimmed line. Returns the marker and the text after it.
pub fn classify(text: &str) -> Option<(Marker, &str)> {
    MARKERS.iter().find_map(|(prefix, marker)| {
        text.strip_prefix(prefix).map(|rest| (*marker, rest))
    })
}

/// Whether the block under this line is kept as raw text.
pub fn is_verbatim(text: &str) -> bool {
    matches!(
        classify(text),
        Some((Marker::HamlComment | Marker::Filter(_), _))
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn marker(text: &str) -> Option<Marker> {
        classify(text).map(|(m, _)| m)
    }

    #[test]
    fn test_haml_comment_before_code() {
        assert_eq!(marker("-# note"), Some(Marker::HamlComment));
        assert_eq!(marker("- if x"), Some(Marker::Code));
    }

    #[test]
    fn test_conditional_before_plain_comment() {
        assert_eq!(marker("/[if IE]"), Some(Marker::ConditionalComment));
        assert_eq!(marker("/ note"), Some(Marker::HtmlComment));
    }

    #[test]
    fn test_element_markers() {
        assert_eq!(marker("%p"), Some(Marker::Element));
        assert_eq!(marker("#main"), Some(Marker::Element));
        assert_eq!(marker(".box"), Some(Marker::Element));
    }

    #[test]
    fn test_eval_markers() {
        assert_eq!(marker("= name"), Some(Marker::Eval));
        assert_eq!(marker(">= name"), Some(Marker::StripEval));
        assert_eq!(marker("> text"), Some(Marker::StripText));
    }

    #[test]
    fn test_doctype_and_escape() {
        assert_eq!(marker("!!! 5"), Some(Marker::Doctype));
        assert_eq!(marker("\\%p"), Some(Marker::Escape));
    }

    #[test]
    fn test_filters() {
        assert_eq!(marker(":plain"), Some(Marker::Filter(FilterKind::Plain)));
        assert_eq!(
            marker(":javascript"),
            Some(Marker::Filter(FilterKind::Javascript))
        );
        assert_eq!(marker(":css"), Some(Marker::Filter(FilterKind::Css)));
        assert_eq!(marker(":cdata"), Some(Marker::Filter(FilterKind::Cdata)));
        assert_eq!(marker(":escaped"), Some(Marker::Filter(FilterKind::Escaped)));
    }

    #[test]
    fn test_plain_text_has_no_marker() {
        assert_eq!(marker("hello"), None);
        assert_eq!(marker(":unknown"), None);
    }

    #[test]
    fn test_rest_after_marker() {
        assert_eq!(classify("!!! 5"), Some((Marker::Doctype, " 5")));
    }

    #[test]
    fn test_verbatim_lines() {
        assert!(is_verbatim(":plain"));
        assert!(is_verbatim("-# hidden"));
        assert!(!is_verbatim("%p"));
        assert!(!is_verbatim("- if x"));
    }
}
