//! Identifier grammar primitives shared by the parser, the resolver's
//! fallback rendering and the filter.
//!
//! ```text
//! identifier  := kind ':' path
//! kind        := 'N' | 'T' | 'M' | 'P' | 'F' | 'E'
//! type        := type decoration* | '`' digits | '``' digits
//! decoration  := '[' bounds ']' | '@' | '*'          bounds: [0-9:,]*, rank = commas + 1
//! type path   := segment ('.' segment)*               segment: name ('`' digits)?
//! specialized := segment-run '{' type (',' type)* '}' ('.' segment-run ('{' ... '}')?)*
//! member path := type-path '.' name ('``' digits)? ('(' type (',' type)* ')')? ('~' type)?
//! name        := '#ctor' | '#cctor' | flattened-interface '#' simple | simple
//! ```
//!
//! Commas inside nested `{}` or `[]` never separate top-level arguments,
//! so splitting is done by a depth-counting scanner rather than a regex.

use std::sync::LazyLock;

use regex::Regex;

/// Compile a grammar pattern that is fixed at build time.
#[allow(clippy::expect_used, reason = "patterns are string literals covered by tests")]
fn pattern(source: &str) -> Regex {
    return Regex::new(source).expect("valid regex");
}

/// Dotted type path without specialization or decorations.
pub static SIMPLE_TYPE_PATH: LazyLock<Regex> =
    LazyLock::new(|| return pattern(r"^[\w$<>\-]+(`\d+)?(\.[\w$<>\-]+(`\d+)?)*$"));

/// Namespace identifier; the global namespace is `N:`.
pub static NAMESPACE_ID: LazyLock<Regex> = LazyLock::new(|| return pattern(r"^N:([\w$\-]+(\.[\w$\-]+)*)?$"));

/// Last segment of a member path.
pub static MEMBER_NAME: LazyLock<Regex> =
    LazyLock::new(|| return pattern(r"^#?[\w$<][\w$<>`#{}@,\[\]*:\-]*$"));

/// Contents of an array decoration.
pub static ARRAY_BOUNDS: LazyLock<Regex> = LazyLock::new(|| return pattern(r"^[0-9:,]*$"));

/// Bare type-parameter back-reference.
pub static TYPE_BACKREF: LazyLock<Regex> = LazyLock::new(|| return pattern(r"^`(\d+)$"));

/// Bare method-parameter back-reference.
pub static METHOD_BACKREF: LazyLock<Regex> = LazyLock::new(|| return pattern(r"^``(\d+)$"));

/// Trailing generic arity marker of a segment.
static ARITY_SUFFIX: LazyLock<Regex> = LazyLock::new(|| return pattern(r"`{1,2}\d+$"));

/// The parts of a member identifier, borrowed from the original text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberIdParts<'a> {
    /// Target type of a conversion operator (`~` suffix).
    pub conversion: Option<&'a str>,
    /// Member name, including `#ctor`, EII prefixes and `` ``n `` arity.
    pub name: &'a str,
    /// Text between the parentheses; `None` when there is no list.
    pub parameters: Option<&'a str>,
    /// Kind tag.
    pub prefix: char,
    /// Declaring type path, possibly specialized.
    pub type_path: &'a str,
}

/// Split `text` on commas outside `{}` and `[]`.
///
/// `"A{B{C,D},E},F"` splits into `["A{B{C,D},E}", "F"]`.
pub fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0_usize;
    let mut start = 0_usize;
    for (index, ch) in text.char_indices() {
        match ch {
            '{' | '[' | '(' => depth = depth.saturating_add(1),
            '}' | ']' | ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(text.get(start..index).unwrap_or_default());
                start = index.saturating_add(1);
            },
            _ => {},
        }
    }
    parts.push(text.get(start..).unwrap_or_default());
    return parts;
}

/// Whether every bracket in `text` is closed in the right order.
pub fn is_balanced(text: &str) -> bool {
    let mut stack = Vec::new();
    for ch in text.chars() {
        match ch {
            '{' | '[' | '(' => stack.push(ch),
            '}' => {
                if stack.pop() != Some('{') {
                    return false;
                }
            },
            ']' => {
                if stack.pop() != Some('[') {
                    return false;
                }
            },
            ')' => {
                if stack.pop() != Some('(') {
                    return false;
                }
            },
            _ => {},
        }
    }
    return stack.is_empty();
}

/// Byte index of the bracket closing the one at `open`.
pub fn matching_close(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0_usize;
    for (index, ch) in text.get(open..)?.char_indices() {
        match ch {
            '{' | '[' | '(' => depth = depth.saturating_add(1),
            '}' | ']' | ')' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return open.checked_add(index);
                }
            },
            _ => {},
        }
    }
    return None;
}

/// Byte index of the first `ch` outside any bracket.
pub fn find_top_level(text: &str, wanted: char) -> Option<usize> {
    let mut depth = 0_usize;
    for (index, ch) in text.char_indices() {
        if ch == wanted && depth == 0 {
            return Some(index);
        }
        match ch {
            '{' | '[' | '(' => depth = depth.saturating_add(1),
            '}' | ']' | ')' => depth = depth.saturating_sub(1),
            _ => {},
        }
    }
    return None;
}

/// Byte index of the last `ch` outside any bracket within `text`.
pub fn rfind_top_level(text: &str, wanted: char) -> Option<usize> {
    let mut depth = 0_usize;
    let mut found = None;
    for (index, ch) in text.char_indices() {
        if ch == wanted && depth == 0 {
            found = Some(index);
        }
        match ch {
            '{' | '[' | '(' => depth = depth.saturating_add(1),
            '}' | ']' | ')' => depth = depth.saturating_sub(1),
            _ => {},
        }
    }
    return found;
}

/// Remove a trailing `` `n `` or `` ``n `` arity marker.
pub fn strip_arity(segment: &str) -> &str {
    return match ARITY_SUFFIX.find(segment) {
        Some(found) => segment.get(..found.start()).unwrap_or(segment),
        None => segment,
    };
}

/// Split a member identifier into its parts.
///
/// Returns `None` when the kind tag is not a member kind or the path has no
/// `.` separating the declaring type from the member name.
pub fn decompose_member_id(api: &str) -> Option<MemberIdParts<'_>> {
    let (tag, body) = api.split_once(':')?;
    let prefix = match tag {
        "M" => 'M',
        "P" => 'P',
        "F" => 'F',
        "E" => 'E',
        _ => return None,
    };

    let (body, conversion) = match rfind_top_level(body, '~') {
        Some(tilde) => (body.get(..tilde)?, Some(body.get(tilde.saturating_add(1)..)?)),
        None => (body, None),
    };

    let (path, parameters) = match find_top_level(body, '(') {
        Some(open) => {
            let close = matching_close(body, open)?;
            if close.saturating_add(1) != body.len() {
                return None;
            }
            (body.get(..open)?, Some(body.get(open.saturating_add(1)..close)?))
        },
        None => (body, None),
    };

    // The member name starts after the last top-level dot that precedes the
    // first `#`, so flattened interface names stay in the name.
    let search_end = find_top_level(path, '#').unwrap_or(path.len());
    let dot = rfind_top_level(path.get(..search_end)?, '.')?;
    return Some(MemberIdParts {
        conversion,
        name: path.get(dot.saturating_add(1)..)?,
        parameters,
        prefix,
        type_path: path.get(..dot)?,
    });
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn top_level_split_respects_nesting() {
        assert_eq!(split_top_level("A{B{C,D},E},F"), vec!["A{B{C,D},E}", "F"]);
        assert_eq!(split_top_level("N.Grid[0:,0:],N.Color"), vec!["N.Grid[0:,0:]", "N.Color"]);
        assert_eq!(split_top_level("Single"), vec!["Single"]);
    }

    #[test]
    fn decomposes_constructor_with_parameters() {
        let parts = decompose_member_id("M:N.Widget.#ctor(N.Color)").unwrap();
        assert_eq!(parts.prefix, 'M');
        assert_eq!(parts.type_path, "N.Widget");
        assert_eq!(parts.name, "#ctor");
        assert_eq!(parts.parameters, Some("N.Color"));
        assert_eq!(parts.conversion, None);
    }

    #[test]
    fn decomposes_conversion_operator() {
        let parts = decompose_member_id("M:N.Widget.op_Explicit(N.Widget)~System.Int32").unwrap();
        assert_eq!(parts.name, "op_Explicit");
        assert_eq!(parts.conversion, Some("System.Int32"));
    }

    #[test]
    fn decomposes_explicit_implementation_names() {
        let parts =
            decompose_member_id("M:N.Widget.System#Collections#Generic#IEnumerable{System#String}#GetEnumerator")
                .unwrap();
        assert_eq!(parts.type_path, "N.Widget");
        assert_eq!(parts.name, "System#Collections#Generic#IEnumerable{System#String}#GetEnumerator");
    }

    #[test]
    fn decomposes_specialized_declaring_type() {
        let parts = decompose_member_id("M:N.Box{N.Pair{A.B,C}}.Set(`0)").unwrap();
        assert_eq!(parts.type_path, "N.Box{N.Pair{A.B,C}}");
        assert_eq!(parts.name, "Set");
        assert_eq!(parts.parameters, Some("`0"));
    }

    #[test]
    fn rejects_non_member_kinds_and_bare_names() {
        assert!(decompose_member_id("T:N.Widget").is_none());
        assert!(decompose_member_id("M:Widget").is_none());
        assert!(decompose_member_id("M:N.Widget.Get(A)B").is_none());
    }

    #[test]
    fn strips_arity_markers() {
        assert_eq!(strip_arity("Box`1"), "Box");
        assert_eq!(strip_arity("Get``2"), "Get");
        assert_eq!(strip_arity("Widget"), "Widget");
    }

    #[test]
    fn grammar_patterns_accept_expected_shapes() {
        assert!(SIMPLE_TYPE_PATH.is_match("N.Outer`1.Inner`1"));
        assert!(!SIMPLE_TYPE_PATH.is_match("N..Widget"));
        assert!(NAMESPACE_ID.is_match("N:"));
        assert!(NAMESPACE_ID.is_match("N:System.Collections"));
        assert!(MEMBER_NAME.is_match("#ctor"));
        assert!(MEMBER_NAME.is_match("Get``1"));
        assert!(ARRAY_BOUNDS.is_match("0:,0:"));
        assert!(TYPE_BACKREF.is_match("`3"));
        assert!(METHOD_BACKREF.is_match("``0"));
        assert!(!TYPE_BACKREF.is_match("``0"));
    }

    /// Arbitrary nested argument lists built from a few leaf names.
    fn argument() -> impl Strategy<Value = String> {
        let leaf = prop_oneof![Just("A".to_string()), Just("N.B".to_string()), Just("C`1".to_string())];
        return leaf.prop_recursive(3, 16, 3, |inner| {
            return prop_oneof![
                (Just("G"), proptest::collection::vec(inner.clone(), 1..3))
                    .prop_map(|(name, args)| return format!("{name}{{{}}}", args.join(","))),
                inner.prop_map(|t| return format!("{t}[0:,0:]")),
            ];
        });
    }

    proptest! {
        #[test]
        fn splitting_recovers_every_top_level_argument(args in proptest::collection::vec(argument(), 1..5)) {
            let joined = args.join(",");
            let parts: Vec<String> = split_top_level(&joined).into_iter().map(str::to_string).collect();
            prop_assert_eq!(parts, args);
            prop_assert!(is_balanced(&joined));
        }
    }
}
