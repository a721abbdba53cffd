//! Declarative namespace → type → member override trees.
//!
//! The same shape backs both the API filter and the attribute filter.
//! Lookups return the most specific override that matched, tagged with the
//! level it came from, so the policy engine can decide how much weight it
//! carries.

use serde::Deserialize;

/// Root of an override tree.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterTree {
    /// Root default when nothing more specific matches.
    #[serde(default = "exposed_by_default")]
    pub expose: bool,
    /// Namespace-level overrides.
    #[serde(default, rename = "namespace")]
    pub namespaces: Vec<NamespaceFilter>,
}

/// Override for one namespace.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NamespaceFilter {
    /// Whether the namespace is exposed.
    pub expose: bool,
    /// Dotted namespace name; empty for the global namespace.
    pub name: String,
    /// Type-level overrides inside the namespace.
    #[serde(default, rename = "type")]
    pub types: Vec<TypeFilter>,
}

/// Override for one type; nested types use their dotted name.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeFilter {
    /// Whether the type is exposed.
    pub expose: bool,
    /// Member-level overrides inside the type.
    #[serde(default, rename = "member")]
    pub members: Vec<MemberFilter>,
    /// Dotted type name, e.g. `Outer.Inner` or `Box<T>`.
    pub name: String,
}

/// Override for one member.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MemberFilter {
    /// Whether the member is exposed.
    pub expose: bool,
    /// Member name, e.g. `Get` or `Get<T>`.
    pub name: String,
}

/// A matched override and the level that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMatch {
    /// Member-level override.
    Member(bool),
    /// Namespace-level override.
    Namespace(bool),
    /// No override matched; carries the root default.
    Root(bool),
    /// Type-level override (possibly inherited from an outer type).
    Type(bool),
}

impl FilterMatch {
    /// The `expose` value regardless of level.
    pub const fn exposed(self) -> bool {
        return match self {
            Self::Member(v) | Self::Namespace(v) | Self::Root(v) | Self::Type(v) => v,
        };
    }
}

/// Default for `expose` attributes that are omitted at the root.
const fn exposed_by_default() -> bool {
    return true;
}

/// A type declaration as the filter sees it: outer-to-inner levels, each a
/// simple name plus its generic parameter names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSubject<'a> {
    /// Outermost level first.
    pub levels: Vec<(&'a str, &'a [String])>,
    /// Dotted namespace name.
    pub namespace: &'a str,
}

impl Default for FilterTree {
    /// Expose everything.
    fn default() -> Self {
        return Self {
            expose: true,
            namespaces: Vec::new(),
        };
    }
}

impl FilterTree {
    /// Override for a namespace.
    pub fn match_namespace(&self, namespace: &str) -> FilterMatch {
        return match self.find_namespace(namespace) {
            Some(filter) => FilterMatch::Namespace(filter.expose),
            None => FilterMatch::Root(self.expose),
        };
    }

    /// Whether `namespace` is hidden outright: its override (or the root
    /// default, when it has none) is `false` and no type override below it
    /// could expose anything.
    pub fn hides_namespace(&self, namespace: &str) -> bool {
        return match self.match_namespace(namespace) {
            FilterMatch::Namespace(exposed) => {
                !exposed && self.find_namespace(namespace).is_some_and(|n| return n.types.is_empty())
            },
            FilterMatch::Root(exposed) => !exposed,
            FilterMatch::Member(_) | FilterMatch::Type(_) => false,
        };
    }

    /// Override for a type. An unmatched nested type inherits the override of
    /// the nearest outer type that has one, walking the outer chain once.
    pub fn match_type(&self, subject: &FilterSubject<'_>) -> FilterMatch {
        let Some(namespace) = self.find_namespace(subject.namespace) else {
            return FilterMatch::Root(self.expose);
        };
        return match find_type_in_chain(namespace, &subject.levels) {
            Some(filter) => FilterMatch::Type(filter.expose),
            None => FilterMatch::Namespace(namespace.expose),
        };
    }

    /// Override for a member of `subject`. Member filters only apply from
    /// the filter of the exact declaring type.
    pub fn match_member(&self, subject: &FilterSubject<'_>, member_name: &str, member_generics: &[String]) -> FilterMatch {
        let Some(namespace) = self.find_namespace(subject.namespace) else {
            return FilterMatch::Root(self.expose);
        };
        if let Some(exact) = find_exact_type(namespace, &subject.levels) {
            let candidates = name_candidates(member_name, member_generics);
            let member = exact
                .members
                .iter()
                .find(|m| return candidates.contains(&normalize_generic_brackets(&m.name)));
            return match member {
                Some(filter) => FilterMatch::Member(filter.expose),
                None => FilterMatch::Type(exact.expose),
            };
        }
        return match find_type_in_chain(namespace, &subject.levels) {
            Some(filter) => FilterMatch::Type(filter.expose),
            None => FilterMatch::Namespace(namespace.expose),
        };
    }

    /// Namespace filter with an exactly matching name.
    fn find_namespace(&self, namespace: &str) -> Option<&NamespaceFilter> {
        return self.namespaces.iter().find(|n| return n.name == namespace);
    }
}

/// Filter for the exact declaring type, or for the nearest outer type.
fn find_type_in_chain<'f>(namespace: &'f NamespaceFilter, levels: &[(&str, &[String])]) -> Option<&'f TypeFilter> {
    let mut depth = levels.len();
    while depth > 0 {
        if let Some(filter) = levels.get(..depth).and_then(|prefix| return find_exact_type(namespace, prefix)) {
            return Some(filter);
        }
        depth = depth.saturating_sub(1);
    }
    return None;
}

/// Filter whose dotted name matches every level of `levels`.
fn find_exact_type<'f>(namespace: &'f NamespaceFilter, levels: &[(&str, &[String])]) -> Option<&'f TypeFilter> {
    if levels.is_empty() {
        return None;
    }
    return namespace.types.iter().find(|t| return type_name_matches(&t.name, levels));
}

/// Compare a dotted filter name against declaration levels, one level per
/// dot-separated part. Each part may be written bare, with a `` `n `` arity
/// or with `<T>`/`{T}` parameter lists.
fn type_name_matches(filter_name: &str, levels: &[(&str, &[String])]) -> bool {
    let normalized = normalize_generic_brackets(filter_name);
    let parts = split_outside_braces(&normalized);
    if parts.len() != levels.len() {
        return false;
    }
    return parts
        .iter()
        .zip(levels)
        .all(|(part, (name, generics))| return name_candidates(name, generics).contains(part));
}

/// Split on `.` that are not inside `{}`.
fn split_outside_braces(text: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0_usize;
    let mut current = String::new();
    for ch in text.chars() {
        match ch {
            '{' => {
                depth = depth.saturating_add(1);
                current.push(ch);
            },
            '}' => {
                depth = depth.saturating_sub(1);
                current.push(ch);
            },
            '.' if depth == 0 => parts.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    parts.push(current);
    return parts;
}

/// Accepted spellings of a possibly generic name.
fn name_candidates(name: &str, generics: &[String]) -> Vec<String> {
    let mut candidates = vec![name.to_string()];
    if !generics.is_empty() {
        candidates.push(format!("{name}`{}", generics.len()));
        candidates.push(format!("{name}``{}", generics.len()));
        candidates.push(format!("{name}{{{}}}", generics.join(",")));
    }
    return candidates;
}

/// Rewrite `<T, U>` as `{T,U}` so both bracket styles compare equal.
pub fn normalize_generic_brackets(name: &str) -> String {
    return name
        .chars()
        .filter(|c| return !c.is_whitespace())
        .map(|c| {
            return match c {
                '<' => '{',
                '>' => '}',
                other => other,
            };
        })
        .collect();
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Tree with conflicting overrides at every level.
    fn conflicting_tree() -> FilterTree {
        return FilterTree {
            expose: true,
            namespaces: vec![NamespaceFilter {
                expose: false,
                name: "N".to_string(),
                types: vec![
                    TypeFilter {
                        expose: true,
                        members: vec![MemberFilter {
                            expose: false,
                            name: "Hidden".to_string(),
                        }],
                        name: "Widget".to_string(),
                    },
                    TypeFilter {
                        expose: false,
                        members: vec![MemberFilter {
                            expose: true,
                            name: "Get<T>".to_string(),
                        }],
                        name: "Box<T>".to_string(),
                    },
                ],
            }],
        };
    }

    #[test]
    fn namespace_is_hidden_only_without_type_overrides() {
        let mut tree = conflicting_tree();
        assert_eq!(tree.match_namespace("N"), FilterMatch::Namespace(false));
        assert_eq!(tree.match_namespace("Other"), FilterMatch::Root(true));
        assert!(!tree.hides_namespace("N"));
        assert!(!tree.hides_namespace("Other"));

        tree.namespaces[0].types.clear();
        assert!(tree.hides_namespace("N"));
        tree.expose = false;
        assert!(tree.hides_namespace("Other"));
    }

    #[test]
    fn member_beats_type_beats_namespace_beats_root() {
        let tree = conflicting_tree();
        let no_generics: Vec<String> = Vec::new();
        let widget = FilterSubject {
            levels: vec![("Widget", no_generics.as_slice())],
            namespace: "N",
        };
        assert_eq!(tree.match_member(&widget, "Hidden", &[]), FilterMatch::Member(false));
        assert_eq!(tree.match_member(&widget, "Shown", &[]), FilterMatch::Type(true));

        let gadget = FilterSubject {
            levels: vec![("Gadget", no_generics.as_slice())],
            namespace: "N",
        };
        assert_eq!(tree.match_type(&gadget), FilterMatch::Namespace(false));

        let elsewhere = FilterSubject {
            levels: vec![("Gadget", no_generics.as_slice())],
            namespace: "M",
        };
        assert_eq!(tree.match_type(&elsewhere), FilterMatch::Root(true));
    }

    #[test]
    fn generic_names_match_either_bracket_style() {
        let tree = conflicting_tree();
        let t = vec!["T".to_string()];
        let boxed = FilterSubject {
            levels: vec![("Box", t.as_slice())],
            namespace: "N",
        };
        assert_eq!(tree.match_type(&boxed), FilterMatch::Type(false));
        assert_eq!(tree.match_member(&boxed, "Get", &t), FilterMatch::Member(true));
        assert_eq!(normalize_generic_brackets("Get<T, U>"), "Get{T,U}");
    }

    #[test]
    fn unmatched_nested_type_walks_outer_chain() {
        let tree = conflicting_tree();
        let none: Vec<String> = Vec::new();
        let nested = FilterSubject {
            levels: vec![("Widget", none.as_slice()), ("Part", none.as_slice()), ("Leaf", none.as_slice())],
            namespace: "N",
        };
        assert_eq!(tree.match_type(&nested), FilterMatch::Type(true));
        assert_eq!(tree.match_member(&nested, "Hidden", &[]), FilterMatch::Type(true));
    }

    #[test]
    fn dotted_filter_names_address_nested_types() {
        let tree = FilterTree {
            expose: true,
            namespaces: vec![NamespaceFilter {
                expose: true,
                name: "N".to_string(),
                types: vec![TypeFilter {
                    expose: false,
                    members: Vec::new(),
                    name: "Outer.Inner".to_string(),
                }],
            }],
        };
        let none: Vec<String> = Vec::new();
        let inner = FilterSubject {
            levels: vec![("Outer", none.as_slice()), ("Inner", none.as_slice())],
            namespace: "N",
        };
        let outer = FilterSubject {
            levels: vec![("Outer", none.as_slice())],
            namespace: "N",
        };
        assert_eq!(tree.match_type(&inner), FilterMatch::Type(false));
        assert_eq!(tree.match_type(&outer), FilterMatch::Namespace(true));
    }
}
