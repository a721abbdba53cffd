//! References: structurally comparable descriptors of "a thing pointed to".
//!
//! The variant set is closed. Every consumer matches exhaustively, so a new
//! kind of reference is a compile error at each dispatch point rather than
//! a runtime surprise.

use serde::{Deserialize, Serialize};

use crate::namer::array_suffix;

/// Anything a link can point at.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Reference {
    /// Identifier that matched no grammar shape; renders literally.
    Invalid(String),
    /// A member, possibly on a generic instantiation.
    Member(MemberReference),
    /// A namespace.
    Namespace(NamespaceReference),
    /// A type, possibly decorated or specialized.
    Type(TypeReference),
}

/// A namespace by identifier (`N:...`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NamespaceReference {
    /// Full identifier including the `N:` tag.
    pub id: String,
}

/// An undecorated type by identifier (`T:...`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SimpleTypeReference {
    /// Full identifier including the `T:` tag.
    pub id: String,
}

/// One level of a generic instantiation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Specialization {
    /// Arguments supplied at this level, in order.
    pub arguments: Vec<TypeReference>,
    /// Generic definition of this level, e.g. `T:N.Outer`1.Inner`1`.
    pub template: SimpleTypeReference,
}

/// A generic instantiation; one specialization per nesting level that
/// supplies arguments, outermost first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpecializedTypeReference {
    /// Levels, outermost first.
    pub specializations: Vec<Specialization>,
}

/// A generic parameter in signature position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TemplateTypeReference {
    /// Positional parameter of the generic type or method `template_id`.
    Indexed {
        /// Position in the owner's cumulative parameter list.
        index: usize,
        /// Identifier of the declaring type (`T:`) or method (`M:`).
        template_id: String,
    },
    /// Parameter known only by name.
    Named(String),
    /// Positional parameter of a type given as a type reference.
    TypeTemplate {
        /// Position in the type's cumulative parameter list.
        position: usize,
        /// Declaring type.
        template: SimpleTypeReference,
    },
}

/// Type references.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeReference {
    /// `element[]`, `element[,]`, ...
    Array {
        /// Element type.
        element: Box<TypeReference>,
        /// Number of dimensions.
        rank: u32,
    },
    /// `pointee*`
    Pointer(Box<TypeReference>),
    /// `referent@`
    Reference(Box<TypeReference>),
    /// Plain type.
    Simple(SimpleTypeReference),
    /// Generic instantiation.
    Specialized(SpecializedTypeReference),
    /// Generic parameter.
    Template(TemplateTypeReference),
}

/// A named, typed parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Parameter {
    /// Declared name.
    pub name: String,
    /// Declared type.
    pub parameter_type: TypeReference,
}

/// Member references.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MemberReference {
    /// Extension method shown as an instance method of its first parameter.
    ExtensionMethod {
        /// Identifier of the static declaration.
        method_id: String,
        /// Display name.
        name: String,
        /// Parameters after the extended one.
        parameters: Vec<Parameter>,
        /// Method-level arguments, empty when not generic.
        template_args: Vec<TypeReference>,
    },
    /// A declared member by identifier.
    Simple {
        /// Full identifier (`M:`, `P:`, `F:` or `E:`).
        id: String,
    },
    /// Member of a generic instantiation, found through its definition.
    Specialized {
        /// The instantiation the member is reached through.
        specialized_type: SpecializedTypeReference,
        /// Member identifier on the generic definition.
        template_member: String,
    },
    /// Member of a generic instantiation with its resolved parameter types.
    SpecializedWithParameters {
        /// Name as written in the identifier (`Get``1`, `#ctor`).
        member_name: String,
        /// Resolved parameter types, in order.
        parameter_types: Vec<TypeReference>,
        /// Kind tag (`M`, `P`, `F`, `E`).
        prefix: char,
        /// The instantiation the member is reached through.
        specialized_type: SpecializedTypeReference,
    },
}

impl Reference {
    /// Identifier text for this reference.
    ///
    /// Parsing the result with a matching generic context yields an equal
    /// reference for everything the graph builder produces. Extension
    /// methods render as their declaration's identifier.
    pub fn to_identifier(&self) -> String {
        return match self {
            Self::Invalid(id) => id.clone(),
            Self::Member(member) => member.to_identifier(),
            Self::Namespace(namespace) => namespace.id.clone(),
            Self::Type(ty) => ty.to_identifier(),
        };
    }
}

impl TypeReference {
    /// Identifier of the type: `T:` plus the type text, or the bare
    /// back-reference for generic parameters.
    pub fn to_identifier(&self) -> String {
        return match self {
            Self::Template(_) => self.identifier_text(),
            Self::Array { .. } | Self::Pointer(_) | Self::Reference(_) | Self::Simple(_) | Self::Specialized(_) => {
                format!("T:{}", self.identifier_text())
            },
        };
    }

    /// Type text as written inside argument and parameter lists.
    pub fn identifier_text(&self) -> String {
        return match self {
            Self::Array { element, rank } => format!("{}{}", element.identifier_text(), array_suffix(*rank)),
            Self::Pointer(inner) => format!("{}*", inner.identifier_text()),
            Self::Reference(inner) => format!("{}@", inner.identifier_text()),
            Self::Simple(simple) => simple.path().to_string(),
            Self::Specialized(specialized) => specialized.identifier_text(),
            Self::Template(template) => template.identifier_text(),
        };
    }
}

impl SimpleTypeReference {
    /// Reference to `id`.
    pub fn new(id: &str) -> Self {
        return Self { id: id.to_string() };
    }

    /// Identifier without the `T:` tag.
    pub fn path(&self) -> &str {
        return self.id.strip_prefix("T:").unwrap_or(&self.id);
    }
}

impl SpecializedTypeReference {
    /// `N.Outer{A}.Middle.Inner{B}` style text.
    pub fn identifier_text(&self) -> String {
        let mut out = String::new();
        let mut previous: Option<&str> = None;
        for specialization in &self.specializations {
            let path = specialization.template.path();
            let own = match previous {
                Some(prefix) => {
                    out.push('.');
                    path.strip_prefix(prefix)
                        .and_then(|rest| return rest.strip_prefix('.'))
                        .unwrap_or(path)
                },
                None => path,
            };
            out.push_str(crate::grammar::strip_arity(own));
            if !specialization.arguments.is_empty() {
                let arguments: Vec<String> =
                    specialization.arguments.iter().map(TypeReference::identifier_text).collect();
                out.push('{');
                out.push_str(&arguments.join(","));
                out.push('}');
            }
            previous = Some(path);
        }
        return out;
    }

    /// Definition of the innermost level.
    pub fn innermost_template(&self) -> Option<&SimpleTypeReference> {
        return self.specializations.last().map(|s| return &s.template);
    }
}

impl TemplateTypeReference {
    /// Back-reference text: `` ``n `` for method parameters, `` `n `` for
    /// type parameters, the bare name otherwise.
    pub fn identifier_text(&self) -> String {
        return match self {
            Self::Indexed { index, template_id } if template_id.starts_with("M:") => format!("``{index}"),
            Self::Indexed { index, .. } => format!("`{index}"),
            Self::Named(name) => name.clone(),
            Self::TypeTemplate { position, .. } => format!("`{position}"),
        };
    }
}

impl MemberReference {
    /// Identifier of the member.
    pub fn to_identifier(&self) -> String {
        return match self {
            Self::ExtensionMethod { method_id, .. } => method_id.clone(),
            Self::Simple { id } => id.clone(),
            Self::Specialized {
                specialized_type,
                template_member,
            } => {
                let (prefix, name) = template_member_parts(template_member, specialized_type);
                format!("{prefix}:{}.{name}", specialized_type.identifier_text())
            },
            Self::SpecializedWithParameters {
                member_name,
                parameter_types,
                prefix,
                specialized_type,
            } => {
                let parameters: Vec<String> = parameter_types.iter().map(TypeReference::identifier_text).collect();
                format!(
                    "{prefix}:{}.{member_name}({})",
                    specialized_type.identifier_text(),
                    parameters.join(",")
                )
            },
        };
    }
}

/// Kind tag and name of a definition member, relative to the innermost
/// template of the instantiation it is reached through.
fn template_member_parts<'a>(template_member: &'a str, specialized: &SpecializedTypeReference) -> (&'a str, &'a str) {
    let (prefix, body) = template_member.split_once(':').unwrap_or(("M", template_member));
    let name = specialized
        .innermost_template()
        .and_then(|t| return body.strip_prefix(t.path()))
        .and_then(|rest| return rest.strip_prefix('.'))
        .unwrap_or(body);
    return (prefix, name);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simple(id: &str) -> TypeReference {
        return TypeReference::Simple(SimpleTypeReference::new(id));
    }

    fn nested_instantiation() -> SpecializedTypeReference {
        return SpecializedTypeReference {
            specializations: vec![
                Specialization {
                    arguments: vec![simple("T:N.A")],
                    template: SimpleTypeReference::new("T:N.Outer`1"),
                },
                Specialization {
                    arguments: vec![simple("T:N.B")],
                    template: SimpleTypeReference::new("T:N.Outer`1.Middle.Inner`1"),
                },
            ],
        };
    }

    #[test]
    fn specialized_types_render_each_level_once() {
        let text = nested_instantiation().identifier_text();
        assert_eq!(text, "N.Outer{N.A}.Middle.Inner{N.B}");
    }

    #[test]
    fn decorations_wrap_inner_text() {
        let grid = TypeReference::Pointer(Box::new(TypeReference::Array {
            element: Box::new(simple("T:N.Widget")),
            rank: 2,
        }));
        assert_eq!(grid.to_identifier(), "T:N.Widget[0:,0:]*");
        let by_ref = TypeReference::Reference(Box::new(TypeReference::Template(TemplateTypeReference::Indexed {
            index: 1,
            template_id: "M:N.Box`1.Get``2".to_string(),
        })));
        assert_eq!(by_ref.identifier_text(), "``1@");
    }

    #[test]
    fn specialized_members_render_through_the_instantiation() {
        let get = MemberReference::Specialized {
            specialized_type: nested_instantiation(),
            template_member: "M:N.Outer`1.Middle.Inner`1.Get".to_string(),
        };
        assert_eq!(get.to_identifier(), "M:N.Outer{N.A}.Middle.Inner{N.B}.Get");

        let set = MemberReference::SpecializedWithParameters {
            member_name: "Set".to_string(),
            parameter_types: vec![simple("T:N.B"), simple("T:System.Int32")],
            prefix: 'M',
            specialized_type: nested_instantiation(),
        };
        assert_eq!(set.to_identifier(), "M:N.Outer{N.A}.Middle.Inner{N.B}.Set(N.B,System.Int32)");
    }

    #[test]
    fn top_level_templates_have_no_kind_tag() {
        let template = TypeReference::Template(TemplateTypeReference::Indexed {
            index: 0,
            template_id: "T:N.Box`1".to_string(),
        });
        assert_eq!(Reference::Type(template).to_identifier(), "`0");
    }
}
