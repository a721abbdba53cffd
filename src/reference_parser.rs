//! Text construction of references from identifiers.
//!
//! Identifiers that match no shape become [`Reference::Invalid`]; parsing
//! never fails. Bare back-references (`` `0 ``, `` ``0 ``) are resolved
//! against an explicit [`GenericContext`], which a caller sets per
//! resolution pass through a [`ResolutionSession`].

use tracing::debug;

use crate::grammar::{
    self, ARRAY_BOUNDS, MEMBER_NAME, METHOD_BACKREF, NAMESPACE_ID, SIMPLE_TYPE_PATH, TYPE_BACKREF,
};
use crate::reference::{
    MemberReference, NamespaceReference, Reference, SimpleTypeReference, Specialization, SpecializedTypeReference,
    TemplateTypeReference, TypeReference,
};

/// The generic type and method that bare back-references point into.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenericContext {
    /// Identifier of the enclosing generic method (`M:...`).
    pub member: Option<String>,
    /// Identifier of the enclosing generic type (`T:...`).
    pub type_id: Option<String>,
}

impl GenericContext {
    /// No enclosing generics; back-references do not resolve.
    pub const fn none() -> Self {
        return Self {
            member: None,
            type_id: None,
        };
    }

    /// Inside the generic type `type_id`.
    pub fn for_type(type_id: &str) -> Self {
        return Self {
            member: None,
            type_id: Some(type_id.to_string()),
        };
    }

    /// Inside the generic method `member_id` declared on `type_id`.
    pub fn for_member(type_id: &str, member_id: &str) -> Self {
        return Self {
            member: Some(member_id.to_string()),
            type_id: Some(type_id.to_string()),
        };
    }

    /// Context implied by the identifier a reference was written against:
    /// a type is its own context, a member contributes itself and the
    /// definition of its declaring type.
    pub fn from_cref(cref: &str) -> Self {
        if let Some(path) = cref.strip_prefix("T:") {
            return Self::for_type(&definition_id(path).unwrap_or_else(|| return cref.to_string()));
        }
        let Some(parts) = grammar::decompose_member_id(cref) else {
            return Self::none();
        };
        let Some(type_id) = definition_id(parts.type_path) else {
            return Self::none();
        };
        return Self::for_member(&type_id, cref);
    }
}

/// Type identifier of the generic definition behind a possibly specialized
/// type path.
fn definition_id(path: &str) -> Option<String> {
    if !path.contains('{') {
        return Some(format!("T:{path}"));
    }
    let specialized = parse_specialized(path, &GenericContext::none())?;
    return specialized.innermost_template().map(|t| return t.id.clone());
}

/// Scoped holder of the generic context for one resolution pass.
#[derive(Debug, Default)]
pub struct ResolutionSession {
    /// Context applied to bare back-references.
    context: GenericContext,
}

impl ResolutionSession {
    /// Session with no generic context.
    pub fn new() -> Self {
        return Self::default();
    }

    /// Set the context for subsequent parses.
    pub fn set_context(&mut self, context: GenericContext) {
        self.context = context;
    }

    /// Forget the current context.
    pub fn clear_context(&mut self) {
        self.context = GenericContext::none();
    }

    /// Current context.
    pub const fn context(&self) -> &GenericContext {
        return &self.context;
    }

    /// Parse `api` under the current context.
    pub fn parse(&self, api: &str) -> Reference {
        return parse_reference(api, &self.context);
    }
}

/// Parse an identifier into a reference.
pub fn parse_reference(api: &str, context: &GenericContext) -> Reference {
    let parsed = match api.split_once(':') {
        Some(("N", _)) => parse_namespace(api),
        Some(("T", path)) => parse_type(path, context).map(Reference::Type),
        Some(("M" | "P" | "F" | "E", _)) => parse_member(api, context).map(Reference::Member),
        _ if api.starts_with('`') => parse_type(api, context).map(Reference::Type),
        _ => None,
    };
    return match parsed {
        Some(reference) => reference,
        None => {
            debug!(identifier = api, "identifier matches no grammar shape");
            Reference::Invalid(api.to_string())
        },
    };
}

/// Parse type text (no `T:` tag) into a type reference.
pub fn parse_type(text: &str, context: &GenericContext) -> Option<TypeReference> {
    if let Some(inner) = text.strip_suffix('*') {
        return Some(TypeReference::Pointer(Box::new(parse_type(inner, context)?)));
    }
    if let Some(inner) = text.strip_suffix('@') {
        return Some(TypeReference::Reference(Box::new(parse_type(inner, context)?)));
    }
    if text.ends_with(']') {
        let open = text.rfind('[')?;
        let bounds = text.get(open.saturating_add(1)..text.len().saturating_sub(1))?;
        if !ARRAY_BOUNDS.is_match(bounds) {
            return None;
        }
        let commas = bounds.matches(',').count();
        let rank = u32::try_from(commas.saturating_add(1)).ok()?;
        return Some(TypeReference::Array {
            element: Box::new(parse_type(text.get(..open)?, context)?),
            rank,
        });
    }
    if let Some(captures) = METHOD_BACKREF.captures(text) {
        let index = captures.get(1)?.as_str().parse().ok()?;
        return Some(TypeReference::Template(TemplateTypeReference::Indexed {
            index,
            template_id: context.member.clone()?,
        }));
    }
    if let Some(captures) = TYPE_BACKREF.captures(text) {
        let index = captures.get(1)?.as_str().parse().ok()?;
        return Some(TypeReference::Template(TemplateTypeReference::Indexed {
            index,
            template_id: context.type_id.clone()?,
        }));
    }
    if text.contains('{') {
        return parse_specialized(text, context).map(TypeReference::Specialized);
    }
    if SIMPLE_TYPE_PATH.is_match(text) {
        return Some(TypeReference::Simple(SimpleTypeReference::new(&format!("T:{text}"))));
    }
    return None;
}

/// Parse `N.Outer{A}.Middle.Inner{B}` into one specialization per braced
/// level. Unbraced segments join the next level's template path; a
/// trailing unbraced run becomes a level with no arguments.
pub fn parse_specialized(text: &str, context: &GenericContext) -> Option<SpecializedTypeReference> {
    let mut specializations = Vec::new();
    let mut template_path = String::new();
    let mut rest = text;

    while !rest.is_empty() {
        if !template_path.is_empty() {
            rest = rest.strip_prefix('.')?;
        }
        let (run, arguments, remainder) = match grammar::find_top_level(rest, '{') {
            Some(open) => {
                let close = grammar::matching_close(rest, open)?;
                let inner = rest.get(open.saturating_add(1)..close)?;
                let arguments = grammar::split_top_level(inner)
                    .into_iter()
                    .map(|argument| return parse_type(argument, context))
                    .collect::<Option<Vec<_>>>()?;
                (rest.get(..open)?, arguments, rest.get(close.saturating_add(1)..)?)
            },
            None => (rest, Vec::new(), ""),
        };
        if !SIMPLE_TYPE_PATH.is_match(run) || run.contains('`') {
            return None;
        }
        if !template_path.is_empty() {
            template_path.push('.');
        }
        template_path.push_str(run);
        if !arguments.is_empty() {
            template_path.push_str(&format!("`{}", arguments.len()));
        }
        specializations.push(Specialization {
            arguments,
            template: SimpleTypeReference::new(&format!("T:{template_path}")),
        });
        rest = remainder;
    }

    if specializations.is_empty() {
        return None;
    }
    return Some(SpecializedTypeReference { specializations });
}

/// Parse a namespace identifier.
fn parse_namespace(api: &str) -> Option<Reference> {
    if !NAMESPACE_ID.is_match(api) {
        return None;
    }
    return Some(Reference::Namespace(NamespaceReference { id: api.to_string() }));
}

/// Parse a member identifier.
///
/// Members of plain types stay simple references to the identifier as
/// written. Members reached through a generic instantiation are split into
/// the instantiation and either the definition member or, when a parameter
/// list is present, the resolved parameter types. Type back-references in
/// the instantiation and in the parameter list bind to `context`, since
/// the definition's own parameters are already substituted there.
fn parse_member(api: &str, context: &GenericContext) -> Option<MemberReference> {
    let parts = grammar::decompose_member_id(api)?;
    if !MEMBER_NAME.is_match(parts.name) {
        return None;
    }

    if parts.type_path.contains('{') {
        let specialized = parse_specialized(parts.type_path, context)?;
        let template = specialized.innermost_template()?.path().to_string();
        let member_context = GenericContext {
            member: Some(format!("{}:{template}.{}", parts.prefix, parts.name)),
            type_id: context.type_id.clone(),
        };
        return match parts.parameters {
            None => Some(MemberReference::Specialized {
                template_member: format!("{}:{template}.{}", parts.prefix, parts.name),
                specialized_type: specialized,
            }),
            Some(list) => {
                let parameter_types = parse_parameter_list(list, &member_context)?;
                Some(MemberReference::SpecializedWithParameters {
                    member_name: parts.name.to_string(),
                    parameter_types,
                    prefix: parts.prefix,
                    specialized_type: specialized,
                })
            },
        };
    }

    if !SIMPLE_TYPE_PATH.is_match(parts.type_path) || !grammar::is_balanced(api) {
        return None;
    }
    return Some(MemberReference::Simple { id: api.to_string() });
}

/// Parse a comma-separated parameter type list; `()` is empty.
fn parse_parameter_list(list: &str, context: &GenericContext) -> Option<Vec<TypeReference>> {
    if list.is_empty() {
        return Some(Vec::new());
    }
    return grammar::split_top_level(list)
        .into_iter()
        .map(|parameter| return parse_type(parameter, context))
        .collect();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simple(id: &str) -> TypeReference {
        return TypeReference::Simple(SimpleTypeReference::new(id));
    }

    #[test]
    fn parses_namespaces_and_plain_types() {
        let none = GenericContext::none();
        assert_eq!(
            parse_reference("N:System.Collections", &none),
            Reference::Namespace(NamespaceReference {
                id: "N:System.Collections".to_string()
            })
        );
        assert_eq!(parse_reference("T:N.Widget", &none), Reference::Type(simple("T:N.Widget")));
        assert_eq!(parse_reference("T:N.Outer`1.Inner`1", &none), Reference::Type(simple("T:N.Outer`1.Inner`1")));
    }

    #[test]
    fn parses_decorations_outermost_last() {
        let reference = parse_reference("T:N.Widget[0:,0:]*", &GenericContext::none());
        let expected = TypeReference::Pointer(Box::new(TypeReference::Array {
            element: Box::new(simple("T:N.Widget")),
            rank: 2,
        }));
        assert_eq!(reference, Reference::Type(expected));
        let Reference::Type(TypeReference::Array { rank, .. }) = parse_reference("T:N.Widget[,,]", &GenericContext::none())
        else {
            panic!("expected array");
        };
        assert_eq!(rank, 3);
    }

    #[test]
    fn parses_nested_specializations() {
        let reference = parse_reference("T:N.Outer{N.A}.Middle.Inner{N.Pair{N.B,N.C}}", &GenericContext::none());
        let Reference::Type(TypeReference::Specialized(specialized)) = reference else {
            panic!("expected specialization");
        };
        let templates: Vec<&str> = specialized.specializations.iter().map(|s| return s.template.id.as_str()).collect();
        assert_eq!(templates, ["T:N.Outer`1", "T:N.Outer`1.Middle.Inner`1"]);
        let last = specialized.specializations.last().unwrap();
        let TypeReference::Specialized(pair) = &last.arguments[0] else {
            panic!("expected nested argument");
        };
        assert_eq!(pair.specializations[0].template.id, "T:N.Pair`2");
    }

    #[test]
    fn trailing_plain_segment_becomes_empty_level() {
        let specialized = parse_specialized("N.Outer{N.A}.Leaf", &GenericContext::none()).unwrap();
        assert_eq!(specialized.specializations.len(), 2);
        assert_eq!(specialized.specializations[1].template.id, "T:N.Outer`1.Leaf");
        assert!(specialized.specializations[1].arguments.is_empty());
        assert_eq!(specialized.identifier_text(), "N.Outer{N.A}.Leaf");
    }

    #[test]
    fn back_references_need_a_context() {
        assert_eq!(parse_reference("`0", &GenericContext::none()), Reference::Invalid("`0".to_string()));

        let mut session = ResolutionSession::new();
        session.set_context(GenericContext::for_member("T:N.Box`1", "M:N.Box`1.Get``1"));
        assert_eq!(
            session.parse("``0"),
            Reference::Type(TypeReference::Template(TemplateTypeReference::Indexed {
                index: 0,
                template_id: "M:N.Box`1.Get``1".to_string(),
            }))
        );
        assert_eq!(
            session.parse("T:N.Box{`0}"),
            parse_reference("T:N.Box{`0}", &GenericContext::for_type("T:N.Box`1"))
        );
        session.clear_context();
        assert!(matches!(session.parse("`0"), Reference::Invalid(_)));
    }

    #[test]
    fn plain_members_keep_their_identifier() {
        for api in [
            "M:N.Widget.#ctor(N.Color)",
            "M:N.Widget.op_Explicit(N.Widget)~System.Int32",
            "M:N.Widget.System#IDisposable#Dispose",
            "P:N.Grid.Item(System.Int32,System.Int32)",
            "F:N.Color.Red",
        ] {
            assert_eq!(
                parse_reference(api, &GenericContext::none()),
                Reference::Member(MemberReference::Simple { id: api.to_string() }),
                "{api}"
            );
        }
    }

    #[test]
    fn members_of_instantiations_split_into_parts() {
        let get = parse_reference("M:N.Box{N.Int32}.Get", &GenericContext::none());
        let Reference::Member(MemberReference::Specialized {
            specialized_type,
            template_member,
        }) = get
        else {
            panic!("expected specialized member");
        };
        assert_eq!(template_member, "M:N.Box`1.Get");
        assert_eq!(specialized_type.specializations[0].arguments, vec![simple("T:N.Int32")]);

        let set = parse_reference("M:N.Box{N.Int32}.Set``1(N.Int32,``0)", &GenericContext::none());
        let Reference::Member(MemberReference::SpecializedWithParameters {
            member_name,
            parameter_types,
            prefix,
            ..
        }) = set
        else {
            panic!("expected specialized member with parameters");
        };
        assert_eq!(prefix, 'M');
        assert_eq!(member_name, "Set``1");
        assert_eq!(
            parameter_types[1],
            TypeReference::Template(TemplateTypeReference::Indexed {
                index: 0,
                template_id: "M:N.Box`1.Set``1".to_string(),
            })
        );
    }

    #[test]
    fn instantiation_arguments_bind_to_the_enclosing_type() {
        let context = GenericContext::for_type("T:N.Outer`1");
        let outer_parameter = TypeReference::Template(TemplateTypeReference::Indexed {
            index: 0,
            template_id: "T:N.Outer`1".to_string(),
        });
        let specialized_type = SpecializedTypeReference {
            specializations: vec![Specialization {
                arguments: vec![outer_parameter.clone()],
                template: SimpleTypeReference::new("T:N.Box`1"),
            }],
        };
        assert_eq!(
            parse_reference("M:N.Box{`0}.Get", &context),
            Reference::Member(MemberReference::Specialized {
                specialized_type: specialized_type.clone(),
                template_member: "M:N.Box`1.Get".to_string(),
            })
        );

        let put = parse_reference("M:N.Box{`0}.Put(`0,``0)", &context);
        assert_eq!(
            put,
            Reference::Member(MemberReference::SpecializedWithParameters {
                member_name: "Put".to_string(),
                parameter_types: vec![
                    outer_parameter,
                    TypeReference::Template(TemplateTypeReference::Indexed {
                        index: 0,
                        template_id: "M:N.Box`1.Put".to_string(),
                    }),
                ],
                prefix: 'M',
                specialized_type,
            })
        );
        assert_eq!(put.to_identifier(), "M:N.Box{`0}.Put(`0,``0)");
        assert!(matches!(parse_reference("M:N.Box{`0}.Get", &GenericContext::none()), Reference::Invalid(_)));
    }

    #[test]
    fn malformed_identifiers_are_invalid() {
        for api in ["X:N.Widget", "T:N..Widget", "T:N.Box{N.A", "T:N.Widget[a]", "M:Widget", "N:Bad Name", "plain"] {
            assert_eq!(
                parse_reference(api, &GenericContext::none()),
                Reference::Invalid(api.to_string()),
                "{api}"
            );
        }
    }

    #[test]
    fn context_from_cref_uses_declaring_definition() {
        let context = GenericContext::from_cref("M:N.Box{N.Int32}.Get``1(``0)");
        assert_eq!(context.type_id.as_deref(), Some("T:N.Box`1"));
        assert_eq!(context.member.as_deref(), Some("M:N.Box{N.Int32}.Get``1(``0)"));
        assert_eq!(GenericContext::from_cref("T:N.Box`1"), GenericContext::for_type("T:N.Box`1"));
        assert_eq!(GenericContext::from_cref("nonsense"), GenericContext::none());
    }

    #[test]
    fn round_trips_text_of_parsed_references() {
        let context = GenericContext::for_member("T:N.Box`1", "M:N.Box`1.Get``1");
        for api in ["T:N.Outer{N.A}.Middle.Inner{N.B}", "T:N.Box{`0[]}@", "M:N.Box{N.Int32}.Get", "T:``0*", "``0"] {
            assert_eq!(parse_reference(api, &context).to_identifier(), api);
        }
    }
}
