//! Graph construction of references.
//!
//! Every builder here produces exactly the value the text parser produces
//! for the identifier of the same entity, so references coming from the
//! graph and references typed by authors compare equal.

use crate::graph::{MemberId, NamedType, NamespaceId, TypeGraph, TypeId, TypeShape};
use crate::namer;
use crate::reference::{
    MemberReference, NamespaceReference, Parameter, SimpleTypeReference, Specialization, SpecializedTypeReference,
    TemplateTypeReference, TypeReference,
};

/// Reference to a namespace node.
pub fn namespace_reference(graph: &TypeGraph, id: NamespaceId) -> NamespaceReference {
    return NamespaceReference {
        id: namer::namespace_identifier(graph, id),
    };
}

/// Reference to a type declaration.
pub fn type_reference(graph: &TypeGraph, id: TypeId) -> SimpleTypeReference {
    return SimpleTypeReference::new(&namer::type_identifier(graph, id));
}

/// Reference to a declared member.
pub fn member_reference(graph: &TypeGraph, id: MemberId) -> MemberReference {
    return MemberReference::Simple {
        id: namer::member_identifier(graph, id),
    };
}

/// Reference for a signature type. Method generic parameters point at
/// `method_owner` and become bare names when it is absent.
pub fn shape_reference(shape: &TypeShape, method_owner: Option<&str>) -> TypeReference {
    return match shape {
        TypeShape::Array { element, rank } => TypeReference::Array {
            element: Box::new(shape_reference(element, method_owner)),
            rank: *rank,
        },
        TypeShape::ByRef(inner) => TypeReference::Reference(Box::new(shape_reference(inner, method_owner))),
        TypeShape::Generic { arguments, definition } => {
            if definition.total_arity() == 0 {
                return named_reference(definition);
            }
            let arguments: Vec<TypeReference> = arguments.iter().map(|a| return shape_reference(a, method_owner)).collect();
            TypeReference::Specialized(specialize(definition, arguments))
        },
        TypeShape::MethodParameter { index, name } => TypeReference::Template(match method_owner {
            Some(owner) => TemplateTypeReference::Indexed {
                index: *index,
                template_id: owner.to_string(),
            },
            None => TemplateTypeReference::Named(name.clone()),
        }),
        TypeShape::Named(named) => named_reference(named),
        TypeShape::Pointer(inner) => TypeReference::Pointer(Box::new(shape_reference(inner, method_owner))),
        TypeShape::TypeParameter { index, owner, .. } => TypeReference::Template(TemplateTypeReference::Indexed {
            index: *index,
            template_id: format!("T:{}", namer::type_path(owner)),
        }),
    };
}

/// Parameters of a declared member, method parameters pointing at it.
pub fn parameter_references(graph: &TypeGraph, id: MemberId) -> Vec<Parameter> {
    let member = graph.member(id);
    let owner = namer::member_identifier(graph, id);
    return member
        .parameters
        .iter()
        .map(|p| {
            return Parameter {
                name: p.name.clone(),
                parameter_type: shape_reference(&p.shape, Some(&owner)),
            };
        })
        .collect();
}

/// Extension method viewed as an instance method of its first parameter.
/// `None` for members that are not extension methods.
pub fn extension_method_reference(graph: &TypeGraph, id: MemberId) -> Option<MemberReference> {
    let member = graph.member(id);
    if !member.is_extension {
        return None;
    }
    let method_id = namer::member_identifier(graph, id);
    let template_args = (0..member.generic_parameters.len())
        .map(|index| {
            return TypeReference::Template(TemplateTypeReference::Indexed {
                index,
                template_id: method_id.clone(),
            });
        })
        .collect();
    let parameters = parameter_references(graph, id).into_iter().skip(1).collect();
    return Some(MemberReference::ExtensionMethod {
        method_id,
        name: member.name.clone(),
        parameters,
        template_args,
    });
}

/// Reference to `member`, declared on a generic definition, reached through
/// the instantiation `instantiation`. Parameter types have the
/// instantiation's arguments substituted.
///
/// `None` when `instantiation` is not a generic instantiation.
pub fn member_on_instantiation(graph: &TypeGraph, instantiation: &TypeShape, id: MemberId) -> Option<MemberReference> {
    let TypeShape::Generic { arguments, definition } = instantiation else {
        return None;
    };
    let TypeReference::Specialized(specialized_type) = shape_reference(instantiation, None) else {
        return None;
    };
    let member = graph.member(id);
    let prefix = namer::member_prefix(member.kind);
    let member_name = namer::member_name_part(member);
    let template_member = format!("{prefix}:{}.{member_name}", namer::type_path(definition));

    if member.parameters.is_empty() {
        return Some(MemberReference::Specialized {
            specialized_type,
            template_member,
        });
    }
    let parameter_types = member
        .parameters
        .iter()
        .map(|p| return shape_reference(&substitute(&p.shape, definition, arguments), Some(&template_member)))
        .collect();
    return Some(MemberReference::SpecializedWithParameters {
        member_name,
        parameter_types,
        prefix,
        specialized_type,
    });
}

/// Replace parameters of `definition` with the matching `arguments`.
fn substitute(shape: &TypeShape, definition: &NamedType, arguments: &[TypeShape]) -> TypeShape {
    return match shape {
        TypeShape::Array { element, rank } => TypeShape::Array {
            element: Box::new(substitute(element, definition, arguments)),
            rank: *rank,
        },
        TypeShape::ByRef(inner) => TypeShape::ByRef(Box::new(substitute(inner, definition, arguments))),
        TypeShape::Generic {
            arguments: inner_arguments,
            definition: inner_definition,
        } => TypeShape::Generic {
            arguments: inner_arguments.iter().map(|a| return substitute(a, definition, arguments)).collect(),
            definition: inner_definition.clone(),
        },
        TypeShape::Pointer(inner) => TypeShape::Pointer(Box::new(substitute(inner, definition, arguments))),
        TypeShape::TypeParameter { index, owner, .. } if encloses(owner, definition) => {
            arguments.get(*index).cloned().unwrap_or_else(|| return shape.clone())
        },
        TypeShape::MethodParameter { .. } | TypeShape::Named(_) | TypeShape::TypeParameter { .. } => shape.clone(),
    };
}

/// `owner` is `definition` or one of its outer types.
fn encloses(owner: &NamedType, definition: &NamedType) -> bool {
    return owner.namespace == definition.namespace && definition.segments.starts_with(&owner.segments);
}

/// Simple or specialized reference for a named type.
fn named_reference(named: &NamedType) -> TypeReference {
    return TypeReference::Simple(SimpleTypeReference::new(&format!("T:{}", namer::type_path(named))));
}

/// Group `definition`'s segments into levels the way the parser does:
/// unbraced segments join the next generic level, and a trailing run of
/// non-generic segments becomes a level without arguments.
fn specialize(definition: &NamedType, arguments: Vec<TypeReference>) -> SpecializedTypeReference {
    let mut specializations = Vec::new();
    let mut path = String::new();
    let mut run: Vec<String> = Vec::new();
    if !definition.namespace.is_empty() {
        run.push(definition.namespace.clone());
    }
    let mut remaining = arguments.into_iter();
    for segment in &definition.segments {
        run.push(segment.name.clone());
        if segment.arity == 0 {
            continue;
        }
        let level: Vec<TypeReference> = remaining.by_ref().take(segment.arity).collect();
        if !path.is_empty() {
            path.push('.');
        }
        path.push_str(&run.join("."));
        path.push_str(&format!("`{}", level.len()));
        run.clear();
        specializations.push(Specialization {
            arguments: level,
            template: SimpleTypeReference::new(&format!("T:{path}")),
        });
    }
    if !run.is_empty() {
        if !path.is_empty() {
            path.push('.');
        }
        path.push_str(&run.join("."));
        specializations.push(Specialization {
            arguments: Vec::new(),
            template: SimpleTypeReference::new(&format!("T:{path}")),
        });
    }
    return SpecializedTypeReference { specializations };
}
