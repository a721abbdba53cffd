//! Symbol namer: maps graph nodes to identifiers of the form `<Kind>:<Path>`.
//!
//! ```text
//! N:System.Collections
//! T:N.Outer`1.Inner`1
//! M:N.Widget.#ctor(N.Color)
//! M:N.Box`1.Get``1(`0,``0)
//! M:N.Widget.op_Explicit(N.Widget)~System.Int32
//! M:N.Widget.System#Collections#Generic#IEnumerable{System#String}#GetEnumerator
//! P:N.Grid.Item(System.Int32,System.Int32)
//! ```

use crate::graph::{MemberId, MemberKind, MemberNode, NamedType, NamespaceId, TypeGraph, TypeId, TypeShape};

/// Identifier of a namespace.
pub fn namespace_identifier(graph: &TypeGraph, id: NamespaceId) -> String {
    return format!("N:{}", graph.namespace(id).name);
}

/// Identifier of a type declaration.
pub fn type_identifier(graph: &TypeGraph, id: TypeId) -> String {
    return format!("T:{}", type_path(&graph.named_type(id)));
}

/// Identifier of a member declaration.
pub fn member_identifier(graph: &TypeGraph, id: MemberId) -> String {
    let member = graph.member(id);
    let owner = type_path(&graph.named_type(member.declaring_type));
    let mut out = format!("{}:{owner}.{}", member_prefix(member.kind), member_name_part(member));
    if !member.parameters.is_empty() {
        let parameters: Vec<String> = member.parameters.iter().map(|p| return shape_identifier(&p.shape)).collect();
        out.push('(');
        out.push_str(&parameters.join(","));
        out.push(')');
    }
    if member.is_conversion_operator()
        && let Some(returns) = &member.return_type
    {
        out.push('~');
        out.push_str(&shape_identifier(returns));
    }
    return out;
}

/// Last path segment of a member identifier: the name as written in the
/// path plus the method arity marker, without the parameter list.
pub fn member_name_part(member: &MemberNode) -> String {
    let name = member_path_name(member);
    if member.generic_parameters.is_empty() {
        return name;
    }
    return format!("{name}``{}", member.generic_parameters.len());
}

/// Kind tag of a member identifier.
pub const fn member_prefix(kind: MemberKind) -> char {
    return match kind {
        MemberKind::Constructor | MemberKind::Method => 'M',
        MemberKind::Event => 'E',
        MemberKind::Field => 'F',
        MemberKind::Property => 'P',
    };
}

/// Dotted path of a named type with per-level arity, without kind tag.
pub fn type_path(named: &NamedType) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(named.segments.len().saturating_add(1));
    if !named.namespace.is_empty() {
        parts.push(named.namespace.clone());
    }
    for segment in &named.segments {
        if segment.arity == 0 {
            parts.push(segment.name.clone());
        } else {
            parts.push(format!("{}`{}", segment.name, segment.arity));
        }
    }
    return parts.join(".");
}

/// Identifier text of a signature type, as written inside parameter lists
/// and specialization arguments (no kind tag).
pub fn shape_identifier(shape: &TypeShape) -> String {
    return match shape {
        TypeShape::Array { element, rank } => format!("{}{}", shape_identifier(element), array_suffix(*rank)),
        TypeShape::ByRef(inner) => format!("{}@", shape_identifier(inner)),
        TypeShape::Generic { arguments, definition } => {
            let rendered: Vec<String> = arguments.iter().map(shape_identifier).collect();
            distribute_arguments(definition, &rendered, ".", ",")
        },
        TypeShape::MethodParameter { index, .. } => format!("``{index}"),
        TypeShape::Named(named) => type_path(named),
        TypeShape::Pointer(inner) => format!("{}*", shape_identifier(inner)),
        TypeShape::TypeParameter { index, .. } => format!("`{index}"),
    };
}

/// `[]` for vectors, `[0:,0:]` style lower bounds for higher ranks.
pub fn array_suffix(rank: u32) -> String {
    if rank <= 1 {
        return "[]".to_string();
    }
    let bounds: Vec<&str> = (0..rank).map(|_| return "0:").collect();
    return format!("[{}]", bounds.join(","));
}

/// Write `definition` with each level's share of `arguments` in braces.
fn distribute_arguments(definition: &NamedType, arguments: &[String], separator: &str, joiner: &str) -> String {
    let mut parts: Vec<String> = Vec::new();
    if !definition.namespace.is_empty() {
        parts.extend(definition.namespace.split('.').map(str::to_string));
    }
    let mut remaining = arguments.iter();
    for segment in &definition.segments {
        let level: Vec<&str> = remaining.by_ref().take(segment.arity).map(String::as_str).collect();
        if level.is_empty() {
            parts.push(segment.name.clone());
        } else {
            parts.push(format!("{}{{{}}}", segment.name, level.join(joiner)));
        }
    }
    return parts.join(separator);
}

/// Member name as it appears in the identifier path.
fn member_path_name(member: &MemberNode) -> String {
    if member.is_explicit_implementation() {
        if let Some(implemented) = member.implements.first() {
            return format!("{}#{}", flattened_shape(&implemented.interface), implemented.name);
        }
    }
    return match member.name.as_str() {
        ".ctor" => "#ctor".to_string(),
        ".cctor" => "#cctor".to_string(),
        other => other.to_string(),
    };
}

/// Interface name in the `#`-separated form used inside member paths.
/// Generic arguments are `@`-separated and type parameters keep their names.
fn flattened_shape(shape: &TypeShape) -> String {
    return match shape {
        TypeShape::Array { element, rank } => format!("{}{}", flattened_shape(element), array_suffix(*rank)),
        TypeShape::ByRef(inner) => format!("{}@", flattened_shape(inner)),
        TypeShape::Generic { arguments, definition } => {
            let rendered: Vec<String> = arguments.iter().map(flattened_shape).collect();
            distribute_arguments(definition, &rendered, "#", "@")
        },
        TypeShape::MethodParameter { name, .. } | TypeShape::TypeParameter { name, .. } => name.clone(),
        TypeShape::Named(named) => type_path(named).replace('.', "#"),
        TypeShape::Pointer(inner) => format!("{}*", flattened_shape(inner)),
    };
}
