//! Graph harvesting: targets for every node the filter exposes, named by
//! the namer and typed through the reference builder.

use std::collections::HashMap;

use tracing::debug;

use crate::api_filter::FilterSession;
use crate::graph::{ImplementedMember, MemberId, MemberKind, TypeGraph, TypeId, TypeShape};
use crate::namer;
use crate::reference::{MemberReference, NamespaceReference, TypeReference};
use crate::reference_builder::{namespace_reference, parameter_references, shape_reference, type_reference};
use crate::target::{MemberDetail, MemberTarget, NamespaceTarget, Target, TargetKind, TypeTarget};

/// Targets for the exposed part of the session's graph: namespaces, then
/// types, then members, each in declaration order.
pub fn harvest(session: &mut FilterSession<'_>) -> Vec<Target> {
    let graph = session.graph();
    let mut targets = Vec::new();

    for namespace in graph.namespace_ids() {
        if session.is_exposed_namespace(namespace) {
            targets.push(Target::new(
                &namer::namespace_identifier(graph, namespace),
                "",
                TargetKind::Namespace(NamespaceTarget {
                    name: graph.namespace(namespace).name.clone(),
                }),
            ));
        }
    }

    let mut members = Vec::new();
    for ty in graph.type_ids() {
        if !session.is_exposed_type(ty) {
            continue;
        }
        targets.push(type_target(graph, ty));
        let exposed: Vec<MemberId> = graph
            .type_node(ty)
            .members
            .iter()
            .copied()
            .filter(|m| return session.is_exposed_member(*m))
            .collect();
        let overloads = overload_groups(graph, ty, &exposed);
        for member in exposed {
            members.push(member_target(graph, member, &overloads));
        }
    }
    targets.extend(members);

    debug!(targets = targets.len(), "harvested exposed graph");
    return targets;
}

/// Target of one type declaration.
fn type_target(graph: &TypeGraph, id: TypeId) -> Target {
    let node = graph.type_node(id);
    let namespace: NamespaceReference = namespace_reference(graph, node.namespace);
    return Target::new(
        &namer::type_identifier(graph, id),
        &node.assembly,
        TargetKind::Type(TypeTarget {
            containing_namespace: namespace,
            containing_type: node.declaring_type.map(|outer| return type_reference(graph, outer)),
            kind: node.kind,
            name: node.name.clone(),
            templates: graph.all_generic_parameters(id),
        }),
    );
}

/// Path names shared by more than one exposed member of the same kind, with
/// their overload-group identifier.
fn overload_groups(graph: &TypeGraph, owner: TypeId, members: &[MemberId]) -> HashMap<(char, String), String> {
    let owner = namer::type_path(&graph.named_type(owner));
    let mut counts: HashMap<(char, String), usize> = HashMap::new();
    for member in members {
        let node = graph.member(*member);
        let key = (namer::member_prefix(node.kind), overload_name(graph, *member));
        *counts.entry(key).or_default() += 1;
    }
    return counts
        .into_iter()
        .filter(|(_, count)| return *count > 1)
        .map(|(key, _)| {
            let id = format!("Overload:{owner}.{}", key.1);
            return (key, id);
        })
        .collect();
}

/// Path name of a member without its generic arity.
fn overload_name(graph: &TypeGraph, member: MemberId) -> String {
    let part = namer::member_name_part(graph.member(member));
    return crate::grammar::strip_arity(&part).to_string();
}

/// Target of one member declaration.
fn member_target(graph: &TypeGraph, id: MemberId, overloads: &HashMap<(char, String), String>) -> Target {
    let node = graph.member(id);
    let member_id = namer::member_identifier(graph, id);
    let prefix = namer::member_prefix(node.kind);
    let overload_id = overloads.get(&(prefix, overload_name(graph, id))).cloned();
    let explicitly_implements = if node.is_explicit_implementation() {
        node.implements.first().map(|implemented| return implemented_member(prefix, implemented))
    } else {
        None
    };
    let return_type = node.return_type.as_ref().map(|shape| return shape_reference(shape, Some(&member_id)));
    let detail = match node.kind {
        MemberKind::Constructor => MemberDetail::Constructor {
            parameters: parameter_references(graph, id),
        },
        MemberKind::Event => MemberDetail::Event { explicitly_implements },
        MemberKind::Field => MemberDetail::Field,
        MemberKind::Method => MemberDetail::Method {
            explicitly_implements,
            is_conversion_operator: node.is_conversion_operator(),
            parameters: parameter_references(graph, id),
            return_type,
            template_args: Vec::new(),
            templates: node.generic_parameters.clone(),
        },
        MemberKind::Property => MemberDetail::Property {
            explicitly_implements,
            parameters: parameter_references(graph, id),
            return_type,
        },
    };
    let declaring = graph.type_node(node.declaring_type);
    return Target::new(
        &member_id,
        &declaring.assembly,
        TargetKind::Member(MemberTarget {
            containing_type: TypeReference::Simple(type_reference(graph, node.declaring_type)),
            detail,
            name: node.name.clone(),
            overload_id,
        }),
    );
}

/// Reference to the interface member an explicit implementation satisfies.
fn implemented_member(prefix: char, implemented: &ImplementedMember) -> MemberReference {
    if let TypeShape::Generic { definition, .. } = &implemented.interface
        && definition.total_arity() > 0
        && let TypeReference::Specialized(specialized_type) = shape_reference(&implemented.interface, None)
    {
        return MemberReference::Specialized {
            specialized_type,
            template_member: format!("{prefix}:{}.{}", namer::type_path(definition), implemented.name),
        };
    }
    return MemberReference::Simple {
        id: format!("{prefix}:{}.{}", namer::shape_identifier(&implemented.interface), implemented.name),
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_filter::ApiFilter;
    use crate::dictionary::TargetDictionary;
    use crate::graph::{MemberNode, NamedType, ParameterNode, TypeKind, TypeNode, Visibility};
    use crate::link_text::{Convention, DisplayOptions};
    use crate::reference_parser::{GenericContext, parse_reference};
    use crate::resolver::LinkTextResolver;

    fn parameter(name: &str, ty: &str) -> ParameterNode {
        return ParameterNode {
            name: name.to_string(),
            shape: TypeShape::Named(NamedType::simple("N", ty)),
        };
    }

    fn graph() -> TypeGraph {
        let mut graph = TypeGraph::new();
        let ns = graph.add_namespace("N");
        let widget = graph.add_type(TypeNode::new(TypeKind::Class, "Widget", ns, Visibility::Public));
        let _color = graph.add_type(TypeNode::new(TypeKind::Enumeration, "Color", ns, Visibility::Public));
        let _secret = graph.add_type(TypeNode::new(TypeKind::Class, "Secret", ns, Visibility::Assembly));

        let mut ctor = MemberNode::new(MemberKind::Constructor, ".ctor", widget, Visibility::Public);
        ctor.parameters.push(parameter("color", "Color"));
        graph.add_member(ctor);
        let mut run_color = MemberNode::new(MemberKind::Method, "Run", widget, Visibility::Public);
        run_color.parameters.push(parameter("color", "Color"));
        graph.add_member(run_color);
        graph.add_member(MemberNode::new(MemberKind::Method, "Run", widget, Visibility::Public));
        graph.add_member(MemberNode::new(MemberKind::Field, "cache", widget, Visibility::Private));
        return graph;
    }

    #[test]
    fn harvests_exposed_nodes_only() {
        let graph = graph();
        let filter = ApiFilter::default();
        let mut session = filter.session(&graph);
        let ids: Vec<String> = harvest(&mut session).into_iter().map(|t| return t.id).collect();
        assert_eq!(
            ids,
            [
                "N:N",
                "T:N.Widget",
                "T:N.Color",
                "M:N.Widget.#ctor(N.Color)",
                "M:N.Widget.Run(N.Color)",
                "M:N.Widget.Run",
            ]
        );
    }

    #[test]
    fn overloads_share_a_group_identifier() {
        let graph = graph();
        let filter = ApiFilter::default();
        let mut session = filter.session(&graph);
        let targets = harvest(&mut session);
        let groups: Vec<Option<&str>> = targets
            .iter()
            .filter_map(Target::as_member)
            .map(|m| return m.overload_id.as_deref())
            .collect();
        assert_eq!(groups, [None, Some("Overload:N.Widget.Run"), Some("Overload:N.Widget.Run")]);
    }

    #[test]
    fn harvested_targets_resolve_like_loaded_ones() {
        let graph = graph();
        let filter = ApiFilter::default();
        let mut session = filter.session(&graph);
        let targets = TargetDictionary::new();
        for target in harvest(&mut session) {
            targets.insert(target);
        }
        let resolver = LinkTextResolver::new(&targets);
        let api = "M:N.Widget.#ctor(N.Color)";
        let reference = parse_reference(api, &GenericContext::from_cref(api));
        assert!(resolver.is_resolved(&reference));
        assert_eq!(
            resolver
                .render_reference(&reference, DisplayOptions::SHOW_PARAMETERS)
                .render(Convention::CSharp),
            "Widget(Color)"
        );
    }
}
