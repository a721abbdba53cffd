//! Visibility policy engine: decides which namespaces, types and members of
//! a [`TypeGraph`] are documented.
//!
//! Three layers are consulted in order: structural exclusions that no
//! setting can override, the declarative override tree, and the configured
//! [`VisibilitySettings`]. Exposure of namespaces and types is derived: a
//! container is exposed when anything inside it is.
//!
//! Results are memoized in a [`FilterSession`], which lives for one build.
//! Starting a new build means starting a new session.

use std::collections::HashMap;

use tracing::debug;

use crate::config::Config;
use crate::filter::{FilterMatch, FilterSubject, FilterTree};
use crate::graph::{
    AttributeNode, MemberId, MemberKind, MemberNode, NamedType, NamespaceId, TypeGraph, TypeId, TypeKind,
    TypeShape, Visibility,
};
use crate::visibility::{VisibilityFlag, VisibilitySettings};

/// Name of the numeric backing field the compiler emits into enumerations.
const ENUM_BACKING_FIELD: &str = "value__";

/// Immutable policy: flag set plus the two override trees.
#[derive(Debug, Clone, Default)]
pub struct ApiFilter {
    /// Namespace/type/member overrides.
    api_tree: FilterTree,
    /// Overrides keyed by attribute type.
    attribute_tree: FilterTree,
    /// Configured visibility switches.
    settings: VisibilitySettings,
}

impl ApiFilter {
    /// Policy from explicit parts.
    pub const fn new(settings: VisibilitySettings, api_tree: FilterTree, attribute_tree: FilterTree) -> Self {
        return Self {
            api_tree,
            attribute_tree,
            settings,
        };
    }

    /// Policy described by a loaded config.
    pub fn from_config(config: &Config) -> Self {
        return Self::new(config.visibility, config.api_filter.clone(), config.attribute_filter.clone());
    }

    /// The configured switches.
    pub const fn settings(&self) -> VisibilitySettings {
        return self.settings;
    }

    /// Start a build against `graph` with empty caches.
    pub fn session<'a>(&'a self, graph: &'a TypeGraph) -> FilterSession<'a> {
        return FilterSession {
            filter: self,
            graph,
            namespaces: HashMap::new(),
            types: HashMap::new(),
        };
    }

    /// Whether `flag` is on.
    const fn allows(&self, flag: VisibilityFlag) -> bool {
        return self.settings.is_enabled(flag);
    }
}

/// Build-scoped evaluation of an [`ApiFilter`] over one graph.
#[derive(Debug)]
pub struct FilterSession<'a> {
    /// Policy being applied.
    filter: &'a ApiFilter,
    /// Graph being documented.
    graph: &'a TypeGraph,
    /// Memoized namespace decisions.
    namespaces: HashMap<NamespaceId, bool>,
    /// Memoized type decisions.
    types: HashMap<TypeId, bool>,
}

impl<'a> FilterSession<'a> {
    /// The graph this session evaluates.
    pub const fn graph(&self) -> &'a TypeGraph {
        return self.graph;
    }

    /// A namespace is exposed when any of its types is. A namespace the
    /// override tree hides outright is decided without visiting its types.
    pub fn is_exposed_namespace(&mut self, id: NamespaceId) -> bool {
        if let Some(&cached) = self.namespaces.get(&id) {
            return cached;
        }
        let graph = self.graph;
        let namespace = graph.namespace(id);
        if self.filter.api_tree.hides_namespace(&namespace.name) {
            debug!(namespace = %namespace.name, "namespace hidden by override");
            self.namespaces.insert(id, false);
            return false;
        }
        let types = namespace.types.clone();
        let exposed = types.into_iter().any(|t| return self.is_exposed_type(t));
        self.namespaces.insert(id, exposed);
        return exposed;
    }

    /// A type is exposed when it passes the structural checks and is either
    /// declared exposed or contains an exposed member or nested type.
    pub fn is_exposed_type(&mut self, id: TypeId) -> bool {
        if let Some(&cached) = self.types.get(&id) {
            return cached;
        }
        // Provisional entry breaks cycles through explicit implementations.
        self.types.insert(id, false);

        let exposed = self.type_is_structurally_documentable(id)
            && (self.type_is_declared_exposed(id) || self.has_exposed_members(id) || self.has_exposed_nested_types(id));
        if !exposed {
            debug!(type_name = %self.graph.type_node(id).name, "type not exposed");
        }
        self.types.insert(id, exposed);
        return exposed;
    }

    /// Whether any member declared directly on `id` is exposed.
    pub fn has_exposed_members(&mut self, id: TypeId) -> bool {
        let members = self.graph.type_node(id).members.clone();
        return members.into_iter().any(|m| return self.is_exposed_member(m));
    }

    /// Whether a member is documented.
    ///
    /// A member-level override is final. A `false` override on the type or
    /// namespace hides the member. Otherwise the visibility settings decide,
    /// and the root default can only narrow them.
    pub fn is_exposed_member(&mut self, id: MemberId) -> bool {
        let graph = self.graph;
        let member = graph.member(id);
        if !self.member_is_structurally_documentable(member) {
            return false;
        }
        let decision = {
            let subject = self.subject(member.declaring_type);
            self.filter
                .api_tree
                .match_member(&subject, &member.name, &member.generic_parameters)
        };
        return match decision {
            FilterMatch::Member(exposed) => exposed,
            FilterMatch::Namespace(false) | FilterMatch::Type(false) | FilterMatch::Root(false) => false,
            FilterMatch::Namespace(true) | FilterMatch::Type(true) | FilterMatch::Root(true) => {
                self.type_visibility_allows(member.declaring_type) && self.member_visibility_allows(member)
            },
        };
    }

    /// Whether an applied attribute is shown on its target.
    pub fn is_exposed_attribute(&self, attribute: &AttributeNode) -> bool {
        if !self.filter.allows(VisibilityFlag::Attributes) {
            return false;
        }
        let decision = self.match_named_type(&self.filter.attribute_tree, &attribute.attribute_type);
        return decision.exposed();
    }

    /// Whether an interface counts as documented. Interfaces declared in the
    /// graph follow type exposure; others follow the override tree.
    pub fn is_documented_interface(&mut self, interface: &TypeShape) -> bool {
        let definition = match interface {
            TypeShape::Generic { definition, .. } | TypeShape::Named(definition) => definition,
            TypeShape::Array { .. }
            | TypeShape::ByRef(_)
            | TypeShape::MethodParameter { .. }
            | TypeShape::Pointer(_)
            | TypeShape::TypeParameter { .. } => return false,
        };
        if let Some(id) = self.graph.resolve_named(definition) {
            return self.is_exposed_type(id);
        }
        return self.match_named_type(&self.filter.api_tree, definition).exposed();
    }

    /// Whether `member`, declared on a base of `derived`, is listed among
    /// the members of `derived`.
    ///
    /// Members from documented assemblies follow `inherited_members` and the
    /// usual member policy. Members of framework types need
    /// `inherited_framework_members`, and their internal and private tiers
    /// have switches of their own.
    pub fn is_exposed_inherited_member(&mut self, derived: TypeId, member_id: MemberId) -> bool {
        let graph = self.graph;
        let member = graph.member(member_id);
        if member.declaring_type == derived {
            return self.is_exposed_member(member_id);
        }
        if member.kind == MemberKind::Constructor || !self.filter.allows(VisibilityFlag::InheritedMembers) {
            return false;
        }
        if !graph.is_framework_type(member.declaring_type) {
            return self.is_exposed_member(member_id);
        }
        if !self.filter.allows(VisibilityFlag::InheritedFrameworkMembers)
            || !self.member_is_structurally_documentable(member)
        {
            return false;
        }
        return match member.visibility {
            Visibility::Assembly | Visibility::FamilyAndAssembly => {
                self.filter.allows(VisibilityFlag::InheritedFrameworkInternalMembers)
            },
            Visibility::Private => self.filter.allows(VisibilityFlag::InheritedFrameworkPrivateMembers),
            Visibility::Family | Visibility::FamilyOrAssembly | Visibility::Public => {
                self.member_visibility_allows(member)
            },
            Visibility::Unrecognized => false,
        };
    }

    /// Any directly nested type exposed.
    fn has_exposed_nested_types(&mut self, id: TypeId) -> bool {
        let nested = self.graph.type_node(id).nested_types.clone();
        return nested.into_iter().any(|t| return self.is_exposed_type(t));
    }

    /// Override decision for the type itself, narrowed by visibility.
    fn type_is_declared_exposed(&self, id: TypeId) -> bool {
        let decision = self.filter.api_tree.match_type(&self.subject(id));
        return decision.exposed() && self.type_visibility_allows(id);
    }

    /// Visibility switches admit `id` and every type enclosing it.
    fn type_visibility_allows(&self, id: TypeId) -> bool {
        return self.graph.nesting_chain(id).into_iter().all(|t| {
            let node = self.graph.type_node(t);
            let outer_sealed = node
                .declaring_type
                .is_some_and(|outer| return self.graph.type_node(outer).is_sealed);
            return self.visibility_allows(node.visibility, outer_sealed, false);
        });
    }

    /// Visibility switches admit a member, explicit implementations included.
    fn member_visibility_allows(&mut self, member: &MemberNode) -> bool {
        if member.is_explicit_implementation() {
            if !self.filter.allows(VisibilityFlag::ExplicitInterfaceImplementations) {
                return false;
            }
            return member
                .implements
                .iter()
                .all(|implemented| return self.is_documented_interface(&implemented.interface));
        }
        let sealed = self.graph.type_node(member.declaring_type).is_sealed;
        return self.visibility_allows(member.visibility, sealed, member.kind == MemberKind::Field);
    }

    /// Core accessibility table.
    fn visibility_allows(&self, visibility: Visibility, in_sealed_type: bool, is_field: bool) -> bool {
        let protected = self.filter.allows(VisibilityFlag::Protected)
            && (!in_sealed_type || self.filter.allows(VisibilityFlag::SealedProtected));
        let internals = self.filter.allows(VisibilityFlag::Internals);
        return match visibility {
            Visibility::Public => true,
            Visibility::Family => protected,
            Visibility::FamilyOrAssembly => {
                internals || (protected && self.filter.allows(VisibilityFlag::ProtectedInternalAsProtected))
            },
            Visibility::Assembly | Visibility::FamilyAndAssembly => internals,
            Visibility::Private if is_field => self.filter.allows(VisibilityFlag::PrivateFields),
            Visibility::Private => self.filter.allows(VisibilityFlag::Privates),
            Visibility::Unrecognized => false,
        };
    }

    /// Exclusions no setting can lift, applied to a type and its outer types.
    fn type_is_structurally_documentable(&self, id: TypeId) -> bool {
        return self.graph.nesting_chain(id).into_iter().all(|t| {
            let node = self.graph.type_node(t);
            return node.visibility != Visibility::Unrecognized
                && is_encodable_name(&node.name)
                && self.synthesis_allows(node.is_compiler_generated, node.is_embedded_interop);
        });
    }

    /// Exclusions no setting can lift, applied to a member.
    fn member_is_structurally_documentable(&self, member: &MemberNode) -> bool {
        let owner = self.graph.type_node(member.declaring_type);
        if member.visibility == Visibility::Unrecognized
            || !is_encodable_name(&member.name)
            || member.accessor_of.is_some()
            || member.is_compiler_generated
            || owner.kind == TypeKind::Delegate
        {
            return false;
        }
        if owner.kind == TypeKind::Enumeration && member.kind == MemberKind::Field && member.name == ENUM_BACKING_FIELD {
            return false;
        }
        return self.type_is_structurally_documentable(member.declaring_type);
    }

    /// Embedded interop types need `no_pia_types`; other synthesized
    /// declarations never appear.
    const fn synthesis_allows(&self, compiler_generated: bool, embedded_interop: bool) -> bool {
        if embedded_interop {
            return self.filter.allows(VisibilityFlag::NoPiaTypes);
        }
        return !compiler_generated;
    }

    /// Filter view of a graph type.
    fn subject(&self, id: TypeId) -> FilterSubject<'a> {
        let graph = self.graph;
        let levels = graph
            .nesting_chain(id)
            .into_iter()
            .map(|t| {
                let node = graph.type_node(t);
                return (node.name.as_str(), node.generic_parameters.as_slice());
            })
            .collect();
        return FilterSubject {
            levels,
            namespace: graph.namespace(graph.namespace_of(id)).name.as_str(),
        };
    }

    /// Match a possibly external named type against a tree.
    fn match_named_type(&self, tree: &FilterTree, named: &NamedType) -> FilterMatch {
        if let Some(id) = self.graph.resolve_named(named) {
            return tree.match_type(&self.subject(id));
        }
        let subject = FilterSubject {
            levels: named
                .segments
                .iter()
                .map(|s| return (s.name.as_str(), [].as_slice()))
                .collect(),
            namespace: named.namespace.as_str(),
        };
        return tree.match_type(&subject);
    }
}

/// Every character can be written into the XML-based metadata units.
fn is_encodable_name(name: &str) -> bool {
    return name.chars().all(|c| {
        return matches!(c, '\t' | '\n' | '\r')
            || matches!(c, '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}');
    });
}
