//! Reflected type graph: namespaces, types, members and signature shapes.
//!
//! The graph is produced by an external metadata reader and consumed
//! read-only by the policy engine, the namer and the reference builder.
//! Nodes live in flat arenas and point at each other through copyable
//! handles, so caches can be keyed by node identity.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Handle of a namespace node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NamespaceId(usize);

/// Handle of a type node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(usize);

/// Handle of a member node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemberId(usize);

/// Accessibility as recorded in metadata.
///
/// `Unrecognized` covers obfuscated or corrupt flag combinations where
/// none of the six accessibility bits is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    /// `internal` / `Friend`.
    Assembly,
    /// `protected`.
    Family,
    /// `private protected`.
    FamilyAndAssembly,
    /// `protected internal`.
    FamilyOrAssembly,
    /// `private`.
    Private,
    /// `public`.
    Public,
    /// No recognized accessibility bit.
    Unrecognized,
}

/// Category of a type declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeKind {
    /// Reference type.
    Class,
    /// Delegate type.
    Delegate,
    /// Enumeration.
    Enumeration,
    /// Interface.
    Interface,
    /// Value type.
    Structure,
}

/// Category of a member declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    /// Instance or static constructor.
    Constructor,
    /// Event.
    Event,
    /// Field, including enumeration values.
    Field,
    /// Method, including operators and accessors.
    Method,
    /// Property or indexer.
    Property,
}

/// One level of a possibly nested type name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeSegment {
    /// Generic parameters declared at this level only.
    pub arity: usize,
    /// Simple name without arity suffix.
    pub name: String,
}

/// A type named by namespace and outer-to-inner segments. May refer to a
/// type outside the graph (framework types referenced from signatures).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamedType {
    /// Dotted namespace, empty for the global namespace.
    pub namespace: String,
    /// Outermost type first.
    pub segments: Vec<TypeSegment>,
}

impl NamedType {
    /// A non-nested, non-generic type.
    pub fn simple(namespace: &str, name: &str) -> Self {
        return Self::generic(namespace, name, 0);
    }

    /// A non-nested type declaring `arity` generic parameters.
    pub fn generic(namespace: &str, name: &str, arity: usize) -> Self {
        return Self {
            namespace: namespace.to_string(),
            segments: vec![TypeSegment {
                arity,
                name: name.to_string(),
            }],
        };
    }

    /// Append a nested level.
    #[must_use]
    pub fn nested(mut self, name: &str, arity: usize) -> Self {
        self.segments.push(TypeSegment {
            arity,
            name: name.to_string(),
        });
        return self;
    }

    /// Total generic parameters across all levels.
    pub fn total_arity(&self) -> usize {
        return self.segments.iter().map(|s| return s.arity).sum();
    }
}

/// Type as it appears in a signature, base list or attribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeShape {
    /// Array of `element`; `rank` is the number of dimensions.
    Array {
        /// Element type.
        element: Box<TypeShape>,
        /// Dimension count, at least one.
        rank: u32,
    },
    /// Managed by-reference wrapper (`ref`/`out`).
    ByRef(Box<TypeShape>),
    /// Instantiation of a generic definition. `arguments` covers every
    /// level of `definition`, outermost level first.
    Generic {
        /// Concrete arguments in declaration order.
        arguments: Vec<TypeShape>,
        /// The open generic definition.
        definition: NamedType,
    },
    /// Generic parameter of the enclosing method.
    MethodParameter {
        /// Position in the method's parameter list.
        index: usize,
        /// Declared name.
        name: String,
    },
    /// Plain named type.
    Named(NamedType),
    /// Unmanaged pointer.
    Pointer(Box<TypeShape>),
    /// Generic parameter of `owner`, indexed across all nesting levels.
    TypeParameter {
        /// Position in the owner's cumulative parameter list.
        index: usize,
        /// Declared name.
        name: String,
        /// Type declaring the parameter list being indexed.
        owner: NamedType,
    },
}

/// An applied custom attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeNode {
    /// The attribute class.
    pub attribute_type: NamedType,
}

/// Interface member satisfied by an explicit implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImplementedMember {
    /// Interface, possibly a generic instantiation.
    pub interface: TypeShape,
    /// Simple name of the interface member.
    pub name: String,
}

/// A named, typed parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterNode {
    /// Declared name.
    pub name: String,
    /// Declared type.
    pub shape: TypeShape,
}

/// A namespace and the top-level types it declares.
#[derive(Debug, Clone)]
pub struct NamespaceNode {
    /// Dotted name, empty for the global namespace.
    pub name: String,
    /// Top-level types only; nested types hang off their declaring type.
    pub types: Vec<TypeId>,
}

/// A type declaration.
#[derive(Debug, Clone)]
pub struct TypeNode {
    /// Defining assembly.
    pub assembly: String,
    /// Applied attributes.
    pub attributes: Vec<AttributeNode>,
    /// Base class, if any.
    pub base_type: Option<TypeShape>,
    /// Outer type for nested declarations.
    pub declaring_type: Option<TypeId>,
    /// Generic parameter names declared at this level only.
    pub generic_parameters: Vec<String>,
    /// Implemented interfaces.
    pub interfaces: Vec<TypeShape>,
    /// `abstract` modifier.
    pub is_abstract: bool,
    /// Synthesized by the compiler (closures, iterators, backing types).
    pub is_compiler_generated: bool,
    /// Embedded interop ("no PIA") type copied into the assembly.
    pub is_embedded_interop: bool,
    /// `sealed` modifier.
    pub is_sealed: bool,
    /// Category of the declaration.
    pub kind: TypeKind,
    /// Declared members.
    pub members: Vec<MemberId>,
    /// Simple name without arity suffix.
    pub name: String,
    /// Containing namespace.
    pub namespace: NamespaceId,
    /// Directly nested types.
    pub nested_types: Vec<TypeId>,
    /// Declared accessibility.
    pub visibility: Visibility,
}

/// A member declaration.
#[derive(Debug, Clone)]
pub struct MemberNode {
    /// Property or event this method is an accessor of.
    pub accessor_of: Option<MemberId>,
    /// Applied attributes.
    pub attributes: Vec<AttributeNode>,
    /// Declaring type.
    pub declaring_type: TypeId,
    /// Generic parameter names declared by a method.
    pub generic_parameters: Vec<String>,
    /// Interface members this declaration explicitly implements.
    pub implements: Vec<ImplementedMember>,
    /// Synthesized by the compiler.
    pub is_compiler_generated: bool,
    /// Static method usable as an instance method of its first parameter.
    pub is_extension: bool,
    /// `static` modifier.
    pub is_static: bool,
    /// Category of the declaration.
    pub kind: MemberKind,
    /// Metadata name (`.ctor`, `op_Explicit`, `System.IDisposable.Dispose`).
    pub name: String,
    /// Parameters in declaration order.
    pub parameters: Vec<ParameterNode>,
    /// Return or property type.
    pub return_type: Option<TypeShape>,
    /// Declared accessibility.
    pub visibility: Visibility,
}

impl MemberNode {
    /// A parameterless, non-generic member with default flags.
    pub fn new(kind: MemberKind, name: &str, declaring_type: TypeId, visibility: Visibility) -> Self {
        return Self {
            accessor_of: None,
            attributes: Vec::new(),
            declaring_type,
            generic_parameters: Vec::new(),
            implements: Vec::new(),
            is_compiler_generated: false,
            is_extension: false,
            is_static: false,
            kind,
            name: name.to_string(),
            parameters: Vec::new(),
            return_type: None,
            visibility,
        };
    }

    /// Conversion operators carry their target type in the identifier.
    pub fn is_conversion_operator(&self) -> bool {
        return self.kind == MemberKind::Method
            && (self.name == "op_Implicit" || self.name == "op_Explicit");
    }

    /// Private declaration that satisfies an interface member by name.
    pub fn is_explicit_implementation(&self) -> bool {
        return !self.implements.is_empty()
            && self.visibility == Visibility::Private
            && self.name.contains('.');
    }
}

/// Arena holding the whole reflected surface of one build.
#[derive(Debug, Clone, Default)]
pub struct TypeGraph {
    /// Assemblies being documented; empty means "all of them".
    documented_assemblies: BTreeSet<String>,
    /// Member arena.
    members: Vec<MemberNode>,
    /// Namespace arena.
    namespaces: Vec<NamespaceNode>,
    /// Type arena.
    types: Vec<TypeNode>,
}

impl TypeGraph {
    /// Empty graph.
    pub fn new() -> Self {
        return Self::default();
    }

    /// Mark an assembly as documented code. Types from other assemblies
    /// count as framework types for inherited-member policy.
    pub fn document_assembly(&mut self, assembly: &str) {
        self.documented_assemblies.insert(assembly.to_string());
    }

    /// Add (or find) a namespace by name.
    pub fn add_namespace(&mut self, name: &str) -> NamespaceId {
        if let Some(index) = self.namespaces.iter().position(|n| return n.name == name) {
            return NamespaceId(index);
        }
        self.namespaces.push(NamespaceNode {
            name: name.to_string(),
            types: Vec::new(),
        });
        return NamespaceId(self.namespaces.len().saturating_sub(1));
    }

    /// Add a type declaration and link it into its namespace or outer type.
    pub fn add_type(&mut self, node: TypeNode) -> TypeId {
        let id = TypeId(self.types.len());
        match node.declaring_type {
            Some(outer) => {
                if let Some(outer) = self.types.get_mut(outer.0) {
                    outer.nested_types.push(id);
                }
            },
            None => {
                if let Some(namespace) = self.namespaces.get_mut(node.namespace.0) {
                    namespace.types.push(id);
                }
            },
        }
        self.types.push(node);
        return id;
    }

    /// Add a member declaration and link it into its declaring type.
    pub fn add_member(&mut self, node: MemberNode) -> MemberId {
        let id = MemberId(self.members.len());
        if let Some(owner) = self.types.get_mut(node.declaring_type.0) {
            owner.members.push(id);
        }
        self.members.push(node);
        return id;
    }

    /// Look up a namespace node.
    ///
    /// # Panics
    ///
    /// Panics if the handle was minted by a different graph.
    pub fn namespace(&self, id: NamespaceId) -> &NamespaceNode {
        return &self.namespaces[id.0];
    }

    /// Look up a type node.
    ///
    /// # Panics
    ///
    /// Panics if the handle was minted by a different graph.
    pub fn type_node(&self, id: TypeId) -> &TypeNode {
        return &self.types[id.0];
    }

    /// Look up a member node.
    ///
    /// # Panics
    ///
    /// Panics if the handle was minted by a different graph.
    pub fn member(&self, id: MemberId) -> &MemberNode {
        return &self.members[id.0];
    }

    /// All namespace handles in insertion order.
    pub fn namespace_ids(&self) -> impl Iterator<Item = NamespaceId> + '_ {
        return (0..self.namespaces.len()).map(NamespaceId);
    }

    /// All type handles in insertion order, nested types included.
    pub fn type_ids(&self) -> impl Iterator<Item = TypeId> + '_ {
        return (0..self.types.len()).map(TypeId);
    }

    /// All member handles in insertion order.
    pub fn member_ids(&self) -> impl Iterator<Item = MemberId> + '_ {
        return (0..self.members.len()).map(MemberId);
    }

    /// Find a type by namespace and dotted nested name (`Outer.Inner`).
    pub fn find_type(&self, namespace: &str, dotted_name: &str) -> Option<TypeId> {
        return self.type_ids().find(|&id| {
            let named = self.named_type(id);
            let path = named
                .segments
                .iter()
                .map(|s| return s.name.as_str())
                .collect::<Vec<_>>()
                .join(".");
            return named.namespace == namespace && path == dotted_name;
        });
    }

    /// Outer-to-inner chain ending with `id`.
    pub fn nesting_chain(&self, id: TypeId) -> Vec<TypeId> {
        let mut chain = vec![id];
        let mut current = self.type_node(id).declaring_type;
        while let Some(outer) = current {
            chain.push(outer);
            current = self.type_node(outer).declaring_type;
        }
        chain.reverse();
        return chain;
    }

    /// Namespace of the outermost declaring type.
    pub fn namespace_of(&self, id: TypeId) -> NamespaceId {
        let chain = self.nesting_chain(id);
        let outermost = chain.first().copied().unwrap_or(id);
        return self.type_node(outermost).namespace;
    }

    /// Name of a type as a `NamedType`.
    pub fn named_type(&self, id: TypeId) -> NamedType {
        let segments = self
            .nesting_chain(id)
            .into_iter()
            .map(|t| {
                let node = self.type_node(t);
                return TypeSegment {
                    arity: node.generic_parameters.len(),
                    name: node.name.clone(),
                };
            })
            .collect();
        return NamedType {
            namespace: self.namespace(self.namespace_of(id)).name.clone(),
            segments,
        };
    }

    /// Generic parameter names of every nesting level, outermost first.
    pub fn all_generic_parameters(&self, id: TypeId) -> Vec<String> {
        return self
            .nesting_chain(id)
            .into_iter()
            .flat_map(|t| return self.type_node(t).generic_parameters.clone())
            .collect();
    }

    /// Declared outside the documented assemblies.
    pub fn is_framework_type(&self, id: TypeId) -> bool {
        if self.documented_assemblies.is_empty() {
            return false;
        }
        return !self.documented_assemblies.contains(&self.type_node(id).assembly);
    }

    /// Resolve a named type to a node in this graph, if it is declared here.
    pub fn resolve_named(&self, named: &NamedType) -> Option<TypeId> {
        return self.type_ids().find(|&id| return self.named_type(id) == *named);
    }

    /// Base-class chain of `id` that is declared in this graph, nearest first.
    pub fn base_chain(&self, id: TypeId) -> Vec<TypeId> {
        let mut chain = Vec::new();
        let mut current = id;
        while let Some(base) = self.type_node(current).base_type.as_ref() {
            let definition = match base {
                TypeShape::Generic { definition, .. } | TypeShape::Named(definition) => definition,
                TypeShape::Array { .. }
                | TypeShape::ByRef(_)
                | TypeShape::MethodParameter { .. }
                | TypeShape::Pointer(_)
                | TypeShape::TypeParameter { .. } => break,
            };
            let Some(next) = self.resolve_named(definition) else {
                break;
            };
            if chain.contains(&next) || next == id {
                break;
            }
            chain.push(next);
            current = next;
        }
        return chain;
    }
}

impl TypeNode {
    /// A top-level, non-generic type with default flags.
    pub fn new(kind: TypeKind, name: &str, namespace: NamespaceId, visibility: Visibility) -> Self {
        return Self {
            assembly: String::new(),
            attributes: Vec::new(),
            base_type: None,
            declaring_type: None,
            generic_parameters: Vec::new(),
            interfaces: Vec::new(),
            is_abstract: false,
            is_compiler_generated: false,
            is_embedded_interop: false,
            is_sealed: false,
            kind,
            members: Vec::new(),
            name: name.to_string(),
            namespace,
            nested_types: Vec::new(),
            visibility,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_types_link_to_outer_and_not_namespace() {
        let mut graph = TypeGraph::new();
        let ns = graph.add_namespace("N");
        let outer = graph.add_type(TypeNode::new(TypeKind::Class, "Outer", ns, Visibility::Public));
        let mut inner = TypeNode::new(TypeKind::Class, "Inner", ns, Visibility::Public);
        inner.declaring_type = Some(outer);
        inner.generic_parameters = vec!["U".to_string()];
        let inner = graph.add_type(inner);

        assert_eq!(graph.namespace(ns).types, vec![outer]);
        assert_eq!(graph.type_node(outer).nested_types, vec![inner]);
        assert_eq!(graph.nesting_chain(inner), vec![outer, inner]);
        assert_eq!(graph.named_type(inner), NamedType::simple("N", "Outer").nested("Inner", 1));
        assert_eq!(graph.find_type("N", "Outer.Inner"), Some(inner));
    }

    #[test]
    fn namespaces_are_deduplicated_by_name() {
        let mut graph = TypeGraph::new();
        let first = graph.add_namespace("A.B");
        let second = graph.add_namespace("A.B");
        assert_eq!(first, second);
    }

    #[test]
    fn framework_types_come_from_undocumented_assemblies() {
        let mut graph = TypeGraph::new();
        let ns = graph.add_namespace("System");
        let mut object = TypeNode::new(TypeKind::Class, "Object", ns, Visibility::Public);
        object.assembly = "mscorlib".to_string();
        let object = graph.add_type(object);
        assert!(!graph.is_framework_type(object));

        graph.document_assembly("Widgets");
        assert!(graph.is_framework_type(object));
    }

    #[test]
    fn base_chain_stops_at_types_outside_the_graph() {
        let mut graph = TypeGraph::new();
        let ns = graph.add_namespace("N");
        let mut base = TypeNode::new(TypeKind::Class, "Base", ns, Visibility::Public);
        base.base_type = Some(TypeShape::Named(NamedType::simple("System", "Object")));
        let base = graph.add_type(base);
        let mut derived = TypeNode::new(TypeKind::Class, "Derived", ns, Visibility::Public);
        derived.base_type = Some(TypeShape::Named(NamedType::simple("N", "Base")));
        let derived = graph.add_type(derived);

        assert_eq!(graph.base_chain(derived), vec![base]);
    }
}
