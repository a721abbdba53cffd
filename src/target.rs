//! Target records: the documentable entities stored in the dictionary.

use serde::{Deserialize, Serialize};

use crate::graph::TypeKind;
use crate::reference::{MemberReference, NamespaceReference, Parameter, SimpleTypeReference, TypeReference};

/// A documentable entity. Created once during ingestion and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Owning assembly; empty when unknown.
    pub container: String,
    /// Output file name.
    pub file: String,
    /// Unique identifier.
    pub id: String,
    /// Kind-specific data.
    pub kind: TargetKind,
}

/// Closed set of target kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetKind {
    /// A file-presence marker with no documentable content.
    Marker,
    /// A member.
    Member(MemberTarget),
    /// A namespace.
    Namespace(NamespaceTarget),
    /// A type.
    Type(TypeTarget),
}

/// Namespace-specific data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceTarget {
    /// Dotted name; empty for the global namespace.
    pub name: String,
}

/// Type-specific data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeTarget {
    /// Namespace the type lives in.
    pub containing_namespace: NamespaceReference,
    /// Outer type of a nested type.
    pub containing_type: Option<SimpleTypeReference>,
    /// Category of the type.
    pub kind: TypeKind,
    /// Simple name without arity.
    pub name: String,
    /// Generic parameter names of every nesting level, outermost first.
    pub templates: Vec<String>,
}

/// Member-specific data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberTarget {
    /// Declaring type.
    pub containing_type: TypeReference,
    /// Kind-specific member data.
    pub detail: MemberDetail,
    /// Declared name (`.ctor`, `op_Explicit`, `Get`).
    pub name: String,
    /// Identifier of the overload group, if any.
    pub overload_id: Option<String>,
}

/// Kind-specific member data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemberDetail {
    /// Instance or static constructor.
    Constructor {
        /// Parameters in order.
        parameters: Vec<Parameter>,
    },
    /// Event.
    Event {
        /// Interface event this explicitly implements.
        explicitly_implements: Option<MemberReference>,
    },
    /// Field or enumeration value.
    Field,
    /// Method or operator.
    Method {
        /// Interface method this explicitly implements.
        explicitly_implements: Option<MemberReference>,
        /// `op_Implicit` / `op_Explicit`.
        is_conversion_operator: bool,
        /// Parameters in order.
        parameters: Vec<Parameter>,
        /// Return type; `None` for `void`.
        return_type: Option<TypeReference>,
        /// Arguments of a specialized generic method.
        template_args: Vec<TypeReference>,
        /// Generic parameter names.
        templates: Vec<String>,
    },
    /// Property or indexer.
    Property {
        /// Interface property this explicitly implements.
        explicitly_implements: Option<MemberReference>,
        /// Index parameters; empty for plain properties.
        parameters: Vec<Parameter>,
        /// Property type.
        return_type: Option<TypeReference>,
    },
}

impl Target {
    /// A target whose output file name is derived from its identifier.
    pub fn new(id: &str, container: &str, kind: TargetKind) -> Self {
        return Self {
            container: container.to_string(),
            file: fallback_file(id),
            id: id.to_string(),
            kind,
        };
    }

    /// Type data, if this is a type.
    pub const fn as_type(&self) -> Option<&TypeTarget> {
        return match &self.kind {
            TargetKind::Type(ty) => Some(ty),
            TargetKind::Marker | TargetKind::Member(_) | TargetKind::Namespace(_) => None,
        };
    }

    /// Member data, if this is a member.
    pub const fn as_member(&self) -> Option<&MemberTarget> {
        return match &self.kind {
            TargetKind::Member(member) => Some(member),
            TargetKind::Marker | TargetKind::Namespace(_) | TargetKind::Type(_) => None,
        };
    }
}

impl MemberTarget {
    /// Declared parameters; empty for kinds without a parameter list.
    pub fn parameters(&self) -> &[Parameter] {
        return match &self.detail {
            MemberDetail::Constructor { parameters }
            | MemberDetail::Method { parameters, .. }
            | MemberDetail::Property { parameters, .. } => parameters,
            MemberDetail::Event { .. } | MemberDetail::Field => &[],
        };
    }

    /// Generic parameter names of a method; empty otherwise.
    pub fn templates(&self) -> &[String] {
        return match &self.detail {
            MemberDetail::Method { templates, .. } => templates,
            MemberDetail::Constructor { .. }
            | MemberDetail::Event { .. }
            | MemberDetail::Field
            | MemberDetail::Property { .. } => &[],
        };
    }
}

/// Output file name for an identifier with no recorded file: characters that
/// are unsafe in file names become `_`.
pub fn fallback_file(id: &str) -> String {
    return id
        .chars()
        .map(|c| {
            return match c {
                ':' | '.' | '#' | '`' | '{' | '}' | '(' | ')' | ',' | '@' | '*' | '[' | ']' | '~' | '<' | '>' | '/'
                | '\\' | '|' | '?' | '"' => '_',
                other => other,
            };
        })
        .collect();
}
