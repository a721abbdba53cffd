//! Metadata source units: XML reflection documents, one per namespace.
//!
//! ```xml
//! <reflection>
//!   <apis>
//!     <api id="T:N.Color">
//!       <apidata name="Color" group="type" subgroup="enumeration" />
//!       <containers><library assembly="Widgets" /><namespace api="N:N" /></containers>
//!       <elements><element api="F:N.Color.Red" /></elements>
//!     </api>
//!     <api id="M:N.Widget.#ctor(N.Color)">
//!       <apidata name=".ctor" group="member" subgroup="constructor" />
//!       <memberdata visibility="public" overload="Overload:N.Widget.#ctor" />
//!       <parameters><parameter name="color"><type api="T:N.Color" /></parameter></parameters>
//!       <containers><library assembly="Widgets" /><namespace api="N:N" /><type api="T:N.Widget" /></containers>
//!     </api>
//!   </apis>
//! </reflection>
//! ```
//!
//! An `api` without `apidata` only marks the identifier as present.

use std::path::{Path, PathBuf};

use sxd_document::dom::{ChildOfElement, ChildOfRoot, Element};
use sxd_document::parser;

use crate::error::Error;
use crate::graph::TypeKind;
use crate::reference::{
    MemberReference, NamespaceReference, Parameter, SimpleTypeReference, Specialization, SpecializedTypeReference,
    TemplateTypeReference, TypeReference,
};
use crate::target::{MemberDetail, MemberTarget, NamespaceTarget, Target, TargetKind, TypeTarget};

/// Read and parse one source unit.
///
/// # Errors
///
/// Returns `Error::SourceUnitUnreadable` if the file cannot be read, and the
/// errors of [`parse_source_unit`] otherwise.
pub fn read_source_unit(path: &Path) -> Result<Vec<Target>, Error> {
    let content = std::fs::read_to_string(path).map_err(|source| {
        return Error::SourceUnitUnreadable {
            path: path.to_path_buf(),
            source,
        };
    })?;
    return parse_source_unit(path, &content);
}

/// Parse the targets declared by a source unit, including enumeration
/// values listed only as elements of their enumeration.
///
/// # Errors
///
/// Returns `Error::SourceUnitMalformed` if the text is not well-formed XML,
/// or `Error::SourceUnitInvalid` if an `api` lacks an `id`, names an unknown
/// group or subgroup, or contains an unrecognized type element.
pub fn parse_source_unit(path: &Path, content: &str) -> Result<Vec<Target>, Error> {
    let package = parser::parse(content).map_err(|e| {
        return Error::SourceUnitMalformed {
            path: path.to_path_buf(),
            reason: format!("{e:?}"),
        };
    })?;
    let document = package.as_document();
    let unit = UnitReader {
        path: path.to_path_buf(),
    };

    let mut targets = Vec::new();
    for child in document.root().children() {
        if let ChildOfRoot::Element(root) = child {
            let mut apis = Vec::new();
            collect_apis(root, &mut apis);
            for api in apis {
                unit.read_api(api, &mut targets)?;
            }
        }
    }
    return Ok(targets);
}

/// All `api` elements below `element`, document order.
fn collect_apis<'d>(element: Element<'d>, out: &mut Vec<Element<'d>>) {
    for child in child_elements(element) {
        if local_name(child) == "api" {
            out.push(child);
        } else {
            collect_apis(child, out);
        }
    }
}

/// Element children only.
fn child_elements(element: Element<'_>) -> Vec<Element<'_>> {
    return element
        .children()
        .into_iter()
        .filter_map(|child| {
            if let ChildOfElement::Element(e) = child {
                return Some(e);
            }
            return None;
        })
        .collect();
}

/// First element child called `name`.
fn child<'d>(element: Element<'d>, name: &str) -> Option<Element<'d>> {
    return child_elements(element).into_iter().find(|e| return local_name(*e) == name);
}

/// Local name of an element.
fn local_name(element: Element<'_>) -> &str {
    return element.name().local_part();
}

/// Attribute value of `name`, if present.
fn attribute<'d>(element: Element<'d>, name: &str) -> Option<&'d str> {
    return element.attribute_value(name);
}

/// Per-unit parsing state.
struct UnitReader {
    /// Unit being parsed, for error reporting.
    path: PathBuf,
}

impl UnitReader {
    /// Schema violation at this unit.
    fn invalid(&self, reason: String) -> Error {
        return Error::SourceUnitInvalid {
            path: self.path.clone(),
            reason,
        };
    }

    /// Append the targets one `api` element declares.
    fn read_api(&self, api: Element<'_>, out: &mut Vec<Target>) -> Result<(), Error> {
        let Some(id) = attribute(api, "id") else {
            return Err(self.invalid("api element without id".to_string()));
        };
        let container = child(api, "containers")
            .and_then(|c| return child(c, "library"))
            .and_then(|l| return attribute(l, "assembly"))
            .unwrap_or_default();
        let file = child(api, "file").and_then(|f| return attribute(f, "name"));

        let Some(apidata) = child(api, "apidata") else {
            out.push(with_file(Target::new(id, container, TargetKind::Marker), file));
            return Ok(());
        };
        let group = attribute(apidata, "group").unwrap_or_default();
        let kind = match group {
            "namespace" => TargetKind::Namespace(NamespaceTarget {
                name: attribute(apidata, "name")
                    .map_or_else(|| return id.get(2..).unwrap_or_default().to_string(), str::to_string),
            }),
            "root" => TargetKind::Marker,
            "type" => TargetKind::Type(self.read_type(id, api, apidata)?),
            "member" => TargetKind::Member(self.read_member(id, api, apidata)?),
            other => return Err(self.invalid(format!("{id}: unknown group `{other}`"))),
        };
        let is_enumeration = matches!(&kind, TargetKind::Type(t) if t.kind == TypeKind::Enumeration);
        out.push(with_file(Target::new(id, container, kind), file));

        if is_enumeration {
            self.read_enumeration_values(id, container, api, out)?;
        }
        return Ok(());
    }

    /// Type data.
    fn read_type(&self, id: &str, api: Element<'_>, apidata: Element<'_>) -> Result<TypeTarget, Error> {
        let subgroup = attribute(apidata, "subgroup").unwrap_or_default();
        let kind = match subgroup {
            "class" => TypeKind::Class,
            "delegate" => TypeKind::Delegate,
            "enumeration" => TypeKind::Enumeration,
            "interface" => TypeKind::Interface,
            "structure" => TypeKind::Structure,
            other => return Err(self.invalid(format!("{id}: unknown type subgroup `{other}`"))),
        };
        let containers = child(api, "containers");
        let containing_namespace = containers
            .and_then(|c| return child(c, "namespace"))
            .and_then(|n| return attribute(n, "api"))
            .unwrap_or("N:");
        let containing_type = containers
            .and_then(|c| return child(c, "type"))
            .and_then(|t| return attribute(t, "api"))
            .map(SimpleTypeReference::new);
        return Ok(TypeTarget {
            containing_namespace: NamespaceReference {
                id: containing_namespace.to_string(),
            },
            containing_type,
            kind,
            name: attribute(apidata, "name").unwrap_or_default().to_string(),
            templates: template_names(api),
        });
    }

    /// Member data.
    fn read_member(&self, id: &str, api: Element<'_>, apidata: Element<'_>) -> Result<MemberTarget, Error> {
        let name = attribute(apidata, "name").unwrap_or_default().to_string();
        let containing_type = match child(api, "containers").and_then(|c| return child(c, "type")) {
            Some(element) => self.read_type_element(element)?,
            None => declaring_type_from_id(id).ok_or_else(|| {
                return self.invalid(format!("{id}: member without declaring type"));
            })?,
        };
        let parameters = match child(api, "parameters") {
            Some(list) => child_elements(list)
                .into_iter()
                .filter(|p| return local_name(*p) == "parameter")
                .map(|p| return self.read_parameter(id, p))
                .collect::<Result<Vec<_>, Error>>()?,
            None => Vec::new(),
        };
        let return_type = match child(api, "returns").and_then(|r| return child_elements(r).into_iter().next()) {
            Some(element) => Some(self.read_type_element(element)?),
            None => None,
        };
        let explicitly_implements = self.read_implements(api)?;

        let subgroup = attribute(apidata, "subgroup").unwrap_or_default();
        let detail = match subgroup {
            "constructor" => MemberDetail::Constructor { parameters },
            "event" => MemberDetail::Event { explicitly_implements },
            "field" => MemberDetail::Field,
            "method" => MemberDetail::Method {
                explicitly_implements,
                is_conversion_operator: name == "op_Implicit" || name == "op_Explicit",
                parameters,
                return_type,
                template_args: match child(api, "specialization") {
                    Some(list) => child_elements(list)
                        .into_iter()
                        .map(|t| return self.read_type_element(t))
                        .collect::<Result<Vec<_>, Error>>()?,
                    None => Vec::new(),
                },
                templates: template_names(api),
            },
            "property" => MemberDetail::Property {
                explicitly_implements,
                parameters,
                return_type,
            },
            other => return Err(self.invalid(format!("{id}: unknown member subgroup `{other}`"))),
        };
        return Ok(MemberTarget {
            containing_type,
            detail,
            name,
            overload_id: child(api, "memberdata")
                .and_then(|m| return attribute(m, "overload"))
                .map(str::to_string),
        });
    }

    /// One `parameter` element.
    fn read_parameter(&self, id: &str, parameter: Element<'_>) -> Result<Parameter, Error> {
        let Some(type_element) = child_elements(parameter).into_iter().next() else {
            return Err(self.invalid(format!("{id}: parameter without a type")));
        };
        return Ok(Parameter {
            name: attribute(parameter, "name").unwrap_or_default().to_string(),
            parameter_type: self.read_type_element(type_element)?,
        });
    }

    /// The interface member of an explicit implementation, if flagged.
    fn read_implements(&self, api: Element<'_>) -> Result<Option<MemberReference>, Error> {
        let is_eii = child(api, "proceduredata")
            .and_then(|p| return attribute(p, "eii"))
            .is_some_and(|v| return v == "true");
        if !is_eii {
            return Ok(None);
        }
        let Some(member) = child(api, "implements").and_then(|i| return child(i, "member")) else {
            return Ok(None);
        };
        let Some(member_id) = attribute(member, "api") else {
            return Err(self.invalid("implemented member without api".to_string()));
        };
        let through = match child(member, "type") {
            Some(element) => Some(self.read_type_element(element)?),
            None => None,
        };
        return Ok(Some(match through {
            Some(TypeReference::Specialized(specialized_type)) => MemberReference::Specialized {
                specialized_type,
                template_member: member_id.to_string(),
            },
            Some(_) | None => MemberReference::Simple {
                id: member_id.to_string(),
            },
        }));
    }

    /// Field targets for enumeration values listed as `elements/element`.
    fn read_enumeration_values(
        &self,
        enum_id: &str,
        container: &str,
        api: Element<'_>,
        out: &mut Vec<Target>,
    ) -> Result<(), Error> {
        let Some(elements) = child(api, "elements") else {
            return Ok(());
        };
        for element in child_elements(elements) {
            if child(element, "apidata").is_some() {
                let Some(element_id) = attribute(element, "api") else {
                    return Err(self.invalid(format!("{enum_id}: element without api")));
                };
                let Some(apidata) = child(element, "apidata") else {
                    continue;
                };
                let member = self.read_member(element_id, element, apidata)?;
                out.push(Target::new(element_id, container, TargetKind::Member(member)));
                continue;
            }
            let Some(element_id) = attribute(element, "api") else {
                return Err(self.invalid(format!("{enum_id}: element without api")));
            };
            let name = attribute(element, "name").map_or_else(
                || return element_id.rsplit('.').next().unwrap_or(element_id).to_string(),
                str::to_string,
            );
            out.push(Target::new(
                element_id,
                container,
                TargetKind::Member(MemberTarget {
                    containing_type: TypeReference::Simple(SimpleTypeReference::new(enum_id)),
                    detail: MemberDetail::Field,
                    name,
                    overload_id: None,
                }),
            ));
        }
        return Ok(());
    }

    /// Parse a type element: `type`, `arrayOf`, `pointerTo`, `referenceTo`
    /// or `template`.
    fn read_type_element(&self, element: Element<'_>) -> Result<TypeReference, Error> {
        return match local_name(element) {
            "arrayOf" => {
                let rank = match attribute(element, "rank") {
                    None => 1,
                    Some(text) => match text.parse::<u32>() {
                        Ok(rank) if rank > 0 => rank,
                        Ok(_) | Err(_) => return Err(self.invalid(format!("invalid array rank `{text}`"))),
                    },
                };
                Ok(TypeReference::Array {
                    element: Box::new(self.read_only_child(element)?),
                    rank,
                })
            },
            "pointerTo" => Ok(TypeReference::Pointer(Box::new(self.read_only_child(element)?))),
            "referenceTo" => Ok(TypeReference::Reference(Box::new(self.read_only_child(element)?))),
            "template" => Ok(TypeReference::Template(read_template(element))),
            "type" => self.read_named_type(element),
            other => Err(self.invalid(format!("unexpected type element `{other}`"))),
        };
    }

    /// The single type child of a decoration element.
    fn read_only_child(&self, element: Element<'_>) -> Result<TypeReference, Error> {
        let Some(inner) = child_elements(element).into_iter().next() else {
            return Err(self.invalid(format!("`{}` without element type", local_name(element))));
        };
        return self.read_type_element(inner);
    }

    /// A `type` element, specialized when any level carries a
    /// `specialization`. Nested `type` children are outer levels.
    fn read_named_type(&self, element: Element<'_>) -> Result<TypeReference, Error> {
        let Some(api) = attribute(element, "api") else {
            return Err(self.invalid("type element without api".to_string()));
        };
        let mut chain = vec![element];
        let mut current = element;
        while let Some(outer) = child(current, "type") {
            chain.push(outer);
            current = outer;
        }
        if chain.iter().all(|level| return child(*level, "specialization").is_none()) {
            return Ok(TypeReference::Simple(SimpleTypeReference::new(api)));
        }

        chain.reverse();
        let last = chain.len().saturating_sub(1);
        let mut specializations = Vec::new();
        for (position, level) in chain.into_iter().enumerate() {
            let Some(level_api) = attribute(level, "api") else {
                return Err(self.invalid("type element without api".to_string()));
            };
            let arguments = match child(level, "specialization") {
                Some(list) => child_elements(list)
                    .into_iter()
                    .map(|t| return self.read_type_element(t))
                    .collect::<Result<Vec<_>, Error>>()?,
                None if position == last => Vec::new(),
                None => continue,
            };
            specializations.push(Specialization {
                arguments,
                template: SimpleTypeReference::new(level_api),
            });
        }
        return Ok(TypeReference::Specialized(SpecializedTypeReference { specializations }));
    }
}

/// Names from `templates/template`.
fn template_names(api: Element<'_>) -> Vec<String> {
    let Some(templates) = child(api, "templates") else {
        return Vec::new();
    };
    return child_elements(templates)
        .into_iter()
        .filter(|t| return local_name(*t) == "template")
        .filter_map(|t| return attribute(t, "name").map(str::to_string))
        .collect();
}

/// A `template` element: positional on a method (`M:`) or type (`T:`)
/// owner, or known only by name.
fn read_template(element: Element<'_>) -> TemplateTypeReference {
    let name = attribute(element, "name").unwrap_or_default().to_string();
    let index = attribute(element, "index").and_then(|i| return i.parse().ok());
    return match (attribute(element, "api"), index) {
        (Some(owner), Some(index)) if owner.starts_with("M:") => TemplateTypeReference::Indexed {
            index,
            template_id: owner.to_string(),
        },
        (Some(owner), Some(position)) => TemplateTypeReference::TypeTemplate {
            position,
            template: SimpleTypeReference::new(owner),
        },
        (Some(_) | None, _) => TemplateTypeReference::Named(name),
    };
}

/// Declaring type of a member, recovered from its identifier.
fn declaring_type_from_id(id: &str) -> Option<TypeReference> {
    let parts = crate::grammar::decompose_member_id(id)?;
    return crate::reference_parser::parse_type(parts.type_path, &crate::reference_parser::GenericContext::none());
}

/// Keep the recorded file name when the unit names one.
fn with_file(mut target: Target, file: Option<&str>) -> Target {
    if let Some(file) = file {
        target.file = file.to_string();
    }
    return target;
}
