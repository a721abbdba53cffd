//! Link text resolution: turns references and targets into display text.
//!
//! Rendering is a read-only walk over the dictionary. Generic parameters are
//! substituted through a map threaded into every recursive call:
//!
//! ```text
//! Box{N.Int32}.Get(`0)
//!   specialization  T:N.Box`1 #0 → N.Int32, "T" → N.Int32
//!   parameter `0    looked up in the map → Int32
//! ```
//!
//! Identifiers missing from the dictionary render from their own text.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::dictionary::TargetDictionary;
use crate::grammar::{self, decompose_member_id, split_top_level, strip_arity};
use crate::link_text::{DisplayOptions, LanguageVariant, LinkSink, LinkText};
use crate::reference::{
    MemberReference, Parameter, Reference, Specialization, SpecializedTypeReference, TemplateTypeReference,
    TypeReference,
};
use crate::reference_parser::{GenericContext, parse_type};
use crate::target::{MemberDetail, MemberTarget, Target, TargetKind, TypeTarget};

/// Display name of a generic parameter that cannot be looked up.
pub const UNKNOWN_TEMPLATE: &str = "UTT";

/// Display name of the global namespace.
pub const DEFAULT_NAMESPACE: &str = "(Default Namespace)";

/// Outer-type chains deeper than this are treated as cyclic.
const MAX_NESTING: usize = 64;

/// Key of a generic parameter in a substitution map.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum TemplateSlot {
    /// Positional parameter of a type or method.
    Indexed {
        /// Cumulative position.
        index: usize,
        /// Declaring type or method identifier.
        owner: String,
    },
    /// Positional parameter of whichever method is being rendered.
    Method(usize),
    /// Parameter by declared name.
    Named(String),
}

/// Generic parameter → concrete type.
type Substitutions = HashMap<TemplateSlot, TypeReference>;

/// One nesting level of a type name.
struct Level {
    /// Simple name.
    name: String,
    /// Generic parameters introduced at this level.
    templates: Vec<String>,
}

/// Renders references and targets against a loaded dictionary.
#[derive(Debug, Clone, Copy)]
pub struct LinkTextResolver<'d> {
    /// Dictionary consulted for every identifier.
    targets: &'d TargetDictionary,
}

impl<'d> LinkTextResolver<'d> {
    /// Resolver over `targets`.
    pub const fn new(targets: &'d TargetDictionary) -> Self {
        return Self { targets };
    }

    /// Render a reference into fresh link text.
    pub fn render_reference(&self, reference: &Reference, options: DisplayOptions) -> LinkText {
        let mut text = LinkText::new();
        self.write_reference(reference, options, &mut text);
        return text;
    }

    /// Render a target into fresh link text.
    pub fn render_target(&self, target: &Target, options: DisplayOptions) -> LinkText {
        let mut text = LinkText::new();
        self.write_target(target, options, &mut text);
        return text;
    }

    /// Whether rendering `reference` finds its target in the dictionary
    /// rather than falling back to the identifier text.
    pub fn is_resolved(&self, reference: &Reference) -> bool {
        return match reference {
            Reference::Invalid(_) => false,
            Reference::Member(member) => match member {
                MemberReference::ExtensionMethod { method_id, .. } => self.targets.contains(method_id),
                MemberReference::Simple { id } => self.targets.contains(id),
                MemberReference::Specialized { template_member, .. } => self.targets.contains(template_member),
                MemberReference::SpecializedWithParameters { specialized_type, .. } => {
                    self.is_resolved_specialization(specialized_type)
                },
            },
            Reference::Namespace(namespace) => self.targets.contains(&namespace.id),
            Reference::Type(ty) => self.is_resolved_type(ty),
        };
    }

    /// Whether every named type inside `ty` is stored.
    fn is_resolved_type(&self, ty: &TypeReference) -> bool {
        return match ty {
            TypeReference::Array { element: inner, .. }
            | TypeReference::Pointer(inner)
            | TypeReference::Reference(inner) => self.is_resolved_type(inner),
            TypeReference::Simple(simple) => self.targets.contains(&simple.id),
            TypeReference::Specialized(specialized) => self.is_resolved_specialization(specialized),
            TypeReference::Template(_) => true,
        };
    }

    /// Whether every level's definition is stored.
    fn is_resolved_specialization(&self, specialized: &SpecializedTypeReference) -> bool {
        return specialized
            .specializations
            .iter()
            .all(|level| return self.targets.contains(&level.template.id));
    }

    /// Write a reference to `sink`.
    pub fn write_reference(&self, reference: &Reference, options: DisplayOptions, sink: &mut impl LinkSink) {
        match reference {
            Reference::Invalid(id) => sink.text(id),
            Reference::Member(member) => self.write_member_reference(member, options, sink),
            Reference::Namespace(namespace) => sink.text(&display_namespace(&self.namespace_name(&namespace.id))),
            Reference::Type(ty) => self.write_type(ty, options, &Substitutions::new(), sink),
        }
    }

    /// Write a target to `sink`.
    pub fn write_target(&self, target: &Target, options: DisplayOptions, sink: &mut impl LinkSink) {
        match &target.kind {
            TargetKind::Marker => self.write_fallback(&target.id, options, sink),
            TargetKind::Member(member) => {
                self.write_member_target(&target.id, member, None, options, &Substitutions::new(), sink);
            },
            TargetKind::Namespace(namespace) => sink.text(&display_namespace(&namespace.name)),
            TargetKind::Type(ty) => self.write_type_target(ty, options, sink),
        }
    }

    /// Write any type reference.
    fn write_type(&self, ty: &TypeReference, options: DisplayOptions, subs: &Substitutions, sink: &mut impl LinkSink) {
        match ty {
            TypeReference::Array { element, rank } => {
                sink.variant(LanguageVariant::ArrayOpen { rank: *rank });
                self.write_type(element, options, subs, sink);
                sink.variant(LanguageVariant::ArrayClose { rank: *rank });
            },
            TypeReference::Pointer(inner) => {
                self.write_type(inner, options, subs, sink);
                sink.variant(LanguageVariant::Pointer);
            },
            TypeReference::Reference(inner) => {
                self.write_type(inner, options, subs, sink);
                sink.variant(LanguageVariant::ByRef);
            },
            TypeReference::Simple(simple) => match self.type_target(&simple.id) {
                Some(target) => {
                    if let Some(data) = target.as_type() {
                        self.write_type_target(data, options, sink);
                    }
                },
                None => write_fallback_type(&simple.id, options, sink),
            },
            TypeReference::Specialized(specialized) => self.write_specialized_type(specialized, options, subs, sink),
            TypeReference::Template(template) => self.write_template(template, options, subs, sink),
        }
    }

    /// Stored type target for `id`, if it is a type.
    fn type_target(&self, id: &str) -> Option<Arc<Target>> {
        return self.targets.get(id).filter(|target| return target.as_type().is_some());
    }

    /// Namespace, outer types, name and generic parameters of a type.
    fn write_type_target(&self, data: &TypeTarget, options: DisplayOptions, sink: &mut impl LinkSink) {
        if options.contains(DisplayOptions::SHOW_CONTAINER) {
            self.write_namespace_prefix(&data.containing_namespace.id, sink);
        }
        let containing = data.containing_type.as_ref().map(|outer| return outer.id.as_str());
        let levels = self.type_levels(&data.name, &data.templates, containing, None);
        for (position, level) in levels.iter().enumerate() {
            if position > 0 {
                sink.variant(LanguageVariant::ContainerSeparator);
            }
            sink.text(&level.name);
            if options.contains(DisplayOptions::SHOW_TEMPLATES) {
                write_template_names(&level.templates, sink);
            }
        }
    }

    /// Namespace name followed by a separator; nothing for the global
    /// namespace.
    fn write_namespace_prefix(&self, namespace_id: &str, sink: &mut impl LinkSink) {
        let name = self.namespace_name(namespace_id);
        if !name.is_empty() {
            sink.text(&name);
            sink.variant(LanguageVariant::ContainerSeparator);
        }
    }

    /// Dotted namespace name, from the dictionary or the identifier.
    fn namespace_name(&self, namespace_id: &str) -> String {
        if let Some(target) = self.targets.get(namespace_id)
            && let TargetKind::Namespace(namespace) = &target.kind
        {
            return namespace.name.clone();
        }
        return namespace_id.strip_prefix("N:").unwrap_or(namespace_id).to_string();
    }

    /// Levels from the outermost type (or just below `stop`) down to the
    /// type named `name`. Each level carries only the generic parameters it
    /// introduces.
    fn type_levels(&self, name: &str, templates: &[String], containing: Option<&str>, stop: Option<&str>) -> Vec<Level> {
        let mut chain: Vec<(String, Vec<String>)> = vec![(name.to_string(), templates.to_vec())];
        let mut current = containing.map(str::to_string);
        while let Some(id) = current.take() {
            if stop == Some(id.as_str()) || chain.len() >= MAX_NESTING {
                break;
            }
            let Some(target) = self.type_target(&id) else {
                chain.extend(fallback_levels(&id, stop).into_iter().map(|name| return (name, Vec::new())));
                break;
            };
            let Some(data) = target.as_type() else {
                break;
            };
            chain.push((data.name.clone(), data.templates.clone()));
            current = data.containing_type.as_ref().map(|outer| return outer.id.clone());
        }
        chain.reverse();

        let mut inherited = 0;
        return chain
            .into_iter()
            .map(|(name, cumulative)| {
                let own = cumulative.get(inherited..).unwrap_or_default().to_vec();
                inherited = inherited.max(cumulative.len());
                return Level { name, templates: own };
            })
            .collect();
    }

    /// Each specialization level in outer → inner order. Only the first
    /// level shows its container.
    fn write_specialized_type(
        &self,
        specialized: &SpecializedTypeReference,
        options: DisplayOptions,
        subs: &Substitutions,
        sink: &mut impl LinkSink,
    ) {
        let mut previous: Option<&str> = None;
        for level in &specialized.specializations {
            let id = level.template.id.as_str();
            if previous.is_some() {
                sink.variant(LanguageVariant::ContainerSeparator);
            }
            let names: Vec<String> = match self.type_target(id) {
                Some(target) => match target.as_type() {
                    Some(data) => {
                        if previous.is_none() && options.contains(DisplayOptions::SHOW_CONTAINER) {
                            self.write_namespace_prefix(&data.containing_namespace.id, sink);
                        }
                        let containing = data.containing_type.as_ref().map(|outer| return outer.id.as_str());
                        self.type_levels(&data.name, &[], containing, previous)
                            .into_iter()
                            .map(|l| return l.name)
                            .collect()
                    },
                    None => Vec::new(),
                },
                None => {
                    if previous.is_none() && options.contains(DisplayOptions::SHOW_CONTAINER) {
                        write_fallback_namespace(id, sink);
                    }
                    let mut names = fallback_levels(id, previous);
                    names.reverse();
                    names
                },
            };
            write_dotted(&names, sink);

            if options.contains(DisplayOptions::SHOW_TEMPLATES) && !level.arguments.is_empty() {
                sink.variant(LanguageVariant::TemplateListOpen);
                for (position, argument) in level.arguments.iter().enumerate() {
                    if position > 0 {
                        sink.variant(LanguageVariant::ListSeparator);
                    }
                    self.write_type(argument, options.without(DisplayOptions::SHOW_CONTAINER), subs, sink);
                }
                sink.variant(LanguageVariant::TemplateListClose);
            }
            previous = Some(id);
        }
    }

    /// A generic parameter: its substitution if one is in scope, else its
    /// declared name.
    fn write_template(
        &self,
        template: &TemplateTypeReference,
        options: DisplayOptions,
        subs: &Substitutions,
        sink: &mut impl LinkSink,
    ) {
        let slot = template_slot(template);
        let method_slot = match template {
            TemplateTypeReference::Indexed { index, template_id } if template_id.starts_with("M:") => {
                Some(TemplateSlot::Method(*index))
            },
            TemplateTypeReference::Indexed { .. }
            | TemplateTypeReference::Named(_)
            | TemplateTypeReference::TypeTemplate { .. } => None,
        };
        let found = subs
            .get(&slot)
            .or_else(|| return method_slot.as_ref().and_then(|m| return subs.get(m)));
        if let Some(value) = found {
            self.write_type(value, options, &Substitutions::new(), sink);
            return;
        }
        sink.variant(LanguageVariant::TemplateParameter(self.template_name(template)));
    }

    /// Declared name of a generic parameter, or [`UNKNOWN_TEMPLATE`].
    fn template_name(&self, template: &TemplateTypeReference) -> String {
        let (owner, index) = match template {
            TemplateTypeReference::Indexed { index, template_id } => (template_id.as_str(), *index),
            TemplateTypeReference::Named(name) => return name.clone(),
            TemplateTypeReference::TypeTemplate { position, template } => (template.id.as_str(), *position),
        };
        let name = self.targets.get(owner).and_then(|target| {
            return match &target.kind {
                TargetKind::Member(member) => member.templates().get(index).cloned(),
                TargetKind::Type(data) => data.templates.get(index).cloned(),
                TargetKind::Marker | TargetKind::Namespace(_) => None,
            };
        });
        return name.unwrap_or_else(|| {
            debug!(owner, index, "unknown generic parameter");
            return UNKNOWN_TEMPLATE.to_string();
        });
    }

    /// Map the parameters of every level of `specialized` to its arguments.
    fn specialization_substitutions(&self, specialized: &SpecializedTypeReference) -> Substitutions {
        let mut subs = Substitutions::new();
        let mut cumulative: Vec<TypeReference> = Vec::new();
        for level in &specialized.specializations {
            cumulative.extend(level.arguments.iter().cloned());
            for (index, argument) in cumulative.iter().enumerate() {
                let _previous = subs.insert(
                    TemplateSlot::Indexed {
                        index,
                        owner: level.template.id.clone(),
                    },
                    argument.clone(),
                );
            }
            if let Some(target) = self.type_target(&level.template.id)
                && let Some(data) = target.as_type()
            {
                for (name, argument) in data.templates.iter().zip(&cumulative) {
                    let _previous = subs.insert(TemplateSlot::Named(name.clone()), argument.clone());
                }
            }
        }
        return subs;
    }

    /// Write a member reference.
    fn write_member_reference(&self, member: &MemberReference, options: DisplayOptions, sink: &mut impl LinkSink) {
        match member {
            MemberReference::ExtensionMethod {
                name,
                parameters,
                template_args,
                ..
            } => {
                let subs = Substitutions::new();
                sink.text(name);
                if options.contains(DisplayOptions::SHOW_TEMPLATES) {
                    self.write_type_list(template_args, &subs, sink);
                }
                if options.contains(DisplayOptions::SHOW_PARAMETERS) {
                    self.write_parameters(parameters.iter().map(|p| return &p.parameter_type), false, &subs, sink);
                }
            },
            MemberReference::Simple { id } => match self.targets.get(id) {
                Some(target) => match &target.kind {
                    TargetKind::Member(data) => {
                        self.write_member_target(id, data, None, options, &Substitutions::new(), sink);
                    },
                    TargetKind::Marker | TargetKind::Namespace(_) | TargetKind::Type(_) => {
                        self.write_target(&target, options, sink);
                    },
                },
                None => self.write_fallback_member(id, options, sink),
            },
            MemberReference::Specialized {
                specialized_type,
                template_member,
            } => {
                let subs = self.specialization_substitutions(specialized_type);
                let container = TypeReference::Specialized(specialized_type.clone());
                match self.targets.get(template_member) {
                    Some(target) => match &target.kind {
                        TargetKind::Member(data) => {
                            self.write_member_target(template_member, data, Some(&container), options, &subs, sink);
                        },
                        TargetKind::Marker | TargetKind::Namespace(_) | TargetKind::Type(_) => {
                            self.write_target(&target, options, sink);
                        },
                    },
                    None => {
                        self.write_container(&container, options, &subs, sink);
                        let name = decompose_member_id(template_member)
                            .map_or_else(|| return template_member.clone(), |parts| return display_member_name(parts.name));
                        sink.text(&name);
                    },
                }
            },
            MemberReference::SpecializedWithParameters {
                member_name,
                parameter_types,
                prefix,
                specialized_type,
            } => {
                let subs = self.specialization_substitutions(specialized_type);
                let container = TypeReference::Specialized(specialized_type.clone());
                if let Some(definition) = self.definition_member(*prefix, member_name, parameter_types, specialized_type)
                    && let Some(data) = definition.as_member()
                {
                    self.write_member_target(&definition.id, data, Some(&container), options, &subs, sink);
                    return;
                }
                if is_constructor_name(member_name) {
                    self.write_type(&container, options, &subs, sink);
                } else {
                    self.write_container(&container, options, &subs, sink);
                    sink.text(&display_member_name(member_name));
                }
                if options.contains(DisplayOptions::SHOW_PARAMETERS) {
                    match prefix {
                        'P' if !parameter_types.is_empty() => {
                            self.write_parameters(parameter_types.iter(), true, &subs, sink);
                        },
                        'M' => self.write_parameters(parameter_types.iter(), false, &subs, sink),
                        _ => {},
                    }
                }
            },
        }
    }

    /// Stored definition of a member reached through an instantiation with
    /// a parameter list. Parameter types equal to an instantiation argument
    /// are mapped back to the definition's parameter first; the text as
    /// written is the fallback. Conversion operators match on everything
    /// before their `~` return type.
    fn definition_member(
        &self,
        prefix: char,
        member_name: &str,
        parameter_types: &[TypeReference],
        specialized: &SpecializedTypeReference,
    ) -> Option<Arc<Target>> {
        let template = specialized.innermost_template()?;
        let arguments: Vec<&TypeReference> =
            specialized.specializations.iter().flat_map(|level| return level.arguments.iter()).collect();
        let generic: Vec<String> = parameter_types
            .iter()
            .map(|p| return unsubstitute(p, &arguments, &template.id).identifier_text())
            .collect();
        let literal: Vec<String> = parameter_types.iter().map(TypeReference::identifier_text).collect();

        let base = format!("{prefix}:{}.{member_name}", template.path());
        let mut candidates = vec![format!("{base}({})", generic.join(",")), format!("{base}({})", literal.join(","))];
        if parameter_types.is_empty() {
            candidates.push(base);
        }
        let conversion = member_name == "op_Implicit" || member_name == "op_Explicit";
        for candidate in candidates {
            if self.targets.contains(&candidate) {
                return self.targets.get(&candidate);
            }
            if conversion && let Some(target) = self.targets.first_with_prefix(&format!("{candidate}~")) {
                return Some(target);
            }
        }
        return None;
    }

    /// Containing type and separator, when containers are shown.
    fn write_container(
        &self,
        container: &TypeReference,
        options: DisplayOptions,
        subs: &Substitutions,
        sink: &mut impl LinkSink,
    ) {
        if options.contains(DisplayOptions::SHOW_CONTAINER) {
            self.write_type(container, options, subs, sink);
            sink.variant(LanguageVariant::ContainerSeparator);
        }
    }

    /// Kind-specific member body. `container` replaces the declared
    /// containing type when the member is reached through an instantiation.
    fn write_member_target(
        &self,
        id: &str,
        member: &MemberTarget,
        container: Option<&TypeReference>,
        options: DisplayOptions,
        subs: &Substitutions,
        sink: &mut impl LinkSink,
    ) {
        let container = container.unwrap_or(&member.containing_type);
        match &member.detail {
            MemberDetail::Constructor { parameters } => {
                self.write_type(container, options, subs, sink);
                if options.contains(DisplayOptions::SHOW_PARAMETERS) {
                    self.write_parameters(parameter_types(parameters), false, subs, sink);
                }
            },
            MemberDetail::Event { explicitly_implements } => {
                self.write_container(container, options, subs, sink);
                self.write_member_name(&member.name, explicitly_implements.as_ref(), sink);
            },
            MemberDetail::Field => {
                self.write_container(container, options, subs, sink);
                sink.text(&member.name);
            },
            MemberDetail::Method {
                explicitly_implements,
                is_conversion_operator,
                parameters,
                return_type,
                template_args,
                templates,
            } => {
                let mut subs = subs.clone();
                for (index, argument) in template_args.iter().enumerate() {
                    let _previous = subs.insert(
                        TemplateSlot::Indexed {
                            index,
                            owner: id.to_string(),
                        },
                        argument.clone(),
                    );
                    let _previous = subs.insert(TemplateSlot::Method(index), argument.clone());
                    if let Some(name) = templates.get(index) {
                        let _previous = subs.insert(TemplateSlot::Named(name.clone()), argument.clone());
                    }
                }

                self.write_container(container, options, &subs, sink);
                if *is_conversion_operator {
                    sink.text(member.name.strip_prefix("op_").unwrap_or(&member.name));
                } else {
                    self.write_member_name(&member.name, explicitly_implements.as_ref(), sink);
                }
                if options.contains(DisplayOptions::SHOW_TEMPLATES) {
                    if template_args.is_empty() {
                        write_template_names(templates, sink);
                    } else {
                        self.write_type_list(template_args, &subs, sink);
                    }
                }
                if !options.contains(DisplayOptions::SHOW_PARAMETERS) {
                    return;
                }
                if *is_conversion_operator {
                    sink.text("(");
                    if let Some(from) = parameters.first() {
                        self.write_type(&from.parameter_type, DisplayOptions::DEFAULT, &subs, sink);
                    }
                    sink.text(" to ");
                    if let Some(to) = return_type {
                        self.write_type(to, DisplayOptions::DEFAULT, &subs, sink);
                    }
                    sink.text(")");
                } else {
                    self.write_parameters(parameter_types(parameters), false, &subs, sink);
                }
            },
            MemberDetail::Property {
                explicitly_implements,
                parameters,
                ..
            } => {
                self.write_container(container, options, subs, sink);
                self.write_member_name(&member.name, explicitly_implements.as_ref(), sink);
                if options.contains(DisplayOptions::SHOW_PARAMETERS) && !parameters.is_empty() {
                    self.write_parameters(parameter_types(parameters), true, subs, sink);
                }
            },
        }
    }

    /// Declared name, or the qualified name of the interface member an
    /// explicit implementation implements.
    fn write_member_name(&self, name: &str, implements: Option<&MemberReference>, sink: &mut impl LinkSink) {
        let Some(implemented) = implements else {
            sink.text(name);
            return;
        };
        let interface_options = DisplayOptions::SHOW_TEMPLATES;
        match implemented {
            MemberReference::Simple { id } => match self.targets.get(id) {
                Some(target) => match target.as_member() {
                    Some(data) => {
                        self.write_type(&data.containing_type, interface_options, &Substitutions::new(), sink);
                        sink.variant(LanguageVariant::ContainerSeparator);
                        sink.text(&data.name);
                    },
                    None => sink.text(name),
                },
                None => self.write_fallback_member(id, DisplayOptions::SHOW_CONTAINER, sink),
            },
            MemberReference::Specialized {
                specialized_type,
                template_member,
            } => {
                let subs = self.specialization_substitutions(specialized_type);
                self.write_specialized_type(specialized_type, interface_options, &subs, sink);
                sink.variant(LanguageVariant::ContainerSeparator);
                let member_name = self
                    .targets
                    .get(template_member)
                    .and_then(|target| return target.as_member().map(|data| return data.name.clone()))
                    .or_else(|| {
                        return decompose_member_id(template_member).map(|parts| return display_member_name(parts.name));
                    })
                    .unwrap_or_else(|| return name.to_string());
                sink.text(&member_name);
            },
            MemberReference::ExtensionMethod { .. } | MemberReference::SpecializedWithParameters { .. } => {
                sink.text(name);
            },
        }
    }

    /// `(A, B)` or, for indexers, `[A, B]` in the convention's brackets.
    fn write_parameters<'r>(
        &self,
        types: impl Iterator<Item = &'r TypeReference>,
        indexer: bool,
        subs: &Substitutions,
        sink: &mut impl LinkSink,
    ) {
        if indexer {
            sink.variant(LanguageVariant::IndexerOpen);
        } else {
            sink.text("(");
        }
        for (position, ty) in types.enumerate() {
            if position > 0 {
                sink.variant(LanguageVariant::ListSeparator);
            }
            self.write_type(ty, DisplayOptions::DEFAULT, subs, sink);
        }
        if indexer {
            sink.variant(LanguageVariant::IndexerClose);
        } else {
            sink.text(")");
        }
    }

    /// `<A, B>` of generic arguments; nothing when empty.
    fn write_type_list(&self, arguments: &[TypeReference], subs: &Substitutions, sink: &mut impl LinkSink) {
        if arguments.is_empty() {
            return;
        }
        sink.variant(LanguageVariant::TemplateListOpen);
        for (position, argument) in arguments.iter().enumerate() {
            if position > 0 {
                sink.variant(LanguageVariant::ListSeparator);
            }
            self.write_type(argument, DisplayOptions::DEFAULT, subs, sink);
        }
        sink.variant(LanguageVariant::TemplateListClose);
    }

    /// Best-effort text for an identifier with no usable target.
    fn write_fallback(&self, id: &str, options: DisplayOptions, sink: &mut impl LinkSink) {
        match id.split_once(':') {
            Some(("N", name)) => sink.text(&display_namespace(name)),
            Some(("T", _)) => write_fallback_type(id, options, sink),
            Some(("M" | "P" | "F" | "E", _)) => self.write_fallback_member(id, options, sink),
            Some(_) | None => sink.text(id),
        }
    }

    /// A member identifier not in the dictionary: name after the last `.`
    /// or `#`, parameters parsed from the identifier.
    fn write_fallback_member(&self, id: &str, options: DisplayOptions, sink: &mut impl LinkSink) {
        debug!(id, "rendering unresolved member from its identifier");
        let Some(parts) = decompose_member_id(id) else {
            sink.text(id);
            return;
        };
        let context = GenericContext::from_cref(id);
        let declaring = parse_type(parts.type_path, &context);
        if is_constructor_name(parts.name) {
            match &declaring {
                Some(ty) => self.write_type(ty, options.without(DisplayOptions::SHOW_TEMPLATES), &Substitutions::new(), sink),
                None => sink.text(parts.type_path),
            }
        } else {
            if options.contains(DisplayOptions::SHOW_CONTAINER)
                && let Some(ty) = &declaring
            {
                self.write_type(ty, options.without(DisplayOptions::SHOW_CONTAINER), &Substitutions::new(), sink);
                sink.variant(LanguageVariant::ContainerSeparator);
            }
            sink.text(&display_member_name(parts.name));
        }

        let Some(list) = parts.parameters else {
            return;
        };
        if !options.contains(DisplayOptions::SHOW_PARAMETERS) {
            return;
        }
        let indexer = parts.prefix == 'P';
        if indexer {
            sink.variant(LanguageVariant::IndexerOpen);
        } else {
            sink.text("(");
        }
        for (position, raw) in split_top_level(list).into_iter().enumerate() {
            if position > 0 {
                sink.variant(LanguageVariant::ListSeparator);
            }
            match parse_type(raw, &context) {
                Some(ty) => self.write_type(&ty, DisplayOptions::DEFAULT, &Substitutions::new(), sink),
                None => sink.text(raw),
            }
        }
        if indexer {
            sink.variant(LanguageVariant::IndexerClose);
        } else {
            sink.text(")");
        }
    }
}

/// `ty` with every occurrence of an instantiation argument replaced by the
/// matching positional parameter of `template_id`.
fn unsubstitute(ty: &TypeReference, arguments: &[&TypeReference], template_id: &str) -> TypeReference {
    if let Some(index) = arguments.iter().position(|argument| return *argument == ty) {
        return TypeReference::Template(TemplateTypeReference::Indexed {
            index,
            template_id: template_id.to_string(),
        });
    }
    return match ty {
        TypeReference::Array { element, rank } => TypeReference::Array {
            element: Box::new(unsubstitute(element, arguments, template_id)),
            rank: *rank,
        },
        TypeReference::Pointer(inner) => TypeReference::Pointer(Box::new(unsubstitute(inner, arguments, template_id))),
        TypeReference::Reference(inner) => {
            TypeReference::Reference(Box::new(unsubstitute(inner, arguments, template_id)))
        },
        TypeReference::Specialized(specialized) => TypeReference::Specialized(SpecializedTypeReference {
            specializations: specialized
                .specializations
                .iter()
                .map(|level| {
                    return Specialization {
                        arguments: level.arguments.iter().map(|a| return unsubstitute(a, arguments, template_id)).collect(),
                        template: level.template.clone(),
                    };
                })
                .collect(),
        }),
        TypeReference::Simple(_) | TypeReference::Template(_) => ty.clone(),
    };
}

/// Parameter types in declaration order.
fn parameter_types(parameters: &[Parameter]) -> impl Iterator<Item = &TypeReference> {
    return parameters.iter().map(|p| return &p.parameter_type);
}

/// Map key of a generic parameter.
fn template_slot(template: &TemplateTypeReference) -> TemplateSlot {
    return match template {
        TemplateTypeReference::Indexed { index, template_id } => TemplateSlot::Indexed {
            index: *index,
            owner: template_id.clone(),
        },
        TemplateTypeReference::Named(name) => TemplateSlot::Named(name.clone()),
        TemplateTypeReference::TypeTemplate { position, template } => TemplateSlot::Indexed {
            index: *position,
            owner: template.id.clone(),
        },
    };
}

/// `<T, U>` of declared parameter names; nothing when empty.
fn write_template_names(names: &[String], sink: &mut impl LinkSink) {
    if names.is_empty() {
        return;
    }
    sink.variant(LanguageVariant::TemplateListOpen);
    for (position, name) in names.iter().enumerate() {
        if position > 0 {
            sink.variant(LanguageVariant::ListSeparator);
        }
        sink.variant(LanguageVariant::TemplateParameter(name.clone()));
    }
    sink.variant(LanguageVariant::TemplateListClose);
}

/// Names joined by container separators.
fn write_dotted(names: &[String], sink: &mut impl LinkSink) {
    for (position, name) in names.iter().enumerate() {
        if position > 0 {
            sink.variant(LanguageVariant::ContainerSeparator);
        }
        sink.text(name);
    }
}

/// A type identifier not in the dictionary: last segment, with its
/// dotted prefix when containers are shown.
fn write_fallback_type(id: &str, options: DisplayOptions, sink: &mut impl LinkSink) {
    debug!(id, "rendering unresolved type from its identifier");
    let path = id.strip_prefix("T:").unwrap_or(id);
    if options.contains(DisplayOptions::SHOW_CONTAINER) {
        write_fallback_namespace(id, sink);
    }
    let name = match grammar::rfind_top_level(path, '.') {
        Some(dot) => path.get(dot.saturating_add(1)..).unwrap_or(path),
        None => path,
    };
    sink.text(strip_arity(name));
}

/// Everything before the last segment of a type identifier, as a
/// namespace-style prefix.
fn write_fallback_namespace(id: &str, sink: &mut impl LinkSink) {
    let path = id.strip_prefix("T:").unwrap_or(id);
    let Some(dot) = grammar::rfind_top_level(path, '.') else {
        return;
    };
    let segments: Vec<String> = path
        .get(..dot)
        .unwrap_or_default()
        .split('.')
        .map(|segment| return strip_arity(segment).to_string())
        .collect();
    write_dotted(&segments, sink);
    sink.variant(LanguageVariant::ContainerSeparator);
}

/// Level names of an unstored type, innermost first: the segments below
/// `stop` when the identifier extends it, else just the last segment.
fn fallback_levels(id: &str, stop: Option<&str>) -> Vec<String> {
    let path = id.strip_prefix("T:").unwrap_or(id);
    let below_stop = stop
        .map(|s| return s.strip_prefix("T:").unwrap_or(s))
        .and_then(|s| return path.strip_prefix(s))
        .and_then(|rest| return rest.strip_prefix('.'));
    if let Some(rest) = below_stop {
        return rest.rsplit('.').map(|segment| return strip_arity(segment).to_string()).collect();
    }
    let last = path.rsplit('.').next().unwrap_or(path);
    return vec![strip_arity(last).to_string()];
}

/// Display form of a member name from an identifier: the part after the
/// last `#`, without arity.
fn display_member_name(name: &str) -> String {
    let simple = name.rsplit('#').next().unwrap_or(name);
    return strip_arity(simple).to_string();
}

/// `#ctor` or `#cctor`.
fn is_constructor_name(name: &str) -> bool {
    return name == "#ctor" || name == "#cctor";
}

/// Namespace display name; the global namespace has a fixed label.
fn display_namespace(name: &str) -> String {
    if name.is_empty() {
        return DEFAULT_NAMESPACE.to_string();
    }
    return name.to_string();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::TypeKind;
    use crate::link_text::Convention;
    use crate::reference::{NamespaceReference, SimpleTypeReference, Specialization};
    use crate::reference_parser::parse_reference;

    fn simple(id: &str) -> TypeReference {
        return TypeReference::Simple(SimpleTypeReference::new(id));
    }

    fn type_target(id: &str, name: &str, templates: &[&str], outer: Option<&str>, kind: TypeKind) -> Target {
        return Target::new(
            id,
            "Widgets",
            TargetKind::Type(TypeTarget {
                containing_namespace: NamespaceReference { id: "N:N".to_string() },
                containing_type: outer.map(SimpleTypeReference::new),
                kind,
                name: name.to_string(),
                templates: templates.iter().map(|t| return (*t).to_string()).collect(),
            }),
        );
    }

    fn member_target(id: &str, owner: &str, name: &str, detail: MemberDetail) -> Target {
        return Target::new(
            id,
            "Widgets",
            TargetKind::Member(MemberTarget {
                containing_type: simple(owner),
                detail,
                name: name.to_string(),
                overload_id: None,
            }),
        );
    }

    fn parameter(name: &str, ty: TypeReference) -> Parameter {
        return Parameter {
            name: name.to_string(),
            parameter_type: ty,
        };
    }

    fn method(parameters: Vec<Parameter>, return_type: Option<TypeReference>) -> MemberDetail {
        return MemberDetail::Method {
            explicitly_implements: None,
            is_conversion_operator: false,
            parameters,
            return_type,
            template_args: Vec::new(),
            templates: Vec::new(),
        };
    }

    fn box_parameter() -> TypeReference {
        return TypeReference::Template(TemplateTypeReference::TypeTemplate {
            position: 0,
            template: SimpleTypeReference::new("T:N.Box`1"),
        });
    }

    fn dictionary() -> TargetDictionary {
        let targets = TargetDictionary::new();
        targets.insert(Target::new(
            "N:N",
            "Widgets",
            TargetKind::Namespace(crate::target::NamespaceTarget { name: "N".to_string() }),
        ));
        targets.insert(type_target("T:N.Widget", "Widget", &[], None, TypeKind::Class));
        targets.insert(type_target("T:N.Color", "Color", &[], None, TypeKind::Enumeration));
        targets.insert(type_target("T:N.Int32", "Int32", &[], None, TypeKind::Structure));
        targets.insert(type_target("T:N.Box`1", "Box", &["T"], None, TypeKind::Class));
        targets.insert(type_target("T:N.Outer`1", "Outer", &["T"], None, TypeKind::Class));
        targets.insert(type_target(
            "T:N.Outer`1.Inner`1",
            "Inner",
            &["T", "U"],
            Some("T:N.Outer`1"),
            TypeKind::Class,
        ));
        targets.insert(member_target(
            "M:N.Widget.#ctor(N.Color)",
            "T:N.Widget",
            ".ctor",
            MemberDetail::Constructor {
                parameters: vec![parameter("color", simple("T:N.Color"))],
            },
        ));
        targets.insert(member_target(
            "M:N.Box`1.Get(`0)",
            "T:N.Box`1",
            "Get",
            method(vec![parameter("fallback", box_parameter())], Some(box_parameter())),
        ));
        targets.insert(member_target(
            "M:N.Widget.op_Implicit(N.Color)~N.Widget",
            "T:N.Widget",
            "op_Implicit",
            MemberDetail::Method {
                explicitly_implements: None,
                is_conversion_operator: true,
                parameters: vec![parameter("color", simple("T:N.Color"))],
                return_type: Some(simple("T:N.Widget")),
                template_args: Vec::new(),
                templates: Vec::new(),
            },
        ));
        targets.insert(member_target(
            "P:N.Widget.Item(N.Int32)",
            "T:N.Widget",
            "Item",
            MemberDetail::Property {
                explicitly_implements: None,
                parameters: vec![parameter("index", simple("T:N.Int32"))],
                return_type: Some(simple("T:N.Color")),
            },
        ));
        targets.insert(member_target(
            "M:N.Widget.System#IDisposable#Dispose",
            "T:N.Widget",
            "Dispose",
            MemberDetail::Method {
                explicitly_implements: Some(MemberReference::Simple {
                    id: "M:System.IDisposable.Dispose".to_string(),
                }),
                is_conversion_operator: false,
                parameters: Vec::new(),
                return_type: None,
                template_args: Vec::new(),
                templates: Vec::new(),
            },
        ));
        targets.insert(member_target(
            "M:N.Widget.Map``1(``0)",
            "T:N.Widget",
            "Map",
            MemberDetail::Method {
                explicitly_implements: None,
                is_conversion_operator: false,
                parameters: vec![parameter(
                    "value",
                    TypeReference::Template(TemplateTypeReference::Indexed {
                        index: 0,
                        template_id: "M:N.Widget.Map``1(``0)".to_string(),
                    }),
                )],
                return_type: None,
                template_args: Vec::new(),
                templates: vec!["TValue".to_string()],
            },
        ));
        targets.insert(member_target(
            "M:N.Box`1.Map``1(``0)",
            "T:N.Box`1",
            "Map",
            MemberDetail::Method {
                explicitly_implements: None,
                is_conversion_operator: false,
                parameters: vec![parameter(
                    "value",
                    TypeReference::Template(TemplateTypeReference::Indexed {
                        index: 0,
                        template_id: "M:N.Box`1.Map``1(``0)".to_string(),
                    }),
                )],
                return_type: Some(box_parameter()),
                template_args: Vec::new(),
                templates: vec!["TValue".to_string()],
            },
        ));
        targets.insert(member_target(
            "M:N.Box`1.System#IComparable#CompareTo(System.Object)",
            "T:N.Box`1",
            "CompareTo",
            MemberDetail::Method {
                explicitly_implements: Some(MemberReference::Simple {
                    id: "M:System.IComparable.CompareTo(System.Object)".to_string(),
                }),
                is_conversion_operator: false,
                parameters: vec![parameter("other", simple("T:System.Object"))],
                return_type: Some(simple("T:N.Int32")),
                template_args: Vec::new(),
                templates: Vec::new(),
            },
        ));
        targets.insert(member_target(
            "M:N.Box`1.op_Implicit(`0)~N.Box{`0}",
            "T:N.Box`1",
            "op_Implicit",
            MemberDetail::Method {
                explicitly_implements: None,
                is_conversion_operator: true,
                parameters: vec![parameter("value", box_parameter())],
                return_type: Some(TypeReference::Specialized(SpecializedTypeReference {
                    specializations: vec![Specialization {
                        arguments: vec![box_parameter()],
                        template: SimpleTypeReference::new("T:N.Box`1"),
                    }],
                })),
                template_args: Vec::new(),
                templates: Vec::new(),
            },
        ));
        return targets;
    }

    fn render(targets: &TargetDictionary, api: &str, options: DisplayOptions, convention: Convention) -> String {
        let resolver = LinkTextResolver::new(targets);
        let reference = parse_reference(api, &GenericContext::from_cref(api));
        return resolver.render_reference(&reference, options).render(convention);
    }

    #[test]
    fn constructor_renders_type_name_and_parameters() {
        let targets = dictionary();
        assert_eq!(
            render(&targets, "M:N.Widget.#ctor(N.Color)", DisplayOptions::SHOW_PARAMETERS, Convention::CSharp),
            "Widget(Color)"
        );
        assert_eq!(
            render(
                &targets,
                "M:N.Widget.#ctor(N.Color)",
                DisplayOptions::SHOW_CONTAINER | DisplayOptions::SHOW_PARAMETERS,
                Convention::Cpp
            ),
            "N::Widget(Color)"
        );
    }

    #[test]
    fn member_of_specialization_substitutes_arguments() {
        let targets = dictionary();
        let resolver = LinkTextResolver::new(&targets);
        let reference = Reference::Member(MemberReference::Specialized {
            specialized_type: SpecializedTypeReference {
                specializations: vec![Specialization {
                    arguments: vec![simple("T:N.Int32")],
                    template: SimpleTypeReference::new("T:N.Box`1"),
                }],
            },
            template_member: "M:N.Box`1.Get(`0)".to_string(),
        });
        let all = DisplayOptions::SHOW_CONTAINER | DisplayOptions::DEFAULT;
        assert_eq!(
            resolver.render_reference(&reference, all).render(Convention::CSharp),
            "N.Box<Int32>.Get(Int32)"
        );
        assert_eq!(
            resolver.render_reference(&reference, DisplayOptions::DEFAULT).render(Convention::VisualBasic),
            "Get(Int32)"
        );
    }

    #[test]
    fn generic_definition_renders_parameter_names() {
        let targets = dictionary();
        assert_eq!(
            render(&targets, "M:N.Box`1.Get(`0)", DisplayOptions::DEFAULT, Convention::FSharp),
            "Get('T)"
        );
        assert_eq!(
            render(&targets, "M:N.Widget.Map``1(``0)", DisplayOptions::DEFAULT, Convention::CSharp),
            "Map<TValue>(TValue)"
        );
    }

    #[test]
    fn specialized_text_identifier_renders_through_instantiation() {
        let targets = dictionary();
        assert_eq!(
            render(
                &targets,
                "M:N.Box{N.Int32}.Get(N.Int32)",
                DisplayOptions::SHOW_CONTAINER | DisplayOptions::DEFAULT,
                Convention::CSharp
            ),
            "N.Box<Int32>.Get(Int32)"
        );
    }

    #[test]
    fn generic_method_of_instantiation_keeps_its_own_parameters() {
        let targets = dictionary();
        let api = "M:N.Box{N.Int32}.Map``1(``0)";
        let options = DisplayOptions::SHOW_TEMPLATES | DisplayOptions::SHOW_PARAMETERS;
        assert_eq!(render(&targets, api, options, Convention::CSharp), "Map<TValue>(TValue)");
        assert_eq!(
            render(&targets, api, options | DisplayOptions::SHOW_CONTAINER, Convention::VisualBasic),
            "N.Box(Of Int32).Map(Of TValue)(TValue)"
        );
    }

    #[test]
    fn explicit_implementation_on_instantiation_shows_interface_member() {
        let targets = dictionary();
        assert_eq!(
            render(
                &targets,
                "M:N.Box{N.Int32}.System#IComparable#CompareTo(System.Object)",
                DisplayOptions::DEFAULT,
                Convention::CSharp
            ),
            "IComparable.CompareTo(Object)"
        );
    }

    #[test]
    fn conversion_operator_on_instantiation_renders_from_and_to() {
        let targets = dictionary();
        for api in ["M:N.Box{N.Int32}.op_Implicit(N.Int32)", "M:N.Box{N.Int32}.op_Implicit(N.Int32)~N.Box{N.Int32}"] {
            assert_eq!(
                render(&targets, api, DisplayOptions::DEFAULT, Convention::CSharp),
                "Implicit(Int32 to Box<Int32>)",
                "{api}"
            );
        }
    }

    #[test]
    fn instantiation_argument_inside_parameter_maps_back_to_definition() {
        let targets = dictionary();
        let fill = "M:N.Box`1.Fill``1(`0[],``0)";
        targets.insert(member_target(
            fill,
            "T:N.Box`1",
            "Fill",
            MemberDetail::Method {
                explicitly_implements: None,
                is_conversion_operator: false,
                parameters: vec![
                    parameter(
                        "values",
                        TypeReference::Array {
                            element: Box::new(box_parameter()),
                            rank: 1,
                        },
                    ),
                    parameter(
                        "seed",
                        TypeReference::Template(TemplateTypeReference::Indexed {
                            index: 0,
                            template_id: fill.to_string(),
                        }),
                    ),
                ],
                return_type: None,
                template_args: Vec::new(),
                templates: vec!["TSeed".to_string()],
            },
        ));
        assert_eq!(
            render(
                &targets,
                "M:N.Box{N.Color}.Fill``1(N.Color[],``0)",
                DisplayOptions::DEFAULT,
                Convention::CSharp
            ),
            "Fill<TSeed>(Color[], TSeed)"
        );
    }

    #[test]
    fn arrays_render_per_convention() {
        let targets = dictionary();
        let options = DisplayOptions::DEFAULT;
        assert_eq!(render(&targets, "T:N.Widget[0:,0:]", options, Convention::CSharp), "Widget[,]");
        assert_eq!(render(&targets, "T:N.Widget[0:,0:]", options, Convention::VisualBasic), "Widget(,)");
        assert_eq!(render(&targets, "T:N.Widget[0:,0:]", options, Convention::Cpp), "array<Widget, 2>");
        assert_eq!(render(&targets, "T:N.Widget[]", options, Convention::CSharp), "Widget[]");
    }

    #[test]
    fn nested_types_show_each_level() {
        let targets = dictionary();
        let all = DisplayOptions::SHOW_CONTAINER | DisplayOptions::SHOW_TEMPLATES;
        assert_eq!(render(&targets, "T:N.Outer`1.Inner`1", all, Convention::CSharp), "N.Outer<T>.Inner<U>");
        assert_eq!(
            render(&targets, "T:N.Outer`1.Inner`1", DisplayOptions::NONE, Convention::CSharp),
            "Outer.Inner"
        );
        assert_eq!(
            render(&targets, "T:N.Outer{N.Color}.Inner{N.Widget}", all, Convention::VisualBasic),
            "N.Outer(Of Color).Inner(Of Widget)"
        );
    }

    #[test]
    fn conversion_operators_render_from_and_to() {
        let targets = dictionary();
        assert_eq!(
            render(
                &targets,
                "M:N.Widget.op_Implicit(N.Color)~N.Widget",
                DisplayOptions::DEFAULT,
                Convention::CSharp
            ),
            "Implicit(Color to Widget)"
        );
    }

    #[test]
    fn indexers_use_convention_brackets() {
        let targets = dictionary();
        let api = "P:N.Widget.Item(N.Int32)";
        assert_eq!(render(&targets, api, DisplayOptions::DEFAULT, Convention::CSharp), "Item[Int32]");
        assert_eq!(render(&targets, api, DisplayOptions::DEFAULT, Convention::VisualBasic), "Item(Int32)");
        assert_eq!(render(&targets, api, DisplayOptions::NONE, Convention::CSharp), "Item");
    }

    #[test]
    fn explicit_implementations_show_interface_member() {
        let targets = dictionary();
        assert_eq!(
            render(
                &targets,
                "M:N.Widget.System#IDisposable#Dispose",
                DisplayOptions::DEFAULT,
                Convention::CSharp
            ),
            "IDisposable.Dispose()"
        );
    }

    #[test]
    fn unresolved_identifiers_fall_back_to_their_text() {
        let targets = dictionary();
        let resolver = LinkTextResolver::new(&targets);
        assert_eq!(
            render(&targets, "T:System.Collections.Generic.List`1", DisplayOptions::DEFAULT, Convention::CSharp),
            "List"
        );
        assert_eq!(
            render(&targets, "T:System.Text.StringBuilder", DisplayOptions::SHOW_CONTAINER, Convention::Cpp),
            "System::Text::StringBuilder"
        );
        assert_eq!(
            render(&targets, "M:System.Console.WriteLine(N.Color)", DisplayOptions::DEFAULT, Convention::CSharp),
            "WriteLine(Color)"
        );
        assert_eq!(render(&targets, "Q:nonsense", DisplayOptions::DEFAULT, Convention::CSharp), "Q:nonsense");
        let missing = parse_reference("T:System.Guid", &GenericContext::none());
        assert!(!resolver.is_resolved(&missing));
        let present = parse_reference("T:N.Widget[]", &GenericContext::none());
        assert!(resolver.is_resolved(&present));
    }

    #[test]
    fn unknown_template_positions_use_placeholder() {
        let targets = dictionary();
        let resolver = LinkTextResolver::new(&targets);
        let reference = Reference::Type(TypeReference::Template(TemplateTypeReference::Indexed {
            index: 5,
            template_id: "T:N.Box`1".to_string(),
        }));
        assert_eq!(resolver.render_reference(&reference, DisplayOptions::DEFAULT).to_string(), UNKNOWN_TEMPLATE);
    }

    #[test]
    fn namespaces_render_by_name() {
        let targets = dictionary();
        assert_eq!(render(&targets, "N:N", DisplayOptions::DEFAULT, Convention::CSharp), "N");
        assert_eq!(render(&targets, "N:", DisplayOptions::DEFAULT, Convention::CSharp), DEFAULT_NAMESPACE);
    }

    #[test]
    fn rendering_is_deterministic() {
        let targets = dictionary();
        let options = DisplayOptions::SHOW_CONTAINER | DisplayOptions::DEFAULT;
        let first = render(&targets, "M:N.Box{N.Int32}.Get(N.Int32)", options, Convention::Neutral);
        let second = render(&targets, "M:N.Box{N.Int32}.Get(N.Int32)", options, Convention::Neutral);
        assert_eq!(first, second);
    }

    #[test]
    fn targets_render_directly() {
        let targets = dictionary();
        let resolver = LinkTextResolver::new(&targets);
        let widget = targets.get("T:N.Widget").unwrap();
        assert_eq!(
            resolver.render_target(&widget, DisplayOptions::SHOW_CONTAINER).render(Convention::CSharp),
            "N.Widget"
        );
        let marker = Target::new("M:N.Gone.Run", "", TargetKind::Marker);
        assert_eq!(resolver.render_target(&marker, DisplayOptions::DEFAULT).to_string(), "Run");
    }
}
