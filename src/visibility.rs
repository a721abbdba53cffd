//! Configurable visibility flags and their one-way implications.

use std::fmt;

/// One switch of the visibility rule set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VisibilityFlag {
    /// Document applied attributes.
    Attributes,
    /// Document explicit interface implementations.
    ExplicitInterfaceImplementations,
    /// Inherited framework members declared `internal`.
    InheritedFrameworkInternalMembers,
    /// Inherited members declared outside the documented assemblies.
    InheritedFrameworkMembers,
    /// Inherited framework members declared `private`.
    InheritedFrameworkPrivateMembers,
    /// Inherited members declared inside the documented assemblies.
    InheritedMembers,
    /// `internal` types and members.
    Internals,
    /// Embedded interop types.
    NoPiaTypes,
    /// Private fields (requires privates).
    PrivateFields,
    /// `private` types and members.
    Privates,
    /// `protected` members.
    Protected,
    /// Treat `protected internal` as plain `protected`.
    ProtectedInternalAsProtected,
    /// `protected` members of sealed types.
    SealedProtected,
}

impl VisibilityFlag {
    /// Every flag, in config-key order.
    pub const ALL: [Self; 13] = [
        Self::Attributes,
        Self::ExplicitInterfaceImplementations,
        Self::InheritedFrameworkInternalMembers,
        Self::InheritedFrameworkMembers,
        Self::InheritedFrameworkPrivateMembers,
        Self::InheritedMembers,
        Self::Internals,
        Self::NoPiaTypes,
        Self::PrivateFields,
        Self::Privates,
        Self::Protected,
        Self::ProtectedInternalAsProtected,
        Self::SealedProtected,
    ];

    /// Key used in the `[visibility]` config table.
    pub const fn config_key(self) -> &'static str {
        return match self {
            Self::Attributes => "attributes",
            Self::ExplicitInterfaceImplementations => "explicit_interface_implementations",
            Self::InheritedFrameworkInternalMembers => "inherited_framework_internal_members",
            Self::InheritedFrameworkMembers => "inherited_framework_members",
            Self::InheritedFrameworkPrivateMembers => "inherited_framework_private_members",
            Self::InheritedMembers => "inherited_members",
            Self::Internals => "internals",
            Self::NoPiaTypes => "no_pia_types",
            Self::PrivateFields => "private_fields",
            Self::Privates => "privates",
            Self::Protected => "protected",
            Self::ProtectedInternalAsProtected => "protected_internal_as_protected",
            Self::SealedProtected => "sealed_protected",
        };
    }

    /// Flags that enabling `self` forces on.
    const fn implies(self) -> &'static [Self] {
        return match self {
            Self::InheritedFrameworkInternalMembers => &[Self::InheritedFrameworkMembers, Self::Internals],
            Self::InheritedFrameworkMembers => &[Self::InheritedMembers],
            Self::InheritedFrameworkPrivateMembers => &[Self::InheritedFrameworkMembers, Self::Privates],
            Self::PrivateFields => &[Self::Privates],
            Self::Attributes
            | Self::ExplicitInterfaceImplementations
            | Self::InheritedMembers
            | Self::Internals
            | Self::NoPiaTypes
            | Self::Privates
            | Self::Protected
            | Self::ProtectedInternalAsProtected
            | Self::SealedProtected => &[],
        };
    }

    /// Bit position in the packed set.
    const fn bit(self) -> u16 {
        let index: u16 = match self {
            Self::Attributes => 0,
            Self::ExplicitInterfaceImplementations => 1,
            Self::InheritedFrameworkInternalMembers => 2,
            Self::InheritedFrameworkMembers => 3,
            Self::InheritedFrameworkPrivateMembers => 4,
            Self::InheritedMembers => 5,
            Self::Internals => 6,
            Self::NoPiaTypes => 7,
            Self::PrivateFields => 8,
            Self::Privates => 9,
            Self::Protected => 10,
            Self::ProtectedInternalAsProtected => 11,
            Self::SealedProtected => 12,
        };
        return 1 << index;
    }
}

/// Packed visibility flag set.
///
/// The set is only changed through [`VisibilitySettings::with`] and
/// [`VisibilitySettings::without`], which keep implications closed: a flag
/// is never on while a flag it depends on is off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VisibilitySettings {
    /// One bit per `VisibilityFlag`.
    bits: u16,
}

impl Default for VisibilitySettings {
    /// Public API plus protected members, attributes and inherited members.
    fn default() -> Self {
        return Self::public_only()
            .with(VisibilityFlag::Attributes)
            .with(VisibilityFlag::Protected)
            .with(VisibilityFlag::ProtectedInternalAsProtected)
            .with(VisibilityFlag::InheritedFrameworkMembers);
    }
}

impl VisibilitySettings {
    /// Nothing beyond `public` declarations.
    pub const fn public_only() -> Self {
        return Self { bits: 0 };
    }

    /// Whether `flag` is on.
    pub const fn is_enabled(self, flag: VisibilityFlag) -> bool {
        return self.bits & flag.bit() != 0;
    }

    /// Turn `flag` on together with everything it implies.
    #[must_use]
    pub fn with(self, flag: VisibilityFlag) -> Self {
        let mut next = Self {
            bits: self.bits | flag.bit(),
        };
        for implied in flag.implies() {
            next = next.with(*implied);
        }
        return next;
    }

    /// Turn `flag` off together with every flag that implies it.
    #[must_use]
    pub fn without(self, flag: VisibilityFlag) -> Self {
        let mut next = Self {
            bits: self.bits & !flag.bit(),
        };
        for dependent in VisibilityFlag::ALL {
            if dependent.implies().contains(&flag) && next.is_enabled(dependent) {
                next = next.without(dependent);
            }
        }
        return next;
    }

    /// Apply `enabled` for `flag` through `with`/`without`.
    #[must_use]
    pub fn set(self, flag: VisibilityFlag, enabled: bool) -> Self {
        return if enabled { self.with(flag) } else { self.without(flag) };
    }

    /// Every flag of `other` is also on here.
    pub const fn is_superset_of(self, other: Self) -> bool {
        return self.bits & other.bits == other.bits;
    }

    /// Enabled flags in config-key order.
    pub fn enabled(self) -> impl Iterator<Item = VisibilityFlag> {
        return VisibilityFlag::ALL.into_iter().filter(move |f| return self.is_enabled(*f));
    }
}

impl fmt::Display for VisibilitySettings {
    /// Comma-separated config keys of the enabled flags.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<&str> = self.enabled().map(VisibilityFlag::config_key).collect();
        if keys.is_empty() {
            return write!(f, "(public only)");
        }
        return write!(f, "{}", keys.join(", "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn framework_private_members_cascade_on() {
        let settings = VisibilitySettings::public_only().with(VisibilityFlag::InheritedFrameworkPrivateMembers);
        assert!(settings.is_enabled(VisibilityFlag::InheritedFrameworkMembers));
        assert!(settings.is_enabled(VisibilityFlag::InheritedMembers));
        assert!(settings.is_enabled(VisibilityFlag::Privates));
        assert!(!settings.is_enabled(VisibilityFlag::Internals));
    }

    #[test]
    fn disabling_a_dependency_disables_its_dependents() {
        let settings = VisibilitySettings::public_only()
            .with(VisibilityFlag::InheritedFrameworkPrivateMembers)
            .without(VisibilityFlag::Privates);
        assert!(!settings.is_enabled(VisibilityFlag::InheritedFrameworkPrivateMembers));
        assert!(settings.is_enabled(VisibilityFlag::InheritedFrameworkMembers));
    }

    #[test]
    fn disabling_a_dependent_leaves_its_dependencies() {
        let settings = VisibilitySettings::public_only()
            .with(VisibilityFlag::PrivateFields)
            .without(VisibilityFlag::PrivateFields);
        assert!(settings.is_enabled(VisibilityFlag::Privates));
    }

    #[test]
    fn every_reachable_state_is_closed_under_implication() {
        let mut settings = VisibilitySettings::public_only();
        for (step, flag) in VisibilityFlag::ALL.iter().cycle().take(40).enumerate() {
            settings = settings.set(*flag, step % 3 != 0);
            for on in settings.enabled() {
                for implied in on.implies() {
                    assert!(settings.is_enabled(*implied), "{on:?} on without {implied:?}");
                }
            }
        }
    }

    #[test]
    fn display_lists_config_keys() {
        let settings = VisibilitySettings::public_only().with(VisibilityFlag::Internals);
        assert_eq!(settings.to_string(), "internals");
        assert_eq!(VisibilitySettings::public_only().to_string(), "(public only)");
    }
}
