use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::Error;
use crate::filter::FilterTree;
use crate::visibility::{VisibilityFlag, VisibilitySettings};

/// Name of the project config file.
pub const CONFIG_FILE: &str = ".symref.toml";

/// Project configuration loaded from `.symref.toml`: the visibility rule
/// set, the API and attribute filter trees, and source-unit indexing options.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Config {
    /// Override tree for namespaces, types and members.
    pub api_filter: FilterTree,
    /// Override tree for attribute types.
    pub attribute_filter: FilterTree,
    /// Source-unit discovery and loading.
    pub index: IndexOptions,
    /// Effective visibility flags, implications applied.
    pub visibility: VisibilitySettings,
}

/// How source units are discovered and loaded.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexOptions {
    /// Unit file names to load; empty loads every match.
    #[serde(default)]
    pub allow: Vec<String>,
    /// Glob applied to file names in the metadata directory.
    #[serde(default = "default_pattern")]
    pub pattern: String,
    /// Worker threads; zero uses the available parallelism.
    #[serde(default)]
    pub workers: usize,
}

impl Default for IndexOptions {
    /// Every `*.xml` file, unbounded parallelism.
    fn default() -> Self {
        return Self {
            allow: Vec::new(),
            pattern: default_pattern(),
            workers: 0,
        };
    }
}

/// Default unit glob.
fn default_pattern() -> String {
    return "*.xml".to_string();
}

/// Raw TOML structure for `.symref.toml`.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SymrefTomlConfig {
    /// `[api_filter]` table.
    #[serde(default)]
    api_filter: FilterTree,
    /// `[attribute_filter]` table.
    #[serde(default)]
    attribute_filter: FilterTree,
    /// `[index]` table.
    #[serde(default)]
    index: IndexOptions,
    /// `[visibility]` table.
    #[serde(default)]
    visibility: RawVisibility,
}

/// One visibility switch: `name = { expose = true }`.
#[derive(Deserialize, Clone, Copy)]
#[serde(deny_unknown_fields)]
struct Switch {
    /// Required; a switch without `expose` is a config error.
    expose: bool,
}

/// Raw `[visibility]` table; omitted switches keep their default.
#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct RawVisibility {
    /// See [`VisibilityFlag::Attributes`].
    attributes: Option<Switch>,
    /// See [`VisibilityFlag::ExplicitInterfaceImplementations`].
    explicit_interface_implementations: Option<Switch>,
    /// See [`VisibilityFlag::InheritedFrameworkInternalMembers`].
    inherited_framework_internal_members: Option<Switch>,
    /// See [`VisibilityFlag::InheritedFrameworkMembers`].
    inherited_framework_members: Option<Switch>,
    /// See [`VisibilityFlag::InheritedFrameworkPrivateMembers`].
    inherited_framework_private_members: Option<Switch>,
    /// See [`VisibilityFlag::InheritedMembers`].
    inherited_members: Option<Switch>,
    /// See [`VisibilityFlag::Internals`].
    internals: Option<Switch>,
    /// See [`VisibilityFlag::NoPiaTypes`].
    no_pia_types: Option<Switch>,
    /// See [`VisibilityFlag::PrivateFields`].
    private_fields: Option<Switch>,
    /// See [`VisibilityFlag::Privates`].
    privates: Option<Switch>,
    /// See [`VisibilityFlag::Protected`].
    protected: Option<Switch>,
    /// See [`VisibilityFlag::ProtectedInternalAsProtected`].
    protected_internal_as_protected: Option<Switch>,
    /// See [`VisibilityFlag::SealedProtected`].
    sealed_protected: Option<Switch>,
}

impl RawVisibility {
    /// Switches in the order they are applied: implied flags before the
    /// flags that imply them. A dependent switched on later re-enables a
    /// dependency switched off earlier, while a dependent switched off
    /// never turns its dependencies off.
    fn switches(&self) -> [(VisibilityFlag, Option<Switch>); 13] {
        return [
            (VisibilityFlag::Attributes, self.attributes),
            (VisibilityFlag::ExplicitInterfaceImplementations, self.explicit_interface_implementations),
            (VisibilityFlag::NoPiaTypes, self.no_pia_types),
            (VisibilityFlag::Protected, self.protected),
            (VisibilityFlag::ProtectedInternalAsProtected, self.protected_internal_as_protected),
            (VisibilityFlag::SealedProtected, self.sealed_protected),
            (VisibilityFlag::Internals, self.internals),
            (VisibilityFlag::Privates, self.privates),
            (VisibilityFlag::PrivateFields, self.private_fields),
            (VisibilityFlag::InheritedMembers, self.inherited_members),
            (VisibilityFlag::InheritedFrameworkMembers, self.inherited_framework_members),
            (VisibilityFlag::InheritedFrameworkInternalMembers, self.inherited_framework_internal_members),
            (VisibilityFlag::InheritedFrameworkPrivateMembers, self.inherited_framework_private_members),
        ];
    }

    /// Fold the explicit switches over the defaults.
    fn resolve(&self) -> VisibilitySettings {
        let mut settings = VisibilitySettings::default();
        for (flag, switch) in self.switches() {
            if let Some(switch) = switch {
                settings = settings.set(flag, switch.expose);
            }
        }
        return settings;
    }
}

impl Config {
    /// Load `.symref.toml` from the given root directory.
    /// Returns defaults when the file doesn't exist, and an error when it
    /// exists but is malformed; a written config never silently falls back.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if reading fails (other than not-found),
    /// or `Error::ConfigInvalid` if the TOML is malformed.
    pub fn load(root: &Path) -> Result<Self, Error> {
        let path = root.join(CONFIG_FILE);
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(Error::Io(e)),
        };
        return Self::parse(&path, &content);
    }

    /// Load a config file that must exist.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigNotFound` if the file is missing,
    /// `Error::Io` for other read failures, or `Error::ConfigInvalid`.
    pub fn load_file(path: &Path) -> Result<Self, Error> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::ConfigNotFound { path: path.to_path_buf() });
            },
            Err(e) => return Err(Error::Io(e)),
        };
        return Self::parse(path, &content);
    }

    /// Parse config text. `path` is only used for error reporting.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigInvalid` with the parser's line/column and the
    /// offending key for syntax errors, unknown keys, non-boolean `expose`
    /// values or missing required attributes.
    pub fn parse(path: &Path, content: &str) -> Result<Self, Error> {
        let raw: SymrefTomlConfig = toml::from_str(content).map_err(|e| {
            return Error::ConfigInvalid {
                path: PathBuf::from(path),
                reason: e.to_string(),
            };
        })?;
        return Ok(Self {
            api_filter: raw.api_filter,
            attribute_filter: raw.attribute_filter,
            index: raw.index,
            visibility: raw.visibility.resolve(),
        });
    }
}
