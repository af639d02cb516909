//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/crafttree/crafttree.toml`
//! 3. Local config: `<data_dir>/.crafttree.toml` (content directory)
//! 4. Environment variables: `CRAFTTREE_*` prefix

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::services::{ExportOptions, DEFAULT_TECH_TREE_DEPTH};
use crate::application::ApplicationError;
use crate::domain::recipe::DEFAULT_TOOL_SEARCH_HOPS;
use crate::domain::{RecipeOptions, TagRules};

pub const DEFAULT_TAG_PREFIX: &str = "OneLife_v";
pub const DEFAULT_VERSION_WINDOW: u32 = 3;

/// Recipe and tech-tree derivation settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RecipeConfig {
    /// Levels of the exported tech-tree preview
    pub tech_tree_depth: u32,
    /// Hops the tool search follows from a by-product
    pub tool_search_hops: usize,
}

impl Default for RecipeConfig {
    fn default() -> Self {
        Self {
            tech_tree_depth: DEFAULT_TECH_TREE_DEPTH,
            tool_search_hops: DEFAULT_TOOL_SEARCH_HOPS,
        }
    }
}

/// Version classification settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct VersionsConfig {
    /// Prefix of release tags, followed by the version number
    pub tag_prefix: String,
    /// Only tags within this many versions of the newest are kept
    pub window: u32,
    /// Skip the trailing "unreleased" version
    pub released_only: bool,
    /// Do not log the number of unversioned objects
    pub suppress_missing_report: bool,
    /// Tags containing any of these markers are ignored
    pub ignore_tags_containing: Vec<String>,
}

impl Default for VersionsConfig {
    fn default() -> Self {
        Self {
            tag_prefix: DEFAULT_TAG_PREFIX.into(),
            window: DEFAULT_VERSION_WINDOW,
            released_only: false,
            suppress_missing_report: false,
            ignore_tags_containing: vec![],
        }
    }
}

/// Raw versions config for intermediate parsing (arrays are Option to detect "not specified").
///
/// Used during layered config merging to distinguish between:
/// - `None` → field not specified, inherit from base
/// - `Some([])` → explicit empty array
/// - `Some([...])` → explicit values to merge
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawVersionsConfig {
    pub tag_prefix: Option<String>,
    pub window: Option<u32>,
    pub released_only: Option<bool>,
    pub suppress_missing_report: Option<bool>,
    pub ignore_tags_containing: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawRecipeConfig {
    pub tech_tree_depth: Option<u32>,
    pub tool_search_hops: Option<usize>,
}

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub output_dir: Option<PathBuf>,
    pub git_dir: Option<PathBuf>,
    pub recipe: RawRecipeConfig,
    pub versions: RawVersionsConfig,
}

impl RecipeConfig {
    fn overlay(&self, raw: &RawRecipeConfig) -> Self {
        Self {
            tech_tree_depth: raw.tech_tree_depth.unwrap_or(self.tech_tree_depth),
            tool_search_hops: raw.tool_search_hops.unwrap_or(self.tool_search_hops),
        }
    }
}

impl VersionsConfig {
    /// Merge arrays with union semantics and negation support.
    ///
    /// - Items from overlay are added to base
    /// - Items prefixed with `!` remove the corresponding item from the result
    /// - Duplicates are de-duplicated
    ///
    /// # Examples
    /// ```ignore
    /// merge_array(&["a", "b"], &["c"])       // → ["a", "b", "c"]
    /// merge_array(&["a", "b"], &["!a", "c"]) // → ["b", "c"]
    /// ```
    pub fn merge_array(base: &[String], overlay: &[String]) -> Vec<String> {
        let mut result: HashSet<String> = base.iter().cloned().collect();

        for pattern in overlay {
            if let Some(negated) = pattern.strip_prefix('!') {
                result.remove(negated);
            } else {
                result.insert(pattern.clone());
            }
        }

        // Convert to sorted Vec for deterministic output
        let mut vec: Vec<String> = result.into_iter().collect();
        vec.sort();
        vec
    }

    /// Merge overlay config onto self (base).
    ///
    /// - Scalar options: overlay wins if Some, otherwise keep base
    /// - Arrays: union merge with negation support (if overlay specified)
    pub fn merge(&self, overlay: &RawVersionsConfig) -> Self {
        Self {
            ignore_tags_containing: overlay
                .ignore_tags_containing
                .as_ref()
                .map(|o| Self::merge_array(&self.ignore_tags_containing, o))
                .unwrap_or_else(|| self.ignore_tags_containing.clone()),
            ..self.scalars(overlay)
        }
    }

    /// Apply global config onto defaults.
    ///
    /// Unlike `merge()`, arrays specified in the global config replace the
    /// default array entirely.
    pub fn apply_global(&self, global: &RawVersionsConfig) -> Self {
        Self {
            ignore_tags_containing: global
                .ignore_tags_containing
                .clone()
                .unwrap_or_else(|| self.ignore_tags_containing.clone()),
            ..self.scalars(global)
        }
    }

    fn scalars(&self, raw: &RawVersionsConfig) -> Self {
        Self {
            tag_prefix: raw
                .tag_prefix
                .clone()
                .unwrap_or_else(|| self.tag_prefix.clone()),
            window: raw.window.unwrap_or(self.window),
            released_only: raw.released_only.unwrap_or(self.released_only),
            suppress_missing_report: raw
                .suppress_missing_report
                .unwrap_or(self.suppress_missing_report),
            ignore_tags_containing: self.ignore_tags_containing.clone(),
        }
    }

    pub fn tag_rules(&self) -> TagRules {
        TagRules::new(
            self.tag_prefix.clone(),
            self.ignore_tags_containing.clone(),
            self.window,
        )
    }
}

/// Unified configuration for crafttree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Export destination (default: ./public)
    pub output_dir: PathBuf,
    /// Git checkout of the content, for version tags (default: the content directory)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_dir: Option<PathBuf>,
    pub recipe: RecipeConfig,
    pub versions: VersionsConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("public"),
            git_dir: None,
            recipe: RecipeConfig::default(),
            versions: VersionsConfig::default(),
        }
    }
}

/// Expand `~`, `$VAR` and `${VAR}`; unresolvable input is returned unchanged.
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}

/// Get the XDG config directory for crafttree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "crafttree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("crafttree.toml"))
}

/// Get the path to the local config file in a content directory.
pub fn local_config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(".crafttree.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Git directory to read tags from, falling back to the content directory.
    pub fn git_dir_for(&self, data_dir: &Path) -> PathBuf {
        self.git_dir
            .clone()
            .unwrap_or_else(|| data_dir.to_path_buf())
    }

    pub fn recipe_options(&self) -> RecipeOptions {
        RecipeOptions {
            tool_search_hops: self.recipe.tool_search_hops,
        }
    }

    pub fn export_options(&self) -> ExportOptions {
        ExportOptions {
            tech_tree_depth: self.recipe.tech_tree_depth,
            recipe: self.recipe_options(),
        }
    }

    /// Expand shell variables and tilde in path-like fields.
    fn expand_paths(&mut self) {
        self.output_dir = PathBuf::from(expand_env_vars(&self.output_dir.to_string_lossy()));
        if let Some(git_dir) = &self.git_dir {
            self.git_dir = Some(PathBuf::from(expand_env_vars(&git_dir.to_string_lossy())));
        }
    }

    /// Merge overlay config onto self (base) with union semantics for arrays.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            output_dir: overlay
                .output_dir
                .clone()
                .unwrap_or_else(|| self.output_dir.clone()),
            git_dir: overlay.git_dir.clone().or_else(|| self.git_dir.clone()),
            recipe: self.recipe.overlay(&overlay.recipe),
            versions: self.versions.merge(&overlay.versions),
        }
    }

    /// Apply global config onto defaults with REPLACE semantics for arrays.
    fn apply_global(&self, global: &RawSettings) -> Self {
        Self {
            output_dir: global
                .output_dir
                .clone()
                .unwrap_or_else(|| self.output_dir.clone()),
            git_dir: global.git_dir.clone().or_else(|| self.git_dir.clone()),
            recipe: self.recipe.overlay(&global.recipe),
            versions: self.versions.apply_global(&global.versions),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `data_dir` - Optional content directory holding a local config
    ///
    /// # Array Merge Semantics
    /// - Defaults → Global: REPLACE (global defines the real baseline)
    /// - Global → Local: UNION with negation support
    /// - Any → Env vars: REPLACE (explicit user override)
    pub fn load(data_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.apply_global(&raw);
            }
        }

        if let Some(dir) = data_dir {
            current = current.with_local(dir)?;
        }

        current = Self::apply_env_overrides(current)?;
        current.expand_paths();

        Ok(current)
    }

    /// Merge the local config of `data_dir`, if present.
    pub fn with_local(self, data_dir: &Path) -> Result<Self, ApplicationError> {
        let local_path = local_config_path(data_dir);
        if !local_path.exists() {
            return Ok(self);
        }
        let raw = load_raw_settings(&local_path)?;
        Ok(self.merge_with(&raw))
    }

    /// Apply CRAFTTREE_* environment variables as explicit overrides.
    ///
    /// Env vars replace values (not merge) - they are explicit user overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let builder = Config::builder().add_source(
            Environment::with_prefix("CRAFTTREE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("versions.ignore_tags_containing"),
        );

        let config = builder.build().map_err(config_err)?;

        if let Ok(val) = config.get_string("output_dir") {
            settings.output_dir = PathBuf::from(val);
        }
        if let Ok(val) = config.get_string("git_dir") {
            settings.git_dir = Some(PathBuf::from(val));
        }
        if let Ok(val) = config.get::<u32>("recipe.tech_tree_depth") {
            settings.recipe.tech_tree_depth = val;
        }
        if let Ok(val) = config.get::<usize>("recipe.tool_search_hops") {
            settings.recipe.tool_search_hops = val;
        }
        if let Ok(val) = config.get_string("versions.tag_prefix") {
            settings.versions.tag_prefix = val;
        }
        if let Ok(val) = config.get::<u32>("versions.window") {
            settings.versions.window = val;
        }
        if let Ok(val) = config.get_bool("versions.released_only") {
            settings.versions.released_only = val;
        }
        if let Ok(val) = config.get_bool("versions.suppress_missing_report") {
            settings.versions.suppress_missing_report = val;
        }
        if let Ok(val) = config.get::<Vec<String>>("versions.ignore_tags_containing") {
            settings.versions.ignore_tags_containing = val;
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# crafttree configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/crafttree/crafttree.toml  (defines your baseline)
#   Local:  <data_dir>/.crafttree.toml         (content-specific additions)
#   Env:    CRAFTTREE_* environment variables   (explicit overrides,
#           nested keys use "__", e.g. CRAFTTREE_RECIPE__TECH_TREE_DEPTH=4)
#
# Array Merge Semantics:
#   Global config REPLACES compiled defaults.
#   Local config UNIONS with global.
#   Use "!marker" in local config to REMOVE an inherited item:
#     ignore_tags_containing = ["_beta", "!_test"]

# Export destination
# output_dir = "public"

# Git checkout used for version tags (default: the content directory)
# git_dir = "~/src/OneLifeData7"

[recipe]
# Levels of the tech-tree preview in exported documents
# tech_tree_depth = 3

# Hops the tool search follows from a by-product
# tool_search_hops = 5

[versions]
# Prefix of release tags
# tag_prefix = "OneLife_v"

# Keep only tags within this many versions of the newest
# window = 3

# Skip the trailing "unreleased" version
# released_only = false

# Do not log the number of objects without a version
# suppress_missing_report = false

# Ignore tags containing any of these markers
# ignore_tags_containing = []
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_no_config_when_loading_defaults_then_uses_compiled_values() {
        let settings = Settings::default();
        assert_eq!(settings.output_dir, PathBuf::from("public"));
        assert_eq!(settings.recipe.tech_tree_depth, 3);
        assert_eq!(settings.recipe.tool_search_hops, 5);
        assert_eq!(settings.versions.tag_prefix, "OneLife_v");
        assert_eq!(settings.versions.window, 3);
    }

    #[test]
    fn given_tilde_in_output_dir_when_expand_paths_then_expands_to_home() {
        let mut settings = Settings {
            output_dir: PathBuf::from("~/public"),
            git_dir: Some(PathBuf::from("$HOME/data")),
            ..Settings::default()
        };

        settings.expand_paths();

        let home = std::env::var("HOME").expect("HOME should be set");
        assert!(settings.output_dir.to_string_lossy().starts_with(&home));
        assert!(settings
            .git_dir
            .as_ref()
            .is_some_and(|d| d.to_string_lossy().starts_with(&home)));
    }

    #[test]
    fn test_merge_array_negation() {
        let base = vec!["a".to_string(), "b".to_string()];
        let overlay = vec!["!a".to_string(), "c".to_string()];
        let result = VersionsConfig::merge_array(&base, &overlay);

        assert_eq!(result, vec!["b".to_string(), "c".to_string()]);
    }

    #[test]
    fn test_merge_array_duplicates() {
        let base = vec!["a".to_string(), "b".to_string()];
        let overlay = vec!["a".to_string(), "c".to_string(), "!x".to_string()];
        let result = VersionsConfig::merge_array(&base, &overlay);

        assert_eq!(result.len(), 3);
    }

    #[test]
    fn test_apply_global_replaces_arrays() {
        let base = VersionsConfig {
            ignore_tags_containing: vec!["_test".to_string()],
            ..VersionsConfig::default()
        };
        let global = RawVersionsConfig {
            window: Some(5),
            ignore_tags_containing: Some(vec!["_beta".to_string()]),
            ..RawVersionsConfig::default()
        };

        let result = base.apply_global(&global);

        assert_eq!(result.window, 5);
        assert_eq!(result.tag_prefix, "OneLife_v");
        assert_eq!(result.ignore_tags_containing, vec!["_beta".to_string()]);
    }

    #[test]
    fn test_merge_unions_arrays() {
        let base = VersionsConfig {
            ignore_tags_containing: vec!["_test".to_string()],
            ..VersionsConfig::default()
        };
        let local = RawVersionsConfig {
            released_only: Some(true),
            ignore_tags_containing: Some(vec!["_beta".to_string()]),
            ..RawVersionsConfig::default()
        };

        let result = base.merge(&local);

        assert!(result.released_only);
        assert_eq!(
            result.ignore_tags_containing,
            vec!["_beta".to_string(), "_test".to_string()]
        );
    }

    #[test]
    fn given_template_when_parsing_then_is_valid_toml() {
        let raw: RawSettings = toml::from_str(&Settings::template()).expect("template parses");
        assert!(raw.output_dir.is_none());
    }
}
