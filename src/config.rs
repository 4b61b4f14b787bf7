//! Engine configuration
//!
//! Options are plain serde structs so they can be read from a JSON file
//! (see [`EngineConfig::load`]) or built in code. The resource registry is
//! the table of translatable content types, built once at start-up.

use crate::error::{I18nError, I18nResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Which fragments an export writes to the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportWhat {
    /// Every fragment, translated or not
    #[default]
    All,
    /// Only NEW and CHANGED fragments
    Untranslated,
}

/// Export and catalog layout options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportOptions {
    /// Route messages to one file per content type
    pub split_by_type: bool,
    /// Cap on entries per catalog file; files become `base_NNN.ext`
    pub max_entries_per_file: Option<usize>,
    /// Rewrite `<` and `>` as `[` and `]` in msgid and msgstr
    pub use_square_brackets: bool,
    pub export_what: ExportWhat,
    pub base_name: String,
    pub extension: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            split_by_type: false,
            max_entries_per_file: None,
            use_square_brackets: false,
            export_what: ExportWhat::All,
            base_name: "messages".to_string(),
            extension: "po".to_string(),
        }
    }
}

impl ExportOptions {
    pub fn validate(&self) -> I18nResult<()> {
        if self.max_entries_per_file == Some(0) {
            return Err(I18nError::Config(
                "max_entries_per_file must be at least 1".to_string(),
            ));
        }
        if self.base_name.is_empty() || self.base_name.contains('/') {
            return Err(I18nError::Config(format!(
                "invalid catalog base name '{}'",
                self.base_name
            )));
        }
        if self.extension.is_empty() || self.extension.contains('.') {
            return Err(I18nError::Config(format!(
                "invalid catalog extension '{}'",
                self.extension
            )));
        }
        Ok(())
    }
}

/// Rendering options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderOptions {
    /// Link shown to authors next to the degradation notice; `{key}` is
    /// replaced with the bundle key
    pub edit_link_template: Option<String>,
}

impl RenderOptions {
    pub fn edit_link(&self, key: &str) -> Option<String> {
        self.edit_link_template
            .as_ref()
            .map(|template| template.replace("{key}", key))
    }
}

/// Top-level configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub export: ExportOptions,
    pub render: RenderOptions,
}

impl EngineConfig {
    /// Load configuration from a JSON file
    ///
    /// Missing sections fall back to their defaults; unknown keys are rejected.
    pub fn load(path: &Path) -> I18nResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> I18nResult<Self> {
        let config: EngineConfig = serde_json::from_str(content)
            .map_err(|e| I18nError::Config(format!("invalid configuration: {}", e)))?;
        config.export.validate()?;
        Ok(config)
    }
}

/// Capabilities of one translatable content type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceType {
    pub name: String,
    pub label: String,
    /// Part of the linear course flow; settings-like types are not
    pub linear: bool,
}

/// Ordered table of translatable content types
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceRegistry {
    types: BTreeMap<String, ResourceType>,
}

/// File base shared by all settings-like content when splitting by type
pub const SETTINGS_FILE_BASE: &str = "course_settings";

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The content types of a standard course
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry
            .register("unit", "Unit", true)
            .register("lesson", "Lesson", true)
            .register("assessment", "Assessment", true)
            .register("link", "Link", true)
            .register("question", "Question", true)
            .register("question_group", "Question Group", true)
            .register("announcement", "Announcement", false)
            .register("course_settings", "Course Settings", false)
            .register("skill", "Skill", false);
        registry
    }

    pub fn register(&mut self, name: &str, label: &str, linear: bool) -> &mut Self {
        self.types.insert(
            name.to_string(),
            ResourceType {
                name: name.to_string(),
                label: label.to_string(),
                linear,
            },
        );
        self
    }

    pub fn get(&self, name: &str) -> Option<&ResourceType> {
        self.types.get(name)
    }

    /// Registered types that are not part of the linear course flow
    pub fn is_settings_like(&self, name: &str) -> bool {
        self.get(name).is_some_and(|t| !t.linear)
    }

    pub fn types(&self) -> impl Iterator<Item = &ResourceType> {
        self.types.values()
    }
}
