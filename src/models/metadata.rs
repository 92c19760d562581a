//! Build-pack, Dockerfile template and module catalog models.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Languages known to the build metadata tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Language {
    Node,
    Java,
    Python,
    #[serde(rename = "PHP")]
    Php,
    Ruby,
    Go,
    #[serde(rename = ".NET")]
    DotNet,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildPackMetadata {
    pub builders: Vec<Builder>,
    pub language_builder: Vec<LanguageBuilder>,
}

/// A build-pack builder image and the languages it can build.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Builder {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_point_param: Option<String>,
    pub language_support: Vec<LanguageSupport>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageSupport {
    pub language: Language,
    pub builder_lang_env_param: String,
    pub versions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuilderLanguageMetadata {
    pub id: String,
    pub builder_lang_env_param: String,
}

/// Per-language view: which builders handle it and through which env param.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageBuilder {
    pub language: Language,
    pub language_icon: String,
    pub versions: Vec<String>,
    pub builder_language_metadata: Vec<BuilderLanguageMetadata>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DockerfileTemplateMetadata {
    pub language_frameworks: Vec<LanguageFramework>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageFramework {
    pub language: Language,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub framework: Option<String>,
    pub language_icon: String,
    pub template_url: String,
}

/// An installable module of the platform.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    pub id: i32,
    pub name: String,
    pub base_min_version_supported: String,
    pub is_included_in_legacy_full_package: bool,
    pub description: String,
    pub title: String,
    pub icon: String,
    pub info: String,
    pub assets: Vec<String>,
    pub dependent_modules: Vec<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_filter: Option<ResourceFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_type: Option<String>,
}

/// Label selector used by clients to detect an installed module's resources.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceFilter {
    pub global_filter: ResourceIdentifier,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceIdentifier {
    pub labels: BTreeMap<String, String>,
}
