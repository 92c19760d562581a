//! Build metadata and module catalog endpoints.

use axum::extract::{Query, State};
use serde::Deserialize;

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::models::{BuildPackMetadata, DockerfileTemplateMetadata, Module};
use crate::AppState;

/// GET /buildpack/metadata
pub async fn get_buildpack_metadata(State(state): State<AppState>) -> ApiResult<BuildPackMetadata> {
    success(state.build_metadata.buildpack_metadata().clone())
}

/// GET /dockerfile/template/metadata
pub async fn get_dockerfile_template_metadata(
    State(state): State<AppState>,
) -> ApiResult<DockerfileTemplateMetadata> {
    success(state.build_metadata.dockerfile_template_metadata().clone())
}

/// GET /modules
pub async fn get_modules(State(state): State<AppState>) -> ApiResult<Vec<Module>> {
    success(state.modules.modules())
}

/// GET /v2/modules
pub async fn get_modules_v2(State(state): State<AppState>) -> ApiResult<Vec<Module>> {
    success(state.modules.modules_v2())
}

#[derive(Debug, Deserialize)]
pub struct ModuleQuery {
    #[serde(default)]
    pub name: String,
}

/// GET /module?name= - A single module by name.
pub async fn get_module_by_name(
    State(state): State<AppState>,
    Query(query): Query<ModuleQuery>,
) -> ApiResult<Module> {
    if query.name.trim().is_empty() {
        return Err(AppError::Validation("name is required".to_string()));
    }
    success(state.modules.module_by_name(&query.name))
}
