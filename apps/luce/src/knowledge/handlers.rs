use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use crate::errors::AppError;
use crate::github::RepoMetadata;
use crate::knowledge::{DocKind, DownloadInfo, Project};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct DocumentsQuery {
    /// Comma-separated document kinds, in preference order.
    pub types: Option<String>,
}

/// GET /api/about
/// The profile record without the router's category tables.
pub async fn handle_about(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let mut about = serde_json::to_value(state.knowledge.profile())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize profile: {e}")))?;
    if let Some(fields) = about.as_object_mut() {
        fields.remove("categories");
    }
    Ok(Json(about))
}

/// GET /api/projects
pub async fn handle_list_projects(State(state): State<AppState>) -> Json<Vec<Project>> {
    Json(state.knowledge.projects().to_vec())
}

/// GET /api/projects/:id
pub async fn handle_get_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Project>, AppError> {
    Ok(Json(find_project(&state, &id)?.clone()))
}

/// GET /api/projects/:id/documents?types=architecture,readme
pub async fn handle_project_documents(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<DocumentsQuery>,
) -> Result<Json<DownloadInfo>, AppError> {
    let project = find_project(&state, &id)?;
    let prefs = parse_doc_kinds(params.types.as_deref())?;
    state
        .knowledge
        .download_info(&project.id, &prefs)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("No documents for project '{id}'")))
}

/// GET /api/projects/:id/metadata
pub async fn handle_project_metadata(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RepoMetadata>, AppError> {
    let project = find_project(&state, &id)?;
    Ok(Json(state.github.fetch_metadata(project).await))
}

/// GET /documents/:filename
pub async fn handle_document(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let doc = state
        .knowledge
        .document_by_filename(&filename)
        .ok_or_else(|| AppError::NotFound(format!("Document '{filename}' not found")))?;
    Ok((
        [(header::CONTENT_TYPE, "text/markdown; charset=utf-8")],
        doc.raw.clone(),
    ))
}

/// GET /cv/:filename
/// Only the CV named in the profile is served.
pub async fn handle_cv(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let cv = state
        .knowledge
        .profile()
        .cv
        .as_ref()
        .filter(|cv| cv.filename == filename)
        .ok_or_else(|| AppError::NotFound(format!("CV '{filename}' not found")))?;

    let path = state.config.data_dir.join(&cv.filename);
    let bytes = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => AppError::NotFound(format!("CV '{filename}' not found")),
        _ => AppError::Internal(anyhow::anyhow!("Failed to read {}: {e}", path.display())),
    })?;
    Ok(([(header::CONTENT_TYPE, "application/pdf")], bytes))
}

fn find_project<'a>(state: &'a AppState, id: &str) -> Result<&'a Project, AppError> {
    state
        .knowledge
        .project(id)
        .ok_or_else(|| AppError::NotFound(format!("Project '{id}' not found")))
}

fn parse_doc_kinds(types: Option<&str>) -> Result<Vec<DocKind>, AppError> {
    types
        .unwrap_or_default()
        .split(',')
        .filter(|t| !t.trim().is_empty())
        .map(|t| {
            DocKind::parse(t)
                .ok_or_else(|| AppError::Validation(format!("Unknown document type '{}'", t.trim())))
        })
        .collect()
}
