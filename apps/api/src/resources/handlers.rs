use axum::{
    extract::{multipart::MultipartRejection, FromRequest, Multipart, Path, Request, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Form, Json,
};
use serde::Serialize;

use crate::blob::serves_inline;
use crate::errors::AppError;
use crate::models::{ProjectRecord, ResumeRecord};
use crate::resources::upload::{read_project_form, read_resume_form, ProjectForm};
use crate::resources::ProjectFields;
use crate::state::AppState;

#[derive(Serialize)]
pub struct ProjectCreatedResponse {
    pub message: String,
    pub project: ProjectRecord,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeUploadedResponse {
    pub message: String,
    pub file_path: String,
}

/// Media type of the request body, lowercased and without parameters.
fn body_media_type(headers: &HeaderMap) -> String {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|v| v.trim().to_ascii_lowercase())
        .unwrap_or_default()
}

/// POST /api/projects
///
/// Accepts multipart (with an optional `image` part), JSON or urlencoded bodies.
/// Only multipart submissions can carry an image.
pub async fn handle_create_project(
    State(state): State<AppState>,
    request: Request,
) -> Result<(StatusCode, Json<ProjectCreatedResponse>), AppError> {
    let form = match body_media_type(request.headers()).as_str() {
        "application/json" => {
            let Json(fields) = Json::<ProjectFields>::from_request(request, &state).await?;
            ProjectForm {
                fields,
                image: None,
            }
        }
        "application/x-www-form-urlencoded" => {
            let Form(fields) = Form::<ProjectFields>::from_request(request, &state).await?;
            ProjectForm {
                fields,
                image: None,
            }
        }
        _ => read_project_form(Multipart::from_request(request, &state).await?).await?,
    };
    let project = state.store.submit_project(form.fields, form.image).await?;
    Ok((
        StatusCode::CREATED,
        Json(ProjectCreatedResponse {
            message: "Project added successfully".to_string(),
            project,
        }),
    ))
}

/// GET /api/projects
pub async fn handle_list_projects(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProjectRecord>>, AppError> {
    Ok(Json(state.store.list_projects().await?))
}

/// POST /api/resume
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ResumeUploadedResponse>, AppError> {
    let upload = read_resume_form(multipart?).await?;
    let resume = state.store.submit_resume(upload).await?;
    Ok(Json(ResumeUploadedResponse {
        message: "Resume uploaded successfully".to_string(),
        file_path: resume.file_path,
    }))
}

/// GET /api/resume
pub async fn handle_get_resume(
    State(state): State<AppState>,
) -> Result<Json<ResumeRecord>, AppError> {
    Ok(Json(state.store.latest_resume().await?))
}

/// GET /uploads/:key
pub async fn handle_get_upload(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Response, AppError> {
    let blob = state.store.open_blob(&key).await?;
    let disposition = if serves_inline(&key) {
        "inline"
    } else {
        "attachment"
    };
    // Retired résumés must stop being served as soon as they are replaced.
    Ok((
        [
            (header::CONTENT_TYPE, blob.content_type),
            (header::X_CONTENT_TYPE_OPTIONS, "nosniff".to_string()),
            (header::CONTENT_DISPOSITION, disposition.to_string()),
            (header::CACHE_CONTROL, "no-cache".to_string()),
        ],
        blob.bytes,
    )
        .into_response())
}
