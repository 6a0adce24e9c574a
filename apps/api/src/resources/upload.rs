use axum::extract::multipart::{Field, Multipart};

use crate::errors::AppError;
use crate::resources::{ProjectFields, Upload};

/// Multipart part carrying the project image.
pub const PROJECT_IMAGE_FIELD: &str = "image";
/// Multipart part carrying the résumé file.
pub const RESUME_FIELD: &str = "resume";

#[derive(Debug, Default)]
pub struct ProjectForm {
    pub fields: ProjectFields,
    pub image: Option<Upload>,
}

/// Reads the project submission form. Unknown parts are skipped.
pub async fn read_project_form(mut multipart: Multipart) -> Result<ProjectForm, AppError> {
    let mut form = ProjectForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "title" => form.fields.title = field.text().await?,
            "description" => form.fields.description = field.text().await?,
            "githubLink" => form.fields.github_link = field.text().await?,
            "liveLink" => form.fields.live_link = field.text().await?,
            PROJECT_IMAGE_FIELD => form.image = Some(read_upload(field).await?),
            _ => {}
        }
    }

    Ok(form)
}

/// Reads the résumé form, returning the attached file if one was sent.
pub async fn read_resume_form(mut multipart: Multipart) -> Result<Option<Upload>, AppError> {
    let mut resume = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(RESUME_FIELD) {
            resume = Some(read_upload(field).await?);
        }
    }

    Ok(resume)
}

async fn read_upload(field: Field<'_>) -> Result<Upload, AppError> {
    let file_name = field.file_name().unwrap_or_default().to_string();
    let bytes = field.bytes().await?;

    Ok(Upload {
        file_name,
        bytes,
    })
}
