pub mod project;
pub mod resume;

pub use project::{NewProject, ProjectRecord};
pub use resume::{NewResume, ResumeRecord};
