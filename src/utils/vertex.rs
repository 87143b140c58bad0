//! Vertex AI endpoint helpers.

/// Publisher base URL for a project/location pair.
pub fn vertex_base_url(project: &str, location: &str, publisher: &str) -> String {
    format!(
        "https://aiplatform.googleapis.com/v1/projects/{project}/locations/{location}/\
         publishers/{publisher}"
    )
}

/// Express-mode base URL, used with a bare API key and no project.
pub fn vertex_express_base_url(publisher: &str) -> String {
    format!("https://aiplatform.googleapis.com/v1/publishers/{publisher}")
}
