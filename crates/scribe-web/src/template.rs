use axum::response::Html;
use scribe_core::ALLOWED_EXTENSIONS;

const INDEX_HTML: &str = include_str!("../templates/index.html");

/// Render the upload page with the accepted extensions and size limit.
pub fn render_index(max_upload_mb: usize) -> Html<String> {
    let accept = ALLOWED_EXTENSIONS
        .iter()
        .map(|e| format!(".{e}"))
        .collect::<Vec<_>>()
        .join(",");
    let html = INDEX_HTML
        .replace("{{ accept }}", &accept)
        .replace("{{ max_upload_mb }}", &max_upload_mb.to_string());
    Html(html)
}
