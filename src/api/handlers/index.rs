use axum::response::Html;

/// Liveness page for humans poking at the server
pub async fn index() -> Html<&'static str> {
    Html("<h1>Backend is running</h1><p>Use the /api/remove-background endpoint.</p>")
}
