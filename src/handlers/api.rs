use axum::response::Html;

/// Status page
pub async fn index() -> Html<&'static str> {
    Html("<html><body><h1>Twilio Media Stream Server is running!</h1></body></html>")
}
