//! Upload/ask page and the catch-all redirect

use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::{Html, IntoResponse, Redirect},
};

use crate::server::flash::FlashKey;
use crate::server::state::AppState;

/// GET / - render the form, consuming any pending notice
pub async fn index(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let notice = state.flash().read(&headers);
    let ready = state.is_ready();
    (
        [(header::SET_COOKIE, FlashKey::clear_cookie())],
        Html(render_index(notice.as_deref(), ready)),
    )
}

/// Unknown routes go back to the form
pub async fn not_found() -> Redirect {
    Redirect::to("/")
}

fn render_index(notice: Option<&str>, ready: bool) -> String {
    let notice = notice
        .map(|n| format!(r#"<p class="notice">{}</p>"#, escape_html(n)))
        .unwrap_or_default();
    let status = if ready {
        "Knowledge base loaded."
    } else {
        "Upload PDFs to build the knowledge base."
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Medical Chatbot</title>
<style>
body {{ font-family: sans-serif; max-width: 42rem; margin: 2rem auto; }}
.notice {{ background: #eef6ff; padding: .5rem 1rem; border-left: 4px solid #3a7bd5; }}
#answer {{ white-space: pre-wrap; }}
</style>
</head>
<body>
<h1>Medical Chatbot</h1>
{notice}
<p>{status}</p>
<form action="/upload" method="post" enctype="multipart/form-data">
<input type="file" name="pdf_files" accept="application/pdf" multiple>
<button type="submit">Upload</button>
</form>
<form id="ask" action="/ask" method="post">
<input type="text" name="prompt" placeholder="Ask a medical question" required>
<button type="submit">Ask</button>
</form>
<div id="answer"></div>
<script>
document.getElementById("ask").addEventListener("submit", async (event) => {{
  event.preventDefault();
  const response = await fetch("/ask", {{ method: "POST", body: new URLSearchParams(new FormData(event.target)) }});
  document.getElementById("answer").textContent = await response.text();
}});
</script>
</body>
</html>
"#
    )
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
