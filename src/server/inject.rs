// src/server/inject.rs

use axum::body::{to_bytes, Body};
use axum::extract::Request;
use axum::http::{header, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::warn;

use crate::server::CLIENT_PATH;

/// HTML pages larger than this are served untouched.
const MAX_INJECT_BYTES: usize = 16 * 1024 * 1024;

const CLIENT_JS: &str = r#"(function () {
  var source = new EventSource("/__assetpipe/events");
  source.addEventListener("reload", function (e) {
    var data = JSON.parse(e.data);
    if (data.scope === "css") {
      document.querySelectorAll('link[rel="stylesheet"]').forEach(function (link) {
        var url = new URL(link.href);
        url.searchParams.set("__assetpipe", Date.now());
        link.href = url.toString();
      });
    } else {
      window.location.reload();
    }
  });
})();
"#;

/// Insert the live-reload client before the last `</body>`, or at the end of
/// the document if there is none.
pub fn inject_script(html: &str) -> String {
    let tag = format!(r#"<script src="{CLIENT_PATH}"></script>"#);
    match html.to_ascii_lowercase().rfind("</body>") {
        Some(idx) => {
            let mut out = String::with_capacity(html.len() + tag.len());
            out.push_str(&html[..idx]);
            out.push_str(&tag);
            out.push_str(&html[idx..]);
            out
        }
        None => format!("{html}{tag}"),
    }
}

pub(crate) async fn client_script() -> impl IntoResponse {
    (
        [(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/javascript; charset=utf-8"),
        )],
        CLIENT_JS,
    )
}

/// Rewrite full (200) HTML responses to load the client script.
pub(crate) async fn inject_live_reload(req: Request, next: Next) -> Response {
    let res = next.run(req).await;

    let is_html = res
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("text/html"));
    if res.status() != StatusCode::OK || !is_html {
        return res;
    }

    let (mut parts, body) = res.into_parts();
    let bytes = match to_bytes(body, MAX_INJECT_BYTES).await {
        Ok(b) => b,
        Err(err) => {
            warn!(error = %err, "could not buffer HTML response for injection");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let html = inject_script(&String::from_utf8_lossy(&bytes));
    parts.headers.remove(header::CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(html))
}
