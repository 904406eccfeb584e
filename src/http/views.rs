//! History-mode view serving.
//!
//! Any non-proxied `GET`/`HEAD` is treated as a deep link: the path is made
//! relative to the base path, resolved against the route table and answered
//! with the route's view module, loaded through the shared loader.

use axum::http::{header, HeaderName, Method, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::http::server::AppState;
use crate::loader::ViewModule;
use crate::routing::{BasePath, RouteMatch};

/// Response header naming the route that served a document.
pub const X_ROUTE_NAME: HeaderName = HeaderName::from_static("x-route-name");

pub async fn serve_view(state: &AppState, method: Method, path: String) -> Response {
    if method != Method::GET && method != Method::HEAD {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    let Some(relative) = state.base.strip(&path) else {
        tracing::debug!(path = %path, base = %state.base.as_str(), "Request outside base path");
        return not_found(&path);
    };

    let route = match state.routes.resolve(relative) {
        RouteMatch::Found(route) => route,
        RouteMatch::NotFound => return not_found(&path),
    };

    match state.loader.load(route).await {
        Ok(module) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/html; charset=utf-8"),
                (X_ROUTE_NAME, route.name()),
            ],
            render_document(&state.base, &module),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(path = %path, error = %e, "View module unavailable");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

fn not_found(path: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        format!("<!DOCTYPE html>\n<html><body><h1>Not Found</h1><p>{}</p></body></html>\n", escape(path)),
    )
        .into_response()
}

/// Wrap a view module in the application shell.
pub fn render_document(base: &BasePath, module: &ViewModule) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<base href=\"{}\">\n</head>\n<body>\n<div id=\"app\" data-route=\"{}\">\n{}\n</div>\n</body>\n</html>\n",
        base.join("/"),
        escape(&module.route),
        module.source,
    )
}

fn escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
