//! Static file server for the dashboard and its two artifacts.
//!
//! Any path with a dot-prefixed segment is a 404: the served directory is
//! also where `.env` and the in-flight `.<name>.tmp` files live.

use anyhow::Context as _;
use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::Router;
use std::path::Path;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Serve the visible files under `root`; directories resolve to `index.html`.
pub fn router(root: &Path) -> Router {
    Router::new()
        .fallback_service(ServeDir::new(root).append_index_html_on_directories(true))
        .layer(middleware::from_fn(hide_dotfiles))
        .layer(TraceLayer::new_for_http())
}

fn is_hidden(path: &str) -> bool {
    path.split('/').any(|segment| {
        segment.starts_with('.')
            || segment
                .get(..3)
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case("%2e"))
    })
}

async fn hide_dotfiles(req: Request, next: Next) -> Response {
    if is_hidden(req.uri().path()) {
        return StatusCode::NOT_FOUND.into_response();
    }
    next.run(req).await
}

/// Bind `host:port` and serve `root` until Ctrl-C.
pub async fn serve_dir(root: &Path, host: &str, port: u16) -> anyhow::Result<()> {
    let app = router(root);
    let address = format!("{host}:{port}");

    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
    tracing::info!(root = %root.display(), "Listening on http://{address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    async fn get(root: &Path, uri: &str) -> (StatusCode, Vec<u8>) {
        let resp = router(root)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn serves_artifacts_and_index() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bubble_today.json"), b"{\"band\":\"calm\"}").unwrap();
        std::fs::create_dir(dir.path().join("data")).unwrap();
        std::fs::write(dir.path().join("data/bubble_daily.csv"), b"date\n").unwrap();
        std::fs::write(dir.path().join("index.html"), b"<html></html>").unwrap();

        let (status, body) = get(dir.path(), "/bubble_today.json").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"{\"band\":\"calm\"}");

        let (status, body) = get(dir.path(), "/data/bubble_daily.csv").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"date\n");

        let (status, body) = get(dir.path(), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"<html></html>");
    }

    #[tokio::test]
    async fn dotfiles_are_never_served() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".env"), b"FINNHUB_API_KEY=secret123\n").unwrap();
        std::fs::write(dir.path().join(".bubble_today.json.tmp"), b"{}").unwrap();
        std::fs::create_dir(dir.path().join(".git")).unwrap();
        std::fs::write(dir.path().join(".git/config"), b"[core]").unwrap();

        for uri in [
            "/.env",
            "/%2Eenv",
            "/%2eenv",
            "/.bubble_today.json.tmp",
            "/.git/config",
            "/data/../.env",
        ] {
            let (status, body) = get(dir.path(), uri).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
            assert!(!body.windows(9).any(|w| w == b"secret123"), "{uri}");
        }
    }

    #[test]
    fn hidden_segments() {
        assert!(is_hidden("/.env"));
        assert!(is_hidden("/data/.bubble_daily.csv.tmp"));
        assert!(is_hidden("/%2Egit/HEAD"));
        assert!(!is_hidden("/"));
        assert!(!is_hidden("/bubble_today.json"));
        assert!(!is_hidden("/data/bubble_daily.csv"));
    }

    #[tokio::test]
    async fn missing_file_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let (status, _) = get(dir.path(), "/nope.json").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
