// src/reload/http.rs

//! Static file responses for the dev server.

use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use tiny_http::{Header, Request, Response, StatusCode};

use super::client::inject_reload_script;

/// Map a request URL onto a file below `base`.
///
/// Query strings and fragments are ignored, `..` segments are refused and
/// directories resolve to their `index.html`.
pub fn resolve_path(url: &str, base: &Path) -> Option<PathBuf> {
    let path = url.split(['?', '#']).next().unwrap_or("");

    let mut resolved = base.to_path_buf();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => return None,
            s => resolved.push(s),
        }
    }

    if resolved.is_dir() {
        resolved.push("index.html");
    }
    resolved.is_file().then_some(resolved)
}

pub fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js" | "mjs") => "text/javascript; charset=utf-8",
        Some("json" | "map") => "application/json",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",
        Some("woff2") => "font/woff2",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

fn make_header(name: &str, value: &str) -> Result<Header> {
    Header::from_bytes(name.as_bytes(), value.as_bytes())
        .map_err(|_| anyhow!("invalid header {name}: {value}"))
}

fn send_body(request: Request, status: u16, content_type: &str, body: Vec<u8>) -> Result<()> {
    let response = Response::from_data(body)
        .with_status_code(StatusCode(status))
        .with_header(make_header("Content-Type", content_type)?)
        .with_header(make_header("Cache-Control", "no-store")?);
    request.respond(response)?;
    Ok(())
}

/// Answer one request from `base`, adding the reload client to HTML pages.
pub fn handle_request(request: Request, base: &Path, ws_port: u16) -> Result<()> {
    let Some(path) = resolve_path(request.url(), base) else {
        return send_body(request, 404, "text/plain; charset=utf-8", b"404 Not Found".to_vec());
    };

    let mime = content_type(&path);
    let body = std::fs::read(&path)?;
    let body = if mime.starts_with("text/html") {
        inject_reload_script(&body, ws_port)
    } else {
        body
    };
    send_body(request, 200, mime, body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refuses_parent_segments() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(resolve_path("/../etc/passwd", dir.path()), None);
    }

    #[test]
    fn directories_resolve_to_index() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<html></html>").unwrap();
        std::fs::create_dir(dir.path().join("css")).unwrap();
        std::fs::write(dir.path().join("css/a.css"), "").unwrap();

        assert_eq!(resolve_path("/", dir.path()), Some(dir.path().join("index.html")));
        assert_eq!(
            resolve_path("/css/a.css?v=1", dir.path()),
            Some(dir.path().join("css").join("a.css"))
        );
        assert_eq!(resolve_path("/missing.js", dir.path()), None);
    }
}
