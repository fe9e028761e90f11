//! Static files served from the configured web root.

use crate::error::{Error, Result};
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use regex_lite::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

pub const NO_STORE: &str = "no-store";
pub const CACHEABLE: &str = "public, max-age=604800, immutable";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Html,
    Css,
    Js,
    Svg,
}

impl AssetKind {
    pub fn content_type(self) -> &'static str {
        match self {
            AssetKind::Html => "text/html; charset=utf-8",
            AssetKind::Css => "text/css; charset=utf-8",
            AssetKind::Js => "application/javascript; charset=utf-8",
            AssetKind::Svg => "image/svg+xml",
        }
    }

    /// `no-store` for pages, long-lived caching for everything else.
    pub fn cache_control(self) -> &'static str {
        match self {
            AssetKind::Html => NO_STORE,
            _ => CACHEABLE,
        }
    }
}

static ASSET_ROUTES: LazyLock<Vec<(AssetKind, &'static str, Regex)>> = LazyLock::new(|| {
    [
        (AssetKind::Css, "css", r"(?i)^.*/css/([a-z0-9\.\-_]+\.css)$"),
        (AssetKind::Js, "js", r"(?i)^.*/js/([a-z0-9\.\-_]+\.js)$"),
        (AssetKind::Svg, "svg", r"(?i)^.*/svg/([a-z0-9\.\-_]+\.svg)$"),
    ]
    .into_iter()
    .map(|(kind, dir, pattern)| (kind, dir, Regex::new(pattern).expect("valid asset regex")))
    .collect()
});

/// Map a request path to a file below the web root, e.g.
/// `/anything/css/main.css` to `css/main.css`. Matching ignores case; the
/// directory is always the lower-case one and the file name is kept as sent.
pub fn match_asset(path: &str) -> Option<(AssetKind, PathBuf)> {
    ASSET_ROUTES.iter().find_map(|(kind, dir, re)| {
        re.captures(path)
            .map(|caps| (*kind, Path::new(dir).join(&caps[1])))
    })
}

/// Read `relative` below `root` and wrap it in a response.
pub async fn serve(root: &Path, relative: &Path, kind: AssetKind) -> Result<Response> {
    let path = root.join(relative);
    let body = tokio::fs::read(&path)
        .await
        .map_err(|e| Error::io(format!("Failed to open {}: {}", path.display(), e)))?;
    Ok((
        [
            (CONTENT_TYPE, kind.content_type()),
            (CACHE_CONTROL, kind.cache_control()),
        ],
        body,
    )
        .into_response())
}
