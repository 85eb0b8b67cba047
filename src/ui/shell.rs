use axum::{
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use ts_rs::TS;
use uuid::Uuid;

use super::theme::{MemoryStorage, THEME_STORAGE_KEY, ThemeMode, ThemeToggle};
use crate::auth::Identity;

/// How long the client query cache treats a result as fresh.
pub const QUERY_STALE_TIME_MS: u64 = 60_000;

/// `Cache-Control` sent with successful API responses, matching the client cache lifetime.
pub const CLIENT_CACHE_CONTROL: &str = "private, max-age=60";

pub const LEGACY_PATH: &str = "/learn";
pub const LEGACY_DESTINATION: &str = "/dashboard/learn";

/// QueryClientConfig
///
/// Settings the client passes to its query cache at startup.
#[derive(Debug, Clone, Serialize, TS, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct QueryClientConfig {
    pub stale_time: u64,
    pub refetch_on_window_focus: bool,
}

impl Default for QueryClientConfig {
    fn default() -> Self {
        Self {
            stale_time: QUERY_STALE_TIME_MS,
            refetch_on_window_focus: false,
        }
    }
}

/// SessionHint
///
/// The part of the session the client needs before its first request.
#[derive(Debug, Clone, Serialize, TS, PartialEq)]
#[ts(export)]
pub struct SessionHint {
    pub id: Uuid,
    pub role: String,
}

/// Hydration
///
/// JSON blob embedded in the page shell and read once by the client on boot.
#[derive(Debug, Clone, Serialize, TS, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Hydration {
    pub session: Option<SessionHint>,
    pub query_client: QueryClientConfig,
    pub theme_storage_key: String,
    pub theme: ThemeMode,
}

impl Hydration {
    pub fn new(identity: &Identity, theme: ThemeMode) -> Self {
        let session = match identity {
            Identity::Authenticated { id, role } => Some(SessionHint {
                id: *id,
                role: role.clone(),
            }),
            Identity::Anonymous => None,
        };

        Self {
            session,
            query_client: QueryClientConfig::default(),
            theme_storage_key: THEME_STORAGE_KEY.to_string(),
            theme,
        }
    }
}

/// Keeps `</script>` and friends from terminating the inline JSON early.
fn escape_inline_json(json: &str) -> String {
    json.replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026")
}

/// Light/dark bootstrap, invoked with the storage key: local storage wins, the cookie mirror
/// lets the server render the right theme on the next load.
const THEME_SCRIPT: &str = r#"(function (key) {
  var root = document.documentElement;
  var stored = window.localStorage.getItem(key);
  if (stored === "light" || stored === "dark") { root.dataset.theme = stored; }
  window.__toggleTheme = function () {
    var next = root.dataset.theme === "dark" ? "light" : "dark";
    root.dataset.theme = next;
    window.localStorage.setItem(key, next);
    document.cookie = key + "=" + next + "; path=/; max-age=31536000; samesite=lax";
    return next;
  };
})"#;

const LAYOUT_STYLE: &str = r#"
:root { color-scheme: light; --bg: #ffffff; --fg: #1f2933; --accent: #2563eb; }
:root[data-theme="dark"] { color-scheme: dark; --bg: #111827; --fg: #e5e7eb; --accent: #60a5fa; }
body { margin: 0; font-family: system-ui, sans-serif; background: var(--bg); color: var(--fg); }
header { display: flex; align-items: center; justify-content: space-between; padding: 0.75rem 1.5rem; }
header a { color: var(--accent); text-decoration: none; margin-right: 1rem; }
#theme-toggle { border: 1px solid currentColor; background: transparent; color: inherit; border-radius: 0.375rem; padding: 0.25rem 0.75rem; cursor: pointer; }
main { padding: 1.5rem; }
"#;

/// render_shell
///
/// The single HTML document every client route boots from.
pub fn render_shell(hydration: &Hydration) -> String {
    let json = serde_json::to_string(hydration).unwrap_or_else(|e| {
        tracing::error!(error = ?e, "failed to serialize hydration payload");
        "{}".to_string()
    });
    let key = serde_json::Value::from(THEME_STORAGE_KEY).to_string();

    format!(
        r#"<!DOCTYPE html>
<html lang="en" data-theme="{theme}">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Lingo</title>
<script>{script}({key});</script>
<style>{style}</style>
</head>
<body>
<header>
<nav><a href="/">Lingo</a><a href="{learn}">Learn</a></nav>
<button type="button" id="theme-toggle" aria-label="Toggle light and dark theme" onclick="window.__toggleTheme()">Toggle theme</button>
</header>
<main id="root"></main>
<script id="__HYDRATION__" type="application/json">{json}</script>
</body>
</html>
"#,
        theme = hydration.theme.as_str(),
        script = THEME_SCRIPT,
        key = escape_inline_json(&key),
        style = LAYOUT_STYLE,
        learn = LEGACY_DESTINATION,
        json = escape_inline_json(&json),
    )
}

/// index
///
/// [Public Route] Serves the page shell. Signed-in callers get their session hint embedded;
/// the initial theme follows the `theme` cookie mirror of local storage.
pub async fn index(identity: Identity, jar: CookieJar) -> Html<String> {
    let storage = match jar.get(THEME_STORAGE_KEY) {
        Some(cookie) => MemoryStorage::with_entry(THEME_STORAGE_KEY, cookie.value()),
        None => MemoryStorage::default(),
    };
    let theme = ThemeToggle::new(storage).mode();

    Html(render_shell(&Hydration::new(&identity, theme)))
}

/// legacy_redirect
///
/// [Public Route] The old learning page moved under the dashboard. Always redirects; the body
/// is a placeholder for clients that render before following the `Location` header.
pub async fn legacy_redirect() -> Response {
    let placeholder = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><meta http-equiv="refresh" content="0; url={dest}"><title>Redirecting…</title></head>
<body><p>Redirecting…</p></body>
</html>
"#,
        dest = LEGACY_DESTINATION
    );

    (
        StatusCode::TEMPORARY_REDIRECT,
        [(header::LOCATION, LEGACY_DESTINATION)],
        Html(placeholder),
    )
        .into_response()
}

