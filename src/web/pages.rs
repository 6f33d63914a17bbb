//! HTML pages.
//!
//! Each page is read from the views directory when a file with the expected
//! name exists there, so the puzzle can be restyled without rebuilding.
//! Otherwise a minimal built-in page is served.

use std::path::Path;

use axum::response::Html;
use tracing::debug;

/// Body of the `/expired` page.
pub const ACCESS_BLOCKED: &str =
    "<h1>ACCESS BLOCKED</h1><p>You are no longer allowed to access this server.</p>";

/// The pages rendered by the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Login,
    Problem,
    Success,
}

impl Page {
    /// File name looked up in the views directory.
    pub fn file_name(&self) -> &'static str {
        match self {
            Page::Login => "part1.html",
            Page::Problem => "problem.html",
            Page::Success => "success.html",
        }
    }

    /// Built-in markup, with a failure notice when `error` is set.
    pub fn builtin(&self, error: bool) -> String {
        let notice = |text: &str| {
            if error {
                format!(r#"<p class="error">{text}</p>"#)
            } else {
                String::new()
            }
        };

        match self {
            Page::Login => format!(
                r#"<!DOCTYPE html>
<html><head><meta charset="utf-8"><title>Login</title></head>
<body>
<h1>Login</h1>
{}
<form method="post" action="/login">
<input name="id" placeholder="ID" autocomplete="off">
<input name="pw" type="password" placeholder="Password">
<button type="submit">Enter</button>
</form>
</body></html>"#,
                notice("Wrong ID or password.")
            ),
            Page::Problem => format!(
                r#"<!DOCTYPE html>
<html><head><meta charset="utf-8"><title>Problem</title></head>
<body>
<h1>Problem</h1>
{}
<form method="post" action="/submit-answer">
<input name="answer" placeholder="Answer" autocomplete="off">
<button type="submit">Submit</button>
</form>
<p><a href="/logout">Logout</a></p>
</body></html>"#,
                notice("Wrong answer.")
            ),
            Page::Success => r#"<!DOCTYPE html>
<html><head><meta charset="utf-8"><title>Success</title></head>
<body>
<h1>Correct!</h1>
<p><a href="/download">Download</a></p>
<p><a href="/logout">Logout</a></p>
</body></html>"#
                .to_string(),
        }
    }

    /// Render from `views_dir`, falling back to the built-in page.
    pub async fn render(&self, views_dir: &Path, error: bool) -> Html<String> {
        let path = views_dir.join(self.file_name());
        match tokio::fs::read_to_string(&path).await {
            Ok(body) => Html(body),
            Err(e) => {
                debug!("using built-in {:?} page ({}: {e})", self, path.display());
                Html(self.builtin(error))
            }
        }
    }
}
