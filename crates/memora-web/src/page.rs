//! HTML rendering of the memo page.
//!
//! The page shows the auth form when logged out and the memo form plus list
//! when logged in. Every value that came from a user or the backend is
//! escaped.

use memora_core::Memo;

use crate::controller::ViewState;

/// Message shown above the page content after an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
}

impl Notice {
    fn render(&self) -> String {
        let (class, text) = match self {
            Notice::Info(text) => ("notice info", text),
            Notice::Error(text) => ("notice error", text),
        };
        format!(
            r#"<div class="{}" role="alert">{}</div>"#,
            class,
            html_escape(text)
        )
    }
}

/// Render the whole page for `state`.
pub fn render(state: &ViewState, notice: Option<&Notice>) -> String {
    let body = match &state.user {
        None => render_auth_form(state),
        Some(user) => format!(
            r#"<p class="whoami">Signed in as {user}</p>
        <form method="POST" action="/signout"><button type="submit">Log out</button></form>
        {memo_form}
        <ul class="memos">
{items}
        </ul>"#,
            user = html_escape(user.display_name()),
            memo_form = render_memo_form(state),
            items = state
                .memos
                .iter()
                .map(|memo| render_memo(state, memo))
                .collect::<Vec<_>>()
                .join("\n"),
        ),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>Memos</title>
    <style>
        body {{ font-family: system-ui, sans-serif; padding: 2rem; max-width: 40rem; }}
        form.inline {{ display: inline; margin-left: 0.5rem; }}
        .notice {{ padding: 0.5rem 1rem; margin-bottom: 1rem; border-radius: 4px; }}
        .notice.info {{ background: #e8f4fd; }}
        .notice.error {{ background: #fdecea; }}
        ul.memos li {{ margin: 0.5rem 0; }}
    </style>
</head>
<body>
    <main>
        <h1>Memos</h1>
        {notice}
        {body}
    </main>
</body>
</html>"#,
        notice = notice.map(Notice::render).unwrap_or_default(),
        body = body,
    )
}

fn render_auth_form(state: &ViewState) -> String {
    // The password is never echoed back into the page.
    format!(
        r#"<form method="POST" action="/signin" class="auth">
            <input type="email" name="email" value="{email}" placeholder="Email address">
            <input type="password" name="password" placeholder="Password">
            <button type="submit" formaction="/signup">Sign up</button>
            <button type="submit">Log in</button>
        </form>"#,
        email = html_escape(&state.email),
    )
}

fn render_memo_form(state: &ViewState) -> String {
    format!(
        r#"<form method="POST" action="/memos" class="new-memo">
            <input type="text" name="content" value="{draft}" placeholder="Write a memo">
            <button type="submit">Add</button>
        </form>"#,
        draft = html_escape(&state.new_memo),
    )
}

fn render_memo(state: &ViewState, memo: &Memo) -> String {
    let id = html_escape(&memo.id);

    match state.editing.as_ref().filter(|e| e.id == memo.id) {
        Some(draft) => format!(
            r#"            <li data-id="{id}">
                <form method="POST" action="/memos/save" class="inline">
                    <input type="text" name="content" value="{content}">
                    <button type="submit">Save</button>
                </form>
                <form method="POST" action="/memos/cancel" class="inline">
                    <button type="submit">Cancel</button>
                </form>
            </li>"#,
            id = id,
            content = html_escape(&draft.content),
        ),
        None => format!(
            r#"            <li data-id="{id}">
                <span class="content">{content}</span>
                <form method="POST" action="/memos/delete" class="inline">
                    <input type="hidden" name="id" value="{id}">
                    <button type="submit">Delete</button>
                </form>
                <form method="POST" action="/memos/edit" class="inline">
                    <input type="hidden" name="id" value="{id}">
                    <input type="hidden" name="content" value="{content}">
                    <button type="submit">Edit</button>
                </form>
            </li>"#,
            id = id,
            content = html_escape(&memo.content),
        ),
    }
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::EditDraft;
    use chrono::Utc;
    use memora_core::User;

    fn memo(id: &str, content: &str) -> Memo {
        Memo {
            id: id.to_string(),
            content: content.to_string(),
            created_at: Utc::now(),
        }
    }

    fn logged_in(memos: Vec<Memo>) -> ViewState {
        ViewState {
            user: Some(User {
                id: "u1".to_string(),
                email: Some("a@b.com".to_string()),
                created_at: None,
                confirmed_at: None,
                last_sign_in_at: None,
            }),
            memos,
            ..ViewState::default()
        }
    }

    #[test]
    fn test_logged_out_shows_auth_form_only() {
        let html = render(&ViewState::default(), None);
        assert!(html.contains(r#"action="/signin""#));
        assert!(html.contains(r#"formaction="/signup""#));
        assert!(!html.contains(r#"action="/memos""#));
        assert!(!html.contains("Log out"));
    }

    #[test]
    fn test_logged_in_shows_memo_form_and_list() {
        let html = render(&logged_in(vec![memo("m1", "first")]), None);
        assert!(html.contains("Signed in as a@b.com"));
        assert!(html.contains(r#"action="/memos""#));
        assert!(html.contains(r#"action="/signout""#));
        assert!(html.contains(r#"<span class="content">first</span>"#));
        assert!(!html.contains(r#"action="/signin""#));
    }

    #[test]
    fn test_memos_render_in_state_order() {
        let html = render(
            &logged_in(vec![memo("m2", "newer"), memo("m1", "older")]),
            None,
        );
        let newer = html.find("newer").unwrap();
        let older = html.find("older").unwrap();
        assert!(newer < older);
    }

    #[test]
    fn test_edit_target_renders_save_and_cancel() {
        let mut state = logged_in(vec![memo("m1", "first"), memo("m2", "second")]);
        state.editing = Some(EditDraft {
            id: "m2".to_string(),
            content: "second (draft)".to_string(),
        });

        let html = render(&state, None);
        assert!(html.contains(r#"value="second (draft)""#));
        assert!(html.contains(r#"action="/memos/save""#));
        assert!(html.contains(r#"action="/memos/cancel""#));
        // Only the target is in edit mode.
        assert!(html.contains(r#"<span class="content">first</span>"#));
        assert!(!html.contains(r#"<span class="content">second</span>"#));
    }

    #[test]
    fn test_content_is_escaped() {
        let html = render(
            &logged_in(vec![memo("m1", r#"<script>alert("x")</script>"#)]),
            None,
        );
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;alert(&quot;x&quot;)&lt;/script&gt;"));
    }

    #[test]
    fn test_password_not_echoed() {
        let state = ViewState {
            email: "a@b.com".to_string(),
            password: "hunter2".to_string(),
            ..ViewState::default()
        };
        let html = render(&state, None);
        assert!(html.contains(r#"value="a@b.com""#));
        assert!(!html.contains("hunter2"));
    }

    #[test]
    fn test_notice_rendered_and_escaped() {
        let notice = Notice::Error("Failed to add memo: <bad>".to_string());
        let html = render(&logged_in(vec![]), Some(&notice));
        assert!(html.contains(r#"class="notice error""#));
        assert!(html.contains("Failed to add memo: &lt;bad&gt;"));
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(html_escape("a & b"), "a &amp; b");
        assert_eq!(html_escape("it's"), "it&#39;s");
    }
}
