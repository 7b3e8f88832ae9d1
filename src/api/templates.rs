//! HTML pages served by the service.
//!
//! Inline templates without a template engine. The entry pages are static;
//! only the welcome page interpolates user-controlled values.

use crate::api::handlers::auth::HtmlEscaping;

const COMMON_STYLES: &str = r"
    * {
        margin: 0;
        padding: 0;
        box-sizing: border-box;
    }
    body {
        font-family: Arial, sans-serif;
        background: linear-gradient(135deg, #667eea 0%, #764ba2 100%);
        display: flex;
        justify-content: center;
        align-items: center;
        min-height: 100vh;
        padding: 20px;
    }
    .container {
        background: white;
        padding: 40px;
        border-radius: 10px;
        box-shadow: 0 10px 25px rgba(0, 0, 0, 0.2);
        max-width: 420px;
        width: 100%;
    }
    h1 {
        color: #667eea;
        margin-bottom: 20px;
        text-align: center;
    }
    label {
        display: block;
        margin: 12px 0 4px;
        color: #333;
        font-weight: bold;
    }
    input {
        width: 100%;
        padding: 10px;
        border: 1px solid #ddd;
        border-radius: 5px;
        font-size: 14px;
    }
    button {
        width: 100%;
        margin-top: 20px;
        padding: 12px;
        border: none;
        border-radius: 5px;
        background: linear-gradient(135deg, #667eea 0%, #764ba2 100%);
        color: white;
        font-weight: bold;
        cursor: pointer;
    }
    .message {
        margin-top: 15px;
        text-align: center;
        color: #c0392b;
    }
    .message.ok {
        color: #27ae60;
    }
    .switch {
        margin-top: 20px;
        text-align: center;
        color: #666;
    }
";

const WELCOME_STYLES: &str = r"
    .welcome-container {
        background: white;
        padding: 60px 40px;
        border-radius: 10px;
        box-shadow: 0 10px 25px rgba(0, 0, 0, 0.2);
        text-align: center;
        max-width: 500px;
        width: 100%;
    }
    .welcome-container h1 {
        font-size: 36px;
        margin-bottom: 15px;
    }
    .username {
        color: #764ba2;
        font-size: 28px;
        font-weight: bold;
        margin-bottom: 30px;
    }
    p {
        color: #666;
        font-size: 16px;
        margin-bottom: 20px;
        line-height: 1.6;
    }
    .info-box {
        background-color: #f0f0f0;
        padding: 15px;
        border-radius: 5px;
        margin: 20px 0;
        border-left: 4px solid #667eea;
    }
    .info-box strong {
        color: #667eea;
    }
    a.button {
        display: inline-block;
        margin-top: 30px;
        padding: 12px 30px;
        background: linear-gradient(135deg, #667eea 0%, #764ba2 100%);
        color: white;
        text-decoration: none;
        border-radius: 5px;
        font-weight: bold;
    }
";

/// Posts JSON to `/login` and moves on to `/welcome` with the returned
/// identity, which works whether `/welcome` reads the cookie or the query.
const LOGIN_SCRIPT: &str = r"
    document.getElementById('login-form').addEventListener('submit', async (event) => {
        event.preventDefault();
        const message = document.getElementById('message');
        message.textContent = '';
        const body = {
            username: document.getElementById('username').value,
            password: document.getElementById('password').value,
        };
        try {
            const response = await fetch('/login', {
                method: 'POST',
                headers: { 'Content-Type': 'application/json' },
                credentials: 'same-origin',
                body: JSON.stringify(body),
            });
            const data = await response.json();
            if (response.ok && data.success) {
                const params = new URLSearchParams({ username: data.username, email: data.email });
                window.location.href = '/welcome?' + params.toString();
            } else {
                message.textContent = data.error || 'Login failed';
            }
        } catch (err) {
            message.textContent = 'Login failed';
        }
    });
";

const REGISTER_SCRIPT: &str = r"
    document.getElementById('register-form').addEventListener('submit', async (event) => {
        event.preventDefault();
        const message = document.getElementById('message');
        message.className = 'message';
        message.textContent = '';
        const body = {
            username: document.getElementById('username').value,
            email: document.getElementById('email').value,
            password: document.getElementById('password').value,
            'confirm-password': document.getElementById('confirm-password').value,
        };
        try {
            const response = await fetch('/register', {
                method: 'POST',
                headers: { 'Content-Type': 'application/json' },
                body: JSON.stringify(body),
            });
            const data = await response.json();
            if (response.ok && data.success) {
                message.className = 'message ok';
                message.textContent = data.message;
                setTimeout(() => { window.location.href = '/'; }, 1500);
            } else {
                message.textContent = data.error || 'Registration failed';
            }
        } catch (err) {
            message.textContent = 'Registration failed';
        }
    });
";

fn page(title: &str, styles: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>{COMMON_STYLES}{styles}</style>
</head>
<body>
{body}
</body>
</html>"#
    )
}

#[must_use]
pub fn login_page() -> String {
    let body = format!(
        r#"    <div class="container">
        <h1>Login</h1>
        <form id="login-form">
            <label for="username">Username</label>
            <input type="text" id="username" name="username" required>
            <label for="password">Password</label>
            <input type="password" id="password" name="password" required>
            <button type="submit">Login</button>
        </form>
        <div id="message" class="message"></div>
        <div class="switch">No account yet? <a href="/register">Register</a></div>
    </div>
    <script>{LOGIN_SCRIPT}</script>"#
    );
    page("Login", "", &body)
}

#[must_use]
pub fn register_page() -> String {
    let body = format!(
        r#"    <div class="container">
        <h1>Register</h1>
        <form id="register-form">
            <label for="username">Username</label>
            <input type="text" id="username" name="username" required>
            <label for="email">Email</label>
            <input type="email" id="email" name="email" required>
            <label for="password">Password</label>
            <input type="password" id="password" name="password" required>
            <label for="confirm-password">Confirm password</label>
            <input type="password" id="confirm-password" name="confirm-password" required>
            <button type="submit">Register</button>
        </form>
        <div id="message" class="message"></div>
        <div class="switch">Already registered? <a href="/">Login</a></div>
    </div>
    <script>{REGISTER_SCRIPT}</script>"#
    );
    page("Register", "", &body)
}

/// Render the welcome page for an identity.
///
/// With [`HtmlEscaping::Raw`] the values are interpolated verbatim, which
/// allows script injection through them.
#[must_use]
pub fn render_welcome(username: &str, email: &str, escaping: HtmlEscaping) -> String {
    let (username, email) = match escaping {
        HtmlEscaping::Escape => (html_escape(username), html_escape(email)),
        HtmlEscaping::Raw => (username.to_string(), email.to_string()),
    };

    let body = format!(
        r#"    <div class="welcome-container">
        <h1>Welcome!</h1>
        <div class="username">{username}</div>
        <p>You have successfully logged in to your account.</p>
        <div class="info-box">
            <strong>Email:</strong> {email}
        </div>
        <a class="button" href="/">Logout</a>
    </div>"#
    );
    page("Welcome", WELCOME_STYLES, &body)
}

/// Escape HTML special characters
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(
            html_escape(r#"<script>alert("x")</script> & 'y'"#),
            "&lt;script&gt;alert(&quot;x&quot;)&lt;/script&gt; &amp; &#x27;y&#x27;"
        );
    }

    #[test]
    fn welcome_escapes_by_default() {
        let html = render_welcome("<b>alice</b>", "a@x.com", HtmlEscaping::default());
        assert!(html.contains("&lt;b&gt;alice&lt;/b&gt;"));
        assert!(!html.contains("<b>alice</b>"));
        assert!(html.contains("a@x.com"));
    }

    #[test]
    fn welcome_raw_keeps_markup() {
        let html = render_welcome("<b>alice</b>", "a@x.com", HtmlEscaping::Raw);
        assert!(html.contains(r#"<div class="username"><b>alice</b></div>"#));
    }

    #[test]
    fn entry_pages_link_to_each_other() {
        let login = login_page();
        assert!(login.contains(r#"href="/register""#));
        assert!(login.contains("fetch('/login'"));

        let register = register_page();
        assert!(register.contains(r#"href="/""#));
        assert!(register.contains(r#"name="confirm-password""#));
    }
}
