//! `GET /` — the chat page.
//!
//! The only dynamic content is the WebSocket URL, derived from the request's
//! `Host` header and the production flag: `wss` in production, `ws` otherwise.

use axum::extract::State;
use axum::response::Html;
use axum_extra::extract::Host;

use crate::server::AppState;

/// Build the chat socket URL for a given host.
#[must_use]
pub fn chat_url(host: &str, production: bool) -> String {
    let scheme = if production { "wss" } else { "ws" };
    format!("{scheme}://{host}/chat")
}

/// Render the chat page with the socket URL inlined.
#[must_use]
pub fn render_index(ws_url: &str) -> String {
    // Escape the URL for embedding inside a JS string literal.
    let escaped = ws_url.replace('\\', "\\\\").replace('\'', "\\'");
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Parlor</title>
  <style>
    body {{ font-family: sans-serif; max-width: 40rem; margin: 2rem auto; }}
    #messages {{ list-style: none; padding: 0; }}
    #messages li {{ padding: 0.2rem 0; border-bottom: 1px solid #eee; }}
  </style>
</head>
<body>
  <h1>Parlor</h1>
  <ul id="messages"></ul>
  <form id="chatform">
    <input id="message" autocomplete="off" placeholder="Say something" maxlength="100">
    <button>Send</button>
  </form>
  <script>
    var socket = new WebSocket('{escaped}');
    socket.onmessage = function (event) {{
      var li = document.createElement('li');
      li.textContent = event.data;
      document.getElementById('messages').appendChild(li);
    }};
    document.getElementById('chatform').addEventListener('submit', function (e) {{
      e.preventDefault();
      var input = document.getElementById('message');
      socket.send(input.value);
      input.value = '';
    }});
  </script>
</body>
</html>
"#
    )
}

/// `GET /` handler.
pub async fn index_handler(State(state): State<AppState>, Host(host): Host) -> Html<String> {
    let url = chat_url(&host, state.production);
    Html(render_index(&url))
}
