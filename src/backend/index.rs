//! The client page served at the index route.

use crate::backend::paths::MountPaths;

const INDEX_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    {head}
  </head>
  <body>
    <div id="app"></div>
    <script type="module">
      const mount = document.getElementById("app");
      const scheme = window.location.protocol === "https:" ? "wss:" : "ws:";
      const route = window.location.pathname.slice("{prefix}".length) || "/";
      const url = `${scheme}//${window.location.host}{stream}${route}${window.location.search}`;
      const socket = new WebSocket(url);
      socket.onmessage = (message) => {
        const update = JSON.parse(message.data);
        if (update.type === "layout-update") {
          mount.textContent = JSON.stringify(update.model, null, 2);
        }
      };
      window.reactpySend = (event) => socket.send(JSON.stringify(event));
    </script>
  </body>
</html>
"#;

/// Render the index page for a mount.
pub fn render_index(paths: &MountPaths, head: &str) -> String {
    INDEX_TEMPLATE
        .replace("{head}", head)
        .replace("{prefix}", &paths.prefix)
        .replace("{stream}", &paths.stream)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_index() {
        let html = render_index(&MountPaths::new("/app"), "<title>Demo</title>");
        assert!(html.contains("<title>Demo</title>"));
        assert!(html.contains("/app/_reactpy/stream"));
        assert!(html.contains(r#"slice("/app".length)"#));
        assert!(!html.contains("{head}"));
    }
}
