use serde_json::json;

use super::{RenderContext, Renderer, View};

/// Renders `{"template", "user", "context"}` instead of markup, for API
/// clients and for asserting on page context in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer;

impl Renderer for JsonRenderer {
    fn render(&self, view: &View, ctx: RenderContext<'_>) -> String {
        json!({
            "template": view.template_name(),
            "user": ctx.caller.map(|c| c.username.as_str()),
            "context": view,
        })
        .to_string()
    }

    fn content_type(&self) -> &'static str {
        "application/json"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::FeedView;

    #[test]
    fn renders_template_and_context() {
        let view = View::Index(FeedView {
            page: crate::pagination::paginate(Vec::new(), 3, 10),
        });
        let body: serde_json::Value =
            serde_json::from_str(&JsonRenderer.render(&view, RenderContext::default())).unwrap();

        assert_eq!(body["template"], "posts/index.html");
        assert_eq!(body["user"], serde_json::Value::Null);
        assert_eq!(body["context"]["page"]["number"], 1);
        assert_eq!(body["context"]["page"]["items"], serde_json::json!([]));
    }
}
