//! Handlebars renderer for templates

use handlebars::{no_escape, Handlebars};
use serde_json::{Map, Value};

use super::types::{TemplateContent, TemplateError, TemplateResult};

const TEMPLATE_NAME: &str = "template";

/// Escaping applied to `{{field}}` output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Escape {
    /// HTML-escape values. `{{{field}}}` writes them raw.
    Html,
    /// Write values as they are
    None,
}

/// One compiled Handlebars template.
///
/// Runs in non-strict mode: fields missing from the context render as an
/// empty string. Dotted paths (`{{user.name}}`), bracketed segments
/// (`{{items.[0]}}`) and the built-in helpers (`#if`, `#unless`, `#each`,
/// `#with`, `lookup`) are available.
#[derive(Debug)]
pub struct Renderer {
    key: String,
    registry: Handlebars<'static>,
}

impl Renderer {
    /// Compile a template string for `key`
    pub fn compile(key: &str, source: &str, escape: Escape) -> TemplateResult<Self> {
        let mut registry = Handlebars::new();
        if escape == Escape::None {
            registry.register_escape_fn(no_escape);
        }

        registry
            .register_template_string(TEMPLATE_NAME, source)
            .map_err(|e| TemplateError::Syntax {
                key: key.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            key: key.to_string(),
            registry,
        })
    }

    /// Render against a context
    pub fn render(&self, context: &Map<String, Value>) -> TemplateResult<String> {
        self.registry
            .render(TEMPLATE_NAME, context)
            .map_err(|e| TemplateError::Render {
                key: self.key.clone(),
                message: e.to_string(),
            })
    }
}

/// Compiled subject and body renderers for one template.
///
/// The body is HTML and escapes `{{field}}` output. The subject is plain text
/// and does not.
#[derive(Debug)]
pub struct CompiledTemplate {
    pub subject: Renderer,
    pub body: Renderer,
}

impl CompiledTemplate {
    pub fn compile(key: &str, content: &TemplateContent) -> TemplateResult<Self> {
        Ok(Self {
            subject: Renderer::compile(key, &content.subject, Escape::None)?,
            body: Renderer::compile(key, &content.body, Escape::Html)?,
        })
    }

    pub fn render_subject(&self, context: &Map<String, Value>) -> TemplateResult<String> {
        self.subject.render(context)
    }

    pub fn render_body(&self, context: &Map<String, Value>) -> TemplateResult<String> {
        self.body.render(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("context must be an object"),
        }
    }

    fn render(source: &str, value: Value) -> String {
        Renderer::compile("test", source, Escape::Html)
            .unwrap()
            .render(&context(value))
            .unwrap()
    }

    #[test]
    fn test_render_simple() {
        assert_eq!(render("Hello, {{name}}!", json!({"name": "World"})), "Hello, World!");
    }

    #[test]
    fn test_render_multiple() {
        let result = render(
            "Your order {{order_id}} is being delivered by {{carrier}}",
            json!({"order_id": "ORD-123", "carrier": "FedEx"}),
        );
        assert_eq!(result, "Your order ORD-123 is being delivered by FedEx");
    }

    #[test]
    fn test_missing_field_renders_empty() {
        assert_eq!(render("<p>{{name}}</p>", json!({})), "<p></p>");
        assert_eq!(render("<p>{{user.name}}</p>", json!({"user": "plain"})), "<p></p>");
    }

    #[test]
    fn test_text_without_placeholders_is_verbatim() {
        let body = "<h1>Static</h1><p>No fields at all { single braces }</p>";
        assert_eq!(render(body, json!({"name": "ignored"})), body);
    }

    #[test]
    fn test_html_escaping() {
        let data = json!({"content": "<script>alert('xss')</script>"});

        let escaped = render("<p>{{content}}</p>", data.clone());
        assert!(escaped.contains("&lt;script&gt;"));
        assert!(!escaped.contains("<script>"));

        let raw = render("<p>{{{content}}}</p>", data);
        assert_eq!(raw, "<p><script>alert('xss')</script></p>");
    }

    #[test]
    fn test_unescaped_renderer_writes_values_verbatim() {
        let renderer = Renderer::compile("subject", "Tom & Jerry {{tag}}", Escape::None).unwrap();
        let result = renderer.render(&context(json!({"tag": "<new>"}))).unwrap();
        assert_eq!(result, "Tom & Jerry <new>");
    }

    #[test]
    fn test_conditional_rendering() {
        let source = "{{#if vip}}VIP{{else}}regular{{/if}}";
        assert_eq!(render(source, json!({"vip": true})), "VIP");
        assert_eq!(render(source, json!({"vip": false})), "regular");
        assert_eq!(render(source, json!({})), "regular");
    }

    #[test]
    fn test_loop_rendering() {
        let result = render(
            "{{#each items}}<li>{{this}}</li>{{/each}}",
            json!({"items": ["tea", "coffee"]}),
        );
        assert_eq!(result, "<li>tea</li><li>coffee</li>");
    }

    #[test]
    fn test_whitespace_and_nested_paths() {
        let result = render(
            "{{ user.name }} bought {{items.[1]}}",
            json!({"user": {"name": "Alice"}, "items": ["tea", "coffee"]}),
        );
        assert_eq!(result, "Alice bought coffee");
    }

    #[test]
    fn test_number_bool_null_values() {
        let result = render(
            "{{count}} items, paid: {{paid}}, note: [{{note}}]",
            json!({"count": 42, "paid": true, "note": null}),
        );
        assert_eq!(result, "42 items, paid: true, note: []");
    }

    #[test]
    fn test_unclosed_block_is_a_syntax_error() {
        let result = Renderer::compile("broken", "{{#if vip}}VIP", Escape::Html);
        assert!(matches!(
            result,
            Err(TemplateError::Syntax { ref key, .. }) if key == "broken"
        ));
    }

    #[test]
    fn test_render_is_repeatable() {
        let renderer = Renderer::compile("test", "{{a}}-{{b}}", Escape::Html).unwrap();
        let ctx = context(json!({"a": "x"}));
        assert_eq!(renderer.render(&ctx).unwrap(), renderer.render(&ctx).unwrap());
        assert_eq!(renderer.render(&ctx).unwrap(), "x-");
    }

    #[test]
    fn test_compiled_template_escapes_body_only() {
        let compiled = CompiledTemplate::compile(
            "order",
            &TemplateContent::new("Order {{id}} from {{shop}}", "<p>Order {{id}} from {{shop}}</p>"),
        )
        .unwrap();
        let ctx = context(json!({"id": 7, "shop": "A&B"}));

        assert_eq!(compiled.render_subject(&ctx).unwrap(), "Order 7 from A&B");
        assert_eq!(compiled.render_body(&ctx).unwrap(), "<p>Order 7 from A&amp;B</p>");
    }
}
