use super::Renderer;
use crate::error::Result;
use crate::model::RenderData;
use minijinja::{Environment, UndefinedBehavior};

/// Renders content parts as minijinja (Jinja2) templates.
///
/// Content is compiled on every call since stored content can change between
/// calls. Filters and globals registered on the environment are available to
/// all content.
pub struct TemplateRenderer {
    env: Environment<'static>,
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRenderer {
    pub fn new() -> Self {
        Self::with_environment(Environment::new())
    }

    pub fn with_environment(env: Environment<'static>) -> Self {
        Self { env }
    }

    /// Fail on undefined variables instead of printing nothing.
    pub fn strict(mut self) -> Self {
        self.env.set_undefined_behavior(UndefinedBehavior::Strict);
        self
    }

    pub fn environment_mut(&mut self) -> &mut Environment<'static> {
        &mut self.env
    }
}

impl Renderer for TemplateRenderer {
    fn render(&self, content: &str, data: &RenderData) -> Result<String> {
        Ok(self.env.render_str(content, data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ContentError;
    use serde_json::json;

    fn data(value: serde_json::Value) -> RenderData {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_simple_variable() {
        let out = TemplateRenderer::new()
            .render("Some {{name}} content", &data(json!({"name": "foo"})))
            .unwrap();
        assert_eq!(out, "Some foo content");
    }

    #[test]
    fn test_control_flow() {
        let out = TemplateRenderer::new()
            .render(
                "{% for p in people %}{{ p.name }}{% if not loop.last %}, {% endif %}{% endfor %}",
                &data(json!({"people": [{"name": "Ann"}, {"name": "Bob"}]})),
            )
            .unwrap();
        assert_eq!(out, "Ann, Bob");
    }

    #[test]
    fn test_lenient_undefined_is_empty() {
        let out = TemplateRenderer::new()
            .render("[{{ missing }}]", &RenderData::new())
            .unwrap();
        assert_eq!(out, "[]");
    }

    #[test]
    fn test_strict_undefined_errors() {
        let err = TemplateRenderer::new()
            .strict()
            .render("{{ missing }}", &RenderData::new())
            .unwrap_err();
        assert!(matches!(err, ContentError::Render(_)));
    }

    #[test]
    fn test_custom_filter() {
        let mut renderer = TemplateRenderer::new();
        renderer
            .environment_mut()
            .add_filter("shout", |s: String| s.to_uppercase());
        let out = renderer
            .render("{{ name | shout }}", &data(json!({"name": "hey"})))
            .unwrap();
        assert_eq!(out, "HEY");
    }
}
