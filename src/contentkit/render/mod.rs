//! # Rendering
//!
//! A [`Renderer`] substitutes variables into a content part. The
//! [`Manager`](crate::manager::Manager) holds exactly one renderer and every
//! [`Item::render`](crate::item::Item::render) call goes through it.
//!
//! ## Implementations
//!
//! | Renderer | Syntax | Missing variable |
//! |----------|--------|------------------|
//! | [`PlaceholderRenderer`] | `{name}` | left verbatim |
//! | [`MustacheRenderer`] | `{{name}}`, `{{ person.name }}` | left verbatim |
//! | [`TemplateRenderer`] | full Jinja2 (minijinja) | engine decides |
//!
//! `PlaceholderRenderer` and `MustacheRenderer` never fail: text they do not understand is copied
//! through unchanged, so a typo in stored content shows up in the output
//! instead of breaking the page.

use crate::error::Result;
use crate::model::RenderData;
use serde_json::Value;

mod placeholder;
mod template;

pub use placeholder::{MustacheRenderer, PlaceholderRenderer};
pub use template::TemplateRenderer;

pub trait Renderer: Send + Sync {
    /// Substitutes `data` into `content`.
    fn render(&self, content: &str, data: &RenderData) -> Result<String>;
}

impl<R: Renderer + ?Sized> Renderer for Box<R> {
    fn render(&self, content: &str, data: &RenderData) -> Result<String> {
        (**self).render(content, data)
    }
}

/// Text inserted for a resolved variable. Scalars print plainly, `null` as
/// nothing, arrays and objects as compact JSON.
pub(crate) fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}
