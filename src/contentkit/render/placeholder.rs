use super::{display_value, Renderer};
use crate::error::Result;
use crate::model::RenderData;
use serde_json::Value;

/// Replaces `{name}` with `data["name"]`.
///
/// Substitution is a single left-to-right pass; inserted values are not
/// scanned again.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderRenderer;

impl Renderer for PlaceholderRenderer {
    fn render(&self, content: &str, data: &RenderData) -> Result<String> {
        let mut out = String::with_capacity(content.len());
        let mut rest = content;

        while let Some(start) = rest.find('{') {
            out.push_str(&rest[..start]);
            let after = &rest[start + 1..];
            let Some(end) = after.find('}') else {
                out.push_str(&rest[start..]);
                return Ok(out);
            };

            match data.get(&after[..end]) {
                Some(value) => {
                    out.push_str(&display_value(value));
                    rest = &after[end + 1..];
                }
                None => {
                    out.push('{');
                    rest = after;
                }
            }
        }

        out.push_str(rest);
        Ok(out)
    }
}

/// Replaces `{{name}}` and `{{ a.b.c }}` placeholders.
///
/// Dotted names walk nested objects; numeric segments index into arrays.
/// If any segment is missing the placeholder is kept as written.
#[derive(Debug, Clone, Copy, Default)]
pub struct MustacheRenderer;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

impl MustacheRenderer {
    fn lookup<'a>(data: &'a RenderData, path: &str) -> Option<&'a Value> {
        if path.is_empty() {
            return None;
        }
        let mut segments = path.split('.');
        let mut current = data.get(segments.next()?)?;
        for segment in segments {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }
}

impl Renderer for MustacheRenderer {
    fn render(&self, content: &str, data: &RenderData) -> Result<String> {
        let mut out = String::with_capacity(content.len());
        let mut rest = content;

        while let Some(start) = rest.find(OPEN) {
            out.push_str(&rest[..start]);
            let inner_start = start + OPEN.len();
            let Some(len) = rest[inner_start..].find(CLOSE) else {
                out.push_str(&rest[start..]);
                return Ok(out);
            };
            let token_end = inner_start + len + CLOSE.len();
            let name = rest[inner_start..inner_start + len].trim();

            match Self::lookup(data, name) {
                Some(value) => out.push_str(&display_value(value)),
                None => out.push_str(&rest[start..token_end]),
            }
            rest = &rest[token_end..];
        }

        out.push_str(rest);
        Ok(out)
    }
}
