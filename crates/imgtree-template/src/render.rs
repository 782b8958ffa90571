//! Template rendering via MiniJinja

use minijinja::{Environment, UndefinedBehavior};
use std::collections::BTreeMap;

/// Error during template rendering
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("template render error: {message}")]
    Render { message: String },
}

/// Renderer for Dockerfile templates.
///
/// Undefined behavior is strict: a key present in the template but absent
/// from the mapping is an error, never a silently rendered blank.
pub struct TemplateRenderer {
    env: Environment<'static>,
}

impl TemplateRenderer {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        Self { env }
    }

    /// Render a template against a key-to-tag mapping.
    pub fn render(
        &self,
        template: &str,
        mapping: &BTreeMap<String, String>,
    ) -> Result<String, RenderError> {
        self.env
            .render_str(template, mapping)
            .map_err(|e| RenderError::Render {
                message: e.to_string(),
            })
    }
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}
