//! Prompt template registry.
//!
//! A prompt template is an immutable record rendered by `{param}`
//! substitution. Rendering is pure: no clock, no randomness, no I/O.
//! The same template and params always produce the same string.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

/// Matches `{param}` placeholders. Parameter names are word characters
/// only, so JSON examples in template text (`{"todos": []}`) pass
/// through untouched.
static PLACEHOLDER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{(\w+)\}").unwrap());

/// An immutable prompt template.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    pub id: String,
    pub description: String,
    pub template: String,
}

impl PromptTemplate {
    pub fn new(
        id: impl Into<String>,
        description: impl Into<String>,
        template: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            template: template.into(),
        }
    }

    /// Renders the template with `{param}` substitution.
    ///
    /// Placeholders with no matching param render as the empty string.
    /// Missing params never fail the render.
    pub fn render(&self, params: &HashMap<String, String>) -> String {
        PLACEHOLDER_RE
            .replace_all(&self.template, |caps: &regex::Captures| {
                params.get(&caps[1]).cloned().unwrap_or_default()
            })
            .into_owned()
    }
}

/// Registry of prompt templates, keyed by id.
#[derive(Debug, Default)]
pub struct PromptRegistry {
    prompts: Vec<PromptTemplate>,
}

impl PromptRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a template. A template with the same id replaces the
    /// existing entry in place.
    pub fn register(&mut self, template: PromptTemplate) {
        match self.prompts.iter_mut().find(|p| p.id == template.id) {
            Some(existing) => *existing = template,
            None => self.prompts.push(template),
        }
    }

    /// Looks up a template by id.
    pub fn get(&self, id: &str) -> Option<&PromptTemplate> {
        self.prompts.iter().find(|p| p.id == id)
    }

    /// All templates in insertion order.
    pub fn list(&self) -> &[PromptTemplate] {
        &self.prompts
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    // ── Rendering ────────────────────────────────────────

    #[test]
    fn test_render_substitutes_params() {
        let template = PromptTemplate::new("t", "test", "Hello {name}, today is {day}.");
        let rendered = template.render(&params(&[("name", "Ada"), ("day", "Monday")]));
        assert_eq!(rendered, "Hello Ada, today is Monday.");
    }

    #[test]
    fn test_render_missing_param_becomes_empty() {
        let template = PromptTemplate::new("t", "test", "Context:\n{context}\nDone.");
        let rendered = template.render(&HashMap::new());
        assert_eq!(rendered, "Context:\n\nDone.");
    }

    #[test]
    fn test_render_ignores_extra_params() {
        let template = PromptTemplate::new("t", "test", "Hi {name}");
        let rendered = template.render(&params(&[("name", "Ada"), ("unused", "x")]));
        assert_eq!(rendered, "Hi Ada");
    }

    #[test]
    fn test_render_repeated_placeholder() {
        let template = PromptTemplate::new("t", "test", "{word} and {word} again");
        let rendered = template.render(&params(&[("word", "once")]));
        assert_eq!(rendered, "once and once again");
    }

    #[test]
    fn test_render_leaves_json_braces_alone() {
        // Braces around non-word characters are not placeholders.
        let template = PromptTemplate::new(
            "t",
            "test",
            r#"Reply with {"todos": [], "meals": []} for {name}"#,
        );
        let rendered = template.render(&params(&[("name", "Ada")]));
        assert_eq!(rendered, r#"Reply with {"todos": [], "meals": []} for Ada"#);
    }

    #[test]
    fn test_render_is_deterministic() {
        let template = PromptTemplate::new("t", "test", "A: {a}, B: {b}");
        let p = params(&[("a", "1")]);
        assert_eq!(template.render(&p), template.render(&p));
    }

    // ── Registry ─────────────────────────────────────────

    #[test]
    fn test_register_and_get() {
        let mut registry = PromptRegistry::new();
        registry.register(PromptTemplate::new("greet", "greeting", "Hi"));
        assert_eq!(registry.get("greet").unwrap().template, "Hi");
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn test_list_preserves_insertion_order() {
        let mut registry = PromptRegistry::new();
        registry.register(PromptTemplate::new("c", "", ""));
        registry.register(PromptTemplate::new("a", "", ""));
        registry.register(PromptTemplate::new("b", "", ""));
        let ids: Vec<&str> = registry.list().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_reregister_replaces_in_place() {
        let mut registry = PromptRegistry::new();
        registry.register(PromptTemplate::new("a", "", "v1"));
        registry.register(PromptTemplate::new("b", "", ""));
        registry.register(PromptTemplate::new("a", "", "v2"));
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("a").unwrap().template, "v2");
        // Replacement keeps the original position
        assert_eq!(registry.list()[0].id, "a");
    }

    #[test]
    fn test_empty_registry() {
        let registry = PromptRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
        assert!(registry.list().is_empty());
    }
}
