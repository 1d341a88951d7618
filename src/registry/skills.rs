//! Skill registry.
//!
//! A skill binds a prompt template to the tools and response schema a
//! task should run with. Skills are declarative data, not code; the
//! service resolves their references when a task runs.

use serde_json::Value;

/// A named task recipe.
///
/// `prompt_id` and `tool_names` are references into the prompt and tool
/// registries. They are resolved lazily: a dangling prompt id fails the
/// task, dangling tool names are skipped.
#[derive(Debug, Clone)]
pub struct Skill {
    pub name: String,
    pub description: String,
    pub prompt_id: String,
    pub tool_names: Vec<String>,
    /// When set, schema-aware providers run in structured output mode.
    pub response_schema: Option<Value>,
}

/// Registry of skills, keyed by name.
#[derive(Debug, Default)]
pub struct SkillRegistry {
    skills: Vec<Skill>,
}

impl SkillRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a skill. A skill with the same name replaces the
    /// existing entry in place.
    pub fn register(&mut self, skill: Skill) {
        match self.skills.iter_mut().find(|s| s.name == skill.name) {
            Some(existing) => *existing = skill,
            None => self.skills.push(skill),
        }
    }

    /// Looks up a skill by name.
    pub fn get(&self, name: &str) -> Option<&Skill> {
        self.skills.iter().find(|s| s.name == name)
    }

    /// All skills in insertion order.
    pub fn list(&self) -> &[Skill] {
        &self.skills
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skill(name: &str, prompt_id: &str) -> Skill {
        Skill {
            name: name.to_string(),
            description: String::new(),
            prompt_id: prompt_id.to_string(),
            tool_names: Vec::new(),
            response_schema: None,
        }
    }

    #[test]
    fn test_register_and_get() {
        let mut registry = SkillRegistry::new();
        registry.register(skill("summarize", "summary_prompt"));
        assert_eq!(registry.get("summarize").unwrap().prompt_id, "summary_prompt");
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn test_registration_does_not_validate_references() {
        // A skill may reference prompts and tools that are never
        // registered; that only surfaces when a task runs.
        let mut registry = SkillRegistry::new();
        registry.register(Skill {
            tool_names: vec!["no_such_tool".to_string()],
            ..skill("dangling", "no_such_prompt")
        });
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_list_preserves_insertion_order() {
        let mut registry = SkillRegistry::new();
        registry.register(skill("b", "p"));
        registry.register(skill("a", "p"));
        let names: Vec<&str> = registry.list().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn test_reregister_replaces_in_place() {
        let mut registry = SkillRegistry::new();
        registry.register(skill("a", "v1"));
        registry.register(skill("b", "p"));
        registry.register(skill("a", "v2"));
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("a").unwrap().prompt_id, "v2");
        assert_eq!(registry.list()[0].name, "a");
    }
}
