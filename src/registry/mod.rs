//! Prompt, skill, and tool registries.
//!
//! Plain name-keyed registries, populated once at service construction
//! and read-only afterwards. Cross-references between them (a skill's
//! prompt id, a skill's tool names) are not validated at registration
//! time; resolution happens per task and fails or degrades there.
//!
//! All three preserve insertion order. Re-registering an existing name
//! replaces the entry in place without moving it.

pub mod prompts;
pub mod skills;
pub mod tools;

pub use prompts::{PromptRegistry, PromptTemplate};
pub use skills::{Skill, SkillRegistry};
pub use tools::{Tool, ToolRegistry, ToolResult};
