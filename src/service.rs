//! Task orchestration.
//!
//! `LlmService` wires the registries, the context retriever, and the
//! configured provider together. A task names a skill; the service
//! resolves the skill's prompt and tools, renders the prompt with
//! bounded retrieved context, issues exactly one generation request,
//! and reports which context documents made it into the prompt.
//!
//! Missing skill or prompt fails before any network traffic. Dangling
//! tool names degrade to a smaller toolset. Provider failures are
//! logged and propagated untouched so callers keep the full error.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, warn};

use crate::context::{ContextRetriever, ContextStore, RetrievalRequest};
use crate::error::TaskError;
use crate::llm::{LlmMessage, LlmRequest, LlmResponse, Provider};
use crate::registry::{PromptRegistry, SkillRegistry, ToolRegistry};

/// Scope used when a task asks for context without naming one.
pub const DEFAULT_CONTEXT_SCOPE: &str = "global";
/// Input key whose value becomes the user message.
pub const USER_MESSAGE_KEY: &str = "userMessage";
/// Render param that receives the bulleted context excerpts.
const CONTEXT_PARAM: &str = "context";
/// Fixed cap on context documents injected per task.
const CONTEXT_MAX_RESULTS: usize = 5;
/// Fixed whitespace-token budget for injected context per task.
const CONTEXT_TOKEN_BUDGET: usize = 600;

/// One task invocation.
#[derive(Debug, Clone, Default)]
pub struct TaskRequest {
    pub skill_name: String,
    /// Render params for the skill's prompt. `userMessage` additionally
    /// becomes the user message of the generation request.
    pub input: HashMap<String, String>,
    /// When set, context is retrieved and injected into the prompt.
    pub context_query: Option<String>,
    pub context_scope: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl TaskRequest {
    /// Request for `skill_name` with a single `userMessage` input.
    pub fn with_user_message(skill_name: impl Into<String>, message: impl Into<String>) -> Self {
        let mut input = HashMap::new();
        input.insert(USER_MESSAGE_KEY.to_string(), message.into());
        Self {
            skill_name: skill_name.into(),
            input,
            ..Default::default()
        }
    }
}

/// Result of a task: the provider response plus the ids of the context
/// documents whose excerpts were injected into the prompt.
#[derive(Debug)]
pub struct TaskOutcome {
    pub response: LlmResponse,
    pub context_used: Vec<String>,
}

/// The task pipeline. Registries are populated before construction and
/// never mutated afterwards, so the service shares freely across tasks.
pub struct LlmService {
    prompts: PromptRegistry,
    skills: SkillRegistry,
    tools: ToolRegistry,
    retriever: ContextRetriever,
    provider: Arc<dyn Provider>,
}

impl LlmService {
    pub fn new(
        prompts: PromptRegistry,
        skills: SkillRegistry,
        tools: ToolRegistry,
        store: Arc<dyn ContextStore>,
        provider: Arc<dyn Provider>,
    ) -> Self {
        Self {
            prompts,
            skills,
            tools,
            retriever: ContextRetriever::new(store),
            provider,
        }
    }

    /// The tool registry, for callers that execute tools themselves.
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Description of the configured provider, for status output.
    pub fn provider_description(&self) -> String {
        self.provider.description()
    }

    /// Runs one task end to end.
    pub async fn run_task(&self, request: &TaskRequest) -> Result<TaskOutcome, TaskError> {
        // Resolve the skill, then its prompt. Both are configuration
        // errors and fail before any I/O.
        let skill = self
            .skills
            .get(&request.skill_name)
            .ok_or_else(|| TaskError::UnknownSkill(request.skill_name.clone()))?;
        let prompt = self.prompts.get(&skill.prompt_id).ok_or_else(|| {
            TaskError::UnknownPrompt {
                skill: skill.name.clone(),
                prompt_id: skill.prompt_id.clone(),
            }
        })?;

        // Resolve tool references. Dangling names shrink the toolset
        // instead of failing the task.
        let mut tool_defs = Vec::new();
        for name in &skill.tool_names {
            match self.tools.get(name) {
                Some(tool) => tool_defs.push(tool.definition()),
                None => warn!(
                    "Skill '{}' references unregistered tool '{}'; skipping",
                    skill.name, name
                ),
            }
        }

        // Optional context retrieval. Selected excerpts are merged into
        // the render params as bullet lines under the `context` key.
        let mut params = request.input.clone();
        let mut context_used = Vec::new();
        if let Some(query) = &request.context_query {
            let scope = request
                .context_scope
                .as_deref()
                .unwrap_or(DEFAULT_CONTEXT_SCOPE);
            let hits = self
                .retriever
                .retrieve(&RetrievalRequest {
                    scope: scope.to_string(),
                    query: query.clone(),
                    max_tokens: CONTEXT_TOKEN_BUDGET,
                    max_results: CONTEXT_MAX_RESULTS,
                })
                .await;
            if !hits.is_empty() {
                let bullets: Vec<String> =
                    hits.iter().map(|h| format!("- {}", h.excerpt)).collect();
                params.insert(CONTEXT_PARAM.to_string(), bullets.join("\n"));
                context_used = hits.iter().map(|h| h.document.id.clone()).collect();
            }
            debug!(
                "Task '{}': {} context documents from scope '{}'",
                skill.name,
                context_used.len(),
                scope
            );
        }

        let system_prompt = prompt.render(&params);
        let user_message = request
            .input
            .get(USER_MESSAGE_KEY)
            .cloned()
            .unwrap_or_default();

        let llm_request = LlmRequest {
            messages: vec![
                LlmMessage {
                    role: "system".to_string(),
                    content: system_prompt,
                },
                LlmMessage {
                    role: "user".to_string(),
                    content: user_message,
                },
            ],
            tools: tool_defs,
            response_schema: skill.response_schema.clone(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        info!(
            "Running task '{}' ({} tools, {} context docs)",
            skill.name,
            llm_request.tools.len(),
            context_used.len()
        );
        let started = Instant::now();

        let response = match self.provider.generate(&llm_request).await {
            Ok(response) => response,
            Err(e) => {
                error!(
                    "Task '{}' failed after {}ms: {e:#}",
                    skill.name,
                    started.elapsed().as_millis()
                );
                return Err(TaskError::Provider(e));
            }
        };

        match &response.usage {
            Some(usage) => info!(
                "Task '{}' completed in {}ms ({} in / {} out tokens)",
                skill.name,
                started.elapsed().as_millis(),
                usage.input_tokens,
                usage.output_tokens
            ),
            None => info!(
                "Task '{}' completed in {}ms (usage unreported)",
                skill.name,
                started.elapsed().as_millis()
            ),
        }

        Ok(TaskOutcome {
            response,
            context_used,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ContextDocument, MemoryContextStore};
    use crate::llm::{LlmUsage, ToolDefinition};
    use crate::registry::{PromptTemplate, Skill, Tool};
    use anyhow::Result;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Provider that returns a fixed response and records every request
    /// it sees.
    struct ScriptedProvider {
        reply: String,
        seen: Mutex<Vec<LlmRequest>>,
    }

    impl ScriptedProvider {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn last_request(&self) -> LlmRequest {
            self.seen.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl Provider for ScriptedProvider {
        async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse> {
            self.seen.lock().unwrap().push(request.clone());
            Ok(LlmResponse {
                message: LlmMessage {
                    role: "assistant".to_string(),
                    content: self.reply.clone(),
                },
                usage: Some(LlmUsage {
                    input_tokens: 10,
                    output_tokens: 5,
                }),
            })
        }

        fn description(&self) -> String {
            "scripted (test)".to_string()
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl Provider for FailingProvider {
        async fn generate(&self, _request: &LlmRequest) -> Result<LlmResponse> {
            anyhow::bail!("simulated outage")
        }

        fn description(&self) -> String {
            "failing (test)".to_string()
        }
    }

    struct PingTool;

    #[async_trait]
    impl Tool for PingTool {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition {
                name: "ping".to_string(),
                description: "Replies with pong".to_string(),
                input_schema: json!({"type": "object"}),
            }
        }

        async fn execute(&self, _input: serde_json::Value) -> Result<String> {
            Ok("pong".to_string())
        }
    }

    fn test_skill(tool_names: Vec<String>, schema: Option<serde_json::Value>) -> Skill {
        Skill {
            name: "note_taker".to_string(),
            description: "test skill".to_string(),
            prompt_id: "note_prompt".to_string(),
            tool_names,
            response_schema: schema,
        }
    }

    fn service_with(
        provider: Arc<dyn Provider>,
        skill: Skill,
        store: Arc<MemoryContextStore>,
    ) -> LlmService {
        let mut prompts = PromptRegistry::new();
        prompts.register(PromptTemplate::new(
            "note_prompt",
            "test prompt",
            "Instructions for {audience}.\nContext:\n{context}\nEnd.",
        ));
        let mut skills = SkillRegistry::new();
        skills.register(skill);
        let mut tools = ToolRegistry::new();
        tools.register(Box::new(PingTool));
        LlmService::new(prompts, skills, tools, store, provider)
    }

    fn simple_request() -> TaskRequest {
        TaskRequest::with_user_message("note_taker", "hello there")
    }

    // ── Resolution failures ──────────────────────────────

    #[tokio::test]
    async fn test_unknown_skill_fails_fast() {
        let provider = ScriptedProvider::new("ok");
        let service = service_with(
            provider.clone(),
            test_skill(vec![], None),
            Arc::new(MemoryContextStore::new()),
        );

        let err = service
            .run_task(&TaskRequest::with_user_message("missing_skill", "hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::UnknownSkill(name) if name == "missing_skill"));
        // No provider call happened
        assert!(provider.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_prompt_fails_fast() {
        let provider = ScriptedProvider::new("ok");
        let mut skills = SkillRegistry::new();
        skills.register(Skill {
            name: "broken".to_string(),
            description: String::new(),
            prompt_id: "nowhere".to_string(),
            tool_names: vec![],
            response_schema: None,
        });
        let service = LlmService::new(
            PromptRegistry::new(),
            skills,
            ToolRegistry::new(),
            Arc::new(MemoryContextStore::new()),
            provider.clone(),
        );

        let err = service
            .run_task(&TaskRequest::with_user_message("broken", "hi"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TaskError::UnknownPrompt { ref skill, ref prompt_id }
                if skill == "broken" && prompt_id == "nowhere"
        ));
        assert!(provider.seen.lock().unwrap().is_empty());
    }

    // ── Tool resolution ──────────────────────────────────

    #[tokio::test]
    async fn test_unregistered_tools_are_skipped() {
        let provider = ScriptedProvider::new("ok");
        let service = service_with(
            provider.clone(),
            test_skill(
                vec!["ping".to_string(), "no_such_tool".to_string()],
                None,
            ),
            Arc::new(MemoryContextStore::new()),
        );

        service.run_task(&simple_request()).await.unwrap();

        let request = provider.last_request();
        let names: Vec<&str> = request.tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["ping"]);
    }

    // ── Message assembly ─────────────────────────────────

    #[tokio::test]
    async fn test_messages_are_system_then_user() {
        let provider = ScriptedProvider::new("ok");
        let service = service_with(
            provider.clone(),
            test_skill(vec![], None),
            Arc::new(MemoryContextStore::new()),
        );

        let mut request = simple_request();
        request
            .input
            .insert("audience".to_string(), "the family".to_string());
        service.run_task(&request).await.unwrap();

        let seen = provider.last_request();
        assert_eq!(seen.messages.len(), 2);
        assert_eq!(seen.messages[0].role, "system");
        assert!(seen.messages[0]
            .content
            .starts_with("Instructions for the family."));
        assert_eq!(seen.messages[1].role, "user");
        assert_eq!(seen.messages[1].content, "hello there");
    }

    #[tokio::test]
    async fn test_missing_user_message_becomes_empty() {
        let provider = ScriptedProvider::new("ok");
        let service = service_with(
            provider.clone(),
            test_skill(vec![], None),
            Arc::new(MemoryContextStore::new()),
        );

        let request = TaskRequest {
            skill_name: "note_taker".to_string(),
            ..Default::default()
        };
        service.run_task(&request).await.unwrap();

        let seen = provider.last_request();
        assert_eq!(seen.messages[1].role, "user");
        assert_eq!(seen.messages[1].content, "");
    }

    #[tokio::test]
    async fn test_schema_and_generation_params_pass_through() {
        let provider = ScriptedProvider::new("ok");
        let schema = json!({"type": "object"});
        let service = service_with(
            provider.clone(),
            test_skill(vec![], Some(schema.clone())),
            Arc::new(MemoryContextStore::new()),
        );

        let request = TaskRequest {
            temperature: Some(0.0),
            max_tokens: Some(128),
            ..simple_request()
        };
        service.run_task(&request).await.unwrap();

        let seen = provider.last_request();
        assert_eq!(seen.response_schema, Some(schema));
        assert_eq!(seen.temperature, Some(0.0));
        assert_eq!(seen.max_tokens, Some(128));
    }

    // ── Context retrieval ────────────────────────────────

    #[tokio::test]
    async fn test_context_is_injected_as_bullets() {
        let provider = ScriptedProvider::new("ok");
        let store = Arc::new(MemoryContextStore::new());
        store
            .add_documents(vec![ContextDocument::new("global", "dentist on friday")])
            .await;
        let service = service_with(provider.clone(), test_skill(vec![], None), store);

        let request = TaskRequest {
            context_query: Some("dentist".to_string()),
            ..simple_request()
        };
        let outcome = service.run_task(&request).await.unwrap();

        let seen = provider.last_request();
        assert!(seen.messages[0].content.contains("- dentist on friday"));
        assert_eq!(outcome.context_used.len(), 1);
    }

    #[tokio::test]
    async fn test_context_defaults_to_global_scope() {
        let provider = ScriptedProvider::new("ok");
        let store = Arc::new(MemoryContextStore::new());
        store
            .add_documents(vec![
                ContextDocument::new("global", "soccer practice tuesday"),
                ContextDocument::new("family-a", "soccer game saturday"),
            ])
            .await;
        let service = service_with(provider.clone(), test_skill(vec![], None), store);

        let request = TaskRequest {
            context_query: Some("soccer".to_string()),
            ..simple_request()
        };
        let outcome = service.run_task(&request).await.unwrap();

        let seen = provider.last_request();
        assert!(seen.messages[0].content.contains("practice tuesday"));
        assert!(!seen.messages[0].content.contains("game saturday"));
        assert_eq!(outcome.context_used.len(), 1);
    }

    #[tokio::test]
    async fn test_context_scope_isolation() {
        let provider = ScriptedProvider::new("ok");
        let store = Arc::new(MemoryContextStore::new());
        store
            .add_documents(vec![
                ContextDocument::new("family-a", "dentist friday"),
                ContextDocument::new("family-b", "dentist monday"),
            ])
            .await;
        let service = service_with(provider.clone(), test_skill(vec![], None), store);

        let request = TaskRequest {
            context_query: Some("dentist".to_string()),
            context_scope: Some("family-b".to_string()),
            ..simple_request()
        };
        service.run_task(&request).await.unwrap();

        let seen = provider.last_request();
        assert!(seen.messages[0].content.contains("dentist monday"));
        assert!(!seen.messages[0].content.contains("dentist friday"));
    }

    #[tokio::test]
    async fn test_no_query_means_no_retrieval() {
        let provider = ScriptedProvider::new("ok");
        let store = Arc::new(MemoryContextStore::new());
        store
            .add_documents(vec![ContextDocument::new("global", "hello there note")])
            .await;
        let service = service_with(provider.clone(), test_skill(vec![], None), store);

        let outcome = service.run_task(&simple_request()).await.unwrap();

        assert!(outcome.context_used.is_empty());
        let seen = provider.last_request();
        // The {context} placeholder rendered empty
        assert!(seen.messages[0].content.contains("Context:\n\nEnd."));
    }

    #[tokio::test]
    async fn test_no_hits_leaves_context_empty() {
        let provider = ScriptedProvider::new("ok");
        let service = service_with(
            provider.clone(),
            test_skill(vec![], None),
            Arc::new(MemoryContextStore::new()),
        );

        let request = TaskRequest {
            context_query: Some("anything".to_string()),
            ..simple_request()
        };
        let outcome = service.run_task(&request).await.unwrap();
        assert!(outcome.context_used.is_empty());
    }

    // ── Provider failures ────────────────────────────────

    #[tokio::test]
    async fn test_provider_error_propagates() {
        let service = service_with(
            Arc::new(FailingProvider),
            test_skill(vec![], None),
            Arc::new(MemoryContextStore::new()),
        );

        let err = service.run_task(&simple_request()).await.unwrap_err();
        match err {
            TaskError::Provider(e) => assert!(e.to_string().contains("simulated outage")),
            other => panic!("expected provider error, got {other:?}"),
        }
    }

    // ── Outcome ──────────────────────────────────────────

    #[tokio::test]
    async fn test_outcome_carries_response_and_usage() {
        let provider = ScriptedProvider::new("the reply");
        let service = service_with(
            provider,
            test_skill(vec![], None),
            Arc::new(MemoryContextStore::new()),
        );

        let outcome = service.run_task(&simple_request()).await.unwrap();
        assert_eq!(outcome.response.text(), "the reply");
        assert_eq!(outcome.response.message.role, "assistant");
        let usage = outcome.response.usage.unwrap();
        assert_eq!(usage.input_tokens, 10);
        assert_eq!(usage.output_tokens, 5);
    }
}
