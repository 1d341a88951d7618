use std::io::Read;
use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use hearth_core::actions::{parse_actionable_items, ExtractionInput};
use hearth_core::builtin;
use hearth_core::config::Config;
use hearth_core::context::MemoryContextStore;
use hearth_core::llm::{GeminiProvider, NullProvider, Provider};
use hearth_core::registry::{PromptRegistry, SkillRegistry, ToolRegistry};
use hearth_core::service::LlmService;
use hearth_core::worker::{LogSender, SummaryWorker};

fn print_help() {
    println!(
        "\
hearth-core v{}

Task pipeline of the Hearth family assistant: extracts todos, meals,
and events from family messages and writes periodic household summaries.

USAGE:
    hearth-core [OPTIONS] <COMMAND> [TEXT...]

COMMANDS:
    parse [TEXT...]    Extract actionable items from TEXT (or stdin when
                       no TEXT is given) and print them as JSON
    worker             Run the periodic summary worker until interrupted

OPTIONS:
    -h, --help       Print this help message and exit
    -V, --version    Print version and exit

ENVIRONMENT VARIABLES:
    Variables are referenced in the config file via ${{VAR_NAME}} syntax.

    HEARTH_CONFIG     Path to the TOML configuration file
                      [default: config/assistant.toml]
    RUST_LOG          Log level filter for tracing
                      (e.g. debug, hearth_core=debug,warn)
    GEMINI_API_KEY    API key for the Gemini provider
                      (from https://aistudio.google.com/)

EXAMPLES:
    hearth-core parse \"Soccer practice Tuesday 5pm, spaghetti for dinner\"
    cat message.txt | hearth-core parse
    hearth-core worker
    RUST_LOG=debug hearth-core parse \"Dentist Friday 3pm\"",
        env!("CARGO_PKG_VERSION"),
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    // Handle --help / --version before anything else
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--version" | "-V" => {
                println!("hearth-core v{}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            _ => {}
        }
    }

    // Initialize logging (RUST_LOG=debug for debug mode)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("hearth_core=info")),
        )
        .init();

    println!(
        r#"
   _   _  _____    _    ____  _____  _   _
  | | | || ____|  / \  |  _ \|_   _|| | | |
  | |_| ||  _|   / _ \ | |_) | | |  | |_| |
  |  _  || |___ / ___ \|  _ <  | |  |  _  |
  |_| |_||_____/_/   \_\_| \_\ |_|  |_| |_|
                                    v{}
"#,
        env!("CARGO_PKG_VERSION")
    );

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        print_help();
        return Ok(());
    }
    let command = args.remove(0);

    // Load configuration
    let config_path = std::env::var("HEARTH_CONFIG")
        .unwrap_or_else(|_| "config/assistant.toml".to_string());
    info!("Loading configuration from {config_path}");
    let config = Config::load(&config_path)?;

    info!("Assistant: {}", config.assistant.name);
    info!("Timezone: {}", config.assistant.timezone);

    let provider = build_provider(&config)?;

    let mut prompts = PromptRegistry::new();
    let mut skills = SkillRegistry::new();
    let mut tools = ToolRegistry::new();
    builtin::register_defaults(&mut prompts, &mut skills, &mut tools);
    info!(
        "Registered {} prompts, {} skills, {} tools",
        prompts.len(),
        skills.len(),
        tools.len()
    );

    let store = Arc::new(MemoryContextStore::new());
    let service = Arc::new(LlmService::new(prompts, skills, tools, store, provider));
    info!("LLM: {}", service.provider_description());

    match command.as_str() {
        "parse" => run_parse(&config, &service, args).await,
        "worker" => run_worker(&config, service).await,
        other => anyhow::bail!("Unknown command '{other}' (expected 'parse' or 'worker')"),
    }
}

fn build_provider(config: &Config) -> Result<Arc<dyn Provider>> {
    match config.llm.provider.as_str() {
        "gemini" => Ok(Arc::new(GeminiProvider::new(config.llm.clone()))),
        "null" => Ok(Arc::new(NullProvider)),
        other => anyhow::bail!("Unsupported LLM provider '{other}' (supported: gemini, null)"),
    }
}

/// One-shot extraction: message text in, typed records out as JSON.
async fn run_parse(config: &Config, service: &LlmService, args: Vec<String>) -> Result<()> {
    let text = if args.is_empty() {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        args.join(" ")
    };

    let input = ExtractionInput {
        text: text.trim().to_string(),
        files: Vec::new(),
        timezone: Some(config.assistant.timezone.clone()),
        locale: Some(config.assistant.locale.clone()),
        language: Some(config.assistant.language.clone()),
    };

    let actions = parse_actionable_items(service, &input).await?;
    info!(
        "Extracted {} todos, {} meals, {} events",
        actions.todos.len(),
        actions.meals.len(),
        actions.events.len()
    );
    println!("{}", serde_json::to_string_pretty(&actions)?);
    Ok(())
}

/// Periodic summary loop, until ctrl-c.
async fn run_worker(config: &Config, service: Arc<LlmService>) -> Result<()> {
    let worker = SummaryWorker::new(service, Arc::new(LogSender), config.summary.clone());

    tokio::select! {
        _ = worker.run() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received, exiting");
        }
    }
    Ok(())
}
