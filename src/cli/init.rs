//! Init command implementation
//!
//! Scaffolds `research.toml`, `.env.example` and a `reports/` directory.

use super::output::Output;
use std::fs;
use std::path::{Path, PathBuf};

/// Result of the init operation
#[derive(Debug)]
pub enum InitResult {
    /// Initialization completed successfully
    Success,
    /// research.toml exists and --force was not given
    AlreadyExists,
    /// An error occurred during initialization
    Error(String),
}

/// Configuration for the init command
pub struct InitConfig {
    /// Directory to initialize
    pub path: PathBuf,
    /// Overwrite existing files
    pub force: bool,
    /// LLM provider to configure (ollama or openai)
    pub provider: String,
}

/// Run the init command
pub fn run(config: InitConfig, output: &Output) -> InitResult {
    output.banner();
    output.header("Initializing research project");

    let base_path = &config.path;
    let config_path = base_path.join("research.toml");
    if config_path.exists() && !config.force {
        output.warning("research.toml already exists!");
        output.hint("Use --force to overwrite existing files");
        return InitResult::AlreadyExists;
    }

    let reports = base_path.join("reports");
    if let Err(e) = fs::create_dir_all(&reports) {
        output.error(&format!("Failed to create reports/: {}", e));
        return InitResult::Error(e.to_string());
    }
    output.created("directory", "reports");

    let files = [
        ("config", "research.toml", generate_research_toml(&config.provider)),
        ("env", ".env.example", generate_env_example()),
    ];
    for (kind, name, content) in &files {
        let path = base_path.join(name);
        match write_file(&path, content, config.force) {
            Ok(true) => output.created(kind, name),
            Ok(false) => output.skipped(name, "already exists"),
            Err(e) => {
                output.error(&format!("Failed to create {}: {}", name, e));
                return InitResult::Error(e.to_string());
            }
        }
    }

    output.complete("Project initialized");
    output.header("Next Steps");
    if config.provider == "openai" {
        output.info("Put your OPENAI_API_KEY in .env:");
        output.command("cp .env.example .env");
    } else {
        output.info("Start Ollama and pull the model:");
        output.command("ollama serve");
        output.command("ollama pull llama3.2");
    }
    output.info("Then run a query:");
    output.command("delve run \"impact of interest rates on tech stocks\"");

    InitResult::Success
}

/// Write `content` unless the file exists and `force` is off. Returns whether it wrote.
fn write_file(path: &Path, content: &str, force: bool) -> std::io::Result<bool> {
    if path.exists() && !force {
        return Ok(false);
    }
    fs::write(path, content)?;
    Ok(true)
}

fn generate_research_toml(provider: &str) -> String {
    let (provider_section, model_provider, model_name) = if provider == "openai" {
        (
            r#"[providers.openai]
type = "openai"
api_key_env = "OPENAI_API_KEY"
api_base = "https://api.openai.com/v1""#,
            "openai",
            "gpt-4o-mini",
        )
    } else {
        (
            r#"[providers.local]
type = "ollama"
base_url = "http://localhost:11434""#,
            "local",
            "llama3.2",
        )
    };

    format!(
        r#"# Delve configuration

[research]
# Searches planned per query
searches = 5
# Searches running at once (0 = all at once)
max_concurrency = 5
# Per-stage timeouts in seconds (0 = no timeout)
plan_timeout_secs = 120
search_timeout_secs = 60
write_timeout_secs = 300
deliver_timeout_secs = 60
# Whole-run deadline in seconds
# run_timeout_secs = 900
# trace_url_base = "https://traces.example.com/trace/"

[retry]
# Retries for rate limits, timeouts and 5xx responses (0 = never retry)
max_retries = 0

[logging]
level = "info"
json = false

{provider_section}

[models.default]
provider = "{model_provider}"
model = "{model_name}"
temperature = 0.7
max_tokens = 4096

[collaborators]
planner = "default"
searcher = "default"
writer = "default"

[search]
num_results = 5
fetch_pages = 0

[delivery]
type = "file"
dir = "reports"

# E-mail delivery instead:
# [delivery]
# type = "sendgrid"
# api_key_env = "SENDGRID_API_KEY"
# from = "research@example.com"
# to = "you@example.com"
"#,
        provider_section = provider_section,
        model_provider = model_provider,
        model_name = model_name,
    )
}

fn generate_env_example() -> String {
    r#"# Delve environment variables
# Copy this file to .env and fill in the values.

# Logging filter, overrides [logging] level
RUST_LOG=info,delve=debug

# OpenAI API key (if using the openai provider)
# OPENAI_API_KEY=sk-...

# SendGrid API key (if using e-mail delivery)
# SENDGRID_API_KEY=SG....
"#
    .to_string()
}
