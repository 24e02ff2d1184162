use anyhow::{Context, Result, bail};
use delve::cli::follow::{RunOutcome, follow};
use delve::cli::init::{self, InitConfig, InitResult};
use delve::cli::output::Output;
use delve::cli::{Cli, Commands};
use delve::llm::ProviderRegistry;
use delve::research::factory::build_orchestrator;
use delve::tools::ToolRegistry;
use delve::types::AppError;
use delve::utils::toml_config::{LoggingConfig, ResearchConfig};
use std::path::Path;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();
    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    match cli.command {
        Commands::Init {
            path,
            force,
            provider,
        } => match init::run(
            InitConfig {
                path,
                force,
                provider,
            },
            &output,
        ) {
            InitResult::Success | InitResult::AlreadyExists => Ok(()),
            InitResult::Error(e) => bail!("init failed: {}", e),
        },
        Commands::Check => {
            let config = load_config(&cli.config, None)?;
            init_logging(&config.logging, cli.verbose);
            check(&config, &output);
            Ok(())
        }
        Commands::Run {
            query,
            searches,
            json,
        } => {
            let config = load_config(&cli.config, searches)?;
            init_logging(&config.logging, cli.verbose);
            let outcome = run(&config, &query, json, &output).await?;
            if outcome != RunOutcome::Completed {
                std::process::exit(outcome.exit_code());
            }
            Ok(())
        }
    }
}

fn load_config(path: &Path, searches: Option<usize>) -> Result<ResearchConfig> {
    let mut config = ResearchConfig::load(path)
        .with_context(|| format!("failed to load {}", path.display()))?;
    if let Some(searches) = searches {
        config.research.searches = searches;
        config.validate().context("invalid --searches")?;
    }
    Ok(config)
}

/// Logs go to stderr so the report on stdout can be piped.
fn init_logging(logging: &LoggingConfig, verbose: bool) {
    let default_filter = if verbose {
        "debug".to_string()
    } else {
        logging.level.clone()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into());

    let registry = tracing_subscriber::registry().with(filter);
    if logging.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn check(config: &ResearchConfig, output: &Output) {
    output.success("configuration is valid");

    output.header("Pipeline");
    output.kv("searches", &config.research.searches.to_string());
    let concurrency = match config.research.concurrency_limit() {
        Some(limit) => limit.to_string(),
        None => "unbounded".to_string(),
    };
    output.kv("max concurrency", &concurrency);
    output.kv("delivery", &format!("{:?}", config.delivery));

    output.header("Collaborators");
    let providers = ProviderRegistry::from_config(config);
    output.table_header(&["Collaborator", "Model", "Provider"]);
    for (collaborator, model) in config.collaborators.entries() {
        let provider = match providers.provider_for_model(model) {
            Ok(provider) if provider.is_enabled() => provider.name().to_string(),
            Ok(provider) => format!("{} (feature disabled)", provider.name()),
            Err(e) => e.to_string(),
        };
        output.table_row(&[collaborator, model, &provider]);
    }

    output.header("Tools");
    for (id, description) in ToolRegistry::with_default_tools().describe() {
        output.kv(id.as_str(), &description);
    }
}

async fn run(config: &ResearchConfig, query: &str, json: bool, output: &Output) -> Result<RunOutcome> {
    let orchestrator = build_orchestrator(config)
        .await
        .context("failed to set up collaborators")?;

    let progress = orchestrator.run(query);
    let run_id = progress.correlation_id().to_string();
    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    let outcome = follow(progress, shutdown, |event| {
        if json {
            let line = serde_json::to_string(event)
                .map_err(|e| AppError::Internal(format!("cannot encode event: {}", e)))?;
            println!("{}", line);
        } else {
            output.progress(event);
        }
        Ok(())
    })
    .await
    .with_context(|| format!("research run {} failed", run_id))?;

    if outcome == RunOutcome::Cancelled {
        output.warning(&format!("run {} cancelled", run_id));
    }
    Ok(outcome)
}
