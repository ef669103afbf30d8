use anyhow::{Context, Result};
use autoverifier_agent::{ClaimVerifier, NoEvidenceSource, TrustSummary, VerifierWorkflow};
use autoverifier_ai::LLMProviderFactory;
use autoverifier_core::{
    AgentState, AutoVerifierConfig, ConfigManager, EvidenceItem, Label, LoggingConfig,
    VerificationResult, LOCAL_CONFIG_FILE,
};
use clap::{Parser, Subcommand};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{
    filter::EnvFilter,
    layer::{Layered, SubscriberExt},
    reload, Layer, Registry,
};

mod demo;
mod input;

#[derive(Parser)]
#[command(
    name = "autoverifier",
    version,
    author,
    about = "AutoVerifier CLI - LLM-backed claim verification and evidence trust scoring",
    long_about = "AutoVerifier classifies claims as SUPPORTED, REFUTED or NOT_ENOUGH_EVIDENCE \
                  against supplied evidence, and scores how far each evidence item can be trusted."
)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    verbose: bool,

    #[arg(long, global = true, help = "Configuration file path")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Verify a single claim against evidence")]
    Verify {
        #[arg(short, long, help = "Claim to verify")]
        claim: String,

        #[arg(long, help = "JSON file containing an array of evidence items")]
        evidence_file: Option<PathBuf>,

        #[arg(
            short,
            long,
            help = "Inline evidence as \"Source::content\" (repeatable)"
        )]
        evidence: Vec<String>,

        #[arg(long, value_enum, default_value = "human", help = "Output format")]
        format: OutputFormat,
    },

    #[command(about = "Verify every request in a JSON file")]
    Batch {
        #[arg(help = "JSON file containing an array of verification requests")]
        file: PathBuf,

        #[arg(long, value_enum, default_value = "human", help = "Output format")]
        format: OutputFormat,
    },

    #[command(
        about = "Score evidence trust and suggest follow-up queries",
        long_about = "Runs the verifier/refinement workflow over an evidence file. The configured \
                      LLM is used for claim analysis and query suggestions when available; \
                      keyword heuristics are used otherwise."
    )]
    Analyze {
        #[arg(help = "JSON file containing an array of evidence items")]
        file: PathBuf,

        #[arg(short, long, help = "Claim or question the evidence relates to")]
        query: String,

        #[arg(long, help = "Maximum verifier/refinement passes")]
        max_iterations: Option<u32>,

        #[arg(long, value_enum, default_value = "human", help = "Output format")]
        format: OutputFormat,
    },

    #[command(about = "Run the canonical verification cases against the configured LLM")]
    Demo,

    #[command(about = "Check configuration, API keys and provider connectivity")]
    Check,

    #[command(about = "Manage configuration")]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    #[command(about = "Write a default configuration file")]
    Init {
        #[arg(long, help = "Target path (defaults to ~/.autoverifier/config.toml)")]
        path: Option<PathBuf>,

        #[arg(short, long, help = "Overwrite an existing file")]
        force: bool,
    },

    #[command(about = "Show current configuration")]
    Show {
        #[arg(long, help = "Show as JSON")]
        json: bool,
    },
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Human,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    // Environment-only settings until the config file has been read, so
    // events emitted while loading it are not dropped
    let startup_logging =
        ConfigManager::apply_overrides_from(AutoVerifierConfig::default(), |key| {
            std::env::var(key).ok()
        })
        .logging;
    let log_control = init_logging(&startup_logging, cli.verbose);

    // Writing a fresh file must not depend on the current one parsing
    if let Commands::Config {
        action: ConfigAction::Init { path, force },
    } = &cli.command
    {
        return handle_config_init(path.as_deref(), *force);
    }

    let config_mgr = ConfigManager::load_with_path(cli.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(control) = &log_control {
        control.apply(&config_mgr.config().logging, cli.verbose);
    }
    let config = config_mgr.config();

    match cli.command {
        Commands::Verify {
            claim,
            evidence_file,
            evidence,
            format,
        } => {
            handle_verify(config, &claim, evidence_file.as_deref(), &evidence, format).await?;
        }
        Commands::Batch { file, format } => {
            handle_batch(config, &file, format).await?;
        }
        Commands::Analyze {
            file,
            query,
            max_iterations,
            format,
        } => {
            handle_analyze(config, &file, &query, max_iterations, format).await?;
        }
        Commands::Demo => {
            handle_demo(config).await?;
        }
        Commands::Check => {
            handle_check(&config_mgr).await;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { json } => handle_config_show(&config_mgr, json)?,
            ConfigAction::Init { path, force } => handle_config_init(path.as_deref(), force)?,
        },
    }

    Ok(())
}

type BoxedFmtLayer = Box<dyn Layer<Registry> + Send + Sync>;
type FmtSubscriber = Layered<reload::Layer<BoxedFmtLayer, Registry>, Registry>;

/// Swaps the global filter and formatter once the configuration is loaded
struct LogControl {
    filter: reload::Handle<EnvFilter, FmtSubscriber>,
    format: reload::Handle<BoxedFmtLayer, Registry>,
}

impl LogControl {
    fn apply(&self, config: &LoggingConfig, verbose: bool) {
        if let Err(e) = self.format.reload(fmt_layer(&config.format)) {
            warn!("Failed to apply log format '{}': {}", config.format, e);
        }
        if let Err(e) = self.filter.reload(env_filter(config, verbose)) {
            warn!("Failed to apply log level '{}': {}", config.level, e);
        }
    }
}

/// Install the global subscriber. Returns `None` when one is already set.
fn init_logging(config: &LoggingConfig, verbose: bool) -> Option<LogControl> {
    let (format_layer, format) = reload::Layer::new(fmt_layer(&config.format));
    let (filter_layer, filter) = reload::Layer::new(env_filter(config, verbose));

    let subscriber = Registry::default().with(format_layer).with(filter_layer);
    tracing::subscriber::set_global_default(subscriber).ok()?;

    Some(LogControl { filter, format })
}

/// RUST_LOG wins over the configured level; --verbose raises it to debug
fn log_directive(level: &str, verbose: bool, rust_log: Option<&str>) -> String {
    match rust_log.map(str::trim).filter(|d| !d.is_empty()) {
        Some(directive) => directive.to_string(),
        None if verbose => "debug".to_string(),
        None => level.to_string(),
    }
}

fn env_filter(config: &LoggingConfig, verbose: bool) -> EnvFilter {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let directive = log_directive(&config.level, verbose, rust_log.as_deref());
    EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("info"))
}

fn fmt_layer(format: &str) -> BoxedFmtLayer {
    match format {
        "json" => tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed(),
        "compact" => tracing_subscriber::fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .boxed(),
        _ => tracing_subscriber::fmt::layer()
            .pretty()
            .with_writer(std::io::stderr)
            .boxed(),
    }
}

fn spinner(message: impl Into<String>) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ "));
    }
    pb.set_message(message.into());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn colored_label(label: Label) -> ColoredString {
    match label {
        Label::Supported => label.as_str().green().bold(),
        Label::Refuted => label.as_str().red().bold(),
        Label::NotEnoughEvidence => label.as_str().yellow().bold(),
    }
}

fn print_result(result: &VerificationResult) {
    println!("   Label: {}", colored_label(result.label));
    println!("   Confidence: {:.2}", result.confidence);
    println!("   Explanation: {}", result.explanation);
}

fn preview(text: &str, max_chars: usize) -> String {
    let mut out: String = text.chars().take(max_chars).collect();
    if text.chars().count() > max_chars {
        out.push_str("...");
    }
    out
}

fn print_evidence(evidence: &[EvidenceItem]) {
    println!("Evidence Count: {}", evidence.len());
    for (i, item) in evidence.iter().enumerate() {
        println!("  Evidence {}: {} - {}", i + 1, item.source, preview(&item.content, 60));
    }
}

async fn handle_verify(
    config: &AutoVerifierConfig,
    claim: &str,
    evidence_file: Option<&Path>,
    inline_evidence: &[String],
    format: OutputFormat,
) -> Result<()> {
    let evidence = input::collect_evidence(evidence_file, inline_evidence)?;
    let verifier = ClaimVerifier::from_config(config)?;

    if format == OutputFormat::Json {
        let result = verifier.verify_claim(claim, &evidence).await;
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("{} {}", "Claim:".blue().bold(), claim);
    print_evidence(&evidence);

    let pb = spinner("Verifying claim...");
    let result = verifier.verify_claim(claim, &evidence).await;
    pb.finish_and_clear();

    println!();
    println!("{}", "VERIFICATION RESULT".green().bold());
    print_result(&result);
    Ok(())
}

async fn handle_batch(config: &AutoVerifierConfig, file: &Path, format: OutputFormat) -> Result<()> {
    let requests = input::load_batch_file(file)?;
    let verifier = ClaimVerifier::from_config(config)?;

    let claims: Vec<(String, Vec<EvidenceItem>)> = requests
        .iter()
        .map(|r| (r.claim.clone(), r.evidence.clone()))
        .collect();

    let pb = (format == OutputFormat::Human)
        .then(|| spinner(format!("Verifying {} claims...", claims.len())));
    let results = verifier.verify_claim_batch(&claims).await;
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    info!(count = results.len(), "Batch verification completed");

    match format {
        OutputFormat::Json => {
            let output: Vec<serde_json::Value> = claims
                .iter()
                .zip(&results)
                .map(|((claim, _), result)| serde_json::json!({ "claim": claim, "result": result }))
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Human => {
            println!("{}", "Batch verification completed!".green().bold());
            println!("   Results count: {}", results.len());
            for (i, ((claim, _), result)) in claims.iter().zip(&results).enumerate() {
                println!();
                println!("{} {}", format!("[{}]", i + 1).cyan().bold(), claim);
                print_result(result);
            }
        }
    }

    Ok(())
}

async fn handle_analyze(
    config: &AutoVerifierConfig,
    file: &Path,
    query: &str,
    max_iterations: Option<u32>,
    format: OutputFormat,
) -> Result<()> {
    let evidence = input::load_evidence_file(file)?;

    let mut workflow = VerifierWorkflow::from_config(config);
    if let Some(max_iterations) = max_iterations {
        workflow = workflow.with_max_iterations(max_iterations);
    }

    let state = workflow.run(query, evidence, &NoEvidenceSource).await;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&state)?),
        OutputFormat::Human => print_analysis(config, &state),
    }

    Ok(())
}

fn print_analysis(config: &AutoVerifierConfig, state: &AgentState) {
    let thresholds = &config.refinement;

    println!("{} {}", "Query:".blue().bold(), state.initial_query);
    println!();
    println!("{}", "Evidence Trust".cyan().bold());

    for assessment in &state.analysis_results {
        let source = state
            .evidence
            .iter()
            .find(|ev| ev.evidence_id == assessment.evidence_id)
            .map(|ev| ev.locator())
            .unwrap_or("unknown");

        let score = format!("{:.3}", assessment.trust_score);
        let score = if assessment.trust_score >= thresholds.high_trust_threshold {
            score.green()
        } else if assessment.trust_score < thresholds.low_trust_threshold {
            score.red()
        } else {
            score.yellow()
        };

        println!("  {} {}", score, source);
        println!("        {}", assessment.reasoning.dimmed());
    }

    let summary = TrustSummary::from_results(&state.analysis_results, thresholds);
    println!();
    println!(
        "High trust: {}  Low trust: {}  Mean: {:.3}  Passes: {}",
        summary.high_trust, summary.low_trust, summary.mean_trust, state.iterations
    );

    if state.next_query.is_empty() {
        println!("{}", "Evidence is sufficient".green());
    } else {
        println!("{} {}", "Suggested query:".yellow().bold(), state.next_query);
    }

    for warning in &state.warnings {
        println!("{} {}", "⚠️ ".yellow(), warning);
    }
    println!("{} {}", "Conclusion:".blue().bold(), state.final_conclusion);
}

async fn handle_demo(config: &AutoVerifierConfig) -> Result<()> {
    println!("{}", "🚀 Initializing Claim Verifier...".blue().bold());
    let verifier = ClaimVerifier::from_config(config).context("Failed to initialize verifier")?;
    println!(
        "✅ Verifier initialized ({} / {})",
        verifier.provider().provider_name(),
        verifier.provider().model_name()
    );

    let cases = demo::demo_cases();
    let mut failures = 0;

    println!();
    println!("{}", "=".repeat(60));
    println!("{}", "🔍 TESTING VERIFIER".bold());
    println!("{}", "=".repeat(60));

    for (i, case) in cases.iter().enumerate() {
        println!();
        println!("{}", format!("📋 Test Case {}: {}", i + 1, case.name).cyan().bold());
        println!("{}", "-".repeat(50));
        println!("Claim: {}", case.claim);
        print_evidence(&case.evidence);

        let pb = spinner("Verifying claim...");
        let result = verifier.verify_claim(case.claim, &case.evidence).await;
        pb.finish_and_clear();

        println!();
        println!("{}", "✅ VERIFICATION RESULT:".green());
        print_result(&result);

        match demo::validate_structure(&result) {
            Ok(()) => {
                println!("   ✓ Structure validation: PASSED");
                println!();
                println!("📄 JSON Output:");
                println!("{}", serde_json::to_string_pretty(&result)?);
            }
            Err(e) => {
                failures += 1;
                println!("   {} Structure validation: FAILED - {}", "❌".red(), e);
            }
        }
    }

    println!();
    println!("{}", "🔄 TESTING BATCH VERIFICATION".bold());
    println!("{}", "-".repeat(50));

    let batch: Vec<(String, Vec<EvidenceItem>)> = cases
        .iter()
        .take(2)
        .map(|case| (case.claim.to_string(), case.evidence.clone()))
        .collect();
    let results = verifier.verify_claim_batch(&batch).await;
    println!("✅ Batch verification completed!");
    println!("   Results count: {}", results.len());
    for (i, result) in results.iter().enumerate() {
        println!(
            "   Result {}: {} (confidence: {:.2})",
            i + 1,
            colored_label(result.label),
            result.confidence
        );
    }

    println!();
    println!("{}", "=".repeat(60));
    if failures == 0 {
        println!("{}", "🎉 DEMO COMPLETED!".green().bold());
    } else {
        println!(
            "{}",
            format!("DEMO COMPLETED with {} validation failure(s)", failures)
                .yellow()
                .bold()
        );
    }
    println!("{}", "=".repeat(60));

    Ok(())
}

async fn handle_check(config_mgr: &ConfigManager) {
    let config = config_mgr.config();

    println!("{}", "🔧 ENVIRONMENT CHECK".blue().bold());
    println!("{}", "-".repeat(30));

    match std::env::current_dir() {
        Ok(dir) => println!("Current working directory: {}", dir.display()),
        Err(e) => println!("❌ Cannot read working directory: {}", e),
    }

    match config_mgr.config_path() {
        Some(path) => println!("✅ Config file: {}", path.display()),
        None => println!("ℹ️  No config file found, using defaults"),
    }

    println!(
        "LLM provider: {} (model: {})",
        config.llm.provider,
        config.llm.model.as_deref().unwrap_or("default")
    );

    let (key_name, key) = match config.llm.provider.as_str() {
        "gemini" => ("GOOGLE_API_KEY", config.llm.gemini_api_key.as_deref()),
        _ => ("OPENAI_API_KEY", config.llm.openai_api_key.as_deref()),
    };
    match key.filter(|k| !k.trim().is_empty()) {
        Some(key) => println!("✅ {} found (length: {})", key_name, key.len()),
        None if key_name == "GOOGLE_API_KEY" => println!("❌ {} not found", key_name),
        None => println!("ℹ️  {} not set (optional for local servers)", key_name),
    }

    match LLMProviderFactory::create_from_config(&config.llm) {
        Ok(provider) => {
            println!(
                "✅ Provider created: {} / {}",
                provider.provider_name(),
                provider.model_name()
            );

            let pb = spinner("Checking provider availability...");
            let available = LLMProviderFactory::check_availability(&provider).await;
            pb.finish_and_clear();

            if available {
                println!("✅ Provider is reachable");
            } else {
                println!("❌ Provider is not reachable");
            }
        }
        Err(e) => println!("❌ Provider creation failed: {:#}", e),
    }

    let test_evidence = EvidenceItem::new("Test", "Test content");
    println!("✅ EvidenceItem creation successful: {}", test_evidence);
    println!("{}", "-".repeat(30));
}

fn handle_config_init(path: Option<&Path>, force: bool) -> Result<()> {
    let target = path
        .map(Path::to_path_buf)
        .or_else(ConfigManager::user_config_path)
        .unwrap_or_else(|| PathBuf::from(LOCAL_CONFIG_FILE));

    println!("{}", "Initializing AutoVerifier configuration...".green().bold());

    if target.exists() && !force {
        println!("⚠️  Configuration file already exists: {}", target.display());
        println!("   Use --force to overwrite");
        return Ok(());
    }

    ConfigManager::create_default_config(&target)
        .with_context(|| format!("Failed to create {}", target.display()))?;
    println!("✓ Created config file: {}", target.display());
    println!();
    println!("{}", "Next steps:".yellow().bold());
    println!("  1. export GOOGLE_API_KEY=...  (or set [llm] provider to ollama/lmstudio)");
    println!("  2. autoverifier check");

    Ok(())
}

/// Keep only the last four characters of a secret
fn mask_secret(secret: &mut Option<String>) {
    if let Some(value) = secret.as_mut() {
        let chars: Vec<char> = value.chars().collect();
        let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
        *value = format!("****{}", tail);
    }
}

fn handle_config_show(config_mgr: &ConfigManager, json: bool) -> Result<()> {
    let mut config = config_mgr.config().clone();
    mask_secret(&mut config.llm.gemini_api_key);
    mask_secret(&mut config.llm.openai_api_key);

    if json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    println!("{}", "Current Configuration:".blue().bold());
    match config_mgr.config_path() {
        Some(path) => println!("Loaded from: {}", path.display()),
        None => println!("Loaded from: defaults"),
    }
    println!();
    println!(
        "{}",
        toml::to_string_pretty(&config).context("Failed to render configuration")?
    );

    Ok(())
}
