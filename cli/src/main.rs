use std::fs;
use std::path::{Path, PathBuf};

use argbind_config::{Env, FileConfig, Overlay, apply_overlays};
use argbind_core::{
    Binder, CoercerRegistry, CommandSignature, FnCoercer, ScalarKind, Value, validate_signature,
};
use clap::{Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Output format for bound results.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliOutputFormat {
    Json,
    Yaml,
}

#[derive(Debug, Parser)]
#[command(name = "argbind")]
#[command(version)]
#[command(about = "Bind CLI tokens against typed command signatures")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Bind tokens to a signature and print the result.
    Bind(BindArgs),
    /// Validate one or more signature files.
    Validate(ValidateArgs),
    /// Print parameter metadata for a signature as JSON.
    Describe(DescribeArgs),
}

#[derive(Debug, Args)]
struct KindArgs {
    /// Register a custom scalar kind that accepts any string (repeatable).
    #[arg(long = "string-kind", value_name = "NAME")]
    string_kinds: Vec<String>,
}

#[derive(Debug, Args)]
struct BindArgs {
    /// Signature file (JSON or YAML).
    #[arg(long)]
    signature: PathBuf,
    /// Configuration file overlay, consulted in the order given (repeatable).
    #[arg(long = "config", value_name = "FILE")]
    configs: Vec<PathBuf>,
    /// Key descended in every configuration file before the command path (repeatable).
    #[arg(long = "root-key", value_name = "KEY")]
    root_keys: Vec<String>,
    /// Command path segment used to scope configuration and environment lookup (repeatable).
    #[arg(long = "command", value_name = "NAME")]
    command_path: Vec<String>,
    /// Read soft defaults from environment variables with this prefix.
    #[arg(long)]
    env_prefix: Option<String>,
    /// Skip configuration keys that match no parameter.
    #[arg(long)]
    allow_unknown: bool,
    /// Output format.
    #[arg(long, default_value = "json")]
    format: CliOutputFormat,
    #[command(flatten)]
    kinds: KindArgs,
    /// Tokens to bind (pass after `--`).
    #[arg(last = true, allow_hyphen_values = true)]
    tokens: Vec<String>,
}

#[derive(Debug, Args)]
struct ValidateArgs {
    /// Signature files (JSON or YAML).
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
    #[command(flatten)]
    kinds: KindArgs,
}

#[derive(Debug, Args)]
struct DescribeArgs {
    /// Signature file (JSON or YAML).
    #[arg(long)]
    signature: PathBuf,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Bind(args) => run_bind(args),
        Command::Validate(args) => run_validate(args),
        Command::Describe(args) => run_describe(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run_bind(args: BindArgs) -> Result<(), String> {
    let signature = load_signature(&args.signature)?;
    let registry = build_registry(&args.kinds);
    check_signature(&args.signature, &signature, &registry)?;

    let mut files = Vec::with_capacity(args.configs.len());
    for path in &args.configs {
        let file = FileConfig::from_path(path)
            .map_err(|e| e.to_string())?
            .with_root_keys(args.root_keys.iter().cloned())
            .allow_unknown(args.allow_unknown);
        files.push(file);
    }
    let env = args.env_prefix.as_deref().map(Env::new);

    // Environment variables take precedence over configuration files.
    let mut overlays: Vec<&dyn Overlay> = Vec::new();
    if let Some(env) = &env {
        overlays.push(env);
    }
    overlays.extend(files.iter().map(|f| f as &dyn Overlay));

    let defaults =
        apply_overlays(&overlays, &signature, &args.command_path).map_err(|e| e.to_string())?;
    debug!(overlays = overlays.len(), soft_defaults = defaults.len(), "Overlays applied");

    let result = Binder::new(&registry)
        .with_defaults(&defaults)
        .bind(&signature, &args.tokens);

    let rendered = match args.format {
        CliOutputFormat::Json => serde_json::to_string_pretty(&result).map_err(|e| e.to_string())?,
        CliOutputFormat::Yaml => serde_yaml::to_string(&result).map_err(|e| e.to_string())?,
    };
    println!("{}", rendered.trim_end());

    if result.is_ok() {
        Ok(())
    } else {
        let messages: Vec<String> = result.errors.iter().map(ToString::to_string).collect();
        Err(messages.join("; "))
    }
}

fn run_validate(args: ValidateArgs) -> Result<(), String> {
    let registry = build_registry(&args.kinds);
    let mut parameters = 0;
    for path in &args.inputs {
        let signature = load_signature(path)?;
        check_signature(path, &signature, &registry)?;
        parameters += signature.parameters.len();
    }
    println!(
        "Validated {} signature file(s) with {} parameter(s).",
        args.inputs.len(),
        parameters
    );
    Ok(())
}

fn run_describe(args: DescribeArgs) -> Result<(), String> {
    let signature = load_signature(&args.signature)?;
    let info = signature.parameter_info();
    let json = serde_json::to_string_pretty(&info).map_err(|e| e.to_string())?;
    println!("{json}");
    Ok(())
}

fn load_signature(path: &Path) -> Result<CommandSignature, String> {
    let text = fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml")
    );
    let parsed = if is_yaml {
        serde_yaml::from_str(&text).map_err(|e| e.to_string())
    } else {
        serde_json::from_str(&text).map_err(|e| e.to_string())
    };
    parsed.map_err(|e| format!("invalid signature {}: {e}", path.display()))
}

fn check_signature(
    path: &Path,
    signature: &CommandSignature,
    registry: &CoercerRegistry,
) -> Result<(), String> {
    let errors = validate_signature(signature, registry);
    if errors.is_empty() {
        return Ok(());
    }
    let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
    Err(format!("{}: {}", path.display(), messages.join("; ")))
}

fn build_registry(kinds: &KindArgs) -> CoercerRegistry {
    let mut registry = CoercerRegistry::default();
    for name in &kinds.string_kinds {
        registry.register(
            ScalarKind::custom(name.as_str()),
            FnCoercer::new(|raw: &str| -> Result<Value, String> { Ok(Value::Str(raw.to_string())) })
                .string_compatible(),
        );
    }
    registry
}
