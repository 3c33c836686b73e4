//! getarg - query startup flags from the command line.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use getarg::config::{is_valid_prefix, parse_bool};
use getarg::{generate_output, resolve_exports, ArgStore, Config};
use tracing_subscriber::EnvFilter;

/// Environment variable overriding the log filter.
const LOG_ENV: &str = "GETARG_LOG";

/// Resolve startup flags and read them back as typed values.
#[derive(Parser, Debug)]
#[command(name = "getarg", version, about, disable_help_subcommand = true)]
struct Cli {
    /// Log resolution details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the typed value of one key
    Get {
        /// Key to look up, including its leading dash (e.g. -port)
        #[arg(long, allow_hyphen_values = true)]
        key: String,

        /// How to read the stored value
        #[arg(long = "type", value_enum, default_value_t = Kind::String)]
        kind: Kind,

        /// Value printed when the key was not given
        #[arg(long, allow_hyphen_values = true)]
        default: Option<String>,

        /// Flags to resolve
        #[arg(last = true)]
        args: Vec<String>,
    },

    /// Print the resolved store as JSON
    Dump {
        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,

        /// Flags to resolve
        #[arg(last = true)]
        args: Vec<String>,
    },

    /// Write configured keys as shell exports and print the file path
    Export {
        /// JSON configuration listing the keys to export
        #[arg(long)]
        config: String,

        /// Environment variable prefix (overrides config)
        #[arg(long)]
        prefix: Option<String>,

        /// Flags to resolve
        #[arg(last = true)]
        args: Vec<String>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Kind {
    String,
    Bool,
    Int,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    println!("{}", run(cli.command)?);
    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "getarg=debug" } else { "warn" })
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Execute a command and return the text to print.
fn run(command: Commands) -> Result<String> {
    match command {
        Commands::Get {
            key,
            kind,
            default,
            args,
        } => {
            let store = ArgStore::from_args(&args);
            get_value(&store, &key, kind, default.as_deref())
        }
        Commands::Dump { pretty, args } => {
            let store = ArgStore::from_args(&args);
            let snapshot = store.snapshot();
            let json = if pretty {
                serde_json::to_string_pretty(&snapshot)
            } else {
                serde_json::to_string(&snapshot)
            };
            json.context("failed to serialize argument store")
        }
        Commands::Export {
            config,
            prefix,
            args,
        } => {
            let cfg = Config::from_json(&config).context("failed to parse config JSON")?;
            cfg.validate().context("invalid config")?;

            let effective_prefix = prefix.as_deref().unwrap_or_else(|| cfg.effective_prefix());
            if !is_valid_prefix(effective_prefix) {
                bail!(
                    "invalid prefix '{}': must be empty or start a shell identifier",
                    effective_prefix
                );
            }

            let store = ArgStore::from_args(&args);
            let values = resolve_exports(&cfg, &store);
            let path = generate_output(&values, effective_prefix)
                .context("failed to generate output file")?;

            Ok(path.display().to_string())
        }
    }
}

fn get_value(store: &ArgStore, key: &str, kind: Kind, default: Option<&str>) -> Result<String> {
    let value = match kind {
        Kind::String => store.get_str_or(key, default.unwrap_or("")).to_string(),
        Kind::Bool => {
            let default = match default {
                Some(d) => match parse_bool(d) {
                    Some(b) => b,
                    None => bail!("invalid bool default '{}': expected true, false, 1 or 0", d),
                },
                None => false,
            };
            store.get_bool_or(key, default).to_string()
        }
        Kind::Int => {
            let default = match default {
                Some(d) => d
                    .parse::<i64>()
                    .with_context(|| format!("invalid int default '{}'", d))?,
                None => 0,
            };
            store.get_int(key, default).to_string()
        }
    };
    Ok(value)
}
