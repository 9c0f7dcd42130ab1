/*!
 * Capctl CLI - Command Line Interface
 *
 * Drives every node of a mock capability fleet. Nodes come from `--node`,
 * the config file, or the node cache (`--from-cache`).
 */

use anyhow::{Context, Result};
use capctl::{
    commands::{self, Session},
    config::{CliConfig, LogLevel},
    error::{exit_code_for, presence_exit_code, EXIT_SUCCESS},
    logging,
    output::OutputWriter,
};
use capctl_connect::{CapabilityInfo, CapabilityType, RequestMetadata, TriggerRegistration};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "capctl")]
#[command(version, about = "Control a fleet of mock capability nodes", long_about = None)]
struct Cli {
    /// Load configuration from a TOML file
    #[arg(long, global = true, value_name = "FILE", env = "CAPCTL_CONFIG")]
    config: Option<PathBuf>,

    /// Node address host:port (repeatable, overrides the config file)
    #[arg(
        short = 'n',
        long = "node",
        global = true,
        value_name = "ADDR",
        env = "CAPCTL_NODES",
        value_delimiter = ','
    )]
    nodes: Vec<String>,

    /// Connect to the addresses stored in the node cache
    #[arg(long, global = true)]
    from_cache: bool,

    /// Node cache location
    #[arg(long, global = true, value_name = "FILE")]
    cache_path: Option<PathBuf>,

    /// Use TLS without certificate validation
    #[arg(long, global = true)]
    secure: bool,

    /// Write the connected node addresses to the cache
    #[arg(long, global = true)]
    persist: bool,

    /// Emit results as JSON lines
    #[arg(long, global = true)]
    json: bool,

    /// Log level
    #[arg(long, value_enum, global = true)]
    log_level: Option<LogLevelArg>,

    /// Write logs to a file as JSON instead of stdout
    #[arg(long = "log", global = true, value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List capabilities on every node
    List,

    /// Check whether every node has a capability
    Has {
        /// Capability ID, e.g. cron-trigger@1.0.0
        id: String,
    },

    /// Create a capability on every node
    Create {
        id: String,

        #[arg(long = "type", value_enum)]
        capability_type: CapabilityTypeArg,

        #[arg(long, default_value = "")]
        description: String,

        /// Mark the capability as local to the node
        #[arg(long)]
        local: bool,
    },

    /// Remove a capability from every node
    Delete { id: String },

    /// Wait until every node reports a capability
    WaitCapability {
        id: String,

        #[arg(long, default_value = "60")]
        timeout_secs: u64,
    },

    /// Wait until every node has subscribers for a trigger
    WaitSubscribers {
        trigger_id: String,

        #[arg(long, default_value = "60")]
        timeout_secs: u64,
    },

    /// Show workflow subscribers of a trigger per node
    Subscribers { trigger_id: String },

    /// Inject a trigger event on every node
    SendTrigger {
        trigger_id: String,
        event_id: String,

        /// Event outputs as a JSON object
        #[arg(long, default_value = "{}")]
        outputs: String,
    },

    /// Subscribe to a trigger on every node and print events until Ctrl-C
    Subscribe {
        trigger_id: String,

        #[arg(long, default_value = "")]
        method: String,

        /// Trigger config as a JSON object
        #[arg(long)]
        trigger_config: Option<String>,

        /// Workflow ID sent as registration metadata
        #[arg(long)]
        workflow_id: Option<String>,

        #[arg(long)]
        registration_trigger_id: Option<String>,
    },

    /// Hook into executables on every node and print requests until Ctrl-C
    Hook {
        /// Capacity of the shared request queue
        #[arg(long, default_value = "16")]
        buffer: usize,
    },

    /// Write the effective configuration to a TOML file
    SaveConfig { path: PathBuf },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevelArg> for LogLevel {
    fn from(arg: LogLevelArg) -> Self {
        match arg {
            LogLevelArg::Error => LogLevel::Error,
            LogLevelArg::Warn => LogLevel::Warn,
            LogLevelArg::Info => LogLevel::Info,
            LogLevelArg::Debug => LogLevel::Debug,
            LogLevelArg::Trace => LogLevel::Trace,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CapabilityTypeArg {
    Trigger,
    Action,
    Consensus,
    Target,
}

impl From<CapabilityTypeArg> for CapabilityType {
    fn from(arg: CapabilityTypeArg) -> Self {
        match arg {
            CapabilityTypeArg::Trigger => CapabilityType::Trigger,
            CapabilityTypeArg::Action => CapabilityType::Action,
            CapabilityTypeArg::Consensus => CapabilityType::Consensus,
            CapabilityTypeArg::Target => CapabilityType::Target,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let output = OutputWriter::new(cli.json);
    let code = match run(cli, &output).await {
        Ok(code) => code,
        Err(e) => {
            output.error(&format!("{:#}", e));
            exit_code_for(&e)
        }
    };
    std::process::exit(code);
}

async fn run(cli: Cli, output: &OutputWriter) -> Result<i32> {
    let config = effective_config(&cli)?;

    if let Err(e) = logging::init_logging(&config) {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    if let Commands::SaveConfig { path } = &cli.command {
        config
            .to_file(path)
            .with_context(|| format!("Failed to save configuration to {}", path.display()))?;
        println!("Configuration written to {}", path.display());
        return Ok(EXIT_SUCCESS);
    }

    let controller = commands::connect_fleet(&config, cli.from_cache, cli.persist)
        .await
        .context("Failed to connect to capability nodes")?;
    let session = Session::new(controller, output.clone());
    session.cancel_on_interrupt();

    match cli.command {
        Commands::List => commands::list(&session).await?,
        Commands::Has { id } => {
            let present = commands::has(&session, &id).await?;
            return Ok(presence_exit_code(present));
        }
        Commands::Create {
            id,
            capability_type,
            description,
            local,
        } => {
            let info = CapabilityInfo {
                id,
                capability_type: capability_type.into(),
                description,
                is_local: local,
            };
            commands::create(&session, &info).await?
        }
        Commands::Delete { id } => commands::delete(&session, &id).await?,
        Commands::WaitCapability { id, timeout_secs } => {
            commands::wait_for_capability(&session, &id, Duration::from_secs(timeout_secs)).await?
        }
        Commands::WaitSubscribers {
            trigger_id,
            timeout_secs,
        } => {
            commands::wait_for_subscribers(&session, &trigger_id, Duration::from_secs(timeout_secs))
                .await?
        }
        Commands::Subscribers { trigger_id } => commands::subscribers(&session, &trigger_id).await?,
        Commands::SendTrigger {
            trigger_id,
            event_id,
            outputs,
        } => commands::send_trigger(&session, &trigger_id, &event_id, &outputs).await?,
        Commands::Subscribe {
            trigger_id,
            method,
            trigger_config,
            workflow_id,
            registration_trigger_id,
        } => {
            let mut registration = TriggerRegistration::new(trigger_id).with_method(method);
            if let Some(json) = trigger_config {
                registration =
                    registration.with_config(commands::encode_json_arg("trigger config", &json)?);
            }
            if let Some(workflow_id) = workflow_id {
                registration = registration.with_metadata(RequestMetadata {
                    workflow_id,
                    ..Default::default()
                });
            }
            if let Some(id) = registration_trigger_id {
                registration = registration.with_registration_trigger_id(id);
            }
            commands::subscribe(&session, &registration).await?
        }
        Commands::Hook { buffer } => commands::hook(&session, buffer).await?,
        Commands::SaveConfig { .. } => {}
    }

    Ok(EXIT_SUCCESS)
}

/// Config file values overridden by command-line flags
fn effective_config(cli: &Cli) -> Result<CliConfig> {
    let mut config = match &cli.config {
        Some(path) => CliConfig::from_file(path)
            .with_context(|| format!("Failed to load config file {}", path.display()))?,
        None => CliConfig::default(),
    };

    if !cli.nodes.is_empty() {
        config.nodes = cli.nodes.clone();
    }
    if let Some(path) = &cli.cache_path {
        config.cache_path = path.clone();
    }
    if let Some(level) = cli.log_level {
        config.log_level = level.into();
    }
    if let Some(path) = &cli.log_file {
        config.log_file = Some(path.clone());
    }
    config.secure |= cli.secure;
    config.verbose |= cli.verbose;

    Ok(config)
}
