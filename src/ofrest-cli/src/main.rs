use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use ofrest_core::{ClientConfig, EnvOverrides, LogQuery, RoomQuery, RoomType, DEFAULT_LOG_LIMIT};
use ofrest_rs::Client;

mod commands;
mod export;
mod output;
mod telemetry;

use output::OutputFormat;
use telemetry::LogFormat;

/// Administer an Openfire server through its REST API plugin
#[derive(Parser)]
#[command(name = "ofrest", version, about)]
struct Cli {
    /// JSON file with host, secret, verify_ssl and timeout_secs
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Openfire server URL, e.g. https://localhost:9091 [env: OFREST_HOST]
    #[arg(long, global = true)]
    host: Option<String>,

    /// Shared secret configured in the REST API plugin [env: OFREST_SECRET]
    #[arg(long, global = true)]
    secret: Option<String>,

    /// Skip TLS certificate validation (self-signed servers) [env: OFREST_VERIFY_SSL=false]
    #[arg(long, global = true)]
    insecure: bool,

    /// Request timeout in seconds [env: OFREST_TIMEOUT_SECS]
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table, global = true)]
    output: OutputFormat,

    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List users
    Users {
        /// Only users whose username contains this text
        #[arg(long)]
        search: Option<String>,
    },
    /// List chat rooms
    Rooms {
        #[command(flatten)]
        rooms: RoomArgs,

        /// Also show owners, admins and members of each room
        #[arg(long)]
        show_users: bool,
    },
    /// List sessions, optionally for one user
    Sessions {
        #[arg(long)]
        username: Option<String>,
    },
    /// List security audit log entries
    AuditLogs {
        #[command(flatten)]
        logs: LogArgs,
    },
    /// Send entries to a Filebeat HTTP input
    #[command(subcommand)]
    Export(ExportTarget),
}

#[derive(Subcommand)]
enum ExportTarget {
    Users {
        #[arg(long)]
        search: Option<String>,

        #[command(flatten)]
        sink: SinkArgs,
    },
    Rooms {
        #[command(flatten)]
        rooms: RoomArgs,

        #[command(flatten)]
        sink: SinkArgs,
    },
    AuditLogs {
        #[command(flatten)]
        logs: LogArgs,

        #[command(flatten)]
        sink: SinkArgs,
    },
}

#[derive(Args)]
struct RoomArgs {
    /// MUC service name
    #[arg(long, default_value = ofrest_core::DEFAULT_SERVICE)]
    service: String,

    #[arg(long = "type", value_enum, default_value_t = RoomTypeArg::Public)]
    room_type: RoomTypeArg,

    #[arg(long)]
    search: Option<String>,
}

impl RoomArgs {
    fn to_query(&self) -> RoomQuery {
        RoomQuery {
            service: self.service.clone(),
            room_type: match self.room_type {
                RoomTypeArg::Public => RoomType::Public,
                RoomTypeArg::All => RoomType::All,
            },
            search: self.search.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RoomTypeArg {
    Public,
    All,
}

#[derive(Args)]
struct LogArgs {
    #[arg(long)]
    username: Option<String>,

    #[arg(long)]
    offset: Option<u32>,

    #[arg(long, default_value_t = DEFAULT_LOG_LIMIT)]
    limit: u32,

    /// Oldest entry, seconds since the epoch
    #[arg(long)]
    start_time: Option<i64>,

    /// Newest entry, seconds since the epoch
    #[arg(long)]
    end_time: Option<i64>,

    /// Relative window such as 30m, 1h, 2d or 1w
    #[arg(long, conflicts_with_all = ["start_time", "end_time"])]
    since: Option<String>,
}

impl LogArgs {
    fn to_query(&self) -> Result<LogQuery> {
        let (start_time, end_time) = match &self.since {
            Some(since) => {
                let (start, end) = export::parse_since(since, chrono::Utc::now())?;
                tracing::info!("Using relative time {} ({} to {})", since, start, end);
                (Some(start), Some(end))
            }
            None => (self.start_time, self.end_time),
        };
        Ok(LogQuery {
            username: self.username.clone(),
            offset: self.offset,
            limit: self.limit,
            start_time,
            end_time,
        })
    }
}

#[derive(Args)]
struct SinkArgs {
    /// Filebeat HTTP input URL
    #[arg(long, env = "OFREST_FILEBEAT_URL")]
    url: Option<String>,

    /// Print documents instead of sending them
    #[arg(long)]
    dry_run: bool,
}

/// Config file first, then `OFREST_*` variables, then flags
fn resolve_config(cli: &Cli, env: &EnvOverrides) -> Result<ClientConfig> {
    let base = cli.config.as_ref().map(ClientConfig::load).transpose()?;

    let host = cli
        .host
        .clone()
        .or_else(|| env.host.clone())
        .or_else(|| base.as_ref().map(|c| c.host.clone()))
        .filter(|h| !h.is_empty())
        .context("No Openfire host configured (use --host, OFREST_HOST or --config)")?;
    let secret = cli
        .secret
        .clone()
        .or_else(|| env.secret.clone())
        .or_else(|| base.as_ref().map(|c| c.secret.clone()))
        .filter(|s| !s.is_empty())
        .context("No API secret configured (use --secret, OFREST_SECRET or --config)")?;

    let mut config = ClientConfig::new(host, secret);
    config.verify_ssl = !cli.insecure
        && env
            .verify_ssl
            .or(base.as_ref().map(|c| c.verify_ssl))
            .unwrap_or(true);
    config.timeout_secs = cli
        .timeout
        .or(env.timeout_secs)
        .or(base.and_then(|c| c.timeout_secs));
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init_telemetry(cli.log_format)?;

    let config = resolve_config(&cli, &EnvOverrides::read())?;
    if !config.verify_ssl {
        tracing::warn!("SSL certificate validation is disabled");
    }
    tracing::debug!(?config, "Connecting");
    let client = Client::new(config)?;
    let format = cli.output;

    match &cli.command {
        Command::Users { search } => commands::list_users(&client, search.as_deref(), format),
        Command::Rooms { rooms, show_users } => {
            commands::list_rooms(&client, &rooms.to_query(), *show_users, format)
        }
        Command::Sessions { username } => {
            commands::list_sessions(&client, username.as_deref(), format)
        }
        Command::AuditLogs { logs } => commands::list_audit_logs(&client, &logs.to_query()?, format),
        Command::Export(target) => {
            let insecure = !client.config().verify_ssl;
            let sink = |args: &SinkArgs| {
                export::FilebeatSink::new(args.url.clone(), insecure, args.dry_run)
            };
            match target {
                ExportTarget::Users { search, sink: args } => {
                    commands::export_users(&client, search.as_deref(), &sink(args)?)
                }
                ExportTarget::Rooms { rooms, sink: args } => {
                    commands::export_rooms(&client, &rooms.to_query(), &sink(args)?)
                }
                ExportTarget::AuditLogs { logs, sink: args } => {
                    commands::export_audit_logs(&client, &logs.to_query()?, &sink(args)?)
                }
            }
        }
    }
}
