//! Medgate binary - MCP stdio server and a one-shot command-line client.
//!
//! - `medgate serve` (default): serve the clinical tools over stdin/stdout
//! - `medgate ask`: route one natural-language request and print the reply
//! - `medgate tools`: print the tool definitions as JSON

use clap::{Parser, Subcommand};
use medgate::mcp::McpServer;
use medgate::routing::Session;
use medgate::types::{PatientId, Role};
use medgate::Config;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(name = "medgate", version, about = "Role-gated clinical assistant")]
struct Cli {
    /// JSON configuration file; missing settings take defaults.
    #[arg(long, env = "MEDGATE_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Directory of `Patient_{id}.json` records.
    #[arg(long, env = "MEDGATE_RECORDS_DIR", global = true)]
    records_dir: Option<PathBuf>,

    /// Directory of `Patient_{id}.png` images.
    #[arg(long, env = "MEDGATE_IMAGES_DIR", global = true)]
    images_dir: Option<PathBuf>,

    /// Directory for the audit, prompt and violation logs.
    #[arg(long, env = "MEDGATE_LOG_DIR", global = true)]
    log_dir: Option<PathBuf>,

    /// Language model command line, e.g. "ollama run llama3.2:latest".
    #[arg(long, env = "MEDGATE_MODEL_COMMAND", global = true)]
    model_command: Option<String>,

    /// Imaging classifier command line; the image path is appended.
    #[arg(long, env = "MEDGATE_IMAGING_COMMAND", global = true)]
    imaging_command: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the tools over MCP on stdin/stdout.
    Serve,
    /// Route a single request and print the reply.
    Ask {
        /// Caller role (doctor or administrator).
        #[arg(long)]
        role: Role,
        /// Patient the conversation is about.
        #[arg(long)]
        patient: Option<String>,
        /// The request text.
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Print the tool definitions.
    Tools,
}

impl Cli {
    fn load_config(&self) -> Result<Config, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };
        if let Some(dir) = &self.records_dir {
            config.storage.records_dir = dir.clone();
        }
        if let Some(dir) = &self.images_dir {
            config.storage.images_dir = dir.clone();
        }
        if let Some(dir) = &self.log_dir {
            config.audit.log_dir = dir.clone();
        }
        if let Some(command) = &self.model_command {
            config.model.command = split_command(command);
        }
        if let Some(command) = &self.imaging_command {
            config.imaging.command = Some(split_command(command));
        }
        Ok(config)
    }
}

fn split_command(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(str::to_string).collect()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = cli.load_config()?;

    // Logs go to stderr; stdout carries the protocol.
    medgate::observability::init_tracing(&config.observability);

    let dispatcher = Arc::new(medgate::dispatcher_from_config(&config)?);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let server = Arc::new(McpServer::new(dispatcher, config.server.clone()));

            let signal_server = server.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("Interrupt received");
                    signal_server.shutdown();
                }
            });

            tracing::info!(version = %config.server.version, "Starting MCP stdio server");
            server.serve_stdio().await?;
        }
        Command::Ask { role, patient, text } => {
            let mut session = Session::new(role);
            if let Some(raw) = patient {
                session.set_current_patient(Some(PatientId::parse(&raw)?));
            }
            println!("{}", role.greeting());
            let reply = session.ask(&dispatcher, &text.join(" ")).await?;
            println!("{}", reply);
        }
        Command::Tools => {
            let tools: Vec<serde_json::Value> = dispatcher
                .list_definitions()
                .iter()
                .map(|d| d.to_mcp_value())
                .collect();
            println!("{}", serde_json::to_string_pretty(&tools)?);
        }
    }

    Ok(())
}
