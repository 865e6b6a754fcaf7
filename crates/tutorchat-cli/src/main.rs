// tutorchat CLI — talk to the tutoring server from a terminal.

mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use log::debug;
use std::path::PathBuf;
use std::sync::Arc;
use tutorchat::{ClientConfig, EngineResult, HttpBackend};

#[derive(Debug, Parser)]
#[command(name = "tutorchat", version, about = "Client for the machine-learning tutoring site")]
struct Cli {
    /// Config file (defaults to <config_dir>/tutorchat/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Server base URL, overriding the config file.
    #[arg(long = "base-url", global = true)]
    base_url: Option<String>,

    #[arg(long, env = "TUTORCHAT_USER", global = true)]
    user: Option<String>,

    #[arg(long, env = "TUTORCHAT_PASSWORD", hide_env_values = true, global = true)]
    password: Option<String>,

    #[arg(long, value_enum, default_value_t = Format::Text, global = true)]
    format: Format,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Text,
    Html,
    Json,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Send one message and print the reply (and book recommendations).
    Chat { message: String },
    /// Print the stored conversation.
    History,
    /// Clear the stored conversation.
    Clear,
    /// Book recommendations for a question.
    Books { message: String },
    /// Teacher analytics dashboard.
    Teacher {
        /// Keep running and reprint every 5 minutes until Ctrl-C.
        #[arg(long)]
        watch: bool,
    },
    /// Personal learning dashboard.
    Student,
    /// Print the effective configuration as TOML.
    Config,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("tutorchat: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> EngineResult<()> {
    let mut cfg = ClientConfig::load(cli.config.as_deref())?;
    if let Some(url) = cli.base_url {
        cfg.base_url = url;
        cfg.validate()?;
    }
    if let Command::Config = cli.command {
        print!("{}", cfg.to_toml()?);
        return Ok(());
    }

    let backend = Arc::new(HttpBackend::new(&cfg)?);
    match (&cli.user, &cli.password) {
        (Some(user), Some(password)) => backend.login(user, password).await?,
        (Some(_), None) | (None, Some(_)) => {
            return Err("both --user and --password are needed to log in".into());
        }
        (None, None) => debug!("[cli] No credentials, continuing without a session"),
    }

    let format = cli.format;
    match cli.command {
        Command::Chat { message } => commands::chat::chat(backend, &cfg, &message, format).await,
        Command::History => commands::chat::history(backend, &cfg, format).await,
        Command::Clear => commands::chat::clear(backend, &cfg, format).await,
        Command::Books { message } => commands::chat::books(backend, &message, format).await,
        Command::Teacher { watch: false } => {
            commands::dashboard::show(backend, tutorchat::DashboardKind::Teacher, format).await
        }
        Command::Teacher { watch: true } => commands::dashboard::watch(backend, format).await,
        Command::Student => commands::dashboard::show(backend, tutorchat::DashboardKind::Student, format).await,
        Command::Config => Ok(()),
    }
}
