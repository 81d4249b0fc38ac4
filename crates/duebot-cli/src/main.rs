mod run;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "duebot", about = "Telegram deadline tracker bot")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot: command polling plus reminder and summary loops
    Run {
        /// Config file path (defaults to ~/.duebot/config.json5)
        #[arg(short, long)]
        config: Option<String>,
    },
    /// Print the resolved configuration
    Health,
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(run::run_bot(config))?;
        }
        Commands::Health => {
            let config = duebot_config::load_config().unwrap_or_default();
            println!("duebot is healthy");
            println!("  admin id: {}", config.telegram.admin_id);
            println!("  broadcast chat: {}", config.telegram.broadcast_chat_id);
            println!(
                "  weekly summary: {} at {:02}:00",
                config.reminders.weekday(),
                config.reminders.summary_hour
            );
            println!(
                "  bot token: {}",
                if config.resolved_bot_token().is_ok() {
                    "configured"
                } else {
                    "missing"
                }
            );
        }
    }

    Ok(())
}
