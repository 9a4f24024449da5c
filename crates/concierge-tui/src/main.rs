use std::fs::{self, File};
use std::sync::Mutex;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _, EnvFilter};

use concierge_core::{prompt, AudienceLens, Config, NetworkTier, ViewMode};

mod app;
mod handler;
mod tui;
mod ui;

use app::App;
use tui::EventHandler;

#[derive(Parser)]
#[command(name = "concierge")]
#[command(about = "Portfolio concierge: an audience-aware assistant in your terminal")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Audience lens (recruiter, engineer, resilience)
    #[arg(short, long, global = true)]
    lens: Option<String>,

    /// Network tier (fast, slow, offline)
    #[arg(short, long, global = true)]
    tier: Option<String>,

    /// Use the canned offline provider instead of Gemini
    #[arg(long, global = true)]
    mock: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the system instruction for the current lens and tier
    Prompt,
    /// Ask a single question and print the reply
    Ask {
        /// Your question
        question: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let interactive = cli.command.is_none();

    init_logging(interactive)?;

    let config = Config::load().unwrap_or_else(|err| {
        tracing::warn!(error = %err, "failed to load config, using defaults");
        Config::new()
    });
    let mode = resolve_mode(&config, cli.lens.as_deref(), cli.tier.as_deref());

    match cli.command {
        None => run_tui(&config, mode, cli.mock).await?,
        Some(Commands::Prompt) => println!("{}", prompt::compose(mode)),
        Some(Commands::Ask { question }) => ask_once(&config, mode, cli.mock, &question).await?,
    }

    Ok(())
}

/// The TUI owns the terminal, so its logs go to a file in the config directory
fn init_logging(interactive: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());

    if interactive {
        let log_dir = Config::config_dir()?;
        fs::create_dir_all(&log_dir)?;
        let log_file = File::create(log_dir.join("concierge.log"))?;

        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(log_file)),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    Ok(())
}

/// Command-line flags override the config file; unknown values fall back to the defaults
fn resolve_mode(config: &Config, lens: Option<&str>, tier: Option<&str>) -> ViewMode {
    let mut mode = config.view_mode();

    if let Some(lens) = lens {
        mode.lens = AudienceLens::from_str(lens).unwrap_or_else(|| {
            tracing::warn!(lens, "unknown lens, using default");
            AudienceLens::default()
        });
    }
    if let Some(tier) = tier {
        mode.tier = NetworkTier::from_str(tier).unwrap_or_else(|| {
            tracing::warn!(tier, "unknown network tier, using default");
            NetworkTier::default()
        });
    }

    mode
}

async fn run_tui(config: &Config, mode: ViewMode, use_mock: bool) -> Result<()> {
    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut app = App::new(config, mode, use_mock);
    let mut events = EventHandler::new();

    let result = async {
        while !app.should_quit {
            terminal.draw(|frame| ui::render(&mut app, frame))?;

            match events.next().await {
                Some(event) => handler::handle_event(&mut app, event),
                None => break,
            }
        }
        Ok::<(), anyhow::Error>(())
    }
    .await;

    tui::restore()?;
    result
}

async fn ask_once(config: &Config, mode: ViewMode, use_mock: bool, question: &str) -> Result<()> {
    let mut app = App::new(config, mode, use_mock);
    let widget = &mut app.widget;

    if let Some(banner) = widget.banner() {
        eprintln!("{}", banner);
        return Ok(());
    }

    widget.set_input(question);
    if !widget.submit() {
        anyhow::bail!("question is empty");
    }
    widget.settle().await;

    if let Some(reply) = widget.messages().last() {
        println!("{}", reply.content);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_mode_flags_override_config() {
        let config = Config::new();
        let mode = resolve_mode(&config, Some("engineer"), Some("offline"));
        assert_eq!(mode, ViewMode::new(AudienceLens::Engineer, NetworkTier::Offline));
    }

    #[test]
    fn test_resolve_mode_unknown_falls_back() {
        let mut config = Config::new();
        config.lens = AudienceLens::Engineer;
        config.tier = NetworkTier::Slow;

        let mode = resolve_mode(&config, Some("ceo"), Some("5g"));
        assert_eq!(mode, ViewMode::default());

        let mode = resolve_mode(&config, None, None);
        assert_eq!(mode, ViewMode::new(AudienceLens::Engineer, NetworkTier::Slow));
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::parse_from(["concierge", "--lens", "engineer", "ask", "hello"]);
        assert_eq!(cli.lens.as_deref(), Some("engineer"));
        assert!(matches!(cli.command, Some(Commands::Ask { ref question }) if question == "hello"));

        let cli = Cli::parse_from(["concierge"]);
        assert!(cli.command.is_none());
        assert!(!cli.mock);
    }
}
