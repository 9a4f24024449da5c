//! Line-oriented system console.
//!
//! Commands can change the page-wide view modes; anything that affects
//! the host (closing the console, clearing the chat) is returned as a
//! [`ConsoleEffect`].

use crate::view::{AudienceLens, NetworkTier, ViewContext};

const BANNER: [&str; 4] = [
    "CONCIERGE-OS",
    "Portfolio concierge console.",
    "",
    "Type \"help\" for available commands.",
];

const HELP: &str = "Available commands: help, clear, lens [recruiter|engineer|resilience], tier [fast|slow|offline], status, chat clear, fullscreen, about, version, exit";

/// Side effects the host must apply after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleEffect {
    None,
    Exit,
    ClearChat,
}

pub struct Console {
    lines: Vec<String>,
    context: ViewContext,
    maximized: bool,
}

impl Console {
    pub fn new(context: ViewContext) -> Self {
        Self {
            lines: BANNER.iter().map(|l| l.to_string()).collect(),
            context,
            maximized: false,
        }
    }

    /// Scroll-back, oldest first. Echoed commands start with "> ".
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Whether the console should take the whole screen
    pub fn is_maximized(&self) -> bool {
        self.maximized
    }

    pub fn toggle_maximized(&mut self) {
        self.maximized = !self.maximized;
    }

    pub fn execute(&mut self, command: &str) -> ConsoleEffect {
        let command = command.trim();
        if command.is_empty() {
            return ConsoleEffect::None;
        }

        let lowered = command.to_lowercase();
        let args: Vec<&str> = lowered.split_whitespace().collect();
        let output = match args.as_slice() {
            ["clear"] => {
                self.lines.clear();
                return ConsoleEffect::None;
            }
            ["exit"] => return ConsoleEffect::Exit,
            ["help"] => HELP.to_string(),
            ["fullscreen"] => {
                self.toggle_maximized();
                if self.maximized {
                    "Full-screen mode activated.".to_string()
                } else {
                    "Window mode activated.".to_string()
                }
            }
            ["version"] => format!("CONCIERGE-OS v{}. Architecture: Rust + Gemini.", env!("CARGO_PKG_VERSION")),
            ["about"] => {
                "Nabasa Amos: Software Engineer. Focus: Resilient AI & Constraint-First Engineering."
                    .to_string()
            }
            ["status"] => {
                let mode = self.context.snapshot();
                format!(
                    "Lens: {} | Network: {} ({})",
                    mode.lens.as_str(),
                    mode.tier.as_str(),
                    mode.tier.label()
                )
            }
            ["lens", value] => match AudienceLens::from_str(value) {
                Some(lens) => {
                    self.context.set_lens(lens);
                    format!("Viewing perspective shifted to: {}", lens.as_str())
                }
                None => "Usage: lens [recruiter|engineer|resilience]".to_string(),
            },
            ["lens", ..] => "Usage: lens [recruiter|engineer|resilience]".to_string(),
            ["tier", value] => match NetworkTier::from_str(value) {
                Some(tier) => {
                    self.context.set_tier(tier);
                    format!("Network simulation set to: {} ({})", tier.as_str(), tier.label())
                }
                None => "Usage: tier [fast|slow|offline]".to_string(),
            },
            ["tier", ..] => "Usage: tier [fast|slow|offline]".to_string(),
            ["chat", "clear"] => {
                self.push(command, "Conversation cleared.".to_string());
                return ConsoleEffect::ClearChat;
            }
            [base, ..] => format!("Command not found: {}. Type \"help\" for assistance.", base),
            [] => return ConsoleEffect::None,
        };

        self.push(command, output);
        ConsoleEffect::None
    }

    fn push(&mut self, command: &str, output: String) {
        self.lines.push(format!("> {}", command));
        self.lines.push(output);
    }
}
