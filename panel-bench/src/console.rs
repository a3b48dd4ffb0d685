//! Line console for driving the simulated panel
//!
//! ```text
//! press 3         click button 3
//! hold 1          hold button 1 down until `release`
//! release         let every button go
//! route 12 5      switcher routes input 12 to output 5 from elsewhere
//! offline|online  drop or restore the switcher link
//! status          print panel and switcher state
//! quit
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Result;
use panel_core::{SharedBuffers, SWITCHER_PORTS};
use panel_sim::{VirtualPanel, VirtualSwitcher, DEFAULT_CLICK_HOLD};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::diagnostics_layer::DiagnosticLog;

pub const HELP: &str = "commands: press N | hold N | release | route IN OUT | offline | online | status | help | quit";

/// One console command; port numbers are 1-based as printed on the switcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleCommand {
    Press(usize),
    Hold(usize),
    Release,
    Route { input: u8, output: u8 },
    Offline,
    Online,
    Status,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command '{0}'")]
    Unknown(String),

    #[error("{command} needs {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },

    #[error("'{0}' is not a number")]
    InvalidNumber(String),

    #[error("port {0} out of range (1-40)")]
    PortOutOfRange(u8),
}

fn number<T: FromStr>(
    arg: Option<&str>,
    command: &'static str,
    argument: &'static str,
) -> Result<T, CommandError> {
    let arg = arg.ok_or(CommandError::MissingArgument { command, argument })?;
    arg.parse()
        .map_err(|_| CommandError::InvalidNumber(arg.to_string()))
}

fn port(value: u8) -> Result<u8, CommandError> {
    if value == 0 || value > SWITCHER_PORTS {
        return Err(CommandError::PortOutOfRange(value));
    }
    Ok(value)
}

impl FromStr for ConsoleCommand {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            return Err(CommandError::Unknown(String::new()));
        };

        match command.to_ascii_lowercase().as_str() {
            "press" => Ok(Self::Press(number(words.next(), "press", "a button")?)),
            "hold" => Ok(Self::Hold(number(words.next(), "hold", "a button")?)),
            "release" => Ok(Self::Release),
            "route" => {
                let input = port(number(words.next(), "route", "an input")?)?;
                let output = port(number(words.next(), "route", "an output")?)?;
                Ok(Self::Route { input, output })
            }
            "offline" => Ok(Self::Offline),
            "online" => Ok(Self::Online),
            "status" => Ok(Self::Status),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" => Ok(Self::Quit),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

/// What the panel is doing after startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelMode {
    Routing,
    LampTest,
}

impl fmt::Display for PanelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PanelMode::Routing => write!(f, "routing"),
            PanelMode::LampTest => write!(f, "lamp test"),
        }
    }
}

/// Handles the console needs to act on the bench
pub struct Console {
    pub panel: VirtualPanel,
    pub switcher: Arc<VirtualSwitcher>,
    pub buffers: Arc<SharedBuffers>,
    pub diagnostics: DiagnosticLog,
    pub mode: PanelMode,
    /// Destination this panel controls (1-based)
    pub destination: u8,
}

impl Console {
    /// Carry out one command; returns `false` when the console should stop
    pub async fn execute(&self, command: ConsoleCommand) -> Result<bool> {
        match command {
            ConsoleCommand::Press(button) => self.panel.click(button, DEFAULT_CLICK_HOLD).await?,
            ConsoleCommand::Hold(button) => self.panel.press(button)?,
            ConsoleCommand::Release => self.panel.release_all(),
            ConsoleCommand::Route { input, output } => {
                self.switcher.apply_external_route(input - 1, output - 1)?
            }
            ConsoleCommand::Offline => self.switcher.set_online(false),
            ConsoleCommand::Online => self.switcher.set_online(true),
            ConsoleCommand::Status => self.print_status().await,
            ConsoleCommand::Help => println!("{}", HELP),
            ConsoleCommand::Quit => return Ok(false),
        }
        Ok(true)
    }

    async fn print_status(&self) {
        for line in self.status_lines().await {
            println!("{}", line);
        }
    }

    async fn status_lines(&self) -> Vec<String> {
        let debounced = match self.buffers.button_panel_state().await {
            Ok(state) => state.to_string(),
            Err(e) => format!("unavailable ({})", e),
        };

        let mut lines = vec![
            format!("mode:        {}", self.mode),
            format!("held:        {:?}", self.panel.pressed()),
            format!("debounced:   {}", debounced),
            format!("lit:         {}", self.panel.lit_button()),
            format!(
                "switcher:    {} ({}, auto-confirm {}), {} commands",
                self.switcher.id(),
                if self.switcher.is_online() { "online" } else { "offline" },
                if self.switcher.auto_confirm() { "on" } else { "off" },
                self.switcher.commands().len()
            ),
        ];
        let crosspoint = self
            .destination
            .checked_sub(1)
            .and_then(|output| self.switcher.crosspoint(output));
        if let Some(input) = crosspoint {
            lines.push(format!("destination: {} <- input {}", self.destination, input + 1));
        }

        lines.push(format!("warnings:    {} since start", self.diagnostics.total()));
        for event in self.diagnostics.recent() {
            lines.push(format!("  [{}] {}: {}", event.level, event.source, event.message));
        }
        lines
    }

    /// Read commands from stdin until `quit`, end of input or Ctrl-C
    ///
    /// At end of input the bench keeps running until Ctrl-C.
    pub async fn run(&self) -> Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        println!("{}", HELP);
        loop {
            tokio::select! {
                result = &mut ctrl_c => {
                    result?;
                    info!("Shutdown signal received");
                    return Ok(());
                }
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        info!("Console input closed, press Ctrl-C to stop");
                        ctrl_c.await?;
                        info!("Shutdown signal received");
                        return Ok(());
                    };
                    if line.trim().is_empty() {
                        continue;
                    }

                    match line.parse::<ConsoleCommand>() {
                        Ok(command) => match self.execute(command).await {
                            Ok(true) => {}
                            Ok(false) => return Ok(()),
                            Err(e) => warn!("{}", e),
                        },
                        Err(e) => println!("{}; {}", e, HELP),
                    }
                }
            }
        }
    }
}
