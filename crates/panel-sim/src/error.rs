use thiserror::Error;

/// Bad request to a simulator
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SimError {
    /// Panel buttons are numbered 1-6
    #[error("no such button: {0} (buttons are 1-6)")]
    InvalidButton(usize),

    /// Switcher ports are numbered 0-39 on the wire
    #[error("no such switcher port: input {input}, output {output}")]
    InvalidPort { input: u8, output: u8 },
}
