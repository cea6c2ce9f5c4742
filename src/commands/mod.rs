//! Command handlers for the minimarket CLI.
//!
//! This module contains implementations for all CLI subcommands.

mod alertas;
mod init;
mod session;
mod settings;
mod view;

use serde::Serialize;
use std::fmt::Debug;
use tracing::{debug, info};

pub use alertas::{alertas, AlertasOutput};
pub use init::init;
pub use session::{session_logout, session_show, session_start, SessionOutput};
pub use settings::{settings, SettingsOutput};
pub use view::{view, Format, ViewOutput};

/// The output type for a command. This allows the command to return a consistent message,
/// optionally structured data, and optionally a rendered document for stdout.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,

    /// A rendered table or document that is the command's actual output.
    #[serde(skip)]
    text: Option<String>,
}

impl<T, S> From<S> for Out<T>
where
    T: Debug + Clone + Serialize,
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Out::new_message(value)
    }
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
            text: None,
        }
    }

    /// Create a new `Out` object that has `None` for `structure`.
    pub fn new_message<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: None,
            text: None,
        }
    }

    /// Attach rendered output meant for stdout.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Get the `message`.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the structured data stored in `structure`.
    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Get the rendered output, if any.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Print the rendered output (if it exists) to stdout, the message to `info!` and the
    /// structured data (if it exists) as JSON to `debug!`.
    pub fn print(&self) {
        if let Some(text) = self.text() {
            println!("{text}");
        }
        info!("{}", self.message);
        if let Some(structure) = self.structure() {
            if let Ok(json) = serde_json::to_string_pretty(structure) {
                debug!("Command output:\n\n{json}\n\n");
            }
        }
    }
}
