//! Console prompt host backed by dialoguer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use colored::Colorize;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Select};

use helpdesk_core::{HostError, PromptHost};

/// Interactive console host.
///
/// Prompts render through dialoguer; the interrupt flag set by the Ctrl+C
/// handler (or an escape inside a prompt) turns into abandonment.
pub struct ConsoleHost {
    interrupted: Arc<AtomicBool>,
    theme: ColorfulTheme,
}

impl ConsoleHost {
    pub fn new(interrupted: Arc<AtomicBool>) -> Self {
        Self {
            interrupted,
            theme: ColorfulTheme::default(),
        }
    }

    fn check_interrupted(&self) -> Result<(), HostError> {
        if self.interrupted.load(Ordering::SeqCst) {
            return Err(HostError::Closed);
        }
        Ok(())
    }
}

fn map_dialoguer(err: dialoguer::Error) -> HostError {
    match err {
        dialoguer::Error::IO(io) if io.kind() == std::io::ErrorKind::Interrupted => {
            HostError::Closed
        }
        dialoguer::Error::IO(io) => HostError::Io(io),
    }
}

#[async_trait]
impl PromptHost for ConsoleHost {
    async fn choose(&self, prompt: &str, options: &[&str]) -> Result<String, HostError> {
        self.check_interrupted()?;
        let selection = Select::with_theme(&self.theme)
            .with_prompt(prompt)
            .items(options)
            .default(0)
            .interact_opt()
            .map_err(map_dialoguer)?;
        match selection {
            Some(index) => Ok(options[index].to_string()),
            None => Err(HostError::Closed),
        }
    }

    async fn ask(&self, prompt: &str) -> Result<String, HostError> {
        self.check_interrupted()?;
        // Blank answers pass through; the flow decides whether to re-prompt.
        let input: String = Input::with_theme(&self.theme)
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()
            .map_err(map_dialoguer)?;
        Ok(input)
    }

    async fn confirm(&self, prompt: &str) -> Result<bool, HostError> {
        self.check_interrupted()?;
        Confirm::with_theme(&self.theme)
            .with_prompt(prompt)
            .interact()
            .map_err(map_dialoguer)
    }

    async fn tell(&self, message: &str) -> Result<(), HostError> {
        println!("{}", message.bright_white());
        Ok(())
    }
}
