//! Password prompts.

use anyhow::{Context, Result};
use inquire::validator::MinLengthValidator;
use inquire::{Password, PasswordDisplayMode};

use crate::secret::Secret;

pub struct Prompt {
    password_min_length: usize,
}

impl Prompt {
    pub fn new(password_min_length: usize) -> Self {
        Self { password_min_length }
    }

    /// Asks for the password a server will accept, entered twice.
    ///
    /// # Errors
    ///
    /// Returns an error if the prompt is cancelled or the entries differ.
    pub fn server_password(&self) -> Result<Secret> {
        self.ask("Shared password", true)
    }

    /// Asks for the password to seal an outgoing file with.
    ///
    /// # Errors
    ///
    /// Returns an error if the prompt is cancelled.
    pub fn client_password(&self) -> Result<Secret> {
        self.ask("Shared password", false)
    }

    fn ask(&self, message: &str, confirm: bool) -> Result<Secret> {
        let min = self.password_min_length;
        let mut prompt = Password::new(message)
            .with_display_mode(PasswordDisplayMode::Masked)
            .with_validator(MinLengthValidator::new(min).with_message(format!("password must be at least {min} characters")))
            .with_custom_confirmation_message("Confirm password")
            .with_custom_confirmation_error_message("passwords do not match");

        if !confirm {
            prompt = prompt.without_confirmation();
        }

        prompt.prompt().map(Secret::from_string).context("failed to read password")
    }
}
