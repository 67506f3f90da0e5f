//! Local input validation, run before anything touches the network.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ActionError;

pub const MIN_PASSWORD_LEN: usize = 8;

lazy_static::lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid");
}

/// Input checks an action runs before dispatching.
/// Richer external schema validators plug in by implementing this.
pub trait Validate {
    fn validate(&self) -> Result<(), ActionError>;
}

pub fn is_email(candidate: &str) -> bool {
    EMAIL_RE.is_match(candidate)
}

/// Sign-up form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterData {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl Validate for RegisterData {
    fn validate(&self) -> Result<(), ActionError> {
        let mut problems = Vec::new();
        if self.name.trim().is_empty() {
            problems.push("Name is required".to_string());
        }
        if !is_email(self.email.trim()) {
            problems.push("Please enter a valid email address".to_string());
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            problems.push(format!("Password must be at least {} characters", MIN_PASSWORD_LEN));
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ActionError::Validation(problems.join(", ")))
        }
    }
}
