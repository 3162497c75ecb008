//! Registration form validation and the simulated sign-up submit

use crate::flow::Route;
use crate::timeline::Timeline;
use log::info;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use std::time::Duration;

/// How long the fake sign-up request "takes".
pub const SUBMIT_DELAY: Duration = Duration::from_millis(1500);

pub struct Requirement {
    pub label: &'static str,
    test: fn(&str) -> bool,
}

pub const PASSWORD_REQUIREMENTS: &[Requirement] = &[
    Requirement {
        label: "At least 8 characters",
        test: |p| p.chars().count() >= 8,
    },
    Requirement {
        label: "Contains uppercase letter",
        test: |p| p.chars().any(|c| c.is_ascii_uppercase()),
    },
    Requirement {
        label: "Contains lowercase letter",
        test: |p| p.chars().any(|c| c.is_ascii_lowercase()),
    },
    Requirement {
        label: "Contains a number",
        test: |p| p.chars().any(|c| c.is_ascii_digit()),
    },
];

impl Requirement {
    pub fn is_met(&self, password: &str) -> bool {
        (self.test)(password)
    }
}

/// Checklist shown under the password field.
pub fn password_checklist(password: &str) -> Vec<(&'static str, bool)> {
    PASSWORD_REQUIREMENTS
        .iter()
        .map(|r| (r.label, r.is_met(password)))
        .collect()
}

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"\S+@\S+\.\S+").expect("static pattern"))
}

pub fn is_valid_email(email: &str) -> bool {
    email_pattern().is_match(email)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// One message per failing field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldErrors {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirm_password: Option<&'static str>,
}

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.password.is_none()
            && self.confirm_password.is_none()
    }
}

impl RegistrationForm {
    pub fn check_name(&self) -> Option<&'static str> {
        if self.name.trim().is_empty() {
            Some("Name is required")
        } else if self.name.chars().count() < 2 {
            Some("Name must be at least 2 characters")
        } else {
            None
        }
    }

    pub fn check_email(&self) -> Option<&'static str> {
        if self.email.is_empty() {
            Some("Email is required")
        } else if !is_valid_email(&self.email) {
            Some("Please enter a valid email")
        } else {
            None
        }
    }

    pub fn check_password(&self) -> Option<&'static str> {
        if self.password.is_empty() {
            Some("Password is required")
        } else if !PASSWORD_REQUIREMENTS.iter().all(|r| r.is_met(&self.password)) {
            Some("Password doesn't meet requirements")
        } else {
            None
        }
    }

    pub fn check_confirm(&self) -> Option<&'static str> {
        if self.confirm_password.is_empty() {
            Some("Please confirm your password")
        } else if self.confirm_password != self.password {
            Some("Passwords do not match")
        } else {
            None
        }
    }

    /// Every field at once, as on submit.
    pub fn validate(&self) -> FieldErrors {
        FieldErrors {
            name: self.check_name(),
            email: self.check_email(),
            password: self.check_password(),
            confirm_password: self.check_confirm(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Submitted;

/// Sign-up screen: validate, spin for [`SUBMIT_DELAY`], then go to login.
#[derive(Default)]
pub struct SignUp {
    timeline: Timeline<Submitted>,
    loading: bool,
}

impl SignUp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Start the fake request if the form is valid. Ignored while a request
    /// is already in flight.
    pub fn submit(&mut self, form: &RegistrationForm) -> Result<(), FieldErrors> {
        let errors = form.validate();
        if !errors.is_empty() {
            return Err(errors);
        }
        if !self.loading {
            info!("Registration submitted for {}", form.email);
            self.loading = true;
            self.timeline.set_timeout(SUBMIT_DELAY, Submitted);
        }
        Ok(())
    }

    pub fn advance(&mut self, dt: Duration) -> Option<Route> {
        let target = self.timeline.now() + dt;
        let done = self.timeline.pop_due(target).is_some();
        self.timeline.settle(target);
        if done {
            self.loading = false;
            self.timeline.cancel_all();
            return Some(Route::Login);
        }
        None
    }

    pub fn shutdown(&mut self) {
        self.timeline.cancel_all();
        self.loading = false;
    }
}
