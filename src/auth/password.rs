//! Password change: email → verifying → one-time code

use crate::error::{FlowError, Result};
use crate::timeline::Timeline;
use log::{debug, info};
use serde::Serialize;
use std::time::Duration;

pub const OTP_LENGTH: usize = 6;

/// How long the "verifying your email" spinner shows.
pub const VERIFY_DELAY: Duration = Duration::from_millis(4000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PasswordStep {
    Email,
    Verifying,
    Otp,
    Done,
}

impl PasswordStep {
    pub fn description(&self) -> &'static str {
        match self {
            PasswordStep::Email => "Enter your email to receive an OTP",
            PasswordStep::Verifying => "Verifying your email address",
            PasswordStep::Otp => "Enter the verification code sent to your email",
            PasswordStep::Done => "Your identity has been verified",
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Verified;

#[derive(Debug, Clone, Serialize)]
pub struct PasswordSnapshot {
    pub step: PasswordStep,
    pub email: String,
    pub description: &'static str,
}

pub struct PasswordChange {
    step: PasswordStep,
    email: String,
    timeline: Timeline<Verified>,
}

impl Default for PasswordChange {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordChange {
    pub fn new() -> Self {
        Self {
            step: PasswordStep::Email,
            email: String::new(),
            timeline: Timeline::new(),
        }
    }

    pub fn step(&self) -> PasswordStep {
        self.step
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// "Proceed" is disabled for a blank email.
    pub fn submit_email(&mut self, email: &str) -> Result<()> {
        if self.step != PasswordStep::Email {
            return Err(FlowError::InvalidState(format!(
                "cannot submit an email while {:?}",
                self.step
            )));
        }
        let email = email.trim();
        if email.is_empty() {
            return Err(FlowError::Validation {
                file: "email".into(),
                reason: "Email is required".into(),
            });
        }
        self.email = email.to_string();
        self.step = PasswordStep::Verifying;
        self.timeline.set_timeout(VERIFY_DELAY, Verified);
        debug!("Verifying {}", self.email);
        Ok(())
    }

    pub fn advance(&mut self, dt: Duration) {
        let target = self.timeline.now() + dt;
        while self.timeline.pop_due(target).is_some() {
            if self.step == PasswordStep::Verifying {
                self.step = PasswordStep::Otp;
            }
        }
        self.timeline.settle(target);
    }

    /// Any code of exactly [`OTP_LENGTH`] digits is accepted.
    pub fn submit_otp(&mut self, code: &str) -> Result<()> {
        if self.step != PasswordStep::Otp {
            return Err(FlowError::InvalidState(format!(
                "no code expected while {:?}",
                self.step
            )));
        }
        let code = code.trim();
        if code.len() != OTP_LENGTH || !code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(FlowError::InvalidOtp(OTP_LENGTH));
        }
        info!("Verification code accepted for {}", self.email);
        self.step = PasswordStep::Done;
        Ok(())
    }

    /// "Change email": back to the first step, dropping any pending timer.
    pub fn change_email(&mut self) {
        self.timeline.cancel_all();
        self.step = PasswordStep::Email;
    }

    pub fn shutdown(&mut self) {
        self.timeline.cancel_all();
    }

    pub fn snapshot(&self) -> PasswordSnapshot {
        PasswordSnapshot {
            step: self.step,
            email: self.email.clone(),
            description: self.step.description(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at_otp() -> PasswordChange {
        let mut p = PasswordChange::new();
        p.submit_email("me@example.com").unwrap();
        p.advance(VERIFY_DELAY);
        p
    }

    #[test]
    fn test_blank_email_rejected() {
        let mut p = PasswordChange::new();
        assert!(p.submit_email("   ").is_err());
        assert_eq!(p.step(), PasswordStep::Email);
    }

    #[test]
    fn test_verifying_lasts_four_seconds() {
        let mut p = PasswordChange::new();
        p.submit_email("me@example.com").unwrap();
        assert_eq!(p.step(), PasswordStep::Verifying);
        p.advance(Duration::from_millis(3999));
        assert_eq!(p.step(), PasswordStep::Verifying);
        p.advance(Duration::from_millis(1));
        assert_eq!(p.step(), PasswordStep::Otp);
    }

    #[test]
    fn test_otp_length_and_digits() {
        let mut p = at_otp();
        assert!(matches!(p.submit_otp("12345"), Err(FlowError::InvalidOtp(6))));
        assert!(p.submit_otp("12a456").is_err());
        assert!(p.submit_otp("1234567").is_err());
        assert_eq!(p.step(), PasswordStep::Otp);
        p.submit_otp("123456").unwrap();
        assert_eq!(p.step(), PasswordStep::Done);
    }

    #[test]
    fn test_change_email_cancels_verification() {
        let mut p = PasswordChange::new();
        p.submit_email("me@example.com").unwrap();
        p.change_email();
        p.advance(Duration::from_secs(10));
        assert_eq!(p.step(), PasswordStep::Email);
    }

    #[test]
    fn test_otp_before_verification_rejected() {
        let mut p = PasswordChange::new();
        assert!(matches!(p.submit_otp("123456"), Err(FlowError::InvalidState(_))));
    }
}
