//! Account screens: registration and password change
//!
//! Neither talks to a backend. Registration validates the form and "submits"
//! for a fixed delay; password change walks email → verifying → code, with
//! any well-formed six-digit code accepted.

pub mod password;
pub mod register;

pub use password::{PasswordChange, PasswordStep, OTP_LENGTH};
pub use register::{password_checklist, FieldErrors, RegistrationForm, SignUp};
