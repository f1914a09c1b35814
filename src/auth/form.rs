// ABOUTME: Sign-up form input with local validation.
// ABOUTME: Password confirmation is checked before any request is made.

use crate::api::RegisterRequest;

pub const PASSWORD_MISMATCH: &str = "Passwords do not match";

/// Raw values entered in the sign-up form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegisterForm {
    /// Check the form locally and build the request body.
    pub fn validate(&self) -> Result<RegisterRequest, &'static str> {
        if self.password != self.confirm_password {
            return Err(PASSWORD_MISMATCH);
        }
        Ok(RegisterRequest {
            name: self.name.clone(),
            email: self.email.clone(),
            password: self.password.clone(),
        })
    }
}
