// ABOUTME: Auth feature: sign-in, sign-up, and sign-out flows over the session store.
// ABOUTME: Holds form-level error state and the in-flight flag for the auth forms.

pub mod controller;
pub mod form;

pub use controller::{AuthController, AuthState};
pub use form::{PASSWORD_MISMATCH, RegisterForm};
