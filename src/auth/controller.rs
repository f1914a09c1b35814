// ABOUTME: Auth controller: drives login, register, and logout against the auth API.
// ABOUTME: Success updates the session and navigates home; logout never fails for the user.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::api::{ApiError, AuthApi, AuthResponse, LoginRequest};
use crate::flight::InFlight;
use crate::navigation::{Navigator, Route};
use crate::session::{Session, SessionStore};

use super::form::RegisterForm;

/// Form-level state of the auth screens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthState {
    pub in_flight: bool,
    pub error: Option<String>,
    pub field_errors: BTreeMap<String, String>,
}

pub struct AuthController {
    api: Arc<dyn AuthApi>,
    session: Arc<SessionStore>,
    navigator: Arc<dyn Navigator>,
    state: Mutex<AuthState>,
}

impl AuthController {
    pub fn new(
        api: Arc<dyn AuthApi>,
        session: Arc<SessionStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            api,
            session,
            navigator,
            state: Mutex::new(AuthState::default()),
        }
    }

    /// Sign in. Returns true on success.
    pub async fn login(&self, request: LoginRequest) -> bool {
        let _flight = self.begin();
        let result = self.api.login(&request).await;
        self.complete(result)
    }

    /// Sign up after checking the form locally. Returns true on success.
    pub async fn register(&self, form: &RegisterForm) -> bool {
        let request = match form.validate() {
            Ok(request) => request,
            Err(message) => {
                let mut state = self.lock_state();
                state.field_errors.clear();
                state.error = Some(message.to_string());
                return false;
            }
        };

        let _flight = self.begin();
        let result = self.api.register(&request).await;
        self.complete(result)
    }

    /// Sign out. A failing remote call is ignored: the local session is
    /// always cleared and the user is sent to the sign-in screen.
    pub async fn logout(&self) {
        {
            let _flight = self.begin();
            if let Err(e) = self.api.logout().await {
                tracing::debug!(error = %e, "ignoring logout failure");
            }
            self.session.clear_auth();
        }
        self.navigator.navigate(Route::Login);
    }

    /// Snapshot of the form state.
    pub fn state(&self) -> AuthState {
        self.lock_state().clone()
    }

    pub fn session(&self) -> Arc<Session> {
        self.session.snapshot()
    }

    /// True while a request is in flight or the session is still hydrating.
    pub fn is_loading(&self) -> bool {
        self.lock_state().in_flight || self.session.snapshot().is_loading
    }

    pub fn error(&self) -> Option<String> {
        self.lock_state().error.clone()
    }

    pub fn field_errors(&self) -> BTreeMap<String, String> {
        self.lock_state().field_errors.clone()
    }

    pub fn clear_errors(&self) {
        let mut state = self.lock_state();
        state.error = None;
        state.field_errors.clear();
    }

    fn begin(&self) -> InFlight<'_, AuthState, impl FnMut(&mut AuthState)> {
        InFlight::begin(
            &self.state,
            |s: &mut AuthState| {
                s.in_flight = true;
                s.error = None;
                s.field_errors.clear();
            },
            |s: &mut AuthState| s.in_flight = false,
        )
    }

    fn complete(&self, result: Result<AuthResponse, ApiError>) -> bool {
        match result {
            Ok(response) => {
                self.session.set_auth(response.user, response.access_token);
                self.navigator.navigate(Route::Home);
                true
            }
            Err(e) => {
                tracing::debug!(error = %e, "auth request failed");
                self.record_error(&e);
                false
            }
        }
    }

    /// Field errors win over the banner message when the server sends both.
    fn record_error(&self, error: &ApiError) {
        let fields = error.field_errors();
        let mut state = self.lock_state();
        if fields.is_empty() {
            state.error = Some(error.user_message());
        } else {
            state.field_errors = fields;
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, AuthState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
