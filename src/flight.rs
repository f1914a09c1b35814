// ABOUTME: In-flight flag guard for network round-trips.
// ABOUTME: Sets a state flag on begin and always resets it on drop, whatever the outcome.

use std::sync::{Mutex, PoisonError};

/// Resets a flag in `S` when dropped, so an early return, an error, or a
/// cancelled future can never leave the flag stuck at `true`.
pub struct InFlight<'a, S, F>
where
    F: FnMut(&mut S),
{
    state: &'a Mutex<S>,
    reset: Option<F>,
}

impl<'a, S, F> InFlight<'a, S, F>
where
    F: FnMut(&mut S),
{
    /// Apply `set` now and `reset` when the guard drops.
    pub fn begin(state: &'a Mutex<S>, set: impl FnOnce(&mut S), reset: F) -> Self {
        {
            let mut guard = state.lock().unwrap_or_else(PoisonError::into_inner);
            set(&mut *guard);
        }
        Self {
            state,
            reset: Some(reset),
        }
    }
}

impl<S, F> Drop for InFlight<'_, S, F>
where
    F: FnMut(&mut S),
{
    fn drop(&mut self) {
        if let Some(mut reset) = self.reset.take() {
            let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            reset(&mut *guard);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct State {
        loading: bool,
    }

    fn failing(state: &Mutex<State>) -> Result<(), String> {
        let _guard = InFlight::begin(
            state,
            |s: &mut State| s.loading = true,
            |s: &mut State| s.loading = false,
        );
        assert!(state.lock().unwrap().loading);
        Err("boom".to_string())
    }

    #[test]
    fn flag_resets_on_error_path() {
        let state = Mutex::new(State::default());
        assert!(failing(&state).is_err());
        assert!(!state.lock().unwrap().loading);
    }
}
