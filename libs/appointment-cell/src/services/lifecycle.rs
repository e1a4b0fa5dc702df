// libs/appointment-cell/src/services/lifecycle.rs
use tracing::{debug, info, warn};

use crate::models::{
    fields, AppointmentError, AppointmentState, BookingError, CancelRequest, FieldErrorMap,
    StateDisplay,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleAction {
    Reschedule,
    Cancel,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AppointmentLifecycleService;

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    /// Resolve the state an action leads to, or reject it for the current state.
    pub fn validate_transition(
        &self,
        current_state: AppointmentState,
        action: LifecycleAction,
    ) -> Result<AppointmentState, AppointmentError> {
        debug!("Validating {:?} from state {:?}", action, current_state);

        if current_state.is_terminal() {
            warn!("Attempted {:?} on a {:?} appointment", action, current_state);
            return Err(AppointmentError::InvalidStateTransition(current_state));
        }

        let next_state = match action {
            LifecycleAction::Reschedule => AppointmentState::Rescheduled,
            LifecycleAction::Cancel => AppointmentState::Cancelled,
        };

        if !self.get_valid_transitions(current_state).contains(&next_state) {
            warn!("Invalid state transition attempted: {:?} -> {:?}", current_state, next_state);
            return Err(AppointmentError::InvalidStateTransition(current_state));
        }

        info!("State transition validated: {:?} -> {:?}", current_state, next_state);
        Ok(next_state)
    }

    /// Get all states reachable through this crate's operations.
    pub fn get_valid_transitions(&self, current_state: AppointmentState) -> Vec<AppointmentState> {
        match current_state {
            AppointmentState::Scheduled => vec![
                AppointmentState::Rescheduled,
                AppointmentState::Cancelled,
            ],
            // Rescheduling again keeps the appointment in Rescheduled
            AppointmentState::Rescheduled => vec![
                AppointmentState::Rescheduled,
                AppointmentState::Cancelled,
            ],
            // Terminal states - no transitions allowed
            AppointmentState::Cancelled => vec![],
            AppointmentState::Completed => vec![],
        }
    }

    /// A cancellation needs the note field, even if it is empty.
    pub fn validate_cancellation(
        &self,
        current_state: AppointmentState,
        request: &CancelRequest,
    ) -> Result<String, AppointmentError> {
        self.validate_transition(current_state, LifecycleAction::Cancel)?;

        request.note.clone().ok_or_else(|| {
            FieldErrorMap::single(fields::NOTE, BookingError::MissingField(fields::NOTE.to_string())).into()
        })
    }

    /// Label and color for every state, in lifecycle order.
    pub fn legend(&self) -> Vec<StateDisplay> {
        AppointmentState::ALL.iter().map(AppointmentState::display).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_reschedule_transitions() {
        let lifecycle = AppointmentLifecycleService::new();

        assert_eq!(
            lifecycle.validate_transition(AppointmentState::Scheduled, LifecycleAction::Reschedule).unwrap(),
            AppointmentState::Rescheduled
        );
        assert_eq!(
            lifecycle.validate_transition(AppointmentState::Rescheduled, LifecycleAction::Reschedule).unwrap(),
            AppointmentState::Rescheduled
        );
    }

    #[test]
    fn test_terminal_states_reject_everything() {
        let lifecycle = AppointmentLifecycleService::new();

        for state in [AppointmentState::Cancelled, AppointmentState::Completed] {
            for action in [LifecycleAction::Reschedule, LifecycleAction::Cancel] {
                assert_matches!(
                    lifecycle.validate_transition(state, action),
                    Err(AppointmentError::InvalidStateTransition(s)) if s == state
                );
            }
            assert!(lifecycle.get_valid_transitions(state).is_empty());
        }
    }

    #[test]
    fn test_terminal_states_have_no_transitions() {
        let lifecycle = AppointmentLifecycleService::new();
        for state in AppointmentState::ALL {
            assert_eq!(state.is_terminal(), lifecycle.get_valid_transitions(state).is_empty(), "{:?}", state);
        }
    }

    #[test]
    fn test_completed_is_never_reachable() {
        let lifecycle = AppointmentLifecycleService::new();
        for state in AppointmentState::ALL {
            assert!(!lifecycle.get_valid_transitions(state).contains(&AppointmentState::Completed));
        }
    }

    #[test]
    fn test_cancellation_requires_note_field() {
        let lifecycle = AppointmentLifecycleService::new();

        let missing = lifecycle.validate_cancellation(AppointmentState::Scheduled, &CancelRequest { note: None });
        assert_matches!(missing, Err(AppointmentError::Validation(errors))
            if errors.get("note") == Some(&BookingError::MissingField("note".to_string())));

        let empty = lifecycle.validate_cancellation(
            AppointmentState::Rescheduled,
            &CancelRequest { note: Some(String::new()) },
        );
        assert_eq!(empty.unwrap(), "");
    }

    #[test]
    fn test_legend_covers_all_states() {
        let legend = AppointmentLifecycleService::new().legend();
        assert_eq!(legend.len(), 4);
        assert_eq!(legend[1].label, "Reprogramada");
    }
}
