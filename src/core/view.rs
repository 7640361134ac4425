//! Presentation projection
//!
//! The UI itself is an external collaborator; this module only decides which
//! control surface it should render for a given session and recording state.

use crate::core::avatar::SessionState;

/// What the page shows for the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlSurface {
    /// Configuration form plus the start button.
    Configuration,
    /// Loading indicator while the session connects.
    Connecting,
    /// Live session with the record/stop controls.
    Session {
        record_enabled: bool,
        stop_enabled: bool,
    },
}

impl ControlSurface {
    pub fn for_state(session: SessionState, recording: bool) -> Self {
        match session {
            SessionState::Inactive => ControlSurface::Configuration,
            SessionState::Connecting => ControlSurface::Connecting,
            SessionState::Connected => ControlSurface::Session {
                record_enabled: !recording,
                stop_enabled: recording,
            },
        }
    }
}
