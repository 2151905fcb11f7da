// Model gateway state
// Tracks which model capabilities are loaded and what the UI should show.
// Author: kelexine (https://github.com/kelexine)

use super::{TextClassifier, TextGenerator};
use std::fmt;
use std::sync::Arc;

/// Lifecycle of the gateway's models
#[derive(Clone, Default)]
pub enum ModelHandle {
    #[default]
    Absent,
    Loading,
    /// At least one of the two capabilities is present.
    Ready {
        classifier: Option<Arc<dyn TextClassifier>>,
        generator: Option<Arc<dyn TextGenerator>>,
    },
    Failed(String),
}

impl ModelHandle {
    pub fn state(&self) -> GatewayState {
        match self {
            ModelHandle::Absent => GatewayState::Absent,
            ModelHandle::Loading => GatewayState::Loading,
            ModelHandle::Ready { .. } => GatewayState::Ready,
            ModelHandle::Failed(_) => GatewayState::Failed,
        }
    }
}

impl fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelHandle::Absent => f.write_str("Absent"),
            ModelHandle::Loading => f.write_str("Loading"),
            ModelHandle::Ready {
                classifier,
                generator,
            } => f
                .debug_struct("Ready")
                .field("classifier", &classifier.is_some())
                .field("generator", &generator.is_some())
                .finish(),
            ModelHandle::Failed(reason) => f.debug_tuple("Failed").field(reason).finish(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayState {
    Absent,
    Loading,
    Ready,
    Failed,
}

impl GatewayState {
    pub const ALL: [GatewayState; 4] = [
        GatewayState::Absent,
        GatewayState::Loading,
        GatewayState::Ready,
        GatewayState::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GatewayState::Absent => "absent",
            GatewayState::Loading => "loading",
            GatewayState::Ready => "ready",
            GatewayState::Failed => "failed",
        }
    }
}

/// Snapshot shown by the UI: state, overall load percentage and a status line
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayStatus {
    pub state: GatewayState,
    pub percent: u8,
    pub message: String,
}

impl Default for GatewayStatus {
    fn default() -> Self {
        Self {
            state: GatewayState::Absent,
            percent: 0,
            message: "AI Limited".to_string(),
        }
    }
}
