use thiserror::Error;

use crate::overlay::gate::MediaSlot;

/// Problems with the query file. These are reported to the user directly and
/// never reach the view state machine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("Please choose an image to search with.")]
    NoFileSelected,
    #[error("Could not read '{path}': {message}")]
    Unreadable { path: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Network error: could not reach the search server ({0}). Check that the backend is running.")]
    Unreachable(String),
    #[error("The search server did not answer in time.")]
    Timeout,
    #[error("{}", status_message(.status, .detail))]
    Status { status: u16, detail: Option<String> },
}

fn status_message(status: &u16, detail: &Option<String>) -> String {
    match detail {
        Some(detail) => format!("Server error ({status}): {detail}"),
        None => format!("Server error: the search request failed with status {status}."),
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContractError {
    #[error("The server sent a response that could not be read: {0}")]
    MalformedPayload(String),
    #[error("Result #{index} is missing the '{field}' field.")]
    MissingField { index: usize, field: &'static str },
    #[error("Result #{index} has an invalid '{field}' value.")]
    InvalidField { index: usize, field: &'static str },
    #[error("Result #{index} has a negative timestamp ({value}).")]
    NegativeTimestamp { index: usize, value: f64 },
    #[error(
        "Result #{index} has {query} query keypoints but {matched} matched keypoints."
    )]
    KeypointCountMismatch {
        index: usize,
        query: usize,
        matched: usize,
    },
    #[error("Result #{index} has a matched frame that is not a base64 data URL.")]
    InvalidFrameData { index: usize },
}

/// Everything that turns a search into the `Error` view state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SearchError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Contract(#[from] ContractError),
    #[error("{0}")]
    Rejected(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ScaleError {
    #[error("native {axis} is {value}; media metadata must be loaded before scaling")]
    NonPositiveNative { axis: Axis, value: f64 },
    #[error("display {axis} is {value}; expected a finite, non-negative size")]
    InvalidDisplay { axis: Axis, value: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Width,
    Height,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::Width => f.write_str("width"),
            Axis::Height => f.write_str("height"),
        }
    }
}

/// Rendering was attempted before both media were ready. Reaching this means
/// the readiness gate let a render through too early.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum RenderPreconditionError {
    #[error("{0:?} has no native dimensions yet")]
    MediaNotReady(MediaSlot),
    #[error("{0:?} is not laid out (display size is zero)")]
    NotLaidOut(MediaSlot),
    #[error("{slot:?}: {source}")]
    Scale {
        slot: MediaSlot,
        #[source]
        source: ScaleError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("the result set is empty")]
    EmptyResultSet,
    #[error("result index {index} is out of range (0..{len})")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("there are no results to select from")]
    NoActiveResults,
}
