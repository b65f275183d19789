use crate::view::selection::ResultSelection;

/// What the result area currently shows. Exactly one is active.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewState {
    Idle,
    Loading,
    Success(ResultSelection),
    Empty,
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewStateKind {
    Idle,
    Loading,
    Success,
    Empty,
    Error,
}

impl ViewState {
    pub fn kind(&self) -> ViewStateKind {
        match self {
            ViewState::Idle => ViewStateKind::Idle,
            ViewState::Loading => ViewStateKind::Loading,
            ViewState::Success(_) => ViewStateKind::Success,
            ViewState::Empty => ViewStateKind::Empty,
            ViewState::Error(_) => ViewStateKind::Error,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, ViewState::Loading)
    }

    pub fn selection(&self) -> Option<&ResultSelection> {
        match self {
            ViewState::Success(selection) => Some(selection),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            ViewState::Error(message) => Some(message),
            _ => None,
        }
    }
}

pub fn can_transition(from: ViewStateKind, to: ViewStateKind) -> bool {
    use ViewStateKind::*;
    matches!(
        (from, to),
        (Idle, Loading)
            | (Loading, Success)
            | (Loading, Empty)
            | (Loading, Error)
            | (Success, Success)
            | (Success, Loading)
            | (Empty, Loading)
            | (Error, Loading)
    )
}
