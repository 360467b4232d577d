use std::fmt;

/// A state-machine event that is not allowed in the current state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionError {
    pub msg: String,
}

impl TransitionError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { msg: msg.into() }
    }
}

impl fmt::Display for TransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid transition: {}", self.msg)
    }
}

impl std::error::Error for TransitionError {}
