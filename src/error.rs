//! Error types for the planner

use thiserror::Error;

/// A recipe tree that cannot be turned into a consistent build path
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralError {
    #[error("option group at {location} has no members")]
    EmptyGroup { location: String },

    #[error("option group at {location} has no selected member")]
    UnresolvedGroup { location: String },

    #[error("node at {location} has neither a name nor a tag")]
    MissingIdentity { location: String },
}

/// A selection toggle that does not address an option group in the tree
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("no recipe tree has been loaded")]
    NoTree,

    #[error("step {step} of the selection path does not resolve")]
    InvalidStep { step: usize },

    #[error("selection path does not end at an option group")]
    NotAGroup,

    #[error("choice {choice} is out of range for a group of {len}")]
    ChoiceOutOfRange { choice: usize, len: usize },

    #[error("no alternative named `{0}` on the selected build path")]
    UnknownAlternative(String),

    #[error(transparent)]
    Structural(#[from] StructuralError),
}

/// Failure talking to the recipe service
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("could not decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("could not build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("recipe service unavailable: {0}")]
    Unavailable(String),
}

/// Errors surfaced by session operations
///
/// Superseded requests are not errors; they report `Outcome::Superseded`.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Structural(#[from] StructuralError),

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

pub type SessionResult<T> = Result<T, SessionError>;
