use thiserror::Error;

/// Failure taxonomy for the realtime pipeline.
///
/// Every variant is contained at the boundary of the component that
/// produced it: a failed send removes one connection, a failed
/// transcription drops one event, a failed translation falls back to the
/// source text for that language. None of these abort the processing
/// loop or another participant's pipeline.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The connection's outbound queue is gone (client disconnected)
    #[error("connection closed for participant {0}")]
    ConnectionClosed(String),

    /// Strict mode only: the participant already has a live connection
    #[error("participant {0} is already connected")]
    DuplicateParticipant(String),

    /// Late-arriving event for a session that has ended
    #[error("session {0} not found")]
    SessionNotFound(String),

    #[error("transcription failed: {0}")]
    Transcription(String),

    #[error("translation to {language} failed: {reason}")]
    Translation { language: String, reason: String },

    /// Transport-level failure talking to an external collaborator
    #[error("collaborator request failed: {0}")]
    Collaborator(String),
}

pub type RelayResult<T> = Result<T, RelayError>;
