//! Common types for the client: model errors, the client error taxonomy and
//! user-facing notifications.

use alloc::string::String;

/// Errors returned when building board coordinates or piece codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SquareError {
    /// Row or column outside the 10x9 grid.
    OutOfBounds { row: u8, col: u8 },
    /// Piece code text is not `<side><kind>`.
    InvalidPieceCode,
}

impl core::fmt::Display for SquareError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SquareError::OutOfBounds { row, col } => {
                write!(f, "Square ({}, {}) is outside the board", row, col)
            }
            SquareError::InvalidPieceCode => write!(f, "Invalid piece code"),
        }
    }
}

/// Failure categories seen by the client while talking to the move authority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Input arrived while the board is locked or the game is over. No call is made.
    LocalValidation(&'static str),
    /// The authority refused the request and said why.
    RemoteRejection(String),
    /// No usable response: timeout, closed connection, malformed reply.
    TransportFailure(String),
    /// A poll answered while the opponent is still to move.
    StaleResponse,
}

impl core::fmt::Display for ClientError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ClientError::LocalValidation(why) => write!(f, "Input ignored: {}", why),
            ClientError::RemoteRejection(reason) => write!(f, "Rejected by authority: {}", reason),
            ClientError::TransportFailure(detail) => write!(f, "Transport failure: {}", detail),
            ClientError::StaleResponse => write!(f, "Stale response discarded"),
        }
    }
}

/// Transient message surfaced to the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// The authority refused a move; carries its reason verbatim.
    MoveRejected(String),
    /// The authority refused an undo.
    UndoRejected(String),
    /// Generic network failure. Details go to the log only.
    NetworkError,
}

impl Notification {
    /// Map a submission failure onto the notification shown to the player.
    /// Local validation and stale responses are silent.
    pub fn for_move_failure(err: &ClientError) -> Option<Self> {
        match err {
            ClientError::RemoteRejection(reason) => Some(Notification::MoveRejected(reason.clone())),
            ClientError::TransportFailure(_) => Some(Notification::NetworkError),
            ClientError::LocalValidation(_) | ClientError::StaleResponse => None,
        }
    }
}

impl core::fmt::Display for Notification {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Notification::MoveRejected(reason) => write!(f, "Move rejected: {}", reason),
            Notification::UndoRejected(reason) => write!(f, "Undo rejected: {}", reason),
            Notification::NetworkError => write!(f, "Network error, please try again"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn rejection_keeps_reason_verbatim() {
        let err = ClientError::RemoteRejection("Not your turn".to_string());
        assert_eq!(
            Notification::for_move_failure(&err),
            Some(Notification::MoveRejected("Not your turn".to_string()))
        );
    }

    #[test]
    fn transport_failure_is_generic() {
        let err = ClientError::TransportFailure("Receive timeout after 10s".to_string());
        let note = Notification::for_move_failure(&err).unwrap();
        assert_eq!(note, Notification::NetworkError);
        assert!(!note.to_string().contains("timeout"));
    }

    #[test]
    fn silent_categories_have_no_notification() {
        assert_eq!(Notification::for_move_failure(&ClientError::StaleResponse), None);
        assert_eq!(
            Notification::for_move_failure(&ClientError::LocalValidation("locked")),
            None
        );
    }
}
