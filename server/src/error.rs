use shared::{BoardError, ErrorCode, BOARD_SIZE};
use thiserror::Error;

/// Recoverable failures reported back to the caller of a registry operation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("game {0} not found")]
    NotFound(String),
    #[error(transparent)]
    Board(#[from] BoardError),
    #[error("cell index {0} is outside the board (0..{})", BOARD_SIZE)]
    InvalidIndex(i64),
    #[error("no word list named {0}")]
    UnknownWordList(String),
}

impl RegistryError {
    pub fn code(&self) -> ErrorCode {
        match self {
            RegistryError::NotFound(_) => ErrorCode::NotFound,
            RegistryError::Board(BoardError::InsufficientWords { .. }) => ErrorCode::TooFewWords,
            RegistryError::InvalidIndex(_) => ErrorCode::InvalidIndex,
            RegistryError::UnknownWordList(_) => ErrorCode::UnknownWordList,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            RegistryError::NotFound("abc".into()).code(),
            ErrorCode::NotFound
        );
        assert_eq!(RegistryError::InvalidIndex(25).code(), ErrorCode::InvalidIndex);

        let err: RegistryError = BoardError::InsufficientWords {
            required: BOARD_SIZE,
            available: 3,
        }
        .into();
        assert_eq!(err.code(), ErrorCode::TooFewWords);
        assert_eq!(
            err.to_string(),
            "a word list must have at least 25 distinct words, got 3"
        );
    }

    #[test]
    fn test_invalid_index_message() {
        assert_eq!(
            RegistryError::InvalidIndex(-1).to_string(),
            "cell index -1 is outside the board (0..25)"
        );
    }
}
