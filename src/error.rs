use thiserror::Error;

#[derive(Error, Debug)]
pub enum DraftError {
    #[error("Unknown champion: {0}")]
    UnknownChampion(String),

    #[error("Champion appears more than once in the draft: {0}")]
    DuplicateChampion(String),

    #[error("Invalid draft: {0}")]
    InvalidDraft(String),

    #[error("Invalid role: {0}. Use TOP, JUNGLE, MIDDLE, BOTTOM or UTILITY")]
    InvalidRole(String),

    #[error("Invalid team: {0}. Use blue or red")]
    InvalidTeam(String),

    #[error("Invalid ban mode: {0}. Use pro or soloq")]
    InvalidBanMode(String),

    #[error("Slot already filled: {team} {role}")]
    SlotAlreadyFilled { team: String, role: String },

    #[error("Win prediction unavailable: {0}")]
    PredictorUnavailable(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("JSON parsing error: {0}")]
    JsonError(String),
}
