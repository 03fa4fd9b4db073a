#[derive(Debug, PartialEq, Eq)]
pub enum BlacklistError {
    EmptyKey,
    InvalidKey(String),
}

impl std::fmt::Display for BlacklistError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlacklistError::EmptyKey => write!(f, "identifier must not be empty"),
            BlacklistError::InvalidKey(key) => {
                write!(f, "identifier {:?} must not contain whitespace", key)
            }
        }
    }
}

impl std::error::Error for BlacklistError {}

/// Rejects identifiers that could never match a request key.
pub fn validate_key(key: &str) -> Result<(), BlacklistError> {
    if key.trim().is_empty() {
        return Err(BlacklistError::EmptyKey);
    }
    if key.chars().any(char::is_whitespace) {
        return Err(BlacklistError::InvalidKey(key.to_string()));
    }
    Ok(())
}
