use std::error::Error;
use std::fmt;
use std::path::PathBuf;

use uuid::Uuid;

use super::EntityKind;

#[derive(Debug)]
pub enum StoreError {
    Io { path: PathBuf, source: std::io::Error },
    Json { path: PathBuf, source: serde_json::Error },
    NotFound { kind: EntityKind, id: Uuid },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io { path, source } => {
                write!(f, "I/O error on '{}': {}", path.display(), source)
            }
            StoreError::Json { path, source } => {
                write!(f, "invalid JSON document '{}': {}", path.display(), source)
            }
            StoreError::NotFound { kind, id } => write!(f, "{} {} not found", kind, id),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            StoreError::Io { source, .. } => Some(source),
            StoreError::Json { source, .. } => Some(source),
            StoreError::NotFound { .. } => None,
        }
    }
}
