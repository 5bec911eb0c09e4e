//! Collaborator interfaces for fetching and importing remote subjects
//!
//! The store never talks HTTP itself. The embedding application provides a
//! [`SubjectClient`] (the remote API wrapper) and a [`SubjectImporter`]
//! (which materializes fetched subjects as item rows, normally by inserting
//! through the store and scheduling image downloads).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from the remote subject client.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("No network connection")]
    NoNetwork,

    #[error("Request failed: {0}")]
    RequestFailed(String),
}

/// Error from the synchronous subject importer.
#[derive(Error, Debug)]
#[error("Subject import failed: {0}")]
pub struct ImportError(pub String);

/// A subject as delivered by the remote service, before it becomes an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSubject {
    pub subject_id: String,
    pub zooniverse_id: Option<String>,
    pub group_id: Option<String>,
    pub location_standard: String,
    pub location_thumbnail: String,
    pub location_inverted: String,
}

/// Synchronous remote fetch of new subjects.
///
/// Timeouts are the client's own concern; callers only see success, an
/// empty result, or an error.
pub trait SubjectClient: Send + Sync {
    fn fetch_subjects(&self, count: usize) -> Result<Vec<RemoteSubject>, ClientError>;
}

/// Synchronous materialization of fetched subjects as items.
pub trait SubjectImporter: Send + Sync {
    fn import(&self, subjects: &[RemoteSubject]) -> Result<(), ImportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_subject_serde_round_trip() {
        let subject = RemoteSubject {
            subject_id: "AGZ0001".into(),
            zooniverse_id: Some("AGZ0001abc".into()),
            group_id: Some("sloan".into()),
            location_standard: "https://example.org/s.jpg".into(),
            location_thumbnail: "https://example.org/t.jpg".into(),
            location_inverted: "https://example.org/i.jpg".into(),
        };
        let json = serde_json::to_string(&subject).unwrap();
        let back: RemoteSubject = serde_json::from_str(&json).unwrap();
        assert_eq!(subject, back);
    }

    #[test]
    fn client_error_display() {
        assert_eq!(ClientError::NoNetwork.to_string(), "No network connection");
        assert!(ClientError::RequestFailed("503".into())
            .to_string()
            .contains("503"));
    }
}
