//! Drive v3 request and response shapes (only the fields this gateway reads)

use serde::{Deserialize, Serialize};

/// Field mask that asks for exactly what the file listing renders.
pub const DEFAULT_LIST_FIELDS: &str = "files(id, name, owners(emailAddress))";

/// A file entry from `files.list`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub owners: Vec<User>,
}

impl DriveFile {
    /// Email of the first listed owner.
    ///
    /// Absent for files in shared drives, or when the field mask did not
    /// request `owners(emailAddress)`.
    pub fn owner_email(&self) -> Option<&str> {
        self.owners.first()?.email_address.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default)]
    pub email_address: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FileList {
    #[serde(default)]
    pub files: Vec<DriveFile>,
}

/// Parameters for `files.list`.
#[derive(Debug, Clone)]
pub struct ListQuery {
    pub page_size: u32,
    pub fields: String,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page_size: 10,
            fields: DEFAULT_LIST_FIELDS.into(),
        }
    }
}

/// Body for `permissions.create`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPermission {
    #[serde(rename = "type")]
    pub kind: String,
    pub role: String,
    pub email_address: String,
}

impl NewPermission {
    /// Writer access for a single user, the first step of an ownership transfer.
    pub fn user_writer(email: impl Into<String>) -> Self {
        Self {
            kind: "user".into(),
            role: "writer".into(),
            email_address: email.into(),
        }
    }
}

/// A permission resource as returned by create/update.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Permission {
    pub id: String,
    #[serde(default)]
    pub role: Option<String>,
}

/// Google's JSON error envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorDetail {
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_list_parses_owner_email() {
        let list: FileList = serde_json::from_str(
            r#"{"files":[
                {"id":"1","name":"a.txt","owners":[{"emailAddress":"me@example.com","displayName":"Me"}]},
                {"id":"2","name":"shared"}
            ]}"#,
        )
        .unwrap();

        assert_eq!(list.files.len(), 2);
        assert_eq!(list.files[0].owner_email(), Some("me@example.com"));
        assert_eq!(list.files[1].owner_email(), None);
    }

    #[test]
    fn missing_files_key_means_empty() {
        let list: FileList = serde_json::from_str("{}").unwrap();
        assert!(list.files.is_empty());
    }

    #[test]
    fn new_permission_serializes_drive_field_names() {
        let json = serde_json::to_value(NewPermission::user_writer("new@example.com")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "user", "role": "writer", "emailAddress": "new@example.com"})
        );
    }
}
