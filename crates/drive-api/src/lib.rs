//! Google Drive v3 client
//!
//! Covers the handful of calls the gateway makes: listing files and the
//! permission create / update / delete used for ownership transfer. Every
//! call takes the caller's access token; the client holds no credentials.
//!
//! `DriveApi` is the seam the gateway depends on, so the gateway can be
//! exercised against an in-process fake instead of Google.

pub mod client;
pub mod error;
pub mod types;

pub use client::{DRIVE_API_BASE, DriveClient};
pub use error::{Error, Result};
pub use types::{DEFAULT_LIST_FIELDS, DriveFile, ListQuery, NewPermission, Permission, User};

use std::future::Future;
use std::pin::Pin;

/// Drive operations used by the gateway.
///
/// Uses `Pin<Box<dyn Future>>` return types for dyn-compatibility (`Arc<dyn DriveApi>`).
pub trait DriveApi: Send + Sync {
    /// `files.list` with the given page size and field mask.
    ///
    /// Files come back in the order Drive reported them.
    fn list_files<'a>(
        &'a self,
        access_token: &'a str,
        query: &'a ListQuery,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<DriveFile>>> + Send + 'a>>;

    /// `permissions.create`, returning the new permission (at least its id).
    fn create_permission<'a>(
        &'a self,
        access_token: &'a str,
        file_id: &'a str,
        permission: &'a NewPermission,
    ) -> Pin<Box<dyn Future<Output = Result<Permission>> + Send + 'a>>;

    /// `permissions.update` to `role=owner` with `transferOwnership=true`.
    fn transfer_ownership<'a>(
        &'a self,
        access_token: &'a str,
        file_id: &'a str,
        permission_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Permission>> + Send + 'a>>;

    /// `permissions.delete`.
    fn delete_permission<'a>(
        &'a self,
        access_token: &'a str,
        file_id: &'a str,
        permission_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;
}
