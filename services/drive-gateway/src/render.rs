//! HTML fragments returned by the routes
//!
//! Everything interpolated from Google or configuration is escaped.

use drive_api::DriveFile;

pub const NO_CODE: &str = "No code provided";
pub const AUTH_SUCCESS: &str = "Authentication successful! You can now call the Drive API. Try <a href=\"/list-files\">listing your files</a>.";
pub const AUTH_FAILURE: &str = "Error during authentication";
pub const NOT_AUTHENTICATED: &str = "Not authenticated. Go to <a href=\"/\">authorize</a> first.";
pub const NO_FILES: &str = "No files found.";
pub const LIST_FAILURE: &str = "Failed to retrieve files.";

/// Shown when a listed file carries no owner email.
const UNKNOWN_OWNER: &str = "unknown";

/// Escapes text for HTML display.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

pub fn authorize_link(auth_url: &str) -> String {
    format!("<a href=\"{}\">Authorize with Google</a>", html_escape(auth_url))
}

/// File listing in the order Drive returned it.
pub fn file_list(files: &[DriveFile]) -> String {
    if files.is_empty() {
        return NO_FILES.to_string();
    }

    let items: String = files
        .iter()
        .map(|file| {
            format!(
                "<li>{} (ID: {}) - Owner: {}</li>",
                html_escape(&file.name),
                html_escape(&file.id),
                html_escape(file.owner_email().unwrap_or(UNKNOWN_OWNER)),
            )
        })
        .collect();
    format!("<h2>Your Files:</h2><ul>{items}</ul>")
}

pub fn transfer_success(file_id: &str, new_owner: &str) -> String {
    format!(
        "✅ Ownership of file {} successfully transferred to {}",
        html_escape(file_id),
        html_escape(new_owner)
    )
}

pub fn transfer_failure(error: &str) -> String {
    format!("❌ Error during ownership transfer: {}", html_escape(error))
}
