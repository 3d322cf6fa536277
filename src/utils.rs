//! Utility functions and helpers.

pub mod browser;
pub mod clipboard;
pub mod preflight;

pub use browser::open_browser;
pub use clipboard::copy_to_clipboard;
pub use preflight::{
    check_ai_credentials, check_git_repository, check_staged_changes, AiCredentialInfo,
};
