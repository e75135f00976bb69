//! Error categorization and user-facing formatting, supplementing the core
//! `crate::error::Error` taxonomy with the richer, tracker-facing messages
//! §7 describes. Grounded on `original_source/errors/{categories,formatter}.py`.

pub mod categories;
pub mod formatter;

pub use categories::{categorize_error, ErrorCategory};
pub use formatter::{format_error_concise, format_error_for_tracker};
