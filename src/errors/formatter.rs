//! Markdown formatting for a failed task's work-tracker comment, grounded
//! on `original_source/errors/formatter.py`.

use super::categories::{categorize_error, ErrorCategory};

fn emoji(category: ErrorCategory) -> &'static str {
    match category {
        ErrorCategory::Configuration => "⚙️",
        ErrorCategory::Api => "🔌",
        ErrorCategory::Timeout => "⏱️",
        ErrorCategory::Tool => "🛠️",
        ErrorCategory::Validation => "❌",
        ErrorCategory::Internal => "💥",
        ErrorCategory::Network => "📡",
        ErrorCategory::Auth => "🔒",
    }
}

fn explanation(category: ErrorCategory) -> &'static str {
    match category {
        ErrorCategory::Configuration => "A required setting is missing or invalid.",
        ErrorCategory::Api => "The LLM provider's API returned an error.",
        ErrorCategory::Timeout => "An operation took too long and was aborted.",
        ErrorCategory::Tool => "A tool call failed during execution.",
        ErrorCategory::Validation => "Validation did not pass on the changes made.",
        ErrorCategory::Internal => "An unexpected internal error occurred.",
        ErrorCategory::Network => "A network request could not be completed.",
        ErrorCategory::Auth => "Authentication with an external service failed.",
    }
}

fn suggestions(category: ErrorCategory) -> &'static [&'static str] {
    match category {
        ErrorCategory::Configuration => &[
            "Check that all required environment variables are set.",
            "Verify the configuration file against the documented defaults.",
        ],
        ErrorCategory::Api => &[
            "Check the provider's status page for an ongoing incident.",
            "Confirm the configured model ID is still available.",
        ],
        ErrorCategory::Timeout => &[
            "Re-run the task; transient slowness often clears on retry.",
            "Consider raising the configured timeout for this operation.",
        ],
        ErrorCategory::Tool => &[
            "Review the tool's input arguments for correctness.",
            "Check that the tool's preconditions (e.g. file exists) were met.",
        ],
        ErrorCategory::Validation => &[
            "Review the validation output below for the specific failure.",
            "Re-run locally to reproduce before retrying the task.",
        ],
        ErrorCategory::Internal => &["Re-run the task; if this persists, file a bug with the technical details below."],
        ErrorCategory::Network => &["Check connectivity to the external service.", "Re-run the task after a short wait."],
        ErrorCategory::Auth => &["Verify the configured credentials are current and have the required scope."],
    }
}

/// Full markdown comment body: emoji header, explanation, bulleted
/// suggestions, and an optional collapsed technical-details block.
pub fn format_error_for_tracker(message: &str, error_type: Option<&str>, technical_details: Option<&str>) -> String {
    let category = categorize_error(message, error_type);
    let mut out = format!("## {} Task failed\n\n{}\n\n", emoji(category), explanation(category));

    out.push_str("**Suggestions:**\n");
    for suggestion in suggestions(category) {
        out.push_str(&format!("- {}\n", suggestion));
    }

    if let Some(details) = technical_details {
        out.push_str("\n<details>\n<summary>Technical details</summary>\n\n```\n");
        out.push_str(details);
        out.push_str("\n```\n\n</details>\n");
    }

    out.push_str("\n---\n*This comment was posted automatically by an autonomous coding agent.*\n");
    out
}

/// A single-line summary suitable for logs or a compact status update.
pub fn format_error_concise(message: &str, error_type: Option<&str>) -> String {
    let category = categorize_error(message, error_type);
    format!("{} {}: {}", emoji(category), explanation(category), message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracker_format_includes_emoji_and_suggestions() {
        let out = format_error_for_tracker("request timed out after 30s", None, None);
        assert!(out.contains("⏱️"));
        assert!(out.contains("**Suggestions:**"));
    }

    #[test]
    fn tracker_format_includes_collapsed_details_when_given() {
        let out = format_error_for_tracker("500 from provider", None, Some("stack trace here"));
        assert!(out.contains("<details>"));
        assert!(out.contains("stack trace here"));
    }

    #[test]
    fn concise_format_is_one_line() {
        let out = format_error_concise("401 Unauthorized", None);
        assert!(!out.contains('\n'));
    }
}
