//! Sequential substring-match error categorization, grounded on
//! `original_source/errors/categories.py`.

/// Coarse bucket an error falls into, for choosing a remediation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Configuration,
    Api,
    Timeout,
    Tool,
    Validation,
    Internal,
    Network,
    Auth,
}

/// Classify `message` (and, optionally, an error-type tag) by sequential
/// substring match. Order matters: the first matching rule wins.
pub fn categorize_error(message: &str, error_type: Option<&str>) -> ErrorCategory {
    let text = format!("{} {}", error_type.unwrap_or(""), message).to_lowercase();

    if text.contains("config") || text.contains("missing") && text.contains("env") {
        return ErrorCategory::Configuration;
    }
    if text.contains("unauthorized") || text.contains("forbidden") || text.contains("api key") || text.contains("auth") {
        return ErrorCategory::Auth;
    }
    if text.contains("timeout") || text.contains("timed out") || text.contains("deadline") {
        return ErrorCategory::Timeout;
    }
    if text.contains("rate limit") || text.contains("429") || text.contains("quota") {
        return ErrorCategory::Api;
    }
    if text.contains("connection") || text.contains("network") || text.contains("unreachable") || text.contains("dns") {
        return ErrorCategory::Network;
    }
    if text.contains("validation") || text.contains("lint") || text.contains("test failed") || text.contains("assertion") {
        return ErrorCategory::Validation;
    }
    if text.contains("tool") || text.contains("unknown tool") {
        return ErrorCategory::Tool;
    }
    if text.contains("api") || text.contains("http") || text.contains("500") || text.contains("502") || text.contains("503") {
        return ErrorCategory::Api;
    }

    ErrorCategory::Internal
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_errors_detected_first() {
        assert_eq!(categorize_error("Missing GITHUB_TOKEN env var", None), ErrorCategory::Configuration);
    }

    #[test]
    fn auth_errors_detected() {
        assert_eq!(categorize_error("401 Unauthorized: bad API key", None), ErrorCategory::Auth);
    }

    #[test]
    fn timeout_before_network() {
        assert_eq!(categorize_error("request timed out after 30s", None), ErrorCategory::Timeout);
    }

    #[test]
    fn validation_errors_detected() {
        assert_eq!(categorize_error("pytest run: 2 tests failed", None), ErrorCategory::Validation);
    }

    #[test]
    fn unrecognized_error_falls_back_to_internal() {
        assert_eq!(categorize_error("something strange happened", None), ErrorCategory::Internal);
    }
}
