//! Provider configuration: which LLM dialect (Anthropic, Gemini, Ollama) to
//! speak and with what credentials, read from the environment.

use secrecy::SecretString;

/// Which LLM wire dialect to use, resolved from `LLM_PROVIDER`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderKind {
    Anthropic,
    Gemini,
    Ollama,
}

impl ProviderKind {
    fn from_env_value(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "anthropic" => Some(ProviderKind::Anthropic),
            "gemini" => Some(ProviderKind::Gemini),
            "ollama" => Some(ProviderKind::Ollama),
            _ => None,
        }
    }
}

/// Resolved provider configuration: which dialect, which model, and the
/// credential it needs (Ollama has none — it talks to a local server).
/// Deliberately not `Clone` — an API key should have exactly one owner.
#[derive(Debug)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub model_id: String,
    pub api_key: Option<SecretString>,
}

impl ProviderConfig {
    /// Build from `LLM_PROVIDER`/`LLM_MODEL_ID` plus the per-dialect API key
    /// variable (`LLM_API_KEY` takes precedence over the provider-specific
    /// one, so a single override works across dialects in tests).
    pub fn from_env() -> Result<Self, String> {
        let kind = std::env::var("LLM_PROVIDER")
            .ok()
            .and_then(|v| ProviderKind::from_env_value(&v))
            .ok_or_else(|| "LLM_PROVIDER must be one of: anthropic, gemini, ollama".to_string())?;

        let model_id = std::env::var("LLM_MODEL_ID")
            .unwrap_or_else(|_| default_model_id(&kind).to_string());

        let api_key = match kind {
            ProviderKind::Ollama => None,
            ProviderKind::Anthropic => Some(resolve_key("ANTHROPIC_API_KEY")?),
            ProviderKind::Gemini => Some(resolve_key("GEMINI_API_KEY")?),
        };

        Ok(ProviderConfig { kind, model_id, api_key })
    }
}

fn resolve_key(specific_var: &str) -> Result<SecretString, String> {
    std::env::var("LLM_API_KEY")
        .or_else(|_| std::env::var(specific_var))
        .map(SecretString::from)
        .map_err(|_| format!("set LLM_API_KEY or {}", specific_var))
}

fn default_model_id(kind: &ProviderKind) -> &'static str {
    match kind {
        ProviderKind::Anthropic => "claude-sonnet-4-20250514",
        ProviderKind::Gemini => "gemini-1.5-pro",
        ProviderKind::Ollama => "llama3.1",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear_env() {
        for var in ["LLM_PROVIDER", "LLM_MODEL_ID", "LLM_API_KEY", "ANTHROPIC_API_KEY", "GEMINI_API_KEY"] {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn missing_provider_is_an_error() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        assert!(ProviderConfig::from_env().is_err());
    }

    #[test]
    fn ollama_needs_no_api_key() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        std::env::set_var("LLM_PROVIDER", "ollama");
        let config = ProviderConfig::from_env().unwrap();
        assert_eq!(config.kind, ProviderKind::Ollama);
        assert!(config.api_key.is_none());
        clear_env();
    }

    #[test]
    fn anthropic_requires_a_key() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        std::env::set_var("LLM_PROVIDER", "anthropic");
        assert!(ProviderConfig::from_env().is_err());
        std::env::set_var("ANTHROPIC_API_KEY", "sk-test");
        assert!(ProviderConfig::from_env().is_ok());
        clear_env();
    }
}
