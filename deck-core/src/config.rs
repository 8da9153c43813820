//! Content provider configuration.
//!
//! Credentials and endpoints are owned by the host. The deck reads them and
//! never writes them back.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::DeckError;

/// Known content providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Google Gemini.
    Gemini,
    /// Azure OpenAI.
    Azure,
    /// OpenAI.
    OpenAi,
    /// Anthropic Claude.
    Claude,
    /// Local LM Studio server.
    LmStudio,
    /// Local Fooocus image server.
    Fooocus,
}

impl ProviderKind {
    /// The serialized name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::Azure => "azure",
            Self::OpenAi => "openai",
            Self::Claude => "claude",
            Self::LmStudio => "lmstudio",
            Self::Fooocus => "fooocus",
        }
    }

    /// Whether the provider runs on the user's machine and needs no key.
    #[must_use]
    pub fn is_local(self) -> bool {
        matches!(self, Self::LmStudio | Self::Fooocus)
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = DeckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "azure" => Ok(Self::Azure),
            "openai" => Ok(Self::OpenAi),
            "claude" => Ok(Self::Claude),
            "lmstudio" => Ok(Self::LmStudio),
            "fooocus" => Ok(Self::Fooocus),
            other => Err(DeckError::InvalidOperation(format!(
                "unknown provider: {other}"
            ))),
        }
    }
}

/// Per-provider settings.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    /// Which provider this configures.
    pub provider: ProviderKind,
    /// Endpoint override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// API key.
    #[serde(default)]
    pub api_key: String,
    /// Model name override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl ProviderConfig {
    /// Whether the provider can be called with this configuration.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.provider.is_local() || !self.api_key.trim().is_empty()
    }
}

// Keep keys out of logs.
impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider", &self.provider)
            .field("endpoint", &self.endpoint)
            .field("api_key", &if self.api_key.is_empty() { "" } else { "***" })
            .field("model", &self.model)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_usability() {
        let json = r#"{"provider":"openai","apiKey":"sk-test","model":"gpt-4o"}"#;
        let config: ProviderConfig = serde_json::from_str(json).expect("parse");
        assert_eq!(config.provider, ProviderKind::OpenAi);
        assert!(config.is_usable());

        let local: ProviderConfig =
            serde_json::from_str(r#"{"provider":"lmstudio"}"#).expect("parse");
        assert!(local.is_usable());

        let missing: ProviderConfig = serde_json::from_str(r#"{"provider":"claude"}"#).expect("parse");
        assert!(!missing.is_usable());
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = ProviderConfig {
            provider: ProviderKind::Gemini,
            endpoint: None,
            api_key: "secret".into(),
            model: None,
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("secret"));
    }

    #[test]
    fn test_provider_from_str() {
        assert_eq!("LMStudio".parse::<ProviderKind>().ok(), Some(ProviderKind::LmStudio));
        assert!("bard".parse::<ProviderKind>().is_err());
    }
}
