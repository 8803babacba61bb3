use secrecy::{ExposeSecret, Secret};
use service_core::config as core_config;
use service_core::error::AppError;
use service_core::middleware::cors::parse_origin_list;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Upper bound on a single upstream generation call.
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 15;

pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a friendly ghost haunting this website. Answer the visitor's question in a few short, playful sentences.";

#[derive(Debug, Clone)]
pub struct GhostConfig {
    pub common: core_config::Config,
    pub cors: CorsConfig,
    pub upstream: UpstreamConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Default)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub provider: ProviderKind,
    /// Sent as the bearer token; `None` makes every ask fail with 500.
    pub api_key: Option<Secret<String>>,
    pub model: String,
    pub base_url: String,
    pub system_prompt: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
}

/// Which text-generation API the ghost talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// Hosted inference API (text-generation task).
    HuggingFace,
    /// Chat-completions LLM API.
    OpenAi,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::HuggingFace => "huggingface",
            ProviderKind::OpenAi => "openai",
        }
    }

    /// Environment variable holding the credential for this provider.
    pub fn credential_env(&self) -> &'static str {
        match self {
            ProviderKind::HuggingFace => "HF_TOKEN",
            ProviderKind::OpenAi => "OPENAI_API_KEY",
        }
    }

    pub fn model_env(&self) -> &'static str {
        match self {
            ProviderKind::HuggingFace => "HF_MODEL",
            ProviderKind::OpenAi => "OPENAI_MODEL",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::HuggingFace => "mistralai/Mistral-7B-Instruct-v0.2",
            ProviderKind::OpenAi => "gpt-4o-mini",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderKind::HuggingFace => "https://api-inference.huggingface.co/models",
            ProviderKind::OpenAi => "https://api.openai.com/v1",
        }
    }
}

impl FromStr for ProviderKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "huggingface" | "hf" => Ok(ProviderKind::HuggingFace),
            "openai" => Ok(ProviderKind::OpenAi),
            other => Err(AppError::ConfigError(anyhow::anyhow!(
                "Unknown GHOST_PROVIDER '{}', expected 'openai' or 'huggingface'",
                other
            ))),
        }
    }
}

impl UpstreamConfig {
    /// Defaults for `provider` with the given credential.
    pub fn for_provider(provider: ProviderKind, api_key: Option<&str>) -> Self {
        Self {
            provider,
            api_key: api_key.map(|k| Secret::new(k.to_string())),
            model: provider.default_model().to_string(),
            base_url: provider.default_base_url().to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            temperature: None,
            max_tokens: None,
            timeout: Duration::from_secs(DEFAULT_UPSTREAM_TIMEOUT_SECS),
        }
    }

    pub fn has_key(&self) -> bool {
        self.api_key
            .as_ref()
            .is_some_and(|k| !k.expose_secret().is_empty())
    }
}

impl GhostConfig {
    pub fn load() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;

        let provider: ProviderKind = get_env("GHOST_PROVIDER", "openai").parse()?;

        let allowed_origins = optional_env("ALLOWED_ORIGINS")
            .or_else(|| optional_env("ALLOWED_ORIGIN"))
            .map(|raw| parse_origin_list(&raw))
            .unwrap_or_default();

        let upstream = UpstreamConfig {
            provider,
            api_key: optional_env(provider.credential_env()).map(Secret::new),
            model: get_env(provider.model_env(), provider.default_model()),
            base_url: get_env("GHOST_UPSTREAM_BASE_URL", provider.default_base_url()),
            system_prompt: get_env("GHOST_SYSTEM_PROMPT", DEFAULT_SYSTEM_PROMPT),
            temperature: parse_env("GHOST_TEMPERATURE")?,
            max_tokens: parse_env("GHOST_MAX_TOKENS")?,
            timeout: Duration::from_secs(
                parse_env("GHOST_UPSTREAM_TIMEOUT_SECS")?
                    .unwrap_or(DEFAULT_UPSTREAM_TIMEOUT_SECS),
            ),
        };

        Ok(GhostConfig {
            common,
            cors: CorsConfig { allowed_origins },
            upstream,
            observability: ObservabilityConfig {
                log_level: get_env("LOG_LEVEL", "info,ghost_service=debug"),
                otlp_endpoint: optional_env("OTLP_ENDPOINT"),
            },
        })
    }
}

/// Non-empty value of `key`, if set.
fn optional_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn get_env(key: &str, default: &str) -> String {
    optional_env(key).unwrap_or_else(|| default.to_string())
}

fn parse_env<T>(key: &str) -> Result<Option<T>, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    optional_env(key)
        .map(|raw| {
            raw.parse::<T>().map_err(|e| {
                AppError::ConfigError(anyhow::anyhow!("{} has invalid value '{}': {}", key, raw, e))
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_names_parse() {
        assert_eq!("HF".parse::<ProviderKind>().unwrap(), ProviderKind::HuggingFace);
        assert_eq!(" openai ".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAi);
        assert!("anthropic".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn blank_key_counts_as_missing() {
        assert!(!UpstreamConfig::for_provider(ProviderKind::OpenAi, None).has_key());
        assert!(!UpstreamConfig::for_provider(ProviderKind::OpenAi, Some("")).has_key());
        assert!(UpstreamConfig::for_provider(ProviderKind::OpenAi, Some("sk-x")).has_key());
    }

    #[test]
    fn debug_output_redacts_the_key() {
        let upstream = UpstreamConfig::for_provider(ProviderKind::HuggingFace, Some("hf_secret"));
        assert!(!format!("{:?}", upstream).contains("hf_secret"));
    }

    #[test]
    fn default_timeout_is_fifteen_seconds() {
        let upstream = UpstreamConfig::for_provider(ProviderKind::HuggingFace, None);
        assert_eq!(upstream.timeout, Duration::from_secs(15));
    }
}
