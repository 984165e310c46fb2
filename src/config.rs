use crate::error::{Result, SubtransError};
use crate::subtitle::GroupingOptions;
use crate::translate::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    OpenAi,
    Gemini,
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::OpenAi => write!(f, "openai"),
            Provider::Gemini => write!(f, "gemini"),
        }
    }
}

impl std::str::FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAi),
            "gemini" => Ok(Provider::Gemini),
            _ => Err(format!("Unknown provider: {}. Use 'openai' or 'gemini'", s)),
        }
    }
}

impl Provider {
    /// Model used when none is configured.
    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::OpenAi => "gpt-3.5-turbo",
            Provider::Gemini => "gemini-2.0-flash",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub provider: Provider,
    pub openai_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    /// Model identifier; falls back to the provider's default.
    pub model: Option<String>,
    /// Override for the API endpoint, e.g. an OpenAI-compatible proxy.
    pub base_url: Option<String>,
    pub source_language: String,
    pub target_language: String,
    pub max_retries: u32,
    pub max_gap_secs: f64,
    pub max_length: usize,
    pub temperature: f32,
    pub retry_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            openai_api_key: None,
            gemini_api_key: None,
            model: None,
            base_url: None,
            source_language: "ja".to_string(),
            target_language: "zh".to_string(),
            max_retries: 3,
            max_gap_secs: 2.0,
            max_length: 500,
            temperature: 0.7,
            retry_delay_ms: 500,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut config = match Self::config_file_path() {
            Some(config_path) => Self::from_file(&config_path)?,
            None => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok());

        Ok(config)
    }

    /// Read a TOML config file. A missing or unparsable file yields the defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        match toml::from_str::<Config>(&contents) {
            Ok(config) => Ok(config),
            Err(e) => {
                warn!(
                    "Ignoring config file {}: {}. Using defaults",
                    path.display(),
                    e
                );
                Ok(Self::default())
            }
        }
    }

    /// Override fields from environment-style variables supplied by `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("OPENAI_API_KEY") {
            self.openai_api_key = Some(key);
        }
        if let Some(key) = lookup("GEMINI_API_KEY") {
            self.gemini_api_key = Some(key);
        }
        if let Some(provider) = lookup("SUBTRANS_PROVIDER") {
            match provider.parse() {
                Ok(p) => self.provider = p,
                Err(_) => warn!("Ignoring invalid SUBTRANS_PROVIDER={}", provider),
            }
        }
        if let Some(model) = lookup("SUBTRANS_MODEL") {
            self.model = Some(model);
        }
        if let Some(url) = lookup("SUBTRANS_BASE_URL") {
            self.base_url = Some(url);
        }
        if let Some(lang) = lookup("SUBTRANS_SOURCE_LANG") {
            self.source_language = lang;
        }
        if let Some(lang) = lookup("SUBTRANS_TARGET_LANG") {
            self.target_language = lang;
        }
        if let Some(retries) = lookup("SUBTRANS_MAX_RETRIES") {
            match retries.parse() {
                Ok(r) => self.max_retries = r,
                Err(_) => warn!("Ignoring invalid SUBTRANS_MAX_RETRIES={}", retries),
            }
        }
        if let Some(gap) = lookup("SUBTRANS_MAX_GAP") {
            match gap.parse() {
                Ok(g) => self.max_gap_secs = g,
                Err(_) => warn!("Ignoring invalid SUBTRANS_MAX_GAP={}", gap),
            }
        }
        if let Some(length) = lookup("SUBTRANS_MAX_LENGTH") {
            match length.parse() {
                Ok(l) => self.max_length = l,
                Err(_) => warn!("Ignoring invalid SUBTRANS_MAX_LENGTH={}", length),
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self.provider {
            Provider::OpenAi => {
                if self.openai_api_key.is_none() {
                    return Err(SubtransError::Config(
                        "OPENAI_API_KEY not set. Export it with: export OPENAI_API_KEY=sk-..."
                            .to_string(),
                    ));
                }
            }
            Provider::Gemini => {
                if self.gemini_api_key.is_none() {
                    return Err(SubtransError::Config(
                        "GEMINI_API_KEY not set. Get one at https://aistudio.google.com/apikey"
                            .to_string(),
                    ));
                }
            }
        }

        if self.max_retries == 0 {
            return Err(SubtransError::Config(
                "max_retries must be greater than 0".to_string(),
            ));
        }

        if !self.max_gap_secs.is_finite() || self.max_gap_secs < 0.0 {
            return Err(SubtransError::Config(format!(
                "max_gap must be a non-negative number of seconds, got {}",
                self.max_gap_secs
            )));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(SubtransError::Config(format!(
                "temperature must be between 0.0 and 2.0, got {}",
                self.temperature
            )));
        }

        if self.source_language.trim().is_empty() || self.target_language.trim().is_empty() {
            return Err(SubtransError::Config(
                "source and target language codes must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Configured model, or the provider's default.
    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }

    pub fn api_key(&self) -> Option<&str> {
        match self.provider {
            Provider::OpenAi => self.openai_api_key.as_deref(),
            Provider::Gemini => self.gemini_api_key.as_deref(),
        }
    }

    pub fn grouping(&self) -> GroupingOptions {
        GroupingOptions {
            max_gap: Duration::try_from_secs_f64(self.max_gap_secs.max(0.0)).unwrap_or(Duration::MAX),
            max_length: self.max_length,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            delay: Duration::from_millis(self.retry_delay_ms),
        }
    }

    fn config_file_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("subtrans").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn valid_config() -> Config {
        Config {
            openai_api_key: Some("sk-test".to_string()),
            ..Config::default()
        }
    }

    #[test]
    fn test_provider_parsing() {
        assert_eq!("openai".parse::<Provider>().unwrap(), Provider::OpenAi);
        assert_eq!("gemini".parse::<Provider>().unwrap(), Provider::Gemini);
        assert_eq!("OpenAI".parse::<Provider>().unwrap(), Provider::OpenAi);
        assert!("whisper".parse::<Provider>().is_err());
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.provider, Provider::OpenAi);
        assert_eq!(config.source_language, "ja");
        assert_eq!(config.target_language, "zh");
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.max_gap_secs, 2.0);
        assert_eq!(config.max_length, 500);
        assert_eq!(config.model(), "gpt-3.5-turbo");
    }

    #[test]
    fn test_model_override() {
        let mut config = Config::default();
        config.provider = Provider::Gemini;
        assert_eq!(config.model(), "gemini-2.0-flash");

        config.model = Some("gemini-1.5-pro".to_string());
        assert_eq!(config.model(), "gemini-1.5-pro");
    }

    #[test]
    fn test_validate_missing_api_key() {
        let mut config = Config::default();
        assert!(config.validate().is_err());

        config.provider = Provider::Gemini;
        config.openai_api_key = Some("sk-test".to_string());
        assert!(config.validate().is_err());

        config.gemini_api_key = Some("test-key".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_with_api_key() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_thresholds() {
        let mut config = valid_config();
        config.max_retries = 0;
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.max_gap_secs = -1.0;
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.max_gap_secs = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.temperature = 3.5;
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.target_language = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_apply_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("GEMINI_API_KEY", "g-key"),
            ("SUBTRANS_PROVIDER", "gemini"),
            ("SUBTRANS_TARGET_LANG", "en"),
            ("SUBTRANS_MAX_RETRIES", "5"),
            ("SUBTRANS_MAX_GAP", "1.5"),
            ("SUBTRANS_MAX_LENGTH", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_env(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.provider, Provider::Gemini);
        assert_eq!(config.api_key(), Some("g-key"));
        assert_eq!(config.target_language, "en");
        assert_eq!(config.source_language, "ja");
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.max_gap_secs, 1.5);
        // unparsable values leave the default in place
        assert_eq!(config.max_length, 500);
    }

    #[test]
    fn test_from_file_reads_toml() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "provider = \"gemini\"\ngemini_api_key = \"g-key\"\nmax_gap_secs = 0.75\n",
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();

        assert_eq!(config.provider, Provider::Gemini);
        assert_eq!(config.api_key(), Some("g-key"));
        assert_eq!(config.max_gap_secs, 0.75);
        assert_eq!(config.max_length, 500);
    }

    #[test]
    fn test_from_file_missing_or_invalid_uses_defaults() {
        let dir = tempfile::TempDir::new().unwrap();

        let missing = Config::from_file(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(missing.target_language, "zh");

        let path = dir.path().join("config.toml");
        std::fs::write(&path, "max_length = \"lots\"\n").unwrap();
        let invalid = Config::from_file(&path).unwrap();
        assert_eq!(invalid.max_length, 500);
        assert_eq!(invalid.provider, Provider::OpenAi);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str("target_language = \"en\"\nmax_length = 200\n").unwrap();
        assert_eq!(config.target_language, "en");
        assert_eq!(config.max_length, 200);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.provider, Provider::OpenAi);
    }

    #[test]
    fn test_grouping_and_retry_policy() {
        let mut config = Config::default();
        config.max_gap_secs = 1.25;
        config.retry_delay_ms = 0;

        let grouping = config.grouping();
        assert_eq!(grouping.max_gap, Duration::from_millis(1250));
        assert_eq!(grouping.max_length, 500);

        let policy = config.retry_policy();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.delay, Duration::ZERO);
    }
}
