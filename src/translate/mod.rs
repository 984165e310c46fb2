pub mod gemini;
pub mod openai;

pub use gemini::GeminiTranslator;
pub use openai::OpenAiTranslator;

use crate::config::{Config, Provider};
use crate::error::{Result, SubtransError};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

/// A remote translation service. One call is one attempt.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, source_lang: &str, target_lang: &str) -> Result<String>;
    fn name(&self) -> &'static str;
}

/// How often, and how patiently, a failed translation is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one.
    pub max_retries: u32,
    /// Pause between two attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay: Duration::from_millis(500),
        }
    }
}

/// Result of translating one piece of text with retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationOutcome {
    pub text: String,
    pub attempts: u32,
    /// True when every attempt failed and `text` is the untranslated input.
    pub fell_back: bool,
}

/// Translate `text`, trying at most `policy.max_retries` times.
///
/// Never fails: when all attempts are exhausted the original text is returned
/// unchanged.
pub async fn translate_with_retry(
    translator: &dyn Translator,
    text: &str,
    source_lang: &str,
    target_lang: &str,
    policy: &RetryPolicy,
) -> TranslationOutcome {
    let mut attempt = 0;

    while attempt < policy.max_retries {
        attempt += 1;
        match translator.translate(text, source_lang, target_lang).await {
            Ok(translated) => {
                debug!(
                    "{} translated {} chars on attempt {}",
                    translator.name(),
                    text.chars().count(),
                    attempt
                );
                return TranslationOutcome {
                    text: translated,
                    attempts: attempt,
                    fell_back: false,
                };
            }
            Err(e) => {
                warn!(
                    "Translation failed (attempt {}/{}): {}",
                    attempt, policy.max_retries, e
                );
                if attempt < policy.max_retries && !policy.delay.is_zero() {
                    tokio::time::sleep(policy.delay).await;
                }
            }
        }
    }

    warn!(
        "Translation failed after {} attempts, keeping original text",
        attempt
    );
    TranslationOutcome {
        text: text.to_string(),
        attempts: attempt,
        fell_back: true,
    }
}

/// Build the translator selected by `config`.
pub fn create_translator(config: &Config) -> Result<Box<dyn Translator>> {
    let api_key = config
        .api_key()
        .ok_or_else(|| {
            SubtransError::Config(format!("API key for provider {} not set", config.provider))
        })?
        .to_string();

    let translator: Box<dyn Translator> = match config.provider {
        Provider::OpenAi => {
            let mut t = OpenAiTranslator::new(api_key)
                .with_model(config.model())
                .with_temperature(config.temperature);
            if let Some(url) = &config.base_url {
                t = t.with_base_url(url.clone());
            }
            Box::new(t)
        }
        Provider::Gemini => {
            let mut t = GeminiTranslator::new(api_key)
                .with_model(config.model())
                .with_temperature(config.temperature);
            if let Some(url) = &config.base_url {
                t = t.with_base_url(url.clone());
            }
            Box::new(t)
        }
    };

    Ok(translator)
}

/// Instruction sent alongside the text; the text itself is passed verbatim.
pub(crate) fn build_instruction(source_lang: &str, target_lang: &str) -> String {
    format!(
        "You are a translation assistant. Translate the user's text from {} to {}. \
Return ONLY the translated text, nothing else.",
        language_code_to_name(source_lang),
        language_code_to_name(target_lang)
    )
}

/// Convert language code to human-readable name for better prompting.
///
/// Unknown codes are passed through unchanged.
pub fn language_code_to_name(code: &str) -> &str {
    let lowercase = code.to_lowercase();
    match lowercase.as_str() {
        "en" => "English",
        "es" => "Spanish",
        "fr" => "French",
        "de" => "German",
        "it" => "Italian",
        "pt" => "Portuguese",
        "ru" => "Russian",
        "ja" => "Japanese",
        "ko" => "Korean",
        "zh" => "Chinese",
        "ar" => "Arabic",
        "hi" => "Hindi",
        "th" => "Thai",
        "vi" => "Vietnamese",
        "id" => "Indonesian",
        "ms" => "Malay",
        "tl" => "Tagalog",
        "nl" => "Dutch",
        "pl" => "Polish",
        "tr" => "Turkish",
        "uk" => "Ukrainian",
        "cs" => "Czech",
        "sv" => "Swedish",
        "da" => "Danish",
        "fi" => "Finnish",
        "no" => "Norwegian",
        "el" => "Greek",
        "he" => "Hebrew",
        "hu" => "Hungarian",
        "ro" => "Romanian",
        _ => code,
    }
}
