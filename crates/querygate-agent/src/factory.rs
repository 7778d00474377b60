// SPDX-FileCopyrightText: 2026 Querygate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generator selection.
//!
//! Every generator handed out is wrapped in a [`RetryingGenerator`]; callers
//! cannot obtain an unwrapped backend.

use std::str::FromStr;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use querygate_config::{QueryGateConfig, SettingsStore};
use querygate_core::{ProviderKind, QueryGateError, SqlGenerator};
use querygate_gemini::GeminiGenerator;
use querygate_ollama::OllamaGenerator;
use querygate_openai::OpenAiGenerator;
use querygate_resilience::{RetryPolicy, RetryingGenerator};
use tracing::info;

/// Supplies the generator for the next request.
pub trait GeneratorSource: Send + Sync {
    fn generator(&self) -> Result<Arc<dyn SqlGenerator>, QueryGateError>;
}

/// A generator built for one configuration snapshot.
struct Built {
    config: Arc<QueryGateConfig>,
    generator: Arc<dyn SqlGenerator>,
}

/// Builds the generator selected by `bot.provider`.
///
/// The generator is rebuilt only when the settings snapshot changes, so a
/// `config set bot.provider ...` takes effect on the next request.
pub struct GeneratorFactory {
    settings: Arc<SettingsStore>,
    policy: RetryPolicy,
    built: ArcSwapOption<Built>,
}

impl GeneratorFactory {
    pub fn new(settings: Arc<SettingsStore>) -> Self {
        Self::with_policy(settings, RetryPolicy::default())
    }

    pub fn with_policy(settings: Arc<SettingsStore>, policy: RetryPolicy) -> Self {
        Self {
            settings,
            policy,
            built: ArcSwapOption::empty(),
        }
    }

    /// Instantiate `kind` from `config`, wrapped in retries.
    ///
    /// Missing credentials surface here as [`QueryGateError::Config`].
    pub fn create(
        kind: ProviderKind,
        config: &QueryGateConfig,
        policy: RetryPolicy,
    ) -> Result<Arc<dyn SqlGenerator>, QueryGateError> {
        let inner: Arc<dyn SqlGenerator> = match kind {
            ProviderKind::OpenAi => Arc::new(OpenAiGenerator::new(config)?),
            ProviderKind::Gemini => Arc::new(GeminiGenerator::new(config)?),
            ProviderKind::Ollama => Arc::new(OllamaGenerator::new(config)?),
        };

        info!(
            provider = %kind,
            retries = policy.max_retries(),
            "SQL generator created"
        );
        Ok(Arc::new(RetryingGenerator::with_policy(inner, policy)))
    }

    /// Like [`create`](Self::create), selecting the backend by name.
    pub fn create_named(
        name: &str,
        config: &QueryGateConfig,
        policy: RetryPolicy,
    ) -> Result<Arc<dyn SqlGenerator>, QueryGateError> {
        let kind = ProviderKind::from_str(name.trim())
            .map_err(|_| QueryGateError::Config(format!("unknown LLM provider: {name}")))?;
        Self::create(kind, config, policy)
    }
}

impl GeneratorSource for GeneratorFactory {
    fn generator(&self) -> Result<Arc<dyn SqlGenerator>, QueryGateError> {
        let config = self.settings.snapshot();
        if let Some(built) = self.built.load_full()
            && Arc::ptr_eq(&built.config, &config)
        {
            return Ok(Arc::clone(&built.generator));
        }

        let generator = Self::create(config.bot.provider, &config, self.policy.clone())?;
        self.built.store(Some(Arc::new(Built {
            config,
            generator: Arc::clone(&generator),
        })));
        Ok(generator)
    }
}

/// Always hands out the same generator. For embedding and tests.
pub struct FixedGenerator {
    generator: Arc<dyn SqlGenerator>,
}

impl FixedGenerator {
    pub fn new(generator: Arc<dyn SqlGenerator>) -> Self {
        Self { generator }
    }
}

impl GeneratorSource for FixedGenerator {
    fn generator(&self) -> Result<Arc<dyn SqlGenerator>, QueryGateError> {
        Ok(Arc::clone(&self.generator))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_keys() -> QueryGateConfig {
        let mut config = QueryGateConfig::default();
        config.openai.api_key = Some("sk-test-openai".into());
        config.gemini.api_key = Some("gemini-test-key".into());
        config
    }

    fn store(dir: &std::path::Path, config: QueryGateConfig) -> Arc<SettingsStore> {
        Arc::new(
            SettingsStore::new(config, dir.join("querygate.toml"), dir.join("settings.key"))
                .unwrap(),
        )
    }

    #[test]
    fn creates_each_provider() {
        let config = config_with_keys();
        for (kind, name) in [
            (ProviderKind::OpenAi, "openai"),
            (ProviderKind::Gemini, "gemini"),
            (ProviderKind::Ollama, "ollama"),
        ] {
            let generator = GeneratorFactory::create(kind, &config, RetryPolicy::none()).unwrap();
            assert_eq!(generator.name(), name);
        }
    }

    #[test]
    fn unknown_name_is_a_config_error() {
        let err = GeneratorFactory::create_named("bard", &config_with_keys(), RetryPolicy::none())
            .err()
            .unwrap();
        assert!(matches!(err, QueryGateError::Config(_)));
        assert!(err.to_string().contains("bard"));

        let generator =
            GeneratorFactory::create_named(" Ollama ", &config_with_keys(), RetryPolicy::none())
                .unwrap();
        assert_eq!(generator.name(), "ollama");
    }

    #[test]
    fn reuses_generator_until_settings_change() {
        let dir = tempfile::tempdir().unwrap();
        let settings = store(dir.path(), config_with_keys());
        let factory = GeneratorFactory::with_policy(Arc::clone(&settings), RetryPolicy::none());

        let first = factory.generator().unwrap();
        let second = factory.generator().unwrap();
        assert_eq!(first.name(), "openai");
        assert!(Arc::ptr_eq(&first, &second));

        settings.set_setting("bot.provider", "ollama").unwrap();
        let third = factory.generator().unwrap();
        assert_eq!(third.name(), "ollama");
    }

    #[tracing_test::traced_test]
    #[test]
    fn logs_creation() {
        GeneratorFactory::create(ProviderKind::Ollama, &config_with_keys(), RetryPolicy::default())
            .unwrap();
        assert!(logs_contain("SQL generator created"));
        assert!(logs_contain("retries=3"));
    }

    #[test]
    fn fixed_source_returns_same_instance() {
        let generator =
            GeneratorFactory::create(ProviderKind::Ollama, &config_with_keys(), RetryPolicy::none())
                .unwrap();
        let source = FixedGenerator::new(Arc::clone(&generator));
        assert!(Arc::ptr_eq(&source.generator().unwrap(), &generator));
    }
}
