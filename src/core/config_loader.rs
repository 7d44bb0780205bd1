//! Configuration file loader for batch-publish
//!
//! This module provides configuration loading, validation, and merging capabilities.

use super::config::*;
use crate::core::error::PublishError;
use regex::Regex;
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::warn;

/// Configuration file name
pub const CONFIG_FILENAME: &str = ".publish-config.yaml";

/// Environment variable pattern (${VAR_NAME})
const ENV_VAR_PATTERN: &str = r"\$\{([A-Z_][A-Z0-9_]*)\}";

/// Maximum `extends` chain length
const MAX_EXTENDS_DEPTH: usize = 8;

/// Configuration load options
#[derive(Debug, Clone, Default)]
pub struct ConfigLoadOptions {
    /// Project path to load config from
    pub project_path: PathBuf,

    /// Explicit config file, replaces the project config
    pub config_file: Option<PathBuf>,

    /// Also read ~/.publish-config.yaml
    pub include_global: bool,

    /// CLI arguments (highest priority)
    pub cli_args: Option<PublishConfig>,

    /// Environment variables
    pub env: HashMap<String, String>,
}

/// Configuration validation result
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValidationResult {
    /// Is configuration valid?
    pub valid: bool,

    /// Validation errors
    pub errors: Vec<ConfigValidationError>,

    /// Validation warnings
    pub warnings: Vec<ConfigValidationWarning>,
}

/// Configuration validation error
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValidationError {
    /// Field path (e.g., "auth.email")
    pub field: String,

    /// Error message
    pub message: String,
}

/// Configuration validation warning
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValidationWarning {
    /// Field path
    pub field: String,

    /// Warning message
    pub message: String,

    /// Suggestion
    pub suggestion: Option<String>,
}

/// Configuration file loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from multiple sources with priority
    ///
    /// Priority (high to low):
    /// 1. CLI arguments
    /// 2. Environment variables
    /// 3. Project config (./.publish-config.yaml, or the explicit file)
    /// 4. Global config (~/.publish-config.yaml, opt-in)
    /// 5. Default values
    pub async fn load(options: ConfigLoadOptions) -> Result<PublishConfig, PublishError> {
        let mut configs: Vec<PublishConfig> = Vec::new();

        // 5. Default values (lowest priority)
        configs.push(PublishConfig {
            version: CONFIG_VERSION.to_string(),
            ..Default::default()
        });

        // 4. Global config
        if options.include_global
            && let Some(global_config) = Self::load_global_config().await?
        {
            configs.push(global_config);
        }

        // 3. Project config
        match &options.config_file {
            Some(path) => match Self::load_config_file(path, 0).await? {
                Some(config) => configs.push(config),
                None => {
                    return Err(PublishError::Config(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
            },
            None => {
                let path = options.project_path.join(CONFIG_FILENAME);
                if let Some(project_config) = Self::load_config_file(&path, 0).await? {
                    configs.push(project_config);
                }
            }
        }

        // 2. Environment variables
        if let Some(env_config) = Self::load_env_config(&options.env)? {
            configs.push(env_config);
        }

        // 1. CLI arguments (highest priority)
        if let Some(cli_config) = options.cli_args {
            configs.push(cli_config);
        }

        let merged_config = Self::merge_configs(configs);

        Ok(Self::expand_env_vars(merged_config, &options.env))
    }

    /// Load global configuration from ~/.publish-config.yaml
    async fn load_global_config() -> Result<Option<PublishConfig>, PublishError> {
        let Ok(home_dir) = env::var("HOME") else {
            return Ok(None);
        };
        let global_config_path = PathBuf::from(home_dir).join(CONFIG_FILENAME);

        Self::load_config_file(&global_config_path, 0).await
    }

    /// Load configuration from YAML file, following `extends`
    fn load_config_file(
        file_path: &Path,
        depth: usize,
    ) -> std::pin::Pin<
        Box<
            dyn std::future::Future<Output = Result<Option<PublishConfig>, PublishError>>
                + Send
                + '_,
        >,
    > {
        Box::pin(async move {
            if !file_path.exists() {
                return Ok(None);
            }

            if depth >= MAX_EXTENDS_DEPTH {
                return Err(PublishError::Config(format!(
                    "extends chain deeper than {} at {}",
                    MAX_EXTENDS_DEPTH,
                    file_path.display()
                )));
            }

            let content = fs::read_to_string(file_path).await.map_err(|e| {
                PublishError::Config(format!("Failed to read config file: {}", e))
            })?;

            let config: PublishConfig = serde_yaml::from_str(&content).map_err(|e| {
                PublishError::Config(format!("Failed to parse YAML config: {}", e))
            })?;

            if let Some(extends_path) = &config.extends {
                let base_path = file_path
                    .parent()
                    .ok_or_else(|| PublishError::Config("Invalid config file path".to_string()))?
                    .join(extends_path);

                match Self::load_config_file(&base_path, depth + 1).await? {
                    Some(base_config) => {
                        return Ok(Some(Self::merge_configs(vec![base_config, config])));
                    }
                    None => {
                        return Err(PublishError::Config(format!(
                            "Extended config file not found: {}",
                            base_path.display()
                        )));
                    }
                }
            }

            Ok(Some(config))
        })
    }

    /// Load configuration from environment variables
    fn load_env_config(
        env: &HashMap<String, String>,
    ) -> Result<Option<PublishConfig>, PublishError> {
        let mut config = PublishConfig::default();
        let mut has_changes = false;

        // PUBLISH_REGISTRY -> registry
        if let Some(registry) = env.get("PUBLISH_REGISTRY") {
            config.registry = Some(registry.clone());
            has_changes = true;
        }

        // PUBLISH_IGNORE -> ignore (comma-separated)
        if let Some(ignore) = env.get("PUBLISH_IGNORE") {
            config.ignore = Some(
                ignore
                    .split(',')
                    .map(|s| s.trim())
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect(),
            );
            has_changes = true;
        }

        // PUBLISH_AUTH_* -> auth.*
        let mut auth = AuthConfig::default();
        for (var, field) in [
            ("PUBLISH_AUTH_USERNAME", &mut auth.username),
            ("PUBLISH_AUTH_PASSWORD", &mut auth.password),
            ("PUBLISH_AUTH_EMAIL", &mut auth.email),
        ] {
            if let Some(value) = env.get(var) {
                *field = Some(value.clone());
                has_changes = true;
            }
        }
        if auth != AuthConfig::default() {
            config.auth = Some(auth);
        }

        // PUBLISH_TIMEOUT_SECS -> timeoutSecs
        if let Some(timeout) = env.get("PUBLISH_TIMEOUT_SECS") {
            let secs = timeout.trim().parse::<u64>().map_err(|_| {
                PublishError::Config(format!("PUBLISH_TIMEOUT_SECS is not a number: {}", timeout))
            })?;
            config.timeout_secs = Some(secs);
            has_changes = true;
        }

        Ok(if has_changes { Some(config) } else { None })
    }

    /// Merge multiple configurations with priority
    pub fn merge_configs(configs: Vec<PublishConfig>) -> PublishConfig {
        let mut result = PublishConfig::default();

        for config in configs {
            Self::merge_into(&mut result, config);
        }

        result
    }

    /// Merge source config into target
    fn merge_into(target: &mut PublishConfig, source: PublishConfig) {
        if !source.version.is_empty() {
            target.version = source.version;
        }

        if source.extends.is_some() {
            target.extends = source.extends;
        }

        // Lists are replaced, not concatenated
        if source.sources.is_some() {
            target.sources = source.sources;
        }
        if source.discover.is_some() {
            target.discover = source.discover;
        }
        if source.ignore.is_some() {
            target.ignore = source.ignore;
        }

        if source.max_depth.is_some() {
            target.max_depth = source.max_depth;
        }
        if source.registry.is_some() {
            target.registry = source.registry;
        }

        // Auth is merged field by field
        if let Some(source_auth) = source.auth {
            let target_auth = target.auth.get_or_insert_with(AuthConfig::default);
            if source_auth.username.is_some() {
                target_auth.username = source_auth.username;
            }
            if source_auth.password.is_some() {
                target_auth.password = source_auth.password;
            }
            if source_auth.email.is_some() {
                target_auth.email = source_auth.email;
            }
        }

        if source.install_before.is_some() {
            target.install_before = source.install_before;
        }
        if source.force_install.is_some() {
            target.force_install = source.force_install;
        }
        if source.timeout_secs.is_some() {
            target.timeout_secs = source.timeout_secs;
        }
    }

    /// Expand `${VAR}` references in the registry URL and credentials
    fn expand_env_vars(mut config: PublishConfig, env: &HashMap<String, String>) -> PublishConfig {
        if let Some(registry) = &config.registry {
            config.registry = Some(Self::expand_string(registry, env));
        }

        if let Some(auth) = &mut config.auth {
            for field in [&mut auth.username, &mut auth.password, &mut auth.email] {
                if let Some(value) = field {
                    *value = Self::expand_string(value, env);
                }
            }
        }

        config
    }

    /// Expand environment variables in a single string
    ///
    /// Unknown variables are left untouched.
    fn expand_string(input: &str, env: &HashMap<String, String>) -> String {
        let Ok(env_var_regex) = Regex::new(ENV_VAR_PATTERN) else {
            return input.to_string();
        };

        env_var_regex
            .replace_all(input, |caps: &regex::Captures<'_>| {
                let var_name = &caps[1];
                match env.get(var_name) {
                    Some(value) => value.clone(),
                    None => {
                        warn!("Environment variable {} not found", var_name);
                        caps[0].to_string()
                    }
                }
            })
            .into_owned()
    }

    /// Validate configuration
    pub fn validate(config: &PublishConfig) -> ConfigValidationResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        // 1. Version
        if !config.version.is_empty() && config.version != CONFIG_VERSION {
            warnings.push(ConfigValidationWarning {
                field: "version".to_string(),
                message: format!("Unknown version: {}", config.version),
                suggestion: Some(format!(
                    "Currently supported version is \"{}\" only",
                    CONFIG_VERSION
                )),
            });
        }

        // 2. Registry
        if let Some(registry) = &config.registry
            && !registry.trim().is_empty()
            && !(registry.starts_with("http://") || registry.starts_with("https://"))
        {
            errors.push(ConfigValidationError {
                field: "registry".to_string(),
                message: format!("Registry must be an http(s) URL: {}", registry),
            });
        }

        // 3. Auth
        if let Some(auth) = &config.auth {
            let missing = auth.missing_fields();
            if !missing.is_empty() && missing.len() < 3 {
                for field in missing {
                    errors.push(ConfigValidationError {
                        field: format!("auth.{}", field),
                        message: "Incomplete credentials: username, password and email must be set together".to_string(),
                    });
                }
            }
        }

        // 4. Timeout
        if config.timeout_secs == Some(0) {
            errors.push(ConfigValidationError {
                field: "timeoutSecs".to_string(),
                message: "Timeout must be greater than zero".to_string(),
            });
        }

        // 5. Accepted but inert flags
        for (field, value) in [
            ("installBefore", config.install_before),
            ("forceInstall", config.force_install),
        ] {
            if value == Some(true) {
                warnings.push(ConfigValidationWarning {
                    field: field.to_string(),
                    message: format!("{} is accepted but has no effect", field),
                    suggestion: Some("Run the install step before batch-publish".to_string()),
                });
            }
        }

        ConfigValidationResult {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    /// Format validation result as human-readable string
    pub fn format_validation_result(result: &ConfigValidationResult) -> String {
        let mut lines = Vec::new();

        if result.valid {
            lines.push("✅ Configuration validation succeeded".to_string());
        } else {
            lines.push("❌ Configuration has errors".to_string());
        }

        if !result.errors.is_empty() {
            lines.push("\n🔴 Errors:".to_string());
            for error in &result.errors {
                lines.push(format!("  - [{}] {}", error.field, error.message));
            }
        }

        if !result.warnings.is_empty() {
            lines.push("\n🟡 Warnings:".to_string());
            for warning in &result.warnings {
                lines.push(format!("  - [{}] {}", warning.field, warning.message));
                if let Some(suggestion) = &warning.suggestion {
                    lines.push(format!("    Suggestion: {}", suggestion));
                }
            }
        }

        lines.join("\n")
    }
}
