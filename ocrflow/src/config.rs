//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The configuration
//! file path defaults to `config.yaml` but can be specified via `-f` flag or `OCRFLOW_CONFIG`
//! environment variable. A missing file is not an error: every field has a default.
//!
//! ## Loading Priority
//!
//! Configuration sources are merged in the following order (later sources override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `OCRFLOW_` override YAML values
//! 3. **Deployment variables** - `RESULT_BUCKET`, `RESULT_TOPIC`, `GCP_PROJECT` and
//!    `GOOGLE_CLOUD_PROJECT`, as set by the function runtime
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `OCRFLOW_GOOGLE__REQUEST_TIMEOUT=10s` sets the `google.request_timeout` field.
//!
//! ## Environment Variable Examples
//!
//! ```bash
//! # Where the result saver writes text files
//! RESULT_BUCKET=my-ocr-results
//!
//! # Topic the image processor publishes detection results to
//! RESULT_TOPIC=ocr-results
//! GOOGLE_CLOUD_PROJECT=my-project
//!
//! # Point the clients at local emulators
//! OCRFLOW_GOOGLE__PUBSUB_ENDPOINT=http://localhost:8085
//! OCRFLOW_GOOGLE__STORAGE_ENDPOINT=http://localhost:4443
//! ```

use std::time::Duration;

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::Error;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "OCRFLOW_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Bucket the result saver writes text files into (`RESULT_BUCKET`).
    ///
    /// Only checked when a result message arrives, so an image-processing-only deployment can
    /// leave it unset.
    pub result_bucket: Option<String>,
    /// Topic detection results are published to (`RESULT_TOPIC`). When unset, the image processor
    /// only logs the extracted text.
    pub result_topic: Option<String>,
    /// Language tag used when neither the OCR service nor the incoming message names one
    pub default_language: String,
    /// Enable OpenTelemetry OTLP export for distributed tracing
    pub enable_otel_export: bool,
    /// Google API client settings
    pub google: GoogleApiConfig,
}

/// Endpoints and request settings for the Google REST APIs.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct GoogleApiConfig {
    /// Project used to resolve short topic names (`GCP_PROJECT` / `GOOGLE_CLOUD_PROJECT`)
    pub project_id: Option<String>,
    /// Static OAuth2 bearer token attached to every request
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
    /// Project billed for API quota (sent as `x-goog-user-project`)
    pub quota_project: Option<String>,
    /// Timeout applied to each outbound request
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    pub vision_endpoint: Url,
    pub storage_endpoint: Url,
    pub pubsub_endpoint: Url,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            result_bucket: None,
            result_topic: None,
            default_language: "en".to_string(),
            enable_otel_export: false,
            google: GoogleApiConfig::default(),
        }
    }
}

impl Default for GoogleApiConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            access_token: None,
            quota_project: None,
            request_timeout: Duration::from_secs(30),
            vision_endpoint: Url::parse("https://vision.googleapis.com").unwrap(),
            storage_endpoint: Url::parse("https://storage.googleapis.com").unwrap(),
            pubsub_endpoint: Url::parse("https://pubsub.googleapis.com").unwrap(),
        }
    }
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let config: Self = Self::figment(args).extract()?;
        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), Error> {
        if self.default_language.trim().is_empty() {
            return Err(Error::Configuration {
                message: "default_language cannot be empty".to_string(),
            });
        }

        if self.google.request_timeout.is_zero() {
            return Err(Error::Configuration {
                message: "google.request_timeout must be greater than zero".to_string(),
            });
        }

        if let Some(topic) = &self.result_topic {
            if topic.is_empty() {
                return Err(Error::Configuration {
                    message: "result_topic cannot be empty. Unset RESULT_TOPIC to disable publishing.".to_string(),
                });
            }

            if !topic.starts_with("projects/") && self.google.project_id.is_none() {
                return Err(Error::Configuration {
                    message: format!(
                        "result_topic '{topic}' is a short topic name but no project is configured. \
                         Set GOOGLE_CLOUD_PROJECT or use a full projects/<project>/topics/<topic> path."
                    ),
                });
            }
        }

        Ok(())
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            // Load base config file
            .merge(Yaml::file(&args.config))
            .merge(Env::prefixed("OCRFLOW_").ignore(&["config"]).split("__"))
            // Variables set by the function runtime / deployment
            .merge(Env::raw().only(&["RESULT_BUCKET", "RESULT_TOPIC"]))
            .merge(Env::raw().only(&["GCP_PROJECT"]).map(|_| "google.project_id".into()))
            .merge(Env::raw().only(&["GOOGLE_CLOUD_PROJECT"]).map(|_| "google.project_id".into()))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    fn args(path: &str) -> Args {
        Args {
            config: path.to_string(),
            validate: false,
        }
    }

    #[test]
    fn test_defaults_without_config_file() {
        Jail::expect_with(|_jail| {
            let config = Config::load(&args("missing.yaml"))?;

            assert_eq!(config.port, 8080);
            assert_eq!(config.default_language, "en");
            assert!(config.result_bucket.is_none());
            assert!(config.result_topic.is_none());
            assert_eq!(config.google.request_timeout, Duration::from_secs(30));
            assert_eq!(config.google.vision_endpoint.as_str(), "https://vision.googleapis.com/");

            Ok(())
        });
    }

    #[test]
    fn test_yaml_config() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "test.yaml",
                r#"
port: 9000
result_bucket: ocr-results
result_topic: projects/demo/topics/ocr-results
default_language: fr
google:
  request_timeout: 5s
  pubsub_endpoint: http://localhost:8085
"#,
            )?;

            let config = Config::load(&args("test.yaml"))?;

            assert_eq!(config.port, 9000);
            assert_eq!(config.result_bucket.as_deref(), Some("ocr-results"));
            assert_eq!(config.result_topic.as_deref(), Some("projects/demo/topics/ocr-results"));
            assert_eq!(config.default_language, "fr");
            assert_eq!(config.google.request_timeout, Duration::from_secs(5));
            assert_eq!(config.google.pubsub_endpoint.as_str(), "http://localhost:8085/");

            Ok(())
        });
    }

    #[test]
    fn test_deployment_env_vars() {
        Jail::expect_with(|jail| {
            jail.create_file("test.yaml", "result_bucket: from-yaml\n")?;

            jail.set_env("RESULT_BUCKET", "out-bucket");
            jail.set_env("RESULT_TOPIC", "ocr-results");
            jail.set_env("GCP_PROJECT", "legacy-project");
            jail.set_env("GOOGLE_CLOUD_PROJECT", "demo-project");
            jail.set_env("OCRFLOW_CONFIG", "test.yaml");

            let config = Config::load(&args("test.yaml"))?;

            assert_eq!(config.result_bucket.as_deref(), Some("out-bucket"));
            assert_eq!(config.result_topic.as_deref(), Some("ocr-results"));
            // GOOGLE_CLOUD_PROJECT takes precedence over GCP_PROJECT
            assert_eq!(config.google.project_id.as_deref(), Some("demo-project"));

            Ok(())
        });
    }

    #[test]
    fn test_prefixed_env_override() {
        Jail::expect_with(|jail| {
            jail.create_file("test.yaml", "port: 9000\n")?;

            jail.set_env("OCRFLOW_PORT", "7000");
            jail.set_env("OCRFLOW_GOOGLE__REQUEST_TIMEOUT", "250ms");
            jail.set_env("OCRFLOW_GOOGLE__ACCESS_TOKEN", "ya29.token");

            let config = Config::load(&args("test.yaml"))?;

            assert_eq!(config.port, 7000);
            assert_eq!(config.google.request_timeout, Duration::from_millis(250));
            assert_eq!(config.google.access_token.as_deref(), Some("ya29.token"));

            Ok(())
        });
    }

    #[test]
    fn test_short_topic_requires_project() {
        Jail::expect_with(|jail| {
            jail.set_env("RESULT_TOPIC", "ocr-results");

            let err = Config::load(&args("missing.yaml")).unwrap_err();
            assert!(err.to_string().contains("no project is configured"));

            Ok(())
        });
    }

    #[test]
    fn test_validate_rejects_empty_language_and_zero_timeout() {
        let config = Config {
            default_language: " ".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.google.request_timeout = Duration::ZERO;
        assert!(config.validate().is_err());

        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_unknown_fields_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("test.yaml", "result_buckett: typo\n")?;
            assert!(Config::load(&args("test.yaml")).is_err());
            Ok(())
        });
    }
}
