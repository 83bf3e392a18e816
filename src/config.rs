//! Configuration loading via `ortho-config`.

use std::ffi::OsString;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

use crate::logging::LogFormat;
use crate::resource::{self, NamingError};

/// Deployment settings shared by every step, derived from environment
/// variables and configuration files.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(prefix = "FLOW")]
pub struct FlowConfig {
    /// Name of the deployed stack. The project name is derived from it and
    /// prefixes every resource the workflow creates.
    pub stack_name: String,
    /// Region override. When unset the SDK's region chain is used.
    pub region: Option<String>,
    /// Bucket holding the source data and receiving exports.
    pub s3_bucket_name: String,
    /// Folder of the bucket holding the source data.
    #[ortho_config(default = "source".to_owned())]
    pub s3_src_folder: String,
    /// Folder of the bucket receiving forecast exports.
    #[ortho_config(default = "target".to_owned())]
    pub tgt_s3_folder: String,
    /// File name of the target time series inside the source folder.
    #[ortho_config(default = "target_time_series.csv".to_owned())]
    pub target_time_series_file_name: String,
    /// IAM role assumed by Forecast to read the source data.
    pub import_job_role_arn: String,
    /// IAM role assumed by Forecast to write exports.
    pub export_job_role_arn: String,
    /// Location of the workflow parameter document.
    #[ortho_config(default = "/opt/forecast/params.json".to_owned())]
    pub params_path: String,
    /// `CloudWatch` namespace receiving predictor metrics.
    #[ortho_config(default = "FORECAST".to_owned())]
    pub metrics_namespace: String,
    /// Log output format, `json` or `pretty`.
    #[ortho_config(default = "json".to_owned())]
    pub log_format: String,
}

/// Metadata for a configuration field, used to generate actionable error messages.
struct FieldMetadata {
    description: &'static str,
    env_var: &'static str,
    toml_key: &'static str,
    section: &'static str,
}

impl FieldMetadata {
    const fn new(
        description: &'static str,
        env_var: &'static str,
        toml_key: &'static str,
    ) -> Self {
        Self {
            description,
            env_var,
            toml_key,
            section: "flow",
        }
    }
}

impl FlowConfig {
    fn require_field(value: &str, metadata: &FieldMetadata) -> Result<(), ConfigError> {
        if value.trim().is_empty() {
            return Err(ConfigError::MissingField(format!(
                "missing {}: set {} or add {} to [{}] in forecast-steps.toml",
                metadata.description, metadata.env_var, metadata.toml_key, metadata.section
            )));
        }
        Ok(())
    }

    /// Loads configuration without attempting to parse CLI arguments. Values
    /// merge defaults, configuration files and environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([OsString::from("forecast-steps")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Loads and validates configuration in one go.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load_validated() -> Result<Self, ConfigError> {
        let config = Self::load_without_cli_args()?;
        config.validate()?;
        Ok(config)
    }

    /// Performs semantic validation on required fields. Error messages include
    /// guidance on how to provide missing values via environment variables or
    /// configuration files.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when a required field is empty
    /// and [`ConfigError::Invalid`] when the stack name or log format cannot
    /// be used.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::require_field(
            &self.stack_name,
            &FieldMetadata::new("stack name", "FLOW_STACK_NAME", "stack_name"),
        )?;
        Self::require_field(
            &self.s3_bucket_name,
            &FieldMetadata::new("S3 bucket", "FLOW_S3_BUCKET_NAME", "s3_bucket_name"),
        )?;
        Self::require_field(
            &self.import_job_role_arn,
            &FieldMetadata::new(
                "import job role ARN",
                "FLOW_IMPORT_JOB_ROLE_ARN",
                "import_job_role_arn",
            ),
        )?;
        Self::require_field(
            &self.export_job_role_arn,
            &FieldMetadata::new(
                "export job role ARN",
                "FLOW_EXPORT_JOB_ROLE_ARN",
                "export_job_role_arn",
            ),
        )?;
        Self::require_field(
            &self.params_path,
            &FieldMetadata::new("parameter document path", "FLOW_PARAMS_PATH", "params_path"),
        )?;
        Self::require_field(
            &self.metrics_namespace,
            &FieldMetadata::new(
                "metrics namespace",
                "FLOW_METRICS_NAMESPACE",
                "metrics_namespace",
            ),
        )?;
        self.project_name()?;
        self.log_format()?;
        Ok(())
    }

    /// Project name derived from the stack name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the stack name cannot prefix
    /// resource names.
    pub fn project_name(&self) -> Result<String, ConfigError> {
        resource::project_name(&self.stack_name).map_err(ConfigError::from)
    }

    /// Parsed log format.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for anything but `json` or `pretty`.
    pub fn log_format(&self) -> Result<LogFormat, ConfigError> {
        self.log_format.parse().map_err(|_| {
            ConfigError::Invalid(format!(
                "log format '{}' is not supported: set FLOW_LOG_FORMAT to json or pretty",
                self.log_format
            ))
        })
    }

    /// `s3://` URI of the target time series file.
    #[must_use]
    pub fn import_source(&self) -> String {
        format!(
            "s3://{}/{}/{}",
            self.s3_bucket_name,
            self.s3_src_folder.trim_matches('/'),
            self.target_time_series_file_name
        )
    }

    /// `s3://` URI of the export folder.
    #[must_use]
    pub fn export_destination(&self) -> String {
        format!(
            "s3://{}/{}/",
            self.s3_bucket_name,
            self.tgt_s3_folder.trim_matches('/')
        )
    }
}

/// Errors raised during configuration loading and validation.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a required configuration field is empty or missing.
    #[error("missing configuration field: {0}")]
    MissingField(String),
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
    /// Indicates a field is present but unusable.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl From<ortho_config::OrthoError> for ConfigError {
    fn from(value: ortho_config::OrthoError) -> Self {
        Self::Parse(value.to_string())
    }
}

impl From<NamingError> for ConfigError {
    fn from(value: NamingError) -> Self {
        Self::Invalid(format!("{value}: check FLOW_STACK_NAME"))
    }
}
