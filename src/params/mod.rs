//! Workflow parameter document (`params.json`).
//!
//! The document describes the datasets, dataset group, predictor and
//! forecast the workflow provisions. Init steps read it once and merge it
//! into the workflow event so later steps never touch the filesystem.

use camino::Utf8Path;
use cap_std::{ambient_authority, fs_utf8::Dir};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::resource::DatasetType;

/// Errors raised while loading the parameter document.
#[derive(Debug, Error)]
pub enum ParamsError {
    /// Raised when the document cannot be read.
    #[error("failed to read workflow parameters at {path}: {message}")]
    Io {
        /// Path that failed.
        path: String,
        /// Error message from the filesystem layer.
        message: String,
    },
    /// Raised when the document is not valid JSON for [`WorkflowParams`].
    #[error("failed to parse workflow parameters at {path}: {message}")]
    Parse {
        /// Path that failed.
        path: String,
        /// Parser message.
        message: String,
    },
    /// Raised when the document parses but cannot drive the workflow.
    #[error("invalid workflow parameters: {0}")]
    Invalid(String),
}

/// Parameters shared by every step of a workflow run.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct WorkflowParams {
    /// Datasets to create; exactly one must be a target time series.
    pub datasets: Vec<DatasetParams>,
    /// Dataset group settings.
    pub dataset_group: DatasetGroupParams,
    /// Predictor training settings.
    pub predictor: PredictorParams,
    /// Forecast generation settings.
    #[serde(default)]
    pub forecast: ForecastParams,
    /// Timestamp format of the imported data, for example
    /// `yyyy-MM-dd HH:mm:ss`.
    pub timestamp_format: String,
}

/// Settings for one dataset.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DatasetParams {
    /// Forecast domain, such as `RETAIL` or `CUSTOM`.
    pub domain: String,
    /// Dataset type; also the dataset name suffix.
    pub dataset_type: DatasetType,
    /// Frequency of data collection, required for time series datasets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_frequency: Option<String>,
    /// Dataset schema.
    pub schema: SchemaParams,
}

/// Dataset schema.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SchemaParams {
    /// Ordered schema attributes.
    pub attributes: Vec<SchemaAttribute>,
}

/// One schema attribute.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SchemaAttribute {
    /// Column name.
    pub attribute_name: String,
    /// Column type, such as `string`, `float` or `timestamp`.
    pub attribute_type: String,
}

/// Dataset group settings.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DatasetGroupParams {
    /// Forecast domain; must match the datasets' domain.
    pub domain: String,
}

/// Predictor training settings.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PredictorParams {
    /// Algorithm to train; omitted when `PerformAutoML` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub algorithm_arn: Option<String>,
    /// Number of time steps to forecast.
    pub forecast_horizon: i32,
    /// Lets Forecast pick the best algorithm.
    #[serde(
        rename = "PerformAutoML",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub perform_auto_ml: Option<bool>,
    /// Enables hyperparameter optimisation.
    #[serde(rename = "PerformHPO", default, skip_serializing_if = "Option::is_none")]
    pub perform_hpo: Option<bool>,
    /// Supplementary features; the dataset group ARN is injected at creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_data_config: Option<InputDataConfigParams>,
    /// Featurization settings.
    pub featurization_config: FeaturizationParams,
    /// Quantiles to evaluate, such as `["0.1", "0.5", "0.9"]`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub forecast_types: Vec<String>,
}

/// Predictor input data configuration without the dataset group ARN.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct InputDataConfigParams {
    /// Built-in supplementary features such as holidays.
    #[serde(default)]
    pub supplementary_features: Vec<SupplementaryFeature>,
}

/// One supplementary feature.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SupplementaryFeature {
    /// Feature name, such as `holiday`.
    pub name: String,
    /// Feature value, such as a country code.
    pub value: String,
}

/// Featurization settings.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct FeaturizationParams {
    /// Forecast frequency, such as `D` or `H`.
    pub forecast_frequency: String,
}

/// Forecast generation settings.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ForecastParams {
    /// Quantiles to generate; Forecast defaults apply when empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub forecast_types: Vec<String>,
}

impl WorkflowParams {
    /// Parses and validates a parameter document.
    ///
    /// # Errors
    ///
    /// Returns [`ParamsError::Parse`] for malformed JSON and
    /// [`ParamsError::Invalid`] when no target time series dataset is
    /// declared or a dataset type is declared twice.
    pub fn from_json(path: &str, contents: &str) -> Result<Self, ParamsError> {
        let params: Self = serde_json::from_str(contents).map_err(|err| ParamsError::Parse {
            path: path.to_owned(),
            message: err.to_string(),
        })?;
        params.validate()?;
        Ok(params)
    }

    /// Reads the parameter document at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ParamsError::Io`] when the file cannot be read, or any error
    /// reported by [`WorkflowParams::from_json`].
    pub fn load(path: &Utf8Path) -> Result<Self, ParamsError> {
        let contents = read_document(path)?;
        Self::from_json(path.as_str(), &contents)
    }

    /// Validates cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ParamsError::Invalid`] describing the first violation.
    pub fn validate(&self) -> Result<(), ParamsError> {
        for (index, dataset) in self.datasets.iter().enumerate() {
            let duplicate = self
                .datasets
                .iter()
                .skip(index + 1)
                .any(|other| other.dataset_type == dataset.dataset_type);
            if duplicate {
                return Err(ParamsError::Invalid(format!(
                    "dataset type {} is declared more than once",
                    dataset.dataset_type
                )));
            }
        }
        if self.primary_dataset().is_none() {
            return Err(ParamsError::Invalid(String::from(
                "Datasets must include a TARGET_TIME_SERIES dataset",
            )));
        }
        if self.predictor.forecast_horizon <= 0 {
            return Err(ParamsError::Invalid(String::from(
                "Predictor.ForecastHorizon must be positive",
            )));
        }
        Ok(())
    }

    /// Returns the target time series dataset.
    #[must_use]
    pub fn primary_dataset(&self) -> Option<&DatasetParams> {
        self.datasets
            .iter()
            .find(|dataset| dataset.dataset_type == DatasetType::TargetTimeSeries)
    }
}

fn read_document(path: &Utf8Path) -> Result<String, ParamsError> {
    let io_error = |message: String| ParamsError::Io {
        path: path.to_string(),
        message,
    };
    let parent = path
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    let file_name = path
        .file_name()
        .ok_or_else(|| io_error(String::from("path is missing a file name")))?;
    let dir = Dir::open_ambient_dir(parent, ambient_authority())
        .map_err(|err| io_error(err.to_string()))?;
    dir.read_to_string(file_name)
        .map_err(|err| io_error(err.to_string()))
}
