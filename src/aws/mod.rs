//! AWS implementations of the workflow's API seams.
//!
//! [`AwsContext`] loads the SDK configuration once; service clients are
//! built from it for [`forecast::AwsForecastApi`],
//! [`metrics::CloudWatchMetrics`] and the STS identity lookup in
//! [`account`].

pub mod account;
pub mod error;
pub mod forecast;
pub mod metrics;

use std::sync::Arc;

use aws_config::{BehaviorVersion, Region, SdkConfig};

pub use account::account_id;
pub use forecast::AwsForecastApi;
pub use metrics::CloudWatchMetrics;

use crate::api::ApiError;

/// Loaded AWS SDK configuration shared by every client.
#[derive(Clone)]
pub struct AwsContext {
    config: Arc<SdkConfig>,
    region: String,
}

impl AwsContext {
    /// Loads the SDK configuration.
    ///
    /// An explicit `region` overrides the SDK's provider chain.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Service`] when no region is configured anywhere.
    pub async fn load(region: Option<&str>) -> Result<Self, ApiError> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(name) = region {
            loader = loader.region(Region::new(name.to_owned()));
        }
        let config = loader.load().await;
        let resolved = config
            .region()
            .map(ToString::to_string)
            .ok_or_else(|| ApiError::Service {
                operation: String::from("LoadConfig"),
                code: None,
                message: String::from(
                    "no AWS region configured: set FLOW_REGION or AWS_REGION",
                ),
            })?;
        Ok(Self {
            config: Arc::new(config),
            region: resolved,
        })
    }

    /// Underlying SDK configuration.
    #[must_use]
    pub fn sdk_config(&self) -> &SdkConfig {
        &self.config
    }

    /// Resolved region name.
    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Forecast API client.
    #[must_use]
    pub fn forecast_client(&self) -> aws_sdk_forecast::Client {
        aws_sdk_forecast::Client::new(self.sdk_config())
    }

    /// CloudWatch client.
    #[must_use]
    pub fn cloudwatch_client(&self) -> aws_sdk_cloudwatch::Client {
        aws_sdk_cloudwatch::Client::new(self.sdk_config())
    }

    /// STS client.
    #[must_use]
    pub fn sts_client(&self) -> aws_sdk_sts::Client {
        aws_sdk_sts::Client::new(self.sdk_config())
    }
}

impl std::fmt::Debug for AwsContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsContext")
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}
