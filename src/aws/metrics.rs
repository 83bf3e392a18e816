//! [`MetricsSink`] publishing to CloudWatch.

use aws_sdk_cloudwatch::Client;
use aws_sdk_cloudwatch::types::{Dimension, MetricDatum as CloudWatchDatum, StandardUnit};
use tracing::debug;

use super::error::build_error;
use crate::api::{ApiError, ApiFuture, MetricDatum, MetricsSink};

/// Maximum data points sent in one `PutMetricData` call.
pub const BATCH_SIZE: usize = 20;

/// CloudWatch metrics sink.
#[derive(Clone, Debug)]
pub struct CloudWatchMetrics {
    client: Client,
}

impl CloudWatchMetrics {
    /// Wraps an SDK client.
    #[must_use]
    pub const fn new(client: Client) -> Self {
        Self { client }
    }

    async fn put(&self, namespace: &str, data: &[MetricDatum]) -> Result<(), ApiError> {
        for batch in data.chunks(BATCH_SIZE) {
            let converted = batch.iter().map(to_cloudwatch).collect::<Vec<_>>();
            self.client
                .put_metric_data()
                .namespace(namespace)
                .set_metric_data(Some(converted))
                .send()
                .await
                .map_err(|err| ApiError::Service {
                    operation: String::from("PutMetricData"),
                    code: aws_sdk_cloudwatch::error::ProvideErrorMetadata::code(&err)
                        .map(str::to_owned),
                    message: err.to_string(),
                })?;
            debug!(namespace, count = batch.len(), "put metric data");
        }
        Ok(())
    }
}

fn to_cloudwatch(datum: &MetricDatum) -> CloudWatchDatum {
    let dimensions = datum
        .dimensions
        .iter()
        .map(|dimension| {
            Dimension::builder()
                .name(&dimension.name)
                .value(&dimension.value)
                .build()
        })
        .collect::<Vec<_>>();
    CloudWatchDatum::builder()
        .metric_name(&datum.name)
        .value(datum.value)
        .unit(StandardUnit::None)
        .set_dimensions(Some(dimensions))
        .build()
}

impl MetricsSink for CloudWatchMetrics {
    fn emit<'a>(&'a self, namespace: &'a str, data: &'a [MetricDatum]) -> ApiFuture<'a, ()> {
        Box::pin(async move {
            if namespace.trim().is_empty() {
                return Err(build_error(
                    "PutMetricData",
                    &"metric namespace must not be empty",
                ));
            }
            self.put(namespace, data).await
        })
    }
}
