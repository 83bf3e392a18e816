//! [`ForecastApi`] over `aws-sdk-forecast`.

use aws_sdk_forecast::Client;
use aws_sdk_forecast::types::{
    AttributeType, DataDestination, DataSource, DatasetType, Domain, FeaturizationConfig, Filter,
    FilterConditionString, InputDataConfig, S3Config, Schema, SchemaAttribute,
    SupplementaryFeature,
};
use tracing::debug;

use super::error::{build_error, classify_sdk_error, missing_field};
use crate::api::{
    AlgorithmAccuracy, ApiError, ApiFuture, CreateRequest, ForecastApi, QuantileLoss,
    ResourceDescription, ResourceSummary,
};
use crate::params::{DatasetParams, PredictorParams};
use crate::resource::ResourceKind;
use crate::status::ResourceStatus;

/// Forecast client backed by the AWS SDK.
#[derive(Clone, Debug)]
pub struct AwsForecastApi {
    client: Client,
}

impl AwsForecastApi {
    /// Wraps an SDK client.
    #[must_use]
    pub const fn new(client: Client) -> Self {
        Self { client }
    }

    async fn describe_now(
        &self,
        kind: ResourceKind,
        arn: &str,
    ) -> Result<ResourceDescription, ApiError> {
        let (status, message) = match kind {
            ResourceKind::Dataset => {
                let output = self
                    .client
                    .describe_dataset()
                    .dataset_arn(arn)
                    .send()
                    .await
                    .map_err(|err| classify_sdk_error("DescribeDataset", kind, arn, &err))?;
                (output.status().map(str::to_owned), None)
            }
            ResourceKind::DatasetGroup => {
                let output = self
                    .client
                    .describe_dataset_group()
                    .dataset_group_arn(arn)
                    .send()
                    .await
                    .map_err(|err| classify_sdk_error("DescribeDatasetGroup", kind, arn, &err))?;
                (output.status().map(str::to_owned), None)
            }
            ResourceKind::DatasetImportJob => {
                let output = self
                    .client
                    .describe_dataset_import_job()
                    .dataset_import_job_arn(arn)
                    .send()
                    .await
                    .map_err(|err| {
                        classify_sdk_error("DescribeDatasetImportJob", kind, arn, &err)
                    })?;
                (
                    output.status().map(str::to_owned),
                    output.message().map(str::to_owned),
                )
            }
            ResourceKind::Predictor => {
                let output = self
                    .client
                    .describe_predictor()
                    .predictor_arn(arn)
                    .send()
                    .await
                    .map_err(|err| classify_sdk_error("DescribePredictor", kind, arn, &err))?;
                (
                    output.status().map(str::to_owned),
                    output.message().map(str::to_owned),
                )
            }
            ResourceKind::Forecast => {
                let output = self
                    .client
                    .describe_forecast()
                    .forecast_arn(arn)
                    .send()
                    .await
                    .map_err(|err| classify_sdk_error("DescribeForecast", kind, arn, &err))?;
                (
                    output.status().map(str::to_owned),
                    output.message().map(str::to_owned),
                )
            }
            ResourceKind::ForecastExportJob => {
                let output = self
                    .client
                    .describe_forecast_export_job()
                    .forecast_export_job_arn(arn)
                    .send()
                    .await
                    .map_err(|err| {
                        classify_sdk_error("DescribeForecastExportJob", kind, arn, &err)
                    })?;
                (
                    output.status().map(str::to_owned),
                    output.message().map(str::to_owned),
                )
            }
        };
        let Some(status) = status else {
            return Err(missing_field(&format!("Describe{}", kind_operation(kind)), "Status"));
        };
        debug!(kind = %kind, arn, status = %status, "described resource");
        Ok(ResourceDescription {
            arn: arn.to_owned(),
            status: ResourceStatus::parse(&status),
            message,
        })
    }

    async fn create_now(&self, request: &CreateRequest) -> Result<String, ApiError> {
        let kind = request.kind();
        let created = match request {
            CreateRequest::Dataset { name, params } => self.create_dataset(name, params).await?,
            CreateRequest::DatasetGroup {
                name,
                domain,
                dataset_arns,
            } => self
                .client
                .create_dataset_group()
                .dataset_group_name(name)
                .domain(Domain::from(domain.as_str()))
                .set_dataset_arns(Some(dataset_arns.clone()))
                .send()
                .await
                .map_err(|err| classify_sdk_error("CreateDatasetGroup", kind, name, &err))?
                .dataset_group_arn()
                .map(str::to_owned),
            CreateRequest::DatasetImportJob {
                name,
                dataset_arn,
                s3_path,
                role_arn,
                timestamp_format,
            } => {
                let source = DataSource::builder()
                    .s3_config(s3_config("CreateDatasetImportJob", s3_path, role_arn)?)
                    .build();
                self.client
                    .create_dataset_import_job()
                    .dataset_import_job_name(name)
                    .dataset_arn(dataset_arn)
                    .data_source(source)
                    .timestamp_format(timestamp_format)
                    .send()
                    .await
                    .map_err(|err| classify_sdk_error("CreateDatasetImportJob", kind, name, &err))?
                    .dataset_import_job_arn()
                    .map(str::to_owned)
            }
            CreateRequest::Predictor {
                name,
                params,
                dataset_group_arn,
            } => {
                self.create_predictor(name, params, dataset_group_arn)
                    .await?
            }
            CreateRequest::Forecast {
                name,
                predictor_arn,
                forecast_types,
            } => self
                .client
                .create_forecast()
                .forecast_name(name)
                .predictor_arn(predictor_arn)
                .set_forecast_types(non_empty(forecast_types))
                .send()
                .await
                .map_err(|err| classify_sdk_error("CreateForecast", kind, name, &err))?
                .forecast_arn()
                .map(str::to_owned),
            CreateRequest::ForecastExportJob {
                name,
                forecast_arn,
                s3_path,
                role_arn,
            } => {
                let destination = DataDestination::builder()
                    .s3_config(s3_config("CreateForecastExportJob", s3_path, role_arn)?)
                    .build();
                self.client
                    .create_forecast_export_job()
                    .forecast_export_job_name(name)
                    .forecast_arn(forecast_arn)
                    .destination(destination)
                    .send()
                    .await
                    .map_err(|err| classify_sdk_error("CreateForecastExportJob", kind, name, &err))?
                    .forecast_export_job_arn()
                    .map(str::to_owned)
            }
        };
        created.ok_or_else(|| {
            missing_field(
                &format!("Create{}", kind_operation(kind)),
                &format!("the ARN of {}", request.name()),
            )
        })
    }

    async fn create_dataset(
        &self,
        name: &str,
        params: &DatasetParams,
    ) -> Result<Option<String>, ApiError> {
        let attributes = params
            .schema
            .attributes
            .iter()
            .map(|attribute| {
                SchemaAttribute::builder()
                    .attribute_name(&attribute.attribute_name)
                    .attribute_type(AttributeType::from(attribute.attribute_type.as_str()))
                    .build()
            })
            .collect::<Vec<_>>();
        let output = self
            .client
            .create_dataset()
            .dataset_name(name)
            .domain(Domain::from(params.domain.as_str()))
            .dataset_type(DatasetType::from(params.dataset_type.as_str()))
            .set_data_frequency(params.data_frequency.clone())
            .schema(Schema::builder().set_attributes(Some(attributes)).build())
            .send()
            .await
            .map_err(|err| classify_sdk_error("CreateDataset", ResourceKind::Dataset, name, &err))?;
        Ok(output.dataset_arn().map(str::to_owned))
    }

    async fn create_predictor(
        &self,
        name: &str,
        params: &PredictorParams,
        dataset_group_arn: &str,
    ) -> Result<Option<String>, ApiError> {
        const OPERATION: &str = "CreatePredictor";
        let features = params
            .input_data_config
            .as_ref()
            .map(|config| config.supplementary_features.as_slice())
            .unwrap_or_default()
            .iter()
            .map(|feature| {
                SupplementaryFeature::builder()
                    .name(&feature.name)
                    .value(&feature.value)
                    .build()
                    .map_err(|err| build_error(OPERATION, &err))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let input = InputDataConfig::builder()
            .dataset_group_arn(dataset_group_arn)
            .set_supplementary_features(non_empty(&features))
            .build()
            .map_err(|err| build_error(OPERATION, &err))?;
        let featurization = FeaturizationConfig::builder()
            .forecast_frequency(&params.featurization_config.forecast_frequency)
            .build()
            .map_err(|err| build_error(OPERATION, &err))?;
        let output = self
            .client
            .create_predictor()
            .predictor_name(name)
            .set_algorithm_arn(params.algorithm_arn.clone())
            .forecast_horizon(params.forecast_horizon)
            .set_perform_auto_ml(params.perform_auto_ml)
            .set_perform_hpo(params.perform_hpo)
            .input_data_config(input)
            .featurization_config(featurization)
            .set_forecast_types(non_empty(&params.forecast_types))
            .send()
            .await
            .map_err(|err| classify_sdk_error(OPERATION, ResourceKind::Predictor, name, &err))?;
        Ok(output.predictor_arn().map(str::to_owned))
    }

    async fn delete_now(&self, kind: ResourceKind, arn: &str) -> Result<(), ApiError> {
        match kind {
            ResourceKind::Dataset => {
                self.client
                    .delete_dataset()
                    .dataset_arn(arn)
                    .send()
                    .await
                    .map_err(|err| classify_sdk_error("DeleteDataset", kind, arn, &err))?;
            }
            ResourceKind::DatasetGroup => {
                self.client
                    .delete_dataset_group()
                    .dataset_group_arn(arn)
                    .send()
                    .await
                    .map_err(|err| classify_sdk_error("DeleteDatasetGroup", kind, arn, &err))?;
            }
            ResourceKind::DatasetImportJob => {
                self.client
                    .delete_dataset_import_job()
                    .dataset_import_job_arn(arn)
                    .send()
                    .await
                    .map_err(|err| classify_sdk_error("DeleteDatasetImportJob", kind, arn, &err))?;
            }
            ResourceKind::Predictor => {
                self.client
                    .delete_predictor()
                    .predictor_arn(arn)
                    .send()
                    .await
                    .map_err(|err| classify_sdk_error("DeletePredictor", kind, arn, &err))?;
            }
            ResourceKind::Forecast => {
                self.client
                    .delete_forecast()
                    .forecast_arn(arn)
                    .send()
                    .await
                    .map_err(|err| classify_sdk_error("DeleteForecast", kind, arn, &err))?;
            }
            ResourceKind::ForecastExportJob => {
                self.client
                    .delete_forecast_export_job()
                    .forecast_export_job_arn(arn)
                    .send()
                    .await
                    .map_err(|err| {
                        classify_sdk_error("DeleteForecastExportJob", kind, arn, &err)
                    })?;
            }
        }
        Ok(())
    }

    async fn list_now(
        &self,
        kind: ResourceKind,
        status: Option<&ResourceStatus>,
    ) -> Result<Vec<ResourceSummary>, ApiError> {
        let filters = match status {
            Some(wanted) if kind.descriptor().status_filter => {
                Some(vec![status_filter(kind, wanted)?])
            }
            _ => None,
        };
        let mut summaries = Vec::new();
        match kind {
            ResourceKind::Dataset => {
                let mut pages = self.client.list_datasets().into_paginator().send();
                while let Some(page) = pages.next().await {
                    let output =
                        page.map_err(|err| classify_sdk_error("ListDatasets", kind, "", &err))?;
                    summaries.extend(output.datasets().iter().filter_map(|found| {
                        summary(found.dataset_arn(), None, None)
                    }));
                }
            }
            ResourceKind::DatasetGroup => {
                let mut pages = self.client.list_dataset_groups().into_paginator().send();
                while let Some(page) = pages.next().await {
                    let output = page
                        .map_err(|err| classify_sdk_error("ListDatasetGroups", kind, "", &err))?;
                    summaries.extend(output.dataset_groups().iter().filter_map(|found| {
                        summary(found.dataset_group_arn(), None, None)
                    }));
                }
            }
            ResourceKind::DatasetImportJob => {
                let mut pages = self
                    .client
                    .list_dataset_import_jobs()
                    .set_filters(filters)
                    .into_paginator()
                    .send();
                while let Some(page) = pages.next().await {
                    let output = page.map_err(|err| {
                        classify_sdk_error("ListDatasetImportJobs", kind, "", &err)
                    })?;
                    summaries.extend(output.dataset_import_jobs().iter().filter_map(|found| {
                        summary(found.dataset_import_job_arn(), found.status(), None)
                    }));
                }
            }
            ResourceKind::Predictor => {
                let mut pages = self
                    .client
                    .list_predictors()
                    .set_filters(filters)
                    .into_paginator()
                    .send();
                while let Some(page) = pages.next().await {
                    let output = page
                        .map_err(|err| classify_sdk_error("ListPredictors", kind, "", &err))?;
                    summaries.extend(output.predictors().iter().filter_map(|found| {
                        summary(
                            found.predictor_arn(),
                            found.status(),
                            found.dataset_group_arn(),
                        )
                    }));
                }
            }
            ResourceKind::Forecast => {
                let mut pages = self
                    .client
                    .list_forecasts()
                    .set_filters(filters)
                    .into_paginator()
                    .send();
                while let Some(page) = pages.next().await {
                    let output =
                        page.map_err(|err| classify_sdk_error("ListForecasts", kind, "", &err))?;
                    summaries.extend(output.forecasts().iter().filter_map(|found| {
                        summary(found.forecast_arn(), found.status(), found.predictor_arn())
                    }));
                }
            }
            ResourceKind::ForecastExportJob => {
                let mut pages = self
                    .client
                    .list_forecast_export_jobs()
                    .set_filters(filters)
                    .into_paginator()
                    .send();
                while let Some(page) = pages.next().await {
                    let output = page.map_err(|err| {
                        classify_sdk_error("ListForecastExportJobs", kind, "", &err)
                    })?;
                    summaries.extend(output.forecast_export_jobs().iter().filter_map(|found| {
                        summary(found.forecast_export_job_arn(), found.status(), None)
                    }));
                }
            }
        }
        debug!(kind = %kind, count = summaries.len(), "listed resources");
        Ok(summaries)
    }

    async fn members_now(&self, dataset_group_arn: &str) -> Result<Vec<String>, ApiError> {
        let output = self
            .client
            .describe_dataset_group()
            .dataset_group_arn(dataset_group_arn)
            .send()
            .await
            .map_err(|err| {
                classify_sdk_error(
                    "DescribeDatasetGroup",
                    ResourceKind::DatasetGroup,
                    dataset_group_arn,
                    &err,
                )
            })?;
        Ok(output.dataset_arns().to_vec())
    }

    async fn accuracy_now(&self, predictor_arn: &str) -> Result<Vec<AlgorithmAccuracy>, ApiError> {
        let output = self
            .client
            .get_accuracy_metrics()
            .predictor_arn(predictor_arn)
            .send()
            .await
            .map_err(|err| {
                classify_sdk_error(
                    "GetAccuracyMetrics",
                    ResourceKind::Predictor,
                    predictor_arn,
                    &err,
                )
            })?;
        Ok(output
            .predictor_evaluation_results()
            .iter()
            .filter_map(|result| {
                let algorithm_arn = result.algorithm_arn()?.to_owned();
                // Only the first test window is reported.
                let metrics = result.test_windows().first()?.metrics()?;
                let weighted_quantile_losses = metrics
                    .weighted_quantile_losses()
                    .iter()
                    .filter_map(|loss| {
                        Some(QuantileLoss {
                            quantile: loss.quantile()?,
                            loss: loss.loss_value()?,
                        })
                    })
                    .collect();
                let rmse = metrics.error_metrics().iter().find_map(|metric| metric.rmse());
                Some(AlgorithmAccuracy {
                    algorithm_arn,
                    rmse,
                    weighted_quantile_losses,
                })
            })
            .collect())
    }
}

const fn kind_operation(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::Dataset => "Dataset",
        ResourceKind::DatasetGroup => "DatasetGroup",
        ResourceKind::DatasetImportJob => "DatasetImportJob",
        ResourceKind::Predictor => "Predictor",
        ResourceKind::Forecast => "Forecast",
        ResourceKind::ForecastExportJob => "ForecastExportJob",
    }
}

fn s3_config(operation: &str, path: &str, role_arn: &str) -> Result<S3Config, ApiError> {
    S3Config::builder()
        .path(path)
        .role_arn(role_arn)
        .build()
        .map_err(|err| build_error(operation, &err))
}

fn status_filter(kind: ResourceKind, status: &ResourceStatus) -> Result<Filter, ApiError> {
    Filter::builder()
        .key("Status")
        .value(status.as_str())
        .condition(FilterConditionString::Is)
        .build()
        .map_err(|err| build_error(&format!("List{}s", kind_operation(kind)), &err))
}

fn non_empty<T: Clone>(values: &[T]) -> Option<Vec<T>> {
    (!values.is_empty()).then(|| values.to_vec())
}

fn summary(
    arn: Option<&str>,
    status: Option<&str>,
    parent_arn: Option<&str>,
) -> Option<ResourceSummary> {
    Some(ResourceSummary {
        arn: arn?.to_owned(),
        status: status.map(ResourceStatus::parse),
        parent_arn: parent_arn.map(str::to_owned),
    })
}

impl ForecastApi for AwsForecastApi {
    fn describe<'a>(
        &'a self,
        kind: ResourceKind,
        arn: &'a str,
    ) -> ApiFuture<'a, ResourceDescription> {
        Box::pin(self.describe_now(kind, arn))
    }

    fn create<'a>(&'a self, request: &'a CreateRequest) -> ApiFuture<'a, String> {
        Box::pin(self.create_now(request))
    }

    fn delete<'a>(&'a self, kind: ResourceKind, arn: &'a str) -> ApiFuture<'a, ()> {
        Box::pin(self.delete_now(kind, arn))
    }

    fn list<'a>(
        &'a self,
        kind: ResourceKind,
        status: Option<&'a ResourceStatus>,
    ) -> ApiFuture<'a, Vec<ResourceSummary>> {
        Box::pin(self.list_now(kind, status))
    }

    fn dataset_group_members<'a>(
        &'a self,
        dataset_group_arn: &'a str,
    ) -> ApiFuture<'a, Vec<String>> {
        Box::pin(self.members_now(dataset_group_arn))
    }

    fn accuracy_metrics<'a>(
        &'a self,
        predictor_arn: &'a str,
    ) -> ApiFuture<'a, Vec<AlgorithmAccuracy>> {
        Box::pin(self.accuracy_now(predictor_arn))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(&[], None)]
    #[case(&["0.5"], Some(vec![String::from("0.5")]))]
    fn empty_lists_are_omitted(#[case] values: &[&str], #[case] expected: Option<Vec<String>>) {
        let owned = values.iter().map(|value| (*value).to_owned()).collect::<Vec<_>>();
        assert_eq!(non_empty(&owned), expected);
    }

    #[test]
    fn summaries_without_arn_are_dropped() {
        assert_eq!(summary(None, Some("ACTIVE"), None), None);
        assert_eq!(
            summary(Some("arn"), Some("DELETE_PENDING"), Some("parent")),
            Some(ResourceSummary {
                arn: String::from("arn"),
                status: Some(ResourceStatus::DeletePending),
                parent_arn: Some(String::from("parent")),
            })
        );
    }

    #[test]
    fn status_filters_use_the_wire_status() {
        let filter = status_filter(ResourceKind::Predictor, &ResourceStatus::DeleteInProgress)
            .expect("filter should build");
        assert_eq!(filter.key(), "Status");
        assert_eq!(filter.value(), "DELETE_IN_PROGRESS");
        assert_eq!(filter.condition(), &FilterConditionString::Is);
    }
}
