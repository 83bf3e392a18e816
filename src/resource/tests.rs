//! Unit tests for resource naming and ARN parsing.

use super::*;
use rstest::rstest;

const PREFIX: &str = "arn:aws:forecast:us-east-1:123456789012:";

fn ts(value: &str) -> WorkflowTimestamp {
    WorkflowTimestamp::parse(value).expect("test timestamp should parse")
}

#[rstest]
#[case("demand-forecast", "demand_forecast")]
#[case("acme", "acme")]
#[case(" Acme-West-2 ", "Acme_West_2")]
fn project_name_replaces_hyphens(#[case] stack: &str, #[case] expected: &str) {
    assert_eq!(project_name(stack).expect("valid stack name"), expected);
}

#[rstest]
#[case("")]
#[case("2fast")]
#[case("_hidden")]
#[case("acme.west")]
#[case("acme west")]
fn project_name_rejects_unusable_values(#[case] stack: &str) {
    let err = project_name(stack).expect_err("stack name should be rejected");
    assert!(matches!(err, NamingError::InvalidProjectName { .. }));
}

#[rstest]
#[case("2024_01_05_09_30_00")]
#[case("1999_12_31_23_59_59")]
fn timestamp_round_trips(#[case] value: &str) {
    assert_eq!(ts(value).to_string(), value);
}

#[rstest]
#[case("2024_1_05_09_30_00")]
#[case("2024_13_01_00_00_00")]
#[case("2024_02_30_00_00_00")]
#[case("2024-01-05-09-30-00")]
#[case("2024_01_05_09_30_00_")]
#[case("")]
fn timestamp_rejects_malformed_values(#[case] value: &str) {
    assert_eq!(
        WorkflowTimestamp::parse(value),
        Err(NamingError::InvalidTimestamp {
            value: value.to_owned()
        })
    );
}

#[test]
fn timestamps_order_chronologically() {
    assert!(ts("2024_01_31_23_59_59") < ts("2024_02_01_00_00_00"));
}

#[test]
fn derived_arns_follow_the_naming_convention() {
    let stamp = ts("2024_03_01_00_00_00");
    let dataset = arn::dataset_name("acme", DatasetType::TargetTimeSeries);
    let forecast = arn::generation_name("acme", stamp);

    assert_eq!(
        arn::resource_arn(PREFIX, ResourceKind::Dataset, &dataset, None),
        format!("{PREFIX}dataset/acme_TARGET_TIME_SERIES")
    );
    assert_eq!(
        arn::resource_arn(
            PREFIX,
            ResourceKind::DatasetImportJob,
            &arn::generation_name(&dataset, stamp),
            Some(&dataset),
        ),
        format!(
            "{PREFIX}dataset-import-job/acme_TARGET_TIME_SERIES/acme_TARGET_TIME_SERIES_2024_03_01_00_00_00"
        )
    );
    assert_eq!(
        arn::resource_arn(
            PREFIX,
            ResourceKind::ForecastExportJob,
            &arn::generation_name(&forecast, stamp),
            Some(&forecast),
        ),
        format!(
            "{PREFIX}forecast-export-job/acme_2024_03_01_00_00_00/acme_2024_03_01_00_00_00_2024_03_01_00_00_00"
        )
    );
}

#[rstest]
#[case(ResourceKind::DatasetGroup)]
#[case(ResourceKind::Predictor)]
#[case(ResourceKind::Forecast)]
fn parse_recovers_project_and_timestamp(#[case] kind: ResourceKind) {
    let name = "acme_2024_01_01_00_00_00";
    let arn = arn::resource_arn(PREFIX, kind, name, None);

    let parsed = parse_arn(kind, &arn).expect("derived ARN should parse");

    assert_eq!(parsed.project, "acme");
    assert_eq!(parsed.name, name);
    assert_eq!(parsed.prefix, PREFIX);
    assert_eq!(parsed.timestamp, Some(ts("2024_01_01_00_00_00")));
    assert_eq!(parsed.parent_arn(), None);
}

#[test]
fn parse_keeps_underscored_project_names_together() {
    let arn = format!("{PREFIX}dataset-group/acme_west_2024_01_01_00_00_00");
    let parsed = parse_arn(ResourceKind::DatasetGroup, &arn).expect("ARN should parse");
    assert_eq!(parsed.project, "acme_west");
}

#[rstest]
#[case(ResourceKind::DatasetGroup, "dataset-group/acme_2024_13_01_00_00_00")]
#[case(ResourceKind::DatasetGroup, "dataset-group/acme_2024_1_01_00_00_00")]
#[case(ResourceKind::DatasetGroup, "dataset-group/acme")]
#[case(ResourceKind::DatasetGroup, "predictor/acme_2024_01_01_00_00_00")]
#[case(ResourceKind::Forecast, "forecast-export-job/acme_2024_01_01_00_00_00/acme_2024_01_01_00_00_00_2024_01_01_00_00_00")]
#[case(ResourceKind::Dataset, "dataset/acme_WEATHER")]
#[case(ResourceKind::DatasetImportJob, "dataset-import-job/acme_TARGET_TIME_SERIES/other_TARGET_TIME_SERIES_2024_01_01_00_00_00")]
#[case(ResourceKind::ForecastExportJob, "forecast-export-job/acme_2024_02_30_00_00_00/acme_2024_02_30_00_00_00_2024_03_01_00_00_00")]
fn parse_rejects_arns_outside_the_convention(#[case] kind: ResourceKind, #[case] path: &str) {
    assert_eq!(parse_arn(kind, &format!("{PREFIX}{path}")), None);
}

#[test]
fn parse_rejects_foreign_services() {
    let arn = "arn:aws:sagemaker:us-east-1:123456789012:dataset-group/acme_2024_01_01_00_00_00";
    assert_eq!(parse_arn(ResourceKind::DatasetGroup, arn), None);
}

#[test]
fn parse_accepts_other_partitions() {
    let arn = "arn:aws-cn:forecast:cn-north-1:123456789012:forecast/acme_2024_01_01_00_00_00";
    let parsed = parse_arn(ResourceKind::Forecast, arn).expect("ARN should parse");
    assert_eq!(parsed.prefix, "arn:aws-cn:forecast:cn-north-1:123456789012:");
}

#[rstest]
#[case("us-east-1", "arn:aws:forecast:us-east-1:123456789012:")]
#[case("cn-north-1", "arn:aws-cn:forecast:cn-north-1:123456789012:")]
#[case("us-gov-west-1", "arn:aws-us-gov:forecast:us-gov-west-1:123456789012:")]
#[case("us-isob-east-1", "arn:aws-iso-b:forecast:us-isob-east-1:123456789012:")]
fn derived_prefixes_carry_the_region_partition(#[case] region: &str, #[case] expected: &str) {
    let prefix = arn::arn_prefix(region, "123456789012");
    assert_eq!(prefix, expected);

    let derived = format!("{prefix}forecast/acme_2024_01_01_00_00_00");
    let parsed = parse_arn(ResourceKind::Forecast, &derived).expect("derived ARN should parse");
    assert_eq!(parsed.prefix, expected);
}

#[test]
fn nested_jobs_expose_their_parent_arn() {
    let import_job = format!(
        "{PREFIX}dataset-import-job/acme_ITEM_METADATA/acme_ITEM_METADATA_2024_01_01_00_00_00"
    );
    let export_job = format!(
        "{PREFIX}forecast-export-job/acme_2024_01_01_00_00_00/acme_2024_01_01_00_00_00_2024_01_02_00_00_00"
    );

    assert_eq!(
        parent_arn(ResourceKind::DatasetImportJob, &import_job),
        Some(format!("{PREFIX}dataset/acme_ITEM_METADATA"))
    );
    let parsed = parse_arn(ResourceKind::ForecastExportJob, &export_job).expect("should parse");
    assert_eq!(parsed.project, "acme");
    assert_eq!(parsed.timestamp, Some(ts("2024_01_02_00_00_00")));
    assert_eq!(
        parsed.parent_arn(),
        Some(format!("{PREFIX}forecast/acme_2024_01_01_00_00_00"))
    );
}

#[test]
fn datasets_parse_without_timestamp() {
    let arn = format!("{PREFIX}dataset/acme_west_RELATED_TIME_SERIES");
    let parsed = parse_arn(ResourceKind::Dataset, &arn).expect("dataset ARN should parse");
    assert_eq!(parsed.project, "acme_west");
    assert_eq!(parsed.timestamp, None);
}

#[test]
fn descriptors_match_their_kind() {
    for kind in ResourceKind::ALL {
        assert_eq!(kind.descriptor().kind, kind);
        assert_eq!(kind.descriptor().timestamped, kind != ResourceKind::Dataset);
    }
}
