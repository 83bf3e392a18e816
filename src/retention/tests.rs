//! Unit tests for retention decisions and sweeps.

use super::*;
use rstest::rstest;

use crate::api::ResourceSummary;
use crate::resource::WorkflowTimestamp;
use crate::status::Readiness;
use crate::test_support::{FakeForecastApi, test_arn_prefix};

const JAN: &str = "2024_01_01_00_00_00";
const FEB: &str = "2024_02_01_00_00_00";
const MAR: &str = "2024_03_01_00_00_00";

fn arn(path: &str) -> String {
    format!("{}{path}", test_arn_prefix())
}

fn candidate(stamp: &str, status: ResourceStatus) -> RetentionCandidate {
    RetentionCandidate {
        arn: arn(&format!("dataset-group/acme_{stamp}")),
        project: String::from("acme"),
        timestamp: Some(WorkflowTimestamp::parse(stamp).expect("timestamp")),
        status: Some(status),
        parent_arn: None,
    }
}

fn seed_groups(api: &FakeForecastApi, project: &str, stamps: &[&str]) -> Vec<String> {
    stamps
        .iter()
        .map(|stamp| {
            let group = arn(&format!("dataset-group/{project}_{stamp}"));
            api.insert(ResourceKind::DatasetGroup, &group, ResourceStatus::Active);
            group
        })
        .collect()
}

#[rstest]
#[case(0, 0)]
#[case(1, 0)]
#[case(2, 0)]
#[case(3, 1)]
#[case(6, 4)]
fn keep_latest_selects_all_but_the_newest_two(#[case] count: u32, #[case] expected: usize) {
    let candidates = (1..=count)
        .rev()
        .map(|day| candidate(&format!("2024_01_{day:02}_00_00_00"), ResourceStatus::Active))
        .collect::<Vec<_>>();

    let outdated = select_outdated(&candidates, 2);

    assert_eq!(outdated.len(), expected);
    let newest_outdated = outdated.iter().filter_map(|found| found.timestamp).max();
    let oldest_kept = candidates
        .iter()
        .filter(|found| !outdated.contains(found))
        .filter_map(|found| found.timestamp)
        .min();
    if let (Some(outdated_max), Some(kept_min)) = (newest_outdated, oldest_kept) {
        assert!(outdated_max < kept_min);
    }
}

#[test]
fn draining_candidates_do_not_count_towards_the_kept_generations() {
    let candidates = vec![
        candidate(JAN, ResourceStatus::DeletePending),
        candidate(FEB, ResourceStatus::Active),
        candidate(MAR, ResourceStatus::Active),
    ];

    assert!(select_outdated(&candidates, 2).is_empty());
}

#[test]
fn summaries_outside_the_convention_are_discarded() {
    let summary = ResourceSummary {
        arn: arn("dataset-group/manual-group"),
        status: None,
        parent_arn: None,
    };
    assert_eq!(
        RetentionCandidate::from_summary(ResourceKind::DatasetGroup, summary),
        None
    );
}

#[tokio::test]
async fn sweep_deletes_only_the_oldest_group() {
    let api = FakeForecastApi::new();
    let groups = seed_groups(&api, "acme", &[MAR, JAN, FEB]);
    seed_groups(&api, "acme_west", &[JAN]);
    seed_groups(&api, "acmecorp", &[JAN]);

    let outcome = Sweeper::new(&api, "acme")
        .sweep(ResourceKind::DatasetGroup)
        .await
        .expect("sweep should succeed");

    assert_eq!(api.deleted(), [groups[1].clone()]);
    let StepOutcome::Pending(pending) = outcome else {
        panic!("deleted group should still be draining, got {outcome:?}");
    };
    assert_eq!(pending.arns, [groups[1].clone()]);
}

#[tokio::test]
async fn sweep_is_ready_once_deletes_finish() {
    let api = FakeForecastApi::new();
    seed_groups(&api, "acme", &[JAN, FEB, MAR]);
    let sweeper = Sweeper::new(&api, "acme");

    sweeper
        .sweep(ResourceKind::DatasetGroup)
        .await
        .expect("first sweep");
    let draining = sweeper
        .sweep(ResourceKind::DatasetGroup)
        .await
        .expect("second sweep");
    assert_eq!(draining.readiness(), Readiness::Pending);
    assert_eq!(api.deleted().len(), 1, "draining groups are not deleted again");

    api.finish_deletes();
    let settled = sweeper
        .sweep(ResourceKind::DatasetGroup)
        .await
        .expect("third sweep");

    let report = settled.ready().expect("sweep should be settled");
    assert!(report.deleted.is_empty());
    assert_eq!(api.deleted().len(), 1);
}

#[tokio::test]
async fn dataset_cascade_spares_datasets_of_retained_groups() {
    let api = FakeForecastApi::new();
    let groups = seed_groups(&api, "acme", &[JAN, FEB, MAR]);
    let target = arn("dataset/acme_TARGET_TIME_SERIES");
    let related = arn("dataset/acme_RELATED_TIME_SERIES");
    let metadata = arn("dataset/acme_ITEM_METADATA");
    let unrelated = arn("dataset/other_RELATED_TIME_SERIES");
    for dataset in [&target, &related, &metadata, &unrelated] {
        api.insert(ResourceKind::Dataset, dataset, ResourceStatus::Active);
    }
    api.set_members(&groups[0], &[&target, &related, &unrelated]);
    api.set_members(&groups[1], &[&target, &metadata]);
    api.set_members(&groups[2], &[&target, &metadata]);

    let targets = Sweeper::new(&api, "acme")
        .deletion_targets(ResourceKind::Dataset)
        .await
        .expect("targets should compute");

    let arns = targets.into_iter().map(|found| found.arn).collect::<Vec<_>>();
    assert_eq!(arns, [related]);
}

#[tokio::test]
async fn import_jobs_cascade_from_outdated_datasets_only() {
    let api = FakeForecastApi::new();
    let groups = seed_groups(&api, "acme", &[JAN, FEB, MAR]);
    let target = arn("dataset/acme_TARGET_TIME_SERIES");
    let related = arn("dataset/acme_RELATED_TIME_SERIES");
    api.insert(ResourceKind::Dataset, &target, ResourceStatus::Active);
    api.insert(ResourceKind::Dataset, &related, ResourceStatus::Active);
    api.set_members(&groups[0], &[&target, &related]);
    api.set_members(&groups[1], &[&target]);
    api.set_members(&groups[2], &[&target]);
    let outdated_job = arn(&format!(
        "dataset-import-job/acme_RELATED_TIME_SERIES/acme_RELATED_TIME_SERIES_{JAN}"
    ));
    let kept_jobs = [FEB, MAR].map(|stamp| {
        arn(&format!(
            "dataset-import-job/acme_TARGET_TIME_SERIES/acme_TARGET_TIME_SERIES_{stamp}"
        ))
    });
    api.insert(ResourceKind::DatasetImportJob, &outdated_job, ResourceStatus::Active);
    for job in &kept_jobs {
        api.insert(ResourceKind::DatasetImportJob, job, ResourceStatus::Active);
    }
    api.delete_instantly();

    let outcome = Sweeper::new(&api, "acme")
        .sweep(ResourceKind::DatasetImportJob)
        .await
        .expect("sweep should succeed");

    let report = outcome.ready().expect("instant deletes settle immediately");
    assert_eq!(report.deleted, [outdated_job.clone()]);
    assert_eq!(api.deleted(), [outdated_job]);
}

fn seed_shared_generations(api: &FakeForecastApi, stamps: &[&str]) -> Vec<String> {
    let dataset = arn("dataset/acme_TARGET_TIME_SERIES");
    api.insert(ResourceKind::Dataset, &dataset, ResourceStatus::Active);
    for group in seed_groups(api, "acme", stamps) {
        api.set_members(&group, &[&dataset]);
    }
    stamps
        .iter()
        .map(|stamp| {
            let job = arn(&format!(
                "dataset-import-job/acme_TARGET_TIME_SERIES/acme_TARGET_TIME_SERIES_{stamp}"
            ));
            api.insert(ResourceKind::DatasetImportJob, &job, ResourceStatus::Active);
            job
        })
        .collect()
}

#[tokio::test]
async fn shared_datasets_survive_while_a_group_uses_them() {
    let api = FakeForecastApi::new();
    seed_shared_generations(&api, &[JAN, FEB, MAR]);

    let targets = Sweeper::new(&api, "acme")
        .deletion_targets(ResourceKind::Dataset)
        .await
        .expect("targets should compute");

    assert!(targets.is_empty(), "unexpected targets: {targets:?}");
}

#[tokio::test]
async fn import_jobs_of_a_shared_dataset_keep_the_newest_two() {
    let api = FakeForecastApi::new();
    let jobs = seed_shared_generations(&api, &[FEB, JAN, MAR]);
    api.delete_instantly();

    let outcome = Sweeper::new(&api, "acme")
        .sweep(ResourceKind::DatasetImportJob)
        .await
        .expect("sweep should succeed");

    let report = outcome.ready().expect("instant deletes settle immediately");
    assert_eq!(report.deleted, [jobs[1].clone()]);
    assert_eq!(api.deleted(), [jobs[1].clone()]);
}

#[test]
fn per_parent_selection_keeps_each_parents_newest() {
    let child = |parent: &str, stamp: &str| RetentionCandidate {
        arn: arn(&format!("dataset-import-job/{parent}/{parent}_{stamp}")),
        project: String::from("acme"),
        timestamp: Some(WorkflowTimestamp::parse(stamp).expect("timestamp")),
        status: Some(ResourceStatus::Active),
        parent_arn: Some(arn(&format!("dataset/{parent}"))),
    };
    let candidates = vec![
        child("acme_TARGET_TIME_SERIES", MAR),
        child("acme_TARGET_TIME_SERIES", JAN),
        child("acme_RELATED_TIME_SERIES", JAN),
        child("acme_TARGET_TIME_SERIES", FEB),
    ];

    let outdated = select_outdated_per_parent(&candidates, 2);

    assert_eq!(outdated, [&candidates[1]]);
}

#[tokio::test]
async fn forecasts_cascade_through_listing_parents() {
    let api = FakeForecastApi::new();
    let predictors = [JAN, FEB, MAR].map(|stamp| arn(&format!("predictor/acme_{stamp}")));
    for predictor in &predictors {
        api.insert(ResourceKind::Predictor, predictor, ResourceStatus::Active);
    }
    let stale = arn(&format!("forecast/acme_{JAN}"));
    let fresh = arn(&format!("forecast/acme_{FEB}"));
    api.insert_with_parent(
        ResourceKind::Forecast,
        &stale,
        ResourceStatus::Active,
        Some(&predictors[0]),
    );
    api.insert_with_parent(
        ResourceKind::Forecast,
        &fresh,
        ResourceStatus::Active,
        Some(&predictors[1]),
    );

    let targets = Sweeper::new(&api, "acme")
        .with_policy(ResourceKind::Forecast, RetentionPolicy::Cascade)
        .deletion_targets(ResourceKind::Forecast)
        .await
        .expect("targets should compute");

    assert_eq!(
        targets.into_iter().map(|found| found.arn).collect::<Vec<_>>(),
        [stale]
    );
}

#[tokio::test]
async fn predictors_can_follow_their_dataset_groups() {
    let api = FakeForecastApi::new();
    let groups = seed_groups(&api, "acme", &[JAN, FEB, MAR]);
    let stale = arn(&format!("predictor/acme_{MAR}"));
    let fresh = arn(&format!("predictor/acme_{JAN}"));
    api.insert_with_parent(
        ResourceKind::Predictor,
        &stale,
        ResourceStatus::Active,
        Some(&groups[0]),
    );
    api.insert_with_parent(
        ResourceKind::Predictor,
        &fresh,
        ResourceStatus::Active,
        Some(&groups[2]),
    );

    let targets = Sweeper::new(&api, "acme")
        .with_policy(ResourceKind::Predictor, RetentionPolicy::Cascade)
        .deletion_targets(ResourceKind::Predictor)
        .await
        .expect("targets should compute");

    assert_eq!(
        targets.into_iter().map(|found| found.arn).collect::<Vec<_>>(),
        [stale]
    );
}

#[tokio::test]
async fn sweep_classifies_refused_and_vanished_deletes() {
    let api = FakeForecastApi::new();
    let predictors = [JAN, FEB, MAR, "2024_04_01_00_00_00", "2024_05_01_00_00_00"]
        .map(|stamp| arn(&format!("predictor/acme_{stamp}")));
    api.insert(ResourceKind::Predictor, &predictors[0], ResourceStatus::Active);
    api.insert(ResourceKind::Predictor, &predictors[1], ResourceStatus::CreateFailed);
    api.insert(ResourceKind::Predictor, &predictors[2], ResourceStatus::CreateInProgress);
    api.insert(ResourceKind::Predictor, &predictors[3], ResourceStatus::Active);
    api.insert(ResourceKind::Predictor, &predictors[4], ResourceStatus::Active);
    api.fail_delete(
        &predictors[0],
        ApiError::ResourceInUse {
            kind: ResourceKind::Predictor,
            arn: predictors[0].clone(),
        },
    );
    api.fail_delete(
        &predictors[1],
        ApiError::NotFound {
            kind: ResourceKind::Predictor,
            arn: predictors[1].clone(),
        },
    );

    let outcome = Sweeper::new(&api, "acme")
        .sweep(ResourceKind::Predictor)
        .await
        .expect("sweep should succeed");

    let StepOutcome::Pending(pending) = outcome else {
        panic!("blocked delete should keep the sweep pending, got {outcome:?}");
    };
    assert_eq!(pending.arns, [predictors[0].clone()]);
    assert!(api.deleted().is_empty());
    assert_eq!(
        api.status_of(&predictors[2]),
        Some(ResourceStatus::CreateInProgress)
    );
}

#[test]
fn settled_reports_are_ready() {
    let report = SweepReport {
        deleted: vec![arn(&format!("forecast/acme_{JAN}"))],
        already_deleted: Vec::new(),
        still_deleting: Vec::new(),
        blocked: Vec::new(),
        skipped: Vec::new(),
    };

    assert!(report.clone().into_outcome(ResourceKind::Forecast).is_ready());
    let unsettled = SweepReport {
        still_deleting: report.deleted.clone(),
        ..report
    };
    assert_eq!(
        unsettled.into_outcome(ResourceKind::Forecast).readiness(),
        Readiness::Pending
    );
}
