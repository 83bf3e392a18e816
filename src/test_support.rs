//! Test support utilities shared across unit and integration tests.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::env;
use std::ffi::OsString;
use std::sync::{Mutex as StdMutex, MutexGuard as StdMutexGuard, PoisonError};

use camino::Utf8Path;
use tokio::sync::{Mutex, MutexGuard};

use crate::api::{
    AlgorithmAccuracy, ApiError, ApiFuture, CreateRequest, ForecastApi, MetricDatum,
    MetricsSink, ResourceDescription, ResourceSummary,
};
use crate::resource::{ParentLink, ResourceKind, arn};
use crate::status::ResourceStatus;
use crate::steps::FlowSettings;

/// Region used by the fake API and the test fixtures.
pub const TEST_REGION: &str = "us-east-1";

/// Account id used by the fake API and the test fixtures.
pub const TEST_ACCOUNT: &str = "123456789012";

/// Parameter document exercised by unit and behaviour tests.
pub const SAMPLE_PARAMS: &str = r#"{
  "Datasets": [
    {
      "Domain": "CUSTOM",
      "DatasetType": "TARGET_TIME_SERIES",
      "DataFrequency": "D",
      "Schema": {
        "Attributes": [
          {"AttributeName": "timestamp", "AttributeType": "timestamp"},
          {"AttributeName": "target_value", "AttributeType": "float"},
          {"AttributeName": "item_id", "AttributeType": "string"}
        ]
      }
    }
  ],
  "DatasetGroup": {"Domain": "CUSTOM"},
  "Predictor": {
    "AlgorithmArn": "arn:aws:forecast:::algorithm/Deep_AR_Plus",
    "ForecastHorizon": 14,
    "PerformAutoML": false,
    "PerformHPO": false,
    "FeaturizationConfig": {"ForecastFrequency": "D"}
  },
  "Forecast": {"ForecastTypes": ["0.10", "0.50", "0.90"]},
  "TimestampFormat": "yyyy-MM-dd"
}"#;

/// Step settings for the `acme-sales` stack reading `params_path`.
#[must_use]
pub fn sample_settings(params_path: &Utf8Path) -> FlowSettings {
    FlowSettings {
        project_name: String::from("acme_sales"),
        params_path: params_path.to_owned(),
        import_source: String::from("s3://forecast-bucket/source/target_time_series.csv"),
        export_destination: String::from("s3://forecast-bucket/target/"),
        import_role_arn: format!("arn:aws:iam::{TEST_ACCOUNT}:role/import"),
        export_role_arn: format!("arn:aws:iam::{TEST_ACCOUNT}:role/export"),
        metrics_namespace: String::from("FORECAST"),
    }
}

/// ARN prefix matching [`TEST_REGION`] and [`TEST_ACCOUNT`].
#[must_use]
pub fn test_arn_prefix() -> String {
    arn::arn_prefix(TEST_REGION, TEST_ACCOUNT)
}

#[derive(Clone, Debug)]
struct FakeResource {
    kind: ResourceKind,
    status: ResourceStatus,
    upcoming: VecDeque<ResourceStatus>,
    parent_arn: Option<String>,
    members: Vec<String>,
}

#[derive(Debug, Default)]
struct FakeState {
    resources: BTreeMap<String, FakeResource>,
    creation_script: BTreeMap<ResourceKind, Vec<ResourceStatus>>,
    racing_kinds: BTreeSet<ResourceKind>,
    delete_failures: BTreeMap<String, ApiError>,
    instant_deletes: bool,
    accuracy: BTreeMap<String, Vec<AlgorithmAccuracy>>,
    created: Vec<CreateRequest>,
    deleted: Vec<String>,
    describes: usize,
}

/// In-memory [`ForecastApi`] with scripted status transitions.
///
/// Each describe call advances a resource through its queued statuses; the
/// last status sticks. Creates queue `CREATE_PENDING`, `CREATE_IN_PROGRESS`,
/// `ACTIVE` unless [`FakeForecastApi::script_creation`] says otherwise, so
/// the first describe after a create reports the first queued status.
/// Deletes move a resource to `DELETE_PENDING` until
/// [`FakeForecastApi::finish_deletes`] removes it.
#[derive(Debug, Default)]
pub struct FakeForecastApi {
    state: StdMutex<FakeState>,
}

impl FakeForecastApi {
    /// Creates an empty fake.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> StdMutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seeds a resource with a fixed status.
    pub fn insert(&self, kind: ResourceKind, arn: &str, status: ResourceStatus) {
        self.insert_with_parent(kind, arn, status, None);
    }

    /// Seeds a resource whose listing reports `parent_arn`.
    pub fn insert_with_parent(
        &self,
        kind: ResourceKind,
        arn: &str,
        status: ResourceStatus,
        parent_arn: Option<&str>,
    ) {
        self.state().resources.insert(
            arn.to_owned(),
            FakeResource {
                kind,
                status,
                upcoming: VecDeque::new(),
                parent_arn: parent_arn.map(str::to_owned),
                members: Vec::new(),
            },
        );
    }

    /// Records the datasets attached to a dataset group.
    pub fn set_members(&self, group_arn: &str, dataset_arns: &[impl AsRef<str>]) {
        if let Some(resource) = self.state().resources.get_mut(group_arn) {
            resource.members = dataset_arns
                .iter()
                .map(|arn| arn.as_ref().to_owned())
                .collect();
        }
    }

    /// Queues statuses returned by subsequent describe calls for `arn`.
    pub fn script_statuses(&self, arn: &str, statuses: &[ResourceStatus]) {
        if let Some(resource) = self.state().resources.get_mut(arn) {
            resource.upcoming = statuses.iter().cloned().collect();
        }
    }

    /// Sets the statuses a newly created resource of `kind` goes through.
    pub fn script_creation(&self, kind: ResourceKind, statuses: &[ResourceStatus]) {
        self.state().creation_script.insert(kind, statuses.to_vec());
    }

    /// Makes creates of `kind` lose a race: the resource appears but the
    /// create call reports that it already exists.
    pub fn race_creation(&self, kind: ResourceKind) {
        self.state().racing_kinds.insert(kind);
    }

    /// Makes deleting `arn` fail with `error`.
    pub fn fail_delete(&self, arn: &str, error: ApiError) {
        self.state().delete_failures.insert(arn.to_owned(), error);
    }

    /// Removes resources immediately on delete instead of draining them.
    pub fn delete_instantly(&self) {
        self.state().instant_deletes = true;
    }

    /// Removes every resource that is draining.
    pub fn finish_deletes(&self) {
        self.state()
            .resources
            .retain(|_, resource| !resource.status.is_draining());
    }

    /// Registers accuracy metrics for a predictor.
    pub fn set_accuracy(&self, predictor_arn: &str, metrics: Vec<AlgorithmAccuracy>) {
        self.state().accuracy.insert(predictor_arn.to_owned(), metrics);
    }

    /// Returns every create request received so far.
    #[must_use]
    pub fn created(&self) -> Vec<CreateRequest> {
        self.state().created.clone()
    }

    /// Returns every ARN a delete request was accepted for.
    #[must_use]
    pub fn deleted(&self) -> Vec<String> {
        self.state().deleted.clone()
    }

    /// Number of describe calls received so far.
    #[must_use]
    pub fn describe_calls(&self) -> usize {
        self.state().describes
    }

    /// Current status of `arn`, or `None` when it does not exist.
    #[must_use]
    pub fn status_of(&self, arn: &str) -> Option<ResourceStatus> {
        self.state()
            .resources
            .get(arn)
            .map(|resource| resource.status.clone())
    }

    fn describe_now(&self, kind: ResourceKind, arn: &str) -> Result<ResourceDescription, ApiError> {
        let mut state = self.state();
        state.describes += 1;
        let resource = state
            .resources
            .get_mut(arn)
            .filter(|resource| resource.kind == kind)
            .ok_or_else(|| not_found(kind, arn))?;
        if let Some(next) = resource.upcoming.pop_front() {
            resource.status = next;
        }
        Ok(ResourceDescription {
            arn: arn.to_owned(),
            status: resource.status.clone(),
            message: None,
        })
    }

    fn create_now(&self, request: &CreateRequest) -> Result<String, ApiError> {
        let kind = request.kind();
        let arn = request_arn(request);
        let mut state = self.state();
        if state.resources.contains_key(&arn) {
            return Err(ApiError::AlreadyExists {
                kind,
                name: request.name().to_owned(),
            });
        }
        state.created.push(request.clone());
        let upcoming = state.creation_script.get(&kind).map_or_else(
            || {
                VecDeque::from([
                    ResourceStatus::CreatePending,
                    ResourceStatus::CreateInProgress,
                    ResourceStatus::Active,
                ])
            },
            |script| script.iter().cloned().collect(),
        );
        let racing = state.racing_kinds.contains(&kind);
        state.resources.insert(
            arn.clone(),
            FakeResource {
                kind,
                status: ResourceStatus::CreatePending,
                upcoming,
                parent_arn: request_parent(request),
                members: request_members(request),
            },
        );
        if racing {
            return Err(ApiError::AlreadyExists {
                kind,
                name: request.name().to_owned(),
            });
        }
        Ok(arn)
    }

    fn delete_now(&self, kind: ResourceKind, arn: &str) -> Result<(), ApiError> {
        let mut state = self.state();
        if let Some(error) = state.delete_failures.get(arn) {
            return Err(error.clone());
        }
        let instant = state.instant_deletes;
        let Some(resource) = state
            .resources
            .get_mut(arn)
            .filter(|resource| resource.kind == kind)
        else {
            return Err(not_found(kind, arn));
        };
        resource.status = ResourceStatus::DeletePending;
        resource.upcoming.clear();
        if instant {
            state.resources.remove(arn);
        }
        state.deleted.push(arn.to_owned());
        Ok(())
    }

    fn list_now(&self, kind: ResourceKind, status: Option<&ResourceStatus>) -> Vec<ResourceSummary> {
        let descriptor = kind.descriptor();
        self.state()
            .resources
            .iter()
            .filter(|(_, resource)| resource.kind == kind)
            .filter(|(_, resource)| {
                !descriptor.status_filter || status.is_none_or(|wanted| &resource.status == wanted)
            })
            .map(|(arn, resource)| ResourceSummary {
                arn: arn.clone(),
                status: descriptor.status_filter.then(|| resource.status.clone()),
                parent_arn: if descriptor.parent_link == ParentLink::Summary {
                    resource.parent_arn.clone()
                } else {
                    None
                },
            })
            .collect()
    }

    fn members_now(&self, group_arn: &str) -> Result<Vec<String>, ApiError> {
        self.state()
            .resources
            .get(group_arn)
            .map(|resource| resource.members.clone())
            .ok_or_else(|| not_found(ResourceKind::DatasetGroup, group_arn))
    }
}

fn not_found(kind: ResourceKind, arn: &str) -> ApiError {
    ApiError::NotFound {
        kind,
        arn: arn.to_owned(),
    }
}

fn last_segment(arn: &str) -> &str {
    arn.rsplit('/').next().unwrap_or(arn)
}

fn request_arn(request: &CreateRequest) -> String {
    let prefix = test_arn_prefix();
    let parent_name = match request {
        CreateRequest::DatasetImportJob { dataset_arn, .. } => Some(last_segment(dataset_arn)),
        CreateRequest::ForecastExportJob { forecast_arn, .. } => Some(last_segment(forecast_arn)),
        _ => None,
    };
    arn::resource_arn(&prefix, request.kind(), request.name(), parent_name)
}

fn request_parent(request: &CreateRequest) -> Option<String> {
    match request {
        CreateRequest::Predictor {
            dataset_group_arn, ..
        } => Some(dataset_group_arn.clone()),
        CreateRequest::Forecast { predictor_arn, .. } => Some(predictor_arn.clone()),
        _ => None,
    }
}

fn request_members(request: &CreateRequest) -> Vec<String> {
    match request {
        CreateRequest::DatasetGroup { dataset_arns, .. } => dataset_arns.clone(),
        _ => Vec::new(),
    }
}

impl ForecastApi for FakeForecastApi {
    fn describe<'a>(
        &'a self,
        kind: ResourceKind,
        arn: &'a str,
    ) -> ApiFuture<'a, ResourceDescription> {
        Box::pin(async move { self.describe_now(kind, arn) })
    }

    fn create<'a>(&'a self, request: &'a CreateRequest) -> ApiFuture<'a, String> {
        Box::pin(async move { self.create_now(request) })
    }

    fn delete<'a>(&'a self, kind: ResourceKind, arn: &'a str) -> ApiFuture<'a, ()> {
        Box::pin(async move { self.delete_now(kind, arn) })
    }

    fn list<'a>(
        &'a self,
        kind: ResourceKind,
        status: Option<&'a ResourceStatus>,
    ) -> ApiFuture<'a, Vec<ResourceSummary>> {
        Box::pin(async move { Ok(self.list_now(kind, status)) })
    }

    fn dataset_group_members<'a>(
        &'a self,
        dataset_group_arn: &'a str,
    ) -> ApiFuture<'a, Vec<String>> {
        Box::pin(async move { self.members_now(dataset_group_arn) })
    }

    fn accuracy_metrics<'a>(
        &'a self,
        predictor_arn: &'a str,
    ) -> ApiFuture<'a, Vec<AlgorithmAccuracy>> {
        Box::pin(async move {
            Ok(self
                .state()
                .accuracy
                .get(predictor_arn)
                .cloned()
                .unwrap_or_default())
        })
    }
}

/// [`MetricsSink`] that records every emission.
#[derive(Debug, Default)]
pub struct RecordingMetricsSink {
    emitted: StdMutex<Vec<(String, Vec<MetricDatum>)>>,
}

impl RecordingMetricsSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every `(namespace, data)` emission received so far.
    #[must_use]
    pub fn emitted(&self) -> Vec<(String, Vec<MetricDatum>)> {
        self.emitted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl MetricsSink for RecordingMetricsSink {
    fn emit<'a>(&'a self, namespace: &'a str, data: &'a [MetricDatum]) -> ApiFuture<'a, ()> {
        Box::pin(async move {
            self.emitted
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push((namespace.to_owned(), data.to_vec()));
            Ok(())
        })
    }
}

/// Global mutex used to serialise environment mutation in tests.
pub static ENV_LOCK: Mutex<()> = Mutex::const_new(());

/// Guard that holds the env mutex and restores variables on drop.
pub struct EnvGuard {
    previous: Vec<(String, Option<OsString>)>,
    _guard: MutexGuard<'static, ()>,
}

impl EnvGuard {
    /// Sets and removes environment variables while holding a global mutex.
    ///
    /// `None` values remove the variable for the guard's lifetime.
    pub async fn set_vars(pairs: &[(&str, Option<&str>)]) -> Self {
        debug_assert!(
            {
                let mut seen = BTreeSet::new();
                pairs.iter().all(|(key, _)| seen.insert(*key))
            },
            "duplicate environment variable keys passed to EnvGuard::set_vars"
        );

        let guard = ENV_LOCK.lock().await;
        let mut previous = Vec::with_capacity(pairs.len());
        for (key, value) in pairs {
            let old = env::var_os(key);
            // SAFETY: Environment mutation is serialised by `ENV_LOCK`, preventing races.
            unsafe {
                match value {
                    Some(val) => env::set_var(key, val),
                    None => env::remove_var(key),
                }
            }
            previous.push(((*key).to_owned(), old));
        }

        Self {
            previous,
            _guard: guard,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, old) in &self.previous {
            // SAFETY: Environment mutation is serialised by holding `_guard`.
            unsafe {
                match old {
                    Some(val) => env::set_var(key, val),
                    None => env::remove_var(key),
                }
            }
        }
    }
}
