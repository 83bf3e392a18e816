//! Caller identity lookup.

use tracing::info;

use super::error::missing_field;
use crate::api::ApiError;

/// Returns the account ID of the configured credentials.
///
/// `GetCallerIdentity` needs no permissions, so a failure here means the
/// credentials themselves are unusable.
///
/// # Errors
///
/// Returns [`ApiError::Service`] when STS rejects the call or omits the
/// account.
pub async fn account_id(sts: &aws_sdk_sts::Client) -> Result<String, ApiError> {
    const OPERATION: &str = "GetCallerIdentity";
    let identity = sts
        .get_caller_identity()
        .send()
        .await
        .map_err(|err| ApiError::Service {
            operation: String::from(OPERATION),
            code: aws_sdk_sts::error::ProvideErrorMetadata::code(&err).map(str::to_owned),
            message: format!("check AWS credentials: {err}"),
        })?;
    let account = identity
        .account()
        .ok_or_else(|| missing_field(OPERATION, "Account"))?;
    info!(account_id = %account, "resolved AWS account");
    Ok(account.to_owned())
}
