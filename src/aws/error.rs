//! AWS error classification.
//!
//! SDK errors are mapped onto [`ApiError`] using the service error code
//! instead of string matching on their `Debug` output.

use aws_sdk_forecast::error::ProvideErrorMetadata;

use crate::api::ApiError;
use crate::resource::ResourceKind;

const NOT_FOUND_CODES: &[&str] = &["ResourceNotFoundException"];
const ALREADY_EXISTS_CODES: &[&str] = &["ResourceAlreadyExistsException"];
const IN_USE_CODES: &[&str] = &["ResourceInUseException"];

/// Classifies an error code returned by the Forecast API.
///
/// `target` is the ARN of the addressed resource, or the name passed to a
/// create call.
#[must_use]
pub fn classify_error(
    operation: &str,
    kind: ResourceKind,
    target: &str,
    code: Option<&str>,
    message: &str,
) -> ApiError {
    match code {
        Some(found) if NOT_FOUND_CODES.contains(&found) => ApiError::NotFound {
            kind,
            arn: target.to_owned(),
        },
        Some(found) if ALREADY_EXISTS_CODES.contains(&found) => ApiError::AlreadyExists {
            kind,
            name: target.to_owned(),
        },
        Some(found) if IN_USE_CODES.contains(&found) => ApiError::ResourceInUse {
            kind,
            arn: target.to_owned(),
        },
        _ => ApiError::Service {
            operation: operation.to_owned(),
            code: code.map(str::to_owned),
            message: message.to_owned(),
        },
    }
}

/// Classifies any SDK error carrying error metadata.
pub fn classify_sdk_error<E>(
    operation: &str,
    kind: ResourceKind,
    target: &str,
    error: &E,
) -> ApiError
where
    E: ProvideErrorMetadata + std::fmt::Display,
{
    let rendered = error.to_string();
    let message = error.message().unwrap_or(rendered.as_str());
    classify_error(operation, kind, target, error.code(), message)
}

/// Error for a request the SDK refused to build.
pub fn build_error(operation: &str, error: &impl std::fmt::Display) -> ApiError {
    ApiError::Service {
        operation: operation.to_owned(),
        code: None,
        message: format!("invalid request: {error}"),
    }
}

/// Error for a response missing a field the workflow relies on.
pub fn missing_field(operation: &str, field: &str) -> ApiError {
    ApiError::Service {
        operation: operation.to_owned(),
        code: None,
        message: format!("response did not include {field}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const ARN: &str = "arn:aws:forecast:us-east-1:123456789012:predictor/acme_2024_01_01_00_00_00";

    #[rstest]
    #[case(
        Some("ResourceNotFoundException"),
        ApiError::NotFound { kind: ResourceKind::Predictor, arn: ARN.to_owned() }
    )]
    #[case(
        Some("ResourceAlreadyExistsException"),
        ApiError::AlreadyExists { kind: ResourceKind::Predictor, name: ARN.to_owned() }
    )]
    #[case(
        Some("ResourceInUseException"),
        ApiError::ResourceInUse { kind: ResourceKind::Predictor, arn: ARN.to_owned() }
    )]
    fn known_codes_map_to_typed_errors(#[case] code: Option<&str>, #[case] expected: ApiError) {
        assert_eq!(
            classify_error("DescribePredictor", ResourceKind::Predictor, ARN, code, "boom"),
            expected
        );
    }

    #[rstest]
    #[case(Some("LimitExceededException"))]
    #[case(Some("InvalidInputException"))]
    #[case(None)]
    fn other_codes_keep_operation_and_message(#[case] code: Option<&str>) {
        let error = classify_error("CreatePredictor", ResourceKind::Predictor, ARN, code, "quota hit");

        let ApiError::Service {
            operation,
            code: kept,
            message,
        } = error
        else {
            panic!("expected a service error");
        };
        assert_eq!(operation, "CreatePredictor");
        assert_eq!(kept.as_deref(), code);
        assert_eq!(message, "quota hit");
    }
}
