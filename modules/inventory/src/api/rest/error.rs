//! REST error mapping for the inventory module.

use axum::http::StatusCode;
use stockroom_http::{Problem, ValidationViolation};
use tokio::task::JoinError;

use crate::domain::error::DomainError;
use crate::domain::insight::InsightError;

fn inventory_problem(
    status: StatusCode,
    code: &str,
    title: &str,
    detail: impl Into<String>,
) -> Problem {
    Problem::new(status, title, detail)
        .with_type(format!("https://errors.stockroom.dev/{code}"))
        .with_code(code)
        .with_current_trace()
}

/// 400 for request bodies or parameters that fail validation.
pub fn validation_problem(detail: impl Into<String>, errors: Vec<ValidationViolation>) -> Problem {
    let problem = inventory_problem(
        StatusCode::BAD_REQUEST,
        "INVENTORY_VALIDATION",
        "Invalid request",
        detail,
    );
    if errors.is_empty() {
        problem
    } else {
        problem.with_errors(errors)
    }
}

/// 500 for a store operation whose blocking task panicked or was cancelled.
pub fn task_failure_problem(e: &JoinError) -> Problem {
    tracing::error!(error = %e, "Inventory task failed");
    inventory_problem(
        StatusCode::INTERNAL_SERVER_ERROR,
        "INVENTORY_TASK_FAILED",
        "Internal Server Error",
        "The inventory operation did not complete",
    )
}

impl From<DomainError> for Problem {
    fn from(e: DomainError) -> Self {
        match &e {
            DomainError::NotFound { code } => inventory_problem(
                StatusCode::NOT_FOUND,
                "INVENTORY_NOT_FOUND",
                "Item not found",
                format!("No item with code '{code}'"),
            ),
            DomainError::AlreadyExists { code } => inventory_problem(
                StatusCode::CONFLICT,
                "INVENTORY_ALREADY_EXISTS",
                "Item already exists",
                format!("An item with code '{code}' already exists"),
            ),
            DomainError::Full { capacity } => inventory_problem(
                StatusCode::CONFLICT,
                "INVENTORY_FULL",
                "Inventory is full",
                format!("The inventory holds at most {capacity} items"),
            ),
            DomainError::ImportRejected(parse) => inventory_problem(
                StatusCode::UNPROCESSABLE_ENTITY,
                "INVENTORY_IMPORT_REJECTED",
                "Import rejected",
                format!("Line {}: {}", parse.line, parse.reason),
            )
            .with_errors(vec![
                ValidationViolation::new("file", parse.reason.clone()).at_line(parse.line),
            ]),
            DomainError::Persistence(source) => {
                tracing::error!(error = %source, "Inventory file I/O failed");
                inventory_problem(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INVENTORY_PERSISTENCE_FAILED",
                    "Internal Server Error",
                    "The inventory file could not be updated; no changes were applied",
                )
            }
        }
    }
}

impl From<InsightError> for Problem {
    fn from(e: InsightError) -> Self {
        match e {
            InsightError::NotConfigured => inventory_problem(
                StatusCode::SERVICE_UNAVAILABLE,
                "INVENTORY_INSIGHT_UNAVAILABLE",
                "Insight unavailable",
                "No insight endpoint is configured",
            ),
            InsightError::Upstream(message) => inventory_problem(
                StatusCode::BAD_GATEWAY,
                "INVENTORY_INSIGHT_FAILED",
                "Insight request failed",
                message,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::codec::ParseError;

    #[test]
    fn conflicts_have_distinct_codes() {
        let exists = Problem::from(DomainError::already_exists("A1"));
        let full = Problem::from(DomainError::Full { capacity: 3 });
        assert_eq!(exists.status, StatusCode::CONFLICT);
        assert_eq!(full.status, StatusCode::CONFLICT);
        assert_eq!(exists.code, "INVENTORY_ALREADY_EXISTS");
        assert_eq!(full.code, "INVENTORY_FULL");
        assert_eq!(full.type_url, "https://errors.stockroom.dev/INVENTORY_FULL");
    }

    #[test]
    fn import_rejection_carries_line() {
        let problem = Problem::from(DomainError::ImportRejected(ParseError {
            line: 3,
            reason: "price 'x' is not a valid decimal number".to_owned(),
        }));
        assert_eq!(problem.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(problem.detail, "Line 3: price 'x' is not a valid decimal number");
        let errors = problem.errors.unwrap_or_default();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].line, Some(3));
    }

    #[test]
    fn persistence_detail_hides_io_error() {
        let problem = Problem::from(DomainError::Persistence(std::io::Error::other(
            "disk full at /secret/path",
        )));
        assert_eq!(problem.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!problem.detail.contains("/secret/path"));
    }

    #[test]
    fn insight_errors_map_to_gateway_statuses() {
        assert_eq!(
            Problem::from(InsightError::NotConfigured).status,
            StatusCode::SERVICE_UNAVAILABLE
        );
        let upstream = Problem::from(InsightError::Upstream("timed out".to_owned()));
        assert_eq!(upstream.status, StatusCode::BAD_GATEWAY);
        assert_eq!(upstream.detail, "timed out");
    }

    #[tokio::test]
    async fn failed_store_task_is_internal_error() {
        let err = tokio::task::spawn_blocking(|| -> u32 { panic!("store task") })
            .await
            .unwrap_err();
        let problem = task_failure_problem(&err);
        assert_eq!(problem.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(problem.code, "INVENTORY_TASK_FAILED");
        assert!(!problem.detail.contains("store task"));
    }

    #[test]
    fn empty_violation_list_is_omitted() {
        assert!(validation_problem("bad", Vec::new()).errors.is_none());
    }
}
