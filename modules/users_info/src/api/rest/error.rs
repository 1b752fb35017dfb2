use axum::http::StatusCode;

use crate::api::rest::problem::{Problem, ProblemResponse};
use crate::domain::error::DomainError;

/// Helper to create a ProblemResponse with less boilerplate
pub fn from_parts(
    status: StatusCode,
    code: &str,
    title: &str,
    detail: impl Into<String>,
    instance: &str,
) -> ProblemResponse {
    let problem = Problem::new(status, title, detail)
        .with_type(format!("https://errors.example.com/{}", code))
        .with_code(code)
        .with_instance(instance);

    // Attach the id of the request span if one is active
    let problem = if let Some(id) = tracing::Span::current().id() {
        problem.with_trace_id(id.into_u64().to_string())
    } else {
        problem
    };

    ProblemResponse(problem)
}

/// Map domain error to RFC9457 ProblemResponse
pub fn map_domain_error(e: &DomainError, instance: &str) -> ProblemResponse {
    match e {
        DomainError::NotFound { id } => from_parts(
            StatusCode::NOT_FOUND,
            "USERS_NOT_FOUND",
            "User not found",
            format!("User with id {} was not found", id),
            instance,
        ),
        DomainError::DuplicateEmail { email } => from_parts(
            StatusCode::CONFLICT,
            "USERS_EMAIL_CONFLICT",
            "Email already exists",
            format!("Email '{}' is already in use", email),
            instance,
        ),
        DomainError::Validation { field, message } => {
            let ProblemResponse(problem) = from_parts(
                StatusCode::BAD_REQUEST,
                "USERS_VALIDATION",
                "Validation error",
                message.clone(),
                instance,
            );
            ProblemResponse(problem.with_field(field.clone()))
        }
    }
}

/// Problem for a path segment that is not an integer id
pub fn invalid_path_id(raw: &str, instance: &str) -> ProblemResponse {
    let ProblemResponse(problem) = from_parts(
        StatusCode::BAD_REQUEST,
        "USERS_INVALID_ID",
        "Invalid user id",
        format!("'{}' is not a valid user id", raw),
        instance,
    );
    ProblemResponse(problem.with_field("id"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_domain_kind_maps_to_its_own_status() {
        let cases = [
            (DomainError::not_found(9), StatusCode::NOT_FOUND, "USERS_NOT_FOUND"),
            (
                DomainError::duplicate_email("a@x.com"),
                StatusCode::CONFLICT,
                "USERS_EMAIL_CONFLICT",
            ),
            (
                DomainError::empty_name(),
                StatusCode::BAD_REQUEST,
                "USERS_VALIDATION",
            ),
        ];
        for (err, status, code) in cases {
            let ProblemResponse(p) = map_domain_error(&err, "/users");
            assert_eq!(p.status, status.as_u16());
            assert_eq!(p.code, code);
            assert_eq!(p.instance, "/users");
        }
    }

    #[test]
    fn validation_problem_carries_the_field() {
        let ProblemResponse(p) = map_domain_error(&DomainError::empty_email(), "/users");
        assert_eq!(p.field.as_deref(), Some("email"));
    }

    #[test]
    fn bad_path_id_is_a_bad_request() {
        let ProblemResponse(p) = invalid_path_id("abc", "/users/abc");
        assert_eq!(p.status, 400);
        assert_eq!(p.code, "USERS_INVALID_ID");
        assert!(p.detail.contains("abc"));
    }
}
