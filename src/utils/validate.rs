//! Validating request extractors.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::Json;
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::{AppError, AppResult};

/// JSON body extractor that runs `validator` rules after deserialization.
///
/// Malformed bodies reject with 400 before validation runs; rule failures
/// reject with the field-level messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> AppResult<Self> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Method};
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Validate)]
    struct TestBody {
        #[validate(length(min = 1, message = "type is required"))]
        job_type: String,
    }

    fn request(body: &str) -> Request {
        Request::builder()
            .method(Method::POST)
            .uri("/test")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn accepts_valid_body() {
        let result =
            ValidatedJson::<TestBody>::from_request(request(r#"{"job_type":"demo"}"#), &()).await;
        let ValidatedJson(body) = result.unwrap();
        assert_eq!(body.job_type, "demo");
    }

    #[tokio::test]
    async fn rejects_malformed_json() {
        let result =
            ValidatedJson::<TestBody>::from_request(request(r#"{"job_type":"#), &()).await;
        assert!(matches!(result, Err(AppError::BadRequest { .. })));
    }

    #[tokio::test]
    async fn rejects_rule_violation() {
        let result =
            ValidatedJson::<TestBody>::from_request(request(r#"{"job_type":""}"#), &()).await;
        match result {
            Err(AppError::ValidationErrors { errors }) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].field, "job_type");
                assert!(errors[0].message.contains("required"));
            }
            other => panic!("expected ValidationErrors, got {other:?}"),
        }
    }
}
