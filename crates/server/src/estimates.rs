//! Estimate intake API.
//!
//! - `POST /api/estimates` validates a complete estimate record, writes the
//!   customer and estimate rows, and answers with the assigned identifiers.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use farmquote_core::errors::{ApplicationError, InterfaceError};
use farmquote_core::record::FormRecord;
use farmquote_core::submission::{EstimateStore, SubmissionPipeline};
use farmquote_core::validation::{FieldIssue, IssueCode};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, warn};
use uuid::Uuid;

pub type SharedStore = Arc<dyn EstimateStore>;
pub type SharedPipeline = Arc<SubmissionPipeline<SharedStore>>;

pub const CORRELATION_HEADER: &str = "x-correlation-id";

#[derive(Clone)]
pub struct EstimatesState {
    pipeline: SharedPipeline,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub success: bool,
    pub estimate_id: String,
    pub customer_id: String,
}

#[derive(Debug, Serialize)]
pub struct ValidationErrorBody {
    pub error: String,
    pub details: Vec<FieldIssue>,
}

#[derive(Debug, Serialize)]
pub struct FailureBody {
    pub error: String,
    pub details: String,
}

pub fn router(pipeline: SharedPipeline) -> Router {
    Router::new()
        .route("/api/estimates", post(submit_estimate))
        .with_state(EstimatesState { pipeline })
}

pub async fn submit_estimate(
    State(state): State<EstimatesState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4().to_string();

    let record = match body {
        Ok(Json(value)) => FormRecord::from_value(value).map_err(|_| {
            FieldIssue::new("$", IssueCode::TypeMismatch, "request body must be a JSON object")
        }),
        Err(rejection) => {
            Err(FieldIssue::new("$", IssueCode::TypeMismatch, rejection.body_text()))
        }
    };
    let record = match record {
        Ok(record) => record,
        Err(issue) => {
            warn!(
                event_name = "api.estimates.malformed_body",
                correlation_id = %correlation_id,
                reason = %issue.message,
                "estimate request body rejected"
            );
            let error = ApplicationError::Validation(vec![issue]).into_interface(&correlation_id);
            return interface_response(error);
        }
    };

    match state.pipeline.submit_correlated(&record, &correlation_id).await {
        Ok(receipt) => {
            info!(
                event_name = "api.estimates.created",
                correlation_id = %correlation_id,
                estimate_id = %receipt.estimate_id,
                customer_id = %receipt.customer_id,
                "estimate created"
            );
            let body = SubmitResponse {
                success: true,
                estimate_id: receipt.estimate_id.to_string(),
                customer_id: receipt.customer_id.to_string(),
            };
            with_correlation((StatusCode::CREATED, Json(body)).into_response(), &correlation_id)
        }
        Err(submission_error) => {
            let error = ApplicationError::from(submission_error).into_interface(&correlation_id);
            interface_response(error)
        }
    }
}

fn interface_response(error: InterfaceError) -> Response {
    let correlation_id = error.correlation_id().to_owned();
    let user_message = error.user_message();

    let response = match error {
        InterfaceError::BadRequest { message, issues, .. } => {
            (StatusCode::BAD_REQUEST, Json(ValidationErrorBody { error: message, details: issues }))
                .into_response()
        }
        InterfaceError::ServiceUnavailable { message, .. } => {
            warn!(
                event_name = "api.estimates.unavailable",
                correlation_id = %correlation_id,
                error = %message,
                "estimate could not be persisted"
            );
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(FailureBody { error: user_message.to_owned(), details: message }),
            )
                .into_response()
        }
        InterfaceError::Internal { message, .. } => {
            error!(
                event_name = "api.estimates.internal_error",
                correlation_id = %correlation_id,
                error = %message,
                "estimate submission failed"
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(FailureBody { error: user_message.to_owned(), details: message }),
            )
                .into_response()
        }
    };

    with_correlation(response, &correlation_id)
}

fn with_correlation(mut response: Response, correlation_id: &str) -> Response {
    if let Ok(value) = HeaderValue::from_str(correlation_id) {
        response.headers_mut().insert(CORRELATION_HEADER, value);
    }
    response
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        Router,
    };
    use farmquote_core::schema::FormDefinition;
    use farmquote_core::submission::SubmissionPipeline;
    use farmquote_db::{FailurePoint, InMemoryEstimateStore};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::{router, SharedStore, CORRELATION_HEADER};

    fn app(store: Arc<InMemoryEstimateStore>) -> Router {
        let form = Arc::new(FormDefinition::standard().expect("standard form"));
        let store: SharedStore = store;
        router(Arc::new(SubmissionPipeline::new(form, store)))
    }

    fn complete_estimate() -> Value {
        json!({
            "customer": {
                "customerType": "startup",
                "name": "Kim",
                "phone": "010-1234-5678",
                "email": "a@b.com"
            },
            "space": { "widthM": 5, "lengthM": 4, "heightM": 2.5 },
            "crops": { "selectedCrops": ["europe_lettuce"] },
            "system": {
                "systemType": "smart_garden_4tier",
                "hydroponicType": "ebb_flow",
                "envControlIncluded": true
            },
            "operation": {}
        })
    }

    async fn post(app: Router, body: String) -> (StatusCode, Option<String>, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/estimates")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body))
                    .expect("request"),
            )
            .await
            .expect("response");

        let status = response.status();
        let correlation = response
            .headers()
            .get(CORRELATION_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body bytes");
        let payload = serde_json::from_slice(&bytes).expect("json body");
        (status, correlation, payload)
    }

    #[tokio::test]
    async fn complete_estimate_is_created() {
        let store = Arc::new(InMemoryEstimateStore::new());

        let (status, correlation, payload) =
            post(app(store.clone()), complete_estimate().to_string()).await;

        assert_eq!(status, StatusCode::CREATED);
        assert!(correlation.is_some());
        assert_eq!(payload["success"], json!(true));
        let estimates = store.estimates().await;
        assert_eq!(estimates.len(), 1);
        assert_eq!(payload["estimateId"], json!(estimates[0].id.to_string()));
        assert_eq!(payload["customerId"], json!(estimates[0].customer_id.to_string()));
    }

    #[tokio::test]
    async fn missing_conditional_field_is_a_bad_request() {
        let store = Arc::new(InMemoryEstimateStore::new());
        let mut body = complete_estimate();
        body["system"]["systemType"] = json!("fixed_rack_custom");

        let (status, _, payload) = post(app(store.clone()), body.to_string()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let details = payload["details"].as_array().expect("details array");
        assert!(details.iter().any(|issue| {
            issue["path"] == json!("system.fixedRackTiers")
                && issue["code"] == json!("required_but_missing")
        }));
        assert!(store.customers().await.is_empty());
    }

    #[tokio::test]
    async fn non_object_body_reports_a_single_type_mismatch() {
        let store = Arc::new(InMemoryEstimateStore::new());

        let (status, _, payload) = post(app(store), "[1, 2, 3]".to_owned()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(payload["details"].as_array().map(Vec::len), Some(1));
        assert_eq!(payload["details"][0]["path"], json!("$"));
        assert_eq!(payload["details"][0]["code"], json!("type_mismatch"));
    }

    #[tokio::test]
    async fn malformed_json_is_a_bad_request() {
        let store = Arc::new(InMemoryEstimateStore::new());

        let (status, _, payload) = post(app(store), "{\"customer\":".to_owned()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(payload["details"][0]["path"], json!("$"));
    }

    #[tokio::test]
    async fn persistence_failure_is_service_unavailable_and_rolls_back() {
        let store = Arc::new(InMemoryEstimateStore::new());
        store.fail_on(FailurePoint::InsertEstimate).await;

        let (status, correlation, payload) =
            post(app(store.clone()), complete_estimate().to_string()).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(correlation.is_some());
        assert!(payload["details"].as_str().expect("details message").contains("estimate"));
        assert!(store.customers().await.is_empty());
        assert!(store.estimates().await.is_empty());
    }
}
