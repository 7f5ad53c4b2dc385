//! JSON routes over the personal and enterprise provisioners.
//!
//! Personal:
//! - `GET    /personal`, `GET /personal/{id}`, `PUT /personal/{id}`, `DELETE /personal/{id}`
//! - `POST   /personal/saving/normal`, `/personal/saving/vip`, `/personal/fixed-term`,
//!   `/personal/current`, `/personal/credit`
//!
//! Enterprise:
//! - `GET    /enterprise`, `GET /enterprise/{id}`, `PUT /enterprise/{id}`, `DELETE /enterprise/{id}`
//! - `POST   /enterprise/current/normal`, `/enterprise/current/pyme`, `/enterprise/credit`
//!
//! Provisioning answers `201` when accounts were created and `200` when the
//! request was skipped; both carry the customer.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tracing::{error, warn};
use uuid::Uuid;

use custodia_core::domain::customer::{
    Enterprise, EnterpriseId, EnterpriseUpdate, Personal, PersonalId, PersonalUpdate,
};
use custodia_core::errors::{ApplicationError, InterfaceError};
use custodia_provisioning::{
    EnterpriseProvisioner, PersonalProvisioner, ProvisioningError, ProvisioningOutcome,
};

#[derive(Clone)]
pub struct ApiState {
    personal: PersonalProvisioner,
    enterprise: EnterpriseProvisioner,
}

impl ApiState {
    pub fn new(personal: PersonalProvisioner, enterprise: EnterpriseProvisioner) -> Self {
        Self { personal, enterprise }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error: &'static str,
    pub detail: String,
    pub correlation_id: String,
}

/// Failure of a request, already mapped to its user-facing category.
#[derive(Debug)]
pub struct ApiError(InterfaceError);

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self(InterfaceError::BadRequest {
            message: message.into(),
            correlation_id: Uuid::new_v4().to_string(),
        })
    }

    fn status(&self) -> StatusCode {
        match self.0 {
            InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            InterfaceError::NotFound { .. } => StatusCode::NOT_FOUND,
            InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ProvisioningError> for ApiError {
    fn from(value: ProvisioningError) -> Self {
        let correlation_id = Uuid::new_v4().to_string();
        let application = ApplicationError::from(value);
        match &application {
            ApplicationError::PartialProvisioning(_) => error!(
                event_name = "http.request.partial_provisioning",
                correlation_id = %correlation_id,
                error = %application,
                "request left store and account service out of step"
            ),
            _ => warn!(
                event_name = "http.request.failed",
                correlation_id = %correlation_id,
                error = %application,
                "request failed"
            ),
        }
        Self(application.into_interface(correlation_id))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match &self.0 {
            InterfaceError::BadRequest { message, .. } | InterfaceError::NotFound { message, .. } => {
                message.clone()
            }
            // Integration and internal details stay in the logs.
            InterfaceError::ServiceUnavailable { .. } | InterfaceError::Internal { .. } => {
                String::new()
            }
        };
        let body = ErrorBody {
            error: self.0.user_message(),
            detail,
            correlation_id: self.0.correlation_id().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/personal", get(list_personal))
        .route(
            "/personal/{id}",
            get(find_personal).put(update_personal).delete(delete_personal),
        )
        .route("/personal/saving/normal", post(personal_normal_saving))
        .route("/personal/saving/vip", post(personal_vip_saving))
        .route("/personal/fixed-term", post(personal_fixed_term))
        .route("/personal/current", post(personal_current))
        .route("/personal/credit", post(personal_credit))
        .route("/enterprise", get(list_enterprise))
        .route(
            "/enterprise/{id}",
            get(find_enterprise).put(update_enterprise).delete(delete_enterprise),
        )
        .route("/enterprise/current/normal", post(enterprise_normal_current))
        .route("/enterprise/current/pyme", post(enterprise_pyme_current))
        .route("/enterprise/credit", post(enterprise_credit))
        .with_state(state)
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload.map(|Json(value)| value).map_err(|rejection| ApiError::bad_request(rejection.body_text()))
}

fn outcome<C: Serialize>(outcome: ProvisioningOutcome<C>) -> Response {
    let status = if outcome.is_created() { StatusCode::CREATED } else { StatusCode::OK };
    (status, Json(outcome)).into_response()
}

async fn list_personal(State(state): State<ApiState>) -> ApiResult<Json<Vec<Personal>>> {
    Ok(Json(state.personal.find_all().await?))
}

async fn find_personal(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Personal>> {
    Ok(Json(state.personal.find_by_id(&PersonalId(id)).await?))
}

async fn update_personal(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    payload: Result<Json<PersonalUpdate>, JsonRejection>,
) -> ApiResult<Json<Personal>> {
    let update = body(payload)?;
    Ok(Json(state.personal.update(&PersonalId(id), update).await?))
}

async fn delete_personal(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.personal.delete(&PersonalId(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn personal_normal_saving(
    State(state): State<ApiState>,
    payload: Result<Json<Personal>, JsonRejection>,
) -> ApiResult<Response> {
    Ok(outcome(state.personal.save_normal_saving_account(body(payload)?).await?))
}

async fn personal_vip_saving(
    State(state): State<ApiState>,
    payload: Result<Json<Personal>, JsonRejection>,
) -> ApiResult<Response> {
    Ok(outcome(state.personal.save_vip_saving_account(body(payload)?).await?))
}

async fn personal_fixed_term(
    State(state): State<ApiState>,
    payload: Result<Json<Personal>, JsonRejection>,
) -> ApiResult<Response> {
    Ok(outcome(state.personal.save_fixed_term_account(body(payload)?).await?))
}

async fn personal_current(
    State(state): State<ApiState>,
    payload: Result<Json<Personal>, JsonRejection>,
) -> ApiResult<Response> {
    Ok(outcome(state.personal.save_current_account(body(payload)?).await?))
}

async fn personal_credit(
    State(state): State<ApiState>,
    payload: Result<Json<Personal>, JsonRejection>,
) -> ApiResult<Response> {
    Ok(outcome(state.personal.save_credit_account(body(payload)?).await?))
}

async fn list_enterprise(State(state): State<ApiState>) -> ApiResult<Json<Vec<Enterprise>>> {
    Ok(Json(state.enterprise.find_all().await?))
}

async fn find_enterprise(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Enterprise>> {
    Ok(Json(state.enterprise.find_by_id(&EnterpriseId(id)).await?))
}

async fn update_enterprise(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    payload: Result<Json<EnterpriseUpdate>, JsonRejection>,
) -> ApiResult<Json<Enterprise>> {
    let update = body(payload)?;
    Ok(Json(state.enterprise.update(&EnterpriseId(id), update).await?))
}

async fn delete_enterprise(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.enterprise.delete(&EnterpriseId(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn enterprise_normal_current(
    State(state): State<ApiState>,
    payload: Result<Json<Enterprise>, JsonRejection>,
) -> ApiResult<Response> {
    Ok(outcome(state.enterprise.save_normal_current_account(body(payload)?).await?))
}

async fn enterprise_pyme_current(
    State(state): State<ApiState>,
    payload: Result<Json<Enterprise>, JsonRejection>,
) -> ApiResult<Response> {
    Ok(outcome(state.enterprise.save_pyme_current_account(body(payload)?).await?))
}

async fn enterprise_credit(
    State(state): State<ApiState>,
    payload: Result<Json<Enterprise>, JsonRejection>,
) -> ApiResult<Response> {
    Ok(outcome(state.enterprise.save_credit_account(body(payload)?).await?))
}
