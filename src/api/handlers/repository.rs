use crate::{
    api::StatusPolicy,
    provisioner::{Error, ProvisionRequest, ProvisionResponse, RepositoryProvisioner},
};
use axum::{
    body::Bytes,
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::ToSchema;

/// Failure body, only sent with the conventional status policy.
#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}

/// Failures a caller can observe. Details stay in the server log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    AlreadyExists,
    DoesNotExist,
    InvalidRequest,
    Internal,
}

impl Failure {
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::AlreadyExists => "repository_already_exists",
            Self::DoesNotExist => "repository_does_not_exist",
            Self::InvalidRequest => "invalid_request",
            Self::Internal => "internal_error",
        }
    }
}

impl StatusPolicy {
    #[must_use]
    pub fn status(self, failure: Failure) -> StatusCode {
        match (self, failure) {
            (Self::Compatible, Failure::AlreadyExists) => StatusCode::NOT_FOUND,
            (Self::Conventional, Failure::AlreadyExists) => StatusCode::CONFLICT,
            (_, Failure::DoesNotExist) => StatusCode::NOT_FOUND,
            (Self::Compatible, Failure::InvalidRequest) => StatusCode::INTERNAL_SERVER_ERROR,
            (Self::Conventional, Failure::InvalidRequest) => StatusCode::BAD_REQUEST,
            (_, Failure::Internal) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    #[must_use]
    pub fn respond(self, failure: Failure) -> Response {
        let status = self.status(failure);

        match self {
            Self::Compatible => status.into_response(),
            Self::Conventional => (
                status,
                Json(ErrorBody {
                    error: failure.code().to_string(),
                }),
            )
                .into_response(),
        }
    }
}

// Content-Type is not enforced, the body is always read as JSON.
fn decode(body: &Bytes) -> Result<ProvisionRequest, serde_json::Error> {
    serde_json::from_slice(body)
}

#[utoipa::path(
    post,
    path= "/repository",
    request_body = ProvisionRequest,
    responses (
        (status = 201, description = "Repository provisioned", body = ProvisionResponse, content_type = "application/json"),
        (status = 404, description = "Repository already exists (compatible status policy)"),
        (status = 409, description = "Repository already exists (conventional status policy)", body = ErrorBody),
        (status = 400, description = "Malformed request body (conventional status policy)", body = ErrorBody),
        (status = 500, description = "Provisioning failed"),
    ),
    tag = "repository",
)]
#[instrument(skip(provisioner, body))]
pub async fn provision(
    Extension(provisioner): Extension<Arc<dyn RepositoryProvisioner>>,
    Extension(policy): Extension<StatusPolicy>,
    body: Bytes,
) -> Response {
    let request = match decode(&body) {
        Ok(request) => request,
        Err(e) => {
            error!("Unable to process request body: {}", e);
            return policy.respond(Failure::InvalidRequest);
        }
    };

    match provisioner.provision_repository(&request).await {
        Ok(response) => (StatusCode::CREATED, Json::<ProvisionResponse>(response)).into_response(),
        Err(Error::RepositoryAlreadyExists(repository)) => {
            info!("Repository {} already exists", repository);
            policy.respond(Failure::AlreadyExists)
        }
        Err(e) => {
            error!("Unable to create repository: {}", e);
            policy.respond(Failure::Internal)
        }
    }
}

#[utoipa::path(
    delete,
    path= "/repository",
    request_body = ProvisionRequest,
    responses (
        (status = 204, description = "Repository and access token deleted"),
        (status = 404, description = "Repository does not exist"),
        (status = 400, description = "Malformed request body (conventional status policy)", body = ErrorBody),
        (status = 500, description = "Deletion failed"),
    ),
    tag = "repository",
)]
#[instrument(skip(provisioner, body))]
pub async fn delete(
    Extension(provisioner): Extension<Arc<dyn RepositoryProvisioner>>,
    Extension(policy): Extension<StatusPolicy>,
    body: Bytes,
) -> Response {
    let request = match decode(&body) {
        Ok(request) => request,
        Err(e) => {
            error!("Unable to process request body: {}", e);
            return policy.respond(Failure::InvalidRequest);
        }
    };

    match provisioner.delete_repository(&request).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(Error::RepositoryDoesNotExist(repository)) => {
            info!("Repository {} does not exist", repository);
            policy.respond(Failure::DoesNotExist)
        }
        Err(e) => {
            error!("Unable to delete repository: {}", e);
            policy.respond(Failure::Internal)
        }
    }
}
