//! Gitea REST client used to manage users, repositories and access tokens.
//!
//! All calls authenticate with the admin credentials. Calls that act on
//! resources owned by a user (access tokens) go through [`Sudo`], which adds the
//! `Sudo` header so Gitea executes them as that user.

pub mod repos;
pub mod tokens;
pub mod users;

pub use self::repos::{NewRepository, Repository};
pub use self::tokens::Sudo;
pub use self::users::{NewUser, User};

use crate::APP_USER_AGENT;
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use url::Url;

const API_PREFIX: [&str; 2] = ["api", "v1"];

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid Gitea endpoint {endpoint}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("{context}: request failed: {source}")]
    Transport {
        context: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{context}: unable to decode response: {source}")]
    Decode {
        context: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{context}: unexpected status {status} {message}")]
    UnexpectedStatus {
        context: String,
        status: StatusCode,
        message: String,
    },

    #[error("{context}: already exists")]
    Conflict { context: String },

    #[error("{context}: not found")]
    NotFound { context: String },
}

/// Operations the provisioner needs from a Git host.
#[async_trait]
pub trait GitHost: Send + Sync {
    type Scoped<'a>: UserScope
    where
        Self: 'a;

    /// Look up a user, `None` when the host does not know it.
    async fn get_user(&self, username: &str) -> Result<Option<User>, Error>;

    async fn create_user(&self, user: &NewUser<'_>) -> Result<(), Error>;

    /// Create a repository owned by `owner`, returns [`Error::Conflict`] when it exists.
    async fn create_repository(
        &self,
        owner: &str,
        repository: &NewRepository<'_>,
    ) -> Result<Repository, Error>;

    /// Delete a repository, returns [`Error::NotFound`] when it does not exist.
    async fn delete_repository(&self, owner: &str, name: &str) -> Result<(), Error>;

    /// Handle for operations executed as `username` instead of the admin.
    fn acting_as<'a>(&'a self, username: &'a str) -> Self::Scoped<'a>;
}

/// Operations executed on behalf of a single user.
#[async_trait]
pub trait UserScope: Send + Sync {
    /// Create an access token and return its secret value.
    async fn create_access_token(&self, name: &str) -> Result<String, Error>;

    async fn delete_access_token(&self, name: &str) -> Result<(), Error>;
}

#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    endpoint: Url,
    admin_username: String,
    admin_password: SecretString,
}

impl Client {
    /// Build a client for the Gitea instance at `endpoint`.
    /// # Errors
    /// Returns an error if the endpoint is not an http(s) URL or the HTTP client cannot be built.
    pub fn new(
        endpoint: &str,
        admin_username: impl Into<String>,
        admin_password: SecretString,
    ) -> Result<Self, Error> {
        let invalid = |reason: String| Error::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason,
        };

        let url = Url::parse(endpoint).map_err(|e| invalid(e.to_string()))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme {}", url.scheme())));
        }

        if url.cannot_be_a_base() {
            return Err(invalid("cannot be a base URL".to_string()));
        }

        let http = reqwest::Client::builder()
            .user_agent(APP_USER_AGENT)
            .build()
            .map_err(|e| invalid(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: url,
            admin_username: admin_username.into(),
            admin_password,
        })
    }

    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Scoped handle whose requests run as `username`.
    #[must_use]
    pub fn sudo<'a>(&'a self, username: &'a str) -> Sudo<'a> {
        Sudo::new(self, username)
    }

    // Segments are percent-encoded, request values never get interpreted as path syntax.
    fn api_url(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.endpoint.clone();

        url.path_segments_mut()
            .map_err(|()| Error::InvalidEndpoint {
                endpoint: self.endpoint.to_string(),
                reason: "cannot be a base URL".to_string(),
            })?
            .pop_if_empty()
            .extend(API_PREFIX)
            .extend(segments);

        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, Error> {
        let url = self.api_url(segments)?;

        debug!("{} {}", method, url);

        Ok(self.http.request(method, url).basic_auth(
            &self.admin_username,
            Some(self.admin_password.expose_secret()),
        ))
    }
}

#[async_trait]
impl GitHost for Client {
    type Scoped<'a> = Sudo<'a>;

    async fn get_user(&self, username: &str) -> Result<Option<User>, Error> {
        Client::get_user(self, username).await
    }

    async fn create_user(&self, user: &NewUser<'_>) -> Result<(), Error> {
        Client::create_user(self, user).await
    }

    async fn create_repository(
        &self,
        owner: &str,
        repository: &NewRepository<'_>,
    ) -> Result<Repository, Error> {
        Client::create_repository(self, owner, repository).await
    }

    async fn delete_repository(&self, owner: &str, name: &str) -> Result<(), Error> {
        Client::delete_repository(self, owner, name).await
    }

    fn acting_as<'a>(&'a self, username: &'a str) -> Sudo<'a> {
        self.sudo(username)
    }
}

async fn send(context: &str, request: RequestBuilder) -> Result<Response, Error> {
    request.send().await.map_err(|source| Error::Transport {
        context: context.to_string(),
        source,
    })
}

async fn decode<T: serde::de::DeserializeOwned>(
    context: String,
    response: Response,
) -> Result<T, Error> {
    response
        .json()
        .await
        .map_err(|source| Error::Decode { context, source })
}

// Gitea reports failures as {"message": "...", "url": "..."}
async fn unexpected(context: String, response: Response) -> Error {
    let status = response.status();
    let message = response
        .json::<Value>()
        .await
        .ok()
        .and_then(|body| body["message"].as_str().map(str::to_string))
        .unwrap_or_default();

    Error::UnexpectedStatus {
        context,
        status,
        message,
    }
}
