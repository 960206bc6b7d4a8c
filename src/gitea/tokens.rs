use super::{decode, send, unexpected, Client, Error, UserScope};
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::instrument;

const SUDO_HEADER: &str = "Sudo";

#[derive(Serialize)]
struct CreateAccessTokenOption<'a> {
    name: &'a str,
}

// Gitea only returns the secret once, in `sha1`.
#[derive(Deserialize)]
struct AccessToken {
    sha1: String,
}

/// Admin client impersonating a single user.
#[derive(Debug, Clone, Copy)]
pub struct Sudo<'a> {
    client: &'a Client,
    username: &'a str,
}

impl<'a> Sudo<'a> {
    pub(super) fn new(client: &'a Client, username: &'a str) -> Self {
        Self { client, username }
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, Error> {
        Ok(self
            .client
            .request(method, segments)?
            .header(SUDO_HEADER, self.username))
    }

    /// Create an access token for the impersonated user.
    /// # Errors
    /// Returns an error on transport failures or any status other than 201.
    #[instrument(skip(self), fields(username = self.username))]
    pub async fn create_access_token(&self, name: &str) -> Result<String, Error> {
        let context = format!("create access token {name} for {}", self.username);

        let response = send(
            &context,
            self.request(Method::POST, &["users", self.username, "tokens"])?
                .json(&CreateAccessTokenOption { name }),
        )
        .await?;

        match response.status() {
            StatusCode::CREATED => {
                let token: AccessToken = decode(context, response).await?;
                Ok(token.sha1)
            }
            _ => Err(unexpected(context, response).await),
        }
    }

    /// Delete an access token of the impersonated user.
    /// # Errors
    /// Returns an error on transport failures or any status other than 204.
    #[instrument(skip(self), fields(username = self.username))]
    pub async fn delete_access_token(&self, name: &str) -> Result<(), Error> {
        let context = format!("delete access token {name} for {}", self.username);

        let response = send(
            &context,
            self.request(Method::DELETE, &["users", self.username, "tokens", name])?,
        )
        .await?;

        match response.status() {
            StatusCode::NO_CONTENT => Ok(()),
            StatusCode::NOT_FOUND => Err(Error::NotFound { context }),
            _ => Err(unexpected(context, response).await),
        }
    }
}

#[async_trait]
impl UserScope for Sudo<'_> {
    async fn create_access_token(&self, name: &str) -> Result<String, Error> {
        Sudo::create_access_token(self, name).await
    }

    async fn delete_access_token(&self, name: &str) -> Result<(), Error> {
        Sudo::delete_access_token(self, name).await
    }
}
