use super::{decode, send, unexpected, Client, Error};
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub login: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a SecretString,
}

#[derive(Serialize)]
struct CreateUserOption<'a> {
    login_name: &'a str,
    username: &'a str,
    full_name: &'a str,
    email: &'a str,
    password: &'a str,
    must_change_password: bool,
    send_notify: bool,
}

impl Client {
    /// Look up a user by name.
    /// # Errors
    /// Returns an error on transport failures or statuses other than 200 and 404.
    #[instrument(skip(self))]
    pub async fn get_user(&self, username: &str) -> Result<Option<User>, Error> {
        let context = format!("get user {username}");
        let response = send(&context, self.request(Method::GET, &["users", username])?).await?;

        match response.status() {
            StatusCode::OK => decode(context, response).await.map(Some),
            StatusCode::NOT_FOUND => {
                debug!("user {} not found", username);
                Ok(None)
            }
            _ => Err(unexpected(context, response).await),
        }
    }

    /// Create a user through the admin API.
    /// # Errors
    /// Returns an error on transport failures or any status other than 201.
    #[instrument(skip(self, user), fields(username = user.username))]
    pub async fn create_user(&self, user: &NewUser<'_>) -> Result<(), Error> {
        let context = format!("create user {}", user.username);

        let body = CreateUserOption {
            login_name: user.username,
            username: user.username,
            full_name: user.username,
            email: user.email,
            password: user.password.expose_secret(),
            must_change_password: false,
            send_notify: false,
        };

        let response = send(
            &context,
            self.request(Method::POST, &["admin", "users"])?.json(&body),
        )
        .await?;

        match response.status() {
            StatusCode::CREATED => Ok(()),
            _ => Err(unexpected(context, response).await),
        }
    }
}
