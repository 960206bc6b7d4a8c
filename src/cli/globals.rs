use crate::gitea;
use secrecy::SecretString;

/// Gitea connection settings shared by every request.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub gitea_endpoint: String,
    pub gitea_user: String,
    pub gitea_password: SecretString,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(endpoint: String, user: String) -> Self {
        Self {
            gitea_endpoint: endpoint,
            gitea_user: user,
            gitea_password: SecretString::default(),
        }
    }

    pub fn set_password(&mut self, password: SecretString) {
        self.gitea_password = password;
    }

    /// Build the admin client for the configured Gitea instance.
    /// # Errors
    /// Returns an error if the endpoint is not a valid http(s) URL.
    pub fn client(&self) -> Result<gitea::Client, gitea::Error> {
        gitea::Client::new(
            &self.gitea_endpoint,
            self.gitea_user.clone(),
            self.gitea_password.clone(),
        )
    }
}
