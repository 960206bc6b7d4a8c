use super::{decode, send, unexpected, Client, Error};
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Repository {
    pub name: String,
    #[serde(default)]
    pub full_name: String,
    pub clone_url: String,
    #[serde(default)]
    pub private: bool,
}

#[derive(Debug)]
pub struct NewRepository<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub default_branch: &'a str,
}

// Private, empty repository: no auto init, template, license, readme or gitignore.
#[derive(Serialize)]
struct CreateRepoOption<'a> {
    name: &'a str,
    description: &'a str,
    private: bool,
    issue_labels: &'a str,
    auto_init: bool,
    template: bool,
    gitignores: &'a str,
    license: &'a str,
    readme: &'a str,
    default_branch: &'a str,
    trust_model: &'a str,
}

impl<'a> From<&NewRepository<'a>> for CreateRepoOption<'a> {
    fn from(repository: &NewRepository<'a>) -> Self {
        Self {
            name: repository.name,
            description: repository.description,
            private: true,
            issue_labels: "",
            auto_init: false,
            template: false,
            gitignores: "",
            license: "",
            readme: "",
            default_branch: repository.default_branch,
            trust_model: "default",
        }
    }
}

impl Client {
    /// Create a repository owned by `owner` through the admin API.
    /// # Errors
    /// Returns [`Error::Conflict`] if the repository exists, other errors on transport
    /// failures or any status other than 201.
    #[instrument(skip(self, repository), fields(repository = repository.name))]
    pub async fn create_repository(
        &self,
        owner: &str,
        repository: &NewRepository<'_>,
    ) -> Result<Repository, Error> {
        let context = format!("create repository {owner}/{}", repository.name);

        let response = send(
            &context,
            self.request(Method::POST, &["admin", "users", owner, "repos"])?
                .json(&CreateRepoOption::from(repository)),
        )
        .await?;

        match response.status() {
            StatusCode::CREATED => decode(context, response).await,
            StatusCode::CONFLICT => {
                debug!("repository {}/{} already exists", owner, repository.name);
                Err(Error::Conflict { context })
            }
            _ => Err(unexpected(context, response).await),
        }
    }

    /// Delete the repository `owner/name`.
    /// # Errors
    /// Returns [`Error::NotFound`] if the repository does not exist, other errors on
    /// transport failures or any status other than 204.
    #[instrument(skip(self))]
    pub async fn delete_repository(&self, owner: &str, name: &str) -> Result<(), Error> {
        let context = format!("delete repository {owner}/{name}");

        let response = send(&context, self.request(Method::DELETE, &["repos", owner, name])?).await?;

        match response.status() {
            StatusCode::NO_CONTENT => Ok(()),
            StatusCode::NOT_FOUND => Err(Error::NotFound { context }),
            _ => Err(unexpected(context, response).await),
        }
    }
}
