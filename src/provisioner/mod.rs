//! Provision and delete workflows.
//!
//! Provision runs user -> repository -> token, delete runs repository -> token.
//! Each step needs the previous one on the Git host, so steps run sequentially
//! and a failed step aborts the workflow without undoing completed steps.

pub mod naming;
pub use self::naming::Naming;

#[cfg(test)]
pub(crate) mod memory;

use crate::gitea::{self, GitHost, NewRepository, NewUser, UserScope};
use async_trait::async_trait;
use rand::{distributions::Alphanumeric, Rng};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use utoipa::ToSchema;

pub const DEFAULT_PASSWORD_LENGTH: usize = 32;

#[derive(ToSchema, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ProvisionRequest {
    pub project: String,
    pub namespace: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ProvisionResponse {
    #[serde(rename = "gitRemoteURL")]
    pub git_remote_url: String,
    #[serde(rename = "gitToken")]
    pub git_token: String,
    #[serde(rename = "gitUser")]
    pub git_user: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    EnsureUser,
    CreateRepository,
    CreateAccessToken,
    DeleteRepository,
    DeleteAccessToken,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let step = match self {
            Self::EnsureUser => "ensure user",
            Self::CreateRepository => "create repository",
            Self::CreateAccessToken => "create access token",
            Self::DeleteRepository => "delete repository",
            Self::DeleteAccessToken => "delete access token",
        };
        f.write_str(step)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("repository {0} already exists")]
    RepositoryAlreadyExists(String),

    #[error("repository {0} does not exist")]
    RepositoryDoesNotExist(String),

    #[error("{step} failed: {source}")]
    GitHost {
        step: Step,
        #[source]
        source: gitea::Error,
    },
}

impl Error {
    fn git_host(step: Step) -> impl FnOnce(gitea::Error) -> Self {
        move |source| Self::GitHost { step, source }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionerConfig {
    pub naming: Naming,
    pub user_email_domain: String,
    pub default_branch: String,
}

impl Default for ProvisionerConfig {
    fn default() -> Self {
        Self {
            naming: Naming::default(),
            user_email_domain: "auto-provisioner.domain".to_string(),
            default_branch: "master".to_string(),
        }
    }
}

/// Tenant repository lifecycle, implemented over a Git host.
#[async_trait]
pub trait RepositoryProvisioner: Send + Sync {
    /// Ensure user, repository and access token exist for the tenant.
    async fn provision_repository(
        &self,
        request: &ProvisionRequest,
    ) -> Result<ProvisionResponse, Error>;

    /// Delete the tenant repository and its access token, the user is kept.
    async fn delete_repository(&self, request: &ProvisionRequest) -> Result<(), Error>;
}

#[derive(Debug)]
pub struct Provisioner<H> {
    host: H,
    config: ProvisionerConfig,
}

impl<H: GitHost> Provisioner<H> {
    pub fn new(host: H, config: ProvisionerConfig) -> Self {
        Self { host, config }
    }

    pub fn naming(&self) -> &Naming {
        &self.config.naming
    }

    #[cfg(test)]
    pub(crate) fn host(&self) -> &H {
        &self.host
    }

    #[instrument(skip(self))]
    async fn ensure_user(&self, username: &str) -> Result<(), Error> {
        let existing = self
            .host
            .get_user(username)
            .await
            .map_err(Error::git_host(Step::EnsureUser))?;

        if existing.is_some() {
            debug!("user {} already exists", username);
            return Ok(());
        }

        // Nobody logs in with it, Gitea just requires one.
        let password = generate_password(DEFAULT_PASSWORD_LENGTH);
        let email = format!("{username}@{}", self.config.user_email_domain);

        match self
            .host
            .create_user(&NewUser {
                username,
                email: &email,
                password: &password,
            })
            .await
        {
            Ok(()) => {
                info!("created user {}", username);
                Ok(())
            }
            // A concurrent provision for the same namespace may have created it.
            Err(e @ (gitea::Error::UnexpectedStatus { .. } | gitea::Error::Conflict { .. })) => {
                let created = self
                    .host
                    .get_user(username)
                    .await
                    .map_err(Error::git_host(Step::EnsureUser))?;

                if created.is_some() {
                    debug!("user {} was created concurrently", username);
                    Ok(())
                } else {
                    Err(Error::git_host(Step::EnsureUser)(e))
                }
            }
            Err(e) => Err(Error::git_host(Step::EnsureUser)(e)),
        }
    }
}

#[async_trait]
impl<H: GitHost> RepositoryProvisioner for Provisioner<H> {
    #[instrument(skip(self))]
    async fn provision_repository(
        &self,
        request: &ProvisionRequest,
    ) -> Result<ProvisionResponse, Error> {
        let naming = self.naming();
        let username = naming.username(request);
        let project_name = naming.project_name(request);
        let token_name = naming.access_token_name(request);

        self.ensure_user(&username).await?;

        let description = format!(
            "Repository was automatically provisioned by {} for project {project_name}",
            env!("CARGO_PKG_NAME")
        );

        let repository = match self
            .host
            .create_repository(
                &username,
                &NewRepository {
                    name: &project_name,
                    description: &description,
                    default_branch: &self.config.default_branch,
                },
            )
            .await
        {
            Ok(repository) => repository,
            Err(gitea::Error::Conflict { .. }) => {
                return Err(Error::RepositoryAlreadyExists(format!(
                    "{username}/{project_name}"
                )))
            }
            Err(e) => return Err(Error::git_host(Step::CreateRepository)(e)),
        };

        info!("created repository {}/{}", username, project_name);

        let token = self
            .host
            .acting_as(&username)
            .create_access_token(&token_name)
            .await
            .map_err(|e| {
                warn!(
                    "repository {}/{} was created but has no access token",
                    username, project_name
                );
                Error::git_host(Step::CreateAccessToken)(e)
            })?;

        info!("created access token {} for {}", token_name, username);

        Ok(ProvisionResponse {
            git_remote_url: repository.clone_url,
            git_token: token,
            git_user: username,
        })
    }

    #[instrument(skip(self))]
    async fn delete_repository(&self, request: &ProvisionRequest) -> Result<(), Error> {
        let naming = self.naming();
        let username = naming.username(request);
        let project_name = naming.project_name(request);
        let token_name = naming.access_token_name(request);

        match self.host.delete_repository(&username, &project_name).await {
            Ok(()) => info!("deleted repository {}/{}", username, project_name),
            Err(gitea::Error::NotFound { .. }) => {
                return Err(Error::RepositoryDoesNotExist(format!(
                    "{username}/{project_name}"
                )))
            }
            Err(e) => return Err(Error::git_host(Step::DeleteRepository)(e)),
        }

        self.host
            .acting_as(&username)
            .delete_access_token(&token_name)
            .await
            .map_err(|e| {
                warn!(
                    "repository {}/{} was deleted but access token {} remains",
                    username, project_name, token_name
                );
                Error::git_host(Step::DeleteAccessToken)(e)
            })?;

        info!("deleted access token {} for {}", token_name, username);

        Ok(())
    }
}

fn generate_password(length: usize) -> SecretString {
    let password: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect();

    SecretString::from(password)
}
