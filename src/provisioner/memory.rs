//! In-memory Git host for workflow tests.

use crate::gitea::{Error, GitHost, NewRepository, NewUser, Repository, User, UserScope};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Call {
    GetUser(String),
    CreateUser(String),
    CreateRepository(String, String),
    DeleteRepository(String, String),
    CreateAccessToken(String, String),
    DeleteAccessToken(String, String),
}

#[derive(Debug, Default)]
struct State {
    users: HashMap<String, User>,
    repositories: HashMap<(String, String), String>,
    tokens: HashMap<(String, String), String>,
    calls: Vec<Call>,
    failures: HashSet<Call>,
    created_elsewhere: HashSet<String>,
    next_id: i64,
}

impl State {
    fn insert_user(&mut self, username: &str, email: &str) {
        self.next_id += 1;
        let user = User {
            id: self.next_id,
            login: username.to_string(),
            email: email.to_string(),
        };
        self.users.insert(username.to_string(), user);
    }
}

#[derive(Debug, Default)]
pub struct MemoryHost {
    state: Mutex<State>,
}

impl MemoryHost {
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    // Records the call, then fails it with a 500 if it was registered with `fail_on`.
    fn record(&self, call: Call) -> Result<MutexGuard<'_, State>, Error> {
        let mut state = self.state();
        state.calls.push(call.clone());

        if state.failures.contains(&call) {
            return Err(Error::UnexpectedStatus {
                context: format!("{call:?}"),
                status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                message: "injected failure".to_string(),
            });
        }

        Ok(state)
    }

    pub fn fail_on(&self, call: Call) {
        self.state().failures.insert(call);
    }

    pub fn add_user(&self, username: &str) {
        self.state().insert_user(username, "");
    }

    /// Another client creates `username` right before our create request lands.
    pub fn create_user_elsewhere(&self, username: &str) {
        self.state().created_elsewhere.insert(username.to_string());
    }

    pub fn add_repository(&self, owner: &str, name: &str) {
        self.state()
            .repositories
            .insert((owner.to_string(), name.to_string()), "master".to_string());
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    pub fn has_user(&self, username: &str) -> bool {
        self.state().users.contains_key(username)
    }

    pub fn user_email(&self, username: &str) -> Option<String> {
        self.state().users.get(username).map(|u| u.email.clone())
    }

    pub fn has_repository(&self, owner: &str, name: &str) -> bool {
        self.state()
            .repositories
            .contains_key(&(owner.to_string(), name.to_string()))
    }

    pub fn default_branch(&self, owner: &str, name: &str) -> Option<String> {
        self.state()
            .repositories
            .get(&(owner.to_string(), name.to_string()))
            .cloned()
    }

    pub fn has_token(&self, username: &str, name: &str) -> bool {
        self.state()
            .tokens
            .contains_key(&(username.to_string(), name.to_string()))
    }
}

#[async_trait]
impl GitHost for MemoryHost {
    type Scoped<'a> = MemoryScope<'a>;

    async fn get_user(&self, username: &str) -> Result<Option<User>, Error> {
        let state = self.record(Call::GetUser(username.to_string()))?;
        Ok(state.users.get(username).cloned())
    }

    async fn create_user(&self, user: &NewUser<'_>) -> Result<(), Error> {
        let mut state = self.record(Call::CreateUser(user.username.to_string()))?;

        if state.created_elsewhere.remove(user.username) {
            state.insert_user(user.username, "");
        }

        if state.users.contains_key(user.username) {
            return Err(Error::UnexpectedStatus {
                context: format!("create user {}", user.username),
                status: reqwest::StatusCode::UNPROCESSABLE_ENTITY,
                message: "user already exists".to_string(),
            });
        }

        state.insert_user(user.username, user.email);
        Ok(())
    }

    async fn create_repository(
        &self,
        owner: &str,
        repository: &NewRepository<'_>,
    ) -> Result<Repository, Error> {
        let mut state = self.record(Call::CreateRepository(
            owner.to_string(),
            repository.name.to_string(),
        ))?;
        let key = (owner.to_string(), repository.name.to_string());

        if state.repositories.contains_key(&key) {
            return Err(Error::Conflict {
                context: format!("create repository {owner}/{}", repository.name),
            });
        }

        state
            .repositories
            .insert(key, repository.default_branch.to_string());

        Ok(Repository {
            name: repository.name.to_string(),
            full_name: format!("{owner}/{}", repository.name),
            clone_url: format!("http://git.test/{owner}/{}.git", repository.name),
            private: true,
        })
    }

    async fn delete_repository(&self, owner: &str, name: &str) -> Result<(), Error> {
        let mut state = self.record(Call::DeleteRepository(owner.to_string(), name.to_string()))?;

        state
            .repositories
            .remove(&(owner.to_string(), name.to_string()))
            .map(|_| ())
            .ok_or_else(|| Error::NotFound {
                context: format!("delete repository {owner}/{name}"),
            })
    }

    fn acting_as<'a>(&'a self, username: &'a str) -> MemoryScope<'a> {
        MemoryScope {
            host: self,
            username,
        }
    }
}

pub struct MemoryScope<'a> {
    host: &'a MemoryHost,
    username: &'a str,
}

#[async_trait]
impl UserScope for MemoryScope<'_> {
    async fn create_access_token(&self, name: &str) -> Result<String, Error> {
        let mut state = self.host.record(Call::CreateAccessToken(
            self.username.to_string(),
            name.to_string(),
        ))?;
        let token = format!("token-{}-{name}", self.username);

        state
            .tokens
            .insert((self.username.to_string(), name.to_string()), token.clone());

        Ok(token)
    }

    async fn delete_access_token(&self, name: &str) -> Result<(), Error> {
        let mut state = self.host.record(Call::DeleteAccessToken(
            self.username.to_string(),
            name.to_string(),
        ))?;

        state
            .tokens
            .remove(&(self.username.to_string(), name.to_string()))
            .map(|_| ())
            .ok_or_else(|| Error::NotFound {
                context: format!("delete access token {name}"),
            })
    }
}
