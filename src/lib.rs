//! # Gitea Provisioner
//!
//! `gitea-provisioner` is a small HTTP service that provisions and deprovisions
//! per-tenant Git repositories on a self-hosted Gitea instance on behalf of a
//! deployment orchestrator.
//!
//! A tenant is identified by a `(project, namespace)` pair. For every tenant the
//! service ensures:
//!
//! 1. **A user account** named after the namespace.
//! 2. **A private repository** owned by that user, named after the project.
//! 3. **An access token** owned by that user, returned to the caller together with
//!    the clone URL.
//!
//! ## State
//!
//! The service keeps no state of its own. All names are derived deterministically
//! from the request (see [`provisioner::Naming`]), so a delete request finds exactly
//! what the matching provision request created.
//!
//! ## Partial failures
//!
//! Workflows are not transactional. If a later step fails, earlier steps stay in
//! place on the Git host:
//!
//! - provision: the user may exist without a repository, or user and repository
//!   may exist without a token.
//! - delete: the repository may be gone while its token still exists.
//!
//! Re-running delete (or manual cleanup on the Git host) brings the tenant back to
//! a consistent state.

pub mod api;
pub mod cli;
pub mod gitea;
pub mod provisioner;

#[allow(dead_code)]
mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Commit the binary was built from, empty outside a git checkout.
#[must_use]
pub fn git_commit_hash() -> &'static str {
    built_info::GIT_COMMIT_HASH.unwrap_or_default()
}
