use crate::{
    api::{self, StatusPolicy},
    cli::globals::GlobalArgs,
    provisioner::{Provisioner, ProvisionerConfig},
};
use anyhow::{Context, Result};
use secrecy::SecretString;
use std::sync::Arc;
use tracing::info;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub gitea_endpoint: String,
    pub gitea_user: String,
    pub gitea_password: SecretString,
    pub config: ProvisionerConfig,
    pub status_policy: StatusPolicy,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the Gitea client cannot be built or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    log_startup_args(&args);

    let mut globals = GlobalArgs::new(args.gitea_endpoint, args.gitea_user);
    globals.set_password(args.gitea_password);

    let client = globals.client().context("Unable to create Gitea client")?;

    let provisioner = Provisioner::new(client, args.config);

    let app = api::router(Arc::new(provisioner), args.status_policy);

    api::new(args.port, app).await
}

fn log_startup_args(args: &Args) {
    let naming = &args.config.naming;
    let entries = [
        ("listen", format!("tcp:{}", args.port)),
        ("gitea_endpoint", args.gitea_endpoint.clone()),
        ("gitea_user", args.gitea_user.clone()),
        ("gitea_password", "REDACTED".to_string()),
        ("username_prefix", naming.username_prefix.clone()),
        ("project_prefix", naming.project_prefix.clone()),
        ("token_prefix", naming.token_prefix.clone()),
        ("user_email_domain", args.config.user_email_domain.clone()),
        ("default_branch", args.config.default_branch.clone()),
        ("status_codes", args.status_policy.to_string()),
    ];
    info!("{}", startup_message("Startup configuration", &entries));
}

fn startup_message(title: &str, entries: &[(&str, String)]) -> String {
    let max_key_len = entries.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    let mut message = format!(
        "{} - {} - {}\n\n{title}:",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        short_commit(crate::git_commit_hash())
    );
    for (key, value) in entries {
        let padding = " ".repeat(max_key_len.saturating_sub(key.len()));
        let _ =
            std::fmt::Write::write_fmt(&mut message, format_args!("\n  {key}:{padding} {value}"));
    }
    message
}

fn short_commit(hash: &str) -> String {
    let trimmed = hash.trim();
    if trimmed.len() > 7 {
        trimmed[..7].to_string()
    } else {
        trimmed.to_string()
    }
}
