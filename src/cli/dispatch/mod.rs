use crate::{
    api::StatusPolicy,
    cli::actions::{server::Args, Action},
    provisioner::{Naming, ProvisionerConfig},
};
use anyhow::{anyhow, Context, Result};
use secrecy::SecretString;

fn required(matches: &clap::ArgMatches, name: &str) -> Result<String> {
    matches
        .get_one::<String>(name)
        .cloned()
        .with_context(|| format!("missing required argument: --{name}"))
}

fn optional(matches: &clap::ArgMatches, name: &str) -> String {
    matches.get_one::<String>(name).cloned().unwrap_or_default()
}

/// # Errors
/// Returns an error if required arguments are missing or invalid.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);

    let gitea_endpoint = required(matches, "gitea-endpoint")?;
    let gitea_user = required(matches, "gitea-user")?;
    let gitea_password = SecretString::from(required(matches, "gitea-password")?);

    let status_policy = optional(matches, "status-codes")
        .parse::<StatusPolicy>()
        .map_err(|e| anyhow!(e))?;

    let config = ProvisionerConfig {
        naming: Naming {
            username_prefix: optional(matches, "username-prefix"),
            project_prefix: optional(matches, "project-prefix"),
            token_prefix: optional(matches, "token-prefix"),
        },
        user_email_domain: required(matches, "user-email-domain")?,
        default_branch: required(matches, "default-branch")?,
    };

    Ok(Action::Server(Args {
        port,
        gitea_endpoint,
        gitea_user,
        gitea_password,
        config,
        status_policy,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands;
    use secrecy::ExposeSecret;

    #[test]
    fn test_handler() -> Result<()> {
        let matches = commands::new().get_matches_from(vec![
            "gitea-provisioner",
            "--port",
            "9090",
            "--gitea-endpoint",
            "https://gitea.tld:3000",
            "--gitea-user",
            "admin",
            "--gitea-password",
            "secret",
            "--username-prefix",
            "user-",
            "--user-email-domain",
            "auto-provisioner.domain",
            "--project-prefix",
            "keptn-",
            "--token-prefix",
            "repository-",
            "--default-branch",
            "main",
            "--status-codes",
            "conventional",
        ]);

        let Action::Server(args) = handler(&matches)?;

        assert_eq!(args.port, 9090);
        assert_eq!(args.gitea_endpoint, "https://gitea.tld:3000");
        assert_eq!(args.gitea_user, "admin");
        assert_eq!(args.gitea_password.expose_secret(), "secret");
        assert_eq!(args.status_policy, StatusPolicy::Conventional);
        assert_eq!(
            args.config,
            ProvisionerConfig {
                naming: Naming {
                    username_prefix: "user-".to_string(),
                    project_prefix: "keptn-".to_string(),
                    token_prefix: "repository-".to_string(),
                },
                user_email_domain: "auto-provisioner.domain".to_string(),
                default_branch: "main".to_string(),
            }
        );
        Ok(())
    }
}
