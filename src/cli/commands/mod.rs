use clap::{
    builder::{
        styling::{AnsiColor, Effects, Styles},
        PossibleValuesParser, ValueParser,
    },
    Arg, ColorChoice, Command,
};

pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            // Successfully parsed as a number
            if parsed <= 5 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    Command::new("gitea-provisioner")
        .about("Provision per-tenant Gitea repositories, users and access tokens")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8080")
                .env("RCV_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("gitea-endpoint")
                .long("gitea-endpoint")
                .help("Gitea base URL, example: https://gitea.tld:3000")
                .env("GITEA_ENDPOINT")
                .required(true),
        )
        .arg(
            Arg::new("gitea-user")
                .long("gitea-user")
                .help("Gitea admin username")
                .env("GITEA_USER")
                .required(true),
        )
        .arg(
            Arg::new("gitea-password")
                .long("gitea-password")
                .help("Gitea admin password")
                .env("GITEA_PASSWORD")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new("username-prefix")
                .long("username-prefix")
                .help("Prefix prepended to the namespace to build the Gitea username")
                .default_value("user-")
                .env("GITEA_USERNAME_PREFIX"),
        )
        .arg(
            Arg::new("user-email-domain")
                .long("user-email-domain")
                .help("Domain of the email address of provisioned users")
                .default_value("auto-provisioner.domain")
                .env("GITEA_USER_EMAIL_DOMAIN"),
        )
        .arg(
            Arg::new("project-prefix")
                .long("project-prefix")
                .help("Prefix prepended to the project to build the repository name (default: none)")
                .env("GITEA_PROJECT_PREFIX"),
        )
        .arg(
            Arg::new("token-prefix")
                .long("token-prefix")
                .help("Prefix prepended to the project to build the access token name")
                .default_value("repository-")
                .env("GITEA_TOKEN_PREFIX"),
        )
        .arg(
            Arg::new("default-branch")
                .long("default-branch")
                .help("Default branch of provisioned repositories")
                .default_value("master")
                .env("GITEA_DEFAULT_BRANCH"),
        )
        .arg(
            Arg::new("status-codes")
                .long("status-codes")
                .help("Status codes for failures: compatible (404/500, empty body) or conventional (409/404/400 with JSON error)")
                .default_value("compatible")
                .env("PROVISIONER_STATUS_CODES")
                .value_parser(PossibleValuesParser::new(["compatible", "conventional"])),
        )
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbose")
                .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
                .env("PROVISIONER_LOG_LEVEL")
                .global(true)
                .action(clap::ArgAction::Count)
                .value_parser(validator_log_level()),
        )
}
