use clap::{Parser, Subcommand};

use std::path::PathBuf;

use super::constants::{
    ENV_AVATAR_MAX_BYTES, ENV_CONFIG, ENV_DEBUG, ENV_HOST, ENV_IDENTITY_AUDIENCE,
    ENV_IDENTITY_CLIENT_ID, ENV_IDENTITY_CLIENT_SECRET, ENV_IDENTITY_DOMAIN, ENV_PORT,
    ENV_PUBLIC_URL, ENV_SESSION_TTL_DAYS,
};

#[derive(Parser)]
#[command(name = "bugtracker")]
#[command(version, about = "Multi-tenant bug tracker", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Server host address
    #[arg(long, short = 'H', global = true, env = ENV_HOST)]
    pub host: Option<String>,

    /// Server port
    #[arg(long, short = 'p', global = true, env = ENV_PORT)]
    pub port: Option<u16>,

    /// Public base URL (e.g. https://bugs.example.com)
    #[arg(long, global = true, env = ENV_PUBLIC_URL, value_parser = parse_public_url)]
    pub public_url: Option<String>,

    /// Enable debug mode
    #[arg(long, global = true, env = ENV_DEBUG)]
    pub debug: bool,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// Identity provider tenant domain (e.g. example.eu.auth0.com)
    #[arg(long, global = true, env = ENV_IDENTITY_DOMAIN)]
    pub identity_domain: Option<String>,

    /// Identity provider application client ID
    #[arg(long, global = true, env = ENV_IDENTITY_CLIENT_ID)]
    pub identity_client_id: Option<String>,

    /// Identity provider application client secret
    #[arg(long, global = true, env = ENV_IDENTITY_CLIENT_SECRET, hide_env_values = true)]
    pub identity_client_secret: Option<String>,

    /// Management API audience (defaults to https://{domain}/api/v2/)
    #[arg(long, global = true, env = ENV_IDENTITY_AUDIENCE)]
    pub identity_audience: Option<String>,

    /// Session lifetime in days
    #[arg(long, global = true, env = ENV_SESSION_TTL_DAYS)]
    pub session_ttl_days: Option<u32>,

    /// Maximum avatar upload size in bytes
    #[arg(long, global = true, env = ENV_AVATAR_MAX_BYTES)]
    pub avatar_max_bytes: Option<usize>,
}

/// Parse the public URL, requiring an http(s) scheme and stripping a trailing slash
fn parse_public_url(s: &str) -> Result<String, String> {
    let url = reqwest::Url::parse(s).map_err(|e| format!("Invalid public URL '{}': {}", s, e))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!(
            "Invalid public URL '{}': scheme must be http or https",
            s
        ));
    }
    Ok(s.trim_end_matches('/').to_string())
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Start the server (default command)
    Start,
    /// System maintenance commands
    System {
        #[command(subcommand)]
        command: SystemCommands,
    },
}

#[derive(Subcommand, Clone, Debug)]
pub enum SystemCommands {
    /// Delete local data directory (database, secrets). Requires confirmation.
    Prune {
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub public_url: Option<String>,
    pub debug: bool,
    pub config: Option<PathBuf>,
    pub identity_domain: Option<String>,
    pub identity_client_id: Option<String>,
    pub identity_client_secret: Option<String>,
    pub identity_audience: Option<String>,
    pub session_ttl_days: Option<u32>,
    pub avatar_max_bytes: Option<usize>,
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Option<Commands>) {
    let cli = Cli::parse();
    let config = CliConfig {
        host: cli.host,
        port: cli.port,
        public_url: cli.public_url,
        debug: cli.debug,
        config: cli.config,
        identity_domain: cli.identity_domain,
        identity_client_id: cli.identity_client_id,
        identity_client_secret: cli.identity_client_secret,
        identity_audience: cli.identity_audience,
        session_ttl_days: cli.session_ttl_days,
        avatar_max_bytes: cli.avatar_max_bytes,
    };
    (config, cli.command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_public_url_strips_trailing_slash() {
        assert_eq!(
            parse_public_url("https://bugs.example.com/").unwrap(),
            "https://bugs.example.com"
        );
    }

    #[test]
    fn test_parse_public_url_rejects_other_schemes() {
        assert!(parse_public_url("ftp://bugs.example.com").is_err());
        assert!(parse_public_url("not a url").is_err());
    }

    #[test]
    fn test_cli_parses_global_flags() {
        let cli = Cli::try_parse_from([
            "bugtracker",
            "--port",
            "8080",
            "--identity-domain",
            "tenant.auth0.com",
            "start",
        ])
        .unwrap();
        assert_eq!(cli.port, Some(8080));
        assert_eq!(cli.identity_domain.as_deref(), Some("tenant.auth0.com"));
        assert!(matches!(cli.command, Some(Commands::Start)));
    }

    #[test]
    fn test_cli_parses_prune() {
        let cli = Cli::try_parse_from(["bugtracker", "system", "prune", "--yes"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::System {
                command: SystemCommands::Prune { yes: true }
            })
        ));
    }
}
