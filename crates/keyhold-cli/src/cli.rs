use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "keyhold", version)]
#[command(about = "Command line client for a remote credential-management service", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Authenticate with the credential service
    #[command(visible_alias = "l")]
    Login(LoginArgs),

    /// Get or set the targeted API
    #[command(visible_alias = "a")]
    Api(ApiArgs),

    /// Discard the stored authentication tokens
    #[command(visible_alias = "o")]
    Logout,

    /// Get a credential by name
    #[command(visible_alias = "g")]
    Get {
        /// Name of the credential to retrieve
        name: String,

        /// Print the credential as JSON
        #[arg(long)]
        output_json: bool,
    },

    /// Delete a credential by name
    #[command(visible_alias = "d")]
    Delete {
        /// Name of the credential to delete
        #[arg(short, long)]
        name: String,
    },
}

#[derive(Args, Debug, Default)]
pub struct LoginArgs {
    /// Authentication username (prompted if omitted)
    #[arg(short, long)]
    pub username: Option<String>,

    /// Authentication password (prompted if omitted)
    #[arg(short, long)]
    pub password: Option<String>,

    /// URI of the API server to target before logging in
    #[arg(short, long)]
    pub server: Option<String>,

    /// Disable TLS certificate validation (not recommended)
    #[arg(long)]
    pub skip_tls_validation: bool,
}

#[derive(Args, Debug, Default)]
pub struct ApiArgs {
    /// URI of the API server to target
    #[arg(short, long)]
    pub server: Option<String>,

    /// Disable TLS certificate validation (not recommended)
    #[arg(long)]
    pub skip_tls_validation: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_login() {
        let cli = Cli::try_parse_from([
            "keyhold",
            "login",
            "-u",
            "user",
            "-p",
            "pass",
            "-s",
            "https://api.example.com",
            "--skip-tls-validation",
        ])
        .unwrap();

        let Commands::Login(args) = cli.command else {
            panic!("expected login");
        };
        assert_eq!(args.username.as_deref(), Some("user"));
        assert_eq!(args.password.as_deref(), Some("pass"));
        assert_eq!(args.server.as_deref(), Some("https://api.example.com"));
        assert!(args.skip_tls_validation);
    }

    #[test]
    fn test_parse_get_positional_name() {
        let cli = Cli::try_parse_from(["keyhold", "get", "/example-password", "--output-json"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Get { ref name, output_json: true } if name == "/example-password"
        ));
    }

    #[test]
    fn test_parse_delete_requires_name() {
        assert!(Cli::try_parse_from(["keyhold", "delete"]).is_err());

        let cli = Cli::try_parse_from(["keyhold", "delete", "-n", "my-secret"]).unwrap();
        assert!(matches!(cli.command, Commands::Delete { ref name } if name == "my-secret"));
    }

    #[test]
    fn test_alias() {
        let cli = Cli::try_parse_from(["keyhold", "l", "-u", "user"]).unwrap();
        assert!(matches!(cli.command, Commands::Login(_)));
    }
}
