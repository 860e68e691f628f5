//! Command handlers.
//!
//! Each handler loads the session once, does its work through the core
//! library, and writes the session back only when it changed.

use std::io;

use anyhow::Result;
use keyhold_core::auth::LoginRequest;
use keyhold_core::{
    ApiError, AuthManager, ConfigStore, CredentialClient, ReqwestTransport, Session, Transport,
};
use tracing::debug;

use crate::cli::{ApiArgs, Commands, LoginArgs};
use crate::prompt;

const TLS_WARNING: &str =
    "Warning: The targeted TLS certificate has not been verified for this connection.";

pub async fn run(command: Commands, store: &ConfigStore) -> Result<()> {
    match command {
        Commands::Login(args) => login(args, store).await,
        Commands::Api(args) => api(args, store).await,
        Commands::Logout => logout(store).await,
        Commands::Get { name, output_json } => get(&name, output_json, store).await,
        Commands::Delete { name } => delete(&name, store).await,
    }
}

async fn login(args: LoginArgs, store: &ConfigStore) -> Result<()> {
    let (username, password) = resolve_credentials(
        args.username,
        args.password,
        prompt::prompt_username,
        prompt::prompt_password,
    )?;

    let loaded = store.load()?;
    let skip_tls_validation = args.skip_tls_validation;
    let transport = ReqwestTransport::new(login_skips_tls(
        &loaded,
        args.server.is_some(),
        skip_tls_validation,
    ))?;
    let request = LoginRequest {
        username: &username,
        password: &password,
        server: args.server.as_deref(),
    };

    let attempt = attempt_login(&transport, loaded, &request, skip_tls_validation).await;
    if let Some(ref session) = attempt.save {
        store.save(session)?;
    }
    for line in attempt.outcome? {
        println!("{}", line);
    }
    Ok(())
}

/// What one login attempt leaves behind: the session to write back, if
/// anything should be, and the lines to print on success.
struct LoginAttempt {
    save: Option<Session>,
    outcome: Result<Vec<String>, ApiError>,
}

/// TLS setting a login runs with. An explicit server or flag replaces the
/// stored one.
fn login_skips_tls(loaded: &Session, server_given: bool, skip_tls_validation: bool) -> bool {
    if server_given || skip_tls_validation {
        skip_tls_validation
    } else {
        loaded.insecure_skip_verify
    }
}

async fn attempt_login<T: Transport>(
    transport: &T,
    loaded: Session,
    request: &LoginRequest<'_>,
    skip_tls_validation: bool,
) -> LoginAttempt {
    let mut session = loaded.clone();
    session.insecure_skip_verify =
        login_skips_tls(&loaded, request.server.is_some(), skip_tls_validation);

    match AuthManager::new(transport).login(&mut session, request).await {
        Ok(info) => {
            let mut lines = Vec::new();
            if let Some(info) = info {
                debug!(app = %info.app_name, version = %info.version, "Targeted server");
                lines.push(format!("Setting the target url: {}", session.api_url));
            }
            if skip_tls_validation {
                lines.push(TLS_WARNING.to_string());
            }
            lines.push("Login Successful".to_string());
            LoginAttempt {
                save: Some(session),
                outcome: Ok(lines),
            }
        }
        Err(err) => {
            // Only the revocation of the old tokens survives a failed login.
            let save = (session.is_revoked() && !loaded.is_revoked()).then(|| {
                let mut revoked = loaded;
                revoked.mark_revoked();
                revoked
            });
            LoginAttempt {
                save,
                outcome: Err(err),
            }
        }
    }
}

/// Fill in missing login credentials by prompting. A password without a
/// username is rejected outright.
fn resolve_credentials<U, P>(
    username: Option<String>,
    password: Option<String>,
    ask_username: U,
    ask_password: P,
) -> Result<(String, String)>
where
    U: FnOnce() -> io::Result<String>,
    P: FnOnce() -> io::Result<String>,
{
    match (username, password) {
        (Some(username), Some(password)) => Ok((username, password)),
        (Some(username), None) => Ok((username, ask_password()?)),
        (None, Some(_)) => Err(ApiError::InvalidParameters.into()),
        (None, None) => {
            let username = ask_username()?;
            let password = ask_password()?;
            Ok((username, password))
        }
    }
}

async fn api(args: ApiArgs, store: &ConfigStore) -> Result<()> {
    let mut session = store.load()?;

    let Some(server) = args.server else {
        println!("{}", session.api_url()?);
        return Ok(());
    };

    session.insecure_skip_verify = args.skip_tls_validation;
    let transport = ReqwestTransport::new(session.insecure_skip_verify)?;
    let info = AuthManager::new(&transport)
        .set_target(&mut session, &server)
        .await?;
    store.save(&session)?;

    debug!(app = %info.app_name, version = %info.version, "Targeted server");
    if session.insecure_skip_verify {
        println!("{}", TLS_WARNING);
    }
    println!("Setting the target url: {}", session.api_url);
    Ok(())
}

async fn logout(store: &ConfigStore) -> Result<()> {
    let mut session = store.load()?;
    let transport = ReqwestTransport::new(session.insecure_skip_verify)?;
    AuthManager::new(&transport).logout(&mut session).await;
    store.save(&session)?;

    println!("Logout Successful");
    Ok(())
}

async fn get(name: &str, output_json: bool, store: &ConfigStore) -> Result<()> {
    let session = store.load()?;
    let transport = transport_for(&session)?;
    let credential = CredentialClient::new(&transport, &session).get(name).await?;

    if output_json {
        println!("{}", credential.json()?);
    } else {
        println!("{}", credential.terminal());
    }
    Ok(())
}

async fn delete(name: &str, store: &ConfigStore) -> Result<()> {
    let session = store.load()?;
    let transport = transport_for(&session)?;
    CredentialClient::new(&transport, &session).delete(name).await?;

    println!("Secret successfully deleted");
    Ok(())
}

/// Transport for credential calls. Fails before building anything when no
/// target is set.
fn transport_for(session: &Session) -> Result<ReqwestTransport> {
    session.api_url()?;
    Ok(ReqwestTransport::new(session.insecure_skip_verify)?)
}
