use chrono::prelude::*;
use crossterm::style::Stylize;

use crate::aws::assume_role::{CredentialExchange, StsExchange};
use crate::aws::credentials::{credentials_file_exists, write_credentials_file};
use crate::aws::Credentials;
use crate::cache::CredentialCache;
use crate::client;
use crate::config::Config;
use crate::error::AuthResult;
use crate::openam::login::{Authenticator, HttpTransport, Transport};
use crate::prompt::{Prompter, TerminalPrompter};
use crate::renewal::{self, CacheDecision, FileAction};
use crate::roles::{load_env_labels, select_role};

pub struct Options {
    /// Skip the cache and always log in
    pub force: bool,
    /// Takes precedence over the username hint file
    pub username: Option<String>,
}

/// External collaborators of a refresh.
pub struct Services<'a> {
    pub transport: &'a dyn Transport,
    pub exchange: &'a dyn CredentialExchange,
    pub prompter: &'a dyn Prompter,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Source {
    Cache,
    Live,
}

#[derive(Debug)]
pub struct Outcome {
    pub credentials: Credentials,
    pub source: Source,
    pub file_action: FileAction,
}

/// Logs in, picks a role and trades the assertion for credentials, which are
/// cached before they are returned.
fn login(
    cfg: &Config,
    opts: &Options,
    services: &Services,
    cache: &CredentialCache,
) -> AuthResult<Credentials> {
    let username = opts
        .username
        .clone()
        .or_else(|| cfg.paths.username_hint());

    let mut authenticator = Authenticator::new(services.transport, services.prompter, username);
    let assertion = authenticator.get_saml_assertion()?;

    let entitlements = assertion.entitlements()?;
    let labels = load_env_labels(&cfg.paths.env_labels_file);
    let role = select_role(entitlements, &labels, services.prompter)?;

    let credentials = services.exchange.exchange(&role, &assertion)?;

    if let Err(e) = cache.store(&role.role_arn, &credentials) {
        warn!("could not update the credential cache: {}", e);
    }

    Ok(credentials)
}

/// Reuses cached credentials when they are valid for at least five more
/// minutes, logs in otherwise, then rewrites the credentials file if needed.
pub fn run(cfg: &Config, opts: &Options, services: &Services) -> AuthResult<Outcome> {
    let cache = CredentialCache::new(&cfg.paths.cache_file);

    let cached = match opts.force {
        true => None,
        false => cache.load(),
    };

    let (credentials, source) = match renewal::evaluate(cached, Utc::now()) {
        CacheDecision::Reuse(c) => (c, Source::Cache),
        CacheDecision::Renew => (login(cfg, opts, services, &cache)?, Source::Live),
    };

    let path = &cfg.paths.credentials_file;
    let file_action = renewal::file_action(
        &credentials,
        Utc::now(),
        credentials_file_exists(path),
        cfg.session_duration,
    );

    if file_action.overwrites() {
        write_credentials_file(path, &credentials)?;
    }

    Ok(Outcome {
        credentials,
        source,
        file_action,
    })
}

fn print_credentials(credentials: &Credentials, now: DateTime<Utc>) {
    let remaining = credentials.remaining_seconds(now);

    println!("Key ID:          {}", credentials.access_key_id);
    println!(
        "Expiration:      {}",
        credentials
            .expiration
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S%z")
    );
    println!(
        "Expiration(UTC): {}",
        credentials.expiration.format("%Y-%m-%d %H:%M:%S%z")
    );
    println!("Time till expiration: {} min", remaining / 60);
}

pub fn command(cfg: &Config, opts: &Options) -> AuthResult<()> {
    let http = client::build_client(cfg.timeout())?;
    let transport = HttpTransport::new(http.clone(), &cfg.idp)?;
    let exchange = StsExchange::new(http, &cfg.sts_endpoint, cfg.session_duration);
    let prompter = TerminalPrompter;

    let services = Services {
        transport: &transport,
        exchange: &exchange,
        prompter: &prompter,
    };

    let outcome = run(cfg, opts, &services)?;
    let now = Utc::now();

    if outcome.source == Source::Cache {
        info!("using cached credentials");
    }

    print_credentials(&outcome.credentials, now);

    let path = cfg.paths.credentials_file.display();
    match outcome.file_action {
        FileAction::OverwriteFresh => {
            println!("\nDone, credentials file: {} created/refreshed.", path);
        }
        FileAction::OverwriteMissing => {
            println!("Credentials file: {} doesn't exist.", path);
            println!("\nDone, credentials file: {} created/refreshed.", path);
        }
        FileAction::Skip => {
            println!("Credentials file: {} in place.", path);
            println!(
                "{}",
                format!(
                    "No need to update. Remains {} seconds.",
                    outcome.credentials.remaining_seconds(now)
                )
                .green()
            );
        }
    }

    Ok(())
}

/// Shows the cached credentials without contacting any service.
pub fn status(cfg: &Config) -> AuthResult<()> {
    let now = Utc::now();

    match CredentialCache::new(&cfg.paths.cache_file).load() {
        Some(credentials) => {
            print_credentials(&credentials, now);

            if renewal::is_usable(&credentials, now) {
                println!("{}", "Cached credentials are valid".green());
            } else {
                println!("{}", "Credential update necessary".yellow());
            }
        }
        None => println!("{}", "No cached credentials".yellow()),
    }

    Ok(())
}
