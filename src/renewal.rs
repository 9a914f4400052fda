//! Decides when cached credentials can be reused and when the AWS
//! credentials file has to be rewritten.
//!
//! Nothing records whether credentials were issued during this run, so
//! freshness is read off the expiration: a session that still has nearly its
//! full requested lifetime left was minted moments ago.

use chrono::{DateTime, Utc};

use crate::aws::Credentials;

/// Credentials closer than this to expiring are not used.
pub const RENEWAL_MARGIN_SECONDS: i64 = 300;

/// Lifetime STS issues when no duration is requested.
pub const NOMINAL_SESSION_SECONDS: i64 = 3600;

/// Slack between issuance and the freshness check.
const FRESH_SLACK_SECONDS: i64 = 10;

/// Remaining lifetime at or above which credentials count as freshly issued,
/// for sessions of `session_duration` seconds or the STS default.
pub fn fresh_threshold(session_duration: Option<i64>) -> i64 {
    session_duration.unwrap_or(NOMINAL_SESSION_SECONDS) - FRESH_SLACK_SECONDS
}

#[derive(Debug, PartialEq)]
pub enum CacheDecision {
    Reuse(Credentials),
    Renew,
}

#[derive(Debug, PartialEq, Eq)]
pub enum FileAction {
    /// Credentials were just issued
    OverwriteFresh,
    /// No credentials file exists yet
    OverwriteMissing,
    /// The file already holds these still valid credentials
    Skip,
}

impl FileAction {
    pub fn overwrites(&self) -> bool {
        *self != FileAction::Skip
    }
}

pub fn is_usable(credentials: &Credentials, now: DateTime<Utc>) -> bool {
    credentials.remaining_seconds(now) >= RENEWAL_MARGIN_SECONDS
}

pub fn evaluate(cached: Option<Credentials>, now: DateTime<Utc>) -> CacheDecision {
    match cached {
        Some(c) if is_usable(&c, now) => CacheDecision::Reuse(c),
        Some(c) => {
            info!(
                "cached credentials expire in {}s, credential update necessary",
                c.remaining_seconds(now)
            );
            CacheDecision::Renew
        }
        None => CacheDecision::Renew,
    }
}

pub fn file_action(
    credentials: &Credentials,
    now: DateTime<Utc>,
    file_exists: bool,
    session_duration: Option<i64>,
) -> FileAction {
    if credentials.remaining_seconds(now) >= fresh_threshold(session_duration) {
        FileAction::OverwriteFresh
    } else if !file_exists {
        FileAction::OverwriteMissing
    } else {
        FileAction::Skip
    }
}
