use chrono::{DateTime, Utc};
use reqwest::blocking::Client;

use super::xml::{AssumeRoleWithSAMLResponse, ErrorResponse};
use super::Credentials;
use crate::error::{AuthError, AuthResult};
use crate::saml::{Assertion, Entitlement};

/// Trades a SAML assertion for temporary credentials of one role.
pub trait CredentialExchange {
    fn exchange(&self, entitlement: &Entitlement, assertion: &Assertion) -> AuthResult<Credentials>;
}

/// Calls `AssumeRoleWithSAML` on the STS query API. The call is unsigned, the
/// assertion itself authenticates it.
pub struct StsExchange {
    client: Client,
    endpoint: String,
    session_duration: Option<i64>,
}

impl StsExchange {
    pub fn new(client: Client, endpoint: &str, session_duration: Option<i64>) -> Self {
        StsExchange {
            client,
            endpoint: endpoint.into(),
            session_duration,
        }
    }
}

impl CredentialExchange for StsExchange {
    fn exchange(&self, entitlement: &Entitlement, assertion: &Assertion) -> AuthResult<Credentials> {
        debug!("role arn:      {}", entitlement.role_arn);
        debug!("principal arn: {}", entitlement.principal_arn);

        let mut params: Vec<(&str, String)> = vec![
            ("Action", "AssumeRoleWithSAML".into()),
            ("Version", "2011-06-15".into()),
            ("RoleArn", entitlement.role_arn.clone()),
            ("PrincipalArn", entitlement.principal_arn.clone()),
            ("SAMLAssertion", assertion.encoded().into()),
        ];

        if let Some(duration) = self.session_duration {
            params.push(("DurationSeconds", duration.to_string()));
        }

        let res = self.client.post(&self.endpoint).form(&params).send()?;
        let status = res.status();
        trace!("assume_role.status={}", status);

        if status.is_server_error() {
            return Err(AuthError::Network(format!("STS returned {}", status)));
        }

        let body = res.text()?;

        parse_response(status.is_success(), &body)
    }
}

/// Turns an STS response body into credentials, or the rejection into an error.
pub fn parse_response(success: bool, body: &str) -> AuthResult<Credentials> {
    if !success {
        let reason = match serde_xml_rs::from_str::<ErrorResponse>(body) {
            Ok(e) => format!("{}: {}", e.error.code, e.error.message),
            Err(_) => "STS rejected the role or assertion".into(),
        };

        return Err(AuthError::Authorization(reason));
    }

    let response: AssumeRoleWithSAMLResponse = serde_xml_rs::from_str(body)
        .map_err(|e| AuthError::Protocol(format!("could not parse STS response: {}", e)))?;

    if let Some(ref user) = response.result.assumed_role_user {
        info!("assumed role {}", user.arn);
    }

    let raw = response.result.credentials;
    let expiration = DateTime::parse_from_rfc3339(raw.expiration.trim())
        .map_err(|e| {
            AuthError::Protocol(format!("invalid expiration {:?}: {}", raw.expiration, e))
        })?
        .with_timezone(&Utc);

    Ok(Credentials {
        access_key_id: raw.access_key_id,
        secret_access_key: raw.secret_access_key,
        session_token: raw.session_token,
        expiration,
    })
}
