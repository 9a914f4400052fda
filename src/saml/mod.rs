use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::error::{AuthError, AuthResult};

pub mod form;

/// Attribute carrying the `role,principal` pairs AWS understands.
pub const ROLE_ATTRIBUTE: &str = "https://aws.amazon.com/SAML/Attributes/Role";

/// Substring that identifies a SAML provider ARN.
const PROVIDER_MARKER: &str = "saml-provider";

#[derive(Deserialize, Debug)]
#[serde(rename = "Response")]
struct SAMLResponse {
    #[serde(rename = "Assertion", default)]
    assertions: Vec<SAMLAssertion>,
}

#[derive(Deserialize, Debug)]
struct SAMLAssertion {
    #[serde(rename = "AttributeStatement", default)]
    attribute_statements: Vec<AttributeStatement>,
}

#[derive(Deserialize, Debug)]
struct AttributeStatement {
    #[serde(rename = "Attribute", default)]
    attributes: Vec<Attribute>,
}

#[derive(Deserialize, Debug)]
struct Attribute {
    #[serde(rename = "AttributeValue", default)]
    values: Vec<AttributeValue>,

    #[serde(rename = "Name", default)]
    name: String,
}

#[derive(Deserialize, Debug)]
struct AttributeValue {
    #[serde(rename = "$value", default)]
    value: String,
}

/// A decoded SAML response together with the base64 form it arrived in.
///
/// The wire form is what STS expects, the XML is only used to read the roles.
#[derive(Debug)]
pub struct Assertion {
    encoded: String,
    xml: String,
}

/// An AWS role the identity provider allows the user to assume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entitlement {
    pub role_arn: String,
    pub principal_arn: String,
}

impl Assertion {
    /// Decodes the `SAMLResponse` value. Identity providers may wrap it across
    /// lines, so ASCII whitespace is dropped and the compact form is kept.
    pub fn from_base64(encoded: &str) -> AuthResult<Self> {
        let encoded: String = encoded
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        if encoded.is_empty() {
            return Err(AuthError::Protocol("empty SAML response".into()));
        }

        let raw = STANDARD
            .decode(&encoded)
            .map_err(|e| AuthError::Protocol(format!("SAML response is not valid base64: {}", e)))?;
        let xml = String::from_utf8(raw)
            .map_err(|e| AuthError::Protocol(format!("SAML response is not valid UTF-8: {}", e)))?;

        trace!("saml assertion: {}", xml);

        Ok(Assertion { encoded, xml })
    }

    pub fn encoded(&self) -> &str {
        &self.encoded
    }

    /// Role values of the AWS role attribute, in document order.
    fn role_values(&self) -> AuthResult<Vec<String>> {
        let response: SAMLResponse = serde_xml_rs::from_str(&self.xml)
            .map_err(|e| AuthError::Protocol(format!("could not parse SAML assertion: {}", e)))?;

        Ok(response
            .assertions
            .into_iter()
            .flat_map(|a| a.attribute_statements)
            .flat_map(|s| s.attributes)
            .filter(|a| a.name == ROLE_ATTRIBUTE)
            .flat_map(|a| a.values)
            .map(|v| v.value)
            .collect())
    }

    /// All entitlements granted by this assertion, with reversed pairs corrected.
    pub fn entitlements(&self) -> AuthResult<Vec<Entitlement>> {
        let entitlements = self
            .role_values()?
            .iter()
            .map(|v| Entitlement::parse(v))
            .collect::<AuthResult<Vec<_>>>()?;

        debug!("number of roles found: {}", entitlements.len());

        Ok(entitlements)
    }
}

impl Entitlement {
    /// Parses a `role_arn,principal_arn` value. Identity providers commonly
    /// emit `principal_arn,role_arn` instead, which is swapped back here.
    pub fn parse(value: &str) -> AuthResult<Self> {
        let fields: Vec<&str> = value.trim().split(',').collect();

        if fields.len() != 2 {
            return Err(AuthError::Protocol(format!(
                "malformed role attribute value {:?}",
                value
            )));
        }

        let (first, second) = (fields[0].trim(), fields[1].trim());

        if first.contains(PROVIDER_MARKER) {
            trace!("swapping reversed role attribute {}", value);
            return Ok(Entitlement {
                role_arn: second.into(),
                principal_arn: first.into(),
            });
        }

        Ok(Entitlement {
            role_arn: first.into(),
            principal_arn: second.into(),
        })
    }

    fn role_segment(&self, index: usize) -> &str {
        self.role_arn.split(':').nth(index).unwrap_or("")
    }

    /// Account id of the role, segment 4 of the ARN
    pub fn account_id(&self) -> &str {
        self.role_segment(4)
    }

    /// `role/<name>` part of the role ARN
    pub fn role_name(&self) -> &str {
        self.role_segment(5)
    }
}
