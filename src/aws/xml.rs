#[derive(Debug, Deserialize)]
#[serde(rename = "AssumeRoleWithSAMLResponse")]
pub struct AssumeRoleWithSAMLResponse {
    #[serde(rename = "AssumeRoleWithSAMLResult")]
    pub result: AssumeRoleWithSAMLResult,
}

#[derive(Debug, Deserialize)]
pub struct AssumeRoleWithSAMLResult {
    #[serde(rename = "Credentials")]
    pub credentials: Credentials,
    #[serde(rename = "AssumedRoleUser", default)]
    pub assumed_role_user: Option<AssumedRoleUser>,
}

#[derive(Debug, Deserialize)]
pub struct AssumedRoleUser {
    #[serde(rename = "Arn")]
    pub arn: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Credentials {
    #[serde(rename = "AccessKeyId")]
    pub access_key_id: String,
    #[serde(rename = "SecretAccessKey")]
    pub secret_access_key: String,
    #[serde(rename = "SessionToken")]
    pub session_token: String,
    #[serde(rename = "Expiration")]
    pub expiration: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename = "ErrorResponse")]
pub struct ErrorResponse {
    #[serde(rename = "Error")]
    pub error: Error,
}

#[derive(Debug, Deserialize)]
pub struct Error {
    #[serde(rename = "Code", default)]
    pub code: String,
    #[serde(rename = "Message", default)]
    pub message: String,
}
