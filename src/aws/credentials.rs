use std::fs;
use std::path::Path;

use ini::Ini;

use super::Credentials;
use crate::error::{AuthError, AuthResult};

const PROFILE: &str = "default";

pub fn credentials_file_exists(path: &Path) -> bool {
    path.is_file()
}

/// Writes `credentials` as the `default` profile of the AWS credentials file.
/// Other profiles already in the file are kept.
pub fn write_credentials_file(path: &Path, credentials: &Credentials) -> AuthResult<()> {
    let mut conf = match Ini::load_from_file(path) {
        Ok(conf) => conf,
        Err(ini::Error::Io(_)) => Ini::new(),
        Err(e) => {
            warn!(
                "could not parse {}, rewriting it from scratch: {}",
                path.display(),
                e
            );
            Ini::new()
        }
    };

    conf.delete(Some(PROFILE));
    conf.with_section(Some(PROFILE))
        .set("aws_access_key_id", credentials.access_key_id.as_str())
        .set("aws_secret_access_key", credentials.secret_access_key.as_str())
        .set("aws_session_token", credentials.session_token.as_str())
        // legacy consumers such as the ansible ec2 inventory still read this key
        .set("aws_security_token", credentials.session_token.as_str());

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    conf.write_to_file(path)
        .map_err(|e| AuthError::Io(format!("could not write {}: {}", path.display(), e)))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }

    Ok(())
}
