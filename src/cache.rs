use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::aws::Credentials;
use crate::error::{AuthError, AuthResult};

/// On-disk form of the most recently issued credentials.
#[derive(Debug, Serialize, Deserialize)]
struct CacheRecord {
    role_arn: String,
    credentials: Credentials,
}

/// Keeps the last issued credentials so the next run can skip the login.
pub struct CredentialCache {
    path: PathBuf,
}

impl CredentialCache {
    pub fn new(path: &Path) -> Self {
        CredentialCache { path: path.into() }
    }

    /// Cached credentials, or `None` if the record is missing or unreadable.
    /// A broken cache only means the user has to log in again.
    pub fn load(&self) -> Option<Credentials> {
        let buf = match fs::read_to_string(&self.path) {
            Ok(b) => b,
            Err(e) => {
                debug!("no credential cache at {}: {}", self.path.display(), e);
                return None;
            }
        };

        match serde_yaml::from_str::<CacheRecord>(&buf) {
            Ok(record) => {
                debug!("cached credentials for {}", record.role_arn);
                Some(record.credentials)
            }
            Err(e) => {
                debug!("ignoring corrupt credential cache {}: {}", self.path.display(), e);
                None
            }
        }
    }

    /// Replaces the record. The new content is written to a sibling file and
    /// renamed over the old one, so a crash leaves either record intact.
    pub fn store(&self, role_arn: &str, credentials: &Credentials) -> AuthResult<()> {
        let record = CacheRecord {
            role_arn: role_arn.into(),
            credentials: credentials.clone(),
        };
        let buf = serde_yaml::to_string(&record)
            .map_err(|e| AuthError::Io(format!("could not serialize credential cache: {}", e)))?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        // mode() only applies on creation, a leftover temp file would keep its bits
        let tmp = self.temp_path();
        if tmp.exists() {
            debug!("removing stale {}", tmp.display());
            fs::remove_file(&tmp)?;
        }

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        {
            let mut f = options.open(&tmp)?;
            f.write_all(buf.as_bytes())?;
            f.sync_all()?;
        }

        fs::rename(&tmp, &self.path)?;
        trace!("credential cache written to {}", self.path.display());

        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "credential-cache".into());
        name.push(".tmp");

        self.path.with_file_name(name)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::aws::test::credentials_expiring_in;
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_round_trip() {
        let dir = TempDir::new().unwrap();
        let cache = CredentialCache::new(&dir.path().join(".assumedRole.yml"));
        let creds = credentials_expiring_in(Utc::now(), 3600);

        cache
            .store("arn:aws:iam::123456789012:role/Admin", &creds)
            .unwrap();

        assert_eq!(cache.load(), Some(creds));
        assert!(!cache.temp_path().exists());
    }

    #[test]
    fn test_store_overwrites() {
        let dir = TempDir::new().unwrap();
        let cache = CredentialCache::new(&dir.path().join("cache.yml"));
        let now = Utc::now();

        cache.store("a", &credentials_expiring_in(now, 100)).unwrap();
        let newer = credentials_expiring_in(now, 3600);
        cache.store("b", &newer).unwrap();

        assert_eq!(cache.load(), Some(newer));
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let cache = CredentialCache::new(&dir.path().join("nonexistent.yml"));

        assert_eq!(cache.load(), None);
    }

    #[test]
    fn test_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.yml");
        let cache = CredentialCache::new(&path);

        fs::write(&path, "\u{0}\u{1}garbage: [").unwrap();
        assert_eq!(cache.load(), None);

        fs::write(&path, "role_arn: x\ncredentials:\n  access_key_id: only\n").unwrap();
        assert_eq!(cache.load(), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_store_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.yml");
        let cache = CredentialCache::new(&path);

        cache.store("a", &credentials_expiring_in(Utc::now(), 3600)).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn test_stale_temp_file_does_not_widen_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.yml");
        let cache = CredentialCache::new(&path);

        let tmp = cache.temp_path();
        fs::write(&tmp, "leftover").unwrap();
        fs::set_permissions(&tmp, fs::Permissions::from_mode(0o644)).unwrap();

        let creds = credentials_expiring_in(Utc::now(), 3600);
        cache.store("a", &creds).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(cache.load(), Some(creds));
        assert!(!tmp.exists());
    }
}
