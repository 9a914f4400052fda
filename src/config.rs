use std::fs::{self, File};
use std::io::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Duration;

use url::Url;

use crate::error::{AuthError, AuthResult};

const CONFIG_FILENAME: &str = "amplis-auth.yml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub idp: IdpConfig,

    /// STS endpoint used for AssumeRoleWithSAML
    pub sts_endpoint: String,

    /// Timeout applied to every HTTP request, in seconds
    pub timeout_seconds: u64,

    /// Requested session duration. The provider default is used when unset.
    pub session_duration: Option<i64>,

    pub paths: Paths,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdpConfig {
    pub base_url: String,
    pub realm: String,
    pub sp_entity_id: String,
    pub meta_alias: String,
    pub cookie_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Paths {
    pub cache_file: PathBuf,
    pub credentials_file: PathBuf,
    pub username_file: PathBuf,
    pub env_labels_file: PathBuf,
}

fn home() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

fn default_filename() -> PathBuf {
    home().join(format!(".{}", CONFIG_FILENAME))
}

fn get_filename(paths: Vec<PathBuf>) -> Option<PathBuf> {
    paths.into_iter().find(|p| p.exists())
}

/// Loads the configuration from `path` if given, otherwise from
/// `./amplis-auth.yml` or `~/.amplis-auth.yml`, falling back to defaults.
pub fn load_or_default(path: Option<&str>) -> AuthResult<Config> {
    let path = match path {
        Some(p) => {
            let p = PathBuf::from(p);
            if !p.exists() {
                return Err(AuthError::Config(format!(
                    "config file {} does not exist",
                    p.display()
                )));
            }
            Some(p)
        }
        None => get_filename(vec![PathBuf::from(CONFIG_FILENAME), default_filename()]),
    };

    match path {
        Some(path) => {
            debug!("loading config from {}", path.display());
            let mut f = File::open(&path)?;

            let mut buf = String::new();
            f.read_to_string(&mut buf)?;

            serde_yaml::from_str::<Config>(&buf)
                .map_err(|e| AuthError::Config(format!("{}: {}", path.display(), e)))
        }
        None => {
            debug!("no config file found, using defaults");
            Ok(Config::default())
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            idp: IdpConfig::default(),
            sts_endpoint: "https://sts.amazonaws.com/".into(),
            timeout_seconds: 30,
            session_duration: None,
            paths: Paths::default(),
        }
    }
}

impl Config {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Default for IdpConfig {
    fn default() -> Self {
        IdpConfig {
            base_url: "https://amplis.deutsche-boerse.com/auth/".into(),
            realm: "/internet".into(),
            sp_entity_id: "urn:amazon:webservices".into(),
            meta_alias: "/internet/idp".into(),
            cookie_name: "es".into(),
        }
    }
}

impl IdpConfig {
    fn endpoint(&self, path: &str) -> AuthResult<Url> {
        let mut base = self.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }

        Url::parse(&base)
            .and_then(|u| u.join(path))
            .map_err(|e| AuthError::Config(format!("invalid idp base_url {}: {}", self.base_url, e)))
    }

    pub fn authenticate_url(&self) -> AuthResult<Url> {
        self.endpoint("json/authenticate")
    }

    pub fn sso_init_url(&self) -> AuthResult<Url> {
        self.endpoint("saml2/jsp/idpSSOInit.jsp")
    }
}

impl Default for Paths {
    fn default() -> Self {
        Paths::rooted_at(&home())
    }
}

impl Paths {
    /// Standard file layout below `root`, which is the home directory outside of tests.
    pub fn rooted_at(root: &Path) -> Self {
        let aws = root.join(".aws");

        Paths {
            cache_file: root.join(".assumedRole.yml"),
            credentials_file: aws.join("credentials"),
            username_file: aws.join("user"),
            env_labels_file: aws.join("env.json"),
        }
    }

    /// First line of the username hint file, if there is one.
    pub fn username_hint(&self) -> Option<String> {
        let content = fs::read_to_string(&self.username_file).ok()?;
        let username = content.lines().next()?.trim();

        if username.is_empty() {
            return None;
        }

        Some(username.into())
    }
}
