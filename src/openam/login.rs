use cookie::Cookie;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE, COOKIE};
use reqwest::StatusCode;
use serde_json::Value;
use url::Url;

use super::challenge::{Challenge, Reply};
use crate::config::IdpConfig;
use crate::error::{AuthError, AuthResult};
use crate::prompt::Prompter;
use crate::saml::form::extract_saml_response;
use crate::saml::Assertion;

/// The two identity provider endpoints the login needs.
pub trait Transport {
    /// Posts `challenge` to the authenticate endpoint, or starts a new login
    /// when there is none.
    fn authenticate(&self, challenge: Option<&Challenge>) -> AuthResult<Reply>;

    /// Fetches the SSO page carrying the SAML response for `token`.
    fn sso_page(&self, token: &str) -> AuthResult<String>;
}

pub struct HttpTransport {
    client: Client,
    idp: IdpConfig,
    authenticate_url: Url,
    sso_init_url: Url,
}

impl HttpTransport {
    pub fn new(client: Client, idp: &IdpConfig) -> AuthResult<Self> {
        Ok(HttpTransport {
            client,
            authenticate_url: idp.authenticate_url()?,
            sso_init_url: idp.sso_init_url()?,
            idp: idp.clone(),
        })
    }
}

impl Transport for HttpTransport {
    fn authenticate(&self, challenge: Option<&Challenge>) -> AuthResult<Reply> {
        trace!("authenticate.start");
        let mut req = self
            .client
            .post(self.authenticate_url.clone())
            .query(&[
                ("realm", self.idp.realm.as_str()),
                ("spEntityID", self.idp.sp_entity_id.as_str()),
            ])
            .header(CONTENT_TYPE, "application/json");

        if let Some(challenge) = challenge {
            req = req.json(challenge);
        }

        let res = req.send().map_err(|e| {
            error!("authenticate: {:?}", e);
            AuthError::from(e)
        })?;
        let status = res.status();
        debug!("authenticate: {} {}", res.url(), status);

        if status == StatusCode::UNAUTHORIZED {
            return Err(AuthError::Authorization(
                "the identity provider rejected the username, MFA token or password".into(),
            ));
        }
        if status.is_server_error() {
            return Err(AuthError::Network(format!("identity provider returned {}", status)));
        }
        if !status.is_success() {
            return Err(AuthError::Authorization(format!(
                "identity provider returned {}",
                status
            )));
        }

        let doc: Value = res.json()?;
        trace!("authenticate.response={}", doc);

        Reply::from_json(doc)
    }

    fn sso_page(&self, token: &str) -> AuthResult<String> {
        trace!("sso_page.start");
        let cookie = Cookie::new(self.idp.cookie_name.as_str(), token);

        let res = self
            .client
            .get(self.sso_init_url.clone())
            .query(&[
                ("metaAlias", self.idp.meta_alias.as_str()),
                ("spEntityID", self.idp.sp_entity_id.as_str()),
                ("redirected", "true"),
            ])
            .header(COOKIE, cookie.to_string())
            .header(
                ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .send()?;
        let status = res.status();
        debug!("sso_page: {} {}", res.url(), status);

        if !status.is_success() {
            return Err(AuthError::Authorization(format!(
                "SSO initiation returned {}",
                status
            )));
        }

        Ok(res.text()?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginState {
    Start,
    UsernameSubmitted,
    MfaSubmitted,
    PasswordSubmitted,
    Authenticated,
    Failed,
}

#[derive(Debug, Clone, Copy)]
enum Step {
    Username,
    Mfa,
    Password,
}

const STEPS: [Step; 3] = [Step::Username, Step::Mfa, Step::Password];

impl Step {
    fn submitted(self) -> LoginState {
        match self {
            Step::Username => LoginState::UsernameSubmitted,
            Step::Mfa => LoginState::MfaSubmitted,
            Step::Password => LoginState::PasswordSubmitted,
        }
    }
}

/// Walks the username, MFA token and password challenges. Each answer is
/// posted on its own, filled into the first empty slot of the last document.
pub struct Authenticator<'a> {
    transport: &'a dyn Transport,
    prompter: &'a dyn Prompter,
    username: Option<String>,
    state: LoginState,
}

impl<'a> Authenticator<'a> {
    pub fn new(
        transport: &'a dyn Transport,
        prompter: &'a dyn Prompter,
        username: Option<String>,
    ) -> Self {
        Authenticator {
            transport,
            prompter,
            username,
            state: LoginState::Start,
        }
    }

    pub fn state(&self) -> LoginState {
        self.state
    }

    fn answer(&self, step: Step) -> AuthResult<String> {
        match step {
            Step::Username => match self.username {
                Some(ref username) => {
                    println!("Using username: {}", username);
                    Ok(username.clone())
                }
                None => self.prompter.prompt("Username"),
            },
            Step::Mfa => self.prompter.prompt("MFA token"),
            Step::Password => self.prompter.prompt_secret("Password"),
        }
    }

    fn run(&mut self) -> AuthResult<String> {
        let mut reply = self.transport.authenticate(None)?;

        for step in STEPS.iter().copied() {
            let mut challenge = match reply {
                Reply::Token(token) => {
                    warn!(
                        "identity provider issued a session token before the {:?} step, skipping the remaining prompts",
                        step
                    );
                    return Ok(token);
                }
                Reply::Challenge(c) => c,
            };

            let answer = self.answer(step)?;
            let slot = challenge.fill_next(&answer)?;
            trace!("login.{:?} fills {}", step, slot);

            reply = self.transport.authenticate(Some(&challenge))?;
            self.state = step.submitted();
        }

        match reply {
            Reply::Token(token) => Ok(token),
            Reply::Challenge(_) => Err(AuthError::Authorization(
                "no session token after the password step".into(),
            )),
        }
    }

    /// Runs the challenge sequence and returns the session token.
    pub fn login(&mut self) -> AuthResult<String> {
        self.state = LoginState::Start;

        match self.run() {
            Ok(token) => {
                self.state = LoginState::Authenticated;
                Ok(token)
            }
            Err(e) => {
                debug!("login failed after {:?}", self.state);
                self.state = LoginState::Failed;
                Err(e)
            }
        }
    }

    /// Logs in and fetches the SAML assertion the session grants.
    pub fn get_saml_assertion(&mut self) -> AuthResult<Assertion> {
        let token = self.login()?;
        let page = self.transport.sso_page(&token)?;
        let encoded = extract_saml_response(&page)?;

        Assertion::from_base64(&encoded)
    }
}

#[cfg(test)]
pub mod test {
    use super::*;
    use crate::openam::challenge::test::login_form;
    use crate::prompt::test::ScriptedPrompter;
    use crate::saml::test::encoded_response;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Plays back canned identity provider replies and records every request.
    pub struct ScriptedTransport {
        replies: RefCell<VecDeque<AuthResult<Reply>>>,
        page: String,
        pub submitted: RefCell<Vec<Option<Challenge>>>,
        pub sso_tokens: RefCell<Vec<String>>,
    }

    impl ScriptedTransport {
        pub fn new(replies: Vec<AuthResult<Reply>>, page: String) -> Self {
            ScriptedTransport {
                replies: RefCell::new(replies.into_iter().collect()),
                page,
                submitted: RefCell::new(vec![]),
                sso_tokens: RefCell::new(vec![]),
            }
        }

        /// The usual flow: the form comes back with the earlier answers filled
        /// in until the password step completes the login.
        pub fn granting(role_values: &[&str]) -> Self {
            let replies = echoed_forms()
                .into_iter()
                .map(|f| Ok(Reply::from_json(f).unwrap()))
                .chain(Some(Ok(Reply::Token("AQIC5wM2LY4S".into()))))
                .collect();

            ScriptedTransport::new(replies, sso_page(&encoded_response(role_values)))
        }
    }

    /// Login form as returned after zero, one and two answers.
    fn echoed_forms() -> Vec<Value> {
        let blank = login_form();
        let mut after_username = blank.clone();
        after_username["callbacks"][0]["input"][0]["value"] = json!("jdoe");
        let mut after_mfa = after_username.clone();
        after_mfa["callbacks"][1]["input"][0]["value"] = json!("123456");

        vec![blank, after_username, after_mfa]
    }

    impl Transport for ScriptedTransport {
        fn authenticate(&self, challenge: Option<&Challenge>) -> AuthResult<Reply> {
            self.submitted.borrow_mut().push(challenge.cloned());
            self.replies
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(AuthError::Network("connection refused".into())))
        }

        fn sso_page(&self, token: &str) -> AuthResult<String> {
            self.sso_tokens.borrow_mut().push(token.into());
            Ok(self.page.clone())
        }
    }

    pub fn sso_page(encoded: &str) -> String {
        format!(
            r#"<html><body><form method="post" action="https://signin.aws.amazon.com/saml"><input type="hidden" name="SAMLResponse" value="{}" /></form></body></html>"#,
            encoded
        )
    }

    fn filled_values(c: &Challenge) -> Vec<Value> {
        c.callbacks
            .iter()
            .flat_map(|cb| cb.input.iter().map(|s| s.value.clone()))
            .collect()
    }

    #[test]
    fn test_each_step_posts_one_more_slot() {
        let transport = ScriptedTransport::granting(&[]);
        let prompter = ScriptedPrompter::new(&["123456", "hunter2"]);
        let mut auth = Authenticator::new(&transport, &prompter, Some("jdoe".into()));

        assert_eq!(auth.login().unwrap(), "AQIC5wM2LY4S");
        assert_eq!(auth.state(), LoginState::Authenticated);

        let submitted = transport.submitted.borrow();
        assert_eq!(submitted.len(), 4);
        assert!(submitted[0].is_none());
        assert_eq!(
            filled_values(submitted[1].as_ref().unwrap()),
            vec![json!("jdoe"), json!(""), json!("")]
        );
        assert_eq!(
            filled_values(submitted[2].as_ref().unwrap()),
            vec![json!("jdoe"), json!("123456"), json!("")]
        );
        assert_eq!(
            filled_values(submitted[3].as_ref().unwrap()),
            vec![json!("jdoe"), json!("123456"), json!("hunter2")]
        );

        assert_eq!(
            *prompter.asked.borrow(),
            vec!["MFA token".to_string(), "Password".into()]
        );
    }

    #[test]
    fn test_single_slot_stages() {
        let stage = |name: &str| {
            Ok(Reply::from_json(json!({
                "authId": "stage",
                "callbacks": [{ "type": "NameCallback", "input": [{ "name": name, "value": "" }] }]
            }))
            .unwrap())
        };
        let transport = ScriptedTransport::new(
            vec![
                stage("IDToken1"),
                stage("IDToken2"),
                stage("IDToken3"),
                Ok(Reply::Token("tok".into())),
            ],
            String::new(),
        );
        let prompter = ScriptedPrompter::new(&["jdoe", "123456", "hunter2"]);
        let mut auth = Authenticator::new(&transport, &prompter, None);

        assert_eq!(auth.login().unwrap(), "tok");

        let submitted = transport.submitted.borrow();
        let sent: Vec<(String, Value)> = submitted[1..]
            .iter()
            .map(|c| {
                let slot = &c.as_ref().unwrap().callbacks[0].input[0];
                (slot.name.clone(), slot.value.clone())
            })
            .collect();
        assert_eq!(
            sent,
            vec![
                ("IDToken1".to_string(), json!("jdoe")),
                ("IDToken2".to_string(), json!("123456")),
                ("IDToken3".to_string(), json!("hunter2")),
            ]
        );
        assert_eq!(
            *prompter.asked.borrow(),
            vec!["Username".to_string(), "MFA token".into(), "Password".into()]
        );
    }

    #[test]
    fn test_no_token_after_password_fails() {
        let form = || Ok(Reply::from_json(login_form()).unwrap());
        let transport = ScriptedTransport::new(vec![form(), form(), form(), form()], String::new());
        let prompter = ScriptedPrompter::new(&["jdoe", "123456", "wrong"]);
        let mut auth = Authenticator::new(&transport, &prompter, None);

        assert!(matches!(auth.login(), Err(AuthError::Authorization(_))));
        assert_eq!(auth.state(), LoginState::Failed);
    }

    #[test]
    fn test_network_failure_mid_flow() {
        let form = || Ok(Reply::from_json(login_form()).unwrap());
        let transport = ScriptedTransport::new(vec![form(), form()], String::new());
        let prompter = ScriptedPrompter::new(&["jdoe", "123456", "hunter2"]);
        let mut auth = Authenticator::new(&transport, &prompter, None);

        assert!(matches!(auth.login(), Err(AuthError::Network(_))));
        assert_eq!(auth.state(), LoginState::Failed);
        // the password is never asked for once the MFA step failed
        assert_eq!(prompter.asked.borrow().len(), 2);
    }

    #[test]
    fn test_early_token_ends_login() {
        let transport = ScriptedTransport::new(
            vec![
                Ok(Reply::from_json(login_form()).unwrap()),
                Ok(Reply::Token("early".into())),
            ],
            String::new(),
        );
        let prompter = ScriptedPrompter::new(&["jdoe", "123456", "hunter2"]);
        let mut auth = Authenticator::new(&transport, &prompter, None);

        assert_eq!(auth.login().unwrap(), "early");
        assert_eq!(auth.state(), LoginState::Authenticated);
        assert_eq!(*prompter.asked.borrow(), vec!["Username".to_string()]);
        assert_eq!(transport.submitted.borrow().len(), 2);
    }

    #[test]
    fn test_form_without_slots() {
        let transport = ScriptedTransport::new(
            vec![Ok(Reply::from_json(json!({ "callbacks": [] })).unwrap())],
            String::new(),
        );
        let prompter = ScriptedPrompter::new(&["jdoe"]);
        let mut auth = Authenticator::new(&transport, &prompter, None);

        assert!(matches!(auth.login(), Err(AuthError::Protocol(_))));
    }

    #[test]
    fn test_get_saml_assertion_uses_session_token() {
        let transport = ScriptedTransport::granting(&[
            "arn:aws:iam::111111111111:role/Admin,arn:aws:iam::111111111111:saml-provider/amplis",
        ]);
        let prompter = ScriptedPrompter::new(&["jdoe", "123456", "hunter2"]);
        let mut auth = Authenticator::new(&transport, &prompter, None);

        let assertion = auth.get_saml_assertion().unwrap();

        assert_eq!(*transport.sso_tokens.borrow(), vec!["AQIC5wM2LY4S".to_string()]);
        assert_eq!(assertion.entitlements().unwrap().len(), 1);
    }

    #[test]
    fn test_sso_page_without_assertion() {
        let form = || Ok(Reply::from_json(login_form()).unwrap());
        let transport = ScriptedTransport::new(
            vec![form(), form(), form(), Ok(Reply::Token("tok".into()))],
            "<html><body>Session expired</body></html>".into(),
        );
        let prompter = ScriptedPrompter::new(&["jdoe", "123456", "hunter2"]);
        let mut auth = Authenticator::new(&transport, &prompter, None);

        assert!(matches!(
            auth.get_saml_assertion(),
            Err(AuthError::Protocol(_))
        ));
    }
}
