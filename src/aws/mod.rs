use chrono::{DateTime, Utc};

pub mod assume_role;
pub mod credentials;
pub mod xml;

/// Temporary credentials issued by STS. Never modified after issue; a new
/// login produces a new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    pub expiration: DateTime<Utc>,
}

impl Credentials {
    /// Seconds until expiration, negative once expired.
    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> i64 {
        self.expiration.signed_duration_since(now).num_seconds()
    }
}

#[cfg(test)]
pub mod test {
    use super::*;
    use chrono::Duration;

    pub fn credentials_expiring_in(now: DateTime<Utc>, seconds: i64) -> Credentials {
        Credentials {
            access_key_id: "ASIAEXAMPLEKEY".into(),
            secret_access_key: "wJalrXUtnFEMI/K7MDENG/bPxRfiCYEXAMPLEKEY".into(),
            session_token: "FwoGZXIvYXdzEXAMPLETOKEN".into(),
            expiration: now + Duration::seconds(seconds),
        }
    }

    #[test]
    fn test_remaining_seconds() {
        let now = Utc::now();

        assert_eq!(credentials_expiring_in(now, 3600).remaining_seconds(now), 3600);
        assert_eq!(credentials_expiring_in(now, -20).remaining_seconds(now), -20);
    }
}
