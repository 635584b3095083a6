use secrecy::{ExposeSecret, SecretString};

/// Submitter identity handed to generated code and to fallback submissions.
#[derive(Clone, Debug)]
pub struct Credentials {
    pub email: String,
    secret: SecretString,
}

impl Credentials {
    pub fn new(email: impl Into<String>, secret: SecretString) -> Self {
        Self {
            email: email.into(),
            secret,
        }
    }

    pub fn secret(&self) -> &str {
        self.secret.expose_secret()
    }

    /// Constant-shape comparison against a secret supplied by a caller.
    pub fn secret_matches(&self, candidate: &str) -> bool {
        let expected = self.secret.expose_secret().as_bytes();
        let candidate = candidate.as_bytes();
        if expected.len() != candidate.len() {
            return false;
        }
        expected
            .iter()
            .zip(candidate)
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> Credentials {
        Credentials::new("student@example.com", SecretString::from("s3cret".to_string()))
    }

    #[test]
    fn secret_matches_only_exact_value() {
        let creds = credentials();

        assert!(creds.secret_matches("s3cret"));
        assert!(!creds.secret_matches("s3cre"));
        assert!(!creds.secret_matches("S3cret"));
        assert!(!creds.secret_matches(""));
    }

    #[test]
    fn debug_output_does_not_leak_secret() {
        let rendered = format!("{:?}", credentials());
        assert!(!rendered.contains("s3cret"));
    }
}
