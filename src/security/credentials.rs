//! Registry credentials with memory-safe secret handling
//!
//! Passwords and tokens are held in `secrecy::SecretString` so that they
//! never end up in `Debug` output or log lines by accident.

use secrecy::{ExposeSecret, SecretString};
use std::fmt;

/// A complete username/password/email triple
pub struct Credentials {
    username: String,
    password: SecretString,
    email: String,
}

impl Credentials {
    /// Creates credentials from their three parts
    ///
    /// # Examples
    ///
    /// ```
    /// use batch_publish::security::Credentials;
    ///
    /// let credentials = Credentials::new("alice", "s3cret", "alice@example.com");
    /// assert_eq!(credentials.username(), "alice");
    /// assert!(!format!("{:?}", credentials).contains("s3cret"));
    /// ```
    pub fn new(username: &str, password: &str, email: &str) -> Self {
        Self {
            username: username.to_string(),
            password: SecretString::new(password.into()),
            email: email.to_string(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// The password, exposed for the login exchange only
    pub fn password(&self) -> &SecretString {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("email", &self.email)
            .finish()
    }
}

/// Masks a secret for safe logging
///
/// Shows only the first 3 and last 3 characters for identification purposes.
/// Secrets shorter than 10 characters are fully masked as "****".
///
/// # Examples
///
/// ```
/// use batch_publish::security::mask_secret;
///
/// assert_eq!(mask_secret("abcdef123456"), "abc...456");
/// assert_eq!(mask_secret("short"), "****");
/// ```
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() < 10 {
        return "****".to_string();
    }

    let prefix: String = chars[..3].iter().collect();
    let suffix: String = chars[chars.len() - 3..].iter().collect();
    format!("{}...{}", prefix, suffix)
}

/// Replaces every occurrence of `secret` in `text` with its masked form
pub fn mask_in_string(text: &str, secret: &SecretString) -> String {
    let raw = secret.expose_secret();
    if raw.is_empty() {
        return text.to_string();
    }
    text.replace(raw, &mask_secret(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_secret_with_short_secret() {
        assert_eq!(mask_secret("short"), "****");
        assert_eq!(mask_secret(""), "****");
    }

    #[test]
    fn test_mask_secret_with_long_secret() {
        assert_eq!(mask_secret("abcdef123456"), "abc...456");
        assert_eq!(mask_secret("very-long-token-string"), "ver...ing");
    }

    #[test]
    fn test_mask_secret_multibyte() {
        assert_eq!(mask_secret("ぱすわーどぱすわーどです"), "ぱすわ...どです");
    }

    #[test]
    fn test_mask_in_string() {
        let token = SecretString::new("npm_abcdefghijklmnop".into());
        let output = mask_in_string("auth failed for token npm_abcdefghijklmnop", &token);
        assert_eq!(output, "auth failed for token npm...nop");
    }

    #[test]
    fn test_mask_in_string_no_match() {
        let token = SecretString::new("npm_abcdefghijklmnop".into());
        let input = "This is a safe string with no tokens";
        assert_eq!(mask_in_string(input, &token), input);
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let credentials = Credentials::new("alice", "correct-horse-battery", "a@example.com");
        let debug = format!("{:?}", credentials);
        assert!(!debug.contains("correct-horse-battery"));
        assert!(!debug.contains("cor...ery"));
        assert!(debug.contains("[REDACTED]"));
        assert!(debug.contains("alice"));
    }

    #[test]
    fn test_credentials_password_exposed_explicitly() {
        let credentials = Credentials::new("alice", "pw", "a@example.com");
        assert_eq!(credentials.password().expose_secret(), "pw");
    }
}
