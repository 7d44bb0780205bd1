//! NPM Plugin - npm registry client
//!
//! - Login through the registry's CouchDB-style user endpoint
//!   (`PUT /-/user/org.couchdb.user:<name>`), which returns a bearer token
//! - Publishing through the installed `npm` CLI
//!
//! The user's own npm configuration is never modified. An authenticated
//! publish gets a throwaway `--userconfig` file carrying the session's
//! registry, email and token.

use crate::core::traits::{DEFAULT_REGISTRY, RegistryClient, Session};
use crate::security::command_executor::SafeCommandExecutor;
use crate::security::credentials::{Credentials, mask_in_string};
use anyhow::{Context, anyhow, bail};
use async_trait::async_trait;
use reqwest::Url;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

const USER_AGENT: &str = concat!("batch-publish/", env!("CARGO_PKG_VERSION"));

/// Body of the login request
#[derive(Serialize)]
struct LoginRequest<'a> {
    #[serde(rename = "_id")]
    id: String,
    name: &'a str,
    password: &'a str,
    email: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    roles: Vec<String>,
    date: String,
}

/// Relevant part of the login response
#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: Option<String>,
}

/// Registry error body
#[derive(Debug, Deserialize)]
struct RegistryErrorBody {
    error: Option<String>,
    reason: Option<String>,
}

/// npm registry client
#[derive(Debug, Clone, Default)]
pub struct NpmPlugin {
    http: reqwest::Client,
}

impl NpmPlugin {
    /// Create a new npm client
    pub fn new() -> Self {
        Self::default()
    }
}

/// Registry URL with a guaranteed trailing slash
fn normalize_registry(registry: &str) -> String {
    let trimmed = registry.trim();
    if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{}/", trimmed)
    }
}

/// `PUT` target for logging in as `username`
fn user_url(registry: &str, username: &str) -> anyhow::Result<Url> {
    let mut url = Url::parse(registry).with_context(|| format!("Invalid registry URL: {}", registry))?;
    let user_doc = format!("org.couchdb.user:{}", username);
    url.path_segments_mut()
        .map_err(|_| anyhow!("Invalid registry URL: {}", registry))?
        .pop_if_empty()
        .extend(["-", "user", user_doc.as_str()]);
    Ok(url)
}

/// npm's scheme-less registry key (`//host[:port]/path/`)
fn nerf_dart(registry: &str) -> anyhow::Result<String> {
    let url = Url::parse(registry).with_context(|| format!("Invalid registry URL: {}", registry))?;
    let host = url
        .host_str()
        .ok_or_else(|| anyhow!("Registry URL has no host: {}", registry))?;

    let mut path = url.path().to_string();
    if !path.ends_with('/') {
        path.push('/');
    }

    Ok(match url.port() {
        Some(port) => format!("//{}:{}{}", host, port, path),
        None => format!("//{}{}", host, path),
    })
}

/// Contents of the per-publish npm userconfig
fn userconfig_contents(session: &Session, token: &SecretString) -> anyhow::Result<String> {
    let registry = session.registry_or_default();
    let mut lines = vec![format!("registry={}", registry)];
    if let Some(email) = session.email() {
        lines.push(format!("email={}", email));
    }
    lines.push(format!(
        "{}:_authToken={}",
        nerf_dart(registry)?,
        token.expose_secret()
    ));
    Ok(lines.join("\n") + "\n")
}

fn write_userconfig(session: &Session, token: &SecretString) -> anyhow::Result<NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix("batch-publish-")
        .suffix(".npmrc")
        .tempfile()
        .context("Failed to create npm userconfig")?;
    file.write_all(userconfig_contents(session, token)?.as_bytes())
        .context("Failed to write npm userconfig")?;
    file.flush()?;
    Ok(file)
}

/// Human-readable message for a failed registry response
fn registry_error_message(status: reqwest::StatusCode, body: &str) -> String {
    let detail = serde_json::from_str::<RegistryErrorBody>(body)
        .ok()
        .and_then(|b| b.reason.or(b.error))
        .unwrap_or_else(|| body.trim().to_string());

    if detail.is_empty() {
        status.to_string()
    } else {
        format!("{} ({})", status, detail)
    }
}

/// Strip npm's log prefixes and bookkeeping lines from stderr
///
/// The most informative line ends up first.
fn summarize_npm_error(stderr: &str) -> String {
    stderr
        .lines()
        .map(|line| {
            line.trim_start_matches("npm ERR!")
                .trim_start_matches("npm error")
                .trim()
        })
        .filter(|line| !line.is_empty())
        .filter(|line| !line.starts_with("code ") && !line.starts_with("A complete log"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl RegistryClient for NpmPlugin {
    fn name(&self) -> &str {
        "npm"
    }

    async fn login(
        &self,
        registry: Option<&str>,
        credentials: &Credentials,
    ) -> anyhow::Result<Session> {
        let registry = normalize_registry(registry.unwrap_or(DEFAULT_REGISTRY));
        let url = user_url(&registry, credentials.username())?;

        let body = LoginRequest {
            id: format!("org.couchdb.user:{}", credentials.username()),
            name: credentials.username(),
            password: credentials.password().expose_secret(),
            email: credentials.email(),
            kind: "user",
            roles: Vec::new(),
            date: chrono::Utc::now().to_rfc3339(),
        };

        let response = self
            .http
            .put(url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Unable to reach {}", registry))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            bail!("{}", registry_error_message(status, &text));
        }

        let login: LoginResponse = response
            .json()
            .await
            .context("Unexpected login response from registry")?;
        let token = login
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| anyhow!("Registry did not return an auth token"))?;

        Ok(Session::authenticated(
            &registry,
            credentials.username(),
            credentials.email(),
            SecretString::new(token.into()),
        ))
    }

    async fn publish(&self, session: &Session, path: &Path) -> anyhow::Result<()> {
        let executor = SafeCommandExecutor::new(path)?;

        let mut args: Vec<OsString> = vec!["publish".into()];
        if let Some(registry) = session.registry() {
            args.push("--registry".into());
            args.push(registry.into());
        }

        // Must outlive the npm process
        let userconfig = match session.token() {
            Some(token) => Some(write_userconfig(session, token)?),
            None => None,
        };
        if let Some(file) = &userconfig {
            args.push("--userconfig".into());
            args.push(file.path().into());
        }

        let output = executor.execute("npm", &args).await?;
        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let mut message = summarize_npm_error(&stderr);
        if message.is_empty() {
            message = format!("npm publish exited with {}", output.status);
        }
        if let Some(token) = session.token() {
            message = mask_in_string(&message, token);
        }

        bail!("{}", message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn session() -> Session {
        Session::authenticated(
            "https://npm.example.com/",
            "alice",
            "alice@example.com",
            SecretString::new("npm_abcdefghijklmnop".into()),
        )
    }

    #[test]
    fn test_new_plugin() {
        let plugin = NpmPlugin::new();
        assert_eq!(plugin.name(), "npm");
    }

    #[test]
    fn test_normalize_registry() {
        assert_eq!(normalize_registry("https://a.example.com"), "https://a.example.com/");
        assert_eq!(normalize_registry("https://a.example.com/"), "https://a.example.com/");
    }

    #[test]
    fn test_user_url() {
        let url = user_url("https://npm.example.com/", "alice").unwrap();
        assert_eq!(
            url.as_str(),
            "https://npm.example.com/-/user/org.couchdb.user:alice"
        );
    }

    #[test]
    fn test_user_url_with_path_prefix() {
        let url = user_url("https://artifacts.example.com/api/npm/", "alice").unwrap();
        assert_eq!(
            url.as_str(),
            "https://artifacts.example.com/api/npm/-/user/org.couchdb.user:alice"
        );
    }

    #[test]
    fn test_user_url_invalid_registry() {
        assert!(user_url("not a url", "alice").is_err());
    }

    #[test]
    fn test_nerf_dart() {
        assert_eq!(
            nerf_dart("https://registry.npmjs.org/").unwrap(),
            "//registry.npmjs.org/"
        );
        assert_eq!(
            nerf_dart("http://localhost:4873").unwrap(),
            "//localhost:4873/"
        );
        assert_eq!(
            nerf_dart("https://artifacts.example.com/api/npm").unwrap(),
            "//artifacts.example.com/api/npm/"
        );
    }

    #[test]
    fn test_userconfig_contents() {
        let session = session();
        let contents = userconfig_contents(&session, session.token().unwrap()).unwrap();

        assert_eq!(
            contents,
            "registry=https://npm.example.com/\n\
             email=alice@example.com\n\
             //npm.example.com/:_authToken=npm_abcdefghijklmnop\n"
        );
    }

    #[test]
    fn test_write_userconfig() {
        let session = session();
        let file = write_userconfig(&session, session.token().unwrap()).unwrap();
        let written = std::fs::read_to_string(file.path()).unwrap();
        assert!(written.contains(":_authToken=npm_abcdefghijklmnop"));
    }

    #[test]
    fn test_login_request_shape() {
        let body = LoginRequest {
            id: "org.couchdb.user:alice".to_string(),
            name: "alice",
            password: "pw",
            email: "alice@example.com",
            kind: "user",
            roles: Vec::new(),
            date: "2024-01-01T00:00:00+00:00".to_string(),
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["_id"], "org.couchdb.user:alice");
        assert_eq!(json["type"], "user");
        assert_eq!(json["roles"], serde_json::json!([]));
    }

    #[test]
    fn test_registry_error_message() {
        let status = reqwest::StatusCode::UNAUTHORIZED;
        assert_eq!(
            registry_error_message(status, r#"{"error":"incorrect password"}"#),
            "401 Unauthorized (incorrect password)"
        );
        assert_eq!(registry_error_message(status, ""), "401 Unauthorized");
        assert_eq!(
            registry_error_message(status, "plain text"),
            "401 Unauthorized (plain text)"
        );
    }

    #[test]
    fn test_summarize_npm_error() {
        let stderr = "npm ERR! code E403\n\
                      npm ERR! 403 403 Forbidden - PUT https://registry.npmjs.org/pkg-b\n\
                      npm ERR! \n\
                      npm ERR! A complete log of this run can be found in: /tmp/x.log\n";

        assert_eq!(
            summarize_npm_error(stderr),
            "403 403 Forbidden - PUT https://registry.npmjs.org/pkg-b"
        );
    }

    #[test]
    fn test_summarize_npm_error_new_prefix() {
        let stderr = "npm error code E404\nnpm error 404 Not Found - PUT https://r/pkg\n";
        assert_eq!(
            summarize_npm_error(stderr),
            "404 Not Found - PUT https://r/pkg"
        );
    }

    #[tokio::test]
    async fn test_publish_missing_directory_fails() {
        let temp_dir = TempDir::new().unwrap();
        let plugin = NpmPlugin::new();

        let result = plugin
            .publish(&Session::anonymous(None), &temp_dir.path().join("gone"))
            .await;

        assert!(result.is_err());
    }
}
