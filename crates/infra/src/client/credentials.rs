//! Connection credentials resolved from [`ClientConfig`]

use std::fmt;
use std::path::Path;

use levelset_domain::{ClientConfig, LevelsetError};
use url::Url;

use super::errors::ClientError;
use crate::errors::InfraError;

/// Server location plus an optional bearer token
#[derive(Clone)]
pub struct Credentials {
    server_url: Url,
    token: Option<String>,
}

impl Credentials {
    pub fn new(server_url: Url, token: Option<String>) -> Self {
        Self { server_url, token: token.filter(|t| !t.is_empty()) }
    }

    /// Resolve credentials from configuration
    ///
    /// An inline `token` wins over `token_file`. The file content is
    /// trimmed; an empty file means no token.
    ///
    /// # Errors
    /// - `ClientError::Config` if the server URL does not parse
    /// - `ClientError::Auth` or `ClientError::NotFound` if the token file
    ///   cannot be read
    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        let server_url = Url::parse(&config.server_url).map_err(|e| {
            ClientError::Config(format!("invalid server URL '{}': {e}", config.server_url))
        })?;

        let token = match (&config.token, &config.token_file) {
            (Some(token), _) => Some(token.clone()),
            (None, Some(path)) => Some(read_token_file(path)?),
            (None, None) => None,
        };

        Ok(Self::new(server_url, token))
    }

    pub fn server_url(&self) -> &Url {
        &self.server_url
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

fn read_token_file(path: &Path) -> Result<String, ClientError> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        let err: LevelsetError = InfraError::from(e).into();
        ClientError::from(err)
    })?;
    Ok(contents.trim().to_string())
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("server_url", &self.server_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn test_inline_token_wins_over_file() {
        let config = ClientConfig {
            token: Some("inline".into()),
            token_file: Some("/nonexistent/token".into()),
            ..ClientConfig::default()
        };

        let credentials = Credentials::from_config(&config).unwrap();
        assert_eq!(credentials.token(), Some("inline"));
    }

    #[test]
    fn test_token_file_is_trimmed() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "  secret-token  ").unwrap();
        let config =
            ClientConfig { token_file: Some(file.path().to_path_buf()), ..ClientConfig::default() };

        let credentials = Credentials::from_config(&config).unwrap();
        assert_eq!(credentials.token(), Some("secret-token"));
    }

    #[test]
    fn test_missing_token_file_is_an_error() {
        let config = ClientConfig {
            token_file: Some("/nonexistent/levelset/token".into()),
            ..ClientConfig::default()
        };

        assert!(matches!(Credentials::from_config(&config), Err(ClientError::NotFound(_))));
    }

    #[test]
    fn test_invalid_url_is_config_error() {
        let config = ClientConfig { server_url: "not a url".into(), ..ClientConfig::default() };
        assert!(matches!(Credentials::from_config(&config), Err(ClientError::Config(_))));
    }

    #[test]
    fn test_debug_redacts_token() {
        let credentials =
            Credentials::new(Url::parse("http://localhost").unwrap(), Some("secret".into()));
        let rendered = format!("{credentials:?}");
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("redacted"));
    }
}
