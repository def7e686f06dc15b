//! Loading the stored OAuth token used to call the YouTube Data API.
//!
//! The token file is the JSON token response saved by whatever performed the
//! OAuth consent flow, e.g.
//!
//! ```json
//! {"access_token": "ya29...", "refresh_token": "1//0g...", "token_type": "Bearer",
//!  "scope": "https://www.googleapis.com/auth/youtube.readonly"}
//! ```
//!
//! Only the access token is used. Keeping it fresh is the job of that same tool.

use eyre::Context;
use oauth2::basic::BasicTokenResponse;
use oauth2::{AccessToken, TokenResponse};
use std::path::Path;

pub fn load_access_token(path: impl AsRef<Path>) -> eyre::Result<AccessToken> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("read token file {}", path.display()))?;
    let token: BasicTokenResponse = serde_json::from_str(&raw)
        .with_context(|| format!("parse YouTube access token from {}", path.display()))?;
    if token.access_token().secret().is_empty() {
        eyre::bail!("token file {} has an empty access_token", path.display());
    }
    Ok(token.access_token().clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_token(json: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    #[test]
    fn reads_google_style_token_file() {
        let file = write_token(
            r#"{
                "access_token": "ya29.secret",
                "refresh_token": "1//0g-refresh",
                "scope": "https://www.googleapis.com/auth/youtube.readonly",
                "token_type": "Bearer",
                "expiry_date": 1700000000000
            }"#,
        );
        let token = load_access_token(file.path()).unwrap();
        assert_eq!(token.secret(), "ya29.secret");
    }

    #[test]
    fn missing_access_token_is_an_error() {
        let file = write_token(r#"{"refresh_token": "1//0g-refresh", "token_type": "Bearer"}"#);
        assert!(load_access_token(file.path()).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_access_token("/nonexistent/token.json").is_err());
    }
}
