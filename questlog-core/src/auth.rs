use std::fmt;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::Context as _;
use tracing::info;
use uuid::Uuid;

use crate::config::AppConfig;

const MAX_USER_ID_LEN: usize = 128;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignInMethod {
    Anonymous,
    CustomToken,
}

/// Signed-in user. Only `user_id` reaches the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub method: SignInMethod,
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.user_id)
    }
}

/// Sign in with the configured token, or anonymously when none is set.
pub async fn sign_in(config: &AppConfig) -> anyhow::Result<Identity> {
    let identity = match config.auth_token.as_deref() {
        Some(token) => sign_in_with_custom_token(token)?,
        None => sign_in_anonymously(&config.identity_file).await?,
    };

    info!(user_id = %identity.user_id, method = ?identity.method, "signed in");
    Ok(identity)
}

/// The bootstrap credential names the user directly.
pub fn sign_in_with_custom_token(token: &str) -> anyhow::Result<Identity> {
    let user_id = token.trim();
    if !is_valid_user_id(user_id) {
        anyhow::bail!(
            "auth token must be 1-{MAX_USER_ID_LEN} characters of letters, digits, `-` or `_`"
        );
    }

    Ok(Identity {
        user_id: user_id.to_owned(),
        method: SignInMethod::CustomToken,
    })
}

/// Reuse the identity stored in `identity_file`, creating one on first run.
pub async fn sign_in_anonymously(identity_file: &Path) -> anyhow::Result<Identity> {
    let user_id = match tokio::fs::read_to_string(identity_file).await {
        Ok(stored) => {
            let stored = stored.trim().to_owned();
            if !is_valid_user_id(&stored) {
                anyhow::bail!("identity file `{}` is corrupt", identity_file.display());
            }
            stored
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            let fresh = Uuid::new_v4().to_string();
            tokio::fs::write(identity_file, &fresh)
                .await
                .with_context(|| {
                    format!("failed to write identity file `{}`", identity_file.display())
                })?;
            fresh
        }
        Err(e) => {
            return Err(e).with_context(|| {
                format!("failed to read identity file `{}`", identity_file.display())
            });
        }
    };

    Ok(Identity {
        user_id,
        method: SignInMethod::Anonymous,
    })
}

pub fn is_valid_user_id(raw: &str) -> bool {
    !raw.is_empty()
        && raw.len() <= MAX_USER_ID_LEN
        && raw
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
}
