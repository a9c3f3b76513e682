// src/services/ldap.rs

use std::time::Duration;

use ldap3::{LdapConnAsync, LdapConnSettings, LdapError};

use crate::{common::error::AppError, config::LdapConfig};

const INVALID_CREDENTIALS_RC: u32 = 49;

/// Verifies directory accounts with a simple bind.
#[derive(Clone)]
pub struct LdapAuthenticator {
    config: Option<LdapConfig>,
}

impl LdapAuthenticator {
    pub fn new(config: Option<LdapConfig>) -> Self {
        Self { config }
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_some()
    }

    /// Ok(true) on a successful bind, Ok(false) on rejected credentials.
    pub async fn verify(&self, email: &str, password: &str) -> Result<bool, AppError> {
        // An empty password would be an anonymous bind, which most servers accept.
        if password.is_empty() {
            return Ok(false);
        }

        let config = self.config.as_ref().ok_or_else(|| {
            AppError::InternalServerError(anyhow::anyhow!("LDAP account without LDAP_URL configured"))
        })?;

        let dn = bind_dn(&config.bind_template, email);
        let settings = LdapConnSettings::new().set_conn_timeout(Duration::from_secs(5));
        let (conn, mut ldap) = LdapConnAsync::with_settings(settings, &config.url).await?;
        ldap3::drive!(conn);

        let outcome = ldap.simple_bind(&dn, password).await?.success();
        let _ = ldap.unbind().await;

        match outcome {
            Ok(_) => Ok(true),
            Err(LdapError::LdapResult { result }) if result.rc == INVALID_CREDENTIALS_RC => {
                tracing::warn!("ldap bind rejected for {}", dn);
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// `{login}` in the template is the local part of the e-mail.
pub fn bind_dn(template: &str, email: &str) -> String {
    let login = email.split('@').next().unwrap_or(email).trim();
    template.replace("{login}", login)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_is_the_local_part() {
        assert_eq!(
            bind_dn("uid={login},ou=people,dc=bruss,dc=example", "jan.kowalski@bruss.example"),
            "uid=jan.kowalski,ou=people,dc=bruss,dc=example"
        );
    }

    #[test]
    fn template_may_use_upn_form() {
        assert_eq!(bind_dn("{login}@CORP", "anna@bruss.example"), "anna@CORP");
    }

    #[tokio::test]
    async fn empty_password_never_binds() {
        let auth = LdapAuthenticator::new(None);
        assert!(!auth.verify("anna@bruss.example", "").await.unwrap());
    }
}
