//! Signed session credentials.
//!
//! The cookie carries `{session_id}.{signature}` where the signature is
//! `base64url(hmac_sha256(secret, session_id))`. A credential whose
//! signature does not verify never reaches the store.

use base64::{Engine as _, engine::general_purpose};
use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::session::SessionId;

type HmacSha256 = Hmac<Sha256>;

/// Secret used to sign session credentials.
#[derive(Clone)]
pub struct SessionSecret(String);

impl SessionSecret {
    #[must_use]
    pub fn new(secret: String) -> Self {
        Self(secret)
    }

    fn mac(&self) -> HmacSha256 {
        // HMAC hashes or pads the key to the block size, so no length is rejected.
        match <HmacSha256 as KeyInit>::new_from_slice(self.0.as_bytes()) {
            Ok(mac) => mac,
            Err(_) => unreachable!("HMAC accepts keys of any length"),
        }
    }

    /// Produces the cookie credential for `id`.
    #[must_use]
    pub fn sign(&self, id: &SessionId) -> String {
        let mut mac = self.mac();
        mac.update(id.as_str().as_bytes());
        let signature = general_purpose::URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        format!("{}.{}", id.as_str(), signature)
    }

    /// Verifies a credential and returns the session ID it carries.
    #[must_use]
    pub fn verify(&self, credential: &str) -> Option<SessionId> {
        let (id, signature_b64) = credential.rsplit_once('.')?;
        if id.is_empty() {
            return None;
        }

        let signature = general_purpose::URL_SAFE_NO_PAD
            .decode(signature_b64)
            .ok()?;

        let mut mac = self.mac();
        mac.update(id.as_bytes());
        mac.verify_slice(&signature).ok()?;

        Some(SessionId::new(id.to_string()))
    }
}

impl std::fmt::Debug for SessionSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionSecret(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret() -> SessionSecret {
        SessionSecret::new("sup dude, this is a test secret".to_string())
    }

    #[test]
    fn signed_credential_verifies() {
        let id = SessionId::generate();
        let credential = secret().sign(&id);

        assert!(credential.starts_with(id.as_str()));
        assert_eq!(secret().verify(&credential), Some(id));
    }

    #[test]
    fn tampered_id_is_rejected() {
        let credential = secret().sign(&SessionId::from("01HABCDEF"));
        let (_, signature) = credential.rsplit_once('.').expect("dot");
        let forged = format!("01HZZZZZZ.{signature}");

        assert!(secret().verify(&forged).is_none());
    }

    #[test]
    fn other_secret_is_rejected() {
        let credential = secret().sign(&SessionId::from("01HABCDEF"));
        let other = SessionSecret::new("a completely different secret".to_string());

        assert!(other.verify(&credential).is_none());
    }

    #[test]
    fn malformed_credentials_are_rejected() {
        for credential in ["", "no-dot", ".sig", "id.not*base64", "id."] {
            assert!(secret().verify(credential).is_none(), "{credential}");
        }
    }

    #[test]
    fn debug_hides_secret() {
        assert!(!format!("{:?}", secret()).contains("sup dude"));
    }
}
