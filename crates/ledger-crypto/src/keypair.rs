use crate::signing::{sign, verify, SignatureError};

/// The platform's RSA signing key, loaded once at node startup and shared
/// by the webhook dispatcher.
///
/// The PEM-encoded private key is held only as a `String` for the lifetime
/// of the process; it is zeroized on drop so it does not linger in freed
/// memory after the node shuts down.
pub struct PlatformKeyPair {
    private_key_pem: String,
}

impl PlatformKeyPair {
    /// Load a PKCS#1 PEM private key from `pem`.
    pub fn from_pem(pem: impl Into<String>) -> Self {
        Self {
            private_key_pem: pem.into(),
        }
    }

    /// Sign `data` (the webhook's `InitiatorUUID` bytes) with
    /// RSASSA-PKCS1-v1_5/SHA-256, base64-encoded.
    pub fn sign(&self, data: &[u8]) -> Result<String, SignatureError> {
        sign(data, &self.private_key_pem)
    }
}

impl Drop for PlatformKeyPair {
    fn drop(&mut self) {
        use zeroize::Zeroize;
        self.private_key_pem.zeroize();
    }
}

impl std::fmt::Debug for PlatformKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PlatformKeyPair {{ .. }}")
    }
}

/// Verify a tenant's webhook signature against their registered
/// base64-PKIX public key. Exposed for recipients who want to check
/// (spec §4.4 "Verification side").
pub fn verify_webhook_signature(
    initiator_uuid: &str,
    signature_b64: &str,
    public_key_pkix_b64: &str,
) -> Result<(), SignatureError> {
    verify(initiator_uuid.as_bytes(), signature_b64, public_key_pkix_b64)
}
