use base64::Engine;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs1v15::{Signature, SigningKey, VerifyingKey};
use rsa::pkcs8::DecodePublicKey;
use rsa::signature::{RandomizedSigner, SignatureEncoding, Verifier};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("invalid PKCS#1 PEM private key: {0}")]
    InvalidPrivateKey(String),
    #[error("invalid base64 PKIX public key: {0}")]
    InvalidPublicKeyEncoding(String),
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),
    #[error("invalid signature")]
    InvalidSignature,
}

/// Sign `data` with an RSA private key using RSASSA-PKCS1-v1_5/SHA-256,
/// returning the base64-encoded signature — the exact scheme the platform
/// uses to sign a webhook's `InitiatorUUID`.
pub fn sign(data: &[u8], private_key_pem: &str) -> Result<String, SignatureError> {
    let private_key = RsaPrivateKey::from_pkcs1_pem(private_key_pem)
        .map_err(|e| SignatureError::InvalidPrivateKey(e.to_string()))?;
    let signing_key = SigningKey::<Sha256>::new(private_key);
    let mut rng = rand::thread_rng();
    let signature: Signature = signing_key.sign_with_rng(&mut rng, data);
    Ok(base64::engine::general_purpose::STANDARD.encode(signature.to_bytes()))
}

/// Verify a base64-encoded RSASSA-PKCS1-v1_5/SHA-256 signature against
/// `data`, using a base64-encoded PKIX `SubjectPublicKeyInfo` DER public key
/// (the form `x509.MarshalPKIXPublicKey` produces, and the form tenant
/// `WebhookSigningKey`s are registered in).
pub fn verify(data: &[u8], signature_b64: &str, public_key_pkix_b64: &str) -> Result<(), SignatureError> {
    let der = base64::engine::general_purpose::STANDARD
        .decode(public_key_pkix_b64)
        .map_err(|e| SignatureError::InvalidPublicKeyEncoding(e.to_string()))?;
    let public_key = RsaPublicKey::from_public_key_der(&der)
        .map_err(|e| SignatureError::InvalidPublicKey(e.to_string()))?;
    let verifying_key = VerifyingKey::<Sha256>::new(public_key);
    let sig_bytes = base64::engine::general_purpose::STANDARD
        .decode(signature_b64)
        .map_err(|_| SignatureError::InvalidSignature)?;
    let signature =
        Signature::try_from(sig_bytes.as_slice()).map_err(|_| SignatureError::InvalidSignature)?;
    verifying_key
        .verify(data, &signature)
        .map_err(|_| SignatureError::InvalidSignature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsa::pkcs1::EncodeRsaPrivateKey;
    use rsa::pkcs8::EncodePublicKey;

    fn test_keypair() -> (String, String) {
        let mut rng = rand::thread_rng();
        let private_key = RsaPrivateKey::new(&mut rng, 2048).expect("generate RSA key");
        let public_key = RsaPublicKey::from(&private_key);
        let private_pem = private_key
            .to_pkcs1_pem(rsa::pkcs1::LineEnding::LF)
            .expect("encode private pem")
            .to_string();
        let public_der = public_key
            .to_public_key_der()
            .expect("encode public key as PKIX SPKI DER");
        let public_b64 = base64::engine::general_purpose::STANDARD.encode(public_der.as_bytes());
        (private_pem, public_b64)
    }

    #[test]
    fn sign_verify_round_trip() {
        let (private_pem, public_b64) = test_keypair();
        let uuid = b"2kT3Fdzmy3LDyj9zP081dIXp7fQ";
        let sig = sign(uuid, &private_pem).expect("sign");
        verify(uuid, &sig, &public_b64).expect("verify");
    }

    #[test]
    fn tampered_message_fails() {
        let (private_pem, public_b64) = test_keypair();
        let sig = sign(b"original-uuid", &private_pem).expect("sign");
        assert!(verify(b"tampered-uuid", &sig, &public_b64).is_err());
    }
}
