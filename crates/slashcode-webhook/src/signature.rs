use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

const SIGNATURE_SCHEME_PREFIX: &str = "sha256=";

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SignatureError {
    #[error("X-Hub-Signature-256 header missing")]
    Missing,
    #[error("X-Hub-Signature-256 scheme prefix must be 'sha256='")]
    BadScheme,
    #[error("X-Hub-Signature-256 hex digest malformed")]
    MalformedDigest,
    #[error("signature does not match request body")]
    Mismatch,
}

/// Verifies the HMAC-SHA256 signature of a webhook delivery.
///
/// `header` is the full `X-Hub-Signature-256` header value
/// (`sha256=<64-hex>`). The digest comparison is performed by
/// `hmac::Mac::verify_slice`, which is constant-time over equal-length
/// inputs (it is built on `subtle::ConstantTimeEq`) — `spec.md` §8
/// invariant 6.
pub fn verify_signature(secret: &[u8], body: &[u8], header: Option<&str>) -> Result<(), SignatureError> {
    let header = header.ok_or(SignatureError::Missing)?;
    let hex_digest = header
        .strip_prefix(SIGNATURE_SCHEME_PREFIX)
        .ok_or(SignatureError::BadScheme)?;
    let expected = hex::decode(hex_digest).map_err(|_| SignatureError::MalformedDigest)?;

    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret).expect("HMAC accepts a key of any length");
    mac.update(body);
    mac.verify_slice(&expected).map_err(|_| SignatureError::Mismatch)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(secret: &[u8], body: &[u8]) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(secret).unwrap();
        mac.update(body);
        format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
    }

    #[test]
    fn unit_verify_signature_accepts_matching_digest() {
        let secret = b"top-secret";
        let body = b"{\"action\":\"created\"}";
        let header = sign(secret, body);
        assert!(verify_signature(secret, body, Some(&header)).is_ok());
    }

    #[test]
    fn functional_verify_signature_rejects_missing_header() {
        assert_eq!(
            verify_signature(b"secret", b"body", None).unwrap_err(),
            SignatureError::Missing
        );
    }

    #[test]
    fn functional_verify_signature_rejects_wrong_scheme() {
        let err = verify_signature(b"secret", b"body", Some("sha1=deadbeef")).unwrap_err();
        assert_eq!(err, SignatureError::BadScheme);
    }

    #[test]
    fn functional_verify_signature_rejects_malformed_hex() {
        let err = verify_signature(b"secret", b"body", Some("sha256=not-hex")).unwrap_err();
        assert_eq!(err, SignatureError::MalformedDigest);
    }

    #[test]
    fn regression_flipping_any_bit_of_body_or_signature_causes_rejection() {
        let secret = b"top-secret";
        let body = b"{\"action\":\"created\"}".to_vec();
        let header = sign(secret, &body);
        assert!(verify_signature(secret, &body, Some(&header)).is_ok());

        let mut flipped_body = body.clone();
        flipped_body[0] ^= 0x01;
        assert!(verify_signature(secret, &flipped_body, Some(&header)).is_err());

        let mut flipped_header = header.clone();
        let last = flipped_header.pop().unwrap();
        let replacement = if last == '0' { '1' } else { '0' };
        flipped_header.push(replacement);
        assert!(verify_signature(secret, &body, Some(&flipped_header)).is_err());
    }

    #[test]
    fn integration_resigning_same_body_with_same_secret_is_accepted() {
        let secret = b"rotating-secret";
        let body = b"payload-bytes-for-resign-test";
        let header_a = sign(secret, body);
        let header_b = sign(secret, body);
        assert_eq!(header_a, header_b);
        assert!(verify_signature(secret, body, Some(&header_a)).is_ok());
    }
}
