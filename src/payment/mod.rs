//! Verification of gateway-issued payment assertions.
//!
//! The gateway signs `"{order_id}|{payment_id}"` with the shared key secret
//! (HMAC-SHA256, hex digest). Verification recomputes the tag and compares
//! it in constant time; it touches no storage and is safe to call outside
//! any transaction.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::domain::errors::CheckoutError;

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone)]
pub struct SignatureVerifier {
    secret: Vec<u8>,
}

impl SignatureVerifier {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
        }
    }

    fn mac(&self, gateway_order_id: &str, gateway_payment_id: &str) -> Result<HmacSha256, CheckoutError> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| CheckoutError::Internal(e.to_string()))?;
        mac.update(gateway_order_id.as_bytes());
        mac.update(b"|");
        mac.update(gateway_payment_id.as_bytes());
        Ok(mac)
    }

    /// Check the supplied hex signature against the expected tag.
    /// Malformed hex counts as an invalid signature, not a server error.
    pub fn verify(
        &self,
        gateway_order_id: &str,
        gateway_payment_id: &str,
        signature: &str,
    ) -> Result<(), CheckoutError> {
        let supplied = hex::decode(signature).map_err(|_| CheckoutError::SignatureInvalid)?;
        self.mac(gateway_order_id, gateway_payment_id)?
            .verify_slice(&supplied)
            .map_err(|_| CheckoutError::SignatureInvalid)
    }

    /// Produce the hex signature the gateway would issue. Used by tests and
    /// payment simulation tooling.
    pub fn sign(&self, gateway_order_id: &str, gateway_payment_id: &str) -> String {
        let mac = self
            .mac(gateway_order_id, gateway_payment_id)
            .expect("HMAC accepts keys of any length");
        hex::encode(mac.finalize().into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verifier() -> SignatureVerifier {
        SignatureVerifier::new("test-gateway-secret")
    }

    #[test]
    fn accepts_signature_it_issued() {
        let v = verifier();
        let sig = v.sign("order_abc123", "pay_def456");
        assert!(v.verify("order_abc123", "pay_def456", &sig).is_ok());
    }

    #[test]
    fn rejects_tampered_signature() {
        let v = verifier();
        let mut sig = v.sign("order_abc123", "pay_def456");
        // flip the last hex digit
        let last = sig.pop().unwrap();
        sig.push(if last == '0' { '1' } else { '0' });
        assert!(matches!(
            v.verify("order_abc123", "pay_def456", &sig),
            Err(CheckoutError::SignatureInvalid)
        ));
    }

    #[test]
    fn rejects_signature_for_different_payment() {
        let v = verifier();
        let sig = v.sign("order_abc123", "pay_def456");
        assert!(matches!(
            v.verify("order_abc123", "pay_other", &sig),
            Err(CheckoutError::SignatureInvalid)
        ));
    }

    #[test]
    fn rejects_non_hex_signature() {
        let v = verifier();
        assert!(matches!(
            v.verify("order_abc123", "pay_def456", "not-hex!"),
            Err(CheckoutError::SignatureInvalid)
        ));
    }

    #[test]
    fn different_secrets_disagree() {
        let sig = SignatureVerifier::new("secret-a").sign("order_1", "pay_1");
        assert!(SignatureVerifier::new("secret-b")
            .verify("order_1", "pay_1", &sig)
            .is_err());
    }
}
