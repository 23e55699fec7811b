//! RFC 6238 code generation for stored secrets
//!
//! Six digits, 30 second step. Verification accepts one step of clock skew
//! either side.

use chrono::Utc;
use thiserror::Error;
use totp_rs::{Secret, TOTP};

use crate::vault::Algorithm;

/// Digits per code
pub const DIGITS: usize = 6;

/// Seconds per time step
pub const STEP: u64 = 30;

/// Steps of drift tolerated by `verify`
pub const SKEW: u8 = 1;

/// Errors returned while building a generator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OtpError {
    #[error("secret is not valid base32")]
    InvalidSecret,
}

/// Code generator bound to one secret
pub struct OtpGenerator {
    totp: TOTP,
}

impl OtpGenerator {
    pub fn new(secret: &str, algorithm: Algorithm) -> Result<Self, OtpError> {
        let bytes = decode_secret(secret)?;
        let algorithm = match algorithm {
            Algorithm::Sha1 => totp_rs::Algorithm::SHA1,
        };

        // Short legacy secrets (80 bits) are common, so skip the 128-bit check.
        let totp = TOTP::new_unchecked(algorithm, DIGITS, SKEW, STEP, bytes);
        Ok(Self { totp })
    }

    /// Code for the current time
    pub fn generate(&self) -> String {
        self.generate_at(now())
    }

    pub fn generate_at(&self, unix_secs: u64) -> String {
        self.totp.generate(unix_secs)
    }

    /// Check a code against the current time
    pub fn verify(&self, code: &str) -> bool {
        self.verify_at(code, now())
    }

    pub fn verify_at(&self, code: &str, unix_secs: u64) -> bool {
        self.totp.check(code.trim(), unix_secs)
    }
}

/// Generate the current code for a base32 secret
pub fn generate(secret: &str) -> Result<String, OtpError> {
    Ok(OtpGenerator::new(secret, Algorithm::default())?.generate())
}

/// Verify a code for a base32 secret at the current time
pub fn verify(code: &str, secret: &str) -> Result<bool, OtpError> {
    Ok(OtpGenerator::new(secret, Algorithm::default())?.verify(code))
}

/// Seconds until the current code rolls over (1..=30)
pub fn time_remaining() -> u64 {
    time_remaining_at(now())
}

pub fn time_remaining_at(unix_secs: u64) -> u64 {
    STEP - unix_secs % STEP
}

/// Decode a base32 secret, tolerating spaces, lowercase, and padding
fn decode_secret(secret: &str) -> Result<Vec<u8>, OtpError> {
    let normalized: String = secret
        .chars()
        .filter(|c| !c.is_ascii_whitespace() && *c != '=')
        .map(|c| c.to_ascii_uppercase())
        .collect();

    if normalized.is_empty() {
        return Err(OtpError::InvalidSecret);
    }

    Secret::Encoded(normalized)
        .to_bytes()
        .map_err(|_| OtpError::InvalidSecret)
}

fn now() -> u64 {
    Utc::now().timestamp().max(0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 6238 appendix B key "12345678901234567890"
    const RFC_SECRET: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";

    fn rfc() -> OtpGenerator {
        OtpGenerator::new(RFC_SECRET, Algorithm::Sha1).unwrap()
    }

    #[test]
    fn test_rfc6238_vectors() {
        let otp = rfc();
        assert_eq!(otp.generate_at(59), "287082");
        assert_eq!(otp.generate_at(1_111_111_109), "081804");
        assert_eq!(otp.generate_at(1_234_567_890), "005924");
    }

    #[test]
    fn test_six_digits_now() {
        let code = generate("JBSWY3DPEHPK3PXP").unwrap();
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_normalization() {
        let spaced = OtpGenerator::new("jbsw y3dp ehpk 3pxp", Algorithm::Sha1).unwrap();
        let plain = OtpGenerator::new("JBSWY3DPEHPK3PXP", Algorithm::Sha1).unwrap();
        assert_eq!(spaced.generate_at(1_700_000_000), plain.generate_at(1_700_000_000));
    }

    #[test]
    fn test_invalid_secret() {
        assert!(matches!(
            OtpGenerator::new("not-base32-!!", Algorithm::Sha1),
            Err(OtpError::InvalidSecret)
        ));
        assert!(matches!(
            OtpGenerator::new("   ", Algorithm::Sha1),
            Err(OtpError::InvalidSecret)
        ));
    }

    #[test]
    fn test_verify_with_skew() {
        let otp = rfc();
        let t = 1_111_111_109;
        let code = otp.generate_at(t);

        assert!(otp.verify_at(&code, t));
        assert!(otp.verify_at(&code, t + STEP));
        assert!(!otp.verify_at(&code, t + 3 * STEP));
        assert!(!otp.verify_at("12345", t));
    }

    #[test]
    fn test_verify_raw_secret() {
        let code = generate("JBSWY3DPEHPK3PXP").unwrap();
        assert_eq!(verify(&code, "JBSWY3DPEHPK3PXP"), Ok(true));
        assert_eq!(verify("12345", "JBSWY3DPEHPK3PXP"), Ok(false));
        assert_eq!(verify(&code, "not-base32-!!"), Err(OtpError::InvalidSecret));
    }

    #[test]
    fn test_verify_wrong_secret() {
        let other = OtpGenerator::new("JBSWY3DPEHPK3PXP", Algorithm::Sha1).unwrap();
        let t = 1_234_567_890;
        assert!(!other.verify_at(&rfc().generate_at(t), t));
    }

    #[test]
    fn test_time_remaining() {
        assert_eq!(time_remaining_at(0), 30);
        assert_eq!(time_remaining_at(59), 1);
        assert_eq!(time_remaining_at(61), 29);

        let remaining = time_remaining();
        assert!((1..=30).contains(&remaining));
    }
}
