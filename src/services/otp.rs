use rand::Rng;
use sha2::{Digest, Sha256};

pub const OTP_DIGITS: usize = 6;

/// Uniform 6-digit code, zero padded.
pub fn generate_otp() -> String {
    let code: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{:06}", code)
}

/// Codes are stored as lowercase hex SHA-256.
pub fn hash_otp(otp: &str) -> String {
    let digest = Sha256::digest(otp.trim().as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn otps_are_six_digits() {
        for _ in 0..100 {
            let otp = generate_otp();
            assert_eq!(otp.len(), OTP_DIGITS);
            assert!(otp.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn hashing_is_stable_hex() {
        let hash = hash_otp("123456");
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, hash_otp(" 123456 "));
        assert_ne!(hash, hash_otp("123457"));
    }
}
