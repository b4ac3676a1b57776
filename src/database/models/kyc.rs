use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::collection::Document;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KycStatus {
    Pending,
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpCheck {
    NotIssued,
    AlreadyVerified,
    Expired,
    Invalid,
    Valid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KycRequest {
    pub id: Uuid,
    pub user_id: Uuid,
    pub full_name: String,
    pub pan_number: String,
    pub document_url: String,
    pub status: KycStatus,
    #[serde(default)]
    pub rejection_reason: Option<String>,
    #[serde(default)]
    pub otp_hash: Option<String>,
    #[serde(default)]
    pub otp_expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub otp_verified: bool,
    #[serde(default)]
    pub reviewed_by: Option<Uuid>,
    #[serde(default)]
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document for KycRequest {
    const COLLECTION: &'static str = "kyc_requests";
    const LABEL: &'static str = "KYC request";

    fn id(&self) -> Uuid {
        self.id
    }
}

impl KycRequest {
    /// Compare a hashed submission against the issued OTP. Expiry wins over a mismatch.
    pub fn check_otp(&self, submitted_hash: &str, now: DateTime<Utc>) -> OtpCheck {
        if self.otp_verified {
            return OtpCheck::AlreadyVerified;
        }
        let (Some(hash), Some(expires_at)) = (self.otp_hash.as_deref(), self.otp_expires_at) else {
            return OtpCheck::NotIssued;
        };
        if self.status != KycStatus::Accepted {
            return OtpCheck::NotIssued;
        }
        if now > expires_at {
            OtpCheck::Expired
        } else if hash != submitted_hash {
            OtpCheck::Invalid
        } else {
            OtpCheck::Valid
        }
    }

    /// Response view without the OTP hash.
    pub fn redacted(mut self) -> Self {
        self.otp_hash = None;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn accepted(now: DateTime<Utc>) -> KycRequest {
        KycRequest {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            full_name: "Ravi Kumar".into(),
            pan_number: "ABCDE1234F".into(),
            document_url: "https://files.example.com/pan.png".into(),
            status: KycStatus::Accepted,
            rejection_reason: None,
            otp_hash: Some("abc".into()),
            otp_expires_at: Some(now + Duration::minutes(10)),
            otp_verified: false,
            reviewed_by: None,
            reviewed_at: Some(now),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn otp_checks_expiry_before_value() {
        let now = Utc::now();
        let request = accepted(now);
        assert_eq!(request.check_otp("abc", now + Duration::minutes(9)), OtpCheck::Valid);
        assert_eq!(request.check_otp("zzz", now + Duration::minutes(9)), OtpCheck::Invalid);
        assert_eq!(request.check_otp("abc", now + Duration::minutes(11)), OtpCheck::Expired);
        assert_eq!(request.check_otp("zzz", now + Duration::minutes(11)), OtpCheck::Expired);
    }

    #[test]
    fn otp_requires_an_issued_unverified_code() {
        let now = Utc::now();
        let mut request = accepted(now);
        request.otp_verified = true;
        assert_eq!(request.check_otp("abc", now), OtpCheck::AlreadyVerified);

        let mut pending = accepted(now);
        pending.status = KycStatus::Pending;
        pending.otp_hash = None;
        assert_eq!(pending.check_otp("abc", now), OtpCheck::NotIssued);
    }
}
