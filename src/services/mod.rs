pub mod entitlement;
pub mod insights;
pub mod mailer;
pub mod notifications;
pub mod otp;
