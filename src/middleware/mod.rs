pub mod auth;
pub mod entitlement;
pub mod extract;
pub mod response;
pub mod role;

pub use auth::{resolve_identity, AuthUser, Authentication};
pub use entitlement::{require_entitlement, EntitlementGate};
pub use extract::ValidatedJson;
pub use response::{ApiResponse, ApiResult};
pub use role::{require_kyc, require_role};
