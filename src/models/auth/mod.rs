pub mod requests;
pub mod responses;

pub use requests::{LoginRequest, MagicLinkRequest, VerifyMagicLinkRequest};
pub use responses::LoginResponse;
