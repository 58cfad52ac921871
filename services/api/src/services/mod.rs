pub mod auth;
pub mod images;
pub mod password;

pub use auth::{AuthService, LoginOutcome, Registration};
pub use images::ImageResolver;
