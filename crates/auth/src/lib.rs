// Core modules
mod error;
mod jwt;
mod password;

// Services over the credential store
pub mod admin;
pub mod model;
pub mod service;

// Re-export error types
pub use error::{AuthError, Result};

// Re-export crypto primitives
pub use jwt::{generate_token, validate_token, Claims};
pub use password::{hash_password, hash_password_blocking, verify_password, verify_password_blocking};

pub use admin::AdminService;
pub use model::{AuthToken, Role};
pub use service::AuthService;
