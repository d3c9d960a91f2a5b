//! Client side of the ProxLib API: holds the issued token and decides
//! which page a client lands on.

pub mod api_client;
pub mod error;
pub mod session;

pub use api_client::{ApiClient, User};
pub use error::{ClientError, Result};
pub use session::{Session, SessionKind};
