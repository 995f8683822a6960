pub mod config;
pub mod hash;
pub mod naming;
pub mod types;

pub use config::SfjConfig;
pub use hash::{ContentHasher, FunctionIdentity, IdentityError};
pub use types::*;
