pub mod auth;
pub mod client;
pub mod error;
pub mod orgs_hooks;
pub mod response;
pub mod transport;
pub mod types;

pub use auth::*;
pub use client::*;
pub use error::*;
pub use orgs_hooks::*;
pub use response::*;
pub use transport::*;
pub use types::*;
