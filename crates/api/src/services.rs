//! External service abstractions.
//!
//! ## Services
//!
//! - **discovery** - On-chain role discovery over JSON-RPC (`eth_call`)
//!
//! ## Usage in Handlers
//!
//! ```ignore
//! async fn handler(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
//!     let parties = state.discovery.discover(&contract_address).await;
//! }
//! ```

mod discovery;

pub use discovery::{JsonRpcRoleDiscovery, ROLE_GETTERS, RoleDiscovery, selector};

#[cfg(test)]
pub use discovery::MockRoleDiscovery;
