//! sfj-provider — the seam between the orchestrator and a compute provider.
//!
//! The orchestrator only ever talks to a provider control plane through the
//! traits in [`api`]. Any concrete client (a remote SDK adapter, or the
//! embedded emulator in `sfj-local`) maps its failures onto
//! [`ProviderError`], whose variants drive the create-vs-reuse decisions.
//!
//! # Components
//!
//! - **`api`** — `ComputeApi`, `GatewayApi`, `IdentityApi`
//! - **`error`** — NotFound / AlreadyExists / Transient / Fatal
//! - **`retry`** — bounded exponential backoff for transient failures

pub mod api;
pub mod error;
pub mod retry;

pub use api::{ComputeApi, GatewayApi, IdentityApi, ProviderClients};
pub use error::{ProviderError, ProviderResult};
pub use retry::RetryPolicy;
