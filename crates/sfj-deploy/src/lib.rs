//! sfj-deploy — content-addressed deployment orchestrator.
//!
//! Publishes zipped function payloads as compute functions named after the
//! hash of their bytes, and exposes each one behind a route on a single
//! shared gateway per store account. Re-deploying identical bytes reuses
//! every provider resource; nothing here ever deletes.
//!
//! # Architecture
//!
//! ```text
//! DeploymentOrchestrator
//!   ├── ContentHasher (payload → identity)
//!   ├── FunctionPublisher (create, or reuse on naming conflict; forced update)
//!   │     └── FunctionRegistry (deployed identities, for reconciliation)
//!   ├── GatewayStore (one gateway per account, recorded in an object store)
//!   └── RouteBinder (integration lookup-before-create, route, stage, permission)
//! ```
//!
//! # Known limitation
//!
//! Gateway bootstrap is single-flight within one process only. Two
//! processes deploying to a never-bootstrapped account at the same time can
//! both create a gateway; the bootstrap record is last-writer-wins and the
//! losing gateway is orphaned.
//!
//! Binding treats an existing integration for a function as proof that it
//! is fully wired. If a bind creates the integration and then fails on the
//! route or permission, later deploys of that identity reuse the
//! integration without creating the missing route or grant; it has to be
//! repaired by hand (for example with `RouteBinder::grant_invoke`).

pub mod error;
pub mod gateway;
pub mod orchestrator;
pub mod publisher;
pub mod routes;

pub use error::{DeployError, DeployResult};
pub use gateway::{BootstrapRecord, GatewayStore};
pub use orchestrator::{DeployOptions, DeployReport, Deployment, DeploymentOrchestrator};
pub use publisher::{FunctionPublisher, FunctionRegistry, PublishResult};
pub use routes::{BindResult, RouteBinder};
