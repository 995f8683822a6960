//! sfj-local — an embedded emulation of the provider control plane.
//!
//! Backed by [redb](https://docs.rs/redb), `LocalCloud` implements the
//! compute, gateway, and identity traits from `sfj-provider` with the same
//! conflict and not-found semantics as the real provider. It serves local
//! dry runs of `sfj deploy` and doubles as the provider in tests.
//!
//! # Architecture
//!
//! All records are JSON-serialized into redb's `&[u8]` value columns.
//! Child resources use composite keys (`{api_id}/{child}`,
//! `{function}/{statement_id}`) so uniqueness checks and prefix scans run
//! inside a single transaction.
//!
//! `LocalCloud` is `Clone` + `Send` + `Sync` (backed by `Arc<Database>`)
//! and can be shared across async tasks.

pub mod cloud;
pub mod error;
pub mod store;
pub mod tables;

pub use error::{LocalError, LocalResult};
pub use store::LocalCloud;
