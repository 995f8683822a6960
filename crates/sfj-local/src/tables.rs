//! redb table definitions for the local control plane.
//!
//! Each table uses `&str` keys and `&[u8]` values (JSON-serialized records).

use redb::TableDefinition;

pub type JsonTable = TableDefinition<'static, &'static str, &'static [u8]>;

/// Function records keyed by `{function_name}`.
pub const FUNCTIONS: JsonTable = TableDefinition::new("functions");

/// Gateway records keyed by `{api_id}`.
pub const APIS: JsonTable = TableDefinition::new("apis");

/// Integrations keyed by `{api_id}/{integration_id}`.
pub const INTEGRATIONS: JsonTable = TableDefinition::new("integrations");

/// Routes keyed by `{api_id}/{route_key}`.
pub const ROUTES: JsonTable = TableDefinition::new("routes");

/// Stages keyed by `{api_id}/{stage_name}`.
pub const STAGES: JsonTable = TableDefinition::new("stages");

/// Permission statements keyed by `{function_name}/{statement_id}`.
pub const PERMISSIONS: JsonTable = TableDefinition::new("permissions");

pub fn child_key(parent: &str, child: &str) -> String {
    format!("{parent}/{child}")
}

pub fn child_prefix(parent: &str) -> String {
    format!("{parent}/")
}
