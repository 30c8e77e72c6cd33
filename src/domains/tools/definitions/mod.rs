//! Tool definitions module.
//!
//! This module exports all available tool definitions.
//! Tools are grouped by the backend they talk to, one file per backend.

pub mod analytics;
pub mod common;
pub mod crm;
pub mod helpdesk;
pub mod plugin;
pub mod quotes;
pub mod store;

use super::registry::ToolSpec;

/// Every tool this server provides, in listing order.
pub fn all() -> Vec<ToolSpec> {
    let mut specs = Vec::new();
    specs.extend(store::tools());
    specs.extend(analytics::tools());
    specs.extend(plugin::tools());
    specs.extend(quotes::tools());
    specs.extend(helpdesk::tools());
    specs.extend(crm::tools());
    specs
}
