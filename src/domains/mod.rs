//! Domains module containing business logic organized by bounded contexts.
//!
//! - **tools**: the tool catalogue, its registry and aggregation helpers
//! - **upstream**: the REST backends the tools talk to

pub mod tools;
pub mod upstream;
