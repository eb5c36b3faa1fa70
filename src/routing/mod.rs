//! Routing module
//!
//! Provides request routing:
//! - Route registration scoped by virtual host and base path
//! - Newest-first dispatch with explicit fallthrough
//! - Traversal-safe path sanitizing for file-backed handlers

pub mod dispatcher;
pub mod entry;
pub mod path;
pub mod scope;
pub mod table;

pub use dispatcher::{Context, Router};
pub use entry::{handler, Handler, MethodFilter, RouteEntry};
pub use scope::{Registrar, Scope};
pub use table::RouteTable;
