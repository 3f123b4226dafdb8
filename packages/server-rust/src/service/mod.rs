//! Request dispatch and server administration.

pub mod admin;
pub mod engine;
pub mod router;

pub use admin::{AdminError, ServerAdmin, ServerInfo};
pub use engine::NullEngine;
pub use router::{RequestRouter, RouteError};
