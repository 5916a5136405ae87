//! Client side of the tiles backend: the four read-only table lookups and the
//! layer-state report, behind the `MetadataGateway` trait.

pub mod error;
pub mod fake;
pub mod gateway;
pub mod http;
pub mod protocol;

pub use error::*;
pub use fake::*;
pub use gateway::*;
pub use http::*;
pub use protocol::*;
