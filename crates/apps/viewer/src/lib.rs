//! Layer lifecycle of the tiles viewer: pick a table, validate it against the
//! backend, put its vector tiles on the map and keep exactly one table live.

pub mod basemap;
pub mod config;
pub mod error;
pub mod fields;
pub mod lifecycle;
pub mod resolution;
pub mod ui;

pub use basemap::*;
pub use config::*;
pub use error::*;
pub use fields::*;
pub use lifecycle::*;
pub use resolution::*;
pub use ui::*;
