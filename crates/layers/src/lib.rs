pub mod host;
pub mod labels;
pub mod layer;
pub mod registry;
pub mod symbology;

pub use host::*;
pub use layer::*;
pub use registry::*;
