//! Generation - procedural creation of test vessels

mod catalog;
mod vessel;

pub use catalog::*;
pub use vessel::*;
