pub mod deadline;
pub mod driver;
pub mod launch;

pub use deadline::*;
pub use driver::*;
pub use launch::*;
