pub mod catalog;
pub mod source;
pub mod types;
pub mod validate;

pub use catalog::*;
pub use source::*;
pub use types::*;
pub use validate::*;
