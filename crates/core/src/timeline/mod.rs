pub mod duration;
pub mod page;

pub use duration::*;
pub use page::*;
