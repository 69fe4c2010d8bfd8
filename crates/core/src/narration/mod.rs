pub mod backend;
pub mod narrator;
pub mod strategy;
pub mod voice;

pub use backend::*;
pub use narrator::*;
pub use strategy::*;
pub use voice::*;
