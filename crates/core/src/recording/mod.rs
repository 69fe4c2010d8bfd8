pub mod artifact;
pub mod capture;
pub mod controller;

pub use artifact::*;
pub use capture::*;
pub use controller::*;
