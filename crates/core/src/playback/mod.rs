pub mod command;
pub mod handle;
pub mod mode;
pub mod orchestrator;
pub mod progress;
pub mod state;

pub use command::*;
pub use handle::*;
pub use mode::*;
pub use orchestrator::*;
pub use progress::*;
pub use state::*;
