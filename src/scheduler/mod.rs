pub mod sim_clock;
pub mod time_interface;

pub use sim_clock::SimClock;
pub use time_interface::{TimeInterface, TokioReactor};
