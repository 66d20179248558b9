mod engine;
mod state;

pub use engine::{TimerEngine, DEFAULT_BREAK_RATIO};
pub use state::{TimerMode, TimerState, TimerStatus};
