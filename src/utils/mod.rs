pub mod time;

pub use time::{FpsCounter, FrameClock};
