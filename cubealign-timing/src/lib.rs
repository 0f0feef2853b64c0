pub mod clock;
pub mod timer;

pub use clock::{FixedStep, PacedClock, TickClock};
pub use timer::{FrameStats, HighPrecisionTimer, Timer};
