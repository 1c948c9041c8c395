pub mod gpio;
pub mod pwm;
pub mod timer;
pub mod twi;
pub mod uart;

// Re-export commonly used types
pub use gpio::{Input, OpenDrain, Output, Pin};
pub use pwm::PwmOutput;
pub use timer::{CycleDelay, RawDelay, WiringClock};
pub use twi::{Twi, TwiError, TwiSpeed};
pub use uart::Uart;
