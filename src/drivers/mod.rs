pub mod console;
pub mod ds18b20;
pub mod fan;
pub mod lcd;
pub mod lights;
pub mod onewire;
pub mod speaker;
pub mod switches;

pub use console::{Level, SerialConsole};
pub use ds18b20::{Ds18b20, Resolution, Temperature};
pub use fan::{Fan, FanLevel};
pub use lcd::{Lcd, LcdError};
pub use lights::{Backlight, Colour, Lights};
pub use onewire::{OneWire, OneWireError};
pub use speaker::Speaker;
pub use switches::{Switch, SwitchEvent, Switches};
