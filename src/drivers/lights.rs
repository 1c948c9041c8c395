//! RGB tank lighting and display backlight
use embedded_hal::PwmPin;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Colour {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Colour {
    pub const OFF: Colour = Colour::new(0, 0, 0);
    pub const WHITE: Colour = Colour::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn is_off(&self) -> bool {
        self.r == 0 && self.g == 0 && self.b == 0
    }
}

fn step_towards(current: u8, target: u8, step: u8) -> u8 {
    if current < target {
        current.saturating_add(step).min(target)
    } else {
        current.saturating_sub(step).max(target)
    }
}

/// Three PWM channels driving the LED strip
pub struct Lights<R, G, B> {
    red: R,
    green: G,
    blue: B,
    current: Colour,
}

impl<R, G, B> Lights<R, G, B>
where
    R: PwmPin<Duty = u8>,
    G: PwmPin<Duty = u8>,
    B: PwmPin<Duty = u8>,
{
    pub fn new(mut red: R, mut green: G, mut blue: B) -> Self {
        red.enable();
        green.enable();
        blue.enable();
        let mut lights = Self { red, green, blue, current: Colour::OFF };
        lights.apply();
        lights
    }

    fn apply(&mut self) {
        self.red.set_duty(self.current.r);
        self.green.set_duty(self.current.g);
        self.blue.set_duty(self.current.b);
    }

    pub fn colour(&self) -> Colour {
        self.current
    }

    pub fn set(&mut self, colour: Colour) {
        self.current = colour;
        self.apply();
    }

    /// Move every channel at most `step` towards `target`. Returns true once
    /// the target is reached.
    pub fn fade_towards(&mut self, target: Colour, step: u8) -> bool {
        let next = Colour {
            r: step_towards(self.current.r, target.r, step),
            g: step_towards(self.current.g, target.g, step),
            b: step_towards(self.current.b, target.b, step),
        };
        if next != self.current {
            self.set(next);
        }
        next == target
    }

    pub fn release(self) -> (R, G, B) {
        (self.red, self.green, self.blue)
    }
}

/// LCD backlight brightness
pub struct Backlight<P> {
    pin: P,
}

impl<P: PwmPin<Duty = u8>> Backlight<P> {
    pub fn new(mut pin: P, level: u8) -> Self {
        pin.enable();
        pin.set_duty(level);
        Self { pin }
    }

    pub fn set_level(&mut self, level: u8) {
        self.pin.set_duty(level);
    }

    pub fn level(&self) -> u8 {
        self.pin.get_duty()
    }
}
