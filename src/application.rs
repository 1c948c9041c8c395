//! Aquarium control logic.
//!
//! The controller holds no hardware. The main loop feeds it switch events,
//! temperature readings and the time of day, and applies what it asks for
//! to the lights, fan and speaker.

use crate::config::{Settings, ALARM_INTERVAL_MS};
use crate::drivers::ds18b20::Temperature;
use crate::drivers::fan::FanLevel;
use crate::drivers::lights::Colour;
use crate::drivers::switches::{Switch, SwitchEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightMode {
    /// Follow the day schedule, moonlight outside it
    Auto,
    On,
    Off,
    Moon,
}

impl LightMode {
    /// Mode the user switch moves to
    pub const fn next(self) -> Self {
        match self {
            LightMode::Auto => LightMode::On,
            LightMode::On => LightMode::Off,
            LightMode::Off => LightMode::Moon,
            LightMode::Moon => LightMode::Auto,
        }
    }

    /// Four character name for the display
    pub const fn label(self) -> &'static str {
        match self {
            LightMode::Auto => "AUTO",
            LightMode::On => "ON  ",
            LightMode::Off => "OFF ",
            LightMode::Moon => "MOON",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sound {
    Chirp,
    Alarm,
}

/// What the hardware should be doing after an update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outputs {
    pub colour: Colour,
    pub fan: FanLevel,
    pub sound: Option<Sound>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemperatureAlarm {
    TooCold,
    TooHot,
}

pub struct Controller {
    settings: Settings,
    mode: LightMode,
    lid_open: bool,
    fan: FanLevel,
    temperature: Option<Temperature>,
    last_alarm_ms: Option<u32>,
    pending_sound: Option<Sound>,
}

impl Controller {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            mode: LightMode::Auto,
            lid_open: false,
            fan: FanLevel::Off,
            temperature: None,
            last_alarm_ms: None,
            pending_sound: None,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn mode(&self) -> LightMode {
        self.mode
    }

    pub fn lid_open(&self) -> bool {
        self.lid_open
    }

    pub fn fan(&self) -> FanLevel {
        self.fan
    }

    pub fn temperature(&self) -> Option<Temperature> {
        self.temperature
    }

    pub fn handle_switch(&mut self, event: SwitchEvent) {
        match event {
            SwitchEvent::Pressed(Switch::User) => {
                self.mode = self.mode.next();
                self.pending_sound = Some(Sound::Chirp);
            }
            SwitchEvent::Released(Switch::User) => {}
            SwitchEvent::Pressed(Switch::Lid) => self.lid_open = true,
            SwitchEvent::Released(Switch::Lid) => self.lid_open = false,
        }
    }

    /// Record a new reading. `None` means the probe failed; the fan then
    /// holds its current level.
    pub fn set_temperature(&mut self, temperature: Option<Temperature>) {
        self.temperature = temperature;
        if let Some(t) = temperature {
            self.fan = self.fan_level_for(t.tenths());
        }
    }

    pub fn alarm(&self) -> Option<TemperatureAlarm> {
        let tenths = self.temperature?.tenths();
        if tenths >= self.settings.alarm_high {
            Some(TemperatureAlarm::TooHot)
        } else if tenths <= self.settings.alarm_low {
            Some(TemperatureAlarm::TooCold)
        } else {
            None
        }
    }

    /// Colour the lights should fade to at `minute_of_day`
    pub fn target_colour(&self, minute_of_day: u16) -> Colour {
        if self.lid_open {
            return Colour::WHITE;
        }
        match self.mode {
            LightMode::On => self.settings.day_colour,
            LightMode::Off => Colour::OFF,
            LightMode::Moon => self.settings.moon_colour,
            LightMode::Auto if self.is_daytime(minute_of_day) => self.settings.day_colour,
            LightMode::Auto => self.settings.moon_colour,
        }
    }

    pub fn is_daytime(&self, minute_of_day: u16) -> bool {
        let on = self.settings.lights_on_minute;
        let off = self.settings.lights_off_minute;
        if on <= off {
            (on..off).contains(&minute_of_day)
        } else {
            // schedule runs past midnight
            minute_of_day >= on || minute_of_day < off
        }
    }

    /// Work out the outputs. `now_ms` is real milliseconds from a wrapping
    /// counter.
    pub fn update(&mut self, now_ms: u32, minute_of_day: u16) -> Outputs {
        let mut sound = self.pending_sound.take();

        if self.alarm().is_some() {
            let due = match self.last_alarm_ms {
                None => true,
                Some(last) => now_ms.wrapping_sub(last) >= ALARM_INTERVAL_MS,
            };
            if due {
                self.last_alarm_ms = Some(now_ms);
                sound = Some(Sound::Alarm);
            }
        } else {
            self.last_alarm_ms = None;
        }

        Outputs {
            colour: self.target_colour(minute_of_day),
            fan: if self.lid_open { FanLevel::Off } else { self.fan },
            sound,
        }
    }

    /// Each threshold is crossed upwards at its value and only dropped back
    /// below once the temperature falls `fan_hysteresis` under it.
    fn fan_level_for(&self, tenths: i16) -> FanLevel {
        let current = self.fan as usize;
        let hysteresis = self.settings.fan_hysteresis;
        let level = self
            .settings
            .fan_thresholds
            .iter()
            .enumerate()
            .filter(|&(i, &threshold)| {
                tenths >= threshold || (i < current && tenths >= threshold - hysteresis)
            })
            .count();
        FanLevel::from_u8(level as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> Controller {
        Controller::new(Settings::default())
    }

    fn at(c: &mut Controller, tenths: i16) -> FanLevel {
        c.set_temperature(Some(Temperature::from_tenths(tenths)));
        c.fan()
    }

    #[test]
    fn user_switch_cycles_modes_and_chirps() {
        let mut c = controller();
        c.handle_switch(SwitchEvent::Pressed(Switch::User));
        assert_eq!(c.mode(), LightMode::On);
        assert_eq!(c.update(0, 600).sound, Some(Sound::Chirp));
        assert_eq!(c.update(1, 600).sound, None);

        c.handle_switch(SwitchEvent::Released(Switch::User));
        for expected in [LightMode::Off, LightMode::Moon, LightMode::Auto] {
            c.handle_switch(SwitchEvent::Pressed(Switch::User));
            assert_eq!(c.mode(), expected);
        }
    }

    #[test]
    fn auto_follows_schedule() {
        let c = controller();
        let s = *c.settings();
        assert_eq!(c.target_colour(s.lights_on_minute - 1), s.moon_colour);
        assert_eq!(c.target_colour(s.lights_on_minute), s.day_colour);
        assert_eq!(c.target_colour(s.lights_off_minute - 1), s.day_colour);
        assert_eq!(c.target_colour(s.lights_off_minute), s.moon_colour);
    }

    #[test]
    fn schedule_across_midnight() {
        let c = Controller::new(Settings {
            lights_on_minute: 22 * 60,
            lights_off_minute: 6 * 60,
            ..Settings::default()
        });
        assert!(c.is_daytime(23 * 60));
        assert!(c.is_daytime(0));
        assert!(!c.is_daytime(12 * 60));
    }

    #[test]
    fn fixed_modes_ignore_schedule() {
        let mut c = controller();
        let s = *c.settings();
        c.handle_switch(SwitchEvent::Pressed(Switch::User));
        assert_eq!(c.target_colour(0), s.day_colour);
        c.handle_switch(SwitchEvent::Pressed(Switch::User));
        assert_eq!(c.target_colour(12 * 60), Colour::OFF);
        c.handle_switch(SwitchEvent::Pressed(Switch::User));
        assert_eq!(c.target_colour(12 * 60), s.moon_colour);
    }

    #[test]
    fn open_lid_means_white_light_and_no_fan() {
        let mut c = controller();
        at(&mut c, 285);
        c.handle_switch(SwitchEvent::Pressed(Switch::Lid));
        let out = c.update(0, 0);
        assert_eq!(out.colour, Colour::WHITE);
        assert_eq!(out.fan, FanLevel::Off);

        c.handle_switch(SwitchEvent::Released(Switch::Lid));
        let out = c.update(1, 0);
        assert_eq!(out.colour, c.settings().moon_colour);
        assert_eq!(out.fan, FanLevel::High);
    }

    #[test]
    fn fan_steps_up_at_thresholds() {
        let mut c = controller();
        assert_eq!(at(&mut c, 259), FanLevel::Off);
        assert_eq!(at(&mut c, 260), FanLevel::Low);
        assert_eq!(at(&mut c, 270), FanLevel::Medium);
        assert_eq!(at(&mut c, 280), FanLevel::High);
    }

    #[test]
    fn fan_hysteresis_on_the_way_down() {
        let mut c = controller();
        assert_eq!(at(&mut c, 272), FanLevel::Medium);
        assert_eq!(at(&mut c, 266), FanLevel::Medium);
        assert_eq!(at(&mut c, 265), FanLevel::Medium);
        assert_eq!(at(&mut c, 264), FanLevel::Low);
        assert_eq!(at(&mut c, 268), FanLevel::Low);
        assert_eq!(at(&mut c, 254), FanLevel::Off);
    }

    #[test]
    fn fan_jumps_straight_down_when_far_below() {
        let mut c = controller();
        assert_eq!(at(&mut c, 290), FanLevel::High);
        assert_eq!(at(&mut c, 240), FanLevel::Off);
    }

    #[test]
    fn failed_reading_holds_fan() {
        let mut c = controller();
        at(&mut c, 275);
        c.set_temperature(None);
        assert_eq!(c.fan(), FanLevel::Medium);
        assert_eq!(c.alarm(), None);
    }

    #[test]
    fn alarm_repeats_at_interval() {
        let mut c = controller();
        at(&mut c, 305);
        assert_eq!(c.alarm(), Some(TemperatureAlarm::TooHot));
        assert_eq!(c.update(1000, 0).sound, Some(Sound::Alarm));
        assert_eq!(c.update(1000 + ALARM_INTERVAL_MS - 1, 0).sound, None);
        assert_eq!(c.update(1000 + ALARM_INTERVAL_MS, 0).sound, Some(Sound::Alarm));
    }

    #[test]
    fn alarm_rearms_after_recovery() {
        let mut c = controller();
        at(&mut c, 210);
        assert_eq!(c.alarm(), Some(TemperatureAlarm::TooCold));
        assert_eq!(c.update(0, 0).sound, Some(Sound::Alarm));
        at(&mut c, 250);
        assert_eq!(c.update(10, 0).sound, None);
        at(&mut c, 210);
        assert_eq!(c.update(20, 0).sound, Some(Sound::Alarm));
    }

    #[test]
    fn alarm_interval_across_wrap() {
        let mut c = controller();
        at(&mut c, 305);
        assert_eq!(c.update(u32::MAX - 10, 0).sound, Some(Sound::Alarm));
        assert_eq!(c.update(ALARM_INTERVAL_MS - 20, 0).sound, None);
        assert_eq!(c.update(ALARM_INTERVAL_MS, 0).sound, Some(Sound::Alarm));
    }
}
