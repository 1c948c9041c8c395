#![cfg_attr(target_arch = "avr", no_std)]
#![cfg_attr(target_arch = "avr", no_main)]

#[cfg(target_arch = "avr")]
use panic_halt as _;

#[cfg(target_arch = "avr")]
#[avr_device::entry]
fn main() -> ! {
    firmware::run()
}

// Firmware only runs on the ATmega328P; host builds exist for the tests
#[cfg(not(target_arch = "avr"))]
fn main() {}

#[cfg(target_arch = "avr")]
mod firmware {
    use aqua328_firmware::application::{Controller, Sound};
    use aqua328_firmware::board::Role;
    use aqua328_firmware::config::{self, Settings, LOG_LEVEL, PINS, TIME_SCALE};
    use aqua328_firmware::display::{Frame, Status};
    use aqua328_firmware::drivers::speaker::{ALARM, CHIRP};
    use aqua328_firmware::drivers::{
        Backlight, Ds18b20, Fan, Lcd, Level, Lights, OneWire, OneWireError, Resolution, SerialConsole, Speaker,
        Switches,
    };
    use aqua328_firmware::glyphs::GlyphSet;
    use aqua328_firmware::hal::{pwm, CycleDelay, Pin, PwmOutput, RawDelay, Twi, TwiSpeed, Uart, WiringClock};
    use aqua328_firmware::log;
    use aqua328_firmware::tasks::{Periodic, WallClock};
    use aqua328_firmware::timing::{ScaledClock, ScaledDelay};
    use avr_device::atmega328p::Peripherals;
    use core::convert::Infallible;

    type Console = SerialConsole<Uart>;

    fn halt(console: &mut Console, msg: &str) -> ! {
        console.error(msg);
        console.flush();
        loop {
            avr_device::asm::sleep();
        }
    }

    fn pin_for(console: &mut Console, role: Role) -> u8 {
        match PINS.pin(role) {
            Some(pin) => pin,
            None => halt(console, "pin map missing a role"),
        }
    }

    fn pwm_for(console: &mut Console, role: Role) -> PwmOutput {
        let pin = pin_for(console, role);
        match PwmOutput::new(pin) {
            Some(out) => out,
            None => halt(console, "PWM role on a non-PWM pin"),
        }
    }

    fn infallible<T>(result: Result<T, Infallible>) -> T {
        match result {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    fn probe_error(console: &mut Console, err: OneWireError<Infallible>) {
        match err {
            OneWireError::NoPresence => console.warn("probe: no presence"),
            OneWireError::BusShorted => console.warn("probe: bus held low"),
            OneWireError::CrcMismatch { actual, .. } => console.debug_hex("probe: bad CRC", actual),
            OneWireError::Pin(never) => match never {},
        }
    }

    pub fn run() -> ! {
        let dp = match Peripherals::take() {
            Some(dp) => dp,
            None => loop {},
        };

        let raw_clock = WiringClock::start(&dp.TC0, config::TIMER0_PRESCALER);
        pwm::init(&dp.TC1, &dp.TC2);
        let mut console = SerialConsole::new(Uart::new(dp.USART0, config::UART_BAUD), LOG_LEVEL);

        // Enable interrupts globally
        unsafe { avr_device::interrupt::enable() };

        let clock = ScaledClock::new(raw_clock, TIME_SCALE);
        let mut delay = ScaledDelay::new(RawDelay::new(raw_clock), TIME_SCALE);

        console.info("Aqua328 firmware v0.1.0");
        log!(console, Level::Info, "time scale x{}", TIME_SCALE.factor());

        #[cfg(feature = "debug")]
        {
            use aqua328_firmware::selftest::{ClockTest, GlyphTest, PinMapTest, TestRunner, TimeScaleTest};

            let mut runner = TestRunner::new(&mut console);
            runner.run_suite(
                "selftest",
                &[
                    &PinMapTest(PINS),
                    &GlyphTest(GlyphSet::for_revision(config::REVISION)),
                    &TimeScaleTest { prescaler: config::TIMER0_PRESCALER, scale: TIME_SCALE },
                    &ClockTest { clock: &raw_clock, max_polls: 10_000 },
                ],
            );
        }

        let settings = Settings::default();

        let lid = pin_for(&mut console, Role::LidSwitch);
        let user = pin_for(&mut console, Role::UserSwitch);
        let (lid, user) = match (Pin::pull_up(lid), Pin::pull_up(user)) {
            (Some(lid), Some(user)) => (lid, user),
            _ => halt(&mut console, "switch pins"),
        };
        let mut switches = Switches::new(lid, user);

        let red = pwm_for(&mut console, Role::Red);
        let green = pwm_for(&mut console, Role::Green);
        let blue = pwm_for(&mut console, Role::Blue);
        let mut lights = Lights::new(red, green, blue);

        // Fan and backlight are optional per board
        let mut fan = PINS.pin(Role::Fan).and_then(PwmOutput::new).map(Fan::new);
        let _backlight = PINS
            .pin(Role::Backlight)
            .and_then(PwmOutput::new)
            .map(|pin| Backlight::new(pin, settings.backlight_level));

        let speaker_pin = pin_for(&mut console, Role::Speaker);
        let mut speaker = match Pin::output(speaker_pin) {
            Some(pin) => infallible(Speaker::new(pin)),
            None => halt(&mut console, "speaker pin"),
        };

        let bus_pin = pin_for(&mut console, Role::OneWireBus);
        let mut bus = match Pin::open_drain(bus_pin) {
            Some(pin) => infallible(OneWire::new(pin)),
            None => halt(&mut console, "1-Wire pin"),
        };
        // 1-Wire slots are too short for the wiring clock
        let mut slots = CycleDelay;
        let resolution = Resolution::from_bits(PINS.temperature_precision).unwrap_or(Resolution::Bits12);
        let probe = Ds18b20::new(resolution);
        match probe.configure(&mut bus, &mut slots) {
            Ok(()) => log!(console, Level::Info, "probe at {} bits", resolution.bits()),
            Err(e) => probe_error(&mut console, e),
        }

        let mut lcd = Lcd::new(Twi::new(dp.TWI, TwiSpeed::Standard100k), config::LCD_ADDRESS);
        let mut lcd_ok = lcd
            .init(&mut delay)
            .and_then(|_| lcd.load_glyphs(GlyphSet::for_revision(config::REVISION)))
            .is_ok();
        if !lcd_ok {
            console.warn("LCD not responding");
        }

        speaker.play(&mut delay, &CHIRP).ok();
        console.info("Ready");

        let mut controller = Controller::new(settings);
        let mut wall = WallClock::new(settings.start_minute);
        let mut uptime_s: u32 = 0;

        let mut second = Periodic::new(&clock, 1000);
        let mut switch_poll = Periodic::new(&clock, config::SWITCH_POLL_MS);
        let mut fade = Periodic::new(&clock, config::FADE_STEP_MS);
        let mut screen = Periodic::new(&clock, config::DISPLAY_UPDATE_MS);
        let mut measure = Periodic::new(&clock, config::TEMPERATURE_PERIOD_MS);
        let mut conversion: Option<Periodic> = None;
        let mut shown: Option<Frame> = None;

        loop {
            if second.poll(&clock) {
                wall.tick();
                uptime_s = uptime_s.wrapping_add(1);
            }

            if switch_poll.poll(&clock) {
                match switches.poll() {
                    Ok(Some(event)) => {
                        controller.handle_switch(event);
                        log!(console, Level::Debug, "mode {}", controller.mode().label());
                    }
                    Ok(None) => {}
                    Err(never) => match never {},
                }
            }

            let converted = conversion.as_mut().map_or(false, |c| c.poll(&clock));
            if conversion.is_none() && measure.poll(&clock) {
                match probe.start_conversion(&mut bus, &mut slots) {
                    Ok(()) => {
                        conversion = Some(Periodic::new(&clock, resolution.conversion_time_ms() as u32));
                    }
                    Err(e) => {
                        probe_error(&mut console, e);
                        controller.set_temperature(None);
                    }
                }
            } else if converted {
                conversion = None;
                match probe.read_temperature(&mut bus, &mut slots) {
                    // a reset probe reports 85.0 until its first conversion
                    Ok(t) if t.is_power_on_value() => console.debug("probe: power-on value"),
                    Ok(t) => {
                        controller.set_temperature(Some(t));
                        log!(console, Level::Debug, "temp {}", t.tenths());
                    }
                    Err(e) => {
                        probe_error(&mut console, e);
                        controller.set_temperature(None);
                    }
                }
            }

            let outputs = controller.update(uptime_s.wrapping_mul(1000), wall.minute_of_day());

            if fade.poll(&clock) {
                lights.fade_towards(outputs.colour, controller.settings().fade_step);
            }
            if let Some(fan) = fan.as_mut() {
                fan.set_level(outputs.fan);
            }
            match outputs.sound {
                Some(Sound::Chirp) => {
                    speaker.play(&mut delay, &CHIRP).ok();
                }
                Some(Sound::Alarm) => {
                    console.warn("temperature alarm");
                    speaker.play(&mut delay, &ALARM).ok();
                }
                None => {}
            }

            if screen.poll(&clock) {
                let status = Status::from_controller(
                    &controller,
                    wall.hours_minutes(),
                    !lights.colour().is_off(),
                    fan.is_some(),
                );
                let frame = Frame::render(&status);
                if !lcd_ok {
                    // retry from scratch; the LCD may have been plugged back in
                    lcd_ok = lcd
                        .init(&mut delay)
                        .and_then(|_| lcd.load_glyphs(GlyphSet::for_revision(config::REVISION)))
                        .is_ok();
                    shown = None;
                }
                if lcd_ok {
                    match frame.draw(&mut lcd, shown.as_ref()) {
                        Ok(()) => shown = Some(frame),
                        Err(_) => {
                            console.warn("LCD write failed");
                            lcd_ok = false;
                        }
                    }
                }
            }
        }
    }
}
