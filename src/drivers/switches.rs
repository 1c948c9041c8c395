use crate::board::Polarity;
use crate::config::DEBOUNCE_SAMPLES;
use embedded_hal::digital::v2::InputPin;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Switch {
    /// Lid sensor, active while the lid is open
    Lid,
    /// Front panel push button
    User,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SwitchEvent {
    Pressed(Switch),
    Released(Switch),
}

/// Debounced lid and user switches. Both are wired active low against the
/// internal pull-ups.
pub struct Switches<L, U> {
    lid: L,
    user: U,
    polarity: Polarity,
    states: [bool; 2],
    debounce_counters: [u8; 2],
}

impl<L, U, E> Switches<L, U>
where
    L: InputPin<Error = E>,
    U: InputPin<Error = E>,
{
    pub fn new(lid: L, user: U) -> Self {
        Self {
            lid,
            user,
            polarity: Polarity::ActiveLow,
            states: [false; 2],
            debounce_counters: [0; 2],
        }
    }

    fn read(&self, switch: Switch) -> Result<bool, E> {
        let high = match switch {
            Switch::Lid => self.lid.is_high()?,
            Switch::User => self.user.is_high()?,
        };
        Ok(self.polarity.is_active(high))
    }

    /// Sample both switches once. A change is reported after
    /// `DEBOUNCE_SAMPLES` consecutive samples agree on it.
    pub fn poll(&mut self) -> Result<Option<SwitchEvent>, E> {
        for (idx, switch) in [Switch::Lid, Switch::User].into_iter().enumerate() {
            let raw_state = self.read(switch)?;

            if raw_state != self.states[idx] {
                self.debounce_counters[idx] = self.debounce_counters[idx].saturating_add(1);
                if self.debounce_counters[idx] >= DEBOUNCE_SAMPLES {
                    self.states[idx] = raw_state;
                    self.debounce_counters[idx] = 0;

                    return Ok(Some(if raw_state {
                        SwitchEvent::Pressed(switch)
                    } else {
                        SwitchEvent::Released(switch)
                    }));
                }
            } else {
                self.debounce_counters[idx] = 0;
            }
        }
        Ok(None)
    }

    pub fn is_active(&self, switch: Switch) -> bool {
        match switch {
            Switch::Lid => self.states[0],
            Switch::User => self.states[1],
        }
    }

    pub fn release(self) -> (L, U) {
        (self.lid, self.user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::pin::{Mock as PinMock, State, Transaction};
    use std::vec::Vec;

    fn reads(states: &[State]) -> Vec<Transaction> {
        states.iter().cloned().map(Transaction::get).collect()
    }

    #[test]
    fn press_reported_after_debounce() {
        let n = DEBOUNCE_SAMPLES as usize;
        let lid = PinMock::new(&reads(&std::vec![State::High; n]));
        let user = PinMock::new(&reads(&std::vec![State::Low; n]));
        let mut switches = Switches::new(lid, user);

        for _ in 0..n - 1 {
            assert_eq!(switches.poll().unwrap(), None);
        }
        assert_eq!(switches.poll().unwrap(), Some(SwitchEvent::Pressed(Switch::User)));
        assert!(switches.is_active(Switch::User));
        assert!(!switches.is_active(Switch::Lid));

        let (mut lid, mut user) = switches.release();
        lid.done();
        user.done();
    }

    #[test]
    fn bounce_resets_counter() {
        // low, high, then low long enough to count
        let n = DEBOUNCE_SAMPLES as usize;
        let mut lid_reads = std::vec![State::Low, State::High];
        lid_reads.extend(std::vec![State::Low; n]);
        let total = lid_reads.len();

        let lid = PinMock::new(&reads(&lid_reads));
        // the user switch isn't sampled on the poll that reports the lid
        let user = PinMock::new(&reads(&std::vec![State::High; total - 1]));
        let mut switches = Switches::new(lid, user);

        let events: Vec<_> = (0..total).filter_map(|_| switches.poll().unwrap()).collect();
        assert_eq!(events, [SwitchEvent::Pressed(Switch::Lid)]);

        let (mut lid, mut user) = switches.release();
        lid.done();
        user.done();
    }
}
