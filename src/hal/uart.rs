use crate::config::CPU_FREQ_HZ;
use avr_device::atmega328p::USART0;
use avr_device::interrupt::Mutex;
use core::cell::RefCell;
use core::convert::Infallible;
use embedded_hal::serial;

// Buffer size must be power of 2 for efficient masking
const BUFFER_SIZE: usize = 64;
const BUFFER_MASK: usize = BUFFER_SIZE - 1;

const U2X0: u8 = 0x02;
const RXCIE0: u8 = 0x80;
const UDRIE0: u8 = 0x20;
const RXEN0: u8 = 0x10;
const TXEN0: u8 = 0x08;
// 8 data bits, no parity, 1 stop bit
const FORMAT_8N1: u8 = 0x06;

/// UBRR for double speed mode
const fn ubrr(baud: u32) -> u16 {
    ((CPU_FREQ_HZ / 4 / baud - 1) / 2) as u16
}

pub struct Buffer {
    data: [u8; BUFFER_SIZE],
    write_idx: usize,
    read_idx: usize,
}

impl Buffer {
    const fn new() -> Self {
        Self {
            data: [0; BUFFER_SIZE],
            write_idx: 0,
            read_idx: 0,
        }
    }

    fn write(&mut self, byte: u8) -> bool {
        let next_write = (self.write_idx + 1) & BUFFER_MASK;
        if next_write != self.read_idx {
            self.data[self.write_idx] = byte;
            self.write_idx = next_write;
            true
        } else {
            false
        }
    }

    fn read(&mut self) -> Option<u8> {
        if self.read_idx != self.write_idx {
            let byte = self.data[self.read_idx];
            self.read_idx = (self.read_idx + 1) & BUFFER_MASK;
            Some(byte)
        } else {
            None
        }
    }

    fn is_empty(&self) -> bool {
        self.read_idx == self.write_idx
    }
}

static TX_BUFFER: Mutex<RefCell<Buffer>> = Mutex::new(RefCell::new(Buffer::new()));
static RX_BUFFER: Mutex<RefCell<Buffer>> = Mutex::new(RefCell::new(Buffer::new()));

/// Interrupt driven USART0
pub struct Uart {
    _usart: USART0,
}

impl Uart {
    pub fn new(usart: USART0, baud: u32) -> Self {
        unsafe {
            usart.ubrr0.write(|w| w.bits(ubrr(baud)));
            usart.ucsr0a.write(|w| w.bits(U2X0));
            usart.ucsr0c.write(|w| w.bits(FORMAT_8N1));
            usart.ucsr0b.write(|w| w.bits(RXEN0 | TXEN0 | RXCIE0));
        }
        Self { _usart: usart }
    }
}

impl serial::Write<u8> for Uart {
    type Error = Infallible;

    fn write(&mut self, byte: u8) -> nb::Result<(), Infallible> {
        let queued = avr_device::interrupt::free(|cs| TX_BUFFER.borrow(cs).borrow_mut().write(byte));
        // kick the data register empty interrupt either way so a full
        // buffer keeps draining
        unsafe {
            (*USART0::ptr()).ucsr0b.modify(|r, w| w.bits(r.bits() | UDRIE0));
        }
        if queued {
            Ok(())
        } else {
            Err(nb::Error::WouldBlock)
        }
    }

    fn flush(&mut self) -> nb::Result<(), Infallible> {
        let empty = avr_device::interrupt::free(|cs| TX_BUFFER.borrow(cs).borrow().is_empty());
        if empty {
            Ok(())
        } else {
            Err(nb::Error::WouldBlock)
        }
    }
}

impl serial::Read<u8> for Uart {
    type Error = Infallible;

    fn read(&mut self) -> nb::Result<u8, Infallible> {
        avr_device::interrupt::free(|cs| RX_BUFFER.borrow(cs).borrow_mut().read())
            .ok_or(nb::Error::WouldBlock)
    }
}

#[avr_device::interrupt(atmega328p)]
fn USART_RX() {
    unsafe {
        let byte = (*USART0::ptr()).udr0.read().bits();
        avr_device::interrupt::free(|cs| {
            RX_BUFFER.borrow(cs).borrow_mut().write(byte);
        });
    }
}

#[avr_device::interrupt(atmega328p)]
fn USART_UDRE() {
    avr_device::interrupt::free(|cs| {
        if let Some(byte) = TX_BUFFER.borrow(cs).borrow_mut().read() {
            unsafe {
                (*USART0::ptr()).udr0.write(|w| w.bits(byte));
            }
        } else {
            // Buffer empty - disable TX interrupt
            unsafe {
                (*USART0::ptr()).ucsr0b.modify(|r, w| w.bits(r.bits() & !UDRIE0));
            }
        }
    });
}
