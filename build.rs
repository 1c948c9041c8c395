use std::env;

const MCU_FREQ_HZ: u32 = 16_000_000;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Pass CPU frequency for timing calculations; config reads it on every target
    println!("cargo:rustc-env=MCU_FREQ_HZ={}", MCU_FREQ_HZ);

    // Host builds only run the unit tests
    let target = env::var("TARGET").unwrap_or_default();
    if !target.contains("avr") {
        return;
    }

    // Configure for ATmega328P
    println!("cargo:rustc-link-arg=-mmcu=atmega328p");

    if env::var("PROFILE").map(|p| p == "debug").unwrap_or(false) {
        println!("cargo:rustc-cfg=feature=\"debug\"");
    }

    println!("cargo:warning=Building for ATmega328P at {}MHz", MCU_FREQ_HZ / 1_000_000);
}
