//! Liquid Instruments drivers for labinstr.
//!
//! - Moku:Go (oscilloscope, waveform generator, spectrum analyzer)

pub mod moku_go;

pub use moku_go::MokuGoFactory;

use instr_core::driver::DriverRegistry;

/// Register every factory of this crate.
pub fn register_all(drivers: &mut DriverRegistry) {
    drivers.register_factory(Box::new(MokuGoFactory));
}

/// Force the linker to include this crate.
#[inline(never)]
pub fn link() {
    std::hint::black_box(std::any::TypeId::of::<MokuGoFactory>());
}
