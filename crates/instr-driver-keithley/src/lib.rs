//! Keithley drivers for labinstr.
//!
//! - DMM6500 bench multimeter (SCPI command set)

pub mod keithley_6500;

pub use keithley_6500::{Keithley6500Factory, Keithley6500Options};

use instr_core::driver::DriverRegistry;

/// Register every factory of this crate.
pub fn register_all(drivers: &mut DriverRegistry) {
    drivers.register_factory(Box::new(Keithley6500Factory));
}

/// Force the linker to include this crate.
#[inline(never)]
pub fn link() {
    std::hint::black_box(std::any::TypeId::of::<Keithley6500Factory>());
}
