//! Thorlabs drivers for labinstr.
//!
//! This crate provides drivers for:
//! - MC2000B optical chopper controller
//! - MCLS four-channel laser diode source
//!
//! Both controllers echo commands over USB-CDC serial. Their factories
//! default to the matching [`instr_core::framing::ResponseFraming`], so
//! the command tables only deal with payloads.

pub mod mc2000b;
pub mod mcls;

pub use mc2000b::Mc2000bFactory;
pub use mcls::MclsFactory;

use instr_core::driver::DriverRegistry;

/// Register every factory of this crate.
pub fn register_all(drivers: &mut DriverRegistry) {
    drivers.register_factory(Box::new(Mc2000bFactory));
    drivers.register_factory(Box::new(MclsFactory));
}

/// Force the linker to include this crate.
///
/// Call this function from main() to ensure the driver factories are
/// linked into the final binary and not stripped by the linker.
#[inline(never)]
pub fn link() {
    std::hint::black_box(std::any::TypeId::of::<Mc2000bFactory>());
    std::hint::black_box(std::any::TypeId::of::<MclsFactory>());
}
