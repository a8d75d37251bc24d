//! Keysight drivers for labinstr.
//!
//! - B2902B precision source/measure unit (two channels)

pub mod b2902b;

pub use b2902b::B2902bFactory;

use instr_core::driver::DriverRegistry;

/// Register every factory of this crate.
pub fn register_all(drivers: &mut DriverRegistry) {
    drivers.register_factory(Box::new(B2902bFactory));
}

/// Force the linker to include this crate.
#[inline(never)]
pub fn link() {
    std::hint::black_box(std::any::TypeId::of::<B2902bFactory>());
}
