//! Rohde & Schwarz (HAMEG) drivers for labinstr.
//!
//! This crate provides drivers for:
//! - HMC8043 three-channel power supply
//! - HMF2550 arbitrary function generator
//!
//! # Usage
//!
//! Register the factories with a driver registry:
//!
//! ```rust,ignore
//! use instr_driver_rohde_schwarz::{Hmc8043Factory, Hmf2550Factory};
//!
//! drivers.register_factory(Box::new(Hmc8043Factory));
//! drivers.register_factory(Box::new(Hmf2550Factory));
//! ```

pub mod hmc8043;
pub mod hmf2550;

pub use hmc8043::Hmc8043Factory;
pub use hmf2550::Hmf2550Factory;

use instr_core::driver::DriverRegistry;

/// Register every factory of this crate.
pub fn register_all(drivers: &mut DriverRegistry) {
    drivers.register_factory(Box::new(Hmc8043Factory));
    drivers.register_factory(Box::new(Hmf2550Factory));
}

/// Force the linker to include this crate.
///
/// Call this function from main() to ensure the driver factories are
/// linked into the final binary and not stripped by the linker.
#[inline(never)]
pub fn link() {
    std::hint::black_box(std::any::TypeId::of::<Hmc8043Factory>());
    std::hint::black_box(std::any::TypeId::of::<Hmf2550Factory>());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_does_not_panic() {
        link();
    }
}
