//! Driver Metacrate for labinstr
//!
//! This crate aggregates all driver crates and provides unified feature flags.
//! It serves as the single dependency for applications that need instrument
//! drivers.
//!
//! # Feature Flags
//!
//! | Feature | Drivers | Crate |
//! |---------|---------|-------|
//! | `rohde_schwarz` | `hmc8043`, `hmf2550` | `instr-driver-rohde-schwarz` |
//! | `keysight` | `b2902b` | `instr-driver-keysight` |
//! | `keithley` | `keithley_6500` | `instr-driver-keithley` |
//! | `liquid_instruments` | `moku_go` | `instr-driver-liquid` |
//! | `thorlabs` | `mc2000b`, `mcls` | `instr-driver-thorlabs` |
//! | `all` | everything above | |
//!
//! # Usage
//!
//! ```rust,ignore
//! use instr_core::driver::DriverRegistry;
//!
//! instr_drivers::link_drivers();
//!
//! let mut drivers = DriverRegistry::new();
//! instr_drivers::register_all(&mut drivers);
//! let mut psu = drivers.open(&device_config)?;
//! ```

pub use instr_core::driver::{DriverRegistry, InstrumentFactory};

// =============================================================================
// Driver Crate Re-exports
// =============================================================================

/// Rohde & Schwarz HMC8043 and HMF2550
#[cfg(feature = "rohde_schwarz")]
pub use instr_driver_rohde_schwarz;

/// Keysight B2902B
#[cfg(feature = "keysight")]
pub use instr_driver_keysight;

/// Keithley DMM6500
#[cfg(feature = "keithley")]
pub use instr_driver_keithley;

/// Liquid Instruments Moku:Go
#[cfg(feature = "liquid_instruments")]
pub use instr_driver_liquid;

/// Thorlabs MC2000B and MCLS
#[cfg(feature = "thorlabs")]
pub use instr_driver_thorlabs;

// =============================================================================
// Registration
// =============================================================================

/// Register the factories of every enabled driver crate.
#[allow(unused_variables)] // unused when no driver feature is enabled
pub fn register_all(drivers: &mut DriverRegistry) {
    #[cfg(feature = "rohde_schwarz")]
    instr_driver_rohde_schwarz::register_all(drivers);

    #[cfg(feature = "keysight")]
    instr_driver_keysight::register_all(drivers);

    #[cfg(feature = "keithley")]
    instr_driver_keithley::register_all(drivers);

    #[cfg(feature = "liquid_instruments")]
    instr_driver_liquid::register_all(drivers);

    #[cfg(feature = "thorlabs")]
    instr_driver_thorlabs::register_all(drivers);
}

/// A registry holding every enabled driver.
pub fn registry() -> DriverRegistry {
    let mut drivers = DriverRegistry::new();
    register_all(&mut drivers);
    drivers
}

/// Force the linker to include all enabled driver crates.
///
/// Call this early in `main()` so driver crates that nothing else in the
/// binary references are not stripped.
#[inline(never)]
pub fn link_drivers() {
    #[cfg(feature = "rohde_schwarz")]
    instr_driver_rohde_schwarz::link();

    #[cfg(feature = "keysight")]
    instr_driver_keysight::link();

    #[cfg(feature = "keithley")]
    instr_driver_keithley::link();

    #[cfg(feature = "liquid_instruments")]
    instr_driver_liquid::link();

    #[cfg(feature = "thorlabs")]
    instr_driver_thorlabs::link();
}

/// Driver type names (as used in configuration) linked into this binary.
pub fn available_drivers() -> Vec<&'static str> {
    #[allow(unused_mut)] // mut needed when features enable push() calls
    let mut drivers = Vec::new();

    #[cfg(feature = "rohde_schwarz")]
    drivers.extend(["hmc8043", "hmf2550"]);

    #[cfg(feature = "keysight")]
    drivers.push("b2902b");

    #[cfg(feature = "keithley")]
    drivers.push("keithley_6500");

    #[cfg(feature = "liquid_instruments")]
    drivers.push("moku_go");

    #[cfg(feature = "thorlabs")]
    drivers.extend(["mc2000b", "mcls"]);

    drivers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_drivers_does_not_panic() {
        link_drivers();
    }

    #[test]
    fn test_registry_matches_available_drivers() {
        let drivers = registry();
        let mut expected = available_drivers();
        expected.sort_unstable();
        assert_eq!(drivers.driver_types(), expected);
    }

    #[test]
    fn test_every_command_table_builds() {
        let drivers = registry();
        for driver_type in drivers.driver_types() {
            assert!(
                drivers.build_registry(driver_type).is_ok(),
                "driver '{}'",
                driver_type
            );
        }
    }
}
