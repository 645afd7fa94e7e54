//! Fuzz target for engine configuration parsing.

#![no_main]

use libfuzzer_sys::fuzz_target;
use lcm_core::EngineConfig;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Should never panic, only return an error
        if let Ok(config) = EngineConfig::from_str(s) {
            assert!(config.validate().is_ok());
        }
    }
});
