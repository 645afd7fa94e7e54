//! Fuzz target for fitter output parsing and model validation.
//!
//! Arbitrary JSON must either be rejected or yield a model whose
//! probability tables can be extracted without panicking.

#![no_main]

use libfuzzer_sys::fuzz_target;
use lcm_core::ModelFit;

fuzz_target!(|data: &[u8]| {
    if let Ok(fit) = serde_json::from_slice::<ModelFit>(data) {
        if let Ok(model) = fit.into_model() {
            let tables = model.tables();
            assert_eq!(
                tables.conditional.len(),
                model.n_classes() * model.n_indicators()
            );
        }
    }
});
