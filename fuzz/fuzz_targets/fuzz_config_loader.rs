#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parsing and validating arbitrary TOML must never panic; both parse and
    // validation errors are acceptable outcomes.
    if let Ok(cfg) = tank_config::load_toml(data) {
        let _ = cfg.validate();
    }
});
