#![no_main]

use ferrous_invoke::{ComponentSpec, ContainerConfig, DiError, Lifetime};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    // Tag parsing never panics and round-trips through Display
    if let Ok(lifetime) = text.parse::<Lifetime>() {
        assert_eq!(lifetime.as_str().parse::<Lifetime>().ok(), Some(lifetime));
    }

    let Ok(config) = ContainerConfig::from_json_str(text) else {
        return;
    };

    let mut spec = ComponentSpec::new();
    for name in config.lifetimes.keys() {
        spec.add_value(name.clone(), 0u8);
    }
    spec.apply_config(&config).expect("every override names a registered component");

    match spec.build(()) {
        Ok(root) => {
            for (name, tag) in &config.lifetimes {
                assert_eq!(root.lifetime_of(name), tag.parse::<Lifetime>().ok());
            }
        }
        Err(DiError::UnknownLifetime { component, tag }) => {
            assert_eq!(config.lifetimes.get(&component), Some(&tag));
            assert!(tag.parse::<Lifetime>().is_err());
        }
        Err(other) => panic!("unexpected error: {}", other),
    }
});
