/// Configuration-driven lifetime overrides

use ferrous_invoke::{ComponentSpec, Container, ContainerConfig, DiError, Lifetime, Resolver};
use serial_test::serial;
use std::sync::Arc;

fn spec() -> ComponentSpec {
    let mut spec = ComponentSpec::new();
    spec.add_singleton("client", |_| async { Ok(String::from("client")) });
    spec.add_transient("clock", |_| async { Ok(0u64) });
    spec
}

#[tokio::test]
async fn test_json_override_changes_caching() {
    let config = ContainerConfig::from_json_str(r#"{"lifetimes": {"client": "transient"}}"#).unwrap();

    let mut spec = spec();
    spec.apply_config(&config).unwrap();
    let root = spec.build(()).unwrap();

    assert_eq!(root.lifetime_of("client"), Some(Lifetime::Transient));
    let a = root.resolve::<String>("client").await.unwrap();
    let b = root.resolve::<String>("client").await.unwrap();
    assert!(!Arc::ptr_eq(&a, &b));
}

#[tokio::test]
async fn test_scoped_override_enables_real_scopes() {
    let mut spec = spec();
    assert!(!spec.has_scoped());
    spec.apply_config(&ContainerConfig::new().with_lifetime("clock", "scoped"))
        .unwrap();
    let root = spec.build(()).unwrap();

    let scope = root.scope().unwrap();
    assert!(!Container::ptr_eq(&root, &scope));
    assert!(matches!(root.resolve::<u64>("clock").await, Err(DiError::ScopedOnRoot(_))));
    assert_eq!(*scope.resolve::<u64>("clock").await.unwrap(), 0);
}

#[tokio::test]
async fn test_value_components_stay_singleton() {
    for tag in ["transient", "scoped"] {
        let mut spec = spec();
        spec.add_value("region", String::from("eu-west-1"));
        let err = spec
            .apply_config(&ContainerConfig::new().with_lifetime("region", tag))
            .unwrap_err();
        assert!(matches!(err, DiError::WrongLifetime(_)));

        // The rejected override left the value shared
        let root = spec.build(()).unwrap();
        assert_eq!(root.lifetime_of("region"), Some(Lifetime::Singleton));
        let a = root.resolve::<String>("region").await.unwrap();
        let b = root.scope().unwrap().resolve::<String>("region").await.unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }
}

#[test]
fn test_invalid_override_fails_container_creation() {
    let mut spec = spec();
    spec.apply_config(&ContainerConfig::new().with_lifetime("client", "forever"))
        .unwrap();
    assert!(matches!(
        spec.build(()),
        Err(DiError::UnknownLifetime { component, tag }) if component == "client" && tag == "forever"
    ));
}

#[test]
fn test_config_file_round_trip() {
    let path = std::env::temp_dir().join(format!("ferrous-invoke-config-{}.json", std::process::id()));
    std::fs::write(&path, r#"{"lifetimes": {"client": "scoped"}}"#).unwrap();

    let config = ContainerConfig::from_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(config.lifetimes["client"], "scoped");

    assert!(matches!(
        ContainerConfig::from_file(&path),
        Err(DiError::Config(_))
    ));
}

#[test]
#[serial]
fn test_env_overrides() {
    std::env::set_var("FERROUS_TEST_LIFETIME_CLIENT", "Transient");
    std::env::set_var("FERROUS_TEST_UNRELATED", "x");

    let config = ContainerConfig::from_env("ferrous_test");
    std::env::remove_var("FERROUS_TEST_LIFETIME_CLIENT");
    std::env::remove_var("FERROUS_TEST_UNRELATED");

    assert_eq!(config, ContainerConfig::new().with_lifetime("client", "Transient"));

    let mut spec = spec();
    spec.apply_config(&config).unwrap();
    let root = spec.build(()).unwrap();
    assert_eq!(root.lifetime_of("client"), Some(Lifetime::Transient));
}

#[test]
#[serial]
fn test_env_without_overrides_is_empty() {
    std::env::remove_var("FERROUS_EMPTY_LIFETIME_CLIENT");
    assert!(ContainerConfig::from_env("ferrous_empty").is_empty());
}
