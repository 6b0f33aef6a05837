#![no_main]

use ferrous_invoke::{ComponentSpec, Container, DiError, Lifetime, Resolver};
use libfuzzer_sys::fuzz_target;
use std::sync::Arc;

const LIFETIMES: [Lifetime; 3] = [Lifetime::Singleton, Lifetime::Scoped, Lifetime::Transient];

// Each input byte declares one component whose lifetime is `byte % 3` and
// which depends on component `byte / 3 % index` (when it has predecessors).
fuzz_target!(|data: &[u8]| {
    if data.is_empty() || data.len() > 32 {
        return;
    }

    let mut spec = ComponentSpec::new();
    for (index, byte) in data.iter().enumerate() {
        let lifetime = LIFETIMES[(*byte % 3) as usize];
        let dependency = (index > 0).then(|| format!("c{}", (*byte as usize / 3) % index));
        spec.add(format!("c{}", index), lifetime, move |ctx| {
            let dependency = dependency.clone();
            async move {
                let below = match dependency {
                    Some(name) => *ctx.resolve::<usize>(&name).await? + 1,
                    None => 0,
                };
                Ok(below)
            }
        });
    }

    let root = spec.build(()).expect("known lifetimes");
    let scope = root.scope().expect("root scope");

    futures::executor::block_on(async {
        for index in 0..data.len() {
            let name = format!("c{}", index);
            check(&root, &scope, &name).await;
        }
    });
});

async fn check(root: &Container, scope: &Container, name: &str) {
    let lifetime = root.lifetime_of(name).expect("registered");

    let in_scope = match scope.resolve::<usize>(name).await {
        Ok(value) => value,
        Err(DiError::ScopedOnRoot(_)) => {
            assert!(Container::ptr_eq(root, scope));
            return;
        }
        Err(other) => panic!("unexpected error: {}", other),
    };

    let again = scope.resolve::<usize>(name).await.expect("second resolution");
    match lifetime {
        Lifetime::Singleton | Lifetime::Scoped => assert!(Arc::ptr_eq(&in_scope, &again)),
        Lifetime::Transient => assert!(!Arc::ptr_eq(&in_scope, &again)),
    }

    match root.resolve::<usize>(name).await {
        Ok(from_root) if lifetime == Lifetime::Singleton => assert!(Arc::ptr_eq(&from_root, &in_scope)),
        Ok(_) => {}
        Err(DiError::ScopedOnRoot(_)) => {}
        Err(other) => panic!("unexpected error: {}", other),
    }
}
