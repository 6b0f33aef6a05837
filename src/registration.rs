//! Component recipes and the finalized registry.

use std::any::Any;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::OnceCell;

use crate::error::{BoxError, DiError, DiResult};
use crate::lifetime::Lifetime;
use crate::provider::BuildContext;

// Type-erased Arc for storage
pub type AnyArc = Arc<dyn Any + Send + Sync>;

pub(crate) type BuildFuture = BoxFuture<'static, Result<AnyArc, BoxError>>;
pub(crate) type BuildFn = Arc<dyn Fn(BuildContext) -> BuildFuture + Send + Sync>;

/// Lifetime as declared by the caller, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DeclaredLifetime {
    Known(Lifetime),
    Tag(String),
}

/// Construction recipe for one named component.
///
/// A recipe is a build function paired with a lifetime. A bare build function
/// defaults to [`Lifetime::Singleton`]. The build function receives a
/// [`BuildContext`] exposing the resolving container and the root options.
///
/// # Examples
///
/// ```rust
/// use ferrous_invoke::{ComponentSpec, Lifetime, Recipe};
///
/// let mut spec = ComponentSpec::new();
/// spec.insert("greeting", Recipe::new(Lifetime::Transient, |_| async {
///     Ok(String::from("hello"))
/// }));
/// spec.insert("answer", Recipe::singleton(|_| async { Ok(42u32) }));
/// assert_eq!(spec.len(), 2);
/// ```
#[derive(Clone)]
pub struct Recipe {
    pub(crate) lifetime: DeclaredLifetime,
    pub(crate) build: BuildFn,
    /// Set for [`Recipe::value`]: the build hands out one shared instance.
    pub(crate) prebuilt: bool,
}

impl Recipe {
    /// Creates a recipe with an explicit lifetime.
    pub fn new<T, F, Fut>(lifetime: Lifetime, build: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(BuildContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, BoxError>> + Send + 'static,
    {
        Self {
            lifetime: DeclaredLifetime::Known(lifetime),
            build: erase(build),
            prebuilt: false,
        }
    }

    /// Creates a singleton recipe (the default lifetime).
    pub fn singleton<T, F, Fut>(build: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(BuildContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, BoxError>> + Send + 'static,
    {
        Self::new(Lifetime::Singleton, build)
    }

    /// Creates a recipe whose lifetime is given as a textual tag.
    ///
    /// The tag is validated when the root container is created; an unknown
    /// tag fails container creation with [`DiError::UnknownLifetime`].
    pub fn tagged<T, F, Fut>(tag: impl Into<String>, build: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(BuildContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, BoxError>> + Send + 'static,
    {
        Self {
            lifetime: DeclaredLifetime::Tag(tag.into()),
            build: erase(build),
            prebuilt: false,
        }
    }

    /// Creates a singleton recipe that always yields the given value.
    ///
    /// The value exists once, so the recipe can only be a singleton: giving it
    /// another lifetime (for instance through
    /// [`ComponentSpec::apply_config`](crate::ComponentSpec::apply_config))
    /// fails with [`DiError::WrongLifetime`].
    pub fn value<T: Any + Send + Sync>(value: T) -> Self {
        let arc: AnyArc = Arc::new(value);
        Self {
            lifetime: DeclaredLifetime::Known(Lifetime::Singleton),
            build: Arc::new(move |_: BuildContext| -> BuildFuture {
                let arc = arc.clone();
                Box::pin(async move { Ok(arc) })
            }),
            prebuilt: true,
        }
    }

    /// The declared lifetime, if it is a recognized one.
    pub fn lifetime(&self) -> Option<Lifetime> {
        match &self.lifetime {
            DeclaredLifetime::Known(l) => Some(*l),
            DeclaredLifetime::Tag(tag) => tag.parse().ok(),
        }
    }

    pub(crate) fn with_tag(mut self, tag: String) -> Self {
        self.lifetime = DeclaredLifetime::Tag(tag);
        self
    }

    /// Rejects a lifetime the recipe cannot honor.
    pub(crate) fn check_lifetime(&self, name: &str, lifetime: Lifetime) -> DiResult<()> {
        if self.prebuilt && lifetime != Lifetime::Singleton {
            return Err(DiError::WrongLifetime(format!(
                "component `{}` is a prebuilt value and cannot be {}",
                name, lifetime
            )));
        }
        Ok(())
    }
}

fn erase<T, F, Fut>(build: F) -> BuildFn
where
    T: Any + Send + Sync,
    F: Fn(BuildContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, BoxError>> + Send + 'static,
{
    Arc::new(move |ctx: BuildContext| -> BuildFuture {
        let fut = build(ctx);
        Box::pin(async move { fut.await.map(|v| Arc::new(v) as AnyArc) })
    })
}

/// Validated registration with lifetime and build function
pub(crate) struct Registration {
    pub(crate) lifetime: Lifetime,
    pub(crate) build: BuildFn,
    /// Singleton cache. Holds the in-flight build as well as the finished value.
    pub(crate) singleton: Option<OnceCell<AnyArc>>,
    /// Scoped slot index into a scope's cell array
    pub(crate) scoped_slot: Option<usize>,
}

impl Registration {
    fn new(lifetime: Lifetime, build: BuildFn) -> Self {
        Self {
            lifetime,
            build,
            singleton: matches!(lifetime, Lifetime::Singleton).then(OnceCell::new),
            scoped_slot: None,
        }
    }
}

/// Component registry holding all registrations of one root container
pub(crate) struct Registry {
    entries: BTreeMap<String, Registration>,
    /// Total count of scoped registrations for slot allocation
    pub(crate) scoped_count: usize,
}

impl Registry {
    /// Validates declared lifetimes and assigns scoped slot indices.
    pub(crate) fn finalize(recipes: BTreeMap<String, Recipe>) -> DiResult<Self> {
        let mut entries = BTreeMap::new();
        let mut next_scoped_slot = 0;

        for (name, recipe) in recipes {
            let lifetime = match &recipe.lifetime {
                DeclaredLifetime::Known(l) => *l,
                DeclaredLifetime::Tag(tag) => tag.parse().map_err(|_| DiError::UnknownLifetime {
                    component: name.clone(),
                    tag: tag.clone(),
                })?,
            };
            recipe.check_lifetime(&name, lifetime)?;
            let mut reg = Registration::new(lifetime, recipe.build);
            if lifetime == Lifetime::Scoped {
                reg.scoped_slot = Some(next_scoped_slot);
                next_scoped_slot += 1;
            }
            entries.insert(name, reg);
        }

        Ok(Self {
            entries,
            scoped_count: next_scoped_slot,
        })
    }

    #[inline]
    pub(crate) fn get(&self, name: &str) -> Option<&Registration> {
        self.entries.get(name)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&String, &Registration)> {
        self.entries.iter()
    }

    pub(crate) fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}
