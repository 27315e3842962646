use super::{Component, ComponentKind, Registry};
use std::fmt;
use std::sync::Arc;
use strum_macros::Display;

/// Creates a component, optionally looking up collaborators in the registry.
pub type ComponentFactory = Arc<dyn Fn(&dyn Registry) -> anyhow::Result<Component> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
pub enum Scope {
    /// One shared instance, cached by the registry and destroyed with it
    #[default]
    Singleton,
    /// A new instance on every lookup, never cached
    Prototype,
}

/// How to create a named component.
///
/// The declared kinds let the context find components by capability without
/// instantiating them.
#[derive(Clone)]
pub struct ComponentDefinition {
    factory: ComponentFactory,
    scope: Scope,
    lazy: bool,
    kinds: Vec<ComponentKind>,
}

impl ComponentDefinition {
    pub fn singleton<F>(factory: F) -> Self
    where
        F: Fn(&dyn Registry) -> anyhow::Result<Component> + Send + Sync + 'static,
    {
        Self {
            factory: Arc::new(factory),
            scope: Scope::Singleton,
            lazy: false,
            kinds: Vec::new(),
        }
    }

    pub fn prototype<F>(factory: F) -> Self
    where
        F: Fn(&dyn Registry) -> anyhow::Result<Component> + Send + Sync + 'static,
    {
        Self {
            scope: Scope::Prototype,
            ..Self::singleton(factory)
        }
    }

    /// Skip eager instantiation at the end of a refresh
    pub fn lazy(mut self) -> Self {
        self.lazy = true;
        self
    }

    /// Declare a capability the created component will expose
    pub fn provides(mut self, kind: ComponentKind) -> Self {
        if !self.kinds.contains(&kind) {
            self.kinds.push(kind);
        }
        self
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn is_singleton(&self) -> bool {
        self.scope == Scope::Singleton
    }

    pub fn is_lazy(&self) -> bool {
        self.lazy
    }

    pub fn declares(&self, kind: ComponentKind) -> bool {
        self.kinds.contains(&kind)
    }

    pub(crate) fn create(&self, registry: &dyn Registry) -> anyhow::Result<Component> {
        (self.factory)(registry)
    }
}

impl fmt::Debug for ComponentDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDefinition")
            .field("scope", &self.scope)
            .field("lazy", &self.lazy)
            .field("kinds", &self.kinds)
            .finish()
    }
}
