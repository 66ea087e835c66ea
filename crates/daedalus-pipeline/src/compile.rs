//! Route chain compilation.
//!
//! Compilation turns layered configuration into one canonical, ordered,
//! deduplicated interceptor chain per route key. It happens once at
//! startup (or at an explicit reload) and is pure given the same
//! configuration: ordered maps everywhere make the output deterministic.
//! A compilation failure is fatal — a misconfigured chain never serves
//! requests.

use std::sync::Arc;

use daedalus_config::{DaedalusConfig, SettingsMap};
use indexmap::{IndexMap, IndexSet};
use parking_lot::RwLock;

use crate::chain::Interceptor;
use crate::error::CompileError;
use crate::factory::{FactoryContext, InterceptorFactory};
use crate::registry::InterceptorRegistry;
use crate::settings::SettingsMerger;
use crate::stacks::StackResolver;

/// One position of a compiled chain: the declaration, its effective
/// settings, and the constructed instance.
#[derive(Clone)]
pub struct CompiledInterceptor {
    name: String,
    implementation: String,
    settings: SettingsMap,
    instance: Arc<dyn Interceptor>,
}

impl CompiledInterceptor {
    pub(crate) fn new(
        name: impl Into<String>,
        implementation: impl Into<String>,
        settings: SettingsMap,
        instance: Arc<dyn Interceptor>,
    ) -> Self {
        Self {
            name: name.into(),
            implementation: implementation.into(),
            settings,
            instance,
        }
    }

    /// Returns the logical interceptor name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the implementation identifier.
    #[must_use]
    pub fn implementation(&self) -> &str {
        &self.implementation
    }

    /// Returns the effective merged settings this instance was built from.
    #[must_use]
    pub const fn settings(&self) -> &SettingsMap {
        &self.settings
    }

    /// Returns the constructed instance.
    #[must_use]
    pub fn instance(&self) -> &Arc<dyn Interceptor> {
        &self.instance
    }
}

impl std::fmt::Debug for CompiledInterceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledInterceptor")
            .field("name", &self.name)
            .field("implementation", &self.implementation)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

/// The immutable compiled chain for one route key.
///
/// Shared read-only across all requests matching the route.
#[derive(Debug)]
pub struct RouteChain {
    route_key: String,
    interceptors: Vec<CompiledInterceptor>,
}

impl RouteChain {
    pub(crate) fn new(route_key: impl Into<String>, interceptors: Vec<CompiledInterceptor>) -> Self {
        Self {
            route_key: route_key.into(),
            interceptors,
        }
    }

    /// Returns the route key this chain was compiled for.
    #[must_use]
    pub fn route_key(&self) -> &str {
        &self.route_key
    }

    /// Returns the compiled positions in execution order.
    #[must_use]
    pub fn interceptors(&self) -> &[CompiledInterceptor] {
        &self.interceptors
    }

    /// Returns the interceptor names in execution order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.interceptors
            .iter()
            .map(CompiledInterceptor::name)
            .collect()
    }

    /// Returns the number of interceptors in the chain.
    #[must_use]
    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    /// Returns `true` for an action-only chain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }
}

/// All compiled chains for one configuration, plus the fallback chain for
/// unmapped routes.
#[derive(Debug)]
pub struct ChainSet {
    chains: IndexMap<String, Arc<RouteChain>>,
    fallback: Arc<RouteChain>,
}

impl ChainSet {
    /// Returns the chain for a route key, falling back to the configured
    /// fallback chain for unmapped routes.
    #[must_use]
    pub fn chain_for(&self, route_key: &str) -> &Arc<RouteChain> {
        self.chains.get(route_key).unwrap_or(&self.fallback)
    }

    /// Returns the chain for a route key only if one was explicitly
    /// mapped.
    #[must_use]
    pub fn mapped_chain(&self, route_key: &str) -> Option<&Arc<RouteChain>> {
        self.chains.get(route_key)
    }

    /// Returns the fallback chain.
    #[must_use]
    pub fn fallback(&self) -> &Arc<RouteChain> {
        &self.fallback
    }

    /// Returns the mapped route keys in configuration order.
    pub fn routes(&self) -> impl Iterator<Item = &str> {
        self.chains.keys().map(String::as_str)
    }

    /// Returns the number of explicitly mapped routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.chains.len()
    }

    /// Returns `true` if no route is explicitly mapped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
}

/// Shared, swappable handle to the current [`ChainSet`].
///
/// Requests read the current set lock-free in all but the brief swap
/// window; an explicit config reload compiles a fresh set and replaces it
/// atomically.
#[derive(Debug)]
pub struct ChainSetHandle {
    inner: RwLock<Arc<ChainSet>>,
}

impl ChainSetHandle {
    /// Wraps an initial chain set.
    #[must_use]
    pub fn new(set: ChainSet) -> Self {
        Self {
            inner: RwLock::new(Arc::new(set)),
        }
    }

    /// Returns the current chain set.
    #[must_use]
    pub fn current(&self) -> Arc<ChainSet> {
        Arc::clone(&self.inner.read())
    }

    /// Replaces the current chain set.
    ///
    /// In-flight requests keep executing against the set they started
    /// with.
    pub fn replace(&self, set: ChainSet) {
        let mut guard = self.inner.write();
        *guard = Arc::new(set);
        tracing::info!(routes = guard.len(), "route chains replaced");
    }
}

/// Compiles route token lists into executable chains.
pub struct RouteChainCompiler {
    registry: InterceptorRegistry,
    resolver: StackResolver,
    merger: SettingsMerger,
    factory: InterceptorFactory,
    context: FactoryContext,
    routes: IndexMap<String, Vec<String>>,
    fallback_tokens: Vec<String>,
}

impl RouteChainCompiler {
    /// Assembles a compiler from configuration with the built-in
    /// implementations.
    #[must_use]
    pub fn from_config(config: &DaedalusConfig, context: FactoryContext) -> Self {
        Self::with_factory(config, context, InterceptorFactory::with_builtins())
    }

    /// Assembles a compiler with a caller-supplied factory, for
    /// applications registering their own implementations.
    #[must_use]
    pub fn with_factory(
        config: &DaedalusConfig,
        context: FactoryContext,
        factory: InterceptorFactory,
    ) -> Self {
        Self {
            registry: InterceptorRegistry::from_config(config),
            resolver: StackResolver::from_config(config),
            merger: SettingsMerger::from_config(config),
            factory,
            context,
            routes: config.routes.chains.clone(),
            fallback_tokens: config.routes.fallback.clone(),
        }
    }

    /// Returns the interceptor registry the compiler resolves against.
    #[must_use]
    pub const fn registry(&self) -> &InterceptorRegistry {
        &self.registry
    }

    /// Compiles every configured route plus the fallback chain.
    ///
    /// # Errors
    ///
    /// Returns the first [`CompileError`] encountered; compilation is
    /// all-or-nothing.
    pub fn compile(&self) -> Result<ChainSet, CompileError> {
        let mut chains = IndexMap::with_capacity(self.routes.len());
        for (route_key, tokens) in &self.routes {
            let chain = self.compile_route(route_key, tokens)?;
            chains.insert(route_key.clone(), Arc::new(chain));
        }
        let fallback = Arc::new(self.compile_route("<fallback>", &self.fallback_tokens)?);

        tracing::info!(
            routes = chains.len(),
            fallback = ?self.fallback_tokens,
            "route chains compiled"
        );
        Ok(ChainSet { chains, fallback })
    }

    /// Compiles one route's token list.
    ///
    /// Tokens resolve stack-first: a token naming a defined stack expands
    /// to its members; otherwise it must name a declared interceptor. The
    /// concatenated expansion is deduplicated across the whole sequence,
    /// first occurrence winning, so an interceptor referenced by two
    /// stacks on the same route runs exactly once at its earliest
    /// position.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::UnresolvedInterceptorToken`] for a token
    /// that is neither, [`CompileError::UnknownInterceptor`] for a stack
    /// member with no declaration, and construction errors from the
    /// factory.
    pub fn compile_route(
        &self,
        route_key: &str,
        tokens: &[String],
    ) -> Result<RouteChain, CompileError> {
        let mut names: Vec<String> = Vec::new();
        for token in tokens {
            if self.resolver.contains(token) {
                names.extend(self.resolver.expand(token)?);
            } else if self.registry.contains(token) {
                names.push(token.clone());
            } else {
                return Err(CompileError::unresolved_token(route_key, token));
            }
        }

        let mut seen = IndexSet::with_capacity(names.len());
        for name in names {
            seen.insert(name);
        }

        let mut interceptors = Vec::with_capacity(seen.len());
        for name in &seen {
            let descriptor = self.registry.resolve(name)?;
            let settings = self.merger.effective(descriptor, route_key);
            let instance = self.factory.construct(
                &self.context,
                name,
                descriptor.implementation(),
                &settings,
            )?;
            interceptors.push(CompiledInterceptor::new(
                name.clone(),
                descriptor.implementation().to_string(),
                settings,
                instance,
            ));
        }

        tracing::debug!(
            route = route_key,
            chain = ?seen.iter().collect::<Vec<_>>(),
            "route chain compiled"
        );
        Ok(RouteChain::new(route_key, interceptors))
    }
}

impl std::fmt::Debug for RouteChainCompiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteChainCompiler")
            .field("routes", &self.routes.keys().collect::<Vec<_>>())
            .field("fallback_tokens", &self.fallback_tokens)
            .finish_non_exhaustive()
    }
}
