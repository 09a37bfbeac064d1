//! Turning configuration strings into live operators.
//!
//! A [`Registry`] maps operator identifiers (the values written in
//! parameter files, such as `select.tournament`) to factories that
//! build blank operators. A blank operator is configured once, which
//! makes it a [`Template`]; from then on the template only hands out
//! clones, and cloning never reads the configuration again.
use crate::breeding::{self, BreedingSource};
use crate::individual::Individual;
use crate::params::{ParameterDatabase, ParameterPath};
use crate::{EcError, Result};

use ahash::AHashMap;
use log::debug;
use std::fmt;

/// Builds a blank, not yet set up operator.
pub type Factory<I> = fn() -> Box<dyn BreedingSource<I>>;

/// Operator identifiers and their factories.
///
/// Built once at startup, then only read.
pub struct Registry<I> {
    factories: AHashMap<String, Factory<I>>,
}

impl<I: Individual> Registry<I> {
    /// Returns an empty registry.
    pub fn new() -> Registry<I> {
        Registry {
            factories: AHashMap::new(),
        }
    }

    /// Returns a registry holding the core selection methods
    /// and pipelines.
    pub fn with_core_operators() -> Registry<I> {
        let mut registry = Registry::new();
        breeding::register_core_operators(&mut registry);
        registry
    }

    /// Registers `factory` under `name`, returning the factory it
    /// replaces, if any.
    pub fn register(&mut self, name: impl Into<String>, factory: Factory<I>) -> Option<Factory<I>> {
        self.factories.insert(name.into(), factory)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered identifiers, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Builds a blank `name` operator. `path` is the parameter that
    /// named it, reported on failure.
    ///
    /// # Errors
    /// [`EcError::UnknownOperator`] if nothing is registered as `name`.
    pub fn instantiate(
        &self,
        name: &str,
        path: &ParameterPath,
    ) -> Result<Box<dyn BreedingSource<I>>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| EcError::UnknownOperator {
                name: name.to_string(),
                path: path.clone(),
            })?;
        Ok(factory())
    }

    /// Builds a blank operator of the kind named by the parameter at
    /// `path` (or at `default`).
    ///
    /// # Errors
    /// [`EcError::ParameterMissing`] if neither path holds a value;
    /// [`EcError::UnknownOperator`] if the value is not registered.
    pub fn instance_for(
        &self,
        params: &ParameterDatabase,
        path: &ParameterPath,
        default: Option<&ParameterPath>,
    ) -> Result<Box<dyn BreedingSource<I>>> {
        let name = params
            .get_string(path, default)
            .ok_or_else(|| EcError::ParameterMissing { path: path.clone() })?;
        debug!("{} names operator {}", path, name);
        self.instantiate(&name, path)
    }
}

impl<I: Individual> Default for Registry<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I> fmt::Debug for Registry<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.factories.keys().collect();
        names.sort_unstable();
        f.debug_struct("Registry").field("operators", &names).finish()
    }
}

/// Everything an operator may consult while setting itself up.
pub struct SetupContext<'a, I> {
    pub params: &'a ParameterDatabase,
    pub registry: &'a Registry<I>,
}

impl<'a, I> SetupContext<'a, I> {
    pub fn new(params: &'a ParameterDatabase, registry: &'a Registry<I>) -> SetupContext<'a, I> {
        SetupContext { params, registry }
    }
}

impl<I> Clone for SetupContext<'_, I> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<I> Copy for SetupContext<'_, I> {}

/// A configured operator tree, used only as a source of clones.
///
/// The only ways to obtain one run `setup`, so every clone it hands
/// out is fully configured.
#[derive(Clone, Debug)]
pub struct Template<I: Individual> {
    prototype: Box<dyn BreedingSource<I>>,
    base: ParameterPath,
}

impl<I: Individual> Template<I> {
    /// Sets up `prototype` under `base`.
    pub fn new(
        mut prototype: Box<dyn BreedingSource<I>>,
        ctx: &SetupContext<'_, I>,
        base: &ParameterPath,
    ) -> Result<Template<I>> {
        prototype.setup(ctx, base)?;
        debug!("set up {} at {}", prototype.name(), base);
        Ok(Template {
            prototype,
            base: base.clone(),
        })
    }

    /// Builds and sets up the operator named at `path` (or at
    /// `default`). Its parameters live under `path`.
    ///
    /// # Examples
    /// ```
    /// # use oxiec::individual::Individual;
    /// # #[derive(Clone, Debug)]
    /// # struct Score(f64);
    /// # impl Individual for Score {
    /// #     fn is_evaluated(&self) -> bool { true }
    /// #     fn set_evaluated(&mut self, _: bool) {}
    /// #     fn fitness(&self) -> f64 { self.0 }
    /// # }
    /// use oxiec::params::{ParameterDatabase, ParameterPath};
    /// use oxiec::prototype::{Registry, SetupContext, Template};
    ///
    /// let params = ParameterDatabase::from_source(
    ///     "pipe = breed.reproduction\n\
    ///      pipe.source.0 = select.random\n",
    /// );
    /// let registry = Registry::<Score>::with_core_operators();
    /// let ctx = SetupContext::new(&params, &registry);
    ///
    /// let template = Template::from_config(&ctx, &ParameterPath::new("pipe"), None).unwrap();
    /// assert_eq!(template.name(), "breed.reproduction");
    /// assert_eq!(template.instantiate().num_sources(), 1);
    /// ```
    pub fn from_config(
        ctx: &SetupContext<'_, I>,
        path: &ParameterPath,
        default: Option<&ParameterPath>,
    ) -> Result<Template<I>> {
        let prototype = ctx.registry.instance_for(ctx.params, path, default)?;
        Template::new(prototype, ctx, path)
    }

    /// Returns an independent copy of the configured tree.
    pub fn instantiate(&self) -> Box<dyn BreedingSource<I>> {
        self.prototype.box_clone()
    }

    pub fn name(&self) -> &'static str {
        self.prototype.name()
    }

    pub fn base(&self) -> &ParameterPath {
        &self.base
    }
}
