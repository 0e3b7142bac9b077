//! Adapter Registry
//!
//! Holds every adapter declaration, keyed by item type. Declarations are
//! validated as they are registered so a broken template or a duplicate type
//! is reported before any adapter is built.

use super::meta::AdapterDeclaration;
use crate::catalog;
use crate::sdp::{AdapterError, ItemType};
use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

/// Outcome of a registration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Registered,
    /// In-development declaration left out of this registry
    Skipped,
}

/// Declarations keyed by item type
#[derive(Debug, Clone, Default)]
pub struct Registry {
    declarations: BTreeMap<ItemType, AdapterDeclaration>,
    include_in_development: bool,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry that also accepts in-development declarations
    pub fn including_in_development() -> Self {
        Self {
            declarations: BTreeMap::new(),
            include_in_development: true,
        }
    }

    /// Validate and add one declaration
    pub fn register(&mut self, declaration: AdapterDeclaration) -> Result<Registration, AdapterError> {
        let item_type = declaration.item_type;

        if declaration.meta.in_development && !self.include_in_development {
            tracing::debug!("skipping in-development adapter {}", item_type);
            return Ok(Registration::Skipped);
        }

        if self.declarations.contains_key(&item_type) {
            return Err(AdapterError::configuration(format!(
                "adapter {} is registered twice",
                item_type
            )));
        }

        validate_declaration(&declaration)?;
        self.declarations.insert(item_type, declaration);
        Ok(Registration::Registered)
    }

    /// Register declarations in order, stopping at the first failure
    ///
    /// Returns the number of declarations actually registered.
    pub fn register_all<I>(&mut self, declarations: I) -> Result<usize, AdapterError>
    where
        I: IntoIterator<Item = AdapterDeclaration>,
    {
        let mut registered = 0;
        for declaration in declarations {
            if self.register(declaration)? == Registration::Registered {
                registered += 1;
            }
        }
        Ok(registered)
    }

    pub fn get(&self, item_type: ItemType) -> Option<&AdapterDeclaration> {
        self.declarations.get(&item_type)
    }

    /// Look up a declaration by its type name
    pub fn find(&self, name: &str) -> Option<&AdapterDeclaration> {
        self.declarations
            .iter()
            .find(|(item_type, _)| item_type.as_str() == name)
            .map(|(_, declaration)| declaration)
    }

    pub fn contains(&self, item_type: ItemType) -> bool {
        self.declarations.contains_key(&item_type)
    }

    /// Registered item types in name order
    pub fn item_types(&self) -> Vec<ItemType> {
        self.declarations.keys().copied().collect()
    }

    pub fn declarations(&self) -> impl Iterator<Item = &AdapterDeclaration> {
        self.declarations.values()
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }
}

fn validate_declaration(declaration: &AdapterDeclaration) -> Result<(), AdapterError> {
    let item_type = declaration.item_type;
    let meta = &declaration.meta;
    let invalid = |message: String| AdapterError::configuration(format!("{}: {}", item_type, message));

    if meta.unique_attribute_keys.is_empty() {
        return Err(invalid("no unique attribute keys".to_string()));
    }
    if meta.identity_fields.is_empty() {
        return Err(invalid("no identity fields".to_string()));
    }

    let get = &meta.get_endpoint;
    get.validate()?;
    if get.level() != meta.location_level {
        return Err(invalid(format!(
            "get endpoint is {} but the adapter is {}",
            get.level(),
            meta.location_level
        )));
    }
    if get.query_arity() != meta.unique_attribute_keys.len() {
        return Err(invalid(format!(
            "get endpoint takes {} segment(s) but there are {} unique attribute key(s)",
            get.query_arity(),
            meta.unique_attribute_keys.len()
        )));
    }

    if let Some(list) = &meta.list_endpoint {
        list.validate()?;
        if list.level() != meta.location_level {
            return Err(invalid(format!("list endpoint is {}", list.level())));
        }
    }

    if let Some(search) = &meta.search_endpoint {
        search.validate()?;
        if search.level() != meta.location_level {
            return Err(invalid(format!("search endpoint is {}", search.level())));
        }
    }

    if (meta.can_list() || meta.can_search()) && meta.list_response_key.is_none() {
        return Err(invalid("list or search endpoint without a list response key".to_string()));
    }

    if let Some(path) = declaration
        .blast_propagation
        .keys()
        .find(|path| path.split('.').any(str::is_empty))
    {
        return Err(invalid(format!("malformed field path {:?}", path)));
    }

    Ok(())
}

/// Registry built from the catalog
pub fn build_registry(include_in_development: bool) -> Result<Registry, AdapterError> {
    let mut registry = if include_in_development {
        Registry::including_in_development()
    } else {
        Registry::new()
    };
    let registered = registry.register_all(catalog::declarations())?;
    tracing::debug!("registered {} adapter declaration(s)", registered);
    Ok(registry)
}

static REGISTRY: OnceLock<Result<Arc<Registry>, AdapterError>> = OnceLock::new();

/// Process-wide registry of the catalog, built once on first use
pub fn registry() -> Result<Arc<Registry>, AdapterError> {
    REGISTRY
        .get_or_init(|| build_registry(false).map(Arc::new))
        .clone()
}
