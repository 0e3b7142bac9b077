//! Adapter declarations
//!
//! Everything the engine needs to know about one resource type: how to
//! address it, how to pick its unique value, and which of its fields link to
//! other resource types.

use super::endpoint::{EndpointFuncBuilder, ListFuncBuilder};
use crate::gcp::location::{LocationInfo, LocationLevel};
use crate::sdp::{AdapterError, BlastPropagation, ItemType, QueryMethod};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Identity fields tried when a declaration names none
pub const DEFAULT_IDENTITY_FIELDS: &[&str] = &["name", "selfLink"];

/// Broad category of a resource type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterCategory {
    Compute,
    Network,
    Storage,
    Database,
    Security,
    Configuration,
    Observability,
}

/// Per-type hook that reshapes a raw resource before the generic tree builder
pub type ResponseExtractor = fn(&LocationInfo, Value) -> Result<Value, AdapterError>;

/// Static description of a resource type's API
#[derive(Clone)]
pub struct AdapterMeta {
    pub category: AdapterCategory,
    pub location_level: LocationLevel,
    pub get_endpoint: EndpointFuncBuilder,
    pub list_endpoint: Option<ListFuncBuilder>,
    pub search_endpoint: Option<EndpointFuncBuilder>,
    pub search_description: Option<&'static str>,
    /// Collection names whose values, in order, form the unique attribute
    pub unique_attribute_keys: Vec<&'static str>,
    /// Fields tried in order to find the resource's own name
    pub identity_fields: Vec<&'static str>,
    /// Field of a list/search envelope that holds the resources
    pub list_response_key: Option<&'static str>,
    pub iam_permissions: Vec<&'static str>,
    pub predefined_role: Option<&'static str>,
    pub in_development: bool,
    pub extractor: Option<ResponseExtractor>,
}

impl AdapterMeta {
    pub fn new(
        category: AdapterCategory,
        location_level: LocationLevel,
        get_endpoint: EndpointFuncBuilder,
        unique_attribute_keys: &[&'static str],
    ) -> Self {
        Self {
            category,
            location_level,
            get_endpoint,
            list_endpoint: None,
            search_endpoint: None,
            search_description: None,
            unique_attribute_keys: unique_attribute_keys.to_vec(),
            identity_fields: DEFAULT_IDENTITY_FIELDS.to_vec(),
            list_response_key: None,
            iam_permissions: Vec::new(),
            predefined_role: None,
            in_development: false,
            extractor: None,
        }
    }

    pub fn list(mut self, builder: ListFuncBuilder) -> Self {
        self.list_endpoint = Some(builder);
        self
    }

    pub fn search(mut self, builder: EndpointFuncBuilder, description: &'static str) -> Self {
        self.search_endpoint = Some(builder);
        self.search_description = Some(description);
        self
    }

    pub fn list_key(mut self, key: &'static str) -> Self {
        self.list_response_key = Some(key);
        self
    }

    pub fn identity_fields(mut self, fields: &[&'static str]) -> Self {
        self.identity_fields = fields.to_vec();
        self
    }

    pub fn iam_permissions(mut self, permissions: &[&'static str]) -> Self {
        self.iam_permissions = permissions.to_vec();
        self
    }

    pub fn predefined_role(mut self, role: &'static str) -> Self {
        self.predefined_role = Some(role);
        self
    }

    pub fn in_development(mut self) -> Self {
        self.in_development = true;
        self
    }

    pub fn extractor(mut self, extractor: ResponseExtractor) -> Self {
        self.extractor = Some(extractor);
        self
    }

    pub fn can_list(&self) -> bool {
        self.list_endpoint.is_some()
    }

    pub fn can_search(&self) -> bool {
        self.search_endpoint.is_some()
    }
}

impl std::fmt::Debug for AdapterMeta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterMeta")
            .field("category", &self.category)
            .field("location_level", &self.location_level)
            .field("can_list", &self.can_list())
            .field("can_search", &self.can_search())
            .field("unique_attribute_keys", &self.unique_attribute_keys)
            .field("list_response_key", &self.list_response_key)
            .field("in_development", &self.in_development)
            .finish_non_exhaustive()
    }
}

/// Link from one field of a resource to another resource type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Impact {
    pub to_item_type: ItemType,
    pub description: &'static str,
    pub blast_propagation: BlastPropagation,
}

impl Impact {
    pub fn new(
        to_item_type: ItemType,
        description: &'static str,
        blast_propagation: BlastPropagation,
    ) -> Self {
        Self {
            to_item_type,
            description,
            blast_propagation,
        }
    }
}

/// Field path -> link declaration
pub type BlastPropagationMap = BTreeMap<&'static str, Impact>;

/// How a Terraform resource maps onto this type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TerraformMapping {
    pub terraform_method: QueryMethod,
    /// `<terraform resource>.<attribute>` holding the query
    pub terraform_query_map: &'static str,
}

impl TerraformMapping {
    pub fn get(query_map: &'static str) -> Self {
        Self {
            terraform_method: QueryMethod::Get,
            terraform_query_map: query_map,
        }
    }

    pub fn search(query_map: &'static str) -> Self {
        Self {
            terraform_method: QueryMethod::Search,
            terraform_query_map: query_map,
        }
    }
}

/// Everything registered for one item type
#[derive(Debug, Clone)]
pub struct AdapterDeclaration {
    pub item_type: ItemType,
    pub meta: AdapterMeta,
    pub blast_propagation: BlastPropagationMap,
    pub terraform_mappings: Vec<TerraformMapping>,
}

impl AdapterDeclaration {
    pub fn new(item_type: ItemType, meta: AdapterMeta) -> Self {
        Self {
            item_type,
            meta,
            blast_propagation: BTreeMap::new(),
            terraform_mappings: Vec::new(),
        }
    }

    /// Declare a linked field
    pub fn link(
        mut self,
        field_path: &'static str,
        to_item_type: ItemType,
        description: &'static str,
        blast_propagation: BlastPropagation,
    ) -> Self {
        self.blast_propagation.insert(
            field_path,
            Impact::new(to_item_type, description, blast_propagation),
        );
        self
    }

    pub fn terraform(mut self, mapping: TerraformMapping) -> Self {
        self.terraform_mappings.push(mapping);
        self
    }
}
