//! Dynamic adapters
//!
//! A [`DynamicAdapter`] is one registered declaration bound to one location.
//! It builds URLs from the bound endpoint functions, fetches through the
//! [`Fetcher`], builds items and links them. Which query methods it serves
//! follows from the endpoints declared, see [`Capabilities`].

use super::attributes::build_item;
use super::endpoint::EndpointFunc;
use super::fetcher::Fetcher;
use super::linker::Linker;
use super::meta::{AdapterCategory, AdapterDeclaration, TerraformMapping};
use super::terraform::{rewrite_search_query, SearchRewrite};
use crate::gcp::http::HttpClientProvider;
use crate::gcp::location::{LocationInfo, LocationLevel};
use crate::sdp::{AdapterError, Cache, CacheKey, Item, ItemSink, ItemType, QueryMethod};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Query methods an adapter serves besides Get
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub can_list: bool,
    pub can_search: bool,
    pub can_stream: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryMethodInfo {
    pub method: QueryMethod,
    pub description: String,
}

/// Describes an adapter to the discovery framework
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdapterMetadata {
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub descriptive_name: String,
    pub category: AdapterCategory,
    pub location_level: LocationLevel,
    pub scope: String,
    pub supported_query_methods: Vec<QueryMethodInfo>,
    pub potential_links: BTreeSet<ItemType>,
    pub terraform_mappings: Vec<TerraformMapping>,
    pub iam_permissions: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predefined_role: Option<&'static str>,
}

/// Adapter for one item type in one location
pub struct DynamicAdapter {
    declaration: AdapterDeclaration,
    location: LocationInfo,
    scope: String,
    get_url: EndpointFunc,
    list_url: Option<String>,
    search_url: Option<EndpointFunc>,
    fetcher: Fetcher,
    linker: Arc<Linker>,
    cache: Arc<dyn Cache>,
}

/// Build the adapter of `item_type` for `location`
///
/// Fails with a configuration error, before any network call, when the type
/// is unknown, the location level does not match the declaration or an init
/// parameter is empty.
pub fn make_adapter(
    linker: &Arc<Linker>,
    item_type: ItemType,
    http: Arc<dyn HttpClientProvider>,
    cache: Arc<dyn Cache>,
    location: LocationInfo,
) -> Result<DynamicAdapter, AdapterError> {
    let declaration = linker
        .registry()
        .get(item_type)
        .cloned()
        .ok_or_else(|| AdapterError::configuration(format!("unknown item type {}", item_type)))?;
    let meta = &declaration.meta;

    if location.level() != meta.location_level {
        return Err(AdapterError::configuration(format!(
            "{} is {} but was given the {} location {}",
            item_type,
            meta.location_level,
            location.level(),
            location
        )));
    }

    let params = location.init_params();
    let get_url = meta.get_endpoint.build(&params)?;
    let list_url = meta
        .list_endpoint
        .as_ref()
        .map(|builder| builder.build(&params))
        .transpose()?;
    let search_url = meta
        .search_endpoint
        .as_ref()
        .map(|builder| builder.build(&params))
        .transpose()?;

    Ok(DynamicAdapter {
        scope: location.scope(),
        declaration,
        location,
        get_url,
        list_url,
        search_url,
        fetcher: Fetcher::new(http),
        linker: Arc::clone(linker),
        cache,
    })
}

/// One adapter per registered type per applicable location
///
/// Fails when a declared link targets a type no adapter resolves.
pub fn make_adapters(
    linker: &Arc<Linker>,
    http: Arc<dyn HttpClientProvider>,
    cache: Arc<dyn Cache>,
    project_id: &str,
    regions: &[String],
    zones: &[String],
) -> Result<Vec<DynamicAdapter>, AdapterError> {
    linker.validate()?;
    let mut adapters = Vec::new();

    for item_type in linker.registry().item_types() {
        let Some(declaration) = linker.registry().get(item_type) else {
            continue;
        };
        let locations: Vec<LocationInfo> = match declaration.meta.location_level {
            LocationLevel::Project => vec![LocationInfo::project(project_id)],
            LocationLevel::Regional => regions
                .iter()
                .map(|region| LocationInfo::regional(project_id, region))
                .collect(),
            LocationLevel::Zonal => zones
                .iter()
                .map(|zone| LocationInfo::zonal(project_id, zone))
                .collect(),
        };

        for location in locations {
            adapters.push(make_adapter(
                linker,
                item_type,
                Arc::clone(&http),
                Arc::clone(&cache),
                location,
            )?);
        }
    }

    tracing::debug!("built {} adapter(s) for project {}", adapters.len(), project_id);
    Ok(adapters)
}

impl DynamicAdapter {
    pub fn item_type(&self) -> ItemType {
        self.declaration.item_type
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn scopes(&self) -> Vec<String> {
        vec![self.scope.clone()]
    }

    pub fn location(&self) -> &LocationInfo {
        &self.location
    }

    pub fn declaration(&self) -> &AdapterDeclaration {
        &self.declaration
    }

    /// Override the page cap of list and search queries
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.fetcher = self.fetcher.with_max_pages(max_pages);
        self
    }

    pub fn capabilities(&self) -> Capabilities {
        let can_list = self.list_url.is_some();
        let can_search = self.search_url.is_some();
        Capabilities {
            can_list,
            can_search,
            can_stream: can_list || can_search,
        }
    }

    pub fn metadata(&self) -> AdapterMetadata {
        let item_type = self.item_type();
        let meta = &self.declaration.meta;
        let name = item_type.descriptive_name();

        let mut methods = vec![QueryMethodInfo {
            method: QueryMethod::Get,
            description: format!("Get a {} by its \"{}\"", name, meta.unique_attribute_keys.join("|")),
        }];
        if self.list_url.is_some() {
            methods.push(QueryMethodInfo {
                method: QueryMethod::List,
                description: format!("List all {} within its scope", name),
            });
        }
        if self.search_url.is_some() {
            methods.push(QueryMethodInfo {
                method: QueryMethod::Search,
                description: meta
                    .search_description
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("Search for {}", name)),
            });
        }

        AdapterMetadata {
            item_type,
            descriptive_name: name,
            category: meta.category,
            location_level: meta.location_level,
            scope: self.scope.clone(),
            supported_query_methods: methods,
            potential_links: self
                .declaration
                .blast_propagation
                .values()
                .map(|impact| impact.to_item_type)
                .collect(),
            terraform_mappings: self.declaration.terraform_mappings.clone(),
            iam_permissions: meta.iam_permissions.clone(),
            predefined_role: meta.predefined_role,
        }
    }

    fn check_scope(&self, scope: &str) -> Result<(), AdapterError> {
        if scope == self.scope {
            Ok(())
        } else {
            Err(AdapterError::NoScope {
                requested: scope.to_string(),
                expected: self.scope.clone(),
            })
        }
    }

    fn unsupported(&self, method: QueryMethod) -> AdapterError {
        AdapterError::Unsupported {
            method: method.to_string(),
            item_type: self.item_type().to_string(),
        }
    }

    fn cache_key(&self, method: QueryMethod, query: Option<&str>) -> CacheKey {
        CacheKey::new(self.item_type().as_str(), method, &self.scope, query)
    }

    fn list_key(&self) -> &'static str {
        self.declaration.meta.list_response_key.unwrap_or("items")
    }

    fn to_item(&self, raw: Value) -> Result<Item, AdapterError> {
        let mut item = build_item(self.item_type(), &self.declaration.meta, &self.location, raw)?;
        self.linker
            .link(&mut item, &self.declaration.blast_propagation, &self.location);
        Ok(item)
    }

    fn to_items(&self, raw: Vec<Value>) -> Result<Vec<Item>, AdapterError> {
        raw.into_iter().map(|value| self.to_item(value)).collect()
    }

    /// Get one item by its unique attribute
    pub async fn get(
        &self,
        ctx: &CancellationToken,
        scope: &str,
        query: &str,
        ignore_cache: bool,
    ) -> Result<Item, AdapterError> {
        self.check_scope(scope)?;
        let key = self.cache_key(QueryMethod::Get, Some(query));

        if !ignore_cache {
            if let Some(cached) = self.cache.get(&key) {
                return cached.and_then(|items| {
                    items.into_iter().next().ok_or_else(|| AdapterError::NotFound {
                        url: query.to_string(),
                    })
                });
            }
        }

        let url = (self.get_url)(query).ok_or_else(|| {
            AdapterError::invalid_query(
                query,
                format!(
                    "expected {} segment(s): {}",
                    self.declaration.meta.get_endpoint.query_arity(),
                    self.declaration.meta.unique_attribute_keys.join("|")
                ),
            )
        })?;

        let result = match self.fetcher.fetch(ctx, &url).await {
            Ok(raw) => self.to_item(raw),
            Err(err) => Err(err),
        };

        self.cache.set(key, result.clone().map(|item| vec![item]));
        result
    }

    /// List every item in the adapter's scope
    pub async fn list(
        &self,
        ctx: &CancellationToken,
        scope: &str,
        ignore_cache: bool,
    ) -> Result<Vec<Item>, AdapterError> {
        self.check_scope(scope)?;
        let url = self
            .list_url
            .as_deref()
            .ok_or_else(|| self.unsupported(QueryMethod::List))?;
        let key = self.cache_key(QueryMethod::List, None);

        if !ignore_cache {
            if let Some(cached) = self.cache.get(&key) {
                return cached;
            }
        }

        let result = match self.fetcher.fetch_all(ctx, url, self.list_key()).await {
            Ok(raw) => self.to_items(raw),
            Err(err) => Err(err),
        };

        self.cache.set(key, result.clone());
        result
    }

    /// Search within the scope
    ///
    /// A full resource name is answered by a Get. A 404 is an empty result.
    pub async fn search(
        &self,
        ctx: &CancellationToken,
        scope: &str,
        query: &str,
        ignore_cache: bool,
    ) -> Result<Vec<Item>, AdapterError> {
        self.check_scope(scope)?;
        let search_url = self
            .search_url
            .as_ref()
            .ok_or_else(|| self.unsupported(QueryMethod::Search))?;

        let query = match rewrite_search_query(query, &self.declaration.meta, &self.location) {
            SearchRewrite::Get(get_query) => {
                tracing::debug!("search {:?} served as get {:?}", query, get_query);
                return match self.get(ctx, scope, &get_query, ignore_cache).await {
                    Ok(item) => Ok(vec![item]),
                    Err(err) if err.is_not_found() => Ok(Vec::new()),
                    Err(err) => Err(err),
                };
            },
            SearchRewrite::OutOfScope { found } => {
                tracing::debug!("search {:?} names {}, outside {}", query, found, self.scope);
                return Ok(Vec::new());
            },
            SearchRewrite::Search(parent) => {
                tracing::debug!("search {:?} served as search {:?}", query, parent);
                parent
            },
            SearchRewrite::NotApplicable => query.to_string(),
        };
        let query = query.as_str();

        let key = self.cache_key(QueryMethod::Search, Some(query));
        if !ignore_cache {
            if let Some(cached) = self.cache.get(&key) {
                return cached.or_else(empty_if_not_found);
            }
        }

        let url = search_url(query).ok_or_else(|| {
            AdapterError::invalid_query(
                query,
                format!(
                    "expected {} segment(s)",
                    self.declaration
                        .meta
                        .search_endpoint
                        .as_ref()
                        .map(|search| search.query_arity())
                        .unwrap_or_default()
                ),
            )
        })?;

        let result = match self.fetcher.fetch_all(ctx, &url, self.list_key()).await {
            Ok(raw) => self.to_items(raw),
            Err(err) => Err(err),
        };

        self.cache.set(key, result.clone());
        result.or_else(empty_if_not_found)
    }

    /// Stream every item of the scope into `sink` as pages arrive
    pub async fn list_stream(
        &self,
        ctx: &CancellationToken,
        scope: &str,
        ignore_cache: bool,
        sink: &dyn ItemSink,
    ) {
        if let Err(err) = self.check_scope(scope) {
            return sink.send_error(err);
        }
        let Some(url) = self.list_url.as_deref() else {
            return sink.send_error(self.unsupported(QueryMethod::List));
        };

        let key = self.cache_key(QueryMethod::List, None);
        self.stream_pages(ctx, url, key, ignore_cache, sink).await;
    }

    /// Streaming counterpart of [`DynamicAdapter::search`]
    pub async fn search_stream(
        &self,
        ctx: &CancellationToken,
        scope: &str,
        query: &str,
        ignore_cache: bool,
        sink: &dyn ItemSink,
    ) {
        if let Err(err) = self.check_scope(scope) {
            return sink.send_error(err);
        }
        let Some(search_url) = self.search_url.as_ref() else {
            return sink.send_error(self.unsupported(QueryMethod::Search));
        };

        let query = match rewrite_search_query(query, &self.declaration.meta, &self.location) {
            SearchRewrite::Get(get_query) => {
                match self.get(ctx, scope, &get_query, ignore_cache).await {
                    Ok(item) => sink.send_item(item),
                    Err(err) if err.is_not_found() => {},
                    Err(err) => sink.send_error(err),
                }
                return;
            },
            SearchRewrite::OutOfScope { .. } => return,
            SearchRewrite::Search(parent) => parent,
            SearchRewrite::NotApplicable => query.to_string(),
        };
        let query = query.as_str();

        let Some(url) = search_url(query) else {
            return sink.send_error(AdapterError::invalid_query(query, "query does not fit the search endpoint"));
        };

        let key = self.cache_key(QueryMethod::Search, Some(query));
        self.stream_pages(ctx, &url, key, ignore_cache, sink).await;
    }

    async fn stream_pages(
        &self,
        ctx: &CancellationToken,
        url: &str,
        key: CacheKey,
        ignore_cache: bool,
        sink: &dyn ItemSink,
    ) {
        let is_search = key.method == QueryMethod::Search;

        if !ignore_cache {
            if let Some(cached) = self.cache.get(&key) {
                match cached {
                    Ok(items) => items.into_iter().for_each(|item| sink.send_item(item)),
                    Err(err) if is_search && err.is_not_found() => {},
                    Err(err) => sink.send_error(err),
                }
                return;
            }
        }

        let mut collected = Vec::new();
        let mut item_failed = false;
        let outcome = self
            .fetcher
            .for_each_page(ctx, url, self.list_key(), |page| {
                for raw in page {
                    match self.to_item(raw) {
                        Ok(item) => {
                            collected.push(item.clone());
                            sink.send_item(item);
                        },
                        Err(err) => {
                            item_failed = true;
                            sink.send_error(err);
                        },
                    }
                }
                Ok(())
            })
            .await;

        match outcome {
            Ok(_) if !item_failed => self.cache.set(key, Ok(collected)),
            Ok(_) => {},
            Err(err) if is_search && err.is_not_found() => {
                self.cache.set(key, Err(err));
            },
            Err(err) => {
                self.cache.set(key, Err(err.clone()));
                sink.send_error(err);
            },
        }
    }
}

fn empty_if_not_found(err: AdapterError) -> Result<Vec<Item>, AdapterError> {
    if err.is_not_found() {
        Ok(Vec::new())
    } else {
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::registry::build_registry;
    use crate::adapter::testing::MockHttp;
    use crate::sdp::types;
    use crate::sdp::{BlastPropagation, MemoryCache, NoopCache, StreamEvent};
    use serde_json::json;
    use std::time::Duration;

    const PROJECT: &str = "test-project";
    const NETWORK_URL: &str =
        "https://compute.googleapis.com/compute/v1/projects/test-project/global/networks/default";
    const NETWORKS_URL: &str =
        "https://compute.googleapis.com/compute/v1/projects/test-project/global/networks";

    fn linker() -> Arc<Linker> {
        Arc::new(Linker::new(Arc::new(build_registry(false).unwrap())))
    }

    fn adapter(item_type: ItemType, mock: &Arc<MockHttp>, location: LocationInfo) -> DynamicAdapter {
        make_adapter(&linker(), item_type, mock.clone(), Arc::new(NoopCache), location).unwrap()
    }

    #[test]
    fn test_make_adapter_validates_location() {
        let mock = Arc::new(MockHttp::new());
        let linker = linker();

        let err = make_adapter(
            &linker,
            types::COMPUTE_DISK,
            mock.clone(),
            Arc::new(NoopCache),
            LocationInfo::project(PROJECT),
        )
        .err()
        .unwrap();
        assert!(matches!(err, AdapterError::Configuration(_)));

        let err = make_adapter(
            &linker,
            types::COMPUTE_DISK,
            mock.clone(),
            Arc::new(NoopCache),
            LocationInfo::zonal(PROJECT, ""),
        )
        .err()
        .unwrap();
        assert!(matches!(err, AdapterError::Configuration(_)));

        assert!(make_adapter(
            &linker,
            ItemType::new("gcp-unknown"),
            mock.clone(),
            Arc::new(NoopCache),
            LocationInfo::project(PROJECT),
        )
        .is_err());
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn test_capabilities_follow_endpoints() {
        let mock = Arc::new(MockHttp::new());
        let network = adapter(types::COMPUTE_NETWORK, &mock, LocationInfo::project(PROJECT));
        assert_eq!(
            network.capabilities(),
            Capabilities {
                can_list: true,
                can_search: false,
                can_stream: true
            }
        );

        let key = adapter(types::CLOUD_KMS_CRYPTO_KEY, &mock, LocationInfo::project(PROJECT));
        assert!(key.capabilities().can_search);
    }

    #[tokio::test]
    async fn test_get_builds_and_links_item() {
        let mock = Arc::new(MockHttp::new().with_json(
            NETWORK_URL,
            200,
            json!({
                "name": "default",
                "selfLink": NETWORK_URL,
                "subnetworks": [
                    "https://www.googleapis.com/compute/v1/projects/test-project/regions/us-central1/subnetworks/default"
                ]
            }),
        ));
        let network = adapter(types::COMPUTE_NETWORK, &mock, LocationInfo::project(PROJECT));

        let item = network
            .get(&CancellationToken::new(), PROJECT, "default", false)
            .await
            .unwrap();
        assert_eq!(item.unique_attribute_value(), "default");
        assert_eq!(item.scope, PROJECT);
        assert_eq!(item.linked_item_queries.len(), 1);
        assert_eq!(item.linked_item_queries[0].scope, "test-project.us-central1");
        assert_eq!(item.linked_item_queries[0].query, "default");
    }

    #[tokio::test]
    async fn test_wrong_scope_and_bad_query() {
        let mock = Arc::new(MockHttp::new());
        let network = adapter(types::COMPUTE_NETWORK, &mock, LocationInfo::project(PROJECT));
        let ctx = CancellationToken::new();

        assert!(matches!(
            network.get(&ctx, "other-project", "default", false).await,
            Err(AdapterError::NoScope { .. })
        ));
        assert!(matches!(
            network.get(&ctx, PROJECT, "a|b", false).await,
            Err(AdapterError::InvalidQuery { .. })
        ));
        assert!(matches!(
            network.search(&ctx, PROJECT, "x", false).await,
            Err(AdapterError::Unsupported { .. })
        ));
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn test_get_caches_not_found() {
        let mock = Arc::new(MockHttp::new());
        let cache = Arc::new(MemoryCache::new(Duration::from_secs(60)));
        let network = make_adapter(
            &linker(),
            types::COMPUTE_NETWORK,
            mock.clone(),
            cache.clone(),
            LocationInfo::project(PROJECT),
        )
        .unwrap();
        let ctx = CancellationToken::new();

        for _ in 0..2 {
            let err = network.get(&ctx, PROJECT, "default", false).await.unwrap_err();
            assert!(err.is_not_found());
        }
        assert_eq!(mock.calls().len(), 1);

        network.get(&ctx, PROJECT, "default", true).await.unwrap_err();
        assert_eq!(mock.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_list_stream_delivers_items_then_error() {
        let mock = Arc::new(
            MockHttp::new()
                .with_json(NETWORKS_URL, 200, json!({"items": [{"name": "a"}, {"name": "b"}], "nextPageToken": "t1"}))
                .with_json(
                    &format!("{}?pageToken=t1", NETWORKS_URL),
                    500,
                    json!({"error": {"message": "backend"}}),
                ),
        );
        let network = adapter(types::COMPUTE_NETWORK, &mock, LocationInfo::project(PROJECT));
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

        network
            .list_stream(&CancellationToken::new(), PROJECT, false, &tx)
            .await;
        drop(tx);

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        assert_eq!(events.len(), 3);
        assert!(matches!(&events[0], StreamEvent::Item(item) if item.unique_attribute_value() == "a"));
        assert!(matches!(&events[2], StreamEvent::Error(AdapterError::Pagination { pages: 1, .. })));
    }

    #[tokio::test]
    async fn test_search_by_location_and_full_name() {
        let keys_url = "https://cloudkms.googleapis.com/v1/projects/test-project/locations/global/keyRings/ring/cryptoKeys";
        let key_name = "projects/test-project/locations/global/keyRings/ring/cryptoKeys/key";
        let mock = Arc::new(
            MockHttp::new()
                .with_json(keys_url, 200, json!({"cryptoKeys": [{"name": key_name}]}))
                .with_json(&format!("https://cloudkms.googleapis.com/v1/{}", key_name), 200, json!({"name": key_name})),
        );
        let keys = adapter(types::CLOUD_KMS_CRYPTO_KEY, &mock, LocationInfo::project(PROJECT));
        let ctx = CancellationToken::new();

        let found = keys.search(&ctx, PROJECT, "global|ring", false).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].unique_attribute_value(), "global|ring|key");
        let ring_link = found[0]
            .linked_item_queries
            .iter()
            .find(|q| q.item_type == types::CLOUD_KMS_KEY_RING)
            .unwrap();
        assert_eq!(ring_link.query, "global|ring");
        assert_eq!(ring_link.blast_propagation, BlastPropagation::both());

        let found = keys.search(&ctx, PROJECT, key_name, false).await.unwrap();
        assert_eq!(found.len(), 1);

        let calls = mock.calls().len();
        let in_ring = keys
            .search(&ctx, PROJECT, "projects/test-project/locations/global/keyRings/ring", false)
            .await
            .unwrap();
        assert_eq!(in_ring.len(), 1);
        assert_eq!(in_ring[0].unique_attribute_value(), "global|ring|key");
        assert_eq!(mock.calls().split_off(calls), vec![keys_url.to_string()]);

        let missing = keys
            .search(&ctx, PROJECT, "projects/test-project/locations/global/keyRings/ring/cryptoKeys/gone", false)
            .await
            .unwrap();
        assert!(missing.is_empty());

        let elsewhere = keys
            .search(&ctx, PROJECT, "projects/other/locations/global/keyRings/ring/cryptoKeys/key", false)
            .await
            .unwrap();
        assert!(elsewhere.is_empty());
    }

    #[tokio::test]
    async fn test_search_not_found_is_empty() {
        let mock = Arc::new(MockHttp::new());
        let keys = adapter(types::CLOUD_KMS_CRYPTO_KEY, &mock, LocationInfo::project(PROJECT));
        let found = keys
            .search(&CancellationToken::new(), PROJECT, "global|missing", false)
            .await
            .unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_metadata() {
        let mock = Arc::new(MockHttp::new());
        let subscription = adapter(types::PUB_SUB_SUBSCRIPTION, &mock, LocationInfo::project(PROJECT));
        let metadata = subscription.metadata();
        assert_eq!(metadata.descriptive_name, "GCP Pub Sub Subscription");
        assert!(metadata.potential_links.contains(&types::PUB_SUB_TOPIC));
        assert!(metadata
            .supported_query_methods
            .iter()
            .any(|m| m.method == QueryMethod::List));
    }

    #[tokio::test]
    async fn test_make_adapters_covers_locations() {
        let mock = Arc::new(MockHttp::new());
        let adapters = make_adapters(
            &linker(),
            mock,
            Arc::new(NoopCache),
            PROJECT,
            &["us-central1".to_string(), "europe-west1".to_string()],
            &["us-central1-a".to_string()],
        )
        .unwrap();

        let subnet_scopes: Vec<&str> = adapters
            .iter()
            .filter(|a| a.item_type() == types::COMPUTE_SUBNETWORK)
            .map(|a| a.scope())
            .collect();
        assert_eq!(subnet_scopes, vec!["test-project.us-central1", "test-project.europe-west1"]);
        assert_eq!(
            adapters
                .iter()
                .filter(|a| a.item_type() == types::COMPUTE_DISK)
                .count(),
            1
        );
    }

    #[test]
    fn test_make_adapters_rejects_dangling_links() {
        let mut registry = build_registry(false).unwrap();
        let mut declaration = registry.get(types::COMPUTE_NETWORK).unwrap().clone();
        declaration.item_type = ItemType::new("gcp-test-orphan");
        declaration = declaration.link(
            "peerings.unknown",
            ItemType::new("gcp-not-registered"),
            "nothing",
            BlastPropagation::both(),
        );
        registry.register(declaration).unwrap();
        let mock = Arc::new(MockHttp::new());

        let err = make_adapters(
            &Arc::new(Linker::new(Arc::new(registry))),
            mock.clone(),
            Arc::new(NoopCache),
            PROJECT,
            &[],
            &[],
        )
        .err()
        .unwrap();
        assert!(matches!(err, AdapterError::Configuration(message) if message.contains("gcp-not-registered")));
        assert!(mock.calls().is_empty());
    }
}
