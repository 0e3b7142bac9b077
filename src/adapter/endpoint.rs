//! Endpoint function builders
//!
//! A builder is declared with a URL template and bound at adapter creation
//! time to its init parameters (project, and region or zone). Binding fails
//! immediately when a parameter is missing, so a misconfigured adapter never
//! reaches query time. The bound function maps a runtime query to a URL, or
//! to `None` when the query does not fit the endpoint.
//!
//! Templates use `%s` placeholders, filled with the init parameters first and
//! the query segments after. Explicit indexes (`%[2]s`) place an argument
//! out of order or let a template skip the project; `%%` is a literal `%`.

use super::composite::CompositeKey;
use crate::gcp::location::LocationLevel;
use crate::sdp::AdapterError;
use std::borrow::Cow;
use std::sync::Arc;

/// Bound endpoint: runtime query -> URL
pub type EndpointFunc = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Literal(String),
    Arg(usize),
}

/// Parsed URL template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplate {
    pieces: Vec<Piece>,
}

impl UrlTemplate {
    pub fn parse(format: &str) -> Result<Self, AdapterError> {
        let mut pieces = Vec::new();
        let mut literal = String::new();
        let mut next_arg = 0;
        let mut chars = format.chars().peekable();

        while let Some(c) = chars.next() {
            if c != '%' {
                literal.push(c);
                continue;
            }

            let index = match chars.next() {
                Some('%') => {
                    literal.push('%');
                    continue;
                },
                Some('s') => next_arg,
                Some('[') => {
                    let digits: String = chars.by_ref().take_while(|c| *c != ']').collect();
                    let position: usize = digits.parse().map_err(|_| {
                        AdapterError::configuration(format!(
                            "malformed endpoint template {:?}: bad index {:?}",
                            format, digits
                        ))
                    })?;
                    if position == 0 || chars.next() != Some('s') {
                        return Err(AdapterError::configuration(format!(
                            "malformed endpoint template {:?}: expected %[n]s with n >= 1",
                            format
                        )));
                    }
                    position - 1
                },
                other => {
                    return Err(AdapterError::configuration(format!(
                        "malformed endpoint template {:?}: unsupported verb %{}",
                        format,
                        other.map(String::from).unwrap_or_default()
                    )))
                },
            };

            if !literal.is_empty() {
                pieces.push(Piece::Literal(std::mem::take(&mut literal)));
            }
            pieces.push(Piece::Arg(index));
            next_arg = index + 1;
        }

        if !literal.is_empty() {
            pieces.push(Piece::Literal(literal));
        }

        Ok(Self { pieces })
    }

    fn referenced(&self) -> impl Iterator<Item = usize> + '_ {
        self.pieces.iter().filter_map(|piece| match piece {
            Piece::Arg(index) => Some(*index),
            Piece::Literal(_) => None,
        })
    }

    /// Check the template against `init + query` arguments
    ///
    /// Every query argument must be used; init arguments may be skipped.
    fn check_arity(&self, format: &str, init: usize, query: usize) -> Result<(), AdapterError> {
        let total = init + query;
        if let Some(index) = self.referenced().find(|index| *index >= total) {
            return Err(AdapterError::configuration(format!(
                "endpoint template {:?} references argument {} but only {} are available",
                format,
                index + 1,
                total
            )));
        }
        for index in init..total {
            if !self.referenced().any(|used| used == index) {
                return Err(AdapterError::configuration(format!(
                    "endpoint template {:?} never uses query segment {}",
                    format,
                    index - init + 1
                )));
            }
        }
        Ok(())
    }

    pub fn render(&self, args: &[&str]) -> String {
        self.pieces
            .iter()
            .map(|piece| match piece {
                Piece::Literal(text) => Cow::Borrowed(text.as_str()),
                Piece::Arg(index) => args
                    .get(*index)
                    .map(|arg| encode_segment(arg))
                    .unwrap_or_default(),
            })
            .collect()
    }
}

/// Percent-encode a substituted value only when it would break the path
fn encode_segment(value: &str) -> Cow<'_, str> {
    if value.contains(['/', '?', '#', '%', ' ']) {
        urlencoding::encode(value)
    } else {
        Cow::Borrowed(value)
    }
}

fn check_init_params(
    format: &str,
    level: LocationLevel,
    params: &[&str],
) -> Result<Vec<String>, AdapterError> {
    let required: &[&str] = match level {
        LocationLevel::Project => &["project ID"],
        LocationLevel::Regional => &["project ID", "region"],
        LocationLevel::Zonal => &["project ID", "zone"],
    };

    if params.len() != required.len() {
        return Err(AdapterError::configuration(format!(
            "{} endpoint {:?} requires {} but got {} parameter(s)",
            level,
            format,
            required.join(" and "),
            params.len()
        )));
    }
    for (name, value) in required.iter().zip(params) {
        if value.trim().is_empty() {
            return Err(AdapterError::configuration(format!(
                "{} endpoint {:?} requires a non-empty {}",
                level, format, name
            )));
        }
    }

    Ok(params.iter().map(|p| p.to_string()).collect())
}

fn init_arity(level: LocationLevel) -> usize {
    match level {
        LocationLevel::Project => 1,
        LocationLevel::Regional | LocationLevel::Zonal => 2,
    }
}

/// Get/search endpoint declaration, bound later with init parameters
#[derive(Debug, Clone)]
pub struct EndpointFuncBuilder {
    format: Arc<str>,
    level: LocationLevel,
    query_arity: usize,
}

impl EndpointFuncBuilder {
    pub fn new(format: impl Into<String>, level: LocationLevel, query_arity: usize) -> Self {
        Self {
            format: Arc::from(format.into()),
            level,
            query_arity,
        }
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn level(&self) -> LocationLevel {
        self.level
    }

    /// Number of `|`-separated segments a query must have
    pub fn query_arity(&self) -> usize {
        self.query_arity
    }

    /// Parse the template and check it against the declared arity
    pub fn validate(&self) -> Result<UrlTemplate, AdapterError> {
        if self.query_arity == 0 {
            return Err(AdapterError::configuration(format!(
                "endpoint {:?} must take at least one query segment",
                self.format
            )));
        }
        let template = UrlTemplate::parse(&self.format)?;
        template.check_arity(&self.format, init_arity(self.level), self.query_arity)?;
        Ok(template)
    }

    /// Bind the init parameters
    pub fn build(&self, params: &[&str]) -> Result<EndpointFunc, AdapterError> {
        let template = self.validate()?;
        let init = check_init_params(&self.format, self.level, params)?;
        let query_arity = self.query_arity;

        Ok(Arc::new(move |query: &str| {
            let key = CompositeKey::parse_exact(query, query_arity).ok()?;
            let args: Vec<&str> = init
                .iter()
                .chain(key.segments())
                .map(String::as_str)
                .collect();
            Some(template.render(&args))
        }))
    }
}

/// List endpoint declaration; takes no runtime query
#[derive(Debug, Clone)]
pub struct ListFuncBuilder {
    format: Arc<str>,
    level: LocationLevel,
}

impl ListFuncBuilder {
    pub fn new(format: impl Into<String>, level: LocationLevel) -> Self {
        Self {
            format: Arc::from(format.into()),
            level,
        }
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn level(&self) -> LocationLevel {
        self.level
    }

    pub fn validate(&self) -> Result<UrlTemplate, AdapterError> {
        let template = UrlTemplate::parse(&self.format)?;
        template.check_arity(&self.format, init_arity(self.level), 0)?;
        Ok(template)
    }

    /// Bind the init parameters, producing the list URL
    pub fn build(&self, params: &[&str]) -> Result<String, AdapterError> {
        let template = self.validate()?;
        let init = check_init_params(&self.format, self.level, params)?;
        let args: Vec<&str> = init.iter().map(String::as_str).collect();
        Ok(template.render(&args))
    }
}

/// `projects/%s/.../%s`: project plus one query segment
pub fn project_level_endpoint_func_with_single_query(format: impl Into<String>) -> EndpointFuncBuilder {
    EndpointFuncBuilder::new(format, LocationLevel::Project, 1)
}

/// Project plus two query segments, e.g. `location|keyRing`
pub fn project_level_endpoint_func_with_two_queries(format: impl Into<String>) -> EndpointFuncBuilder {
    EndpointFuncBuilder::new(format, LocationLevel::Project, 2)
}

/// Project plus three query segments, e.g. `location|keyRing|cryptoKey`
pub fn project_level_endpoint_func_with_three_queries(format: impl Into<String>) -> EndpointFuncBuilder {
    EndpointFuncBuilder::new(format, LocationLevel::Project, 3)
}

/// Project plus four query segments, e.g. `location|keyRing|cryptoKey|version`
pub fn project_level_endpoint_func_with_four_queries(format: impl Into<String>) -> EndpointFuncBuilder {
    EndpointFuncBuilder::new(format, LocationLevel::Project, 4)
}

/// Project and region plus one query segment
pub fn regional_level_endpoint_func_with_single_query(format: impl Into<String>) -> EndpointFuncBuilder {
    EndpointFuncBuilder::new(format, LocationLevel::Regional, 1)
}

/// Project and zone plus one query segment
pub fn zone_level_endpoint_func_with_single_query(format: impl Into<String>) -> EndpointFuncBuilder {
    EndpointFuncBuilder::new(format, LocationLevel::Zonal, 1)
}

pub fn project_level_list_func(format: impl Into<String>) -> ListFuncBuilder {
    ListFuncBuilder::new(format, LocationLevel::Project)
}

pub fn regional_level_list_func(format: impl Into<String>) -> ListFuncBuilder {
    ListFuncBuilder::new(format, LocationLevel::Regional)
}

pub fn zone_level_list_func(format: impl Into<String>) -> ListFuncBuilder {
    ListFuncBuilder::new(format, LocationLevel::Zonal)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NETWORK: &str = "https://compute.googleapis.com/compute/v1/projects/%s/global/networks/%s";

    #[test]
    fn test_single_query() {
        let func = project_level_endpoint_func_with_single_query(NETWORK)
            .build(&["my-project"])
            .unwrap();
        assert_eq!(
            func("default").as_deref(),
            Some("https://compute.googleapis.com/compute/v1/projects/my-project/global/networks/default")
        );
        assert_eq!(func(""), None);
        assert_eq!(func("a|b"), None);
    }

    #[test]
    fn test_three_queries() {
        let func = project_level_endpoint_func_with_three_queries(
            "https://cloudkms.googleapis.com/v1/projects/%s/locations/%s/keyRings/%s/cryptoKeys/%s",
        )
        .build(&["p"])
        .unwrap();
        assert_eq!(
            func("global|ring|key").as_deref(),
            Some("https://cloudkms.googleapis.com/v1/projects/p/locations/global/keyRings/ring/cryptoKeys/key")
        );
        assert_eq!(func("global|ring"), None);
        assert_eq!(func("global||key"), None);
    }

    #[test]
    fn test_zonal_and_regional() {
        let zonal = zone_level_endpoint_func_with_single_query(
            "https://compute.googleapis.com/compute/v1/projects/%s/zones/%s/disks/%s",
        )
        .build(&["p", "us-central1-a"])
        .unwrap();
        assert_eq!(
            zonal("disk-1").as_deref(),
            Some("https://compute.googleapis.com/compute/v1/projects/p/zones/us-central1-a/disks/disk-1")
        );

        let regional = regional_level_list_func(
            "https://compute.googleapis.com/compute/v1/projects/%s/regions/%s/subnetworks",
        )
        .build(&["p", "europe-west1"])
        .unwrap();
        assert_eq!(
            regional,
            "https://compute.googleapis.com/compute/v1/projects/p/regions/europe-west1/subnetworks"
        );
    }

    #[test]
    fn test_missing_init_params_fail_fast() {
        let builder = zone_level_endpoint_func_with_single_query(
            "https://compute.googleapis.com/compute/v1/projects/%s/zones/%s/disks/%s",
        );
        assert!(matches!(builder.build(&["p"]), Err(AdapterError::Configuration(_))));
        assert!(matches!(builder.build(&["p", ""]), Err(AdapterError::Configuration(_))));
        assert!(matches!(
            project_level_list_func("https://x/projects/%s/things").build(&[""]),
            Err(AdapterError::Configuration(_))
        ));
    }

    #[test]
    fn test_explicit_indexes() {
        let func = project_level_endpoint_func_with_single_query(
            "https://storage.googleapis.com/storage/v1/b/%[2]s",
        )
        .build(&["p"])
        .unwrap();
        assert_eq!(
            func("my-bucket").as_deref(),
            Some("https://storage.googleapis.com/storage/v1/b/my-bucket")
        );

        let list = project_level_list_func("https://x/things?filter=a%%3Db&project=%[1]s")
            .build(&["p"])
            .unwrap();
        assert_eq!(list, "https://x/things?filter=a%3Db&project=p");
    }

    #[test]
    fn test_malformed_templates() {
        assert!(project_level_endpoint_func_with_two_queries(NETWORK).validate().is_err());
        assert!(project_level_endpoint_func_with_single_query("https://x/%d").validate().is_err());
        assert!(project_level_endpoint_func_with_single_query("https://x/%[0]s").validate().is_err());
        assert!(project_level_list_func("https://x/projects/%s/a/%s").validate().is_err());
    }

    #[test]
    fn test_segments_with_reserved_characters_are_encoded() {
        let func = project_level_endpoint_func_with_single_query("https://x/projects/%s/objects/%s")
            .build(&["p"])
            .unwrap();
        assert_eq!(func("dir/file").as_deref(), Some("https://x/projects/p/objects/dir%2Ffile"));
        assert_eq!(
            func("sa@p.iam.gserviceaccount.com").as_deref(),
            Some("https://x/projects/p/objects/sa@p.iam.gserviceaccount.com")
        );
    }
}
