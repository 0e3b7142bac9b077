//! GCP API interaction module
//!
//! Transport, authentication and addressing for Google Cloud Platform REST
//! APIs.
//!
//! # Module Structure
//!
//! - [`auth`] - bearer tokens (ADC or static) and gcloud defaults
//! - [`client`] - authenticated client implementing [`http::HttpClientProvider`]
//! - [`http`] - HTTP transport abstraction and reqwest implementation
//! - [`location`] - project / region / zone addressing and scopes
//!
//! # Example
//!
//! ```ignore
//! use gcp_adapters::gcp::client::GcpClient;
//! use gcp_adapters::gcp::http::HttpClientProvider;
//!
//! async fn example() -> anyhow::Result<()> {
//!     let client = GcpClient::new(std::time::Duration::from_secs(30)).await?;
//!     let response = client
//!         .get("https://compute.googleapis.com/compute/v1/projects/my-project/global/networks")
//!         .await?;
//!     println!("{}", response.status);
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod http;
pub mod location;
