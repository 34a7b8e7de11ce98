//! GCP API interaction module
//!
//! Authentication, the HTTP layer, and the project-scoped client that the
//! Pub/Sub REST adapter is built on.
//!
//! # Module Structure
//!
//! - [`auth`] - Application Default Credentials, key files, project discovery
//! - [`client`] - Main GCP client and its construction options
//! - [`http`] - HTTP utilities and API error classification
//!
//! # Example
//!
//! ```ignore
//! use oakpubsub::gcp::client::{ClientOptions, GcpClient};
//!
//! async fn example() -> oakpubsub::Result<()> {
//!     let client = GcpClient::new(ClientOptions::new("my-project")).await?;
//!     let topics = client.get(&client.project_url("topics")).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod http;
