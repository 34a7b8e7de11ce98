//! oakpubsub
//!
//! A convenience layer over Google Cloud Pub/Sub: idempotent topic and
//! subscription provisioning, message helpers, batch pull/acknowledge, and
//! paginated bulk administration.
//!
//! Delivery, durability, ordering and retry semantics are the service's; this
//! crate shapes requests and responses around them.

pub mod config;
pub mod error;
pub mod gcp;
pub mod pubsub;

pub use error::{Error, ErrorKind, Result};
pub use gcp::auth::CredentialSource;
pub use gcp::client::{ClientOptions, GcpClient};
