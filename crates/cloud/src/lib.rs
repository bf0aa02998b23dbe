//! Cloud collaborators behind narrow trait interfaces.
//!
//! [`ObjectStore`] (artifact bytes + presigned URLs) and [`SecretStore`]
//! (credential lookup) are the two key-value services the enrichment
//! pipeline consumes. Production implementations wrap the AWS SDK; tests
//! substitute in-memory fakes through the same traits.

pub mod object_store;
pub mod secrets;

pub use object_store::{ObjectStore, S3ObjectStore};
pub use secrets::{SecretStore, SecretsManagerStore};
