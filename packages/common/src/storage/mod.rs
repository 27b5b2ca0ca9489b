mod error;
mod key;
mod signing;
mod traits;

pub mod filesystem;
#[cfg(feature = "object-storage")]
pub mod s3;

pub use error::StorageError;
pub use key::{CERTIFICATE_PREFIX, certificate_extension, certificate_key, validate_key};
pub use signing::DownloadSigner;
pub use traits::{BlobStore, BoxReader};
