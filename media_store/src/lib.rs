// User needs to set the following environment variables:
// - key id (AWS_ACCESS_KEY_ID)
// - application key (AWS_SECRET_ACCESS_KEY)
//
// Region, endpoint and bucket name come from BlobStoreConfig.

use s3::bucket::Bucket;
use s3::creds::Credentials;
use s3::error::S3Error;
use s3::region::Region;

pub mod mock;
pub mod ops;
pub mod s3_storage;

pub use ops::BlobTransferOps;
pub use s3_storage::S3BlobStorage;

#[derive(Debug, thiserror::Error)]
pub enum BlobStorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("S3 error: {0}")]
    S3(#[from] S3Error),

    #[error("Other error: {0}")]
    Other(String),
}

#[derive(Debug, Clone)]
pub struct BlobStoreConfig {
    pub region: String,
    pub endpoint: String,
    pub bucket_name: String,
    /// Base URL public object URLs are formed from.
    pub public_base_url: String,
}

pub fn connect_bucket(config: &BlobStoreConfig) -> Result<Box<Bucket>, BlobStorageError> {
    let region = Region::Custom {
        region: config.region.clone(),
        endpoint: config.endpoint.clone(),
    };

    let credentials = Credentials::default()
        .map_err(|e| BlobStorageError::Other(format!("Credentials error: {e}")))?;

    let bucket = Bucket::new(&config.bucket_name, region, credentials)?.with_path_style();

    Ok(bucket)
}
