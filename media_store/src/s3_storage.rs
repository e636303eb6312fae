use std::path::Path;

use async_std::channel::Sender;
use async_std::io::ReadExt;
use async_trait::async_trait;
use core_types::events::TransferEvent;
use s3::bucket::Bucket;
use s3::error::S3Error;
use s3::serde_types::Part;

use crate::{BlobStorageError, BlobStoreConfig, connect_bucket, ops::BlobTransferOps};

// 5 MB part size
const PART_SIZE: usize = 5 * 1024 * 1024;

const CONTENT_TYPE: &str = "application/octet-stream";

pub struct S3BlobStorage {
    bucket: Box<Bucket>,
    public_base_url: String,
}

impl S3BlobStorage {
    pub fn new(config: &BlobStoreConfig) -> Result<Self, BlobStorageError> {
        let bucket = connect_bucket(config)?;
        Ok(Self {
            bucket,
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }
}

async fn multipart_upload(
    bucket: &Bucket,
    file_path: &Path,
    key: &str,
    progress_tx: Option<&Sender<TransferEvent>>,
) -> Result<(), BlobStorageError> {
    let total_bytes = async_std::fs::metadata(file_path).await?.len();

    if let Some(tx) = &progress_tx {
        tx.send(TransferEvent::Started {
            key: key.to_string(),
            total_bytes,
        })
        .await
        .ok();
    }

    let mut file = async_std::fs::File::open(file_path).await?;
    let mut buffer = vec![0u8; PART_SIZE];
    let mut part_number = 1;
    let mut bytes_sent: u64 = 0;
    let mut parts: Vec<Part> = Vec::new();

    let response = bucket.initiate_multipart_upload(key, CONTENT_TYPE).await?;

    loop {
        let bytes_read = file.read(&mut buffer).await?;
        if bytes_read == 0 {
            break;
        }

        tracing::debug!("Uploading part {} ({} bytes) of {}", part_number, bytes_read, key);
        let result = bucket
            .put_multipart_chunk(
                buffer[..bytes_read].to_vec(),
                key,
                part_number,
                &response.upload_id,
                CONTENT_TYPE,
            )
            .await;

        match result {
            Ok(part) => {
                bytes_sent += bytes_read as u64;
                if let Some(tx) = &progress_tx {
                    tx.send(TransferEvent::PartUploaded {
                        key: key.to_string(),
                        part: part_number,
                        bytes_sent,
                        total_bytes,
                    })
                    .await
                    .ok();
                }
                parts.push(part);
                part_number += 1;
            }
            Err(e) => {
                tracing::error!("Error uploading part {} of {}: {}", part_number, key, e);
                if let Some(tx) = &progress_tx {
                    tx.send(TransferEvent::PartUploadFailed {
                        key: key.to_string(),
                        error: format!("{}", e),
                    })
                    .await
                    .ok();
                }
                bucket.abort_upload(key, &response.upload_id).await.ok();
                return Err(BlobStorageError::S3(e));
            }
        };
    }

    bucket
        .complete_multipart_upload(key, &response.upload_id, parts)
        .await?;

    Ok(())
}

#[async_trait]
impl BlobTransferOps for S3BlobStorage {
    async fn upload_blob(
        &self,
        file_path: &Path,
        key: &str,
        progress_tx: Option<&Sender<TransferEvent>>,
    ) -> Result<String, BlobStorageError> {
        multipart_upload(&self.bucket, file_path, key, progress_tx).await?;

        let url = self.public_url(key);
        if let Some(tx) = &progress_tx {
            tx.send(TransferEvent::Completed {
                key: key.to_string(),
                url: url.clone(),
            })
            .await
            .ok();
        }
        Ok(url)
    }

    async fn delete_blob(&self, key: &str) -> Result<(), BlobStorageError> {
        self.bucket.delete_object(key).await?;
        Ok(())
    }

    async fn blob_exists(&self, key: &str) -> Result<bool, BlobStorageError> {
        match self.bucket.head_object(key).await {
            Ok(_) => Ok(true),
            Err(S3Error::HttpFailWithBody(404, _)) => Ok(false),
            Err(e) => Err(BlobStorageError::S3(e)),
        }
    }
}
