//! Uploads dataset exports to S3.

use anyhow::{Context, Result};
use aws_sdk_s3::primitives::ByteStream;
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;
use std::io::Write;
use tracing::info;

use crate::export::{DataPackage, DatasetDump, to_csv};

/// S3 keys a dataset is published under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishKeys {
    pub csv: String,
    pub datapackage: String,
}

impl PublishKeys {
    /// `datasets/<slug>/<filename>.csv[.gz]` and `datasets/<slug>/datapackage.json`.
    pub fn for_dump(dump: &DatasetDump, gzip: bool) -> Self {
        let prefix = format!("datasets/{}", dump.dataset.slug());
        let extension = if gzip { "csv.gz" } else { "csv" };
        Self {
            csv: format!("{}/{}.{}", prefix, dump.dataset.filename(), extension),
            datapackage: format!("{prefix}/datapackage.json"),
        }
    }
}

/// Gzip-compresses `bytes` at the default level.
pub fn gzip_bytes(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes)?;
    Ok(encoder.finish()?)
}

/// Serializes a value to JSON and uploads it with `application/json` content type.
pub async fn write_json_to_s3(
    client: &aws_sdk_s3::Client,
    bucket: &str,
    key: &str,
    value: &impl Serialize,
) -> Result<()> {
    let body = serde_json::to_vec_pretty(value)?;

    client
        .put_object()
        .bucket(bucket)
        .key(key)
        .body(ByteStream::from(body))
        .content_type("application/json")
        .send()
        .await
        .with_context(|| format!("Failed to upload s3://{bucket}/{key}"))?;

    Ok(())
}

/// Uploads the CSV export and datapackage of `dump`.
#[tracing::instrument(skip(client, dump), fields(dataset_id = dump.dataset.id))]
pub async fn publish_dataset(
    client: &aws_sdk_s3::Client,
    bucket: &str,
    dump: &DatasetDump,
    gzip: bool,
) -> Result<PublishKeys> {
    let keys = PublishKeys::for_dump(dump, gzip);

    let csv = to_csv(dump)?.into_bytes();
    let (body, encoding) = if gzip {
        (gzip_bytes(&csv)?, Some("gzip"))
    } else {
        (csv, None)
    };

    let mut request = client
        .put_object()
        .bucket(bucket)
        .key(&keys.csv)
        .body(ByteStream::from(body))
        .content_type("text/csv");
    if let Some(encoding) = encoding {
        request = request.content_encoding(encoding);
    }
    request
        .send()
        .await
        .with_context(|| format!("Failed to upload s3://{bucket}/{}", keys.csv))?;

    write_json_to_s3(client, bucket, &keys.datapackage, &DataPackage::from_dump(dump)).await?;

    info!(csv = %keys.csv, datapackage = %keys.datapackage, "Dataset published");
    Ok(keys)
}
