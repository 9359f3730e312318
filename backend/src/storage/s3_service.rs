use async_trait::async_trait;
use aws_config::environment::region::EnvironmentVariableRegionProvider;
use aws_config::meta::region::RegionProviderChain;
use aws_config::retry::RetryConfig;
use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use std::path::Path;
use url::Url;

use super::{BlobStore, StorageError};
use crate::config::Settings;
use crate::connection_string::ConnectionString;

const DEFAULT_REGION: &str = "us-east-1";

#[derive(Clone)]
pub struct S3BlobStore {
    client: Client,
    bucket_name: String,
    base_url: String,
}

impl S3BlobStore {
    pub fn new(client: Client, bucket_name: String, base_url: String) -> Self {
        Self {
            client,
            bucket_name,
            base_url,
        }
    }

    /// Builds the client from the storage connection string. Recognised keys are
    /// `Endpoint`, `Region`, `AccessKeyId` and `SecretAccessKey`; anything missing
    /// falls back to the AWS default provider chain. Custom endpoints only consult
    /// the region environment variables. Without any region, `us-east-1` is used.
    pub async fn from_settings(settings: &Settings) -> Result<Self, StorageError> {
        let conn = ConnectionString::parse(&settings.storage_connection_string);
        let bucket_name = settings.storage_container_name.clone();

        let endpoint = conn
            .get("Endpoint")
            .map(|raw| {
                Url::parse(raw).map_err(|e| StorageError::Config(format!("invalid endpoint {}: {}", raw, e)))
            })
            .transpose()?;

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .retry_config(RetryConfig::disabled())
            .timeout_config(
                TimeoutConfig::builder()
                    .operation_timeout(settings.storage_timeout)
                    .build(),
            );

        let region_provider = match conn.get("Region") {
            Some(region) => RegionProviderChain::first_try(Region::new(region.to_string())),
            None if endpoint.is_some() => RegionProviderChain::first_try(EnvironmentVariableRegionProvider::new()),
            None => RegionProviderChain::default_provider(),
        };
        loader = loader.region(region_provider.or_else(DEFAULT_REGION));
        if let (Some(key_id), Some(secret)) = (conn.get("AccessKeyId"), conn.get("SecretAccessKey")) {
            loader = loader.credentials_provider(Credentials::new(
                key_id,
                secret,
                None,
                None,
                "storage-connection-string",
            ));
        }
        if let Some(endpoint) = &endpoint {
            loader = loader.endpoint_url(endpoint.as_str());
        }

        let sdk_config = loader.load().await;
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(endpoint.is_some())
            .build();

        let region = sdk_config
            .region()
            .map(|r| r.to_string())
            .unwrap_or_else(|| DEFAULT_REGION.to_string());
        let base_url = blob_base_url(endpoint.as_ref(), &bucket_name, &region);

        log::info!("Blob storage ready: bucket {} at {}", bucket_name, base_url);
        Ok(Self::new(Client::from_conf(s3_config), bucket_name, base_url))
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn download(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        let download_error = |message: String| StorageError::Download {
            path: path.to_string(),
            message,
        };

        let result = self
            .client
            .get_object()
            .bucket(&self.bucket_name)
            .key(path)
            .send()
            .await
            .map_err(|e| download_error(DisplayErrorContext(&e).to_string()))?;

        let body = result
            .body
            .collect()
            .await
            .map_err(|e| download_error(DisplayErrorContext(&e).to_string()))?;
        Ok(body.into_bytes().to_vec())
    }

    async fn upload(&self, path: &str, data: Vec<u8>) -> Result<String, StorageError> {
        self.client
            .put_object()
            .bucket(&self.bucket_name)
            .key(path)
            .body(ByteStream::from(data))
            .content_type(content_type_for(path))
            .send()
            .await
            .map_err(|e| StorageError::Upload {
                path: path.to_string(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        Ok(blob_url(&self.base_url, path))
    }
}

fn blob_base_url(endpoint: Option<&Url>, bucket_name: &str, region: &str) -> String {
    match endpoint {
        Some(endpoint) => format!("{}/{}", endpoint.as_str().trim_end_matches('/'), bucket_name),
        None => format!("https://{}.s3.{}.amazonaws.com", bucket_name, region),
    }
}

pub fn blob_url(base_url: &str, path: &str) -> String {
    let encoded: Vec<_> = path.split('/').map(urlencoding::encode).collect();
    format!("{}/{}", base_url, encoded.join("/"))
}

fn content_type_for(path: &str) -> &'static str {
    let extension = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        _ => "application/octet-stream",
    }
}
