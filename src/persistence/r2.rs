use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Method, StatusCode};
use tracing::debug;
use url::Url;

use crate::config::StorageConfig;
use crate::constants::storage::{CONTENT_TYPE, REQUEST_TIMEOUT};
use crate::data::record::Snapshot;
use crate::error::{PersistenceError, PersistenceResult};

use super::sigv4::{self, Credentials, Signer, SigningRequest};
use super::SnapshotGateway;

/// Snapshot gateway for Cloudflare R2 or any other S3-compatible store.
///
/// Uses path-style addressing: `{endpoint}/{bucket}/{key}`.
pub struct R2Gateway {
    client: Client,
    object_url: Url,
    host: String,
    canonical_uri: String,
    region: String,
    credentials: Credentials,
}

impl R2Gateway {
    pub fn new(config: &StorageConfig) -> PersistenceResult<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Self::with_client(config, client)
    }

    pub fn with_client(config: &StorageConfig, client: Client) -> PersistenceResult<Self> {
        let invalid = |reason: &str| PersistenceError::InvalidEndpoint {
            endpoint: config.endpoint.clone(),
            reason: reason.to_string(),
        };

        let endpoint = Url::parse(config.endpoint.trim_end_matches('/'))
            .map_err(|e| invalid(&e.to_string()))?;
        let host_name = endpoint.host_str().ok_or_else(|| invalid("missing host"))?;
        let host = match endpoint.port() {
            Some(port) => format!("{}:{}", host_name, port),
            None => host_name.to_string(),
        };

        let base_path = endpoint.path().trim_end_matches('/');
        let canonical_uri = format!(
            "{}/{}/{}",
            base_path,
            sigv4::encode_segment(&config.bucket),
            sigv4::encode_segment(&config.object_key)
        );

        let mut object_url = endpoint.clone();
        object_url.set_path(&canonical_uri);

        Ok(Self {
            client,
            object_url,
            host,
            canonical_uri,
            region: config.region.clone(),
            credentials: Credentials {
                access_key_id: config.access_key_id.clone(),
                secret_access_key: config.secret_access_key.clone(),
            },
        })
    }

    pub fn object_url(&self) -> &Url {
        &self.object_url
    }

    fn signed_request(
        &self,
        method: Method,
        body: Option<Vec<u8>>,
    ) -> PersistenceResult<reqwest::RequestBuilder> {
        let now = Utc::now();
        let payload_sha256 = sigv4::sha256_hex(body.as_deref().unwrap_or_default());
        let amz_date = sigv4::amz_date(now);

        let mut headers = vec![
            ("host".to_string(), self.host.clone()),
            ("x-amz-content-sha256".to_string(), payload_sha256.clone()),
            ("x-amz-date".to_string(), amz_date.clone()),
        ];
        if body.is_some() {
            headers.push(("content-type".to_string(), CONTENT_TYPE.to_string()));
        }

        let signer = Signer {
            credentials: &self.credentials,
            region: &self.region,
            service: "s3",
        };
        let authorization = signer.authorization(
            &SigningRequest {
                method: method.as_str(),
                canonical_uri: &self.canonical_uri,
                headers,
                payload_sha256: payload_sha256.clone(),
            },
            now,
        )?;

        let mut request = self
            .client
            .request(method, self.object_url.clone())
            .header("x-amz-content-sha256", payload_sha256)
            .header("x-amz-date", amz_date)
            .header("authorization", authorization);
        if let Some(body) = body {
            request = request.header("content-type", CONTENT_TYPE).body(body);
        }
        Ok(request)
    }
}

#[async_trait]
impl SnapshotGateway for R2Gateway {
    fn name(&self) -> &'static str {
        "r2"
    }

    async fn save(&self, snapshot: &Snapshot) -> PersistenceResult<()> {
        let body = serde_json::to_vec(snapshot)?;
        let size = body.len();
        let response = self.signed_request(Method::PUT, Some(body))?.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PersistenceError::Http {
                status: status.as_u16(),
                body,
            });
        }
        debug!("PUT {} ({} bytes) -> {}", self.object_url, size, status);
        Ok(())
    }

    async fn load(&self) -> PersistenceResult<Option<Snapshot>> {
        let response = self.signed_request(Method::GET, None)?.send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PersistenceError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        Ok(Some(serde_json::from_slice(&bytes)?))
    }
}
