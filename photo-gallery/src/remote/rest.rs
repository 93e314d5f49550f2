//! [`RemoteBackend`] over the backend's HTTP API
//!
//! Tables are reached through PostgREST under `/rest/v1`, the photo bucket
//! through `/storage/v1`, profile metadata through `/auth/v1/user`.

use super::{
    NewRemotePhoto, RemoteAlbumRow, RemoteBackend, RemoteError, RemotePhotoRow, RemoteResult,
    SignedUrl,
};
use async_trait::async_trait;
use cloud_auth::Session;
use reqwest::{RequestBuilder, Response};
use serde::Deserialize;
use serde_json::json;

/// Connection settings for the HTTP backend
#[derive(Debug, Clone)]
pub struct RestConfig {
    pub base_url: String,
    /// Public API key; also the bearer token for anonymous calls
    pub anon_key: String,
    /// Object bucket holding photo files
    pub bucket: String,
}

/// HTTP implementation of [`RemoteBackend`]
pub struct RestBackend {
    config: RestConfig,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct SignedUrlEntry {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    path: Option<String>,
    #[serde(default, rename = "signedURL")]
    signed_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CountAggregate {
    count: i64,
}

#[derive(Debug, Deserialize)]
struct AlbumRowWithCount {
    id: i64,
    name: String,
    is_public: bool,
    #[serde(default)]
    access_key: Option<String>,
    #[serde(default)]
    albumphoto: Vec<CountAggregate>,
}

impl From<AlbumRowWithCount> for RemoteAlbumRow {
    fn from(row: AlbumRowWithCount) -> Self {
        RemoteAlbumRow {
            id: row.id,
            name: row.name,
            is_public: row.is_public,
            photo_quantity: row.albumphoto.first().map(|c| c.count).unwrap_or(0),
            access_key: row.access_key,
        }
    }
}

#[derive(Debug, Deserialize)]
struct UriRow {
    uri: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(rename = "Key")]
    key: String,
}

/// PostgREST `in` filter for a list of ids
fn id_list(ids: &[i64]) -> String {
    let joined = ids
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",");
    format!("in.({})", joined)
}

/// Pairs sign results with the requested paths, resolving relative URLs
fn signed_urls_from_entries(
    storage_base: &str,
    paths: &[String],
    entries: Vec<SignedUrlEntry>,
) -> Vec<SignedUrl> {
    paths
        .iter()
        .zip(entries.into_iter().map(Some).chain(std::iter::repeat_with(|| None)))
        .map(|(path, entry)| {
            let result = match entry {
                None => Err("missing from sign response".to_string()),
                Some(SignedUrlEntry {
                    error: Some(error), ..
                }) => Err(error),
                Some(SignedUrlEntry {
                    signed_url: Some(url),
                    ..
                }) if url.starts_with("http") => Ok(url),
                Some(SignedUrlEntry {
                    signed_url: Some(url),
                    ..
                }) => Ok(format!("{}{}", storage_base, url)),
                Some(SignedUrlEntry { path: other, .. }) => Err(format!(
                    "no signed URL returned for {}",
                    other.unwrap_or_else(|| path.clone())
                )),
            };
            SignedUrl {
                path: path.clone(),
                result,
            }
        })
        .collect()
}

impl RestBackend {
    pub fn new(config: RestConfig) -> RemoteResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .connect_timeout(std::time::Duration::from_secs(10))
            .tcp_keepalive(std::time::Duration::from_secs(30))
            .user_agent("PhotoGallery/0.1.0")
            .build()
            .map_err(|e| RemoteError::Http(format!("Client build failed: {}", e)))?;

        Ok(Self { config, client })
    }

    fn base(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    fn rest_url(&self, resource: &str) -> String {
        format!("{}/rest/v1/{}", self.base(), resource)
    }

    fn storage_base(&self) -> String {
        format!("{}/storage/v1", self.base())
    }

    fn object_url(&self, path: &str) -> String {
        format!(
            "{}/object/{}/{}",
            self.storage_base(),
            self.config.bucket,
            path.trim_start_matches('/')
        )
    }

    fn authorize(&self, request: RequestBuilder, session: Option<&Session>) -> RequestBuilder {
        let token = session
            .map(|s| s.access_token.as_str())
            .unwrap_or(self.config.anon_key.as_str());
        request
            .header("apikey", &self.config.anon_key)
            .bearer_auth(token)
    }

    async fn send(request: RequestBuilder) -> RemoteResult<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| RemoteError::Http(format!("Request failed: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        Err(RemoteError::Status {
            status: status.as_u16(),
            message,
        })
    }

    async fn send_json<T: serde::de::DeserializeOwned>(request: RequestBuilder) -> RemoteResult<T> {
        Self::send(request)
            .await?
            .json::<T>()
            .await
            .map_err(|e| RemoteError::Json(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl RemoteBackend for RestBackend {
    async fn list_photos(
        &self,
        session: &Session,
        album_id: Option<i64>,
    ) -> RemoteResult<Vec<RemotePhotoRow>> {
        let query: Vec<(&str, String)> = match album_id {
            None => vec![
                ("select", "id,uri,date_taken".to_string()),
                ("order", "date_taken.desc,id.desc".to_string()),
            ],
            Some(album_id) => vec![
                ("select", "id,uri,date_taken,album!inner(id)".to_string()),
                ("album.id", format!("eq.{}", album_id)),
                ("order", "date_taken.desc,id.desc".to_string()),
            ],
        };

        let request = self.client.get(self.rest_url("photo")).query(&query);
        Self::send_json(self.authorize(request, Some(session))).await
    }

    async fn create_signed_urls(
        &self,
        session: Option<&Session>,
        paths: &[String],
        expires_in: chrono::Duration,
    ) -> RemoteResult<Vec<SignedUrl>> {
        if paths.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/object/sign/{}", self.storage_base(), self.config.bucket);
        let request = self
            .client
            .post(url)
            .json(&json!({ "expiresIn": expires_in.num_seconds(), "paths": paths }));
        let entries: Vec<SignedUrlEntry> = Self::send_json(self.authorize(request, session)).await?;

        if entries.len() != paths.len() {
            log::warn!(
                "Sign response has {} entries for {} paths",
                entries.len(),
                paths.len()
            );
        }

        Ok(signed_urls_from_entries(&self.storage_base(), paths, entries))
    }

    async fn upload_object(
        &self,
        session: &Session,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> RemoteResult<String> {
        let request = self
            .client
            .post(self.object_url(path))
            .header("Content-Type", content_type)
            .header("x-upsert", "false")
            .body(bytes);
        let response: UploadResponse = Self::send_json(self.authorize(request, Some(session))).await?;

        // Key is "<bucket>/<path>"
        let prefix = format!("{}/", self.config.bucket);
        Ok(response
            .key
            .strip_prefix(&prefix)
            .map(str::to_string)
            .unwrap_or(response.key))
    }

    async fn remove_objects(&self, session: &Session, paths: &[String]) -> RemoteResult<()> {
        if paths.is_empty() {
            return Ok(());
        }
        let url = format!("{}/object/{}", self.storage_base(), self.config.bucket);
        let request = self
            .client
            .delete(url)
            .json(&json!({ "prefixes": paths }));
        Self::send(self.authorize(request, Some(session))).await?;
        Ok(())
    }

    async fn download(&self, url: &str) -> RemoteResult<Vec<u8>> {
        let response = Self::send(self.client.get(url)).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| RemoteError::Http(format!("Failed to read response bytes: {}", e)))?;
        Ok(bytes.to_vec())
    }

    async fn insert_photos(&self, session: &Session, rows: &[NewRemotePhoto]) -> RemoteResult<()> {
        let request = self
            .client
            .post(self.rest_url("photo"))
            .header("Prefer", "return=minimal")
            .json(rows);
        Self::send(self.authorize(request, Some(session))).await?;
        Ok(())
    }

    async fn delete_photos(&self, session: &Session, ids: &[i64]) -> RemoteResult<Vec<String>> {
        let request = self
            .client
            .delete(self.rest_url("photo"))
            .query(&[("id", id_list(ids)), ("select", "uri".to_string())])
            .header("Prefer", "return=representation");
        let rows: Vec<UriRow> = Self::send_json(self.authorize(request, Some(session))).await?;
        Ok(rows.into_iter().map(|row| row.uri).collect())
    }

    async fn insert_album_photos(
        &self,
        session: &Session,
        album_id: i64,
        photo_ids: &[i64],
    ) -> RemoteResult<()> {
        let rows: Vec<_> = photo_ids
            .iter()
            .map(|photo_id| json!({ "photo_id": photo_id, "album_id": album_id }))
            .collect();
        let request = self
            .client
            .post(self.rest_url("albumphoto"))
            .header("Prefer", "return=minimal,resolution=ignore-duplicates")
            .json(&rows);
        Self::send(self.authorize(request, Some(session))).await?;
        Ok(())
    }

    async fn delete_album_photos(
        &self,
        session: &Session,
        album_id: i64,
        photo_ids: &[i64],
    ) -> RemoteResult<()> {
        let request = self.client.delete(self.rest_url("albumphoto")).query(&[
            ("album_id", format!("eq.{}", album_id)),
            ("photo_id", id_list(photo_ids)),
        ]);
        Self::send(self.authorize(request, Some(session))).await?;
        Ok(())
    }

    async fn list_albums(&self, session: &Session) -> RemoteResult<Vec<RemoteAlbumRow>> {
        let request = self.client.get(self.rest_url("album")).query(&[
            ("select", "id,name,is_public,access_key,albumphoto(count)"),
            ("order", "name.asc"),
        ]);
        let rows: Vec<AlbumRowWithCount> =
            Self::send_json(self.authorize(request, Some(session))).await?;
        Ok(rows.into_iter().map(RemoteAlbumRow::from).collect())
    }

    async fn create_album(&self, session: &Session, name: &str, is_public: bool) -> RemoteResult<()> {
        let request = self
            .client
            .post(self.rest_url("album"))
            .header("Prefer", "return=minimal")
            .json(&json!({ "user_id": session.user_id(), "name": name, "is_public": is_public }));
        Self::send(self.authorize(request, Some(session))).await?;
        Ok(())
    }

    async fn delete_album(&self, session: &Session, album_id: i64) -> RemoteResult<()> {
        let request = self
            .client
            .delete(self.rest_url("album"))
            .query(&[("id", format!("eq.{}", album_id))]);
        Self::send(self.authorize(request, Some(session))).await?;
        Ok(())
    }

    async fn photos_by_access_key(
        &self,
        session: Option<&Session>,
        access_key: &str,
    ) -> RemoteResult<Vec<RemotePhotoRow>> {
        let request = self
            .client
            .post(self.rest_url("rpc/get_photos_by_access_key"))
            .json(&json!({ "p_access_key": access_key }));
        Self::send_json(self.authorize(request, session)).await
    }

    async fn album_name_by_access_key(
        &self,
        session: Option<&Session>,
        access_key: &str,
    ) -> RemoteResult<String> {
        let request = self
            .client
            .post(self.rest_url("rpc/get_album_name_by_access_key"))
            .json(&json!({ "p_access_key": access_key }));
        let name: Option<String> = Self::send_json(self.authorize(request, session)).await?;
        name.ok_or_else(|| RemoteError::Other("No album for this access key".to_string()))
    }

    async fn record_access_key(&self, session: &Session, access_key: &str) -> RemoteResult<()> {
        let request = self
            .client
            .put(format!("{}/auth/v1/user", self.base()))
            .json(&json!({ "data": { "access_key": access_key } }));
        Self::send(self.authorize(request, Some(session))).await?;
        Ok(())
    }
}
