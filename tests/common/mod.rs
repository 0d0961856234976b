#![allow(dead_code)]

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use image_upload_gateway::config::{GatewayConfig, MULTIPLE_IMAGE_BUCKET, SINGLE_IMAGE_BUCKET};
use image_upload_gateway::services::storage::ObjectStore;
use image_upload_gateway::{AppState, create_app};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;

/// In-memory object store with switches for injecting failures
#[derive(Default)]
pub struct MemoryStore {
    buckets: Mutex<HashMap<String, BTreeMap<String, Vec<u8>>>>,
    pub create_calls: AtomicUsize,
    pub fail_bucket_check: AtomicBool,
    pub fail_list: AtomicBool,
    failing_presign: Mutex<HashSet<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store with both gateway buckets already present
    pub fn provisioned() -> Self {
        let store = Self::new();
        {
            let mut buckets = store.buckets.lock().unwrap();
            buckets.insert(SINGLE_IMAGE_BUCKET.to_string(), BTreeMap::new());
            buckets.insert(MULTIPLE_IMAGE_BUCKET.to_string(), BTreeMap::new());
        }
        store
    }

    pub fn bucket_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.buckets.lock().unwrap().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn insert(&self, bucket: &str, key: &str, data: &[u8]) {
        self.buckets
            .lock()
            .unwrap()
            .entry(bucket.to_string())
            .or_default()
            .insert(key.to_string(), data.to_vec());
    }

    pub fn get(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.buckets
            .lock()
            .unwrap()
            .get(bucket)
            .and_then(|objects| objects.get(key).cloned())
    }

    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.buckets
            .lock()
            .unwrap()
            .get(bucket)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn fail_presign_for(&self, key: &str) {
        self.failing_presign.lock().unwrap().insert(key.to_string());
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn bucket_exists(&self, bucket: &str) -> anyhow::Result<bool> {
        if self.fail_bucket_check.load(Ordering::SeqCst) {
            anyhow::bail!("connect ECONNREFUSED 127.0.0.1:9000");
        }
        Ok(self.buckets.lock().unwrap().contains_key(bucket))
    }

    async fn create_bucket(&self, bucket: &str, _region: &str) -> anyhow::Result<()> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.buckets
            .lock()
            .unwrap()
            .entry(bucket.to_string())
            .or_default();
        Ok(())
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: ByteStream,
        content_length: i64,
    ) -> anyhow::Result<()> {
        let data = body.collect().await?.into_bytes().to_vec();
        anyhow::ensure!(
            data.len() as i64 == content_length,
            "content length mismatch: declared {}, got {}",
            content_length,
            data.len()
        );

        let mut buckets = self.buckets.lock().unwrap();
        let objects = buckets
            .get_mut(bucket)
            .ok_or_else(|| anyhow::anyhow!("NoSuchBucket: {}", bucket))?;
        objects.insert(key.to_string(), data);
        Ok(())
    }

    async fn list_objects(&self, bucket: &str, prefix: &str) -> anyhow::Result<Vec<String>> {
        if self.fail_list.load(Ordering::SeqCst) {
            anyhow::bail!("AccessDenied");
        }
        let buckets = self.buckets.lock().unwrap();
        let objects = buckets
            .get(bucket)
            .ok_or_else(|| anyhow::anyhow!("NoSuchBucket: {}", bucket))?;
        Ok(objects
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn presigned_get_url(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> anyhow::Result<String> {
        if self.failing_presign.lock().unwrap().contains(key) {
            anyhow::bail!("presign failed for {}", key);
        }
        Ok(format!(
            "http://store.test/{}/{}?X-Amz-Expires={}&X-Amz-Signature=mock",
            bucket,
            key,
            expires_in.as_secs()
        ))
    }
}

pub fn app_with(store: Arc<MemoryStore>, staging_dir: &Path) -> Router {
    let state = AppState::new(store, GatewayConfig::with_staging_dir(staging_dir));
    create_app(state)
}

pub enum Part<'a> {
    File {
        field: &'a str,
        filename: &'a str,
        content: &'a [u8],
    },
    Text {
        name: &'a str,
        value: &'a str,
    },
}

pub const BOUNDARY: &str = "---------------------------123456789012345678901234567";

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::File {
                field,
                filename,
                content,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n",
                        field, filename
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(content);
            }
            Part::Text { name, value } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"\r\n\r\n{}",
                        name, value
                    )
                    .as_bytes(),
                );
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub async fn post_multipart(app: &Router, uri: &str, parts: &[Part<'_>]) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap();

    send(app, request).await
}

pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    send(app, request).await
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap_or_else(|_| {
        panic!(
            "non-JSON body with status {}: {:?}",
            status,
            String::from_utf8_lossy(&body)
        )
    });
    (status, json)
}

/// Regular files directly inside the staging directory
pub fn staged_files(staging_dir: &Path) -> Vec<String> {
    match std::fs::read_dir(staging_dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_file())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect(),
        Err(_) => Vec::new(),
    }
}
