//! Write-through of records to object storage.
//!
//! Objects are keyed by contact id and carry the JSON encoding of a single
//! record. Two backends exist: a local directory acting as a bucket, and an
//! HTTP endpoint accepting `PUT {endpoint}/{bucket}/{key}`.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result, anyhow};
use log::{debug, info, warn};
use reqwest::Url;
use serde::Serialize;

use crate::model::{Deal, Lead};

/// Keys name a single object: no separators and no relative segments.
fn check_key(key: &str) -> Result<()> {
    if key.is_empty() || key.contains(['/', '\\']) || key == "." || key == ".." {
        return Err(anyhow!("Object key '{key}' is not a valid object name"));
    }
    Ok(())
}

pub trait ObjectStore {
    fn put(&self, key: &str, body: &[u8]) -> Result<()>;

    fn describe(&self) -> String;
}

#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: &Path) -> Result<Self> {
        fs::create_dir_all(root).with_context(|| format!("Creating bucket directory {root:?}"))?;
        Ok(LocalObjectStore {
            root: root.to_path_buf(),
        })
    }

    pub fn object_path(&self, key: &str) -> Result<PathBuf> {
        check_key(key)?;
        Ok(self.root.join(key))
    }
}

impl ObjectStore for LocalObjectStore {
    fn put(&self, key: &str, body: &[u8]) -> Result<()> {
        let path = self.object_path(key)?;
        fs::write(&path, body).with_context(|| format!("Writing object {path:?}"))
    }

    fn describe(&self) -> String {
        format!("directory {:?}", self.root)
    }
}

pub struct HttpObjectStore {
    client: reqwest::blocking::Client,
    endpoint: Url,
    bucket: String,
}

impl HttpObjectStore {
    pub fn new(endpoint: &str, bucket: &str) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Building HTTP client")?;
        Self::with_client(client, endpoint, bucket)
    }

    pub fn with_client(
        client: reqwest::blocking::Client,
        endpoint: &str,
        bucket: &str,
    ) -> Result<Self> {
        let bucket = bucket.trim();
        if bucket.is_empty() {
            return Err(anyhow!("Bucket name cannot be empty"));
        }
        let endpoint =
            Url::parse(endpoint).with_context(|| format!("Parsing endpoint '{endpoint}'"))?;
        if endpoint.cannot_be_a_base() {
            return Err(anyhow!("Endpoint '{endpoint}' cannot hold object paths"));
        }
        Ok(HttpObjectStore {
            client,
            endpoint,
            bucket: bucket.to_string(),
        })
    }

    /// `{endpoint}/{bucket}/{key}` with bucket and key percent-encoded as path segments.
    pub fn object_url(&self, key: &str) -> Result<Url> {
        check_key(key)?;
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("Endpoint '{}' cannot hold object paths", self.endpoint))?
            .pop_if_empty()
            .push(&self.bucket)
            .push(key);
        Ok(url)
    }
}

impl ObjectStore for HttpObjectStore {
    fn put(&self, key: &str, body: &[u8]) -> Result<()> {
        let url = self.object_url(key)?;
        let response = self
            .client
            .put(url.clone())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body.to_vec())
            .send()
            .with_context(|| format!("Uploading {url}"))?;
        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("Upload of {url} failed with status {status}"));
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("bucket '{}' at {}", self.bucket, self.endpoint)
    }
}

fn upload_each<T, F>(store: &dyn ObjectStore, records: &[T], key_of: F) -> Result<usize>
where
    T: Serialize,
    F: Fn(&T) -> &str,
{
    let mut uploaded = 0usize;
    for record in records {
        let key = key_of(record);
        if key.is_empty() {
            warn!("Skipping record without a contact id");
            continue;
        }
        let body = serde_json::to_vec(record).context("Encoding object body")?;
        debug!("PUT {key} ({} bytes)", body.len());
        store.put(key, &body)?;
        uploaded += 1;
    }
    info!("Uploaded {uploaded} object(s) to {}", store.describe());
    Ok(uploaded)
}

pub fn upload_deals(store: &dyn ObjectStore, deals: &[Deal]) -> Result<usize> {
    upload_each(store, deals, |d| d.contact.id.as_str())
}

pub fn upload_leads(store: &dyn ObjectStore, leads: &[Lead]) -> Result<usize> {
    upload_each(store, leads, |l| l.contact.id.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        cell::RefCell,
        io::{BufRead, BufReader, Read, Write},
        net::TcpListener,
        thread,
    };

    use crate::model::Contact;

    #[derive(Default)]
    struct RecordingStore {
        puts: RefCell<Vec<(String, Vec<u8>)>>,
    }

    impl ObjectStore for RecordingStore {
        fn put(&self, key: &str, body: &[u8]) -> Result<()> {
            self.puts.borrow_mut().push((key.to_string(), body.to_vec()));
            Ok(())
        }

        fn describe(&self) -> String {
            "memory".to_string()
        }
    }

    fn lead(id: &str) -> Lead {
        Lead {
            status: "New".into(),
            contact: Contact {
                id: id.into(),
                ..Contact::default()
            },
        }
    }

    #[test]
    fn each_object_holds_exactly_one_record() {
        let store = RecordingStore::default();
        let uploaded = upload_leads(&store, &[lead("L1"), lead(""), lead("L2")]).unwrap();
        assert_eq!(uploaded, 2);
        let puts = store.puts.borrow();
        assert_eq!(puts.len(), 2);
        assert_eq!(puts[1].0, "L2");
        let decoded: Lead = serde_json::from_slice(&puts[1].1).unwrap();
        assert_eq!(decoded, lead("L2"));
    }

    #[test]
    fn local_store_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path()).unwrap();
        assert!(store.put("../escape", b"{}").is_err());
        assert!(store.put("", b"{}").is_err());
        store.put("C1", b"{}").unwrap();
        assert!(dir.path().join("C1").exists());
    }

    #[test]
    fn http_urls_join_endpoint_bucket_and_key() {
        let store = HttpObjectStore::new("http://localhost:9000/", "crm").unwrap();
        assert_eq!(
            store.object_url("C1").unwrap().as_str(),
            "http://localhost:9000/crm/C1"
        );
        assert_eq!(
            store.object_url("C 1?#x").unwrap().as_str(),
            "http://localhost:9000/crm/C%201%3F%23x"
        );
        assert!(store.object_url("a/b").is_err());
        assert!(store.object_url("..").is_err());
        assert!(store.object_url("").is_err());
    }

    /// Accepts one request on a loopback port, answers with `status` and
    /// hands back the request head and body.
    fn serve_once(status: &'static str) -> (String, thread::JoinHandle<(String, String)>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let endpoint = format!("http://{}", listener.local_addr().unwrap());
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut head = String::new();
            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if line.is_empty() || line == "\r\n" {
                    break;
                }
                if let Some(value) = line.to_ascii_lowercase().strip_prefix("content-length:") {
                    content_length = value.trim().parse().unwrap();
                }
                head.push_str(&line);
            }
            let mut body = vec![0u8; content_length];
            reader.read_exact(&mut body).unwrap();
            write!(
                stream,
                "HTTP/1.1 {status}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
            )
            .unwrap();
            (head, String::from_utf8(body).unwrap())
        });
        (endpoint, handle)
    }

    fn loopback_store(endpoint: &str) -> HttpObjectStore {
        let client = reqwest::blocking::Client::builder()
            .no_proxy()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap();
        HttpObjectStore::with_client(client, endpoint, "crm").unwrap()
    }

    #[test]
    fn http_store_puts_json_under_bucket_and_key() {
        let (endpoint, server) = serve_once("200 OK");
        let store = loopback_store(&endpoint);

        let uploaded = upload_leads(&store, &[lead("L1")]).unwrap();
        assert_eq!(uploaded, 1);

        let (head, body) = server.join().unwrap();
        assert!(head.starts_with("PUT /crm/L1 HTTP/1.1\r\n"), "{head}");
        assert!(head.to_ascii_lowercase().contains("content-type: application/json"));
        let decoded: Lead = serde_json::from_str(&body).unwrap();
        assert_eq!(decoded, lead("L1"));
    }

    #[test]
    fn http_store_reports_failed_status() {
        let (endpoint, server) = serve_once("500 Internal Server Error");
        let store = loopback_store(&endpoint);

        let err = upload_leads(&store, &[lead("L1")]).unwrap_err();
        assert!(err.to_string().contains("failed with status 500"), "{err:#}");
        let (head, _) = server.join().unwrap();
        assert!(head.starts_with("PUT /crm/L1 "));
    }
}
