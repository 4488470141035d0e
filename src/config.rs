//! Run configuration.
//!
//! Values come from three layers, later ones winning: built-in defaults
//! (the dated exports in `~/Downloads` and a lake under the temp dir), an
//! optional YAML file passed with `--config`, and command-line flags.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::cli::{ImportArgs, InputKind, UploadTargetArgs};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputPaths {
    pub deals: Option<PathBuf>,
    pub accounts: Option<PathBuf>,
    pub contacts: Option<PathBuf>,
    pub leads: Option<PathBuf>,
    pub tasks: Option<PathBuf>,
}

impl Default for InputPaths {
    fn default() -> Self {
        let downloads = dirs::home_dir()
            .map(|home| home.join("Downloads"))
            .unwrap_or_else(|| PathBuf::from("Downloads"));
        let file = |name: &str| Some(downloads.join(name));
        InputPaths {
            deals: file("Deals_2024_07_01.csv"),
            accounts: file("Accounts_2024_07_22.csv"),
            contacts: file("Contacts_2024_07_01.csv"),
            leads: file("Leads_2024_07_01.csv"),
            tasks: file("Tasks_2024_07_01.csv"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum UploadTarget {
    Directory { path: PathBuf },
    Http { endpoint: String, bucket: String },
}

impl UploadTarget {
    pub fn from_args(args: &UploadTargetArgs) -> Result<Option<Self>> {
        match (&args.bucket_dir, &args.endpoint, &args.bucket) {
            (Some(path), None, _) => Ok(Some(UploadTarget::Directory { path: path.clone() })),
            (None, Some(endpoint), Some(bucket)) => Ok(Some(UploadTarget::Http {
                endpoint: endpoint.clone(),
                bucket: bucket.clone(),
            })),
            (None, Some(_), None) => Err(anyhow!("--endpoint requires --bucket")),
            (None, None, Some(_)) => Err(anyhow!("--bucket requires --endpoint")),
            (Some(_), Some(_), _) => Err(anyhow!(
                "--bucket-dir cannot be combined with --endpoint"
            )),
            (None, None, None) => Ok(None),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LakeConfig {
    pub store: PathBuf,
    pub inputs: InputPaths,
    pub layout: Option<PathBuf>,
    pub export: Option<PathBuf>,
    pub upload: Option<UploadTarget>,
    pub input_encoding: Option<String>,
}

impl Default for LakeConfig {
    fn default() -> Self {
        LakeConfig {
            store: default_store_root(),
            inputs: InputPaths::default(),
            layout: None,
            export: None,
            upload: None,
            input_encoding: None,
        }
    }
}

pub fn default_store_root() -> PathBuf {
    std::env::temp_dir().join("crm-lake")
}

impl LakeConfig {
    pub fn from_yaml_str(input: &str) -> Result<Self> {
        serde_yaml::from_str(input).context("Parsing config YAML")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Opening config file {path:?}"))?;
        Self::from_yaml_str(&raw).with_context(|| format!("Loading config from {path:?}"))
    }

    /// Loads `path` when given, falling back to the defaults.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn apply_store(&mut self, store: Option<&Path>) {
        if let Some(store) = store {
            self.store = store.to_path_buf();
        }
    }

    pub fn apply_import_args(&mut self, args: &ImportArgs) -> Result<()> {
        self.apply_store(args.store.as_deref());
        let overrides = [
            (&mut self.inputs.deals, &args.deals),
            (&mut self.inputs.accounts, &args.accounts),
            (&mut self.inputs.contacts, &args.contacts),
            (&mut self.inputs.leads, &args.leads),
            (&mut self.inputs.tasks, &args.tasks),
        ];
        for (slot, value) in overrides {
            if let Some(path) = value {
                *slot = Some(path.clone());
            }
        }
        for kind in &args.skip {
            match kind {
                InputKind::Deals => self.inputs.deals = None,
                InputKind::Leads => self.inputs.leads = None,
                InputKind::Tasks => self.inputs.tasks = None,
            }
        }
        if args.layout.is_some() {
            self.layout = args.layout.clone();
        }
        if args.export.is_some() {
            self.export = args.export.clone();
        }
        if args.input_encoding.is_some() {
            self.input_encoding = args.input_encoding.clone();
        }
        if let Some(target) = UploadTarget::from_args(&args.upload)? {
            self.upload = Some(target);
        }
        Ok(())
    }
}
