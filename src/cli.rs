use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(author, version, about = "Import CRM exports into a local contact lake", long_about = None)]
pub struct Cli {
    /// Optional YAML config file (store root, inputs, layout, export, upload)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Read deal, lead and task exports and store them in the lake
    Import(ImportArgs),
    /// Export lead or deal contacts from the lake to CSV
    Export(ExportArgs),
    /// Upload lead or deal records from the lake to object storage
    Upload(UploadArgs),
    /// Show a single stored record as a field/value table
    Show(ShowArgs),
    /// List the CRM users collected during import
    Users(UsersArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "kebab-case")]
pub enum InputKind {
    Deals,
    Leads,
    Tasks,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "kebab-case")]
pub enum ContactSource {
    Leads,
    Deals,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "kebab-case")]
pub enum RecordKind {
    Lead,
    Deal,
    Task,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "kebab-case")]
pub enum UploadKind {
    Leads,
    Deals,
}

#[derive(Debug, Clone, Default, Args)]
pub struct UploadTargetArgs {
    /// Directory used as a bucket, one file per object
    #[arg(long = "bucket-dir")]
    pub bucket_dir: Option<PathBuf>,
    /// HTTP object storage endpoint accepting PUT requests
    #[arg(long)]
    pub endpoint: Option<String>,
    /// Bucket name used with --endpoint
    #[arg(long)]
    pub bucket: Option<String>,
}

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// Deals export
    #[arg(long)]
    pub deals: Option<PathBuf>,
    /// Accounts export joined into deals
    #[arg(long)]
    pub accounts: Option<PathBuf>,
    /// Contacts export joined into deals
    #[arg(long)]
    pub contacts: Option<PathBuf>,
    /// Leads export
    #[arg(long)]
    pub leads: Option<PathBuf>,
    /// Tasks export
    #[arg(long)]
    pub tasks: Option<PathBuf>,
    /// Input kinds to leave out of this run
    #[arg(long, value_enum, value_delimiter = ',')]
    pub skip: Vec<InputKind>,
    /// Root directory of the key-value lake
    #[arg(short, long)]
    pub store: Option<PathBuf>,
    /// YAML file remapping export columns
    #[arg(long)]
    pub layout: Option<PathBuf>,
    /// Also write every imported contact to this CSV file
    #[arg(long)]
    pub export: Option<PathBuf>,
    #[command(flatten)]
    pub upload: UploadTargetArgs,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input files (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Which stored records to export contacts from
    #[arg(long, value_enum, default_value = "all")]
    pub from: ContactSource,
    /// Root directory of the key-value lake
    #[arg(short, long)]
    pub store: Option<PathBuf>,
    /// Destination CSV file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Keep contacts carrying any of these tags
    #[arg(long = "tag", value_delimiter = ',')]
    pub tags: Vec<String>,
    /// Keep contacts with an email address
    #[arg(long = "has-email")]
    pub has_email: bool,
    /// Keep contacts owned by this user id
    #[arg(long)]
    pub owner: Option<String>,
    /// Delimiter for the output file
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
}

#[derive(Debug, Args)]
pub struct UploadArgs {
    /// Which stored records to upload
    #[arg(long, value_enum)]
    pub kind: UploadKind,
    /// Root directory of the key-value lake
    #[arg(short, long)]
    pub store: Option<PathBuf>,
    #[command(flatten)]
    pub target: UploadTargetArgs,
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Record kind to look up
    #[arg(long, value_enum)]
    pub kind: RecordKind,
    /// Record id (contact id for leads and deals)
    #[arg(long)]
    pub id: String,
    /// Root directory of the key-value lake
    #[arg(short, long)]
    pub store: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct UsersArgs {
    /// Root directory of the key-value lake
    #[arg(short, long)]
    pub store: Option<PathBuf>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
