//! The `import` command: read, join, persist, then optionally export and upload.

use std::path::Path;

use anyhow::{Context, Result, anyhow};
use encoding_rs::Encoding;
use log::{info, warn};

use crate::{
    cli::ImportArgs,
    config::{LakeConfig, UploadTarget},
    export,
    io_utils::{self, CsvTable},
    join::{self, DealSources},
    layout::{Layout, SourceKind},
    model::{Contacts, Deals, Leads, Tasks, Users},
    object_store::{self, HttpObjectStore, LocalObjectStore, ObjectStore},
    reader,
    store::DataLake,
};

/// Everything read during one import run.
#[derive(Debug, Default)]
pub struct ImportBatch {
    pub deals: Deals,
    pub leads: Leads,
    pub tasks: Tasks,
    pub users: Users,
}

impl ImportBatch {
    pub fn contacts(&self) -> Contacts {
        let mut contacts = self.deals.to_contacts();
        contacts.extend(self.leads.to_contacts().contacts);
        contacts
    }
}

pub struct Reader<'a> {
    layout: &'a Layout,
    delimiter: Option<u8>,
    encoding: &'static Encoding,
}

impl<'a> Reader<'a> {
    pub fn new(layout: &'a Layout, delimiter: Option<u8>, encoding: &'static Encoding) -> Self {
        Reader {
            layout,
            delimiter,
            encoding,
        }
    }

    fn read(&self, path: &Path) -> Result<CsvTable> {
        let delimiter = io_utils::resolve_input_delimiter(path, self.delimiter);
        info!(
            "Reading '{}' with delimiter '{}'",
            path.display(),
            crate::printable_delimiter(delimiter)
        );
        io_utils::read_table(path, delimiter, self.encoding)
    }

    pub fn read_deals(
        &self,
        deals: &Path,
        accounts: &Path,
        contacts: &Path,
        users: &mut Users,
    ) -> Result<Deals> {
        let deal_rows = self.read(deals)?;
        let account_rows = self.read(accounts)?;
        let contact_rows = self.read(contacts)?;
        join::join_deals(
            DealSources {
                deals: &deal_rows,
                accounts: &account_rows,
                contacts: &contact_rows,
            },
            self.layout,
            users,
        )
        .with_context(|| format!("Joining deals from {deals:?}"))
    }

    pub fn read_leads(&self, path: &Path) -> Result<Leads> {
        let table = self.read(path)?;
        let layout = self.layout.get(SourceKind::Lead).resolve(&table.headers)?;
        let mut leads = Leads::default();
        for (row_number, record) in table.numbered_rows() {
            let lead = reader::map_lead(&layout.row(record, row_number))
                .with_context(|| format!("Mapping lead in {path:?}"))?;
            leads.leads.push(lead);
        }
        Ok(leads)
    }

    pub fn read_tasks(&self, path: &Path) -> Result<Tasks> {
        let table = self.read(path)?;
        let layout = self.layout.get(SourceKind::Task).resolve(&table.headers)?;
        let mut tasks = Tasks::default();
        for (row_number, record) in table.numbered_rows() {
            let task = reader::map_task(&layout.row(record, row_number))
                .with_context(|| format!("Mapping task in {path:?}"))?;
            tasks.tasks.push(task);
        }
        Ok(tasks)
    }
}

/// Reads every configured input. Deals need their accounts and contacts exports.
pub fn read_inputs(config: &LakeConfig, layout: &Layout, delimiter: Option<u8>) -> Result<ImportBatch> {
    let encoding = io_utils::resolve_encoding(config.input_encoding.as_deref())?;
    let reader = Reader::new(layout, delimiter, encoding);
    let inputs = &config.inputs;
    let mut batch = ImportBatch::default();

    if let Some(deals) = &inputs.deals {
        let accounts = inputs
            .accounts
            .as_deref()
            .ok_or_else(|| anyhow!("Importing deals requires an accounts export"))?;
        let contacts = inputs
            .contacts
            .as_deref()
            .ok_or_else(|| anyhow!("Importing deals requires a contacts export"))?;
        batch.deals = reader.read_deals(deals, accounts, contacts, &mut batch.users)?;
    }
    if let Some(leads) = &inputs.leads {
        batch.leads = reader.read_leads(leads)?;
        info!("Read {} lead(s)", batch.leads.leads.len());
    }
    if let Some(tasks) = &inputs.tasks {
        batch.tasks = reader.read_tasks(tasks)?;
        info!("Read {} task(s)", batch.tasks.tasks.len());
    }
    Ok(batch)
}

pub fn persist(lake: &DataLake, batch: &ImportBatch) -> Result<()> {
    let deals = lake.insert_deals(&batch.deals.deals)?;
    let leads = lake.insert_leads(&batch.leads.leads)?;
    let tasks = lake.insert_tasks(&batch.tasks.tasks)?;
    let users = lake.insert_users(&batch.users.users)?;
    for (name, summary) in [
        ("deal", deals),
        ("lead", leads),
        ("task", tasks),
        ("user", users),
    ] {
        info!(
            "Stored {} new {name}(s), {} already present",
            summary.inserted, summary.skipped
        );
    }
    Ok(())
}

pub fn open_object_store(target: &UploadTarget) -> Result<Box<dyn ObjectStore>> {
    let store: Box<dyn ObjectStore> = match target {
        UploadTarget::Directory { path } => Box::new(LocalObjectStore::new(path)?),
        UploadTarget::Http { endpoint, bucket } => {
            Box::new(HttpObjectStore::new(endpoint, bucket)?)
        }
    };
    Ok(store)
}

pub fn execute(args: &ImportArgs, mut config: LakeConfig) -> Result<()> {
    config.apply_import_args(args)?;
    let layout = match &config.layout {
        Some(path) => Layout::load(path)?,
        None => Layout::default(),
    };
    if config.inputs.deals.is_none() && config.inputs.leads.is_none() && config.inputs.tasks.is_none() {
        warn!("No inputs configured; nothing to import");
    }

    let batch = read_inputs(&config, &layout, args.delimiter)?;
    let lake = DataLake::open(&config.store)?;
    persist(&lake, &batch)?;
    lake.close()?;

    if let Some(path) = &config.export {
        export::export_contacts_csv(&batch.contacts(), Some(path.as_path()), b',')
            .with_context(|| format!("Exporting contacts to {path:?}"))?;
    }
    if let Some(target) = &config.upload {
        let store = open_object_store(target)?;
        object_store::upload_deals(store.as_ref(), &batch.deals.deals)?;
        object_store::upload_leads(store.as_ref(), &batch.leads.leads)?;
    }
    info!("Import into {:?} complete", config.store);
    Ok(())
}
