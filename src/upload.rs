use anyhow::{Result, anyhow};
use log::info;

use crate::{
    cli::{UploadArgs, UploadKind},
    config::{LakeConfig, UploadTarget},
    import::open_object_store,
    object_store,
    store::DataLake,
};

pub fn execute(args: &UploadArgs, mut config: LakeConfig) -> Result<()> {
    config.apply_store(args.store.as_deref());
    let target = match UploadTarget::from_args(&args.target)? {
        Some(target) => target,
        None => config
            .upload
            .clone()
            .ok_or_else(|| anyhow!("Provide --bucket-dir or --endpoint/--bucket"))?,
    };
    let lake = DataLake::open_existing(&config.store)?;
    let store = open_object_store(&target)?;
    let uploaded = match args.kind {
        UploadKind::Deals => object_store::upload_deals(store.as_ref(), &lake.all_deals()?)?,
        UploadKind::Leads => object_store::upload_leads(store.as_ref(), &lake.all_leads()?)?,
    };
    info!("Uploaded {uploaded} record(s) from {:?}", config.store);
    lake.close()
}
