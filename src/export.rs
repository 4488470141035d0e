use std::path::Path;

use anyhow::{Context, Result};
use itertools::Itertools;
use log::info;

use crate::{
    cli::{ContactSource, ExportArgs},
    config::LakeConfig,
    io_utils,
    model::{Address, Contact, Contacts},
    store::DataLake,
};

pub const CONTACT_HEADERS: &[&str] = &[
    "Id",
    "OwnerId",
    "FirstName",
    "LastName",
    "Email",
    "PhoneNumber",
    "AltPhoneNumber",
    "Tags",
    "Company Name",
    "Website",
    "Annual Revenue",
    "Sic Code",
    "Physical Street1",
    "Physical Street2",
    "Physical City",
    "Physical State",
    "Physical Zip",
    "Physical Country Code",
    "Mailing Street1",
    "Mailing Street2",
    "Mailing City",
    "Mailing State",
    "Mailing Zip",
    "Mailing Country Code",
];

fn address_cells(address: &Address) -> [String; 6] {
    [
        address.street1.clone(),
        address.street2.clone(),
        address.city.clone(),
        address.state.clone(),
        address.zip.clone(),
        address.country_code.to_string(),
    ]
}

pub fn contact_row(contact: &Contact) -> Vec<String> {
    let company = &contact.company;
    let mut row = vec![
        contact.id.clone(),
        contact.owner_id.clone(),
        contact.first_name.clone(),
        contact.last_name.clone(),
        contact.email.clone(),
        contact.phone_number.clone(),
        contact.alt_phone_number.clone(),
        contact.tags.iter().join(","),
        company.name.clone(),
        company.website.clone(),
        company.annual_revenue.clone(),
        company.sic_code.clone(),
    ];
    row.extend(address_cells(&company.physical));
    row.extend(address_cells(&company.mailing));
    row
}

/// Writes `contacts` to `path` (stdout for `None` or `-`). Returns the row count.
pub fn export_contacts_csv(contacts: &Contacts, path: Option<&Path>, delimiter: u8) -> Result<usize> {
    let mut writer = io_utils::open_csv_writer(path, delimiter)?;
    writer
        .write_record(CONTACT_HEADERS)
        .context("Writing export headers")?;
    for contact in contacts.iter() {
        writer
            .write_record(contact_row(contact))
            .with_context(|| format!("Writing contact '{}'", contact.id))?;
    }
    writer.flush().context("Flushing contact export")?;
    info!(
        "Exported {} contact(s) to {}",
        contacts.len(),
        path.map(|p| format!("{p:?}"))
            .unwrap_or_else(|| "stdout".to_string())
    );
    Ok(contacts.len())
}

/// Reads contacts of the selected kind back from the lake.
pub fn stored_contacts(lake: &DataLake, from: ContactSource) -> Result<Contacts> {
    let mut contacts = Contacts::default();
    if matches!(from, ContactSource::Deals | ContactSource::All) {
        contacts.extend(lake.all_deals()?.into_iter().map(|d| d.contact));
    }
    if matches!(from, ContactSource::Leads | ContactSource::All) {
        contacts.extend(lake.all_leads()?.into_iter().map(|l| l.contact));
    }
    Ok(contacts)
}

pub fn apply_filters(contacts: Contacts, args: &ExportArgs) -> Contacts {
    let mut selected = contacts;
    if !args.tags.is_empty() {
        selected = selected.filter_by_tags(args.tags.as_slice());
    }
    if args.has_email {
        selected = selected.filter_by_has_email();
    }
    if let Some(owner) = &args.owner {
        selected = selected.filter_by_owner_id(owner);
    }
    selected
}

pub fn execute(args: &ExportArgs, mut config: LakeConfig) -> Result<()> {
    config.apply_store(args.store.as_deref());
    let lake = DataLake::open_existing(&config.store)?;
    let contacts = stored_contacts(&lake, args.from)?;
    let total = contacts.len();
    let selected = apply_filters(contacts, args);
    info!("Selected {} of {} stored contact(s)", selected.len(), total);
    export_contacts_csv(
        &selected,
        args.output.as_deref(),
        args.delimiter.unwrap_or(io_utils::DEFAULT_CSV_DELIMITER),
    )?;
    lake.close()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Company;

    #[test]
    fn contact_row_matches_header_width() {
        let contact = Contact {
            id: "C1".into(),
            tags: vec!["vip".into(), "west".into()],
            company: Company {
                name: "Acme".into(),
                mailing: Address {
                    city: "Salem".into(),
                    country_code: 1,
                    ..Address::default()
                },
                ..Company::default()
            },
            ..Contact::default()
        };
        let row = contact_row(&contact);
        assert_eq!(row.len(), CONTACT_HEADERS.len());
        assert_eq!(row[7], "vip,west");
        assert_eq!(row[8], "Acme");
        assert_eq!(row[17], "0");
        assert_eq!(row[20], "Salem");
        assert_eq!(row[23], "1");
    }
}
