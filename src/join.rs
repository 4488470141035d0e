//! Denormalizes deal rows against account and contact rows.
//!
//! Each deal scans the full account list and the full contact list, comparing
//! foreign keys by string equality. When several rows share a key the last one
//! wins. Unmatched keys leave the company or contact empty.

use anyhow::{Context, Result};
use log::{debug, info};

use crate::{
    io_utils::CsvTable,
    layout::{Layout, SourceKind},
    model::{Company, Contact, Deal, Deals, Users},
    reader::{map_account, map_contact, map_contact_owner, map_deal_stage},
};

/// The three exports a deal import reads.
#[derive(Debug, Clone, Copy)]
pub struct DealSources<'a> {
    pub deals: &'a CsvTable,
    pub accounts: &'a CsvTable,
    pub contacts: &'a CsvTable,
}

/// Registers the owner of every contact row in `users`; the first row seen for
/// an owner id wins.
pub fn collect_users(contacts: &CsvTable, layout: &Layout, users: &mut Users) -> Result<usize> {
    let contact_layout = layout
        .get(SourceKind::Contact)
        .resolve(&contacts.headers)?;
    let mut added = 0usize;
    for (row_number, record) in contacts.numbered_rows() {
        let user = map_contact_owner(&contact_layout.row(record, row_number))?;
        if users.add_if_unknown(user) {
            added += 1;
        }
    }
    Ok(added)
}

pub fn join_deals(sources: DealSources<'_>, layout: &Layout, users: &mut Users) -> Result<Deals> {
    let deal_layout = layout
        .get(SourceKind::Deal)
        .resolve(&sources.deals.headers)
        .context("Resolving deal columns")?;
    let account_layout = layout
        .get(SourceKind::Account)
        .resolve(&sources.accounts.headers)
        .context("Resolving account columns")?;
    let contact_layout = layout
        .get(SourceKind::Contact)
        .resolve(&sources.contacts.headers)
        .context("Resolving contact columns")?;

    let new_users = collect_users(sources.contacts, layout, users)
        .context("Collecting contact owners")?;
    debug!("Collected {new_users} new user(s) from contact owners");

    let mut deals = Deals::default();
    let mut unmatched_accounts = 0usize;
    let mut unmatched_contacts = 0usize;

    for (row_number, record) in sources.deals.numbered_rows() {
        let deal_row = deal_layout.row(record, row_number);
        let stage = map_deal_stage(&deal_row).with_context(|| format!("Deal row {row_number}"))?;
        let account_id = deal_row.str("account_id")?;
        let contact_id = deal_row.str("contact_id")?;

        let mut company: Option<Company> = None;
        for (account_row, account) in sources.accounts.numbered_rows() {
            let row = account_layout.row(account, account_row);
            if row.str("id")? == account_id {
                company = Some(
                    map_account(&row).with_context(|| format!("Account row {account_row}"))?,
                );
            }
        }
        if company.is_none() {
            debug!("Deal row {row_number}: no account with id '{account_id}'");
            unmatched_accounts += 1;
        }
        let company = company.unwrap_or_default();

        let mut contact: Option<Contact> = None;
        for (contact_row, candidate) in sources.contacts.numbered_rows() {
            let row = contact_layout.row(candidate, contact_row);
            if row.str("id")? == contact_id {
                contact = Some(
                    map_contact(&row, company.clone())
                        .with_context(|| format!("Contact row {contact_row}"))?,
                );
            }
        }
        if contact.is_none() {
            debug!("Deal row {row_number}: no contact with id '{contact_id}'");
            unmatched_contacts += 1;
        }

        deals.deals.push(Deal {
            stage,
            contact: contact.unwrap_or_default(),
        });
    }

    info!(
        "Joined {} deal(s) ({} without account, {} without contact)",
        deals.deals.len(),
        unmatched_accounts,
        unmatched_contacts
    );
    Ok(deals)
}
