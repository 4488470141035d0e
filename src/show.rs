//! Read-only lookups against the lake: `show` and `users`.

use anyhow::{Result, anyhow};
use itertools::Itertools;
use log::info;

use crate::{
    cli::{RecordKind, ShowArgs, UsersArgs},
    config::LakeConfig,
    model::{Contact, Deal, Lead, Task, Users},
    store::DataLake,
    table,
};

fn contact_fields(contact: &Contact) -> Vec<(&'static str, String)> {
    let company = &contact.company;
    vec![
        ("id", contact.id.clone()),
        ("owner_id", contact.owner_id.clone()),
        ("first_name", contact.first_name.clone()),
        ("last_name", contact.last_name.clone()),
        ("email", contact.email.clone()),
        ("phone_number", contact.phone_number.clone()),
        ("alt_phone_number", contact.alt_phone_number.clone()),
        ("tags", contact.tags.iter().join(",")),
        ("company", company.name.clone()),
        ("website", company.website.clone()),
        ("annual_revenue", company.annual_revenue.clone()),
        ("sic_code", company.sic_code.clone()),
        ("street", company.physical.street1.clone()),
        ("city", company.physical.city.clone()),
        ("state", company.physical.state.clone()),
        ("zip", company.physical.zip.clone()),
        ("mailing_street", company.mailing.street1.clone()),
        ("mailing_city", company.mailing.city.clone()),
        ("mailing_state", company.mailing.state.clone()),
        ("mailing_zip", company.mailing.zip.clone()),
    ]
}

pub fn lead_fields(lead: &Lead) -> Vec<(&'static str, String)> {
    let mut fields = vec![("status", lead.status.clone())];
    fields.extend(contact_fields(&lead.contact));
    fields
}

pub fn deal_fields(deal: &Deal) -> Vec<(&'static str, String)> {
    let mut fields = vec![
        ("stage", deal.stage.name.clone()),
        ("probability", deal.stage.probability.clone()),
    ];
    fields.extend(contact_fields(&deal.contact));
    fields
}

pub fn task_fields(task: &Task) -> Vec<(&'static str, String)> {
    vec![
        ("id", task.id.clone()),
        ("owner_id", task.owner_id.clone()),
        ("subject", task.subject.clone()),
        ("due_date", task.due_date.clone()),
        ("related_to", task.related_to.clone()),
        ("related_to_id", task.related_to_id.clone()),
        ("status", task.status.clone()),
        ("priority", task.priority.clone()),
        ("description", task.description.clone()),
        ("tags", task.tags.iter().join(",")),
    ]
}

pub fn render_record(lake: &DataLake, kind: RecordKind, id: &str) -> Result<Option<String>> {
    let fields = match kind {
        RecordKind::Lead => lake.get_lead_by_id(id)?.map(|l| lead_fields(&l)),
        RecordKind::Deal => lake.get_deal_by_id(id)?.map(|d| deal_fields(&d)),
        RecordKind::Task => lake.get_task_by_id(id)?.map(|t| task_fields(&t)),
    };
    Ok(fields.map(|f| table::render_fields(&f)))
}

pub fn render_users(users: &Users) -> String {
    let rows: Vec<Vec<String>> = users
        .users
        .iter()
        .map(|u| vec![u.id.clone(), u.name.clone(), u.email.clone()])
        .collect();
    table::render_table(&["id", "name", "email"], &rows)
}

pub fn execute(args: &ShowArgs, mut config: LakeConfig) -> Result<()> {
    config.apply_store(args.store.as_deref());
    let lake = DataLake::open_existing(&config.store)?;
    let rendered = render_record(&lake, args.kind, &args.id)?
        .ok_or_else(|| anyhow!("No {:?} stored under id '{}'", args.kind, args.id))?;
    print!("{rendered}");
    lake.close()
}

pub fn execute_users(args: &UsersArgs, mut config: LakeConfig) -> Result<()> {
    config.apply_store(args.store.as_deref());
    let lake = DataLake::open_existing(&config.store)?;
    let users = lake.list_users()?;
    print!("{}", render_users(&users));
    info!("Listed {} user(s)", users.users.len());
    lake.close()
}
