//! Row-to-record mapping for each export kind.

use crate::{
    error::MappingError,
    layout::MappedRow,
    model::{Address, Company, Contact, Lead, Stage, Task, User, split_tags},
};

/// Company columns of an account row.
pub fn map_account(row: &MappedRow<'_>) -> Result<Company, MappingError> {
    Ok(Company {
        name: row.get("name")?,
        website: row.get("website")?,
        annual_revenue: row.get("annual_revenue")?,
        sic_code: row.get("sic_code")?,
        ..Company::default()
    })
}

pub fn map_contact(row: &MappedRow<'_>, company: Company) -> Result<Contact, MappingError> {
    Ok(Contact {
        id: row.get("id")?,
        owner_id: row.get("owner_id")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        email: row.get("email")?,
        phone_number: row.get("phone_number")?,
        alt_phone_number: row.get("alt_phone_number")?,
        tags: split_tags(row.str("tags")?),
        company,
    })
}

/// The owner of a contact row, as a CRM user.
pub fn map_contact_owner(row: &MappedRow<'_>) -> Result<User, MappingError> {
    Ok(User {
        id: row.get("owner_id")?,
        name: row.get("owner_name")?,
        email: String::new(),
    })
}

pub fn map_lead(row: &MappedRow<'_>) -> Result<Lead, MappingError> {
    let company = Company {
        name: row.get("company")?,
        website: row.get("website")?,
        annual_revenue: row.get("annual_revenue")?,
        sic_code: String::new(),
        physical: Address {
            street1: row.get("street")?,
            city: row.get("city")?,
            state: row.get("state")?,
            zip: row.get("zip")?,
            ..Address::default()
        },
        mailing: Address {
            street1: row.get("mailing_street")?,
            city: row.get("mailing_city")?,
            state: row.get("mailing_state")?,
            zip: row.get("mailing_zip")?,
            ..Address::default()
        },
    };
    Ok(Lead {
        status: row.get("status")?,
        contact: Contact {
            id: row.get("id")?,
            owner_id: row.get("owner_id")?,
            first_name: row.get("first_name")?,
            last_name: row.get("last_name")?,
            email: row.get("email")?,
            phone_number: row.get("phone_number")?,
            alt_phone_number: row.get("alt_phone_number")?,
            tags: split_tags(row.str("tags")?),
            company,
        },
    })
}

pub fn map_task(row: &MappedRow<'_>) -> Result<Task, MappingError> {
    Ok(Task {
        id: row.get("id")?,
        owner_id: row.get("owner_id")?,
        subject: row.get("subject")?,
        due_date: row.get("due_date")?,
        related_to: row.get("related_to")?,
        related_to_id: row.get("related_to_id")?,
        status: row.get("status")?,
        priority: row.get("priority")?,
        description: row.get("description")?,
        tags: split_tags(row.str("tags")?),
    })
}

pub fn map_deal_stage(row: &MappedRow<'_>) -> Result<Stage, MappingError> {
    Ok(Stage {
        name: row.get("stage")?,
        probability: row.get("probability")?,
    })
}
