//! Contact-centric record types shared by every stage of an import.
//!
//! All fields are plain strings as exported by the CRM; nothing is parsed or
//! validated. Records reference each other only through string identifiers
//! (owner id, related-to id) which are resolved by linear lookup.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub street1: String,
    pub street2: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country_code: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub name: String,
    pub website: String,
    pub annual_revenue: String,
    pub sic_code: String,
    pub physical: Address,
    pub mailing: Address,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: String,
    pub owner_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub alt_phone_number: String,
    pub tags: Vec<String>,
    pub company: Company,
}

impl Contact {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    pub name: String,
    pub probability: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    pub status: String,
    pub contact: Contact,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deal {
    pub stage: Stage,
    pub contact: Contact,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub owner_id: String,
    pub subject: String,
    pub due_date: String,
    pub related_to: String,
    pub related_to_id: String,
    pub status: String,
    pub priority: String,
    pub description: String,
    pub tags: Vec<String>,
}

/// Splits a CRM tag cell into individual tags.
///
/// Pieces are trimmed and empty pieces dropped, so an empty cell yields no
/// tags rather than a single empty tag.
pub fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .collect()
}

/// Loose contact fields used by the `add_*` builders.
#[derive(Debug, Clone, Default)]
pub struct ContactFields<'a> {
    pub id: &'a str,
    pub owner_id: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
    pub phone_number: &'a str,
}

impl ContactFields<'_> {
    fn into_contact(self, company: Company, tags: &[&str]) -> Contact {
        Contact {
            id: self.id.to_string(),
            owner_id: self.owner_id.to_string(),
            first_name: self.first_name.to_string(),
            last_name: self.last_name.to_string(),
            email: self.email.to_string(),
            phone_number: self.phone_number.to_string(),
            alt_phone_number: String::new(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            company,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contacts {
    pub contacts: Vec<Contact>,
}

impl Contacts {
    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Contact> {
        self.contacts.iter()
    }

    /// Keeps contacts carrying at least one of `tags`.
    pub fn filter_by_tags<S: AsRef<str>>(&self, tags: &[S]) -> Contacts {
        self.filter(|c| tags.iter().any(|tag| c.has_tag(tag.as_ref())))
    }

    pub fn filter_by_has_email(&self) -> Contacts {
        self.filter(|c| !c.email.is_empty())
    }

    pub fn filter_by_owner_id(&self, owner_id: &str) -> Contacts {
        self.filter(|c| c.owner_id == owner_id)
    }

    fn filter<F>(&self, keep: F) -> Contacts
    where
        F: Fn(&Contact) -> bool,
    {
        Contacts {
            contacts: self.contacts.iter().filter(|c| keep(c)).cloned().collect(),
        }
    }
}

impl Extend<Contact> for Contacts {
    fn extend<I: IntoIterator<Item = Contact>>(&mut self, iter: I) {
        self.contacts.extend(iter);
    }
}

impl FromIterator<Contact> for Contacts {
    fn from_iter<I: IntoIterator<Item = Contact>>(iter: I) -> Self {
        Contacts {
            contacts: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leads {
    pub leads: Vec<Lead>,
}

impl Leads {
    pub fn add_lead(&mut self, fields: ContactFields<'_>, company: Company, tags: &[&str]) {
        self.leads.push(Lead {
            status: String::new(),
            contact: fields.into_contact(company, tags),
        });
    }

    pub fn to_contacts(&self) -> Contacts {
        self.leads.iter().map(|l| l.contact.clone()).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deals {
    pub deals: Vec<Deal>,
}

impl Deals {
    pub fn add_deal(&mut self, fields: ContactFields<'_>, company: Company, tags: &[&str]) {
        self.deals.push(Deal {
            stage: Stage::default(),
            contact: fields.into_contact(company, tags),
        });
    }

    pub fn to_contacts(&self) -> Contacts {
        self.deals.iter().map(|d| d.contact.clone()).collect()
    }
}

/// Loose task fields used by [`Tasks::add_task`].
#[derive(Debug, Clone, Default)]
pub struct TaskFields<'a> {
    pub id: &'a str,
    pub owner_id: &'a str,
    pub subject: &'a str,
    pub due_date: &'a str,
    pub related_to: &'a str,
    pub related_to_id: &'a str,
    pub status: &'a str,
    pub priority: &'a str,
    pub description: &'a str,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tasks {
    pub tasks: Vec<Task>,
}

impl Tasks {
    pub fn add_task(&mut self, fields: TaskFields<'_>, tags: &[&str]) {
        self.tasks.push(Task {
            id: fields.id.to_string(),
            owner_id: fields.owner_id.to_string(),
            subject: fields.subject.to_string(),
            due_date: fields.due_date.to_string(),
            related_to: fields.related_to.to_string(),
            related_to_id: fields.related_to_id.to_string(),
            status: fields.status.to_string(),
            priority: fields.priority.to_string(),
            description: fields.description.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        });
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Users {
    pub users: Vec<User>,
}

impl Users {
    pub fn contains(&self, id: &str) -> bool {
        self.users.iter().any(|u| u.id == id)
    }

    /// Adds `user` unless a user with the same id is already known.
    pub fn add_if_unknown(&mut self, user: User) -> bool {
        if self.contains(&user.id) {
            return false;
        }
        self.users.push(user);
        true
    }
}
