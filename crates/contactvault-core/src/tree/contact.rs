//! Contact fields, their validation rules, and atomic construction/update.
//!
//! A contact is only ever created from a [`ContactDraft`] whose five fields
//! have all been validated, and only ever changed through a [`ContactUpdate`]
//! (or a single-field setter) that validates before touching anything.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use validator::ValidateEmail;

use super::item::validate_name;
use super::{TreeError, TreeResult};

/// How a contact relates to the address-book owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relation {
    Friend,
    Colleague,
    Network,
    Other,
}

impl Relation {
    pub const ALL: [Relation; 4] = [
        Relation::Friend,
        Relation::Colleague,
        Relation::Network,
        Relation::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Relation::Friend => "Friend",
            Relation::Colleague => "Colleague",
            Relation::Network => "Network",
            Relation::Other => "Other",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown relation name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown relation '{0}', expected friend|colleague|network|other")]
pub struct ParseRelationError(String);

impl FromStr for Relation {
    type Err = ParseRelationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Relation::ALL
            .into_iter()
            .find(|relation| relation.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseRelationError(s.to_string()))
    }
}

/// Contact fields that carry a non-empty requirement of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactField {
    FirstName,
    Company,
}

impl fmt::Display for ContactField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContactField::FirstName => f.write_str("first name"),
            ContactField::Company => f.write_str("company name"),
        }
    }
}

/// Contact-specific state. The contact's name lives in its `ItemMeta`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    pub(crate) first_name: String,
    pub(crate) company: String,
    pub(crate) relation: Relation,
    pub(crate) mail_address: String,
}

impl Contact {
    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn company(&self) -> &str {
        &self.company
    }

    pub fn relation(&self) -> Relation {
        self.relation
    }

    pub fn mail_address(&self) -> &str {
        &self.mail_address
    }
}

/// All five fields needed to create a contact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactDraft {
    pub name: String,
    pub first_name: String,
    pub company: String,
    pub relation: Relation,
    pub mail_address: String,
}

impl ContactDraft {
    pub fn new(
        name: impl Into<String>,
        first_name: impl Into<String>,
        company: impl Into<String>,
        relation: Relation,
        mail_address: impl Into<String>,
    ) -> Self {
        ContactDraft {
            name: name.into(),
            first_name: first_name.into(),
            company: company.into(),
            relation,
            mail_address: mail_address.into(),
        }
    }

    /// Validate every field. Nothing is built unless all of them pass.
    pub(crate) fn validate(&self) -> TreeResult<()> {
        validate_name(&self.name)?;
        validate_field(ContactField::FirstName, &self.first_name)?;
        validate_field(ContactField::Company, &self.company)?;
        validate_mail_address(&self.mail_address)
    }

    /// Split into the item name and the contact state.
    pub(crate) fn into_parts(self) -> (String, Contact) {
        (
            self.name,
            Contact {
                first_name: self.first_name,
                company: self.company,
                relation: self.relation,
                mail_address: self.mail_address,
            },
        )
    }
}

/// A partial change to a contact, applied all-or-nothing.
///
/// # Examples
///
/// ```
/// use contactvault_core::tree::{ContactUpdate, Relation};
///
/// let update = ContactUpdate::new()
///     .company("Initech")
///     .relation(Relation::Network);
/// assert!(!update.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactUpdate {
    pub name: Option<String>,
    pub first_name: Option<String>,
    pub company: Option<String>,
    pub relation: Option<Relation>,
    pub mail_address: Option<String>,
}

impl ContactUpdate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn first_name(mut self, first_name: impl Into<String>) -> Self {
        self.first_name = Some(first_name.into());
        self
    }

    #[must_use]
    pub fn company(mut self, company: impl Into<String>) -> Self {
        self.company = Some(company.into());
        self
    }

    #[must_use]
    pub fn relation(mut self, relation: Relation) -> Self {
        self.relation = Some(relation);
        self
    }

    #[must_use]
    pub fn mail_address(mut self, mail_address: impl Into<String>) -> Self {
        self.mail_address = Some(mail_address.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.first_name.is_none()
            && self.company.is_none()
            && self.relation.is_none()
            && self.mail_address.is_none()
    }

    pub(crate) fn validate(&self) -> TreeResult<()> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(first_name) = &self.first_name {
            validate_field(ContactField::FirstName, first_name)?;
        }
        if let Some(company) = &self.company {
            validate_field(ContactField::Company, company)?;
        }
        if let Some(mail_address) = &self.mail_address {
            validate_mail_address(mail_address)?;
        }
        Ok(())
    }

    /// Apply the contact-state part of the update. The name is applied by
    /// the caller, which owns the item metadata.
    pub(crate) fn apply_to(self, contact: &mut Contact) -> Option<String> {
        if let Some(first_name) = self.first_name {
            contact.first_name = first_name;
        }
        if let Some(company) = self.company {
            contact.company = company;
        }
        if let Some(relation) = self.relation {
            contact.relation = relation;
        }
        if let Some(mail_address) = self.mail_address {
            contact.mail_address = mail_address;
        }
        self.name
    }
}

pub(crate) fn validate_field(field: ContactField, value: &str) -> TreeResult<()> {
    if value.trim().is_empty() {
        return Err(TreeError::EmptyField(field));
    }
    Ok(())
}

pub(crate) fn validate_mail_address(value: &str) -> TreeResult<()> {
    if !value.validate_email() {
        return Err(TreeError::InvalidEmailFormat(value.to_string()));
    }
    Ok(())
}
