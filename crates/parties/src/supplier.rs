use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use kirana_core::{DomainResult, Email, Entity, SupplierId, required_text};

/// Supplier contact record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supplier {
    id: SupplierId,
    name: String,
    email: Email,
    phone: String,
    branch: String,
    address: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    last_updated: DateTime<Utc>,
}

/// Input for registering a supplier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SupplierDraft {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub branch: String,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SupplierPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub branch: Option<String>,
    pub address: Option<String>,
    pub is_active: Option<bool>,
}

impl Supplier {
    pub fn register(id: SupplierId, draft: SupplierDraft, at: DateTime<Utc>) -> DomainResult<Self> {
        Ok(Self {
            id,
            name: required_text("supplier name", &draft.name)?,
            email: Email::parse(&draft.email)?,
            phone: required_text("phone number", &draft.phone)?,
            branch: required_text("branch", &draft.branch)?,
            address: draft.address.unwrap_or_default().trim().to_string(),
            is_active: true,
            created_at: at,
            last_updated: at,
        })
    }

    /// Apply a patch; nothing changes if any field is invalid.
    pub fn update(&mut self, patch: SupplierPatch, at: DateTime<Utc>) -> DomainResult<()> {
        let mut next = self.clone();
        if let Some(name) = patch.name {
            next.name = required_text("supplier name", &name)?;
        }
        if let Some(email) = patch.email {
            next.email = Email::parse(&email)?;
        }
        if let Some(phone) = patch.phone {
            next.phone = required_text("phone number", &phone)?;
        }
        if let Some(branch) = patch.branch {
            next.branch = required_text("branch", &branch)?;
        }
        if let Some(address) = patch.address {
            next.address = address.trim().to_string();
        }
        if let Some(is_active) = patch.is_active {
            next.is_active = is_active;
        }
        next.last_updated = at;
        *self = next;
        Ok(())
    }

    pub fn id_typed(&self) -> SupplierId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }
}

impl Entity for Supplier {
    type Id = SupplierId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
