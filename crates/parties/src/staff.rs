use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use kirana_core::{DomainResult, Email, Entity, StaffId, required_text};

const STAFF_CODE_PREFIX: &str = "STF";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StaffRole {
    Cashier,
    #[default]
    Salesperson,
}

/// Shop staff member. Carries no credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Staff {
    id: StaffId,
    staff_code: String,
    name: String,
    email: Email,
    role: StaffRole,
    phone: String,
    address: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StaffDraft {
    pub name: String,
    pub email: String,
    pub role: Option<StaffRole>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StaffPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<StaffRole>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub is_active: Option<bool>,
}

/// Next sequential code: one past the highest `STFnnnn` in use, starting at `STF0001`.
pub fn next_staff_code<'a>(existing: impl IntoIterator<Item = &'a str>) -> String {
    let highest = existing
        .into_iter()
        .filter_map(|code| code.strip_prefix(STAFF_CODE_PREFIX))
        .filter_map(|digits| digits.parse::<u32>().ok())
        .max()
        .unwrap_or(0);
    format!("{STAFF_CODE_PREFIX}{:04}", highest + 1)
}

impl Staff {
    pub fn hire(
        id: StaffId,
        staff_code: String,
        draft: StaffDraft,
        at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        Ok(Self {
            id,
            staff_code,
            name: required_text("name", &draft.name)?,
            email: Email::parse(&draft.email)?,
            role: draft.role.unwrap_or_default(),
            phone: draft.phone.unwrap_or_default().trim().to_string(),
            address: draft.address.unwrap_or_default().trim().to_string(),
            is_active: true,
            created_at: at,
            updated_at: at,
        })
    }

    pub fn update(&mut self, patch: StaffPatch, at: DateTime<Utc>) -> DomainResult<()> {
        let mut next = self.clone();
        if let Some(name) = patch.name {
            next.name = required_text("name", &name)?;
        }
        if let Some(email) = patch.email {
            next.email = Email::parse(&email)?;
        }
        if let Some(role) = patch.role {
            next.role = role;
        }
        if let Some(phone) = patch.phone {
            next.phone = phone.trim().to_string();
        }
        if let Some(address) = patch.address {
            next.address = address.trim().to_string();
        }
        if let Some(is_active) = patch.is_active {
            next.is_active = is_active;
        }
        next.updated_at = at;
        *self = next;
        Ok(())
    }

    pub fn id_typed(&self) -> StaffId {
        self.id
    }

    pub fn staff_code(&self) -> &str {
        &self.staff_code
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn role(&self) -> StaffRole {
        self.role
    }

    pub fn phone(&self) -> &str {
        &self.phone
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

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_available_salesperson(&self) -> bool {
        self.is_active && self.role == StaffRole::Salesperson
    }
}

impl Entity for Staff {
    type Id = StaffId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
