use chrono::{DateTime, Utc};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use kirana_core::{CustomerId, DomainError, DomainResult, Email, Entity, StaffId, required_text};

use crate::staff::Staff;

/// Walk-in or regular customer, served by one salesperson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    id: CustomerId,
    token_number: String,
    name: String,
    email: Option<Email>,
    phone: String,
    address: String,
    assigned_staff: StaffId,
    is_active: bool,
    notes: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CustomerDraft {
    pub name: String,
    pub email: Option<String>,
    pub phone: String,
    pub address: Option<String>,
    pub assigned_staff: Option<StaffId>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CustomerPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub assigned_staff: Option<StaffId>,
    pub is_active: Option<bool>,
    pub notes: Option<String>,
}

/// Resolve the salesperson serving a customer.
///
/// An explicit request must name a Salesperson. Without one, an active
/// Salesperson is picked at random.
pub fn choose_salesperson<R: Rng + ?Sized>(
    staff: &[Staff],
    requested: Option<StaffId>,
    rng: &mut R,
) -> DomainResult<StaffId> {
    match requested {
        Some(id) => {
            let member = staff
                .iter()
                .find(|s| s.id_typed() == id)
                .ok_or_else(|| DomainError::validation("assigned staff member does not exist"))?;
            if member.role() != crate::staff::StaffRole::Salesperson {
                return Err(DomainError::validation(
                    "only Salesperson role members can be assigned to customers",
                ));
            }
            Ok(id)
        }
        None => {
            let available: Vec<&Staff> =
                staff.iter().filter(|s| s.is_available_salesperson()).collect();
            available
                .choose(rng)
                .map(|s| s.id_typed())
                .ok_or_else(|| {
                    DomainError::validation("no available Salesperson found for assignment")
                })
        }
    }
}

fn optional_email(raw: Option<String>) -> DomainResult<Option<Email>> {
    match raw {
        Some(s) if !s.trim().is_empty() => Email::parse(&s).map(Some),
        _ => Ok(None),
    }
}

impl Customer {
    pub fn register(
        id: CustomerId,
        token_number: String,
        draft: CustomerDraft,
        assigned_staff: StaffId,
        at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        Ok(Self {
            id,
            token_number,
            name: required_text("name", &draft.name)?,
            email: optional_email(draft.email)?,
            phone: required_text("phone number", &draft.phone)?,
            address: draft.address.unwrap_or_default().trim().to_string(),
            assigned_staff,
            is_active: true,
            notes: draft.notes.unwrap_or_default().trim().to_string(),
            created_at: at,
            updated_at: at,
        })
    }

    /// Apply a patch. `assigned_staff` must already be resolved by the caller.
    pub fn update(
        &mut self,
        patch: CustomerPatch,
        assigned_staff: StaffId,
        at: DateTime<Utc>,
    ) -> DomainResult<()> {
        let mut next = self.clone();
        if let Some(name) = patch.name {
            next.name = required_text("name", &name)?;
        }
        if patch.email.is_some() {
            next.email = optional_email(patch.email)?;
        }
        if let Some(phone) = patch.phone {
            next.phone = required_text("phone number", &phone)?;
        }
        if let Some(address) = patch.address {
            next.address = address.trim().to_string();
        }
        if let Some(is_active) = patch.is_active {
            next.is_active = is_active;
        }
        if let Some(notes) = patch.notes {
            next.notes = notes.trim().to_string();
        }
        next.assigned_staff = assigned_staff;
        next.updated_at = at;
        *self = next;
        Ok(())
    }

    pub fn id_typed(&self) -> CustomerId {
        self.id
    }

    pub fn token_number(&self) -> &str {
        &self.token_number
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> Option<&Email> {
        self.email.as_ref()
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn assigned_staff(&self) -> StaffId {
        self.assigned_staff
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl Entity for Customer {
    type Id = CustomerId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
