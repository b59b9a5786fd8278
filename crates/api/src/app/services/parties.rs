use tracing::{info, warn};

use kirana_core::{CustomerId, StaffId, SupplierId, generate_reference};
use kirana_infra::StoreError;
use kirana_parties::{
    Customer, CustomerDraft, CustomerPatch, Staff, StaffDraft, StaffPatch, Supplier,
    SupplierDraft, SupplierPatch, choose_salesperson, next_staff_code,
};

use super::{AppServices, MAX_REFERENCE_ATTEMPTS, ServiceError, ServiceResult, load, remove};

const TOKEN_PREFIX: &str = "TKN";

// -------------------------
// Suppliers
// -------------------------

impl AppServices {
    /// Active suppliers, by name.
    pub async fn suppliers_list(&self) -> ServiceResult<Vec<Supplier>> {
        let mut suppliers: Vec<_> = self
            .stores
            .suppliers
            .list()
            .await?
            .into_iter()
            .filter(Supplier::is_active)
            .collect();
        suppliers.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(suppliers)
    }

    pub async fn suppliers_get(&self, id: SupplierId) -> ServiceResult<Supplier> {
        load(self.stores.suppliers.as_ref(), id, "supplier").await
    }

    pub async fn suppliers_create(&self, draft: SupplierDraft) -> ServiceResult<Supplier> {
        let supplier = Supplier::register(SupplierId::new(), draft, self.now())?;
        self.stores.suppliers.insert(supplier.clone()).await?;
        info!(supplier = %supplier.id_typed(), name = %supplier.name(), "supplier registered");
        Ok(supplier)
    }

    pub async fn suppliers_update(&self, id: SupplierId, patch: SupplierPatch) -> ServiceResult<Supplier> {
        let mut supplier = self.suppliers_get(id).await?;
        supplier.update(patch, self.now())?;
        self.stores.suppliers.update(supplier.clone()).await?;
        Ok(supplier)
    }

    /// Suppliers are deactivated rather than removed.
    pub async fn suppliers_deactivate(&self, id: SupplierId) -> ServiceResult<Supplier> {
        let supplier = self
            .suppliers_update(
                id,
                SupplierPatch {
                    is_active: Some(false),
                    ..SupplierPatch::default()
                },
            )
            .await?;
        info!(supplier = %id, "supplier deactivated");
        Ok(supplier)
    }
}

// -------------------------
// Staff
// -------------------------

impl AppServices {
    /// All staff, newest first.
    pub async fn staff_list(&self) -> ServiceResult<Vec<Staff>> {
        let mut staff = self.stores.staff.list().await?;
        staff.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(staff)
    }

    pub async fn staff_get(&self, id: StaffId) -> ServiceResult<Staff> {
        load(self.stores.staff.as_ref(), id, "staff member").await
    }

    /// Hire with the next free `STFnnnn` code.
    pub async fn staff_create(&self, draft: StaffDraft) -> ServiceResult<Staff> {
        let existing = self.stores.staff.list().await?;
        let code = next_staff_code(existing.iter().map(Staff::staff_code));
        let member = Staff::hire(StaffId::new(), code, draft, self.now())?;
        self.stores.staff.insert(member.clone()).await?;
        info!(
            staff = %member.id_typed(),
            staff_code = %member.staff_code(),
            role = ?member.role(),
            "staff member added"
        );
        Ok(member)
    }

    pub async fn staff_update(&self, id: StaffId, patch: StaffPatch) -> ServiceResult<Staff> {
        let mut member = self.staff_get(id).await?;
        member.update(patch, self.now())?;
        self.stores.staff.update(member.clone()).await?;
        Ok(member)
    }

    pub async fn staff_delete(&self, id: StaffId) -> ServiceResult<()> {
        remove(self.stores.staff.as_ref(), id, "staff member").await?;
        info!(staff = %id, "staff member deleted");
        Ok(())
    }

    /// Active Salespersons, by name.
    pub async fn available_salespersons(&self) -> ServiceResult<Vec<Staff>> {
        let mut staff: Vec<_> = self
            .stores
            .staff
            .list()
            .await?
            .into_iter()
            .filter(Staff::is_available_salesperson)
            .collect();
        staff.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(staff)
    }
}

// -------------------------
// Customers
// -------------------------

impl AppServices {
    /// All customers, newest first, with their assigned staff member when it still exists.
    pub async fn customers_list(&self) -> ServiceResult<Vec<(Customer, Option<Staff>)>> {
        let staff = self.stores.staff.list().await?;
        let mut customers = self.stores.customers.list().await?;
        customers.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(customers
            .into_iter()
            .map(|c| {
                let assigned = staff.iter().find(|s| s.id_typed() == c.assigned_staff()).cloned();
                (c, assigned)
            })
            .collect())
    }

    pub async fn customers_get(&self, id: CustomerId) -> ServiceResult<(Customer, Option<Staff>)> {
        let customer = load(self.stores.customers.as_ref(), id, "customer").await?;
        let assigned = self.stores.staff.get(customer.assigned_staff()).await?;
        Ok((customer, assigned))
    }

    /// Register a customer with a fresh token number and a Salesperson.
    pub async fn customers_create(&self, draft: CustomerDraft) -> ServiceResult<(Customer, Option<Staff>)> {
        let staff = self.stores.staff.list().await?;
        let assigned = choose_salesperson(&staff, draft.assigned_staff, &mut rand::thread_rng())?;

        for attempt in 1..=MAX_REFERENCE_ATTEMPTS {
            let now = self.now();
            let customer = Customer::register(
                CustomerId::new(),
                generate_reference(TOKEN_PREFIX, now),
                draft.clone(),
                assigned,
                now,
            )?;
            match self.stores.customers.insert(customer.clone()).await {
                Ok(()) => {
                    info!(
                        customer = %customer.id_typed(),
                        token_number = %customer.token_number(),
                        assigned_staff = %assigned,
                        "customer registered"
                    );
                    let member = staff.into_iter().find(|s| s.id_typed() == assigned);
                    return Ok((customer, member));
                }
                Err(StoreError::Conflict {
                    field: "token_number",
                    value,
                    ..
                }) => {
                    warn!(token_number = %value, attempt, "token number already taken; retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(ServiceError::Exhausted(format!(
            "no free token number after {MAX_REFERENCE_ATTEMPTS} attempts"
        )))
    }

    /// Without an explicit assignee the current one is kept while they are
    /// still an available Salesperson; otherwise one is picked at random.
    pub async fn customers_update(
        &self,
        id: CustomerId,
        patch: CustomerPatch,
    ) -> ServiceResult<(Customer, Option<Staff>)> {
        let mut customer = load(self.stores.customers.as_ref(), id, "customer").await?;
        let staff = self.stores.staff.list().await?;

        let current = customer.assigned_staff();
        let keep_current = staff
            .iter()
            .any(|s| s.id_typed() == current && s.is_available_salesperson());
        let requested = patch
            .assigned_staff
            .or(if keep_current { Some(current) } else { None });
        let assigned = choose_salesperson(&staff, requested, &mut rand::thread_rng())?;

        customer.update(patch, assigned, self.now())?;
        self.stores.customers.update(customer.clone()).await?;
        if assigned != current {
            info!(customer = %id, from = %current, to = %assigned, "customer reassigned");
        }

        let member = staff.into_iter().find(|s| s.id_typed() == assigned);
        Ok((customer, member))
    }

    pub async fn customers_delete(&self, id: CustomerId) -> ServiceResult<()> {
        remove(self.stores.customers.as_ref(), id, "customer").await?;
        info!(customer = %id, "customer deleted");
        Ok(())
    }
}
