//! Parties the shop deals with: suppliers, customers and staff.
//!
//! These are plain validated records (no command/event lifecycle). Suppliers
//! are only used as notification targets for replenishment orders.

pub mod customer;
pub mod staff;
pub mod supplier;

pub use customer::{Customer, CustomerDraft, CustomerPatch, choose_salesperson};
pub use staff::{Staff, StaffDraft, StaffPatch, StaffRole, next_staff_code};
pub use supplier::{Supplier, SupplierDraft, SupplierPatch};
