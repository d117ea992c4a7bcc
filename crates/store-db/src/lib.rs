//! # store-db: Flat-File Persistence for the Branch Store Server
//!
//! Every table the server touches lives here, behind a store type that
//! owns its locking and its row format.
//!
//! ## Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         store-db crate                                  │
//! │                                                                         │
//! │  ┌──────────────┐   ┌───────────────┐   ┌────────────────────────┐    │
//! │  │ LineStore    │◄──│ InventoryStore │   │ data/products.txt      │    │
//! │  │ (primitive)  │◄──│ CustomerStore  │──►│ data/customers.txt     │    │
//! │  │ read_all /   │◄──│ EmployeeDir    │   │ data/customer_stats.txt│    │
//! │  │ write_all    │   └───────────────┘   │ data/employees.txt     │    │
//! │  └──────────────┘                        └────────────────────────┘    │
//! │                                                                         │
//! │  Each mutating store holds its own tokio Mutex; a whole operation      │
//! │  (read, mutate, rewrite) happens under one lock hold.                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`line_store`] - The read-whole/write-whole file primitive
//! - [`inventory`] - Stock levels, atomic multi-line sale commit
//! - [`customers`] - Customer records and tier promotion
//! - [`employees`] - Read-only staff directory for login
//! - [`error`] - Persistence and domain-lookup errors

pub mod customers;
pub mod employees;
pub mod error;
pub mod inventory;
pub mod line_store;

pub use customers::CustomerStore;
pub use employees::EmployeeDirectory;
pub use error::{StoreDbError, StoreDbResult};
pub use inventory::InventoryStore;
pub use line_store::{is_data_row, LineStore};
