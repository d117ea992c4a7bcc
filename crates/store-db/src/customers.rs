//! # Customer Store
//!
//! Customer records plus the purchase counter that drives tier
//! promotion.
//!
//! ## Tables
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  customers.txt        id,fullName,phone,TIER                            │
//! │  customer_stats.txt   id,count                                          │
//! │                                                                         │
//! │  record_purchase(id):                                                   │
//! │    count += 1  ──►  tier = tier-for-count  ──►  persist both tables    │
//! │                                                                         │
//! │  Promotion is monotonic: the counter only grows, and tier follows      │
//! │  the counter, so a customer never demotes.                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rows with too few columns are skipped, not fatal: the customer tables
//! are the ones most likely to be hand-edited.

use tokio::sync::Mutex;
use tracing::{info, warn};

use store_core::{Customer, Tier};

use crate::error::{StoreDbError, StoreDbResult};
use crate::line_store::{is_data_row, LineStore};

/// Store for customer records and their purchase counters.
#[derive(Debug)]
pub struct CustomerStore {
    customers: LineStore,
    stats: LineStore,
    lock: Mutex<()>,
}

impl CustomerStore {
    /// Creates a customer store over the two backing tables.
    pub fn new(customers: LineStore, stats: LineStore) -> Self {
        CustomerStore {
            customers,
            stats,
            lock: Mutex::new(()),
        }
    }

    /// Lists every customer, in file order. Malformed rows are skipped
    /// with a warning.
    pub async fn list_all(&self) -> StoreDbResult<Vec<Customer>> {
        let _guard = self.lock.lock().await;
        self.read_customers().await
    }

    /// Finds one customer by id.
    pub async fn find_by_id(&self, id: &str) -> StoreDbResult<Option<Customer>> {
        let _guard = self.lock.lock().await;
        Ok(self
            .read_customers()
            .await?
            .into_iter()
            .find(|c| c.id == id))
    }

    /// Registers a new customer with a zeroed purchase counter.
    ///
    /// Fails with `CustomerExists` when the id is already taken.
    pub async fn add(
        &self,
        id: &str,
        full_name: &str,
        phone: &str,
        tier: Tier,
    ) -> StoreDbResult<Customer> {
        let _guard = self.lock.lock().await;

        if self.read_customers().await?.iter().any(|c| c.id == id) {
            return Err(StoreDbError::CustomerExists(id.to_string()));
        }

        let customer = Customer {
            id: id.to_string(),
            full_name: full_name.to_string(),
            phone: phone.to_string(),
            tier,
        };

        let mut rows = self.customers.read_all().await?;
        rows.push(format_customer(&customer));
        self.customers.write_all(&rows).await?;

        let mut stats = self.stats.read_all().await?;
        stats.push(format!("{id},0"));
        self.stats.write_all(&stats).await?;

        info!(customer_id = %id, tier = %customer.tier, "customer registered");
        Ok(customer)
    }

    /// Inserts or replaces a customer row by id.
    ///
    /// A brand-new id also gets a zeroed stats row; an existing id keeps
    /// its counter untouched.
    pub async fn upsert(&self, customer: &Customer) -> StoreDbResult<()> {
        let _guard = self.lock.lock().await;

        let mut rows = self.customers.read_all().await?;
        let mut replaced = false;
        for row in rows.iter_mut() {
            if is_data_row(row) && row_id(row) == Some(customer.id.as_str()) {
                *row = format_customer(customer);
                replaced = true;
                break;
            }
        }
        if !replaced {
            rows.push(format_customer(customer));
        }
        self.customers.write_all(&rows).await?;

        if !replaced {
            let mut stats = self.stats.read_all().await?;
            stats.push(format!("{},0", customer.id));
            self.stats.write_all(&stats).await?;
        }
        Ok(())
    }

    /// Records one completed purchase for a customer and returns the
    /// tier they hold afterwards.
    ///
    /// Increments the purchase counter, derives the tier the new count
    /// earns, and rewrites the customer row only when the tier actually
    /// changed. A missing stats row counts as zero previous purchases.
    pub async fn record_purchase(&self, id: &str) -> StoreDbResult<Tier> {
        let _guard = self.lock.lock().await;

        let customers = self.read_customers().await?;
        let customer = customers
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| StoreDbError::CustomerNotFound(id.to_string()))?;

        let count = self.bump_counter(id).await?;
        // Never demote: a stored tier above what the counter earns
        // stays (counters can be reseeded, promotions cannot be lost).
        let earned = Tier::for_purchase_count(count).max(customer.tier);

        if earned != customer.tier {
            let mut rows = self.customers.read_all().await?;
            for row in rows.iter_mut() {
                if is_data_row(row) && row_id(row) == Some(id) {
                    let promoted = Customer {
                        tier: earned,
                        ..customer.clone()
                    };
                    *row = format_customer(&promoted);
                }
            }
            self.customers.write_all(&rows).await?;
            info!(
                customer_id = %id,
                purchases = count,
                tier = %earned,
                "customer promoted"
            );
        }
        Ok(earned)
    }

    // =========================================================================
    // Internals (lock assumed held)
    // =========================================================================

    async fn read_customers(&self) -> StoreDbResult<Vec<Customer>> {
        let rows = self.customers.read_all().await?;
        let mut customers = Vec::new();
        for row in rows.iter().filter(|r| is_data_row(r)) {
            match parse_customer(row) {
                Some(c) => customers.push(c),
                None => warn!(row = %row, "skipping malformed customer row"),
            }
        }
        Ok(customers)
    }

    /// Increments the stats counter for a customer and returns the new
    /// count, seeding a row when none exists.
    async fn bump_counter(&self, id: &str) -> StoreDbResult<i64> {
        let mut rows = self.stats.read_all().await?;
        let mut new_count = None;

        for row in rows.iter_mut() {
            if !is_data_row(row) || row_id(row) != Some(id) {
                continue;
            }
            let count: i64 = row
                .split(',')
                .nth(1)
                .and_then(|c| c.trim().parse().ok())
                .unwrap_or(0);
            let bumped = count + 1;
            *row = format!("{id},{bumped}");
            new_count = Some(bumped);
            break;
        }

        let count = match new_count {
            Some(c) => c,
            None => {
                rows.push(format!("{id},1"));
                1
            }
        };
        self.stats.write_all(&rows).await?;
        Ok(count)
    }
}

// =============================================================================
// Row Helpers
// =============================================================================

fn row_id(row: &str) -> Option<&str> {
    row.trim().split(',').next().map(str::trim)
}

/// Parses one `id,fullName,phone,TIER` row, or `None` when it has too
/// few columns. An unknown tier code falls back to `NEW`.
fn parse_customer(row: &str) -> Option<Customer> {
    let cells: Vec<&str> = row.trim().split(',').collect();
    if cells.len() < 4 {
        return None;
    }
    Some(Customer {
        id: cells[0].trim().to_string(),
        full_name: cells[1].trim().to_string(),
        phone: cells[2].trim().to_string(),
        tier: Tier::from_code(cells[3].trim()),
    })
}

fn format_customer(c: &Customer) -> String {
    format!("{},{},{},{}", c.id, c.full_name, c.phone, c.tier.code())
}

// =============================================================================
// Unit Tests
// =============================================================================
