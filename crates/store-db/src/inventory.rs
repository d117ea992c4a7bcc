//! # Inventory Store
//!
//! Catalog of stock-keeping units per branch, backed by the `products`
//! line-store table.
//!
//! ## Concurrency Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    One Lock, Whole Operations                           │
//! │                                                                         │
//! │  connection A: SELL_MULTI ──► commit_sale() ─┐                          │
//! │  connection B: SELL_MULTI ──► commit_sale() ─┤  one async Mutex         │
//! │  connection C: BUY        ──► adjust_qty()  ─┘  serializes the table    │
//! │                                                                         │
//! │  commit_sale validates stock AND decrements inside a single lock       │
//! │  hold, so two concurrent carts can never jointly oversell a SKU.       │
//! │  (A check in one call and a decrement in another would leave a         │
//! │  window between them - that window does not exist here.)               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Row Format
//! `sku,category,BRANCH,quantity,price` - blank lines and `#` comments are
//! preserved across rewrites; a malformed data row fails the operation.

use tokio::sync::Mutex;
use tracing::{debug, info};

use store_core::{Branch, Money, Product};

use crate::error::{StoreDbError, StoreDbResult};
use crate::line_store::{is_data_row, LineStore};

/// Store for product rows and stock levels.
///
/// Every read parses the table fresh; there is no in-memory cache of
/// domain state, so reads always reflect current on-disk content.
#[derive(Debug)]
pub struct InventoryStore {
    table: LineStore,
    lock: Mutex<()>,
}

impl InventoryStore {
    /// Creates an inventory store over the given table file.
    pub fn new(table: LineStore) -> Self {
        InventoryStore {
            table,
            lock: Mutex::new(()),
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Lists every product of a branch, in file order.
    ///
    /// Fresh parse per call: two consecutive calls with no intervening
    /// mutation return identical sequences.
    pub async fn list_by_branch(&self, branch: Branch) -> StoreDbResult<Vec<Product>> {
        let _guard = self.lock.lock().await;
        let lines = self.table.read_all().await?;
        let mut products = Vec::new();
        for line in lines.iter().filter(|l| is_data_row(l)) {
            let product = parse_row(line)?;
            if product.branch == branch {
                products.push(product);
            }
        }
        Ok(products)
    }

    /// Finds a single product by SKU within a branch.
    pub async fn find_by_sku(&self, branch: Branch, sku: &str) -> StoreDbResult<Option<Product>> {
        Ok(self
            .list_by_branch(branch)
            .await?
            .into_iter()
            .find(|p| p.sku == sku))
    }

    /// Finds the cheapest in-stock product of a category (or none).
    ///
    /// Category match is case-insensitive; only rows with quantity > 0
    /// qualify. `consume_one_in_category` makes its pick through the
    /// same scan.
    pub async fn find_cheapest_in_category(
        &self,
        branch: Branch,
        category: &str,
    ) -> StoreDbResult<Option<Product>> {
        let _guard = self.lock.lock().await;
        let lines = self.table.read_all().await?;
        cheapest_in_lines(&lines, branch, category)
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Adjusts stock for one SKU by a signed delta, clamping at zero.
    ///
    /// Persists the full table and returns the updated product. Fails
    /// with `SkuNotFound` if the SKU does not exist in that branch.
    pub async fn adjust_quantity(
        &self,
        branch: Branch,
        sku: &str,
        delta: i64,
    ) -> StoreDbResult<Product> {
        let _guard = self.lock.lock().await;
        let mut lines = self.table.read_all().await?;
        let updated = adjust_in_lines(&mut lines, branch, sku, delta)?;
        self.table.write_all(&lines).await?;

        if delta > 0 {
            info!(
                branch = %branch,
                sku = %sku,
                quantity = delta,
                new_stock = updated.quantity,
                "stock ordered"
            );
        } else if delta < 0 {
            info!(
                branch = %branch,
                sku = %sku,
                quantity = -delta,
                new_stock = updated.quantity,
                "stock sold"
            );
        }
        Ok(updated)
    }

    /// Commits a whole sale: validates stock for every line and
    /// decrements, all inside one critical section.
    ///
    /// ## All-or-Nothing
    /// If any line references an unknown SKU or exceeds available stock,
    /// NOTHING is written and the error names the offending SKU. On
    /// success every line's stock decreases by exactly its requested
    /// quantity, persisted in a single table rewrite.
    pub async fn commit_sale(
        &self,
        branch: Branch,
        requested: &[(String, i64)],
    ) -> StoreDbResult<Vec<Product>> {
        let _guard = self.lock.lock().await;
        let mut lines = self.table.read_all().await?;

        // Validate every line before touching any quantity. The lock is
        // held across validation and commit, so this check is
        // authoritative even under concurrent carts.
        for (sku, qty) in requested {
            let product = find_in_lines(&lines, branch, sku)?.ok_or_else(|| {
                StoreDbError::SkuNotFound {
                    branch,
                    sku: sku.clone(),
                }
            })?;
            if !product.can_sell(*qty) {
                return Err(StoreDbError::InsufficientStock {
                    sku: sku.clone(),
                    available: product.quantity,
                    requested: *qty,
                });
            }
        }

        let mut snapshots = Vec::with_capacity(requested.len());
        for (sku, qty) in requested {
            snapshots.push(adjust_in_lines(&mut lines, branch, sku, -qty)?);
        }
        self.table.write_all(&lines).await?;

        info!(
            branch = %branch,
            lines = requested.len(),
            "sale committed"
        );
        Ok(snapshots)
    }

    /// Consumes one unit of the cheapest in-stock product in a category.
    ///
    /// Returns `false` when the category has no stock. Best-effort by
    /// contract: gift consumption never fails a sale, so callers treat
    /// `Ok(false)` as "promised but out of stock".
    pub async fn consume_one_in_category(
        &self,
        branch: Branch,
        category: &str,
    ) -> StoreDbResult<bool> {
        let _guard = self.lock.lock().await;
        let mut lines = self.table.read_all().await?;

        let Some(pick) = cheapest_in_lines(&lines, branch, category)? else {
            debug!(branch = %branch, category = %category, "no unit available to consume");
            return Ok(false);
        };

        adjust_in_lines(&mut lines, branch, &pick.sku, -1)?;
        self.table.write_all(&lines).await?;
        info!(branch = %branch, sku = %pick.sku, category = %category, "consumed one unit");
        Ok(true)
    }
}

// =============================================================================
// Row Helpers
// =============================================================================

/// Parses one `sku,category,BRANCH,quantity,price` row.
fn parse_row(line: &str) -> StoreDbResult<Product> {
    let malformed = || StoreDbError::MalformedRow {
        table: "products".to_string(),
        row: line.to_string(),
    };

    let cells: Vec<&str> = line.trim().split(',').collect();
    if cells.len() < 5 {
        return Err(malformed());
    }
    Ok(Product {
        sku: cells[0].to_string(),
        category: cells[1].to_string(),
        branch: cells[2].parse()?,
        quantity: cells[3].parse().map_err(|_| malformed())?,
        price: cells[4].parse::<Money>()?,
    })
}

/// Formats a product back into its table row.
fn format_row(p: &Product) -> String {
    format!(
        "{},{},{},{},{}",
        p.sku, p.category, p.branch, p.quantity, p.price
    )
}

/// The cheapest in-stock product of a category among raw table lines.
/// Case-insensitive category match; zero-quantity rows never qualify.
fn cheapest_in_lines(
    lines: &[String],
    branch: Branch,
    category: &str,
) -> StoreDbResult<Option<Product>> {
    let mut cheapest: Option<Product> = None;
    for line in lines.iter().filter(|l| is_data_row(l)) {
        let product = parse_row(line)?;
        if product.branch == branch
            && product.category.eq_ignore_ascii_case(category)
            && product.quantity > 0
            && cheapest.as_ref().map_or(true, |c| product.price < c.price)
        {
            cheapest = Some(product);
        }
    }
    Ok(cheapest)
}

/// Finds a product among raw table lines without mutating anything.
fn find_in_lines(lines: &[String], branch: Branch, sku: &str) -> StoreDbResult<Option<Product>> {
    for line in lines.iter().filter(|l| is_data_row(l)) {
        let product = parse_row(line)?;
        if product.branch == branch && product.sku == sku {
            return Ok(Some(product));
        }
    }
    Ok(None)
}

/// Applies a quantity delta to the matching row in place, clamped at
/// zero. The quantity-never-negative invariant is enforced here, at the
/// single point where rows are rewritten.
fn adjust_in_lines(
    lines: &mut [String],
    branch: Branch,
    sku: &str,
    delta: i64,
) -> StoreDbResult<Product> {
    for line in lines.iter_mut() {
        if !is_data_row(line) {
            continue;
        }
        let product = parse_row(line)?;
        if product.branch == branch && product.sku == sku {
            let updated = Product {
                quantity: product.quantity.saturating_add(delta).max(0),
                ..product
            };
            *line = format_row(&updated);
            return Ok(updated);
        }
    }
    Err(StoreDbError::SkuNotFound {
        branch,
        sku: sku.to_string(),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
