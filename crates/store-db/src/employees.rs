//! # Employee Directory
//!
//! Read-only lookup of staff accounts for login. Row format:
//!
//! `employeeId,username,passwordHash,role,BRANCH,accountNumber,phone`
//!
//! The hash cell is a lowercase hex SHA-256 digest of the password; the
//! comparison happens in the server's auth layer, not here. Rows with
//! too few columns are skipped with a warning.

use tracing::warn;

use store_core::Employee;

use crate::error::StoreDbResult;
use crate::line_store::{is_data_row, LineStore};

/// Directory of staff accounts. Never written by the server.
#[derive(Debug)]
pub struct EmployeeDirectory {
    table: LineStore,
}

impl EmployeeDirectory {
    pub fn new(table: LineStore) -> Self {
        EmployeeDirectory { table }
    }

    /// Finds an employee by exact username.
    pub async fn find_by_username(&self, username: &str) -> StoreDbResult<Option<Employee>> {
        let rows = self.table.read_all().await?;
        for row in rows.iter().filter(|r| is_data_row(r)) {
            match parse_employee(row) {
                Some(e) if e.username == username => return Ok(Some(e)),
                Some(_) => {}
                None => warn!(row = %row, "skipping malformed employee row"),
            }
        }
        Ok(None)
    }
}

/// Parses one directory row, or `None` when it has too few columns or
/// an unknown branch code.
fn parse_employee(row: &str) -> Option<Employee> {
    let cells: Vec<&str> = row.trim().split(',').collect();
    if cells.len() < 7 {
        return None;
    }
    Some(Employee {
        id: cells[0].trim().to_string(),
        username: cells[1].trim().to_string(),
        password_hash: cells[2].trim().to_string(),
        role: cells[3].trim().to_string(),
        branch: cells[4].trim().parse().ok()?,
        account_number: cells[5].trim().to_string(),
        phone: cells[6].trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use store_core::Branch;

    #[tokio::test]
    async fn test_find_by_username() {
        let dir = tempfile::tempdir().unwrap();
        let table = LineStore::new(dir.path().join("employees.txt"));
        table
            .write_all(&[
                "# staff".to_string(),
                "E1,yossi,abc123,CASHIER,HOLON,1001,0501112222".to_string(),
                "E2,rina,def456,SHIFT_MANAGER,TEL_AVIV,1002,0503334444".to_string(),
            ])
            .await
            .unwrap();
        let directory = EmployeeDirectory::new(table);

        let yossi = directory.find_by_username("yossi").await.unwrap().unwrap();
        assert_eq!(yossi.branch, Branch::Holon);
        assert_eq!(yossi.password_hash, "abc123");

        assert!(directory.find_by_username("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_malformed_rows_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let table = LineStore::new(dir.path().join("employees.txt"));
        table
            .write_all(&[
                "short,row".to_string(),
                "E9,bad-branch,h,CASHIER,NOWHERE,1,0".to_string(),
                "E2,rina,def456,SHIFT_MANAGER,TEL_AVIV,1002,0503334444".to_string(),
            ])
            .await
            .unwrap();
        let directory = EmployeeDirectory::new(table);

        assert!(directory.find_by_username("bad-branch").await.unwrap().is_none());
        assert!(directory.find_by_username("rina").await.unwrap().is_some());
    }
}
