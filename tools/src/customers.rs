//! Customer database access

use anyhow::Result;
use rusqlite::Connection;
use std::path::Path;

/// SQLite-backed customer store
pub struct CustomerDb {
    conn: Connection,
}

impl CustomerDb {
    /// Open the database at the given path
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (tests)
    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    /// Create the customers table and seed a few demo rows
    pub fn init_demo(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS customers (
                id INTEGER PRIMARY KEY,
                firstname TEXT NOT NULL,
                lastname TEXT NOT NULL,
                email TEXT NOT NULL,
                city TEXT NOT NULL,
                birthdate TEXT NOT NULL,
                balance REAL NOT NULL
            );
            DELETE FROM customers;
            INSERT INTO customers (firstname, lastname, email, city, birthdate, balance) VALUES
                ('Ali', 'Mammadov', 'ali.mammadov@example.com', 'Baku', '1990-04-12', 120.0),
                ('Leyla', 'Aliyeva', 'leyla.aliyeva@example.com', 'Ganja', '1985-11-03', 2450.75),
                ('Vali', 'Huseynov', 'vali.huseynov@example.com', 'Sumqayit', '1998-07-21', 0.0);",
        )?;
        Ok(())
    }

    /// Retrieve user details by firstname, formatted as text.
    ///
    /// Lookup misses and database errors come back as text, not as errors:
    /// the model decides how to relay them to the end user.
    pub fn get_user_details(&self, username: &str) -> String {
        let result = self.conn.query_row(
            "SELECT id, firstname, lastname, email, city, birthdate, balance
             FROM customers WHERE firstname = ?1",
            [username],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, f64>(6)?,
                ))
            },
        );

        match result {
            Ok((id, firstname, lastname, email, city, birthdate, balance)) => format!(
                "User Details:\n\
                 ID: {}\n\
                 Name: {} {}\n\
                 Email: {}\n\
                 City: {}\n\
                 Birthdate: {}\n\
                 Balance: ${:.2}",
                id, firstname, lastname, email, city, birthdate, balance
            ),
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                format!("No user found with Username {}", username)
            }
            Err(e) => format!("Database error: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo_db() -> CustomerDb {
        let db = CustomerDb::open_in_memory().unwrap();
        db.init_demo().unwrap();
        db
    }

    #[test]
    fn formats_user_details() {
        let details = demo_db().get_user_details("Ali");
        assert!(details.starts_with("User Details:"));
        assert!(details.contains("Name: Ali Mammadov"));
        assert!(details.contains("Balance: $120.00"));
    }

    #[test]
    fn reports_missing_user_as_text() {
        let details = demo_db().get_user_details("Nobody");
        assert_eq!(details, "No user found with Username Nobody");
    }

    #[test]
    fn reports_database_error_as_text() {
        // No table created
        let db = CustomerDb::open_in_memory().unwrap();
        let details = db.get_user_details("Ali");
        assert!(details.starts_with("Database error:"));
    }
}
