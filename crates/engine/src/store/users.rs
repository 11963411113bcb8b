// users table access. Authentication is out of engine scope; the engine
// seeds the tenant admin and answers notification lookups.

use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::error::Result;
use folium_common::types::User;

pub struct UserStore;

impl UserStore {
    pub fn insert(
        conn: &Connection,
        name: &str,
        email: &str,
        password_hash: &str,
        is_admin: bool,
    ) -> Result<User> {
        let user = User {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            is_admin,
        };
        conn.execute(
            "INSERT INTO users (id, name, email, password_hash, is_admin) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![user.id, user.name, user.email, user.password_hash, user.is_admin],
        )?;
        Ok(user)
    }

    pub fn get_by_name(conn: &Connection, name: &str) -> Result<Option<User>> {
        let user = conn
            .query_row(
                "SELECT id, name, email, password_hash, is_admin FROM users WHERE name = ?1",
                params![name],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    pub fn list(conn: &Connection) -> Result<Vec<User>> {
        let mut stmt = conn.prepare(
            "SELECT id, name, email, password_hash, is_admin FROM users ORDER BY name ASC",
        )?;
        let rows = stmt.query_map([], row_to_user)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Email addresses for the named users, skipping unknown names.
    pub fn emails_for_names(conn: &Connection, names: &[String]) -> Result<Vec<String>> {
        let mut emails = Vec::new();
        for name in names {
            if let Some(user) = Self::get_by_name(conn, name)? {
                if !emails.contains(&user.email) {
                    emails.push(user.email);
                }
            }
        }
        Ok(emails)
    }
}

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        is_admin: row.get(4)?,
    })
}
