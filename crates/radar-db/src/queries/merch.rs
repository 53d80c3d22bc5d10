use anyhow::Result;
use rusqlite::Row;

use super::OptionalExt;
use crate::Database;
use crate::models::MerchRow;

pub(crate) const MERCH_SELECT: &str = "
    SELECT m.id, m.user_id, u.username, m.product_name, m.price, m.stock, m.created_at
    FROM merch m
    JOIN users u ON u.id = m.user_id";

impl Database {
    // -- Merch --

    pub fn insert_merch(&self, user_id: i64, product_name: &str, price: f64, stock: i64) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO merch (user_id, product_name, price, stock) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![user_id, product_name, price, stock],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_merch(&self, id: i64) -> Result<Option<MerchRow>> {
        self.with_conn(|conn| {
            let sql = format!("{} WHERE m.id = ?1", MERCH_SELECT);
            conn.query_row(&sql, [id], map_merch).optional()
        })
    }

    pub fn list_merch(&self) -> Result<Vec<MerchRow>> {
        self.with_conn(|conn| {
            let sql = format!("{} ORDER BY m.id", MERCH_SELECT);
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], map_merch)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn merch_for_user(&self, user_id: i64) -> Result<Vec<MerchRow>> {
        self.with_conn(|conn| {
            let sql = format!("{} WHERE m.user_id = ?1 ORDER BY m.id", MERCH_SELECT);
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([user_id], map_merch)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn delete_merch(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM merch WHERE id = ?1", [id])?;
            Ok(changed > 0)
        })
    }
}

pub(crate) fn map_merch(row: &Row<'_>) -> rusqlite::Result<MerchRow> {
    Ok(MerchRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        username: row.get(2)?,
        product_name: row.get(3)?,
        price: row.get(4)?,
        stock: row.get(5)?,
        created_at: row.get(6)?,
    })
}
