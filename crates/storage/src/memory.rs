use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{round_rating, Credential, CredentialStore, Result, StoreError, Table, UserSummary};

#[derive(Debug, Clone)]
struct Row {
    name: String,
    password_hash: String,
    rating: f64,
}

#[derive(Debug, Default)]
struct MemoryTable {
    next_id: i32,
    rows: BTreeMap<i32, Row>,
}

impl MemoryTable {
    fn find_by_name(&self, name: &str) -> Option<(i32, &Row)> {
        self.rows
            .iter()
            .find(|(_, row)| row.name == name)
            .map(|(id, row)| (*id, row))
    }
}

/// Credential store held entirely in memory.
///
/// Mirrors the Postgres constraints that matter to the services: unique
/// names per table, ids generated from 1 and never reused.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    users: RwLock<MemoryTable>,
    admins: RwLock<MemoryTable>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self, table: Table) -> &RwLock<MemoryTable> {
        match table {
            Table::Users => &self.users,
            Table::Admins => &self.admins,
        }
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn insert_credential(&self, table: Table, name: &str, password_hash: &str) -> Result<i32> {
        let mut guard = self.table(table).write().await;

        if guard.find_by_name(name).is_some() {
            return Err(StoreError::UniqueViolation(format!("{}_name_key", table.name())));
        }

        guard.next_id += 1;
        let id = guard.next_id;
        guard.rows.insert(
            id,
            Row {
                name: name.to_string(),
                password_hash: password_hash.to_string(),
                rating: 0.0,
            },
        );

        Ok(id)
    }

    async fn find_credential(&self, table: Table, name: &str) -> Result<Option<Credential>> {
        let guard = self.table(table).read().await;

        Ok(guard.find_by_name(name).map(|(id, row)| Credential {
            id,
            name: row.name.clone(),
            password_hash: row.password_hash.clone(),
        }))
    }

    async fn count_credentials(&self, table: Table) -> Result<i64> {
        Ok(self.table(table).read().await.rows.len() as i64)
    }

    async fn list_users(&self) -> Result<Vec<UserSummary>> {
        let guard = self.users.read().await;

        Ok(guard
            .rows
            .iter()
            .map(|(id, row)| UserSummary::new(*id, row.name.clone(), row.rating))
            .collect())
    }

    async fn update_rating(&self, id: i32, rating: f64) -> Result<Option<UserSummary>> {
        let mut guard = self.users.write().await;

        Ok(guard.rows.get_mut(&id).map(|row| {
            row.rating = round_rating(rating);
            UserSummary::new(id, row.name.clone(), row.rating)
        }))
    }

    async fn delete_user(&self, id: i32) -> Result<bool> {
        Ok(self.users.write().await.rows.remove(&id).is_some())
    }
}
