//! # Party Repository
//!
//! Suppliers and consumers share one repository, generic over the
//! [`Party`] capability. Each kind keeps its own table, and with it its own
//! cascade: deleting a supplier removes its supplier orders and supplier
//! transactions, deleting a consumer removes its consumer orders and consumer
//! transactions.

use std::marker::PhantomData;
use std::sync::Arc;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::required;
use depot_core::{Clock, Consumer, Party, PartyDraft, PartyPatch, Supplier};

/// Storage binding of a party kind.
pub trait PartyTable: Party + for<'r> FromRow<'r, SqliteRow> + Send + Unpin {
    const TABLE: &'static str;
}

impl PartyTable for Supplier {
    const TABLE: &'static str = "suppliers";
}

impl PartyTable for Consumer {
    const TABLE: &'static str = "consumers";
}

/// Repository for one kind of party.
#[derive(Debug, Clone)]
pub struct PartyRepository<P> {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
    _kind: PhantomData<fn() -> P>,
}

impl<P: PartyTable> PartyRepository<P> {
    pub fn new(pool: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        PartyRepository {
            pool,
            clock,
            _kind: PhantomData,
        }
    }

    /// Validates the draft (contact, email, name, address) and stores the party.
    ///
    /// A failed check is `InvalidFormat` / `Required` and nothing is written.
    pub async fn create(&self, draft: PartyDraft) -> DbResult<P> {
        draft.validate()?;

        let now = self.clock.now();
        let party = P::from_draft(Uuid::new_v4().to_string(), draft, now);
        let details = party.details();

        sqlx::query(&format!(
            r#"
            INSERT INTO {} (id, name, address, contact, email, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            "#,
            P::TABLE
        ))
        .bind(party.id())
        .bind(&details.name)
        .bind(&details.address)
        .bind(&details.contact)
        .bind(&details.email)
        .bind(now)
        .execute(&self.pool)
        .await?;

        info!(kind = P::KIND.as_str(), id = %party.id(), name = %details.name, "Party created");
        Ok(party)
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<P>> {
        let mut conn = self.pool.acquire().await?;
        Self::find(&mut conn, id).await
    }

    pub async fn list(&self) -> DbResult<Vec<P>> {
        let parties = sqlx::query_as::<_, P>(&format!(
            "SELECT id, name, address, contact, email, created_at, updated_at FROM {} ORDER BY name, rowid",
            P::TABLE
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(parties)
    }

    /// Applies a partial update; present fields are validated like a draft.
    pub async fn update(&self, id: &str, patch: PartyPatch) -> DbResult<P> {
        patch.validate()?;

        let mut conn = self.pool.acquire().await?;
        let mut party = required(Self::find(&mut conn, id).await?, P::KIND.as_str(), id)?;
        let now = self.clock.now();
        party.apply_patch(patch, now);
        let details = party.details();

        sqlx::query(&format!(
            r#"
            UPDATE {}
            SET name = ?1, address = ?2, contact = ?3, email = ?4, updated_at = ?5
            WHERE id = ?6
            "#,
            P::TABLE
        ))
        .bind(&details.name)
        .bind(&details.address)
        .bind(&details.contact)
        .bind(&details.email)
        .bind(now)
        .bind(id)
        .execute(&mut *conn)
        .await?;

        debug!(kind = P::KIND.as_str(), id = %id, "Party updated");
        Ok(party)
    }

    /// Deletes the party; its orders and their transactions follow by cascade.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = ?1", P::TABLE))
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(P::KIND.as_str(), id));
        }

        info!(kind = P::KIND.as_str(), id = %id, "Party deleted");
        Ok(())
    }

    pub async fn find(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<P>> {
        let party = sqlx::query_as::<_, P>(&format!(
            "SELECT id, name, address, contact, email, created_at, updated_at FROM {} WHERE id = ?1",
            P::TABLE
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(party)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn draft() -> PartyDraft {
        PartyDraft {
            name: "Anbu Stores".to_string(),
            address: "Madurai".to_string(),
            contact: "9876543210".to_string(),
            email: "anbu@stores.in".to_string(),
        }
    }

    #[tokio::test]
    async fn test_consumer_crud() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.consumers();

        let consumer = repo.create(draft()).await.unwrap();
        assert_eq!(consumer.contact, "9876543210");

        let updated = repo
            .update(
                &consumer.id,
                PartyPatch {
                    email: Some("billing@anbu.co.in".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.email, "billing@anbu.co.in");
        assert_eq!(updated.name, "Anbu Stores");

        let stored = repo.get(&consumer.id).await.unwrap().unwrap();
        assert_eq!(stored.email, "billing@anbu.co.in");

        repo.delete(&consumer.id).await.unwrap();
        assert!(repo.get(&consumer.id).await.unwrap().is_none());
        assert!(repo.delete(&consumer.id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_invalid_contact_writes_nothing() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let mut bad = draft();
        bad.contact = "98765 43210".to_string();
        let err = db.suppliers().create(bad).await.unwrap_err();
        assert!(err.is_invalid_format());

        let mut bad = draft();
        bad.email = "anbu@stores".to_string();
        assert!(db.suppliers().create(bad).await.unwrap_err().is_invalid_format());

        assert!(db.suppliers().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_patch_leaves_record() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let supplier = db.suppliers().create(draft()).await.unwrap();

        let err = db
            .suppliers()
            .update(
                &supplier.id,
                PartyPatch {
                    contact: Some("call me".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(err.is_invalid_format());

        let stored = db.suppliers().get(&supplier.id).await.unwrap().unwrap();
        assert_eq!(stored.contact, "9876543210");
    }

    #[tokio::test]
    async fn test_kinds_are_separate_tables() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let supplier = db.suppliers().create(draft()).await.unwrap();

        assert!(db.consumers().get(&supplier.id).await.unwrap().is_none());
        assert_eq!(db.suppliers().list().await.unwrap().len(), 1);
        assert!(db.consumers().list().await.unwrap().is_empty());
    }
}
