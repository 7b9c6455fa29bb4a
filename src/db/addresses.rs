//! Address book repository.
//!
//! Every write that can set `is_default` clears the user's other default in
//! the same transaction; the partial unique index
//! `addresses_one_default_per_user` rejects whatever slips past that.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::domain::aggregates::{Address, AddressFields, AddressType};
use crate::{Result, ShopError};

use super::unregistered_user;

#[derive(sqlx::FromRow)]
struct AddressRow {
    id: Uuid,
    user_id: Uuid,
    address_type: String,
    street_address: String,
    city: String,
    state: String,
    country: String,
    postal_code: String,
    is_default: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AddressRow> for Address {
    type Error = ShopError;

    fn try_from(row: AddressRow) -> Result<Self> {
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            address_type: row.address_type.parse::<AddressType>()?,
            street_address: row.street_address,
            city: row.city,
            state: row.state,
            country: row.country,
            postal_code: row.postal_code,
            is_default: row.is_default,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// An address as stored by a write, and whether that write moved the user's
/// default onto it.
#[derive(Clone, Debug)]
pub struct AddressWrite {
    pub address: Address,
    pub became_default: bool,
}

/// Repository for address database operations.
pub struct AddressRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AddressRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The user's addresses, default first.
    pub async fn list(&self, user_id: Uuid) -> Result<Vec<Address>> {
        let rows = sqlx::query_as::<_, AddressRow>(
            "SELECT * FROM addresses WHERE user_id = $1 ORDER BY is_default DESC, created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;
        rows.into_iter().map(Address::try_from).collect()
    }

    pub async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Address> {
        let mut conn = self.pool.acquire().await?;
        owned_address(&mut conn, user_id, id).await
    }

    pub async fn create(&self, user_id: Uuid, fields: &AddressFields) -> Result<AddressWrite> {
        let mut tx = self.pool.begin().await?;
        if fields.is_default {
            clear_default(&mut tx, user_id, None).await?;
        }
        let row = sqlx::query_as::<_, AddressRow>(
            "INSERT INTO addresses \
             (id, user_id, address_type, street_address, city, state, country, postal_code, is_default) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(user_id)
        .bind(fields.address_type.as_str())
        .bind(&fields.street_address)
        .bind(&fields.city)
        .bind(&fields.state)
        .bind(&fields.country)
        .bind(&fields.postal_code)
        .bind(fields.is_default)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| unregistered_user(e, user_id))?;
        tx.commit().await?;
        tracing::info!(address_id = %row.id, %user_id, is_default = row.is_default, "address created");
        let address = Address::try_from(row)?;
        Ok(AddressWrite { became_default: address.is_default, address })
    }

    pub async fn update(&self, user_id: Uuid, id: Uuid, fields: &AddressFields) -> Result<AddressWrite> {
        let mut tx = self.pool.begin().await?;
        let previous = owned_address(&mut tx, user_id, id).await?;
        if fields.is_default {
            clear_default(&mut tx, user_id, Some(id)).await?;
        }
        let row = sqlx::query_as::<_, AddressRow>(
            "UPDATE addresses SET address_type = $3, street_address = $4, city = $5, state = $6, \
             country = $7, postal_code = $8, is_default = $9, updated_at = NOW() \
             WHERE id = $1 AND user_id = $2 RETURNING *",
        )
        .bind(id)
        .bind(user_id)
        .bind(fields.address_type.as_str())
        .bind(&fields.street_address)
        .bind(&fields.city)
        .bind(&fields.state)
        .bind(&fields.country)
        .bind(&fields.postal_code)
        .bind(fields.is_default)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        let address = Address::try_from(row)?;
        Ok(AddressWrite { became_default: address.is_default && !previous.is_default, address })
    }

    /// Orders that shipped to the address keep their snapshot; their link is nulled.
    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM addresses WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ShopError::not_found(format!("address {id}")));
        }
        tracing::info!(address_id = %id, %user_id, "address deleted");
        Ok(())
    }

    /// Makes `id` the user's only default address.
    pub async fn set_default(&self, user_id: Uuid, id: Uuid) -> Result<AddressWrite> {
        let mut tx = self.pool.begin().await?;
        // existence check first so a foreign id does not clear the caller's default
        let previous = owned_address(&mut tx, user_id, id).await?;
        clear_default(&mut tx, user_id, Some(id)).await?;
        let row = sqlx::query_as::<_, AddressRow>(
            "UPDATE addresses SET is_default = TRUE, updated_at = NOW() WHERE id = $1 AND user_id = $2 RETURNING *",
        )
        .bind(id)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        if !previous.is_default {
            tracing::info!(address_id = %id, %user_id, "default address changed");
        }
        let address = Address::try_from(row)?;
        Ok(AddressWrite { became_default: !previous.is_default, address })
    }
}

/// Looks an address up by id regardless of owner. Ownership is the caller's check.
pub(crate) async fn find_address(conn: &mut PgConnection, id: Uuid) -> Result<Option<Address>> {
    sqlx::query_as::<_, AddressRow>("SELECT * FROM addresses WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .map(Address::try_from)
        .transpose()
}

async fn owned_address(conn: &mut PgConnection, user_id: Uuid, id: Uuid) -> Result<Address> {
    let row = sqlx::query_as::<_, AddressRow>("SELECT * FROM addresses WHERE id = $1 AND user_id = $2 FOR UPDATE")
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| ShopError::not_found(format!("address {id}")))?;
    Address::try_from(row)
}

async fn clear_default(conn: &mut PgConnection, user_id: Uuid, keep: Option<Uuid>) -> Result<()> {
    sqlx::query(
        "UPDATE addresses SET is_default = FALSE, updated_at = NOW() \
         WHERE user_id = $1 AND is_default AND ($2::uuid IS NULL OR id <> $2)",
    )
    .bind(user_id)
    .bind(keep)
    .execute(&mut *conn)
    .await?;
    Ok(())
}
