//! The persistence interface, and one concrete implementation.
//!
//! Storage is consumed, not owned, by the scanning core — `ResultStore` is
//! the whole contract. `PostgresStore` is the ambient stack's storage
//! layer, grounded on `db/database.go`'s `gorm`+Postgres choice; `sqlx` is
//! the idiomatic async analogue other repos in the pack already reach for.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::bucket::{Bucket, Existence};
use crate::error::Result;

#[async_trait]
pub trait ResultStore: Send + Sync {
    async fn store(&self, bucket: &Bucket) -> Result<()>;
}

pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connects and runs any pending embedded migrations. Mirrors
    /// `db.go::Connect`'s `AutoMigrate` call.
    pub async fn connect(uri: &str) -> Result<Self> {
        let pool = PgPool::connect(uri).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl ResultStore for PostgresStore {
    /// A no-op for buckets confirmed not to exist, matching
    /// `StoreBucket`'s early return — there's nothing worth recording.
    async fn store(&self, bucket: &Bucket) -> Result<()> {
        if bucket.exists == Existence::DoesNotExist {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;

        let bucket_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO buckets (
                name, provider, region, exists, date_scanned,
                objects_enumerated, num_objects, bucket_size,
                owner_id, owner_display_name,
                auth_users_read, auth_users_write, auth_users_read_acp, auth_users_write_acp, auth_users_full_control,
                all_users_read, all_users_write, all_users_read_acp, all_users_write_acp, all_users_full_control
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
            ON CONFLICT (name) DO UPDATE SET
                provider = EXCLUDED.provider,
                region = EXCLUDED.region,
                exists = EXCLUDED.exists,
                date_scanned = EXCLUDED.date_scanned,
                objects_enumerated = EXCLUDED.objects_enumerated,
                num_objects = EXCLUDED.num_objects,
                bucket_size = EXCLUDED.bucket_size,
                owner_id = EXCLUDED.owner_id,
                owner_display_name = EXCLUDED.owner_display_name,
                auth_users_read = EXCLUDED.auth_users_read,
                auth_users_write = EXCLUDED.auth_users_write,
                auth_users_read_acp = EXCLUDED.auth_users_read_acp,
                auth_users_write_acp = EXCLUDED.auth_users_write_acp,
                auth_users_full_control = EXCLUDED.auth_users_full_control,
                all_users_read = EXCLUDED.all_users_read,
                all_users_write = EXCLUDED.all_users_write,
                all_users_read_acp = EXCLUDED.all_users_read_acp,
                all_users_write_acp = EXCLUDED.all_users_write_acp,
                all_users_full_control = EXCLUDED.all_users_full_control
            RETURNING id
            "#,
        )
        .bind(&bucket.name)
        .bind(&bucket.provider)
        .bind(&bucket.region)
        .bind(bucket.exists.as_str())
        .bind(bucket.date_scanned)
        .bind(bucket.objects_enumerated)
        .bind(bucket.num_objects as i32)
        .bind(bucket.bucket_size as i64)
        .bind(&bucket.owner_id)
        .bind(&bucket.owner_display_name)
        .bind(bucket.perm_auth_users.read.as_str())
        .bind(bucket.perm_auth_users.write.as_str())
        .bind(bucket.perm_auth_users.read_acp.as_str())
        .bind(bucket.perm_auth_users.write_acp.as_str())
        .bind(bucket.perm_auth_users.full_control.as_str())
        .bind(bucket.perm_all_users.read.as_str())
        .bind(bucket.perm_all_users.write.as_str())
        .bind(bucket.perm_all_users.read_acp.as_str())
        .bind(bucket.perm_all_users.write_acp.as_str())
        .bind(bucket.perm_all_users.full_control.as_str())
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM objects WHERE bucket_id = $1").bind(bucket_id).execute(&mut *tx).await?;

        for object in &bucket.objects {
            sqlx::query("INSERT INTO objects (bucket_id, key, size) VALUES ($1, $2, $3)")
                .bind(bucket_id)
                .bind(&object.key)
                .bind(object.size as i64)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
