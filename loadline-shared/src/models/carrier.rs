/// Carrier model and database operations
///
/// Outside motor carriers a tenant works with. Drivers can optionally hang
/// off a carrier; deleting the carrier leaves them unattached.

use crate::tenancy::TenantScope;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Carrier operating status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CarrierStatus {
    Active,
    Inactive,
}

impl CarrierStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CarrierStatus::Active => "active",
            CarrierStatus::Inactive => "inactive",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(CarrierStatus::Active),
            "inactive" => Some(CarrierStatus::Inactive),
            _ => None,
        }
    }
}

/// Carrier row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Carrier {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,

    /// FMCSA motor carrier number
    pub mc_number: Option<String>,

    /// USDOT number
    pub dot_number: Option<String>,

    pub contact_name: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Carrier {
    /// Parsed operating status
    pub fn get_status(&self) -> Option<CarrierStatus> {
        CarrierStatus::from_str(&self.status)
    }
}

/// Input for creating a carrier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCarrier {
    pub name: String,
    pub mc_number: Option<String>,
    pub dot_number: Option<String>,
    pub contact_name: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
}

/// Input for updating a carrier
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCarrier {
    pub name: Option<String>,
    pub mc_number: Option<String>,
    pub dot_number: Option<String>,
    pub contact_name: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
    pub status: Option<CarrierStatus>,
}

impl Carrier {
    /// Creates a carrier in the scoped tenant
    pub async fn create(
        pool: &PgPool,
        scope: TenantScope,
        data: CreateCarrier,
    ) -> Result<Self, sqlx::Error> {
        let carrier = sqlx::query_as::<_, Carrier>(
            r#"
            INSERT INTO carriers (tenant_id, name, mc_number, dot_number,
                                  contact_name, contact_phone, contact_email)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, tenant_id, name, mc_number, dot_number, contact_name,
                      contact_phone, contact_email, status, created_at, updated_at
            "#,
        )
        .bind(scope.tenant_id())
        .bind(data.name)
        .bind(data.mc_number)
        .bind(data.dot_number)
        .bind(data.contact_name)
        .bind(data.contact_phone)
        .bind(data.contact_email)
        .fetch_one(pool)
        .await?;

        Ok(carrier)
    }

    /// Finds a carrier by ID within the scoped tenant
    pub async fn find_by_id(
        pool: &PgPool,
        scope: TenantScope,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let carrier = sqlx::query_as::<_, Carrier>(
            r#"
            SELECT id, tenant_id, name, mc_number, dot_number, contact_name,
                   contact_phone, contact_email, status, created_at, updated_at
            FROM carriers
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(scope.tenant_id())
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(carrier)
    }

    /// Updates a carrier; only non-None fields are written
    pub async fn update(
        pool: &PgPool,
        scope: TenantScope,
        id: Uuid,
        data: UpdateCarrier,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE carriers SET updated_at = NOW()");
        let mut bind_count = 2;

        if data.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${}", bind_count));
        }
        if data.mc_number.is_some() {
            bind_count += 1;
            query.push_str(&format!(", mc_number = ${}", bind_count));
        }
        if data.dot_number.is_some() {
            bind_count += 1;
            query.push_str(&format!(", dot_number = ${}", bind_count));
        }
        if data.contact_name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", contact_name = ${}", bind_count));
        }
        if data.contact_phone.is_some() {
            bind_count += 1;
            query.push_str(&format!(", contact_phone = ${}", bind_count));
        }
        if data.contact_email.is_some() {
            bind_count += 1;
            query.push_str(&format!(", contact_email = ${}", bind_count));
        }
        if data.status.is_some() {
            bind_count += 1;
            query.push_str(&format!(", status = ${}", bind_count));
        }

        query.push_str(
            " WHERE tenant_id = $1 AND id = $2 RETURNING id, tenant_id, name, mc_number, \
             dot_number, contact_name, contact_phone, contact_email, status, created_at, updated_at",
        );

        let mut q = sqlx::query_as::<_, Carrier>(&query)
            .bind(scope.tenant_id())
            .bind(id);

        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(mc) = data.mc_number {
            q = q.bind(mc);
        }
        if let Some(dot) = data.dot_number {
            q = q.bind(dot);
        }
        if let Some(contact) = data.contact_name {
            q = q.bind(contact);
        }
        if let Some(phone) = data.contact_phone {
            q = q.bind(phone);
        }
        if let Some(email) = data.contact_email {
            q = q.bind(email);
        }
        if let Some(status) = data.status {
            q = q.bind(status.as_str());
        }

        let carrier = q.fetch_optional(pool).await?;

        Ok(carrier)
    }

    /// Deletes a carrier within the scoped tenant
    pub async fn delete(pool: &PgPool, scope: TenantScope, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM carriers WHERE tenant_id = $1 AND id = $2")
            .bind(scope.tenant_id())
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists carriers in the scoped tenant, optionally filtered by status
    pub async fn list(
        pool: &PgPool,
        scope: TenantScope,
        status: Option<CarrierStatus>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let carriers = sqlx::query_as::<_, Carrier>(
            r#"
            SELECT id, tenant_id, name, mc_number, dot_number, contact_name,
                   contact_phone, contact_email, status, created_at, updated_at
            FROM carriers
            WHERE tenant_id = $1 AND ($2::text IS NULL OR status = $2)
            ORDER BY name ASC
            "#,
        )
        .bind(scope.tenant_id())
        .bind(status.map(|s| s.as_str()))
        .fetch_all(pool)
        .await?;

        Ok(carriers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        assert_eq!(
            CarrierStatus::from_str(CarrierStatus::Active.as_str()),
            Some(CarrierStatus::Active)
        );
        assert_eq!(CarrierStatus::from_str("defunct"), None);
    }
}
