/// Vehicle model and database operations
///
/// Power units, tenant-scoped, with a unit number unique per tenant and an
/// optional assigned driver.

use crate::tenancy::TenantScope;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Vehicle service status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleStatus {
    Active,
    Maintenance,
    Retired,
}

impl VehicleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleStatus::Active => "active",
            VehicleStatus::Maintenance => "maintenance",
            VehicleStatus::Retired => "retired",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(VehicleStatus::Active),
            "maintenance" => Some(VehicleStatus::Maintenance),
            "retired" => Some(VehicleStatus::Retired),
            _ => None,
        }
    }
}

/// Vehicle row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Vehicle {
    pub id: Uuid,
    pub tenant_id: Uuid,

    /// Fleet unit number, unique per tenant
    pub unit_number: String,

    pub vin: Option<String>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub status: String,

    /// Driver currently assigned to this unit
    pub assigned_driver_id: Option<Uuid>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Vehicle {
    /// Parsed service status
    pub fn get_status(&self) -> Option<VehicleStatus> {
        VehicleStatus::from_str(&self.status)
    }
}

/// Input for creating a vehicle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateVehicle {
    pub unit_number: String,
    pub vin: Option<String>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
}

/// Input for updating a vehicle
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateVehicle {
    pub vin: Option<String>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub status: Option<VehicleStatus>,
}

impl Vehicle {
    /// Creates a vehicle in the scoped tenant
    ///
    /// # Errors
    ///
    /// Returns a constraint violation when the unit number is already in use
    /// within the tenant.
    pub async fn create(
        pool: &PgPool,
        scope: TenantScope,
        data: CreateVehicle,
    ) -> Result<Self, sqlx::Error> {
        let vehicle = sqlx::query_as::<_, Vehicle>(
            r#"
            INSERT INTO vehicles (tenant_id, unit_number, vin, make, model, year)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, tenant_id, unit_number, vin, make, model, year, status,
                      assigned_driver_id, created_at, updated_at
            "#,
        )
        .bind(scope.tenant_id())
        .bind(data.unit_number)
        .bind(data.vin)
        .bind(data.make)
        .bind(data.model)
        .bind(data.year)
        .fetch_one(pool)
        .await?;

        Ok(vehicle)
    }

    /// Finds a vehicle by ID within the scoped tenant
    pub async fn find_by_id(
        pool: &PgPool,
        scope: TenantScope,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let vehicle = sqlx::query_as::<_, Vehicle>(
            r#"
            SELECT id, tenant_id, unit_number, vin, make, model, year, status,
                   assigned_driver_id, created_at, updated_at
            FROM vehicles
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(scope.tenant_id())
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(vehicle)
    }

    /// Updates a vehicle; only non-None fields are written
    pub async fn update(
        pool: &PgPool,
        scope: TenantScope,
        id: Uuid,
        data: UpdateVehicle,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE vehicles SET updated_at = NOW()");
        let mut bind_count = 2;

        if data.vin.is_some() {
            bind_count += 1;
            query.push_str(&format!(", vin = ${}", bind_count));
        }
        if data.make.is_some() {
            bind_count += 1;
            query.push_str(&format!(", make = ${}", bind_count));
        }
        if data.model.is_some() {
            bind_count += 1;
            query.push_str(&format!(", model = ${}", bind_count));
        }
        if data.year.is_some() {
            bind_count += 1;
            query.push_str(&format!(", year = ${}", bind_count));
        }
        if data.status.is_some() {
            bind_count += 1;
            query.push_str(&format!(", status = ${}", bind_count));
        }

        query.push_str(
            " WHERE tenant_id = $1 AND id = $2 RETURNING id, tenant_id, unit_number, vin, make, \
             model, year, status, assigned_driver_id, created_at, updated_at",
        );

        let mut q = sqlx::query_as::<_, Vehicle>(&query)
            .bind(scope.tenant_id())
            .bind(id);

        if let Some(vin) = data.vin {
            q = q.bind(vin);
        }
        if let Some(make) = data.make {
            q = q.bind(make);
        }
        if let Some(model) = data.model {
            q = q.bind(model);
        }
        if let Some(year) = data.year {
            q = q.bind(year);
        }
        if let Some(status) = data.status {
            q = q.bind(status.as_str());
        }

        let vehicle = q.fetch_optional(pool).await?;

        Ok(vehicle)
    }

    /// Assigns or clears the vehicle's driver
    pub async fn assign_driver(
        pool: &PgPool,
        scope: TenantScope,
        id: Uuid,
        driver_id: Option<Uuid>,
    ) -> Result<Option<Self>, sqlx::Error> {
        let vehicle = sqlx::query_as::<_, Vehicle>(
            r#"
            UPDATE vehicles
            SET assigned_driver_id = $3, updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
            RETURNING id, tenant_id, unit_number, vin, make, model, year, status,
                      assigned_driver_id, created_at, updated_at
            "#,
        )
        .bind(scope.tenant_id())
        .bind(id)
        .bind(driver_id)
        .fetch_optional(pool)
        .await?;

        Ok(vehicle)
    }

    /// Deletes a vehicle within the scoped tenant
    pub async fn delete(pool: &PgPool, scope: TenantScope, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM vehicles WHERE tenant_id = $1 AND id = $2")
            .bind(scope.tenant_id())
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists vehicles in the scoped tenant, optionally filtered by status
    pub async fn list(
        pool: &PgPool,
        scope: TenantScope,
        status: Option<VehicleStatus>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let vehicles = sqlx::query_as::<_, Vehicle>(
            r#"
            SELECT id, tenant_id, unit_number, vin, make, model, year, status,
                   assigned_driver_id, created_at, updated_at
            FROM vehicles
            WHERE tenant_id = $1 AND ($2::text IS NULL OR status = $2)
            ORDER BY unit_number ASC
            "#,
        )
        .bind(scope.tenant_id())
        .bind(status.map(|s| s.as_str()))
        .fetch_all(pool)
        .await?;

        Ok(vehicles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [
            VehicleStatus::Active,
            VehicleStatus::Maintenance,
            VehicleStatus::Retired,
        ] {
            assert_eq!(VehicleStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(VehicleStatus::from_str("scrapped"), None);
    }
}
