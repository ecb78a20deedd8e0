/// Driver model and database operations
///
/// Drivers are tenant-scoped and carry a pay formula (JSONB) consumed by the
/// billing reports. A driver may optionally belong to a carrier.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE drivers (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     tenant_id UUID NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
///     carrier_id UUID REFERENCES carriers(id) ON DELETE SET NULL,
///     name VARCHAR(100) NOT NULL,
///     phone VARCHAR(30),
///     license_number VARCHAR(50),
///     pay_formula JSONB NOT NULL DEFAULT '{"type": "per_mile", "rate_cents_per_mile": 0}',
///     status VARCHAR(20) NOT NULL DEFAULT 'active',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use crate::billing::PayFormula;
use crate::tenancy::TenantScope;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

/// Driver availability status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverStatus {
    Active,
    OnLeave,
    Inactive,
}

impl DriverStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DriverStatus::Active => "active",
            DriverStatus::OnLeave => "on_leave",
            DriverStatus::Inactive => "inactive",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(DriverStatus::Active),
            "on_leave" => Some(DriverStatus::OnLeave),
            "inactive" => Some(DriverStatus::Inactive),
            _ => None,
        }
    }
}

/// Driver row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Driver {
    pub id: Uuid,
    pub tenant_id: Uuid,

    /// Owning carrier, when the driver is not in-house
    pub carrier_id: Option<Uuid>,

    pub name: String,
    pub phone: Option<String>,

    /// CDL number
    pub license_number: Option<String>,

    /// Pay formula (JSONB), parsed on demand via [`Driver::formula`]
    pub pay_formula: JsonValue,

    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Driver {
    /// Parsed pay formula; malformed rows fall back to zero per-mile pay
    pub fn formula(&self) -> PayFormula {
        serde_json::from_value(self.pay_formula.clone()).unwrap_or_default()
    }

    /// Parsed availability status
    pub fn get_status(&self) -> Option<DriverStatus> {
        DriverStatus::from_str(&self.status)
    }
}

/// Input for creating a driver
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDriver {
    pub name: String,
    pub phone: Option<String>,
    pub license_number: Option<String>,
    pub carrier_id: Option<Uuid>,

    /// Pay formula (defaults to zero per-mile)
    #[serde(default)]
    pub pay_formula: PayFormula,
}

/// Input for updating a driver
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateDriver {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub license_number: Option<String>,
    pub carrier_id: Option<Uuid>,
    pub pay_formula: Option<PayFormula>,
    pub status: Option<DriverStatus>,
}

impl Driver {
    /// Creates a driver in the scoped tenant
    pub async fn create(
        pool: &PgPool,
        scope: TenantScope,
        data: CreateDriver,
    ) -> Result<Self, sqlx::Error> {
        let formula = serde_json::to_value(data.pay_formula)
            .map_err(|e| sqlx::Error::Protocol(e.to_string()))?;

        let driver = sqlx::query_as::<_, Driver>(
            r#"
            INSERT INTO drivers (tenant_id, carrier_id, name, phone, license_number, pay_formula)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, tenant_id, carrier_id, name, phone, license_number,
                      pay_formula, status, created_at, updated_at
            "#,
        )
        .bind(scope.tenant_id())
        .bind(data.carrier_id)
        .bind(data.name)
        .bind(data.phone)
        .bind(data.license_number)
        .bind(formula)
        .fetch_one(pool)
        .await?;

        Ok(driver)
    }

    /// Finds a driver by ID within the scoped tenant
    pub async fn find_by_id(
        pool: &PgPool,
        scope: TenantScope,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let driver = sqlx::query_as::<_, Driver>(
            r#"
            SELECT id, tenant_id, carrier_id, name, phone, license_number,
                   pay_formula, status, created_at, updated_at
            FROM drivers
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(scope.tenant_id())
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(driver)
    }

    /// Updates a driver; only non-None fields are written
    pub async fn update(
        pool: &PgPool,
        scope: TenantScope,
        id: Uuid,
        data: UpdateDriver,
    ) -> Result<Option<Self>, sqlx::Error> {
        let formula = match data.pay_formula {
            Some(f) => {
                Some(serde_json::to_value(f).map_err(|e| sqlx::Error::Protocol(e.to_string()))?)
            }
            None => None,
        };

        let mut query = String::from("UPDATE drivers SET updated_at = NOW()");
        let mut bind_count = 2;

        if data.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${}", bind_count));
        }
        if data.phone.is_some() {
            bind_count += 1;
            query.push_str(&format!(", phone = ${}", bind_count));
        }
        if data.license_number.is_some() {
            bind_count += 1;
            query.push_str(&format!(", license_number = ${}", bind_count));
        }
        if data.carrier_id.is_some() {
            bind_count += 1;
            query.push_str(&format!(", carrier_id = ${}", bind_count));
        }
        if formula.is_some() {
            bind_count += 1;
            query.push_str(&format!(", pay_formula = ${}", bind_count));
        }
        if data.status.is_some() {
            bind_count += 1;
            query.push_str(&format!(", status = ${}", bind_count));
        }

        query.push_str(
            " WHERE tenant_id = $1 AND id = $2 RETURNING id, tenant_id, carrier_id, name, phone, \
             license_number, pay_formula, status, created_at, updated_at",
        );

        let mut q = sqlx::query_as::<_, Driver>(&query)
            .bind(scope.tenant_id())
            .bind(id);

        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(phone) = data.phone {
            q = q.bind(phone);
        }
        if let Some(license) = data.license_number {
            q = q.bind(license);
        }
        if let Some(carrier_id) = data.carrier_id {
            q = q.bind(carrier_id);
        }
        if let Some(formula) = formula {
            q = q.bind(formula);
        }
        if let Some(status) = data.status {
            q = q.bind(status.as_str());
        }

        let driver = q.fetch_optional(pool).await?;

        Ok(driver)
    }

    /// Deletes a driver within the scoped tenant
    pub async fn delete(pool: &PgPool, scope: TenantScope, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM drivers WHERE tenant_id = $1 AND id = $2")
            .bind(scope.tenant_id())
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists drivers in the scoped tenant, optionally filtered by status
    pub async fn list(
        pool: &PgPool,
        scope: TenantScope,
        status: Option<DriverStatus>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let drivers = sqlx::query_as::<_, Driver>(
            r#"
            SELECT id, tenant_id, carrier_id, name, phone, license_number,
                   pay_formula, status, created_at, updated_at
            FROM drivers
            WHERE tenant_id = $1 AND ($2::text IS NULL OR status = $2)
            ORDER BY name ASC
            "#,
        )
        .bind(scope.tenant_id())
        .bind(status.map(|s| s.as_str()))
        .fetch_all(pool)
        .await?;

        Ok(drivers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_formula_parses_jsonb() {
        let driver = Driver {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            carrier_id: None,
            name: "Pat".to_string(),
            phone: None,
            license_number: None,
            pay_formula: json!({"type": "percent_of_revenue", "percent": 22.0}),
            status: "active".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert_eq!(
            driver.formula(),
            PayFormula::PercentOfRevenue { percent: 22.0 }
        );
    }

    #[test]
    fn test_malformed_formula_falls_back() {
        let driver = Driver {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            carrier_id: None,
            name: "Pat".to_string(),
            phone: None,
            license_number: None,
            pay_formula: json!({"type": "stock_options"}),
            status: "active".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert_eq!(driver.formula(), PayFormula::default());
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            DriverStatus::Active,
            DriverStatus::OnLeave,
            DriverStatus::Inactive,
        ] {
            assert_eq!(DriverStatus::from_str(status.as_str()), Some(status));
        }
    }
}
