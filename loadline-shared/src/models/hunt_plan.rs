/// Hunt plan model and database operations
///
/// A hunt plan describes the freight a tenant is hunting for: a search
/// center with a radius, an optional destination lane, acceptable equipment,
/// and a rate floor. The worker matches parsed load offers against every
/// active plan in the offer's tenant.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE hunt_plans (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     tenant_id UUID NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
///     name VARCHAR(100) NOT NULL,
///     origin_lat DOUBLE PRECISION NOT NULL,
///     origin_lon DOUBLE PRECISION NOT NULL,
///     origin_radius_miles DOUBLE PRECISION NOT NULL,
///     dest_lat DOUBLE PRECISION,
///     dest_lon DOUBLE PRECISION,
///     dest_radius_miles DOUBLE PRECISION,
///     equipment TEXT[] NOT NULL DEFAULT '{}',
///     min_rate_per_mile_cents BIGINT,
///     active BOOLEAN NOT NULL DEFAULT TRUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use crate::geo::Coordinates;
use crate::sync::RowId;
use crate::tenancy::TenantScope;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Hunt plan row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct HuntPlan {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,

    pub origin_lat: f64,
    pub origin_lon: f64,
    pub origin_radius_miles: f64,

    pub dest_lat: Option<f64>,
    pub dest_lon: Option<f64>,
    pub dest_radius_miles: Option<f64>,

    /// Acceptable equipment; empty means any
    pub equipment: Vec<String>,

    /// Rate floor in cents per mile; None means no floor
    pub min_rate_per_mile_cents: Option<i64>,

    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl HuntPlan {
    /// Search center
    pub fn origin(&self) -> Coordinates {
        Coordinates::new(self.origin_lat, self.origin_lon)
    }

    /// Destination lane center, when the plan has one
    pub fn destination(&self) -> Option<(Coordinates, f64)> {
        match (self.dest_lat, self.dest_lon, self.dest_radius_miles) {
            (Some(lat), Some(lon), Some(radius)) => Some((Coordinates::new(lat, lon), radius)),
            _ => None,
        }
    }
}

impl RowId for HuntPlan {
    fn row_id(&self) -> Uuid {
        self.id
    }
}

/// Input for creating a hunt plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateHuntPlan {
    pub name: String,
    pub origin_lat: f64,
    pub origin_lon: f64,
    pub origin_radius_miles: f64,
    pub dest_lat: Option<f64>,
    pub dest_lon: Option<f64>,
    pub dest_radius_miles: Option<f64>,
    #[serde(default)]
    pub equipment: Vec<String>,
    pub min_rate_per_mile_cents: Option<i64>,
}

/// Input for updating a hunt plan
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateHuntPlan {
    pub name: Option<String>,
    pub origin_radius_miles: Option<f64>,
    pub min_rate_per_mile_cents: Option<i64>,
    pub equipment: Option<Vec<String>>,
    pub active: Option<bool>,
}

impl HuntPlan {
    /// Creates a hunt plan in the scoped tenant
    pub async fn create(
        pool: &PgPool,
        scope: TenantScope,
        data: CreateHuntPlan,
    ) -> Result<Self, sqlx::Error> {
        let plan = sqlx::query_as::<_, HuntPlan>(
            r#"
            INSERT INTO hunt_plans (
                tenant_id, name, origin_lat, origin_lon, origin_radius_miles,
                dest_lat, dest_lon, dest_radius_miles, equipment, min_rate_per_mile_cents
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, tenant_id, name, origin_lat, origin_lon, origin_radius_miles,
                      dest_lat, dest_lon, dest_radius_miles, equipment,
                      min_rate_per_mile_cents, active, created_at, updated_at
            "#,
        )
        .bind(scope.tenant_id())
        .bind(data.name)
        .bind(data.origin_lat)
        .bind(data.origin_lon)
        .bind(data.origin_radius_miles)
        .bind(data.dest_lat)
        .bind(data.dest_lon)
        .bind(data.dest_radius_miles)
        .bind(data.equipment)
        .bind(data.min_rate_per_mile_cents)
        .fetch_one(pool)
        .await?;

        Ok(plan)
    }

    /// Finds a plan by ID within the scoped tenant
    pub async fn find_by_id(
        pool: &PgPool,
        scope: TenantScope,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let plan = sqlx::query_as::<_, HuntPlan>(
            r#"
            SELECT id, tenant_id, name, origin_lat, origin_lon, origin_radius_miles,
                   dest_lat, dest_lon, dest_radius_miles, equipment,
                   min_rate_per_mile_cents, active, created_at, updated_at
            FROM hunt_plans
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(scope.tenant_id())
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(plan)
    }

    /// Updates a plan; only non-None fields are written
    pub async fn update(
        pool: &PgPool,
        scope: TenantScope,
        id: Uuid,
        data: UpdateHuntPlan,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE hunt_plans SET updated_at = NOW()");
        let mut bind_count = 2;

        if data.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${}", bind_count));
        }
        if data.origin_radius_miles.is_some() {
            bind_count += 1;
            query.push_str(&format!(", origin_radius_miles = ${}", bind_count));
        }
        if data.min_rate_per_mile_cents.is_some() {
            bind_count += 1;
            query.push_str(&format!(", min_rate_per_mile_cents = ${}", bind_count));
        }
        if data.equipment.is_some() {
            bind_count += 1;
            query.push_str(&format!(", equipment = ${}", bind_count));
        }
        if data.active.is_some() {
            bind_count += 1;
            query.push_str(&format!(", active = ${}", bind_count));
        }

        query.push_str(
            " WHERE tenant_id = $1 AND id = $2 RETURNING id, tenant_id, name, origin_lat, \
             origin_lon, origin_radius_miles, dest_lat, dest_lon, dest_radius_miles, equipment, \
             min_rate_per_mile_cents, active, created_at, updated_at",
        );

        let mut q = sqlx::query_as::<_, HuntPlan>(&query)
            .bind(scope.tenant_id())
            .bind(id);

        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(radius) = data.origin_radius_miles {
            q = q.bind(radius);
        }
        if let Some(floor) = data.min_rate_per_mile_cents {
            q = q.bind(floor);
        }
        if let Some(equipment) = data.equipment {
            q = q.bind(equipment);
        }
        if let Some(active) = data.active {
            q = q.bind(active);
        }

        let plan = q.fetch_optional(pool).await?;

        Ok(plan)
    }

    /// Deletes a plan within the scoped tenant
    pub async fn delete(pool: &PgPool, scope: TenantScope, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM hunt_plans WHERE tenant_id = $1 AND id = $2")
            .bind(scope.tenant_id())
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists plans in the scoped tenant, newest first
    pub async fn list(pool: &PgPool, scope: TenantScope) -> Result<Vec<Self>, sqlx::Error> {
        let plans = sqlx::query_as::<_, HuntPlan>(
            r#"
            SELECT id, tenant_id, name, origin_lat, origin_lon, origin_radius_miles,
                   dest_lat, dest_lon, dest_radius_miles, equipment,
                   min_rate_per_mile_cents, active, created_at, updated_at
            FROM hunt_plans
            WHERE tenant_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(scope.tenant_id())
        .fetch_all(pool)
        .await?;

        Ok(plans)
    }

    /// Lists every active plan across all tenants
    ///
    /// The worker refreshes its plan mirror from this.
    pub async fn list_all_active(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let plans = sqlx::query_as::<_, HuntPlan>(
            r#"
            SELECT id, tenant_id, name, origin_lat, origin_lon, origin_radius_miles,
                   dest_lat, dest_lon, dest_radius_miles, equipment,
                   min_rate_per_mile_cents, active, created_at, updated_at
            FROM hunt_plans
            WHERE active = TRUE
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(plans)
    }
}

/// A stored hunt match: one plan hit one ingested load
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct HuntMatch {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub hunt_plan_id: Uuid,
    pub load_id: Uuid,

    /// Match score, higher is better
    pub score: f64,

    /// Distance from the plan's search center to the load origin
    pub origin_distance_miles: f64,

    pub created_at: DateTime<Utc>,
}

impl HuntMatch {
    /// Records a match; duplicate (plan, load) pairs are ignored
    pub async fn record(
        pool: &PgPool,
        scope: TenantScope,
        hunt_plan_id: Uuid,
        load_id: Uuid,
        score: f64,
        origin_distance_miles: f64,
    ) -> Result<Option<Self>, sqlx::Error> {
        let hunt_match = sqlx::query_as::<_, HuntMatch>(
            r#"
            INSERT INTO hunt_matches (tenant_id, hunt_plan_id, load_id, score, origin_distance_miles)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (hunt_plan_id, load_id) DO NOTHING
            RETURNING id, tenant_id, hunt_plan_id, load_id, score, origin_distance_miles, created_at
            "#,
        )
        .bind(scope.tenant_id())
        .bind(hunt_plan_id)
        .bind(load_id)
        .bind(score)
        .bind(origin_distance_miles)
        .fetch_optional(pool)
        .await?;

        Ok(hunt_match)
    }

    /// Lists recent matches in the scoped tenant, best-scoring first
    pub async fn list(
        pool: &PgPool,
        scope: TenantScope,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let matches = sqlx::query_as::<_, HuntMatch>(
            r#"
            SELECT id, tenant_id, hunt_plan_id, load_id, score, origin_distance_miles, created_at
            FROM hunt_matches
            WHERE tenant_id = $1
            ORDER BY created_at DESC, score DESC
            LIMIT $2
            "#,
        )
        .bind(scope.tenant_id())
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destination_requires_all_three_fields() {
        let mut plan = HuntPlan {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            name: "Midwest van".to_string(),
            origin_lat: 41.8781,
            origin_lon: -87.6298,
            origin_radius_miles: 150.0,
            dest_lat: Some(32.7767),
            dest_lon: Some(-96.7970),
            dest_radius_miles: None,
            equipment: vec![],
            min_rate_per_mile_cents: None,
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert!(plan.destination().is_none());

        plan.dest_radius_miles = Some(100.0);
        assert!(plan.destination().is_some());
    }
}
