/// Load model and database operations
///
/// Loads are the core entity of the system: a shipment with an origin and a
/// destination, a linehaul rate, and a dispatch lifecycle.
///
/// # State Machine
///
/// ```text
/// draft → available → assigned → in_transit → delivered → invoiced
/// draft | available | assigned | in_transit → cancelled
/// ```
///
/// # Schema
///
/// ```sql
/// CREATE TYPE load_status AS ENUM (
///     'draft', 'available', 'assigned', 'in_transit', 'delivered', 'invoiced', 'cancelled'
/// );
///
/// CREATE TABLE loads (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     tenant_id UUID NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
///     reference VARCHAR(50) NOT NULL,
///     status load_status NOT NULL DEFAULT 'draft',
///     origin_city VARCHAR(100) NOT NULL,
///     origin_state VARCHAR(2) NOT NULL,
///     origin_lat DOUBLE PRECISION,
///     origin_lon DOUBLE PRECISION,
///     -- ... destination columns, windows, rate, broker, assignment ...
///     UNIQUE (tenant_id, reference)
/// );
/// ```

use crate::geo::Coordinates;
use crate::tenancy::TenantScope;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Load dispatch lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "load_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LoadStatus {
    /// Being drafted, not yet on the board
    Draft,

    /// On the board, awaiting assignment
    Available,

    /// Assigned to a driver and vehicle
    Assigned,

    /// Picked up, en route
    InTransit,

    /// Delivered, awaiting invoicing
    Delivered,

    /// Invoiced; terminal
    Invoiced,

    /// Cancelled; terminal
    Cancelled,
}

impl LoadStatus {
    /// Converts status to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadStatus::Draft => "draft",
            LoadStatus::Available => "available",
            LoadStatus::Assigned => "assigned",
            LoadStatus::InTransit => "in_transit",
            LoadStatus::Delivered => "delivered",
            LoadStatus::Invoiced => "invoiced",
            LoadStatus::Cancelled => "cancelled",
        }
    }

    /// Checks if status is terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoadStatus::Invoiced | LoadStatus::Cancelled)
    }

    /// Checks if transition to target status is valid
    pub fn can_transition_to(&self, target: LoadStatus) -> bool {
        match (self, target) {
            (LoadStatus::Draft, LoadStatus::Available) => true,
            (LoadStatus::Available, LoadStatus::Assigned) => true,
            (LoadStatus::Assigned, LoadStatus::InTransit) => true,
            // Un-assignment puts the load back on the board
            (LoadStatus::Assigned, LoadStatus::Available) => true,
            (LoadStatus::InTransit, LoadStatus::Delivered) => true,
            (LoadStatus::Delivered, LoadStatus::Invoiced) => true,

            // Any non-terminal, non-delivered state can be cancelled
            (
                LoadStatus::Draft | LoadStatus::Available | LoadStatus::Assigned | LoadStatus::InTransit,
                LoadStatus::Cancelled,
            ) => true,

            _ => false,
        }
    }
}

/// Trailer equipment category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Equipment {
    Van,
    Reefer,
    Flatbed,
    Stepdeck,
    Other,
}

impl Equipment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Equipment::Van => "van",
            Equipment::Reefer => "reefer",
            Equipment::Flatbed => "flatbed",
            Equipment::Stepdeck => "stepdeck",
            Equipment::Other => "other",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "van" => Some(Equipment::Van),
            "reefer" => Some(Equipment::Reefer),
            "flatbed" => Some(Equipment::Flatbed),
            "stepdeck" => Some(Equipment::Stepdeck),
            "other" => Some(Equipment::Other),
            _ => None,
        }
    }
}

/// Where a load entered the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadSource {
    /// Entered by a dispatcher
    Manual,

    /// Ingested from an inbound broker email
    Email,
}

impl LoadSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadSource::Manual => "manual",
            LoadSource::Email => "email",
        }
    }
}

/// One end of a load: place plus an optional appointment window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stop {
    pub city: String,

    /// Two-letter state code
    pub state: String,

    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub window_open: Option<DateTime<Utc>>,
    pub window_close: Option<DateTime<Utc>>,
}

impl Stop {
    /// Coordinates when both latitude and longitude are recorded
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon)),
            _ => None,
        }
    }
}

/// Load row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Load {
    pub id: Uuid,
    pub tenant_id: Uuid,

    /// Dispatch reference number, unique per tenant
    pub reference: String,

    pub status: LoadStatus,

    pub origin_city: String,
    pub origin_state: String,
    pub origin_lat: Option<f64>,
    pub origin_lon: Option<f64>,
    pub origin_window_open: Option<DateTime<Utc>>,
    pub origin_window_close: Option<DateTime<Utc>>,

    pub dest_city: String,
    pub dest_state: String,
    pub dest_lat: Option<f64>,
    pub dest_lon: Option<f64>,
    pub dest_window_open: Option<DateTime<Utc>>,
    pub dest_window_close: Option<DateTime<Utc>>,

    pub equipment: String,

    /// Linehaul rate in cents
    pub rate_cents: i64,

    /// Loaded miles, when known
    pub distance_miles: Option<f64>,

    /// Recorded transit time, for hourly pay formulas
    pub transit_hours: Option<f64>,

    pub broker_name: Option<String>,
    pub broker_mc: Option<String>,

    /// Broker credit rating recorded at ingestion ('approved', 'declined', 'unknown')
    pub broker_credit: Option<String>,

    pub driver_id: Option<Uuid>,
    pub vehicle_id: Option<Uuid>,

    pub source: String,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Load {
    /// Origin as a [`Stop`]
    pub fn origin(&self) -> Stop {
        Stop {
            city: self.origin_city.clone(),
            state: self.origin_state.clone(),
            lat: self.origin_lat,
            lon: self.origin_lon,
            window_open: self.origin_window_open,
            window_close: self.origin_window_close,
        }
    }

    /// Destination as a [`Stop`]
    pub fn destination(&self) -> Stop {
        Stop {
            city: self.dest_city.clone(),
            state: self.dest_state.clone(),
            lat: self.dest_lat,
            lon: self.dest_lon,
            window_open: self.dest_window_open,
            window_close: self.dest_window_close,
        }
    }

    /// Rate per loaded mile in cents, when distance is known and positive
    pub fn rate_per_mile_cents(&self) -> Option<i64> {
        match self.distance_miles {
            Some(miles) if miles > 0.0 => Some((self.rate_cents as f64 / miles).round() as i64),
            _ => None,
        }
    }

    /// Parsed equipment category
    pub fn get_equipment(&self) -> Option<Equipment> {
        Equipment::from_str(&self.equipment)
    }
}

/// Input for creating a load
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLoad {
    pub reference: String,
    pub origin: Stop,
    pub destination: Stop,
    pub equipment: Equipment,
    pub rate_cents: i64,
    pub distance_miles: Option<f64>,
    pub broker_name: Option<String>,
    pub broker_mc: Option<String>,
    pub broker_credit: Option<String>,
    pub source: LoadSource,
    pub created_by: Option<Uuid>,
}

/// Input for updating a load's editable fields
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateLoad {
    pub rate_cents: Option<i64>,
    pub distance_miles: Option<f64>,
    pub transit_hours: Option<f64>,
    pub equipment: Option<Equipment>,
    pub broker_name: Option<String>,
    pub broker_mc: Option<String>,
}

impl Load {
    /// Creates a load in the scoped tenant
    ///
    /// # Errors
    ///
    /// Returns a constraint violation when the reference is already used in
    /// the tenant.
    pub async fn create(
        pool: &PgPool,
        scope: TenantScope,
        data: CreateLoad,
    ) -> Result<Self, sqlx::Error> {
        let load = sqlx::query_as::<_, Load>(
            r#"
            INSERT INTO loads (
                tenant_id, reference,
                origin_city, origin_state, origin_lat, origin_lon,
                origin_window_open, origin_window_close,
                dest_city, dest_state, dest_lat, dest_lon,
                dest_window_open, dest_window_close,
                equipment, rate_cents, distance_miles,
                broker_name, broker_mc, broker_credit, source, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
                    $13, $14, $15, $16, $17, $18, $19, $20, $21, $22)
            RETURNING *
            "#,
        )
        .bind(scope.tenant_id())
        .bind(data.reference)
        .bind(data.origin.city)
        .bind(data.origin.state)
        .bind(data.origin.lat)
        .bind(data.origin.lon)
        .bind(data.origin.window_open)
        .bind(data.origin.window_close)
        .bind(data.destination.city)
        .bind(data.destination.state)
        .bind(data.destination.lat)
        .bind(data.destination.lon)
        .bind(data.destination.window_open)
        .bind(data.destination.window_close)
        .bind(data.equipment.as_str())
        .bind(data.rate_cents)
        .bind(data.distance_miles)
        .bind(data.broker_name)
        .bind(data.broker_mc)
        .bind(data.broker_credit)
        .bind(data.source.as_str())
        .bind(data.created_by)
        .fetch_one(pool)
        .await?;

        Ok(load)
    }

    /// Finds a load by ID within the scoped tenant
    pub async fn find_by_id(
        pool: &PgPool,
        scope: TenantScope,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let load = sqlx::query_as::<_, Load>(
            "SELECT * FROM loads WHERE tenant_id = $1 AND id = $2",
        )
        .bind(scope.tenant_id())
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(load)
    }

    /// Updates editable fields; only non-None fields are written
    pub async fn update(
        pool: &PgPool,
        scope: TenantScope,
        id: Uuid,
        data: UpdateLoad,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE loads SET updated_at = NOW()");
        let mut bind_count = 2;

        if data.rate_cents.is_some() {
            bind_count += 1;
            query.push_str(&format!(", rate_cents = ${}", bind_count));
        }
        if data.distance_miles.is_some() {
            bind_count += 1;
            query.push_str(&format!(", distance_miles = ${}", bind_count));
        }
        if data.transit_hours.is_some() {
            bind_count += 1;
            query.push_str(&format!(", transit_hours = ${}", bind_count));
        }
        if data.equipment.is_some() {
            bind_count += 1;
            query.push_str(&format!(", equipment = ${}", bind_count));
        }
        if data.broker_name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", broker_name = ${}", bind_count));
        }
        if data.broker_mc.is_some() {
            bind_count += 1;
            query.push_str(&format!(", broker_mc = ${}", bind_count));
        }

        query.push_str(" WHERE tenant_id = $1 AND id = $2 RETURNING *");

        let mut q = sqlx::query_as::<_, Load>(&query)
            .bind(scope.tenant_id())
            .bind(id);

        if let Some(rate) = data.rate_cents {
            q = q.bind(rate);
        }
        if let Some(miles) = data.distance_miles {
            q = q.bind(miles);
        }
        if let Some(hours) = data.transit_hours {
            q = q.bind(hours);
        }
        if let Some(equipment) = data.equipment {
            q = q.bind(equipment.as_str());
        }
        if let Some(name) = data.broker_name {
            q = q.bind(name);
        }
        if let Some(mc) = data.broker_mc {
            q = q.bind(mc);
        }

        let load = q.fetch_optional(pool).await?;

        Ok(load)
    }

    /// Assigns a driver and vehicle, moving `available → assigned`
    ///
    /// The status guard is in the WHERE clause so a concurrent assignment
    /// loses cleanly (affects zero rows) instead of double-assigning.
    pub async fn assign(
        pool: &PgPool,
        scope: TenantScope,
        id: Uuid,
        driver_id: Uuid,
        vehicle_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let load = sqlx::query_as::<_, Load>(
            r#"
            UPDATE loads
            SET status = 'assigned', driver_id = $3, vehicle_id = $4, updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2 AND status = 'available'
            RETURNING *
            "#,
        )
        .bind(scope.tenant_id())
        .bind(id)
        .bind(driver_id)
        .bind(vehicle_id)
        .fetch_optional(pool)
        .await?;

        Ok(load)
    }

    /// Transitions a load to a new status
    ///
    /// The caller validates the edge with [`LoadStatus::can_transition_to`];
    /// this method re-checks the current status in SQL so a stale caller
    /// cannot force an illegal edge. Moving to `delivered` stamps
    /// `delivered_at`; leaving `assigned`/`in_transit` for `available` clears
    /// the assignment.
    pub async fn transition(
        pool: &PgPool,
        scope: TenantScope,
        id: Uuid,
        from: LoadStatus,
        to: LoadStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        let load = sqlx::query_as::<_, Load>(
            r#"
            UPDATE loads
            SET status = $4,
                delivered_at = CASE WHEN $4 = 'delivered'::load_status THEN NOW() ELSE delivered_at END,
                driver_id = CASE WHEN $4 = 'available'::load_status THEN NULL ELSE driver_id END,
                vehicle_id = CASE WHEN $4 = 'available'::load_status THEN NULL ELSE vehicle_id END,
                updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2 AND status = $3
            RETURNING *
            "#,
        )
        .bind(scope.tenant_id())
        .bind(id)
        .bind(from)
        .bind(to)
        .fetch_optional(pool)
        .await?;

        Ok(load)
    }

    /// Deletes a load within the scoped tenant
    pub async fn delete(pool: &PgPool, scope: TenantScope, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM loads WHERE tenant_id = $1 AND id = $2")
            .bind(scope.tenant_id())
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists loads in the scoped tenant, optionally filtered by status,
    /// newest first
    pub async fn list(
        pool: &PgPool,
        scope: TenantScope,
        status: Option<LoadStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let loads = sqlx::query_as::<_, Load>(
            r#"
            SELECT * FROM loads
            WHERE tenant_id = $1 AND ($2::load_status IS NULL OR status = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(scope.tenant_id())
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(loads)
    }

    /// Lists delivered loads for a driver in a date range, oldest first
    pub async fn list_delivered_for_driver(
        pool: &PgPool,
        scope: TenantScope,
        driver_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let loads = sqlx::query_as::<_, Load>(
            r#"
            SELECT * FROM loads
            WHERE tenant_id = $1 AND driver_id = $2
              AND status IN ('delivered', 'invoiced')
              AND delivered_at >= $3 AND delivered_at < $4
            ORDER BY delivered_at ASC
            "#,
        )
        .bind(scope.tenant_id())
        .bind(driver_id)
        .bind(from)
        .bind(to)
        .fetch_all(pool)
        .await?;

        Ok(loads)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        assert!(LoadStatus::Draft.can_transition_to(LoadStatus::Available));
        assert!(LoadStatus::Available.can_transition_to(LoadStatus::Assigned));
        assert!(LoadStatus::Assigned.can_transition_to(LoadStatus::InTransit));
        assert!(LoadStatus::InTransit.can_transition_to(LoadStatus::Delivered));
        assert!(LoadStatus::Delivered.can_transition_to(LoadStatus::Invoiced));
    }

    #[test]
    fn test_cancel_edges() {
        assert!(LoadStatus::Draft.can_transition_to(LoadStatus::Cancelled));
        assert!(LoadStatus::Available.can_transition_to(LoadStatus::Cancelled));
        assert!(LoadStatus::Assigned.can_transition_to(LoadStatus::Cancelled));
        assert!(LoadStatus::InTransit.can_transition_to(LoadStatus::Cancelled));

        // Delivered and terminal loads cannot be cancelled
        assert!(!LoadStatus::Delivered.can_transition_to(LoadStatus::Cancelled));
        assert!(!LoadStatus::Invoiced.can_transition_to(LoadStatus::Cancelled));
        assert!(!LoadStatus::Cancelled.can_transition_to(LoadStatus::Cancelled));
    }

    #[test]
    fn test_unassignment_returns_to_board() {
        assert!(LoadStatus::Assigned.can_transition_to(LoadStatus::Available));
        assert!(!LoadStatus::InTransit.can_transition_to(LoadStatus::Available));
    }

    #[test]
    fn test_no_skipping_states() {
        assert!(!LoadStatus::Draft.can_transition_to(LoadStatus::Assigned));
        assert!(!LoadStatus::Available.can_transition_to(LoadStatus::Delivered));
        assert!(!LoadStatus::Delivered.can_transition_to(LoadStatus::Draft));
    }

    #[test]
    fn test_terminal_states() {
        assert!(LoadStatus::Invoiced.is_terminal());
        assert!(LoadStatus::Cancelled.is_terminal());
        assert!(!LoadStatus::Delivered.is_terminal());
    }

    #[test]
    fn test_rate_per_mile() {
        let mut load = sample_load();
        load.rate_cents = 250_000;
        load.distance_miles = Some(1_000.0);
        assert_eq!(load.rate_per_mile_cents(), Some(250));

        load.distance_miles = None;
        assert_eq!(load.rate_per_mile_cents(), None);
    }

    #[test]
    fn test_stop_coordinates() {
        let load = sample_load();
        let origin = load.origin();
        assert!(origin.coordinates().is_some());

        let dest = load.destination();
        assert!(dest.coordinates().is_none());
    }

    fn sample_load() -> Load {
        Load {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            reference: "L-1001".to_string(),
            status: LoadStatus::Draft,
            origin_city: "Chicago".to_string(),
            origin_state: "IL".to_string(),
            origin_lat: Some(41.8781),
            origin_lon: Some(-87.6298),
            origin_window_open: None,
            origin_window_close: None,
            dest_city: "Dallas".to_string(),
            dest_state: "TX".to_string(),
            dest_lat: None,
            dest_lon: None,
            dest_window_open: None,
            dest_window_close: None,
            equipment: "van".to_string(),
            rate_cents: 0,
            distance_miles: None,
            transit_hours: None,
            broker_name: None,
            broker_mc: None,
            broker_credit: None,
            driver_id: None,
            vehicle_id: None,
            source: "manual".to_string(),
            delivered_at: None,
            created_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}
