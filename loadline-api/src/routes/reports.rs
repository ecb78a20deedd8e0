/// Billing and financial reports
///
/// # Endpoints
///
/// - `GET /v1/reports/revenue?from=..&to=..` - Tenant revenue summary
/// - `GET /v1/reports/driver-pay/:driver_id?from=..&to=..` - Pay statement
///
/// Reports are computed on read from the loads table and each driver's pay
/// formula; nothing is materialized.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::effective_scope,
};
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use loadline_shared::{
    auth::{authorization, middleware::AuthContext},
    billing::{DriverPayLine, PayFormula, RevenueSummary},
    models::driver::Driver,
    models::load::{Load, LoadStatus},
    models::membership::MembershipRole,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Date range for a report
#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    /// Inclusive start
    pub from: DateTime<Utc>,

    /// Exclusive end
    pub to: DateTime<Utc>,
}

impl RangeQuery {
    fn validate(&self) -> ApiResult<()> {
        if self.from >= self.to {
            return Err(ApiError::BadRequest(
                "Range start must precede range end".to_string(),
            ));
        }
        Ok(())
    }
}

/// Revenue summary for the effective tenant over a date range
///
/// Delivered and invoiced loads are counted by delivery time; cancellations
/// by their last update.
pub async fn revenue_summary(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(range): Query<RangeQuery>,
) -> ApiResult<Json<RevenueSummary>> {
    range.validate()?;

    let scope = effective_scope(&state, &auth).await?;
    authorization::require_role(
        &state.db,
        scope.tenant_id(),
        auth.user_id,
        auth.platform_admin,
        MembershipRole::Dispatcher,
    )
    .await?;

    let loads = sqlx::query_as::<_, Load>(
        r#"
        SELECT * FROM loads
        WHERE tenant_id = $1
          AND (
            (status IN ('delivered', 'invoiced') AND delivered_at >= $2 AND delivered_at < $3)
            OR (status = 'cancelled' AND updated_at >= $2 AND updated_at < $3)
          )
        "#,
    )
    .bind(scope.tenant_id())
    .bind(range.from)
    .bind(range.to)
    .fetch_all(&state.db)
    .await?;

    let formulas = driver_formulas(&state, scope.tenant_id()).await?;

    let mut summary = RevenueSummary::default();
    for load in &loads {
        match load.status {
            LoadStatus::Cancelled => {
                summary.cancelled_count += 1;
                continue;
            }
            LoadStatus::Delivered => summary.delivered_count += 1,
            LoadStatus::Invoiced => summary.invoiced_count += 1,
            _ => continue,
        }

        summary.revenue_cents += load.rate_cents;
        summary.total_miles += load.distance_miles.unwrap_or(0.0);

        if let Some(driver_id) = load.driver_id {
            if let Some(formula) = formulas.get(&driver_id) {
                summary.driver_pay_cents +=
                    formula.pay_cents(load.rate_cents, load.distance_miles, load.transit_hours);
            }
        }
    }

    Ok(Json(summary))
}

/// Driver pay statement
#[derive(Debug, Serialize)]
pub struct DriverPayResponse {
    /// Driver ID
    pub driver_id: String,

    /// Pay formula kind in effect
    pub formula: String,

    /// One line per delivered load in range
    pub lines: Vec<DriverPayLine>,

    /// Total pay in cents
    pub total_pay_cents: i64,
}

/// Pay statement for one driver over a date range
pub async fn driver_pay(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(driver_id): Path<Uuid>,
    Query(range): Query<RangeQuery>,
) -> ApiResult<Json<DriverPayResponse>> {
    range.validate()?;

    let scope = effective_scope(&state, &auth).await?;
    authorization::require_role(
        &state.db,
        scope.tenant_id(),
        auth.user_id,
        auth.platform_admin,
        MembershipRole::Dispatcher,
    )
    .await?;

    let driver = Driver::find_by_id(&state.db, scope, driver_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Driver not found".to_string()))?;

    let formula = driver.formula();

    let loads =
        Load::list_delivered_for_driver(&state.db, scope, driver_id, range.from, range.to).await?;

    let lines: Vec<DriverPayLine> = loads
        .iter()
        .filter_map(|load| {
            let delivered_at = load.delivered_at?;
            Some(DriverPayLine {
                load_id: load.id,
                reference: load.reference.clone(),
                delivered_at,
                rate_cents: load.rate_cents,
                distance_miles: load.distance_miles,
                pay_cents: formula.pay_cents(load.rate_cents, load.distance_miles, load.transit_hours),
            })
        })
        .collect();

    let total_pay_cents = lines.iter().map(|l| l.pay_cents).sum();

    Ok(Json(DriverPayResponse {
        driver_id: driver_id.to_string(),
        formula: formula.kind().to_string(),
        lines,
        total_pay_cents,
    }))
}

/// Loads every driver's pay formula for a tenant in one query
async fn driver_formulas(
    state: &AppState,
    tenant_id: Uuid,
) -> Result<HashMap<Uuid, PayFormula>, sqlx::Error> {
    let rows: Vec<(Uuid, serde_json::Value)> =
        sqlx::query_as("SELECT id, pay_formula FROM drivers WHERE tenant_id = $1")
            .bind(tenant_id)
            .fetch_all(&state.db)
            .await?;

    Ok(rows
        .into_iter()
        .map(|(id, formula)| {
            (
                id,
                serde_json::from_value(formula).unwrap_or_default(),
            )
        })
        .collect())
}
