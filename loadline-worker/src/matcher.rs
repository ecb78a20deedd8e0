/// Hunt-plan mirror and match persistence
///
/// The worker keeps an in-memory mirror of every active hunt plan,
/// refreshed on an interval. Refreshes replace the whole set; between
/// refreshes the mirror serves reads without touching the database, which
/// keeps per-email matching cheap. Merge semantics are last-write-wins by
/// row id (see [`loadline_shared::sync::RowCache`]).

use loadline_shared::hunter::MatchOutcome;
use loadline_shared::models::hunt_plan::{HuntMatch, HuntPlan};
use loadline_shared::sync::RowCache;
use loadline_shared::tenancy::TenantScope;
use sqlx::PgPool;
use std::time::{Duration, Instant};
use tracing::debug;
use uuid::Uuid;

/// Mirror of active hunt plans
pub struct PlanMirror {
    cache: RowCache<HuntPlan>,
    refresh_interval: Duration,
    last_refresh: Option<Instant>,
}

impl PlanMirror {
    /// Creates an empty mirror with a refresh interval
    pub fn new(refresh_interval: Duration) -> Self {
        Self {
            cache: RowCache::new(),
            refresh_interval,
            last_refresh: None,
        }
    }

    /// Whether the mirror is due for a refresh
    pub fn is_stale(&self) -> bool {
        match self.last_refresh {
            Some(at) => at.elapsed() >= self.refresh_interval,
            None => true,
        }
    }

    /// Replaces the mirror with the current set of active plans
    pub async fn refresh(&mut self, pool: &PgPool) -> Result<(), sqlx::Error> {
        let plans = HuntPlan::list_all_active(pool).await?;
        debug!(count = plans.len(), "refreshed hunt plan mirror");

        self.cache.replace_all(plans);
        self.last_refresh = Some(Instant::now());

        Ok(())
    }

    /// Active plans for one tenant
    pub fn plans_for_tenant(&self, tenant_id: Uuid) -> Vec<HuntPlan> {
        self.cache
            .iter()
            .filter(|p| p.tenant_id == tenant_id)
            .cloned()
            .collect()
    }

    /// Number of mirrored plans
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Whether the mirror holds no plans
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

/// Persists match outcomes for an ingested load
///
/// Duplicate (plan, load) pairs are silently skipped, so re-processing an
/// email after a partial failure does not double-record.
pub async fn record_matches(
    pool: &PgPool,
    scope: TenantScope,
    load_id: Uuid,
    outcomes: &[MatchOutcome],
) -> Result<usize, sqlx::Error> {
    let mut recorded = 0;

    for outcome in outcomes {
        let inserted = HuntMatch::record(
            pool,
            scope,
            outcome.hunt_plan_id,
            load_id,
            outcome.score,
            outcome.origin_distance_miles,
        )
        .await?;

        if inserted.is_some() {
            recorded += 1;
        }
    }

    Ok(recorded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn plan(tenant_id: Uuid) -> HuntPlan {
        HuntPlan {
            id: Uuid::new_v4(),
            tenant_id,
            name: "test".to_string(),
            origin_lat: 0.0,
            origin_lon: 0.0,
            origin_radius_miles: 100.0,
            dest_lat: None,
            dest_lon: None,
            dest_radius_miles: None,
            equipment: vec![],
            min_rate_per_mile_cents: None,
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_new_mirror_is_stale() {
        let mirror = PlanMirror::new(Duration::from_secs(60));
        assert!(mirror.is_stale());
        assert!(mirror.is_empty());
    }

    #[test]
    fn test_plans_are_filtered_by_tenant() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        let mut mirror = PlanMirror::new(Duration::from_secs(60));
        mirror.cache.merge(vec![plan(a), plan(a), plan(b)]);

        assert_eq!(mirror.plans_for_tenant(a).len(), 2);
        assert_eq!(mirror.plans_for_tenant(b).len(), 1);
        assert_eq!(mirror.plans_for_tenant(Uuid::new_v4()).len(), 0);
    }
}
