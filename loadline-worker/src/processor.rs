/// Ingestion processor
///
/// The main worker loop: poll the queue, process a batch concurrently,
/// sleep, repeat. Each email independently parses, credit-checks, creates
/// its load, and records hunt matches; one bad email never takes down the
/// batch.
///
/// # Architecture
///
/// ```text
/// Processor
///   ├─> EmailQueue:  claim pending emails (pending → parsing)
///   ├─> parse_offer: subject/body → LoadOffer
///   ├─> CreditCheckClient: rate the broker (advisory)
///   ├─> Load::create: offer → board entry (source = email)
///   ├─> PlanMirror + match_offer: score against active hunt plans
///   └─> EmailQueue:  mark done / record failure
/// ```

use crate::config::WorkerConfig;
use crate::credit::{CreditCheckClient, CreditRating};
use crate::matcher::{record_matches, PlanMirror};
use crate::queue::EmailQueue;
use loadline_shared::geo::haversine_miles;
use loadline_shared::hunter::{match_offer, parse_offer, LoadOffer};
use loadline_shared::models::inbound_email::InboundEmail;
use loadline_shared::models::load::{CreateLoad, Equipment, Load, LoadSource, Stop};
use loadline_shared::tenancy::TenantScope;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Ingestion processor
pub struct Processor {
    db: PgPool,
    queue: EmailQueue,
    credit: Arc<dyn CreditCheckClient>,
    config: WorkerConfig,
}

impl Processor {
    /// Creates a processor
    pub fn new(db: PgPool, credit: Arc<dyn CreditCheckClient>, config: WorkerConfig) -> Self {
        let queue = EmailQueue::new(db.clone(), config.max_attempts);
        Self {
            db,
            queue,
            credit,
            config,
        }
    }

    /// Runs the polling loop until the shutdown token fires
    pub async fn run(&self, shutdown: CancellationToken) {
        let mut mirror = PlanMirror::new(Duration::from_secs(self.config.plan_refresh_secs));
        let poll = Duration::from_secs(self.config.poll_interval_secs);

        info!(
            batch_size = self.config.batch_size,
            poll_interval_secs = self.config.poll_interval_secs,
            "ingestion worker started"
        );

        loop {
            if mirror.is_stale() {
                if let Err(e) = mirror.refresh(&self.db).await {
                    warn!(error = %e, "hunt plan refresh failed, keeping stale mirror");
                }
            }

            match self.queue.claim_batch(self.config.batch_size).await {
                Ok(emails) if !emails.is_empty() => {
                    info!(count = emails.len(), "claimed inbound emails");

                    futures::future::join_all(
                        emails
                            .into_iter()
                            .map(|email| self.process_email(email, &mirror)),
                    )
                    .await;

                    match self.queue.failed_count().await {
                        Ok(0) | Err(_) => {}
                        Ok(stuck) => warn!(stuck, "emails awaiting manual reset"),
                    }
                }
                Ok(_) => {}
                Err(e) => error!(error = %e, "claim failed"),
            }

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = sleep(poll) => {}
            }
        }

        info!("ingestion worker stopped");
    }

    /// Processes one claimed email end to end
    async fn process_email(&self, email: InboundEmail, mirror: &PlanMirror) {
        let scope = TenantScope::new(email.tenant_id);

        let offer = match parse_offer(&email.subject, &email.body) {
            Ok(offer) => offer,
            Err(e) => {
                self.fail(email.id, &e.to_string()).await;
                return;
            }
        };

        // A reset email that already produced a load reuses it instead of
        // colliding on the reference.
        let existing = match email.load_id {
            Some(load_id) => match Load::find_by_id(&self.db, scope, load_id).await {
                Ok(load) => load,
                Err(e) => {
                    self.fail(email.id, &format!("load lookup failed: {}", e)).await;
                    return;
                }
            },
            None => None,
        };

        let load = match existing {
            Some(load) => load,
            None => {
                let rating = self
                    .credit
                    .check(offer.broker_name.as_deref(), offer.broker_mc.as_deref())
                    .await;

                let input = build_load_input(email.id, &offer, rating);
                match Load::create(&self.db, scope, input).await {
                    Ok(load) => load,
                    Err(e) => {
                        self.fail(email.id, &format!("load creation failed: {}", e)).await;
                        return;
                    }
                }
            }
        };

        let plans = mirror.plans_for_tenant(email.tenant_id);
        let outcomes = match_offer(&offer, &plans);

        if let Err(e) = record_matches(&self.db, scope, load.id, &outcomes).await {
            self.fail(email.id, &format!("match recording failed: {}", e)).await;
            return;
        }

        if let Err(e) = self
            .queue
            .mark_done(email.id, load.id, !outcomes.is_empty())
            .await
        {
            error!(email_id = %email.id, error = %e, "could not mark email done");
            return;
        }

        info!(
            email_id = %email.id,
            load_id = %load.id,
            matches = outcomes.len(),
            "ingested load offer"
        );
    }

    /// Records a failed attempt, logging if even that fails
    async fn fail(&self, email_id: Uuid, message: &str) {
        warn!(email_id = %email_id, error = message, "email processing failed");

        if let Err(e) = self.queue.mark_failure(email_id, message).await {
            error!(email_id = %email_id, error = %e, "could not record failure");
        }
    }
}

/// Builds the load row for a parsed offer
///
/// The reference is derived from the email id, so one email maps to one
/// load. Missing distance falls back to the great-circle distance when both
/// ends have coordinates.
pub(crate) fn build_load_input(
    email_id: Uuid,
    offer: &LoadOffer,
    rating: CreditRating,
) -> CreateLoad {
    let distance_miles = offer.distance_miles.or_else(|| {
        match (offer.origin_coords, offer.dest_coords) {
            (Some(a), Some(b)) => Some(haversine_miles(a, b)),
            _ => None,
        }
    });

    let email_hex = email_id.simple().to_string();

    CreateLoad {
        reference: format!("LH-{}", email_hex[..8].to_ascii_uppercase()),
        origin: Stop {
            city: offer.origin_city.clone(),
            state: offer.origin_state.clone(),
            lat: offer.origin_coords.map(|c| c.lat),
            lon: offer.origin_coords.map(|c| c.lon),
            window_open: None,
            window_close: None,
        },
        destination: Stop {
            city: offer.dest_city.clone(),
            state: offer.dest_state.clone(),
            lat: offer.dest_coords.map(|c| c.lat),
            lon: offer.dest_coords.map(|c| c.lon),
            window_open: None,
            window_close: None,
        },
        equipment: offer.equipment.unwrap_or(Equipment::Other),
        rate_cents: offer.rate_cents.unwrap_or(0),
        distance_miles,
        broker_name: offer.broker_name.clone(),
        broker_mc: offer.broker_mc.clone(),
        broker_credit: Some(rating.as_str().to_string()),
        source: LoadSource::Email,
        created_by: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loadline_shared::geo::Coordinates;

    fn offer() -> LoadOffer {
        LoadOffer {
            origin_city: "Chicago".to_string(),
            origin_state: "IL".to_string(),
            origin_coords: Some(Coordinates::new(41.8781, -87.6298)),
            dest_city: "Dallas".to_string(),
            dest_state: "TX".to_string(),
            dest_coords: Some(Coordinates::new(32.7767, -96.7970)),
            equipment: None,
            rate_cents: Some(245_000),
            distance_miles: None,
            broker_name: Some("Prime Freight Inc".to_string()),
            broker_mc: Some("654321".to_string()),
        }
    }

    #[test]
    fn test_reference_is_stable_per_email() {
        let email_id = Uuid::new_v4();
        let a = build_load_input(email_id, &offer(), CreditRating::Unknown);
        let b = build_load_input(email_id, &offer(), CreditRating::Unknown);

        assert_eq!(a.reference, b.reference);
        assert!(a.reference.starts_with("LH-"));
        assert_eq!(a.reference.len(), 11);
    }

    #[test]
    fn test_missing_distance_falls_back_to_great_circle() {
        let input = build_load_input(Uuid::new_v4(), &offer(), CreditRating::Approved);

        // Chicago -> Dallas is ~803 great-circle miles
        let miles = input.distance_miles.unwrap();
        assert!((miles - 803.0).abs() < 15.0, "was {}", miles);
        assert_eq!(input.broker_credit.as_deref(), Some("approved"));
    }

    #[test]
    fn test_unknown_equipment_defaults_to_other() {
        let input = build_load_input(Uuid::new_v4(), &offer(), CreditRating::Unknown);
        assert_eq!(input.equipment, Equipment::Other);
        assert_eq!(input.source, LoadSource::Email);
    }

    #[test]
    fn test_offer_without_coordinates_has_no_distance() {
        let mut o = offer();
        o.dest_coords = None;
        let input = build_load_input(Uuid::new_v4(), &o, CreditRating::Unknown);
        assert!(input.distance_miles.is_none());
    }
}
