/// Hunt-plan matching heuristic
///
/// An offer hits a plan when every configured filter passes:
///
/// - origin within the plan's search radius (requires offer coordinates)
/// - destination within the plan's lane radius, when the plan has one
/// - equipment in the plan's list, when the list is non-empty
/// - rate per mile at or above the plan's floor, when one is set
///
/// Scoring favors closer origins and richer rates: up to 100 points for
/// origin proximity (linear falloff across the radius) plus one point per
/// ten cents of rate-per-mile. Results come back best first.

use crate::hunter::parser::LoadOffer;
use crate::models::hunt_plan::HuntPlan;
use uuid::Uuid;

/// One plan the offer matched
#[derive(Debug, Clone, PartialEq)]
pub struct MatchOutcome {
    /// Matched plan
    pub hunt_plan_id: Uuid,

    /// Match score, higher is better
    pub score: f64,

    /// Distance from the plan's search center to the offer origin
    pub origin_distance_miles: f64,
}

/// Matches an offer against a set of hunt plans
///
/// Plans are assumed pre-filtered to the offer's tenant and to `active`.
/// Offers without origin coordinates match nothing, since every plan requires a
/// radius check.
pub fn match_offer(offer: &LoadOffer, plans: &[HuntPlan]) -> Vec<MatchOutcome> {
    let Some(origin) = offer.origin_coords else {
        return Vec::new();
    };

    let mut outcomes: Vec<MatchOutcome> = plans
        .iter()
        .filter_map(|plan| {
            let origin_distance = plan.origin().distance_miles(&origin);
            if origin_distance > plan.origin_radius_miles {
                return None;
            }

            if let Some((dest_center, dest_radius)) = plan.destination() {
                let dest = offer.dest_coords?;
                if dest_center.distance_miles(&dest) > dest_radius {
                    return None;
                }
            }

            if !plan.equipment.is_empty() {
                let equipment = offer.equipment?;
                if !plan.equipment.iter().any(|e| e == equipment.as_str()) {
                    return None;
                }
            }

            let rate_per_mile = offer.rate_per_mile_cents();
            if let Some(floor) = plan.min_rate_per_mile_cents {
                if rate_per_mile.unwrap_or(0) < floor {
                    return None;
                }
            }

            let score = score(origin_distance, plan.origin_radius_miles, rate_per_mile);

            Some(MatchOutcome {
                hunt_plan_id: plan.id,
                score,
                origin_distance_miles: origin_distance,
            })
        })
        .collect();

    outcomes.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    outcomes
}

fn score(origin_distance: f64, radius: f64, rate_per_mile_cents: Option<i64>) -> f64 {
    let proximity = if radius > 0.0 {
        100.0 * (1.0 - origin_distance / radius)
    } else {
        0.0
    };

    let rate_bonus = rate_per_mile_cents.unwrap_or(0) as f64 / 10.0;

    proximity + rate_bonus
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Coordinates;
    use crate::models::load::Equipment;
    use chrono::Utc;

    // Chicago-centered plan
    fn plan(radius: f64) -> HuntPlan {
        HuntPlan {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            name: "Chicago outbound".to_string(),
            origin_lat: 41.8781,
            origin_lon: -87.6298,
            origin_radius_miles: radius,
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

    // Offer picking up in Joliet, IL (~40 mi from Chicago)
    fn offer() -> LoadOffer {
        LoadOffer {
            origin_city: "Joliet".to_string(),
            origin_state: "IL".to_string(),
            origin_coords: Some(Coordinates::new(41.5250, -88.0817)),
            dest_city: "Dallas".to_string(),
            dest_state: "TX".to_string(),
            dest_coords: Some(Coordinates::new(32.7767, -96.7970)),
            equipment: Some(Equipment::Van),
            rate_cents: Some(245_000),
            distance_miles: Some(925.0),
            broker_name: None,
            broker_mc: None,
        }
    }

    #[test]
    fn test_offer_within_radius_matches() {
        let plans = vec![plan(150.0)];
        let matches = match_offer(&offer(), &plans);

        assert_eq!(matches.len(), 1);
        assert!(matches[0].origin_distance_miles < 50.0);
    }

    #[test]
    fn test_offer_outside_radius_does_not_match() {
        let plans = vec![plan(20.0)];
        assert!(match_offer(&offer(), &plans).is_empty());
    }

    #[test]
    fn test_offer_without_coordinates_matches_nothing() {
        let mut o = offer();
        o.origin_coords = None;
        assert!(match_offer(&o, &[plan(500.0)]).is_empty());
    }

    #[test]
    fn test_destination_lane_filter() {
        let mut p = plan(150.0);
        // Lane to Dallas
        p.dest_lat = Some(32.7767);
        p.dest_lon = Some(-96.7970);
        p.dest_radius_miles = Some(100.0);
        assert_eq!(match_offer(&offer(), &[p.clone()]).len(), 1);

        // Lane to Denver misses a Dallas delivery
        p.dest_lat = Some(39.7392);
        p.dest_lon = Some(-104.9903);
        assert!(match_offer(&offer(), &[p]).is_empty());
    }

    #[test]
    fn test_equipment_filter() {
        let mut p = plan(150.0);
        p.equipment = vec!["reefer".to_string(), "van".to_string()];
        assert_eq!(match_offer(&offer(), &[p.clone()]).len(), 1);

        p.equipment = vec!["flatbed".to_string()];
        assert!(match_offer(&offer(), &[p.clone()]).is_empty());

        // Unknown offer equipment fails a non-empty list
        p.equipment = vec!["van".to_string()];
        let mut o = offer();
        o.equipment = None;
        assert!(match_offer(&o, &[p]).is_empty());
    }

    #[test]
    fn test_rate_floor_filter() {
        // Offer pays ~265 cents/mile
        let mut p = plan(150.0);
        p.min_rate_per_mile_cents = Some(250);
        assert_eq!(match_offer(&offer(), &[p.clone()]).len(), 1);

        p.min_rate_per_mile_cents = Some(300);
        assert!(match_offer(&offer(), &[p.clone()]).is_empty());

        // Unknown rate fails any floor
        p.min_rate_per_mile_cents = Some(1);
        let mut o = offer();
        o.rate_cents = None;
        assert!(match_offer(&o, &[p]).is_empty());
    }

    #[test]
    fn test_matches_sorted_best_first() {
        let near = plan(150.0);
        let mut far = plan(150.0);
        // Indianapolis-centered plan, ~165 mi from Joliet: still inside a
        // 200-mile radius but much farther than the Chicago plan.
        far.origin_lat = 39.7684;
        far.origin_lon = -86.1581;
        far.origin_radius_miles = 200.0;

        let matches = match_offer(&offer(), &[far.clone(), near.clone()]);

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].hunt_plan_id, near.id);
        assert!(matches[0].score > matches[1].score);
    }
}
