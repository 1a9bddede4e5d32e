//! Market price aggregation

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{MarketSubmission, PricePoint};

/// Daily mean price for one crop, ascending by date.
///
/// Only submissions for `crop_name` created at or after `since` are counted.
/// Days without submissions are omitted.
pub fn daily_price_trend(
    submissions: &[MarketSubmission],
    crop_name: &str,
    since: DateTime<Utc>,
) -> Vec<PricePoint> {
    let mut by_day: BTreeMap<NaiveDate, (Decimal, u32)> = BTreeMap::new();

    for submission in submissions
        .iter()
        .filter(|s| s.crop_name == crop_name && s.created_at >= since)
    {
        let entry = by_day
            .entry(submission.created_at.date_naive())
            .or_insert((Decimal::ZERO, 0));
        entry.0 += submission.price_per_kg;
        entry.1 += 1;
    }

    by_day
        .into_iter()
        .map(|(date, (total, count))| PricePoint {
            date,
            average_price: (total / Decimal::from(count)).round_dp(2),
            submissions: count,
        })
        .collect()
}

/// Latest price of a crop compared with the mean of its earlier submissions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceMovement {
    pub crop_name: String,
    pub latest_price: Decimal,
    pub baseline_price: Decimal,
    /// Signed percentage change from baseline to latest
    pub change_percent: Decimal,
}

/// Per-crop price movements, ordered by crop name.
///
/// A crop needs at least two submissions to have a movement. The latest
/// submission is the one with the greatest `created_at`; on ties the first
/// in input order wins.
pub fn price_movements(submissions: &[MarketSubmission]) -> Vec<PriceMovement> {
    let mut by_crop: BTreeMap<&str, Vec<&MarketSubmission>> = BTreeMap::new();
    for submission in submissions {
        by_crop
            .entry(submission.crop_name.as_str())
            .or_default()
            .push(submission);
    }

    by_crop
        .into_iter()
        .filter_map(|(crop, entries)| movement_for(crop, &entries))
        .collect()
}

fn movement_for(crop: &str, entries: &[&MarketSubmission]) -> Option<PriceMovement> {
    if entries.len() < 2 {
        return None;
    }

    let mut latest_idx = 0;
    for (idx, entry) in entries.iter().enumerate().skip(1) {
        if entry.created_at > entries[latest_idx].created_at {
            latest_idx = idx;
        }
    }

    let latest_price = entries[latest_idx].price_per_kg;
    let earlier: Decimal = entries
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != latest_idx)
        .map(|(_, e)| e.price_per_kg)
        .sum();
    let baseline_price = earlier / Decimal::from(entries.len() - 1);

    if baseline_price.is_zero() {
        return None;
    }

    Some(PriceMovement {
        crop_name: crop.to_string(),
        latest_price,
        baseline_price,
        change_percent: (latest_price - baseline_price) / baseline_price * Decimal::ONE_HUNDRED,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use uuid::Uuid;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
    }

    fn submission(crop: &str, price: Decimal, created_at: DateTime<Utc>) -> MarketSubmission {
        MarketSubmission {
            id: Uuid::new_v4(),
            crop_name: crop.to_string(),
            price_per_kg: price,
            submitted_by: None,
            created_at,
        }
    }

    #[test]
    fn test_daily_trend_groups_and_rounds() {
        let subs = vec![
            submission("Maize", Decimal::from(450), at(2, 9)),
            submission("Maize", Decimal::from(460), at(2, 15)),
            submission("Maize", Decimal::from(471), at(2, 17)),
            submission("Maize", Decimal::from(500), at(1, 10)),
            submission("Rice (Local)", Decimal::from(900), at(2, 10)),
        ];

        let trend = daily_price_trend(&subs, "Maize", at(1, 0));
        assert_eq!(trend.len(), 2);
        assert_eq!(trend[0].date, at(1, 0).date_naive());
        assert_eq!(trend[0].average_price, Decimal::from(500));
        assert_eq!(trend[1].average_price, Decimal::new(46033, 2));
        assert_eq!(trend[1].submissions, 3);
    }

    #[test]
    fn test_daily_trend_respects_window() {
        let subs = vec![
            submission("Yam", Decimal::from(300), at(1, 10)),
            submission("Yam", Decimal::from(320), at(10, 10)),
        ];
        let trend = daily_price_trend(&subs, "Yam", at(10, 0) - Duration::hours(1));
        assert_eq!(trend.len(), 1);
        assert_eq!(trend[0].average_price, Decimal::from(320));
    }

    #[test]
    fn test_movement_needs_two_submissions() {
        let subs = vec![submission("Millet", Decimal::from(400), at(5, 10))];
        assert!(price_movements(&subs).is_empty());
    }

    #[test]
    fn test_movement_against_earlier_mean() {
        let subs = vec![
            submission("Cassava", Decimal::from(120), at(5, 10)),
            submission("Cassava", Decimal::from(100), at(3, 10)),
            submission("Cassava", Decimal::from(100), at(4, 10)),
        ];
        let movements = price_movements(&subs);
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].latest_price, Decimal::from(120));
        assert_eq!(movements[0].baseline_price, Decimal::from(100));
        assert_eq!(movements[0].change_percent, Decimal::from(20));
    }

    #[test]
    fn test_movements_sorted_by_crop() {
        let subs = vec![
            submission("Yam", Decimal::from(10), at(2, 1)),
            submission("Yam", Decimal::from(11), at(1, 1)),
            submission("Maize", Decimal::from(10), at(2, 1)),
            submission("Maize", Decimal::from(12), at(1, 1)),
        ];
        let crops: Vec<_> = price_movements(&subs)
            .into_iter()
            .map(|m| m.crop_name)
            .collect();
        assert_eq!(crops, vec!["Maize", "Yam"]);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        const CROPS: [&str; 3] = ["Maize", "Sorghum", "Yam"];

        proptest! {
            #[test]
            fn test_one_movement_per_crop_with_history(
                entries in proptest::collection::vec((0usize..3, 1i64..50_000, 0i64..720), 0..30)
            ) {
                let subs: Vec<_> = entries
                    .iter()
                    .map(|(crop, cents, hours)| {
                        submission(CROPS[*crop], Decimal::new(*cents, 2), at(1, 0) + Duration::hours(*hours))
                    })
                    .collect();

                let movements = price_movements(&subs);
                let expected: Vec<&str> = CROPS
                    .iter()
                    .copied()
                    .filter(|crop| subs.iter().filter(|s| s.crop_name == *crop).count() >= 2)
                    .collect();
                let crops: Vec<&str> = movements.iter().map(|m| m.crop_name.as_str()).collect();
                prop_assert_eq!(crops, expected);

                for movement in &movements {
                    let direction = movement.latest_price.cmp(&movement.baseline_price);
                    prop_assert_eq!(movement.change_percent.cmp(&Decimal::ZERO), direction);
                }
            }

            #[test]
            fn test_trend_counts_every_matching_submission(
                hours in proptest::collection::vec(0i64..240, 0..25)
            ) {
                let subs: Vec<_> = hours
                    .iter()
                    .map(|h| submission("Maize", Decimal::from(400), at(1, 0) + Duration::hours(*h)))
                    .collect();

                let trend = daily_price_trend(&subs, "Maize", at(1, 0));
                let counted: u32 = trend.iter().map(|p| p.submissions).sum();
                prop_assert_eq!(counted as usize, subs.len());
                prop_assert!(trend.windows(2).all(|w| w[0].date < w[1].date));
                prop_assert!(trend.iter().all(|p| p.average_price == Decimal::from(400)));
            }
        }
    }
}
