use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ranking::score::Metrics;

/// Achievement labels. Tiers accumulate: a Gold holder also has Silver and Bronze.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Badge {
    Bronze,
    Silver,
    Gold,
    Diamond,
    Popular,
    Trending,
    Viral,
    Consistent,
    Dedicated,
    Unstoppable,
}

#[derive(Debug, Clone, Copy)]
enum Counter {
    Upvotes,
    Views,
    Streak,
}

const RULES: &[(Counter, u64, Badge)] = &[
    (Counter::Upvotes, 10, Badge::Bronze),
    (Counter::Upvotes, 50, Badge::Silver),
    (Counter::Upvotes, 200, Badge::Gold),
    (Counter::Upvotes, 10_000, Badge::Diamond),
    (Counter::Views, 100, Badge::Popular),
    (Counter::Views, 500, Badge::Trending),
    (Counter::Views, 2_000, Badge::Viral),
    (Counter::Streak, 3, Badge::Consistent),
    (Counter::Streak, 7, Badge::Dedicated),
    (Counter::Streak, 30, Badge::Unstoppable),
];

impl Badge {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bronze => "Bronze",
            Self::Silver => "Silver",
            Self::Gold => "Gold",
            Self::Diamond => "Diamond",
            Self::Popular => "Popular",
            Self::Trending => "Trending",
            Self::Viral => "Viral",
            Self::Consistent => "Consistent",
            Self::Dedicated => "Dedicated",
            Self::Unstoppable => "Unstoppable",
        }
    }
}

impl fmt::Display for Badge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every badge whose threshold the metrics reach, in rule order.
pub fn derive_badges(metrics: &Metrics) -> Vec<Badge> {
    RULES
        .iter()
        .filter(|(counter, threshold, _)| {
            let value = match counter {
                Counter::Upvotes => metrics.upvotes,
                Counter::Views => metrics.views,
                Counter::Streak => metrics.streak,
            };
            value >= *threshold
        })
        .map(|(_, _, badge)| *badge)
        .collect()
}

/// Badge labels as stored on the profile row.
pub fn badge_labels(metrics: &Metrics) -> Vec<String> {
    derive_badges(metrics)
        .into_iter()
        .map(|b| b.as_str().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn example_profile_gets_one_badge_per_category() {
        let badges = derive_badges(&Metrics::new(12, 150, 4));
        assert_eq!(
            badges,
            vec![Badge::Bronze, Badge::Popular, Badge::Consistent]
        );
    }

    #[test]
    fn tiers_accumulate() {
        let badges = derive_badges(&Metrics::new(250, 0, 0));
        assert_eq!(badges, vec![Badge::Bronze, Badge::Silver, Badge::Gold]);
    }

    #[test]
    fn thresholds_are_inclusive() {
        assert_eq!(derive_badges(&Metrics::new(9, 99, 2)), vec![]);
        assert_eq!(
            derive_badges(&Metrics::new(10, 100, 3)),
            vec![Badge::Bronze, Badge::Popular, Badge::Consistent]
        );
    }

    #[test]
    fn maxed_out_profile_has_every_badge() {
        let badges = derive_badges(&Metrics::new(10_000, 2_000, 30));
        assert_eq!(badges.len(), RULES.len());
        let unique: BTreeSet<_> = badges.iter().collect();
        assert_eq!(unique.len(), badges.len());
    }

    #[test]
    fn badge_sets_are_monotone_under_dominance() {
        let samples = [0u64, 3, 10, 50, 100, 200, 500, 2_000, 10_000];
        let streaks = [0u64, 3, 7, 30];
        let all: Vec<Metrics> = samples
            .iter()
            .flat_map(|&u| {
                samples.iter().flat_map(move |&v| {
                    streaks.into_iter().map(move |s| Metrics::new(u, v, s))
                })
            })
            .collect();

        for a in &all {
            let a_badges: BTreeSet<_> = derive_badges(a).into_iter().collect();
            for b in all.iter().filter(|b| a.dominates(b)) {
                let b_badges: BTreeSet<_> = derive_badges(b).into_iter().collect();
                assert!(a_badges.is_superset(&b_badges), "{:?} vs {:?}", a, b);
            }
        }
    }

    #[test]
    fn labels_use_display_names() {
        assert_eq!(
            badge_labels(&Metrics::new(0, 2_000, 0)),
            vec!["Popular", "Trending", "Viral"]
        );
    }
}
