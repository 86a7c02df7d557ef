//! Tie-aware leaderboard.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::ledger::CompetitorRunState;

/// Presentation class of a ranking entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RankClass {
    Winner,
    Loser,
    Neutral,
}

/// One competitor's place on the leaderboard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RankingEntry {
    pub competitor_name: String,
    /// 1-based competition rank.
    pub position: usize,
    pub tied: bool,
    pub label: String,
    pub class: RankClass,
}

/// Ranking entries keyed by competitor name.
pub type Leaderboard = BTreeMap<String, RankingEntry>;

/// Rank competitors by pass count.
///
/// Uses standard competition ranking: tied competitors share a position and
/// the next position skips by the size of the tied group. Only a solitary
/// first place is a winner and only a solitary last place is a loser. Fewer
/// than two competitors yield an empty leaderboard.
pub fn rank(states: &[CompetitorRunState]) -> Leaderboard {
    let mut board = Leaderboard::new();
    if states.len() < 2 {
        return board;
    }

    let mut groups: BTreeMap<u64, Vec<&str>> = BTreeMap::new();
    for state in states {
        groups
            .entry(state.counters.passed)
            .or_default()
            .push(state.name.as_str());
    }

    let group_count = groups.len();
    let mut position = 1;
    for (index, names) in groups.values().rev().enumerate() {
        let tied = names.len() > 1;
        let class = if tied {
            RankClass::Neutral
        } else if index == 0 {
            RankClass::Winner
        } else if index == group_count - 1 {
            RankClass::Loser
        } else {
            RankClass::Neutral
        };
        let label = if tied {
            format!("{} (tie)", ordinal(position))
        } else {
            ordinal(position)
        };

        for name in names {
            board.insert(
                name.to_string(),
                RankingEntry {
                    competitor_name: name.to_string(),
                    position,
                    tied,
                    label: label.clone(),
                    class,
                },
            );
        }
        position += names.len();
    }

    board
}

/// English ordinal: 1st, 2nd, 3rd, 4th, 11th, 12th, 13th, 21st...
pub fn ordinal(n: usize) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures::run_state;

    fn board(passes: &[(&str, u64)]) -> Leaderboard {
        let states: Vec<_> = passes.iter().map(|(n, p)| run_state(n, *p)).collect();
        rank(&states)
    }

    #[test]
    fn test_single_competitor_is_empty() {
        assert!(board(&[("Andy", 10)]).is_empty());
        assert!(board(&[]).is_empty());
    }

    #[test]
    fn test_distinct_counts() {
        let b = board(&[("Andy", 3), ("Bob", 9), ("Chris", 5)]);
        assert_eq!(b["Bob"].position, 1);
        assert_eq!(b["Bob"].class, RankClass::Winner);
        assert_eq!(b["Bob"].label, "1st");
        assert_eq!(b["Chris"].position, 2);
        assert_eq!(b["Chris"].class, RankClass::Neutral);
        assert_eq!(b["Andy"].position, 3);
        assert_eq!(b["Andy"].class, RankClass::Loser);
        assert_eq!(b["Andy"].label, "3rd");
    }

    #[test]
    fn test_tied_leaders_and_solitary_loser() {
        let b = board(&[("Andy", 10), ("Bob", 10), ("Chris", 5)]);
        for name in ["Andy", "Bob"] {
            assert_eq!(b[name].position, 1);
            assert!(b[name].tied);
            assert_eq!(b[name].class, RankClass::Neutral);
            assert_eq!(b[name].label, "1st (tie)");
        }
        assert_eq!(b["Chris"].position, 3);
        assert!(!b["Chris"].tied);
        assert_eq!(b["Chris"].class, RankClass::Loser);
    }

    #[test]
    fn test_tied_losers_are_neutral() {
        let b = board(&[("Andy", 7), ("Bob", 2), ("Chris", 2), ("Diana", 4)]);
        assert_eq!(b["Andy"].class, RankClass::Winner);
        assert_eq!(b["Diana"].position, 2);
        assert_eq!(b["Bob"].position, 3);
        assert_eq!(b["Chris"].label, "3rd (tie)");
        assert_eq!(b["Chris"].class, RankClass::Neutral);
    }

    #[test]
    fn test_all_tied() {
        let b = board(&[("Andy", 0), ("Bob", 0)]);
        assert!(b.values().all(|e| e.position == 1 && e.tied));
        assert!(b.values().all(|e| e.class == RankClass::Neutral));
    }

    #[test]
    fn test_ordinals() {
        let cases = [
            (1, "1st"),
            (2, "2nd"),
            (3, "3rd"),
            (4, "4th"),
            (11, "11th"),
            (12, "12th"),
            (13, "13th"),
            (21, "21st"),
            (102, "102nd"),
        ];
        for (n, expected) in cases {
            assert_eq!(ordinal(n), expected);
        }
    }
}
