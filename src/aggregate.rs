use clap::ValueEnum;
use uuid::Uuid;

use crate::models::{GradeRecord, LeaderboardEntry, UserRanking};

/// Mean of the grades that count toward the average, `None` when there are none.
pub fn compute_average(grades: &[GradeRecord]) -> Option<f64> {
    let (sum, count) = grades
        .iter()
        .filter(|grade| grade.counts_toward_average)
        .fold((0.0, 0usize), |(sum, count), grade| {
            (sum + grade.numeric_value, count + 1)
        });

    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Dimension {
    Average,
    AbsenceHours,
    TardyCount,
    FollowerCount,
}

impl Dimension {
    pub fn key(self, entry: &LeaderboardEntry) -> f64 {
        match self {
            Dimension::Average => entry.average,
            Dimension::AbsenceHours => entry.absence_hours,
            Dimension::TardyCount => entry.tardy_count,
            Dimension::FollowerCount => entry.follower_count as f64,
        }
    }

    /// `key` with NaN sent below every real value so sorting stays a total order.
    fn sort_key(self, entry: &LeaderboardEntry) -> f64 {
        let key = self.key(entry);
        if key.is_nan() {
            f64::NEG_INFINITY
        } else {
            key
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Dimension::Average => "average",
            Dimension::AbsenceHours => "absence hours",
            Dimension::TardyCount => "tardies",
            Dimension::FollowerCount => "followers",
        }
    }
}

/// Highest key first; equal keys put the most recently updated entry first.
pub fn rank_entries(entries: &[LeaderboardEntry], dimension: Dimension) -> Vec<LeaderboardEntry> {
    let mut ranked = entries.to_vec();
    ranked.sort_by(|a, b| {
        dimension
            .sort_key(b)
            .total_cmp(&dimension.sort_key(a))
            .then_with(|| b.last_update.cmp(&a.last_update))
    });
    ranked
}

/// 1-based position of `internal_id` in the ranking for `dimension`.
pub fn rank_of(entries: &[LeaderboardEntry], dimension: Dimension, internal_id: Uuid) -> Option<usize> {
    rank_entries(entries, dimension)
        .iter()
        .position(|entry| entry.internal_id == internal_id)
        .map(|index| index + 1)
}

pub fn user_ranking(entries: &[LeaderboardEntry], internal_id: Uuid) -> UserRanking {
    UserRanking {
        average_rank: rank_of(entries, Dimension::Average, internal_id),
        absences_rank: rank_of(entries, Dimension::AbsenceHours, internal_id),
        tardies_rank: rank_of(entries, Dimension::TardyCount, internal_id),
        followers_rank: rank_of(entries, Dimension::FollowerCount, internal_id),
    }
}
