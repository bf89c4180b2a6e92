#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Stat field taxonomy and the row/record types shared by every stage of
//! the per-game stats pipeline.
//!
//! Raw table rows ([`RawRow`]) come out of the extractor, typed records
//! ([`PlayerStatRecord`]) come out of the normalizer, and both are driven by
//! a [`TableSchema`] value rather than any global column table.

pub mod record;
pub mod row;
pub mod schema;

pub use record::{FieldValue, PlayerStatRecord};
pub use row::{Diagnostic, FieldIssue, RawRow};
pub use schema::{ColumnMapping, FieldBounds, InvalidSchemaError, TableSchema};

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// How a column's raw text is coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldKind {
    /// Free text (decoded and trimmed).
    Text,
    /// Whole number (age, games).
    Integer,
    /// Per-game floating point stat.
    Float,
    /// Shooting percentage, a float expected in `[0, 1]`.
    Percentage,
}

impl FieldKind {
    /// Returns whether values of this kind are numeric.
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        !matches!(self, Self::Text)
    }
}

/// Every column the pipeline knows how to store.
///
/// Raw table labels are mapped onto these variants through the
/// [`TableSchema`] column list. Anything that doesn't map is dropped.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StatField {
    /// Row rank within the table.
    Rank,
    /// Player display name.
    Player,
    /// Age as of February 1st of the season.
    Age,
    /// Team abbreviation (`TOT`/`2TM` for multi-team aggregates).
    Team,
    /// Position abbreviation.
    Position,
    GamesPlayed,
    GamesStarted,
    MinutesPlayed,
    FieldGoalsMade,
    FieldGoalsAttempted,
    FieldGoalPct,
    ThreePointersMade,
    ThreePointersAttempted,
    ThreePointPct,
    TwoPointersMade,
    TwoPointersAttempted,
    TwoPointPct,
    EffectiveFieldGoalPct,
    FreeThrowsMade,
    FreeThrowsAttempted,
    FreeThrowPct,
    OffensiveRebounds,
    DefensiveRebounds,
    TotalRebounds,
    Assists,
    Steals,
    Blocks,
    Turnovers,
    PersonalFouls,
    PointsPerGame,
}

impl StatField {
    /// Returns all variants in external column order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Rank,
            Self::Player,
            Self::Age,
            Self::Team,
            Self::Position,
            Self::GamesPlayed,
            Self::GamesStarted,
            Self::MinutesPlayed,
            Self::FieldGoalsMade,
            Self::FieldGoalsAttempted,
            Self::FieldGoalPct,
            Self::ThreePointersMade,
            Self::ThreePointersAttempted,
            Self::ThreePointPct,
            Self::TwoPointersMade,
            Self::TwoPointersAttempted,
            Self::TwoPointPct,
            Self::EffectiveFieldGoalPct,
            Self::FreeThrowsMade,
            Self::FreeThrowsAttempted,
            Self::FreeThrowPct,
            Self::OffensiveRebounds,
            Self::DefensiveRebounds,
            Self::TotalRebounds,
            Self::Assists,
            Self::Steals,
            Self::Blocks,
            Self::Turnovers,
            Self::PersonalFouls,
            Self::PointsPerGame,
        ]
    }

    /// Returns how raw text for this field is coerced.
    #[must_use]
    pub const fn kind(self) -> FieldKind {
        match self {
            Self::Player | Self::Team | Self::Position => FieldKind::Text,
            Self::Rank | Self::Age | Self::GamesPlayed | Self::GamesStarted => FieldKind::Integer,
            Self::FieldGoalPct
            | Self::ThreePointPct
            | Self::TwoPointPct
            | Self::EffectiveFieldGoalPct
            | Self::FreeThrowPct => FieldKind::Percentage,
            Self::MinutesPlayed
            | Self::FieldGoalsMade
            | Self::FieldGoalsAttempted
            | Self::ThreePointersMade
            | Self::ThreePointersAttempted
            | Self::TwoPointersMade
            | Self::TwoPointersAttempted
            | Self::FreeThrowsMade
            | Self::FreeThrowsAttempted
            | Self::OffensiveRebounds
            | Self::DefensiveRebounds
            | Self::TotalRebounds
            | Self::Assists
            | Self::Steals
            | Self::Blocks
            | Self::Turnovers
            | Self::PersonalFouls
            | Self::PointsPerGame => FieldKind::Float,
        }
    }

    /// Returns the stable external column name used by the destination
    /// table and by CSV/JSON exports.
    #[must_use]
    pub const fn column_name(self) -> &'static str {
        match self {
            Self::Rank => "Rank",
            Self::Player => "Player_Name",
            Self::Age => "Player_Age",
            Self::Team => "Team_Name",
            Self::Position => "Position",
            Self::GamesPlayed => "Games_Played",
            Self::GamesStarted => "Games_Started",
            Self::MinutesPlayed => "Minutes_Played",
            Self::FieldGoalsMade => "Field_Goals_Made",
            Self::FieldGoalsAttempted => "Field_Goals_Attempted",
            Self::FieldGoalPct => "Field_Goal_Percentage",
            Self::ThreePointersMade => "Three_Pointers_Made",
            Self::ThreePointersAttempted => "Three_Pointers_Attempted",
            Self::ThreePointPct => "Three_Point_Percentage",
            Self::TwoPointersMade => "Two_Pointers_Made",
            Self::TwoPointersAttempted => "Two_Pointers_Attempted",
            Self::TwoPointPct => "Two_Point_Percentage",
            Self::EffectiveFieldGoalPct => "Effective_Field_Goal_Percentage",
            Self::FreeThrowsMade => "Free_Throws_Made",
            Self::FreeThrowsAttempted => "Free_Throws_Attempted",
            Self::FreeThrowPct => "Free_Throw_Percentage",
            Self::OffensiveRebounds => "Offensive_Rebounds",
            Self::DefensiveRebounds => "Defensive_Rebounds",
            Self::TotalRebounds => "Total_Rebounds",
            Self::Assists => "Assists",
            Self::Steals => "Steals",
            Self::Blocks => "Blocks",
            Self::Turnovers => "Turnovers",
            Self::PersonalFouls => "Personal_Fouls",
            Self::PointsPerGame => "Points_Per_Game",
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn all_fields_have_unique_column_names() {
        let mut names: Vec<&str> = StatField::all().iter().map(|f| f.column_name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), StatField::all().len());
    }

    #[test]
    fn only_name_team_and_position_are_text() {
        let text: Vec<StatField> = StatField::all()
            .iter()
            .copied()
            .filter(|f| f.kind() == FieldKind::Text)
            .collect();
        assert_eq!(
            text,
            vec![StatField::Player, StatField::Team, StatField::Position]
        );
    }

    #[test]
    fn parses_snake_case_names() {
        assert_eq!(
            StatField::from_str("points_per_game").unwrap(),
            StatField::PointsPerGame
        );
        assert_eq!(StatField::FreeThrowPct.as_ref(), "free_throw_pct");
        assert!(StatField::from_str("Points_Per_Game").is_err());
    }
}
