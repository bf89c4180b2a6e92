//! The canonical typed output row.

use serde::{Deserialize, Serialize};

use crate::{FieldKind, StatField};

/// One normalized statistical record for a single player-team-season entry.
///
/// Every value is optional: `None` is the "missing" sentinel and is never
/// the same thing as zero. Serializes with the external column names, so a
/// CSV or JSON export matches the destination table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerStatRecord {
    #[serde(rename = "Rank")]
    pub rank: Option<i32>,
    /// Decoded, trimmed player name.
    #[serde(rename = "Player_Name")]
    pub player: Option<String>,
    #[serde(rename = "Player_Age")]
    pub age: Option<i32>,
    /// Team code. Traded players also have an aggregate row (`TOT`/`2TM`).
    #[serde(rename = "Team_Name")]
    pub team: Option<String>,
    #[serde(rename = "Position")]
    pub position: Option<String>,
    #[serde(rename = "Games_Played")]
    pub games_played: Option<i32>,
    #[serde(rename = "Games_Started")]
    pub games_started: Option<i32>,
    #[serde(rename = "Minutes_Played")]
    pub minutes_played: Option<f64>,
    #[serde(rename = "Field_Goals_Made")]
    pub field_goals_made: Option<f64>,
    #[serde(rename = "Field_Goals_Attempted")]
    pub field_goals_attempted: Option<f64>,
    #[serde(rename = "Field_Goal_Percentage")]
    pub field_goal_pct: Option<f64>,
    #[serde(rename = "Three_Pointers_Made")]
    pub three_pointers_made: Option<f64>,
    #[serde(rename = "Three_Pointers_Attempted")]
    pub three_pointers_attempted: Option<f64>,
    #[serde(rename = "Three_Point_Percentage")]
    pub three_point_pct: Option<f64>,
    #[serde(rename = "Two_Pointers_Made")]
    pub two_pointers_made: Option<f64>,
    #[serde(rename = "Two_Pointers_Attempted")]
    pub two_pointers_attempted: Option<f64>,
    #[serde(rename = "Two_Point_Percentage")]
    pub two_point_pct: Option<f64>,
    #[serde(rename = "Effective_Field_Goal_Percentage")]
    pub effective_field_goal_pct: Option<f64>,
    #[serde(rename = "Free_Throws_Made")]
    pub free_throws_made: Option<f64>,
    #[serde(rename = "Free_Throws_Attempted")]
    pub free_throws_attempted: Option<f64>,
    #[serde(rename = "Free_Throw_Percentage")]
    pub free_throw_pct: Option<f64>,
    #[serde(rename = "Offensive_Rebounds")]
    pub offensive_rebounds: Option<f64>,
    #[serde(rename = "Defensive_Rebounds")]
    pub defensive_rebounds: Option<f64>,
    #[serde(rename = "Total_Rebounds")]
    pub total_rebounds: Option<f64>,
    #[serde(rename = "Assists")]
    pub assists: Option<f64>,
    #[serde(rename = "Steals")]
    pub steals: Option<f64>,
    #[serde(rename = "Blocks")]
    pub blocks: Option<f64>,
    #[serde(rename = "Turnovers")]
    pub turnovers: Option<f64>,
    #[serde(rename = "Personal_Fouls")]
    pub personal_fouls: Option<f64>,
    #[serde(rename = "Points_Per_Game")]
    pub points_per_game: Option<f64>,
}

/// A borrowed view of one field's value, tagged by storage type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Text(Option<&'a str>),
    Integer(Option<i32>),
    Float(Option<f64>),
}

impl FieldValue<'_> {
    /// Returns whether the value is the missing sentinel.
    #[must_use]
    pub const fn is_missing(&self) -> bool {
        matches!(
            self,
            Self::Text(None) | Self::Integer(None) | Self::Float(None)
        )
    }
}

impl PlayerStatRecord {
    /// Returns the value stored for `field`.
    #[must_use]
    pub fn value(&self, field: StatField) -> FieldValue<'_> {
        match field.kind() {
            FieldKind::Text => FieldValue::Text(self.text(field).and_then(Option::as_deref)),
            FieldKind::Integer => FieldValue::Integer(self.integer(field).copied().flatten()),
            FieldKind::Float | FieldKind::Percentage => {
                FieldValue::Float(self.float(field).copied().flatten())
            }
        }
    }

    /// Fields currently holding the missing sentinel, in column order.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<StatField> {
        StatField::all()
            .iter()
            .copied()
            .filter(|f| self.value(*f).is_missing())
            .collect()
    }

    /// Mutable slot for a text field; `None` if `field` isn't text.
    pub const fn text_mut(&mut self, field: StatField) -> Option<&mut Option<String>> {
        match field {
            StatField::Player => Some(&mut self.player),
            StatField::Team => Some(&mut self.team),
            StatField::Position => Some(&mut self.position),
            _ => None,
        }
    }

    /// Mutable slot for an integer field; `None` if `field` isn't an integer.
    pub const fn integer_mut(&mut self, field: StatField) -> Option<&mut Option<i32>> {
        match field {
            StatField::Rank => Some(&mut self.rank),
            StatField::Age => Some(&mut self.age),
            StatField::GamesPlayed => Some(&mut self.games_played),
            StatField::GamesStarted => Some(&mut self.games_started),
            _ => None,
        }
    }

    /// Mutable slot for a float or percentage field.
    pub const fn float_mut(&mut self, field: StatField) -> Option<&mut Option<f64>> {
        Some(match field {
            StatField::MinutesPlayed => &mut self.minutes_played,
            StatField::FieldGoalsMade => &mut self.field_goals_made,
            StatField::FieldGoalsAttempted => &mut self.field_goals_attempted,
            StatField::FieldGoalPct => &mut self.field_goal_pct,
            StatField::ThreePointersMade => &mut self.three_pointers_made,
            StatField::ThreePointersAttempted => &mut self.three_pointers_attempted,
            StatField::ThreePointPct => &mut self.three_point_pct,
            StatField::TwoPointersMade => &mut self.two_pointers_made,
            StatField::TwoPointersAttempted => &mut self.two_pointers_attempted,
            StatField::TwoPointPct => &mut self.two_point_pct,
            StatField::EffectiveFieldGoalPct => &mut self.effective_field_goal_pct,
            StatField::FreeThrowsMade => &mut self.free_throws_made,
            StatField::FreeThrowsAttempted => &mut self.free_throws_attempted,
            StatField::FreeThrowPct => &mut self.free_throw_pct,
            StatField::OffensiveRebounds => &mut self.offensive_rebounds,
            StatField::DefensiveRebounds => &mut self.defensive_rebounds,
            StatField::TotalRebounds => &mut self.total_rebounds,
            StatField::Assists => &mut self.assists,
            StatField::Steals => &mut self.steals,
            StatField::Blocks => &mut self.blocks,
            StatField::Turnovers => &mut self.turnovers,
            StatField::PersonalFouls => &mut self.personal_fouls,
            StatField::PointsPerGame => &mut self.points_per_game,
            StatField::Rank
            | StatField::Player
            | StatField::Age
            | StatField::Team
            | StatField::Position
            | StatField::GamesPlayed
            | StatField::GamesStarted => return None,
        })
    }

    const fn text(&self, field: StatField) -> Option<&Option<String>> {
        match field {
            StatField::Player => Some(&self.player),
            StatField::Team => Some(&self.team),
            StatField::Position => Some(&self.position),
            _ => None,
        }
    }

    const fn integer(&self, field: StatField) -> Option<&Option<i32>> {
        match field {
            StatField::Rank => Some(&self.rank),
            StatField::Age => Some(&self.age),
            StatField::GamesPlayed => Some(&self.games_played),
            StatField::GamesStarted => Some(&self.games_started),
            _ => None,
        }
    }

    const fn float(&self, field: StatField) -> Option<&Option<f64>> {
        Some(match field {
            StatField::MinutesPlayed => &self.minutes_played,
            StatField::FieldGoalsMade => &self.field_goals_made,
            StatField::FieldGoalsAttempted => &self.field_goals_attempted,
            StatField::FieldGoalPct => &self.field_goal_pct,
            StatField::ThreePointersMade => &self.three_pointers_made,
            StatField::ThreePointersAttempted => &self.three_pointers_attempted,
            StatField::ThreePointPct => &self.three_point_pct,
            StatField::TwoPointersMade => &self.two_pointers_made,
            StatField::TwoPointersAttempted => &self.two_pointers_attempted,
            StatField::TwoPointPct => &self.two_point_pct,
            StatField::EffectiveFieldGoalPct => &self.effective_field_goal_pct,
            StatField::FreeThrowsMade => &self.free_throws_made,
            StatField::FreeThrowsAttempted => &self.free_throws_attempted,
            StatField::FreeThrowPct => &self.free_throw_pct,
            StatField::OffensiveRebounds => &self.offensive_rebounds,
            StatField::DefensiveRebounds => &self.defensive_rebounds,
            StatField::TotalRebounds => &self.total_rebounds,
            StatField::Assists => &self.assists,
            StatField::Steals => &self.steals,
            StatField::Blocks => &self.blocks,
            StatField::Turnovers => &self.turnovers,
            StatField::PersonalFouls => &self.personal_fouls,
            StatField::PointsPerGame => &self.points_per_game,
            StatField::Rank
            | StatField::Player
            | StatField::Age
            | StatField::Team
            | StatField::Position
            | StatField::GamesPlayed
            | StatField::GamesStarted => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_record_is_entirely_missing() {
        let record = PlayerStatRecord::default();
        assert_eq!(record.missing_fields(), StatField::all().to_vec());
    }

    #[test]
    fn every_field_has_exactly_one_slot() {
        let mut record = PlayerStatRecord::default();
        for field in StatField::all() {
            let slots = usize::from(record.text_mut(*field).is_some())
                + usize::from(record.integer_mut(*field).is_some())
                + usize::from(record.float_mut(*field).is_some());
            assert_eq!(slots, 1, "{field}");
        }
    }

    #[test]
    fn value_reads_back_what_slots_write() {
        let mut record = PlayerStatRecord::default();
        *record.text_mut(StatField::Player).unwrap() = Some("Jane Doe".to_string());
        *record.integer_mut(StatField::Age).unwrap() = Some(25);
        *record.float_mut(StatField::ThreePointPct).unwrap() = Some(0.375);

        assert_eq!(
            record.value(StatField::Player),
            FieldValue::Text(Some("Jane Doe"))
        );
        assert_eq!(record.value(StatField::Age), FieldValue::Integer(Some(25)));
        assert_eq!(
            record.value(StatField::ThreePointPct),
            FieldValue::Float(Some(0.375))
        );
        assert_eq!(record.value(StatField::Team), FieldValue::Text(None));
    }

    #[test]
    fn serializes_with_external_column_names() {
        let record = PlayerStatRecord {
            player: Some("Jane Doe".to_string()),
            points_per_game: Some(18.4),
            ..PlayerStatRecord::default()
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["Player_Name"], "Jane Doe");
        assert_eq!(json["Points_Per_Game"], 18.4);
        assert!(json["Player_Age"].is_null());
    }
}
