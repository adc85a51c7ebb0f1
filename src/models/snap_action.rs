use crate::TileSnapError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Target layouts a window can be snapped to.
///
/// Every variant maps to exactly one rectangle formula in
/// [`ScreenCalculator::frame_for`](crate::services::ScreenCalculator::frame_for).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SnapAction {
    Maximize,
    Left,
    Right,
    LeftThird,
    CenterThird,
    RightThird,
}

impl SnapAction {
    pub const ALL: [SnapAction; 6] = [
        SnapAction::Maximize,
        SnapAction::Left,
        SnapAction::Right,
        SnapAction::LeftThird,
        SnapAction::CenterThird,
        SnapAction::RightThird,
    ];

    /// Stable identifier used in settings files and on the command line
    pub fn name(self) -> &'static str {
        match self {
            SnapAction::Maximize => "maximize",
            SnapAction::Left => "left",
            SnapAction::Right => "right",
            SnapAction::LeftThird => "leftThird",
            SnapAction::CenterThird => "centerThird",
            SnapAction::RightThird => "rightThird",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            SnapAction::Maximize => "Maximize",
            SnapAction::Left => "Left Half",
            SnapAction::Right => "Right Half",
            SnapAction::LeftThird => "Left Third",
            SnapAction::CenterThird => "Center Third",
            SnapAction::RightThird => "Right Third",
        }
    }
}

impl fmt::Display for SnapAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SnapAction {
    type Err = TileSnapError;

    /// Accepts `leftThird`, `left-third`, `left_third` and any casing thereof.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_lowercase();

        Self::ALL
            .into_iter()
            .find(|action| action.name().to_lowercase() == normalized)
            .ok_or_else(|| TileSnapError::UnknownAction(s.to_string()))
    }
}
