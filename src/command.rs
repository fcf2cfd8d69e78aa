//! Menu and toolbar commands.
//!
//! Every action the host can trigger is a [`Command`] variant. Menu items
//! carry a string action id; [`Command::from_str`] maps those ids to variants
//! and rejects anything unknown, so a typo in a menu definition surfaces as
//! an error instead of a silently ignored click.

#[cfg(test)]
#[path = "command_test.rs"]
mod command_test;

use std::str::FromStr;

use crate::doc::Surface;
use crate::input::ClickMode;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("unknown command {0:?}")]
    Unknown(String),
    #[error("command {0:?} needs parameters")]
    NeedsParameters(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    // File
    NewDocument,
    Open,
    Save,
    SaveAs,
    Close,
    // Edit
    Undo,
    Redo,
    DeleteSelected,
    DuplicateSelected,
    SelectAll,
    /// Select every bulb on the active surface.
    SelectAllBulbs,
    ClearSelection,
    Nudge { dx: i32, dy: i32 },
    AddBulb,
    AddScore,
    // View
    ZoomIn,
    ZoomOut,
    ZoomToFit,
    ResetZoom,
    ShowSurface(Surface),
    ToggleIlluminationFrames,
    ToggleScoreFrames,
    ToggleIllumination,
    ToggleScoring,
    // Image
    EnterClickMode(ClickMode),
    CancelClickMode,
    ResizeImage { width: u32, height: u32 },
    AdjustBrightness { amount: i32, ignore_grill: bool },
}

/// Flags the host uses to enable or grey out menu items.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MenuState {
    pub has_file: bool,
    pub can_undo: bool,
    pub can_redo: bool,
    pub has_selection: bool,
    pub busy: bool,
}

impl Command {
    /// Commands that go through the file lifecycle rather than the canvas.
    #[must_use]
    pub fn is_file_command(self) -> bool {
        matches!(self, Self::NewDocument | Self::Open | Self::Save | Self::SaveAs | Self::Close)
    }

    /// Whether the command can run in `state`.
    #[must_use]
    pub fn is_enabled(self, state: MenuState) -> bool {
        match self {
            Self::NewDocument | Self::Open => true,
            Self::Undo => state.can_undo && !state.busy,
            Self::Redo => state.can_redo && !state.busy,
            Self::DeleteSelected | Self::DuplicateSelected | Self::Nudge { .. } => state.has_selection && !state.busy,
            Self::ClearSelection => state.has_selection,
            Self::Save | Self::SaveAs | Self::Close => state.has_file && !state.busy,
            Self::AddBulb
            | Self::AddScore
            | Self::EnterClickMode(_)
            | Self::ResizeImage { .. }
            | Self::AdjustBrightness { .. } => state.has_file && !state.busy,
            Self::SelectAll
            | Self::SelectAllBulbs
            | Self::ZoomIn
            | Self::ZoomOut
            | Self::ZoomToFit
            | Self::ResetZoom
            | Self::ShowSurface(_)
            | Self::ToggleIlluminationFrames
            | Self::ToggleScoreFrames
            | Self::ToggleIllumination
            | Self::ToggleScoring
            | Self::CancelClickMode => state.has_file,
        }
    }
}

impl FromStr for Command {
    type Err = CommandError;

    /// Parse a menu action id such as `"save-file"` or `"zoom-fit"`.
    fn from_str(id: &str) -> Result<Self, Self::Err> {
        let command = match id {
            "new-file" => Self::NewDocument,
            "open-file" => Self::Open,
            "save-file" => Self::Save,
            "save-file-as" => Self::SaveAs,
            "close-file" => Self::Close,
            "undo" => Self::Undo,
            "redo" => Self::Redo,
            "delete" => Self::DeleteSelected,
            "duplicate" => Self::DuplicateSelected,
            "select-all" => Self::SelectAll,
            "select-all-illumination" => Self::SelectAllBulbs,
            "deselect" => Self::ClearSelection,
            "add-bulb" => Self::AddBulb,
            "add-score" => Self::AddScore,
            "zoom-in" => Self::ZoomIn,
            "zoom-out" => Self::ZoomOut,
            "zoom-fit" => Self::ZoomToFit,
            "zoom-100" => Self::ResetZoom,
            "show-backglass-tab" => Self::ShowSurface(Surface::Backglass),
            "show-dmd-tab" => Self::ShowSurface(Surface::Dmd),
            "toggle-illumination-frames" => Self::ToggleIlluminationFrames,
            "toggle-score-frames" => Self::ToggleScoreFrames,
            "toggle-illumination" => Self::ToggleIllumination,
            "toggle-scoring" => Self::ToggleScoring,
            "set-grill-height" => Self::EnterClickMode(ClickMode::GrillHeight),
            "set-mini-grill-height" => Self::EnterClickMode(ClickMode::SmallGrillHeight),
            "copy-dmd-from-backglass" => Self::EnterClickMode(ClickMode::DmdCopyArea),
            "set-default-dmd-location" => Self::EnterClickMode(ClickMode::DmdDefaultLocation),
            "resize-image" | "adjust-brightness" => return Err(CommandError::NeedsParameters(id.to_owned())),
            other => return Err(CommandError::Unknown(other.to_owned())),
        };
        Ok(command)
    }
}
