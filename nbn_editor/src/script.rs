use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use nbn_formats::{BrushSpec, EditError, EditorSession};
use serde::{Deserialize, Serialize};

/// Ordered list of edits loaded from JSON:
///
/// ```json
/// { "steps": [
///     { "op": "dimensions", "width": 64, "height": 32 },
///     { "op": "stroke", "x": 10, "y": 4, "radius": 2, "color": "7FFF" },
///     { "op": "undo" }
/// ] }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EditScript {
    #[serde(default)]
    pub steps: Vec<EditStep>,
}

impl EditScript {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        let script: EditScript = serde_json::from_slice(&data)
            .with_context(|| format!("parsing edit script {}", path.display()))?;
        Ok(script)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EditStep {
    Stroke(BrushSpec),
    Undo {
        #[serde(default = "default_undo_count")]
        count: usize,
    },
    Dimensions {
        width: i64,
        height: i64,
    },
    ResetDimensions,
}

fn default_undo_count() -> usize {
    1
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct StepTally {
    pub strokes: usize,
    pub pixels_written: usize,
    pub undos: usize,
    pub failures: Vec<String>,
}

impl EditStep {
    /// Applies the step to `session`. A failing undo stops at the first empty
    /// pop; the undos already applied stay applied.
    pub fn apply(&self, session: &mut EditorSession, tally: &mut StepTally) -> Result<(), EditError> {
        match self {
            EditStep::Stroke(brush) => {
                let written = session.paint(brush)?;
                tally.strokes += 1;
                tally.pixels_written += written;
            }
            EditStep::Undo { count } => {
                for _ in 0..*count {
                    session.undo()?;
                    tally.undos += 1;
                }
            }
            EditStep::Dimensions { width, height } => {
                let invalid = || EditError::InvalidDimensions(format!("{width}x{height}"));
                let width = u32::try_from(*width).map_err(|_| invalid())?;
                let height = u32::try_from(*height).map_err(|_| invalid())?;
                session.set_dimensions(width, height)?;
            }
            EditStep::ResetDimensions => session.reset_dimensions(),
        }
        Ok(())
    }
}
