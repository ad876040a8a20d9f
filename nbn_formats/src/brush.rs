use std::str::FromStr;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::canvas::Canvas;
use crate::error::{EditError, Result};
use crate::pixel::encode_pixel;
use crate::undo::UndoHistory;

pub const MAX_BRUSH_RADIUS: u32 = 50;

/// Clamps a requested radius into `0..=MAX_BRUSH_RADIUS`.
pub fn clamp_radius(requested: i64) -> u32 {
    requested.clamp(0, MAX_BRUSH_RADIUS as i64) as u32
}

/// One circular stamp. `color` is the 4-hex-digit word as typed; it is
/// validated when the stroke is applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrushSpec {
    #[serde(rename = "x")]
    pub center_x: i64,
    #[serde(rename = "y")]
    pub center_y: i64,
    #[serde(default, deserialize_with = "deserialize_radius")]
    pub radius: u32,
    #[serde(default)]
    pub color: Option<String>,
}

impl BrushSpec {
    pub fn new(center_x: i64, center_y: i64, radius: i64, color: impl Into<String>) -> Self {
        BrushSpec {
            center_x,
            center_y,
            radius: clamp_radius(radius),
            color: Some(color.into()),
        }
    }
}

impl FromStr for BrushSpec {
    type Err = String;

    /// Parses `"X,Y,RADIUS,COLOR"`, e.g. `"12,40,3,7FFF"`.
    fn from_str(text: &str) -> std::result::Result<Self, Self::Err> {
        let parts: Vec<&str> = text.split(',').map(str::trim).collect();
        let [x, y, radius, color] = parts.as_slice() else {
            return Err(format!("expected X,Y,RADIUS,COLOR but got {text:?}"));
        };
        let x = x.parse::<i64>().map_err(|err| format!("bad x {x:?}: {err}"))?;
        let y = y.parse::<i64>().map_err(|err| format!("bad y {y:?}: {err}"))?;
        let radius = radius
            .parse::<i64>()
            .map_err(|err| format!("bad radius {radius:?}: {err}"))?;
        Ok(BrushSpec::new(x, y, radius, *color))
    }
}

fn deserialize_radius<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let requested = i64::deserialize(deserializer)?;
    Ok(clamp_radius(requested))
}

/// Offsets covered by a filled disk of `radius`, row by row.
pub fn disk_offsets(radius: u32) -> impl Iterator<Item = (i64, i64)> {
    let r = radius.min(MAX_BRUSH_RADIUS) as i64;
    (-r..=r).flat_map(move |dy| {
        (-r..=r)
            .filter(move |dx| dx * dx + dy * dy <= r * r)
            .map(move |dx| (dx, dy))
    })
}

/// Stamps `brush` onto `canvas` and returns how many pixels were written.
///
/// The colour is checked before anything happens, so a rejected stroke leaves
/// both the canvas and `history` untouched. An accepted stroke pushes exactly
/// one snapshot, even when every offset falls outside the canvas.
pub fn apply_stroke(
    canvas: &mut Canvas,
    history: &mut UndoHistory,
    brush: &BrushSpec,
) -> Result<usize> {
    let color = brush
        .color
        .as_deref()
        .ok_or_else(|| EditError::InvalidColor(String::new()))?;
    let word = encode_pixel(color)?;
    canvas.ensure_dimensions()?;

    history.push(canvas.raw().to_vec());

    let mut touched = 0usize;
    for (dx, dy) in disk_offsets(brush.radius) {
        let (Some(x), Some(y)) = (
            brush.center_x.checked_add(dx),
            brush.center_y.checked_add(dy),
        ) else {
            continue;
        };
        if canvas.write_raw_and_rgb(x, y, word) {
            touched += 1;
        }
    }

    debug!(
        "stroke at ({}, {}) r={} color {word} wrote {touched} pixels",
        brush.center_x, brush.center_y, brush.radius
    );
    Ok(touched)
}
