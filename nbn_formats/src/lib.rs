pub mod brush;
pub mod canvas;
pub mod error;
pub mod patch;
pub mod pixel;
pub mod session;
pub mod undo;

pub use brush::{BrushSpec, MAX_BRUSH_RADIUS, apply_stroke, clamp_radius, disk_offsets};
pub use canvas::{Canvas, Dimensions};
pub use error::{EditError, Result};
pub use patch::{inject, inject_at, parse_offset, save_copy};
pub use pixel::{PixelWord, Raster, Rgb8, decode, encode_pixel};
pub use session::{EditorSession, SessionSummary};
pub use undo::{MAX_UNDO_DEPTH, UndoHistory};
