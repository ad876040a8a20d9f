use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::Serialize;

use crate::brush::{BrushSpec, apply_stroke};
use crate::canvas::{Canvas, Dimensions};
use crate::error::{EditError, Result};
use crate::patch;
use crate::pixel::Raster;
use crate::undo::UndoHistory;

/// A single editing session over one loaded asset.
///
/// Owns the canvas, the bytes as originally loaded (for save-length checks),
/// the undo history and the path the asset came from. Every method that fails
/// leaves the session exactly as it was.
#[derive(Debug, Default)]
pub struct EditorSession {
    canvas: Canvas,
    original: Vec<u8>,
    history: UndoHistory,
    source: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub source: Option<PathBuf>,
    pub byte_len: usize,
    pub dimensions: Option<Dimensions>,
    pub modified: bool,
    pub undo_depth: usize,
    pub changed_pixels: usize,
}

impl EditorSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&mut self, path: &Path) -> Result<usize> {
        let bytes = patch::load(path)?;
        let len = self.load_bytes(bytes);
        self.source = Some(path.to_path_buf());
        Ok(len)
    }

    /// Starts over on `bytes`. Undo history never crosses a load.
    pub fn load_bytes(&mut self, bytes: Vec<u8>) -> usize {
        self.original = bytes.clone();
        self.canvas.load(bytes);
        self.history.clear();
        self.source = None;
        self.original.len()
    }

    pub fn is_loaded(&self) -> bool {
        !self.original.is_empty()
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn data(&self) -> &[u8] {
        self.canvas.raw()
    }

    pub fn original(&self) -> &[u8] {
        &self.original
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn is_modified(&self) -> bool {
        self.canvas.raw() != self.original.as_slice()
    }

    pub fn undo_depth(&self) -> usize {
        self.history.len()
    }

    pub fn dimensions(&self) -> Option<Dimensions> {
        self.canvas.dimensions()
    }

    pub fn set_dimensions(&mut self, width: u32, height: u32) -> Result<Dimensions> {
        self.canvas.set_dimensions(width, height)
    }

    pub fn reset_dimensions(&mut self) {
        self.canvas.reset_dimensions();
    }

    pub fn ensure_dimensions(&mut self) -> Result<Dimensions> {
        self.canvas.ensure_dimensions()
    }

    pub fn raster(&mut self) -> Result<&Raster> {
        self.canvas.raster()
    }

    pub fn paint(&mut self, brush: &BrushSpec) -> Result<usize> {
        if !self.is_loaded() {
            return Err(EditError::NoData);
        }
        apply_stroke(&mut self.canvas, &mut self.history, brush)
    }

    pub fn undo(&mut self) -> Result<()> {
        let snapshot = self.history.pop()?;
        self.canvas.restore(snapshot);
        debug!("undo restored snapshot, {} left", self.history.len());
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<usize> {
        if !self.is_loaded() {
            return Err(EditError::NoData);
        }
        patch::save_copy(path, self.canvas.raw(), self.original.len())
    }

    pub fn inject(&self, target: &Path, offset_text: &str) -> Result<usize> {
        if self.canvas.raw().is_empty() {
            return Err(EditError::NoData);
        }
        let offset = patch::parse_offset(offset_text)?;
        let written = patch::inject(target, offset, self.canvas.raw())?;
        info!(
            "session data ({} bytes) injected into {}",
            written,
            target.display()
        );
        Ok(written)
    }

    /// Number of pixel words that differ from the loaded bytes.
    pub fn changed_pixels(&self) -> usize {
        self.canvas
            .raw()
            .chunks(2)
            .zip(self.original.chunks(2))
            .filter(|(current, original)| current != original)
            .count()
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            source: self.source.clone(),
            byte_len: self.canvas.raw().len(),
            dimensions: self.canvas.dimensions(),
            modified: self.is_modified(),
            undo_depth: self.history.len(),
            changed_pixels: self.changed_pixels(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel::{PixelWord, Rgb8};
    use std::fs;
    use tempfile::tempdir;

    fn session_with(words: &[u16]) -> EditorSession {
        let mut session = EditorSession::new();
        session.load_bytes(words.iter().flat_map(|w| w.to_le_bytes()).collect());
        session
    }

    #[test]
    fn paint_then_undo_restores_buffer_and_raster() {
        let mut session = session_with(&[0; 16]);
        session.ensure_dimensions().unwrap();
        let before = session.data().to_vec();

        session.paint(&BrushSpec::new(1, 1, 1, "7C00")).unwrap();
        assert!(session.is_modified());
        assert_eq!(session.changed_pixels(), 5);
        assert_eq!(session.raster().unwrap().get(1, 1), Some(Rgb8::new(248, 0, 0)));

        session.undo().unwrap();
        assert_eq!(session.data(), &before[..]);
        assert_eq!(session.raster().unwrap().get(1, 1), Some(Rgb8::BLACK));
        assert!(matches!(session.undo(), Err(EditError::Empty)));
    }

    #[test]
    fn load_clears_history_and_keeps_dimensions() {
        let mut session = session_with(&[0; 16]);
        session.set_dimensions(8, 2).unwrap();
        session.paint(&BrushSpec::new(0, 0, 0, "7FFF")).unwrap();
        assert_eq!(session.undo_depth(), 1);

        session.load_bytes(vec![0; 32]);
        assert_eq!(session.undo_depth(), 0);
        assert_eq!(session.dimensions(), Dimensions::new(8, 2).ok());
        assert!(matches!(session.undo(), Err(EditError::Empty)));
    }

    #[test]
    fn operations_without_data_report_no_data() {
        let mut session = EditorSession::new();
        let dir = tempdir().unwrap();
        let target = dir.path().join("host.bin");
        fs::write(&target, [0u8; 8]).unwrap();

        assert!(matches!(
            session.paint(&BrushSpec::new(0, 0, 0, "7FFF")),
            Err(EditError::NoData)
        ));
        assert!(matches!(
            session.save(&dir.path().join("out.nbn")),
            Err(EditError::NoData)
        ));
        assert!(matches!(
            session.inject(&target, "0"),
            Err(EditError::NoData)
        ));
        assert!(matches!(
            session.inject(&target, "not-an-offset"),
            Err(EditError::NoData)
        ));
        assert!(matches!(session.ensure_dimensions(), Err(EditError::NoData)));
    }

    #[test]
    fn painted_word_survives_save_bit_exact() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.nbn");
        let output = dir.path().join("out.nbn");
        fs::write(&input, [0u8; 8]).unwrap();

        let mut session = EditorSession::new();
        assert_eq!(session.load(&input).unwrap(), 8);
        assert_eq!(session.source(), Some(input.as_path()));
        session.paint(&BrushSpec::new(1, 0, 0, "5A5A")).unwrap();
        session.save(&output).unwrap();

        let saved = fs::read(&output).unwrap();
        assert_eq!(saved.len(), 8);
        assert_eq!(&saved[2..4], &PixelWord::new(0x5A5A).to_le_bytes());
    }

    #[test]
    fn rejected_stroke_is_not_an_undo_unit() {
        let mut session = session_with(&[0; 4]);
        assert!(session.paint(&BrushSpec::new(0, 0, 0, "12")).is_err());
        assert_eq!(session.undo_depth(), 0);
        assert!(!session.is_modified());
    }

    #[test]
    fn failed_load_keeps_current_asset() {
        let dir = tempdir().unwrap();
        let mut session = session_with(&[0x7FFF; 4]);
        let result = session.load(&dir.path().join("missing.nbn"));
        assert!(matches!(result, Err(EditError::LoadFailed { .. })));
        assert_eq!(session.data().len(), 8);
    }

    #[test]
    fn injects_current_buffer_at_offset() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("host.bin");
        fs::write(&target, [0xEEu8; 12]).unwrap();

        let mut session = session_with(&[0; 2]);
        session.paint(&BrushSpec::new(0, 0, 0, "7FFF")).unwrap();
        assert_eq!(session.inject(&target, "0x4").unwrap(), 4);

        let host = fs::read(&target).unwrap();
        assert_eq!(&host[..4], &[0xEE; 4]);
        assert_eq!(&host[4..8], &[0xFF, 0x7F, 0x00, 0x00]);
        assert_eq!(&host[8..], &[0xEE; 4]);
    }
}
