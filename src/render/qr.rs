//! QR module-grid capability. Symbol generation is delegated to an encoder.

#![allow(missing_docs)]

use thiserror::Error;

/// Pixel side length of one QR module on the panel.
pub const QR_MODULE_PX: u32 = 2;

/// Square grid of modules, row-major, `true` = dark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrGrid {
    pub size: usize,
    pub modules: Vec<bool>,
}

impl QrGrid {
    /// Build a grid, rejecting a module vector that is not `size * size` long.
    pub fn new(size: usize, modules: Vec<bool>) -> Result<Self, QrError> {
        if size == 0 || modules.len() != size * size {
            return Err(QrError::Malformed {
                size,
                modules: modules.len(),
            });
        }
        Ok(Self { size, modules })
    }

    #[must_use]
    pub fn is_dark(&self, row: usize, col: usize) -> bool {
        row < self.size && col < self.size && self.modules[row * self.size + col]
    }

    /// Dark module coordinates as `(row, col)`, row-major.
    pub fn dark_modules(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.modules
            .iter()
            .enumerate()
            .filter(|(_, dark)| **dark)
            .map(|(index, _)| (index / self.size, index % self.size))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QrError {
    #[error("QR encoder not available")]
    Unavailable,
    #[error("QR encoding failed: {0}")]
    Encode(String),
    #[error("QR grid malformed: size {size} with {modules} modules")]
    Malformed { size: usize, modules: usize },
}

/// Turns text into a module grid.
pub trait QrEncoder {
    fn encode(&self, text: &str) -> Result<QrGrid, QrError>;
}

/// Encoder used when the build carries no QR support.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableEncoder;

impl QrEncoder for UnavailableEncoder {
    fn encode(&self, _text: &str) -> Result<QrGrid, QrError> {
        Err(QrError::Unavailable)
    }
}

/// Encoder backed by the `qrcode` crate.
#[cfg(feature = "qr")]
#[derive(Debug, Clone, Copy, Default)]
pub struct QrcodeEncoder;

#[cfg(feature = "qr")]
impl QrEncoder for QrcodeEncoder {
    fn encode(&self, text: &str) -> Result<QrGrid, QrError> {
        let code = qrcode::QrCode::new(text.as_bytes())
            .map_err(|err| QrError::Encode(err.to_string()))?;
        let size = code.width();
        let modules = code
            .to_colors()
            .into_iter()
            .map(|color| color == qrcode::Color::Dark)
            .collect();
        QrGrid::new(size, modules)
    }
}

/// Best encoder this build offers.
#[must_use]
pub fn default_encoder() -> Box<dyn QrEncoder> {
    #[cfg(feature = "qr")]
    {
        Box::new(QrcodeEncoder)
    }
    #[cfg(not(feature = "qr"))]
    {
        Box::new(UnavailableEncoder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_rejects_wrong_module_count() {
        assert!(QrGrid::new(3, vec![false; 8]).is_err());
        assert!(QrGrid::new(0, Vec::new()).is_err());
        assert!(QrGrid::new(2, vec![true, false, false, true]).is_ok());
    }

    #[test]
    fn dark_modules_are_row_major() {
        let grid = QrGrid::new(2, vec![true, false, false, true]).unwrap();
        assert_eq!(grid.dark_modules().collect::<Vec<_>>(), [(0, 0), (1, 1)]);
        assert!(grid.is_dark(1, 1));
        assert!(!grid.is_dark(5, 5));
    }

    #[test]
    fn unavailable_encoder_fails() {
        assert_eq!(
            UnavailableEncoder.encode("https://github.com/octo"),
            Err(QrError::Unavailable)
        );
    }

    #[cfg(feature = "qr")]
    #[test]
    fn qrcode_encoder_yields_square_grid() {
        let grid = QrcodeEncoder.encode("https://github.com/octo").unwrap();
        assert!(grid.size >= 21);
        assert_eq!((grid.size - 17) % 4, 0);
        // finder pattern corner
        assert!(grid.is_dark(0, 0));
        assert!(grid.dark_modules().count() > 0);
    }
}
