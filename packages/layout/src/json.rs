//! Layout-dump decoder.
//!
//! Reads a JSON document of the form
//!
//! ```json
//! {
//!   "pages": [
//!     {
//!       "width": 612.0,
//!       "height": 792.0,
//!       "blocks": [
//!         { "bbox": { "left": 450, "top": 40, "right": 560, "bottom": 58 },
//!           "text": "TRANSACTIONS" }
//!       ],
//!       "rules": [
//!         { "start": { "x": 36, "y": 64 }, "end": { "x": 576, "y": 64 },
//!           "stroke": [0.0, 0.0, 1.0] }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! Pages are kept as raw JSON and decoded on demand, so passthrough copies
//! reproduce the input bytes exactly.

use std::path::Path;

use serde::Deserialize;
use serde_json::value::RawValue;
use tabcrop_layout_models::PageLayout;

use crate::{DocumentSource, LayoutError};

#[derive(Deserialize)]
struct RawDocument {
    pages: Vec<Box<RawValue>>,
}

/// A [`DocumentSource`] backed by a layout dump.
#[derive(Debug)]
pub struct LayoutJsonSource {
    pages: Vec<Box<RawValue>>,
}

impl LayoutJsonSource {
    /// Reads and parses the layout dump at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::Io`] if the file cannot be read, or
    /// [`LayoutError::Json`] if it is not a layout document.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LayoutError> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::from_slice(&bytes)
    }

    /// Parses a layout dump held in memory.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::Json`] if `bytes` is not a layout document.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, LayoutError> {
        let raw: RawDocument = serde_json::from_slice(bytes)?;

        log::debug!("Parsed layout dump with {} pages", raw.pages.len());

        Ok(Self { pages: raw.pages })
    }

    fn raw(&self, index: usize) -> Result<&RawValue, LayoutError> {
        self.pages
            .get(index)
            .map(|raw| &**raw)
            .ok_or(LayoutError::PageOutOfRange {
                index,
                count: self.pages.len(),
            })
    }
}

impl DocumentSource for LayoutJsonSource {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page(&self, index: usize) -> Result<PageLayout, LayoutError> {
        Ok(serde_json::from_str(self.raw(index)?.get())?)
    }

    fn page_raw(&self, index: usize) -> Result<Box<RawValue>, LayoutError> {
        Ok(self.raw(index)?.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use tabcrop_layout_models::{ColorClass, Granularity};

    use super::*;

    const DUMP: &str = r#"{
        "pages": [
            {
                "width": 612, "height": 792,
                "blocks": [
                    { "bbox": { "left": 450, "top": 40, "right": 560, "bottom": 58 },
                      "text": "TRANSACTIONS" },
                    { "bbox": { "left": 36, "top": 80, "right": 400, "bottom": 92 },
                      "text": "DATE   AMOUNT", "spans": [{ "text": "DATE", "size": 9 }] }
                ],
                "rules": [
                    { "start": { "x": 36, "y": 64 }, "end": { "x": 576, "y": 64 },
                      "stroke": [0, 0, 1] }
                ]
            },
            {"width": 612, "height": 792,   "blocks": []}
        ]
    }"#;

    #[test]
    fn decodes_pages_on_demand() {
        let source = LayoutJsonSource::from_slice(DUMP.as_bytes()).unwrap();
        assert_eq!(source.page_count(), 2);

        let page = source.page(0).unwrap();
        assert_eq!(page.fragments(Granularity::Block).len(), 2);
        assert_eq!(page.blocks[1].spans.len(), 1);
        assert!(page.rules()[0].has_color(ColorClass::Blue));
    }

    #[test]
    fn raw_page_is_byte_exact() {
        let source = LayoutJsonSource::from_slice(DUMP.as_bytes()).unwrap();
        assert_eq!(
            source.page_raw(1).unwrap().get(),
            r#"{"width": 612, "height": 792,   "blocks": []}"#
        );
    }

    #[test]
    fn out_of_range_page_is_reported() {
        let source = LayoutJsonSource::from_slice(DUMP.as_bytes()).unwrap();
        assert!(matches!(
            source.page(5),
            Err(LayoutError::PageOutOfRange { index: 5, count: 2 })
        ));
    }

    #[test]
    fn rejects_non_layout_json() {
        assert!(matches!(
            LayoutJsonSource::from_slice(br#"{"nope": true}"#),
            Err(LayoutError::Json(_))
        ));
    }
}
