#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Artifact writers.
//!
//! Each [`Artifact`] variant has one on-disk form:
//!
//! | artifact | destination |
//! |---|---|
//! | `Table` / `Tables` | JSON file, 4-space indent, single object or list |
//! | `Document` with images | directory of `page-NNNN.png` plus `captions.txt` |
//! | `Document` with text | UTF-8 text file, each page under its caption |
//! | `PageSelection` | layout JSON holding the selected source pages verbatim |
//!
//! Nothing is created until [`write_artifact`] is called, so a run that
//! matched nothing leaves the destination untouched.

use std::fmt::Write as _;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::value::RawValue;
use tabcrop_extract_models::{Artifact, OutputContent, OutputPage};
use tabcrop_layout::{DocumentSource, LayoutError};
use tabcrop_layout_models::RasterImage;

/// Name of the caption index written next to PNG crops.
pub const CAPTIONS_FILE: &str = "captions.txt";

/// Errors raised while writing an artifact.
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A raster could not be encoded.
    #[error("PNG encoding error: {0}")]
    Png(String),

    /// A page selected for passthrough could not be read back.
    #[error("Source error: {0}")]
    Source(#[from] LayoutError),

    /// The document mixes image and text pages.
    #[error("Cannot write a document mixing image and text pages")]
    MixedDocument,
}

/// Writes `artifact` to `path` and returns every file created.
///
/// `path` is a directory for image documents and a file otherwise.
/// `source` is only read for page selections.
///
/// # Errors
///
/// Returns [`OutputError`] if the destination cannot be written or a
/// selected page cannot be read from `source`.
pub fn write_artifact(
    artifact: &Artifact,
    path: &Path,
    source: &dyn DocumentSource,
) -> Result<Vec<PathBuf>, OutputError> {
    let written = match artifact {
        Artifact::Table(table) => vec![write_json(table, path)?],
        Artifact::Tables(tables) => vec![write_json(tables, path)?],
        Artifact::Document(pages) => write_document(pages, path)?,
        Artifact::PageSelection(indices) => vec![write_page_selection(indices, source, path)?],
    };

    log::info!("Wrote {} file(s) to {}", written.len(), path.display());

    Ok(written)
}

/// Serializes `value` as pretty JSON with a 4-space indent. Non-ASCII text
/// is written as is.
///
/// # Errors
///
/// Returns [`OutputError`] if serialization or writing fails.
pub fn write_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<PathBuf, OutputError> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    buf.push(b'\n');

    create_parent(path)?;
    std::fs::write(path, buf)?;

    Ok(path.to_path_buf())
}

fn write_document(pages: &[OutputPage], path: &Path) -> Result<Vec<PathBuf>, OutputError> {
    let images = pages
        .iter()
        .filter(|p| matches!(p.content, OutputContent::Image(_)))
        .count();

    if images == 0 {
        Ok(vec![write_text_document(pages, path)?])
    } else if images == pages.len() {
        write_image_document(pages, path)
    } else {
        Err(OutputError::MixedDocument)
    }
}

/// File name of the PNG crop for a one-based page number.
#[must_use]
pub fn image_file_name(page_number: usize) -> String {
    format!("page-{page_number:04}.png")
}

fn write_image_document(pages: &[OutputPage], dir: &Path) -> Result<Vec<PathBuf>, OutputError> {
    std::fs::create_dir_all(dir)?;

    let mut written = Vec::with_capacity(pages.len() + 1);
    let mut captions = String::new();

    for page in pages {
        let OutputContent::Image(image) = &page.content else {
            return Err(OutputError::MixedDocument);
        };
        let name = image_file_name(page.page_number);
        let file = dir.join(&name);
        std::fs::write(&file, encode_png(image)?)?;
        log::debug!("Wrote {} ({}x{})", file.display(), image.width, image.height);

        let _ = writeln!(captions, "{name}\t{}", page.caption);
        written.push(file);
    }

    let index = dir.join(CAPTIONS_FILE);
    std::fs::write(&index, captions)?;
    written.push(index);

    Ok(written)
}

/// Encodes an RGBA8 raster as PNG.
///
/// # Errors
///
/// Returns [`OutputError::Png`] if the buffer does not match the stated
/// size or encoding fails.
pub fn encode_png(image: &RasterImage) -> Result<Vec<u8>, OutputError> {
    let size = tiny_skia::IntSize::from_wh(image.width, image.height).ok_or_else(|| {
        OutputError::Png(format!("invalid size {}x{}", image.width, image.height))
    })?;
    let pixmap = tiny_skia::Pixmap::from_vec(image.pixels.clone(), size).ok_or_else(|| {
        OutputError::Png(format!(
            "{} bytes do not fill a {}x{} image",
            image.pixels.len(),
            image.width,
            image.height
        ))
    })?;

    pixmap
        .encode_png()
        .map_err(|e| OutputError::Png(e.to_string()))
}

fn write_text_document(pages: &[OutputPage], path: &Path) -> Result<PathBuf, OutputError> {
    let mut out = String::new();

    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(&page.caption);
        out.push('\n');
        if let OutputContent::Text(lines) = &page.content {
            for line in lines {
                out.push_str(line);
                out.push('\n');
            }
        }
    }

    create_parent(path)?;
    std::fs::write(path, out)?;

    Ok(path.to_path_buf())
}

#[derive(Serialize)]
struct SelectedPages<'a> {
    pages: &'a [Box<RawValue>],
}

fn write_page_selection(
    indices: &[usize],
    source: &dyn DocumentSource,
    path: &Path,
) -> Result<PathBuf, OutputError> {
    let pages = indices
        .iter()
        .map(|&index| source.page_raw(index))
        .collect::<Result<Vec<_>, _>>()?;

    create_parent(path)?;
    let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);
    serde_json::to_writer(&mut file, &SelectedPages { pages: &pages })?;
    file.write_all(b"\n")?;
    file.flush()?;

    Ok(path.to_path_buf())
}

fn create_parent(path: &Path) -> Result<(), OutputError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tabcrop_extract_models::StructuredTable;
    use tabcrop_layout::json::LayoutJsonSource;

    use super::*;

    const DUMP: &str = r#"{"pages": [
        {"width": 612, "height": 792, "blocks": []},
        {"width": 612,  "height": 792, "blocks": [{"bbox": {"left": 1, "top": 2, "right": 3, "bottom": 4}, "text": "Café"}]},
        {"width": 300, "height": 400}
    ]}"#;

    fn source() -> LayoutJsonSource {
        LayoutJsonSource::from_slice(DUMP.as_bytes()).unwrap()
    }

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("tabcrop_output_{name}"));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn table(desc: &str) -> StructuredTable {
        let mut table = StructuredTable::new(&["DATE", "DESC"]);
        table.push_row(&["2024-01-01", desc]);
        table
    }

    #[test]
    fn single_table_is_a_json_object() {
        let dir = scratch("single_table");
        let path = dir.join("out.json");
        write_artifact(&Artifact::Table(table("Café")), &path, &source()).unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "{\n    \"DATE\": [\n        \"2024-01-01\"\n    ],\n    \"DESC\": [\n        \"Café\"\n    ]\n}\n"
        );
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn several_tables_are_a_json_list() {
        let dir = scratch("table_list");
        let path = dir.join("out.json");
        write_artifact(&Artifact::Tables(vec![table("a"), table("b")]), &path, &source()).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value.as_array().map(Vec::len), Some(2));
        assert_eq!(value[1]["DESC"][0], "b");
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn text_document_puts_caption_above_each_page() {
        let dir = scratch("text_document");
        let path = dir.join("out.txt");
        let pages = vec![
            OutputPage {
                page_number: 2,
                caption: "Page 2 - TRANSACTIONS Table".to_owned(),
                content: OutputContent::Text(vec!["DATE  AMOUNT".to_owned(), "1  2".to_owned()]),
            },
            OutputPage {
                page_number: 5,
                caption: "Page 5 - TRANSACTIONS Table".to_owned(),
                content: OutputContent::Text(vec!["3  4".to_owned()]),
            },
        ];
        write_artifact(&Artifact::Document(pages), &path, &source()).unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "Page 2 - TRANSACTIONS Table\nDATE  AMOUNT\n1  2\n\nPage 5 - TRANSACTIONS Table\n3  4\n"
        );
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn image_document_writes_pngs_and_captions() {
        let dir = scratch("image_document");
        let image = RasterImage {
            width: 2,
            height: 1,
            dpi: 300,
            pixels: vec![255; 8],
        };
        let pages = vec![OutputPage {
            page_number: 3,
            caption: "Page 3 - TRANSACTIONS Table".to_owned(),
            content: OutputContent::Image(image),
        }];

        let written = write_artifact(&Artifact::Document(pages), &dir, &source()).unwrap();

        assert_eq!(written, [dir.join("page-0003.png"), dir.join(CAPTIONS_FILE)]);
        assert!(fs::read(&written[0]).unwrap().starts_with(b"\x89PNG"));
        assert_eq!(
            fs::read_to_string(&written[1]).unwrap(),
            "page-0003.png\tPage 3 - TRANSACTIONS Table\n"
        );
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn short_pixel_buffer_is_rejected() {
        let image = RasterImage {
            width: 4,
            height: 4,
            dpi: 72,
            pixels: vec![0; 3],
        };
        assert!(matches!(encode_png(&image), Err(OutputError::Png(_))));
    }

    #[test]
    fn page_selection_copies_pages_verbatim() {
        let dir = scratch("page_selection");
        let path = dir.join("selected.json");
        write_artifact(&Artifact::PageSelection(vec![1, 2]), &path, &source()).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains(
            r#"{"width": 612,  "height": 792, "blocks": [{"bbox": {"left": 1, "top": 2, "right": 3, "bottom": 4}, "text": "Café"}]}"#
        ));

        let copy = LayoutJsonSource::open(&path).unwrap();
        assert_eq!(copy.page_count(), 2);
        assert_eq!(copy.page(0).unwrap(), source().page(1).unwrap());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn out_of_range_selection_is_a_source_error() {
        let dir = scratch("bad_selection");
        let result = write_artifact(&Artifact::PageSelection(vec![9]), &dir.join("x.json"), &source());
        assert!(matches!(result, Err(OutputError::Source(_))));
        let _ = fs::remove_dir_all(&dir);
    }
}
