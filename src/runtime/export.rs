//! Still-frame and snapshot export. History itself is session-scoped and
//! never persisted; these helpers exist for saving a single scrubbed-to
//! frame as a PNG or a control snapshot as JSON.

use std::error::Error;
use std::fs;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use directories_next::{BaseDirs, UserDirs};
use log::info;

use crate::control::ControlSnapshot;
use crate::runtime::history::HistoryEntry;

pub fn write_entry_png(
    entry: &HistoryEntry,
    path: &Path,
) -> Result<(), Box<dyn Error>> {
    let Some(pixels) = entry.pixels.as_ref() else {
        return Err("history entry has no pixel data".into());
    };

    if pixels.data.len() != pixels.byte_len() {
        return Err(format!(
            "pixel buffer length {} does not match {}x{} RGBA",
            pixels.data.len(),
            pixels.width,
            pixels.height
        )
        .into());
    }

    if let Some(parent_dir) = path.parent() {
        fs::create_dir_all(parent_dir)?;
    }

    let file = File::create(path)?;
    let writer = BufWriter::new(file);

    let mut encoder = png::Encoder::new(writer, pixels.width, pixels.height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);

    let mut png_writer = encoder.write_header()?;
    png_writer.write_image_data(&pixels.data)?;
    png_writer.finish()?;

    info!("Saved frame to {}", path.display());
    Ok(())
}

pub fn save_snapshot(
    snapshot: &ControlSnapshot,
    path: &Path,
) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string_pretty(snapshot)?;
    if let Some(parent_dir) = path.parent() {
        fs::create_dir_all(parent_dir)?;
    }
    fs::write(path, json)?;
    Ok(())
}

pub fn load_snapshot(path: &Path) -> Result<ControlSnapshot, Box<dyn Error>> {
    let json = fs::read_to_string(path)?;
    let snapshot = serde_json::from_str::<ControlSnapshot>(&json)?;
    Ok(snapshot)
}

pub fn config_dir() -> Option<PathBuf> {
    BaseDirs::new().map(|base| base.config_dir().join("Strata"))
}

pub fn default_images_dir() -> Option<PathBuf> {
    let primary = UserDirs::new()
        .and_then(|ud| ud.picture_dir().map(|p| p.to_path_buf()));

    primary
        .or_else(|| BaseDirs::new().map(|bd| bd.home_dir().to_path_buf()))
        .map(|dir| dir.join("Strata"))
}
