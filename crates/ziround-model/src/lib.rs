//! Model file readers for the ZI-Round heuristic.
//!
//! Free-format MPS (`.mps`) and a JSON model format (`.json`) both compile
//! into a [`ziround_core::Problem`]. Points (start values or solutions) are
//! read and written as JSON maps from variable name to value.

use std::path::Path;

use ziround_core::Problem;

pub mod error;
pub mod json;
pub mod mps;

pub use error::ModelError;
pub use json::{ModelFile, PointFile, read_point};
pub use mps::MpsReader;

/// A named problem as read from a file.
#[derive(Debug, Clone)]
pub struct Model {
    pub name: String,
    pub problem: Problem,
}

/// Reads a model, choosing the format from the file extension.
pub fn load(path: impl AsRef<Path>) -> Result<Model, ModelError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let mut model = match extension.as_str() {
        "mps" => MpsReader::read_file(path)?,
        "json" => json::read_model(path)?,
        _ => return Err(ModelError::UnsupportedFormat(path.display().to_string())),
    };
    if model.name.is_empty() {
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            model.name = stem.to_string();
        }
    }
    tracing::info!(
        model = %model.name,
        columns = model.problem.ncols(),
        rows = model.problem.nrows(),
        "loaded model"
    );
    Ok(model)
}
