// binary.rs - LZ4-compressed bincode persistence of distance matrices

use crate::data::matrix::{DistanceMatrix, MatrixRecord};
use crate::error::{KinshipError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

const MAGIC: &str = "kinmat-matrix";
const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct BinaryMatrix {
    magic: String,
    format_version: u32,
    created: String,
    record: MatrixRecord,
}

/// Save `matrix` as bincode compressed with LZ4 (size prepended)
pub fn save_binary(file_path: &Path, matrix: &DistanceMatrix) -> Result<()> {
    if let Some(parent) = file_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let payload = BinaryMatrix {
        magic: MAGIC.to_string(),
        format_version: FORMAT_VERSION,
        created: chrono::Utc::now().to_rfc3339(),
        record: MatrixRecord::from(matrix),
    };
    let encoded = bincode::serialize(&payload)
        .map_err(|e| KinshipError::Serialization(format!("bincode encoding failed: {}", e)))?;
    let compressed = lz4_flex::compress_prepend_size(&encoded);
    std::fs::write(file_path, &compressed)?;

    log::debug!(
        "Saved binary matrix: {} bytes raw, {} bytes compressed",
        encoded.len(),
        compressed.len()
    );
    Ok(())
}

/// Load a matrix written by [`save_binary`], along with its creation time
pub fn load_binary_with_metadata(file_path: &Path) -> Result<(DistanceMatrix, String)> {
    let compressed = std::fs::read(file_path)?;
    let decompressed = lz4_flex::decompress_size_prepended(&compressed)
        .map_err(|e| KinshipError::Serialization(format!("LZ4 decompression failed: {}", e)))?;
    let payload: BinaryMatrix = bincode::deserialize(&decompressed)
        .map_err(|e| KinshipError::Serialization(format!("bincode decoding failed: {}", e)))?;

    if payload.magic != MAGIC {
        return Err(KinshipError::Serialization(format!(
            "{} is not a kinmat matrix file",
            file_path.display()
        )));
    }
    if payload.format_version != FORMAT_VERSION {
        return Err(KinshipError::Serialization(format!(
            "unsupported matrix format version {} (expected {})",
            payload.format_version, FORMAT_VERSION
        )));
    }
    let matrix = DistanceMatrix::try_from(payload.record)?;
    Ok((matrix, payload.created))
}

pub fn load_binary(file_path: &Path) -> Result<DistanceMatrix> {
    load_binary_with_metadata(file_path).map(|(matrix, _)| matrix)
}
