use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use matfree::types::{RMatrix, Tensor};
use ndarray::{IxDyn, OwnedRepr};
use ndarray_npy::{NpzReader, NpzWriter};

/// Reads every array of an `.npz` archive, sorted by name.
///
/// Arrays are returned as stored; rank is checked when they are lifted to
/// operators.
pub fn read_npz(npz_path: &Path) -> Result<Vec<(String, Tensor)>> {
    let file =
        File::open(npz_path).with_context(|| format!("cannot open {}", npz_path.display()))?;
    let mut npz = NpzReader::new(file)?;
    let mut names = npz.names()?;
    names.sort();

    let mut arrays = Vec::with_capacity(names.len());
    for name in names {
        let array: Tensor = npz
            .by_name::<OwnedRepr<f64>, IxDyn>(&name)
            .with_context(|| format!("cannot read array '{}' as f64", name))?;
        let label = name.strip_suffix(".npy").unwrap_or(&name).to_owned();
        arrays.push((label, array));
    }
    Ok(arrays)
}

pub fn write_npz(npz_path: &Path, arrays: &[(&str, &RMatrix)]) -> Result<()> {
    let file =
        File::create(npz_path).with_context(|| format!("cannot create {}", npz_path.display()))?;
    let mut npz = NpzWriter::new(file);
    for (name, array) in arrays {
        npz.add_array(*name, *array)?;
    }
    npz.finish()?;
    Ok(())
}
