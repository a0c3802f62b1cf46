use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{DecimateError, Result};

/// File extension recognised as a mesh file.
pub const MESH_EXTENSION: &str = ".vtk";

/// How root and stem listings are matched up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PairingMode {
    /// Index `i` of the sorted root listing pairs with index `i` of the stem listing.
    #[default]
    #[value(name = "positional")]
    Positional,
    /// Files pair when their filename stems are equal.
    #[value(name = "stem")]
    Stem,
}

impl std::fmt::Display for PairingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PairingMode::Positional => write!(f, "positional"),
            PairingMode::Stem => write!(f, "stem"),
        }
    }
}

/// One root mesh and its stem counterpart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshPair {
    pub root: PathBuf,
    pub stem: PathBuf,
}

/// Outcome of pairing two listings.
#[derive(Debug, Clone, Default)]
pub struct Pairing {
    pub pairs: Vec<MeshPair>,
    /// Root files left without a partner; never read or written.
    pub unpaired_root: Vec<PathBuf>,
    /// Stem files left without a partner; never read or written.
    pub unpaired_stem: Vec<PathBuf>,
}

/// List the `.vtk` files of `directory`, sorted by filename, as absolute paths.
pub fn list_mesh_files(directory: &Path) -> Result<Vec<PathBuf>> {
    let dir_err = |source| DecimateError::Directory {
        path: directory.to_path_buf(),
        source,
    };

    let directory = fs::canonicalize(directory).map_err(dir_err)?;
    let entries = fs::read_dir(&directory).map_err(dir_err)?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(dir_err)?;
        if !entry.file_type().map_err(dir_err)?.is_file() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            warn!(name = ?name, "Skipping non UTF-8 filename");
            continue;
        };
        if name.ends_with(MESH_EXTENSION) {
            names.push(name.to_owned());
        }
    }

    // Plain byte-wise ordering, same as sorting the raw names.
    names.sort_unstable();

    debug!(dir = %directory.display(), files = names.len(), "Listed mesh files");

    Ok(names.into_iter().map(|n| directory.join(n)).collect())
}

/// Match two sorted listings into pairs according to `mode`.
pub fn pair_files(root_files: &[PathBuf], stem_files: &[PathBuf], mode: PairingMode) -> Pairing {
    match mode {
        PairingMode::Positional => pair_positional(root_files, stem_files),
        PairingMode::Stem => pair_by_stem(root_files, stem_files),
    }
}

fn pair_positional(root_files: &[PathBuf], stem_files: &[PathBuf]) -> Pairing {
    let n = root_files.len().min(stem_files.len());

    let pairs: Vec<MeshPair> = root_files
        .iter()
        .zip(stem_files)
        .map(|(root, stem)| MeshPair {
            root: root.clone(),
            stem: stem.clone(),
        })
        .collect();

    for pair in &pairs {
        if file_stem(&pair.root) != file_stem(&pair.stem) {
            warn!(
                root = %pair.root.display(),
                stem = %pair.stem.display(),
                "Positional pair has differing filenames"
            );
        }
    }

    Pairing {
        pairs,
        unpaired_root: root_files[n..].to_vec(),
        unpaired_stem: stem_files[n..].to_vec(),
    }
}

fn pair_by_stem(root_files: &[PathBuf], stem_files: &[PathBuf]) -> Pairing {
    let mut by_stem: HashMap<&str, &PathBuf> = stem_files
        .iter()
        .filter_map(|p| file_stem(p).map(|s| (s, p)))
        .collect();

    let mut pairing = Pairing::default();
    for root in root_files {
        match file_stem(root).and_then(|s| by_stem.remove(s)) {
            Some(stem) => pairing.pairs.push(MeshPair {
                root: root.clone(),
                stem: stem.clone(),
            }),
            None => {
                warn!(root = %root.display(), "No stem mesh with matching name");
                pairing.unpaired_root.push(root.clone());
            }
        }
    }

    // Keep the leftover stems in listing order.
    for stem in stem_files {
        if file_stem(stem).is_some_and(|s| by_stem.contains_key(s)) {
            warn!(stem = %stem.display(), "No root mesh with matching name");
            pairing.unpaired_stem.push(stem.clone());
        }
    }

    pairing
}

fn file_stem(path: &Path) -> Option<&str> {
    path.file_stem().and_then(|s| s.to_str())
}
