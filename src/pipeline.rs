use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::{BatchConfig, FailurePolicy};
use crate::error::{DecimateError, Result};
use crate::pairing::{self, MeshPair};
use crate::simplify::{MeshSimplifier, MeshoptSimplifier, validate_reduction};
use crate::vtk::{self, VtkEncoding};

/// Which half of a mesh pair a file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Root,
    Stem,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Root => write!(f, "root"),
            Side::Stem => write!(f, "stem"),
        }
    }
}

/// A mesh that could not be read, simplified or written.
#[derive(Debug, Clone)]
pub struct MeshFailure {
    pub side: Side,
    pub path: PathBuf,
    pub error: String,
}

/// Summary of a completed batch run.
#[derive(Debug, Default)]
pub struct ProcessingResult {
    pub pairs: usize,
    pub meshes_written: usize,
    pub triangles_in: usize,
    pub triangles_out: usize,
    pub failures: Vec<MeshFailure>,
    pub unpaired_root: usize,
    pub unpaired_stem: usize,
    /// No pairs were found; nothing beyond the output directories was touched.
    pub noop: bool,
    pub duration: Duration,
}

#[derive(Debug, Clone, Copy)]
struct MeshStats {
    triangles_in: usize,
    triangles_out: usize,
}

/// One read-simplify-write unit of work.
struct Job<'a> {
    side: Side,
    input: &'a Path,
    output_dir: &'a Path,
}

/// Batch orchestrator -- pairs, decimates and writes root/stem meshes.
pub struct BatchProcessor {
    simplifier: Box<dyn MeshSimplifier>,
}

impl BatchProcessor {
    pub fn new(simplifier: Box<dyn MeshSimplifier>) -> Self {
        Self { simplifier }
    }

    /// Processor using the meshopt backend configured from `config`.
    pub fn from_config(config: &BatchConfig) -> Self {
        Self::new(Box::new(MeshoptSimplifier {
            sloppy_fallback: config.sloppy_fallback,
            ..Default::default()
        }))
    }

    /// Run the batch described by `config`.
    pub fn process(&self, config: &BatchConfig) -> Result<ProcessingResult> {
        let start = Instant::now();
        validate_reduction(config.reduction)?;

        for dir in [&config.output_root_dir, &config.output_stem_dir] {
            fs::create_dir_all(dir).map_err(|source| DecimateError::Directory {
                path: dir.clone(),
                source,
            })?;
        }
        ensure_distinct_outputs(config)?;

        let root_files = pairing::list_mesh_files(&config.root_dir)?;
        let stem_files = pairing::list_mesh_files(&config.stem_dir)?;
        let pairing = pairing::pair_files(&root_files, &stem_files, config.pairing);

        info!(
            root_files = root_files.len(),
            stem_files = stem_files.len(),
            pairs = pairing.pairs.len(),
            mode = %config.pairing,
            "Paired mesh files"
        );
        for path in pairing.unpaired_root.iter().chain(&pairing.unpaired_stem) {
            debug!(path = %path.display(), "Ignoring unpaired file");
        }

        let mut result = ProcessingResult {
            pairs: pairing.pairs.len(),
            unpaired_root: pairing.unpaired_root.len(),
            unpaired_stem: pairing.unpaired_stem.len(),
            ..Default::default()
        };

        if pairing.pairs.is_empty() {
            info!(
                root = %config.root_dir.display(),
                stem = %config.stem_dir.display(),
                "No .vtk pairs found in the input directories, nothing to do"
            );
            result.noop = true;
            result.duration = start.elapsed();
            return Ok(result);
        }

        let jobs = build_jobs(&pairing.pairs, config);
        info!(
            meshes = jobs.len(),
            reduction = config.reduction,
            backend = self.simplifier.name(),
            "Decimating meshes"
        );

        match config.on_error {
            FailurePolicy::Abort => {
                let stats = jobs
                    .par_iter()
                    .map(|job| self.process_mesh(job, config.reduction, config.encoding))
                    .collect::<Result<Vec<_>>>()?;
                for s in stats {
                    result.record(s);
                }
            }
            FailurePolicy::Continue => {
                let outcomes: Vec<_> = jobs
                    .par_iter()
                    .map(|job| (job, self.process_mesh(job, config.reduction, config.encoding)))
                    .collect();
                for (job, outcome) in outcomes {
                    match outcome {
                        Ok(s) => result.record(s),
                        Err(e) => {
                            warn!(side = %job.side, path = %job.input.display(), error = %e, "Skipping mesh");
                            result.failures.push(MeshFailure {
                                side: job.side,
                                path: job.input.to_path_buf(),
                                error: e.to_string(),
                            });
                        }
                    }
                }
            }
        }

        result.duration = start.elapsed();
        info!(
            pairs = result.pairs,
            written = result.meshes_written,
            failed = result.failures.len(),
            triangles_in = result.triangles_in,
            triangles_out = result.triangles_out,
            elapsed = ?result.duration,
            "Batch complete"
        );
        Ok(result)
    }

    fn process_mesh(&self, job: &Job<'_>, reduction: f32, encoding: VtkEncoding) -> Result<MeshStats> {
        let file_name = job.input.file_name().ok_or_else(|| {
            DecimateError::Input(format!("no file name in {}", job.input.display()))
        })?;
        let output = job.output_dir.join(file_name);

        let mesh = vtk::read_mesh(job.input)?;
        let simplified = self.simplifier.simplify(&mesh, reduction)?;
        vtk::write_mesh(&simplified.mesh, &output, encoding)?;

        info!(
            side = %job.side,
            file = %file_name.to_string_lossy(),
            triangles_in = mesh.triangle_count(),
            triangles_out = simplified.mesh.triangle_count(),
            error = simplified.achieved_error,
            fallback = simplified.used_fallback,
            "Decimated mesh"
        );

        Ok(MeshStats {
            triangles_in: mesh.triangle_count(),
            triangles_out: simplified.mesh.triangle_count(),
        })
    }
}

impl ProcessingResult {
    fn record(&mut self, stats: MeshStats) {
        self.meshes_written += 1;
        self.triangles_in += stats.triangles_in;
        self.triangles_out += stats.triangles_out;
    }
}

/// Root and stem outputs sharing a directory would race on equal basenames.
fn ensure_distinct_outputs(config: &BatchConfig) -> Result<()> {
    let canonical = |dir: &PathBuf| {
        fs::canonicalize(dir).map_err(|source| DecimateError::Directory {
            path: dir.clone(),
            source,
        })
    };
    if canonical(&config.output_root_dir)? == canonical(&config.output_stem_dir)? {
        return Err(DecimateError::InvalidArgument(format!(
            "root and stem outputs both resolve to {}",
            config.output_root_dir.display()
        )));
    }
    Ok(())
}

/// Root and stem of each pair are independent jobs.
fn build_jobs<'a>(pairs: &'a [MeshPair], config: &'a BatchConfig) -> Vec<Job<'a>> {
    pairs
        .iter()
        .flat_map(|pair| {
            [
                Job {
                    side: Side::Root,
                    input: pair.root.as_path(),
                    output_dir: config.output_root_dir.as_path(),
                },
                Job {
                    side: Side::Stem,
                    input: pair.stem.as_path(),
                    output_dir: config.output_stem_dir.as_path(),
                },
            ]
        })
        .collect()
}

/// Decimate every root/stem pair with the default backend and settings.
pub fn process(
    root_dir: &Path,
    stem_dir: &Path,
    output_root_dir: &Path,
    output_stem_dir: &Path,
    reduction: f32,
) -> Result<ProcessingResult> {
    let config = BatchConfig::new(root_dir, stem_dir, output_root_dir, output_stem_dir, reduction);
    BatchProcessor::from_config(&config).process(&config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simplify::SimplifiedMesh;
    use crate::types::PolyMesh;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Drops every other triangle and counts calls.
    struct HalvingSimplifier {
        calls: AtomicUsize,
    }

    impl MeshSimplifier for HalvingSimplifier {
        fn simplify(&self, mesh: &PolyMesh, _reduction: f32) -> Result<SimplifiedMesh> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let indices = mesh
                .indices
                .chunks_exact(3)
                .step_by(2)
                .flatten()
                .copied()
                .collect();
            Ok(SimplifiedMesh {
                mesh: crate::simplify::compact_mesh(indices, mesh),
                achieved_error: 0.0,
                used_fallback: false,
            })
        }

        fn name(&self) -> &'static str {
            "halving"
        }
    }

    fn strip(n: usize) -> PolyMesh {
        let mut positions = Vec::new();
        for i in 0..=n {
            positions.extend_from_slice(&[i as f32, 0.0, 0.0, i as f32, 1.0, 0.0]);
        }
        let mut indices = Vec::new();
        for i in 0..n as u32 {
            let a = i * 2;
            indices.extend_from_slice(&[a, a + 2, a + 1, a + 1, a + 2, a + 3]);
        }
        PolyMesh {
            positions,
            indices,
            colors: None,
        }
    }

    #[test]
    fn custom_simplifier_is_used_for_every_mesh() {
        let tmp = tempfile::tempdir().unwrap();
        let (root, stem) = (tmp.path().join("root"), tmp.path().join("stem"));
        fs::create_dir_all(&root).unwrap();
        fs::create_dir_all(&stem).unwrap();
        for name in ["s1.vtk", "s2.vtk"] {
            vtk::write_mesh(&strip(4), &root.join(name), VtkEncoding::Ascii).unwrap();
            vtk::write_mesh(&strip(4), &stem.join(name), VtkEncoding::Ascii).unwrap();
        }

        let config = BatchConfig::new(&root, &stem, tmp.path().join("or"), tmp.path().join("os"), 0.5);
        let simplifier = Box::new(HalvingSimplifier {
            calls: AtomicUsize::new(0),
        });
        let processor = BatchProcessor::new(simplifier);
        let result = processor.process(&config).unwrap();

        assert_eq!(result.pairs, 2);
        assert_eq!(result.meshes_written, 4);
        assert_eq!(result.triangles_in, 32);
        assert_eq!(result.triangles_out, 16);
        let out = vtk::read_mesh(&tmp.path().join("os").join("s2.vtk")).unwrap();
        assert_eq!(out.triangle_count(), 4);
    }

    #[test]
    fn invalid_reduction_is_rejected_before_touching_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let out_root = tmp.path().join("or");
        let config = BatchConfig::new(tmp.path(), tmp.path(), &out_root, tmp.path().join("os"), -0.5);
        let err = BatchProcessor::from_config(&config).process(&config).unwrap_err();
        assert!(matches!(err, DecimateError::InvalidArgument(_)));
        assert!(!out_root.exists());
    }

    #[test]
    fn missing_input_directory_aborts() {
        let tmp = tempfile::tempdir().unwrap();
        let config = BatchConfig::new(
            tmp.path().join("nope"),
            tmp.path(),
            tmp.path().join("or"),
            tmp.path().join("os"),
            0.5,
        );
        let err = BatchProcessor::from_config(&config).process(&config).unwrap_err();
        assert!(matches!(err, DecimateError::Directory { .. }));
    }

    #[test]
    fn shared_output_directory_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("out");
        let config = BatchConfig::new(
            tmp.path(),
            tmp.path(),
            &out,
            tmp.path().join("x").join("..").join("out"),
            0.5,
        );
        let err = BatchProcessor::from_config(&config).process(&config).unwrap_err();
        assert!(matches!(err, DecimateError::InvalidArgument(_)));
        assert!(err.to_string().contains("both resolve"));
    }

    #[test]
    fn side_display() {
        assert_eq!(Side::Root.to_string(), "root");
        assert_eq!(Side::Stem.to_string(), "stem");
    }
}
