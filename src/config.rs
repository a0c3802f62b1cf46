use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use serde::Deserialize;

use crate::error::{DecimateError, Result};
use crate::pairing::PairingMode;
use crate::simplify::validate_reduction;
use crate::vtk::VtkEncoding;

/// Default fraction of triangles removed per mesh.
pub const DEFAULT_REDUCTION: f32 = 0.5;

/// What to do when one mesh of the batch fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Log the failure, record it and move on to the next mesh.
    #[default]
    #[value(name = "continue")]
    Continue,
    /// Stop the batch and return the first error.
    #[value(name = "abort")]
    Abort,
}

impl std::fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailurePolicy::Continue => write!(f, "continue"),
            FailurePolicy::Abort => write!(f, "abort"),
        }
    }
}

/// Fully resolved batch decimation configuration.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub root_dir: PathBuf,
    pub stem_dir: PathBuf,
    pub output_root_dir: PathBuf,
    pub output_stem_dir: PathBuf,
    pub reduction: f32,
    pub pairing: PairingMode,
    pub on_error: FailurePolicy,
    pub encoding: VtkEncoding,
    pub sloppy_fallback: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::new(),
            stem_dir: PathBuf::new(),
            output_root_dir: PathBuf::new(),
            output_stem_dir: PathBuf::new(),
            reduction: DEFAULT_REDUCTION,
            pairing: PairingMode::default(),
            on_error: FailurePolicy::default(),
            encoding: VtkEncoding::default(),
            sloppy_fallback: true,
        }
    }
}

impl BatchConfig {
    /// Config for the four directories and a reduction, everything else default.
    pub fn new(
        root_dir: impl Into<PathBuf>,
        stem_dir: impl Into<PathBuf>,
        output_root_dir: impl Into<PathBuf>,
        output_stem_dir: impl Into<PathBuf>,
        reduction: f32,
    ) -> Self {
        Self {
            root_dir: root_dir.into(),
            stem_dir: stem_dir.into(),
            output_root_dir: output_root_dir.into(),
            output_stem_dir: output_stem_dir.into(),
            reduction,
            ..Default::default()
        }
    }

    /// Startup checks: input directories exist and the reduction is in range.
    pub fn validate(&self) -> Result<()> {
        validate_reduction(self.reduction)?;
        for (label, dir) in [("root", &self.root_dir), ("stem", &self.stem_dir)] {
            if !dir.is_dir() {
                return Err(DecimateError::Input(format!(
                    "{label} directory not found: {}",
                    dir.display()
                )));
            }
        }
        Ok(())
    }
}

/// Resolved configuration of the `view` command.
#[derive(Debug, Clone)]
pub struct ViewConfig {
    pub root_dir: PathBuf,
    pub stem_dir: PathBuf,
    pub output: PathBuf,
    pub pairing: PairingMode,
}

/// Optional JSON config file for the `decimate` command. CLI flags win.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub root_dir: Option<PathBuf>,
    pub stem_dir: Option<PathBuf>,
    pub output_root_dir: Option<PathBuf>,
    pub output_stem_dir: Option<PathBuf>,
    pub reduction: Option<f32>,
    pub pairing: Option<PairingMode>,
    pub on_error: Option<FailurePolicy>,
    pub encoding: Option<VtkEncoding>,
    pub sloppy_fallback: Option<bool>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            DecimateError::Config(format!("Failed to read {}: {e}", path.display()))
        })?;
        serde_json::from_str(&text)
            .map_err(|e| DecimateError::Config(format!("Invalid config {}: {e}", path.display())))
    }
}

/// CLI argument definition (clap derive).
#[derive(Parser, Debug)]
#[command(
    name = "plant-decimate",
    about = "Batch decimation and scene export for paired root/stem VTK meshes",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Worker thread count (default: all cores, 1 = sequential)
    #[arg(short = 'j', long, global = true)]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decimate every root/stem mesh pair into the output directories
    Decimate(DecimateArgs),
    /// Compose root/stem pairs into one colored scene and export it as GLB
    View(ViewArgs),
}

#[derive(Args, Debug)]
pub struct DecimateArgs {
    /// JSON config file; flags given on the command line override it
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory of root (cylinder) meshes
    #[arg(long)]
    pub root_dir: Option<PathBuf>,

    /// Directory of stem meshes
    #[arg(long)]
    pub stem_dir: Option<PathBuf>,

    /// Output directory for decimated root meshes
    #[arg(long)]
    pub output_root_dir: Option<PathBuf>,

    /// Output directory for decimated stem meshes
    #[arg(long)]
    pub output_stem_dir: Option<PathBuf>,

    /// Fraction of triangles to remove (0.0-1.0) [default: 0.5]
    #[arg(short = 'r', long)]
    pub reduction: Option<f32>,

    /// How root and stem files are matched [default: positional]
    #[arg(long, value_enum)]
    pub pairing: Option<PairingMode>,

    /// Behaviour when a mesh fails [default: continue]
    #[arg(long, value_enum)]
    pub on_error: Option<FailurePolicy>,

    /// Write binary VTK instead of ASCII
    #[arg(long)]
    pub binary: bool,

    /// Disable the topology-agnostic fallback pass
    #[arg(long)]
    pub no_sloppy_fallback: bool,
}

impl DecimateArgs {
    /// Merge CLI flags over the optional config file.
    pub fn resolve(self) -> Result<BatchConfig> {
        let file = match &self.config {
            Some(path) => ConfigFile::load(path)?,
            None => ConfigFile::default(),
        };

        let required = |cli: Option<PathBuf>, file: Option<PathBuf>, flag: &str| {
            cli.or(file)
                .ok_or_else(|| DecimateError::Config(format!("missing required option --{flag}")))
        };

        let encoding = if self.binary {
            VtkEncoding::Binary
        } else {
            file.encoding.unwrap_or_default()
        };
        let sloppy_fallback = !self.no_sloppy_fallback && file.sloppy_fallback.unwrap_or(true);

        Ok(BatchConfig {
            root_dir: required(self.root_dir, file.root_dir, "root-dir")?,
            stem_dir: required(self.stem_dir, file.stem_dir, "stem-dir")?,
            output_root_dir: required(self.output_root_dir, file.output_root_dir, "output-root-dir")?,
            output_stem_dir: required(self.output_stem_dir, file.output_stem_dir, "output-stem-dir")?,
            reduction: self.reduction.or(file.reduction).unwrap_or(DEFAULT_REDUCTION),
            pairing: self.pairing.or(file.pairing).unwrap_or_default(),
            on_error: self.on_error.or(file.on_error).unwrap_or_default(),
            encoding,
            sloppy_fallback,
        })
    }
}

#[derive(Args, Debug)]
pub struct ViewArgs {
    /// Directory of (already reduced) root meshes
    #[arg(long)]
    pub root_dir: PathBuf,

    /// Directory of (already reduced) stem meshes
    #[arg(long)]
    pub stem_dir: PathBuf,

    /// Output GLB scene
    #[arg(short = 'o', long, default_value = "scene.glb")]
    pub output: PathBuf,

    /// How root and stem files are matched
    #[arg(long, value_enum, default_value = "positional")]
    pub pairing: PairingMode,
}

impl From<ViewArgs> for ViewConfig {
    fn from(args: ViewArgs) -> Self {
        ViewConfig {
            root_dir: args.root_dir,
            stem_dir: args.stem_dir,
            output: args.output,
            pairing: args.pairing,
        }
    }
}
