pub mod config;
pub mod error;
pub mod pairing;
pub mod pipeline;
pub mod simplify;
pub mod types;
pub mod viewer;
pub mod vtk;

pub use config::{BatchConfig, FailurePolicy, ViewConfig};
pub use error::{DecimateError, Result};
pub use pairing::{MeshPair, PairingMode, list_mesh_files};
pub use pipeline::{BatchProcessor, ProcessingResult, process};
pub use simplify::{MeshSimplifier, MeshoptSimplifier, decimate};
pub use types::PolyMesh;
pub use vtk::{VtkEncoding, read_mesh, write_mesh};
