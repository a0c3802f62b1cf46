pub mod mesh;

pub use mesh::PolyMesh;
