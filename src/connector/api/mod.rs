mod container;
mod router;

pub use container::{Container, ContainerConfig};
pub use router::{router, serve, AppState};
