//! Port definitions (hexagonal architecture)
//!
//! The services depend on these traits; adapters provide the CSV/HTTP
//! dataset source, the chat-completion describer and the PDF renderer.

mod dataset_source;
mod describer;
mod renderer;

pub use dataset_source::DatasetSource;
pub use describer::RegionDescriber;
pub use renderer::DocumentRenderer;
