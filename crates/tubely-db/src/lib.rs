//! Video record store
//!
//! Handlers reach records only through [`VideoRepository`]. The crate ships an
//! in-process implementation; a persistent backend plugs in behind the same
//! trait.

mod video;

pub use video::{InMemoryVideoRepository, VideoRepository};
