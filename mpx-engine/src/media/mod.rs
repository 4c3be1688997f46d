//! Media boundary: demux containers and per-component block buffers

pub mod block_buffer;
pub mod container;
pub mod symphonia_container;

pub use block_buffer::{BlockBuffer, MediaBlock};
pub use container::{AudioParams, ComponentInfo, Container, ContainerOpener, MediaInfo, VideoParams};
pub use symphonia_container::{SymphoniaContainer, SymphoniaOpener};
