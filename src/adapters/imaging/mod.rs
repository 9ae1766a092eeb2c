pub mod annotate;
pub mod codec;
pub mod preview;
