//! Input-to-feature-vector transformation steps

pub mod assembler;
pub mod encoder;
pub mod normalizer;

pub use assembler::FeatureAssembler;
pub use encoder::{encode_and_align, AlignmentReport, EncodedVector};
pub use normalizer::Normalizer;
