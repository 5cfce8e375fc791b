pub mod checksum;
pub mod fields;

pub use checksum::ChecksumCodec;
pub use fields::{names, FieldSet};
