//! 来源解析与引用标注

pub mod extractor;
pub mod resolver;

pub use extractor::{Citation, collect_segments, extract, insert_markers};
pub use resolver::{SHORT_KEY_PREFIX, SourceResolver, SourceSegment};
