pub mod byte_compare;
pub mod comparator;
pub mod file_compare;
pub mod line_diff;
pub mod text_source;

pub use byte_compare::ByteCompareEngine;
pub use comparator::{
    comparator_for, ComparatorSettings, ComparisonMode, ContentComparator, ContentDiff,
    TextComparator,
};
pub use file_compare::FileComparison;
pub use line_diff::{LineDiffConfig, LineDiffEngine};
pub use text_source::{read_file_lines, read_lines, Encoding};
