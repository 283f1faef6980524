//! IO utilities: model files and sparse example files.

pub mod model_file;
pub mod svmlight;

pub use model_file::{load_record, read_algorithm, save_record, FORMAT_VERSION};
pub use svmlight::{open_examples, parse_line, read_examples, ExampleReader, LabeledExample};
