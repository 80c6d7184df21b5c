//! exiftool batch protocol
//!
//! Metadata is extracted by running the external `exiftool` binary once per
//! batch of files:
//!
//! 1. [`ArgsFileBuilder`] copies a fixed flag template into a uniquely named
//!    temp file and appends one image path per line
//! 2. [`ToolInvoker`] runs `exiftool -@ <args file>`, draining stdout and
//!    classifying stderr, within a timeout
//! 3. [`parse_metadata`] turns the JSON response into [`ImageRecord`](crate::ImageRecord)s
//!
//! [`ExifToolExtractor`] ties the three together behind the
//! [`MetadataExtractor`] trait consumed by the batch scheduler.

mod args_file;
mod extractor;
mod invoker;
mod parser;
mod traits;

pub use args_file::{ArgsFile, ArgsFileBuilder, TEMP_MARKER, check_paths};
pub use extractor::ExifToolExtractor;
pub use invoker::ToolInvoker;
pub use parser::parse_metadata;
pub use traits::MetadataExtractor;
