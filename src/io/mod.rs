pub mod output;
pub mod source;

pub use output::{create_writer, OutputFormat, OutputWriter};
pub use source::{JsonFileSource, MemorySource, RecordSource};

use anyhow::Result;
use std::fs;
use std::path::Path;

pub fn write_file(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content)?;
    Ok(())
}
