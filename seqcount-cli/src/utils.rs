use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

pub type Result<T> = std::result::Result<T, String>;

pub fn handle_error_and_exit(err: String) -> ! {
    log::error!("{}", err);
    std::process::exit(1);
}

pub fn open_input(path: &Path) -> Result<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| format!("Failed to open {}: {}", path.display(), e))
}

pub fn create_output(path: &Path) -> Result<Box<dyn Write>> {
    File::create(path)
        .map(|f| Box::new(BufWriter::new(f)) as Box<dyn Write>)
        .map_err(|e| format!("Failed to create {}: {}", path.display(), e))
}
