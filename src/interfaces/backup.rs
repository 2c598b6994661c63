use crate::application::admin::BackupDocument;
use crate::error::Result;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

pub fn read_backup(path: &Path) -> Result<BackupDocument> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

pub fn write_backup(path: &Path, backup: &BackupDocument) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, backup)?;
    writer.flush()?;
    Ok(())
}
