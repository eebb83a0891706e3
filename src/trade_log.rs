// Durable record of trading actions
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum TradeLogError {
    #[error("could not open trade log {path}: {source}")]
    Open { path: PathBuf, source: std::io::Error },
    #[error("could not write trade log record: {0}")]
    Write(#[from] csv::Error),
    #[error("could not flush trade log: {0}")]
    Flush(#[from] std::io::Error),
}

pub trait TradeLogger: Send {
    /// Append one row to the sink.
    fn append_record(&mut self, fields: &[String]) -> Result<(), TradeLogError>;
}

/// Appends rows to a CSV file. The file is opened for each record and created
/// on first use; its parent directory must already exist.
#[derive(Debug, Clone)]
pub struct CsvTradeLogger {
    path: PathBuf,
}

impl CsvTradeLogger {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TradeLogger for CsvTradeLogger {
    fn append_record(&mut self, fields: &[String]) -> Result<(), TradeLogError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| TradeLogError::Open { path: self.path.clone(), source })?;

        // rows may differ in width (orders vs cancels)
        let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(file);
        writer.write_record(fields)?;
        writer.flush()?;
        debug!(path = %self.path.display(), fields = fields.len(), "Trade record appended");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(fields: &[&str]) -> Vec<String> {
        fields.iter().map(|f| f.to_string()).collect()
    }

    #[test]
    fn test_appends_rows_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trades.csv");
        let mut logger = CsvTradeLogger::new(&path);

        logger.append_record(&row(&["order", "BUY", "0.01", "4500000", "JRF-1"])).unwrap();
        logger.append_record(&row(&["cancel", "JRF-1"])).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "order,BUY,0.01,4500000,JRF-1\ncancel,JRF-1\n");
    }

    #[test]
    fn test_keeps_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trades.csv");
        std::fs::write(&path, "earlier,row\n").unwrap();

        let mut logger = CsvTradeLogger::new(&path);
        logger.append_record(&row(&["later", "row"])).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "earlier,row\nlater,row\n");
    }

    #[test]
    fn test_quotes_fields_with_commas() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trades.csv");
        let mut logger = CsvTradeLogger::new(&path);
        logger.append_record(&row(&["note", "a,b"])).unwrap();

        let mut reader = csv::ReaderBuilder::new().has_headers(false).from_path(&path).unwrap();
        let record = reader.records().next().unwrap().unwrap();
        assert_eq!(&record[1], "a,b");
    }

    #[test]
    fn test_missing_parent_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut logger = CsvTradeLogger::new(dir.path().join("missing").join("trades.csv"));
        let err = logger.append_record(&row(&["x"])).unwrap_err();
        assert!(matches!(err, TradeLogError::Open { .. }));
    }
}
