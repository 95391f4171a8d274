use crate::core::instance_header::InstanceHeader;
use crate::core::instances::{DenseInstance, Instance};
use crate::streams::arff::parser::{is_comment_or_empty, parse_header, parse_instance_values};
use crate::streams::stream::Stream;
use log::warn;
use std::fs::File;
use std::io::{BufRead, BufReader, Error, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Streams the data section of an ARFF file one row at a time. Rows that do
/// not match the header are logged and skipped.
#[derive(Debug)]
pub struct ArffFileStream {
    path: PathBuf,
    reader: BufReader<File>,
    header: Arc<InstanceHeader>,
    data_offset: u64,
    pending: Option<String>,
    line_number: usize,
    skipped_rows: usize,
    exhausted: bool,
}

impl ArffFileStream {
    /// Opens `path` and reads its header. The class is the last attribute
    /// when `class_index` is `None`.
    pub fn new(path: impl AsRef<Path>, class_index: Option<usize>) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();
        let mut reader = BufReader::new(File::open(&path)?);
        let (header, data_offset) = parse_header(&mut reader, class_index)?;

        let mut stream = ArffFileStream {
            path,
            reader,
            header: Arc::new(header),
            data_offset,
            pending: None,
            line_number: 0,
            skipped_rows: 0,
            exhausted: false,
        };
        stream.advance()?;
        Ok(stream)
    }

    pub fn shared_header(&self) -> Arc<InstanceHeader> {
        Arc::clone(&self.header)
    }

    /// Rows dropped so far because they did not parse.
    pub fn skipped_rows(&self) -> usize {
        self.skipped_rows
    }

    /// Reads ahead to the next data row, skipping comments and blank lines.
    fn advance(&mut self) -> Result<(), Error> {
        self.pending = None;
        if self.exhausted {
            return Ok(());
        }
        let mut line = String::new();
        loop {
            line.clear();
            if self.reader.read_line(&mut line)? == 0 {
                self.exhausted = true;
                return Ok(());
            }
            self.line_number += 1;
            if !is_comment_or_empty(&line) {
                self.pending = Some(line.trim().to_string());
                return Ok(());
            }
        }
    }
}

impl Stream for ArffFileStream {
    fn header(&self) -> &InstanceHeader {
        &self.header
    }

    fn has_more_instances(&self) -> bool {
        self.pending.is_some()
    }

    fn next_instance(&mut self) -> Option<Box<dyn Instance>> {
        while let Some(row) = self.pending.take() {
            let row_number = self.line_number;
            if let Err(e) = self.advance() {
                warn!("{}: read failed after data row {row_number}: {e}", self.path.display());
                self.exhausted = true;
            }
            match parse_instance_values(&self.header, &row) {
                Ok(values) => {
                    return Some(Box::new(DenseInstance::new(
                        Arc::clone(&self.header),
                        values,
                        1.0,
                    )));
                }
                Err(e) => {
                    self.skipped_rows += 1;
                    warn!("{}: skipping data row {row_number}: {e}", self.path.display());
                }
            }
        }
        None
    }

    fn restart(&mut self) -> Result<(), Error> {
        let mut reader = BufReader::new(File::open(&self.path)?);
        reader.seek(SeekFrom::Start(self.data_offset))?;
        self.reader = reader;
        self.exhausted = false;
        self.skipped_rows = 0;
        self.line_number = 0;
        self.advance()
    }
}
