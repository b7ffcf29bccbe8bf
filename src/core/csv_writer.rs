use crate::core::{ElectionRecord, HeaderMode, OutputFormat, Row, Schema};
use crate::domain::model::TOWN_NAME;
use crate::utils::error::{Result, ScrapeError};
use crate::utils::validation::{output_directory, validate_output_directory};
use std::path::Path;
use tempfile::NamedTempFile;

/// Temporary file next to `path` that ends up with the permissions a plain
/// write would give: the destination's current mode, or 0666 minus the umask.
fn temp_file_for(path: &Path) -> Result<NamedTempFile> {
    let dir = output_directory(path);

    #[cfg(unix)]
    let temp = {
        use std::os::unix::fs::PermissionsExt;
        tempfile::Builder::new()
            .permissions(std::fs::Permissions::from_mode(0o666))
            .tempfile_in(dir)?
    };
    #[cfg(not(unix))]
    let temp = NamedTempFile::new_in(dir)?;

    if let Ok(metadata) = std::fs::metadata(path) {
        temp.as_file().set_permissions(metadata.permissions())?;
    }
    Ok(temp)
}

/// Writes a dataset to a delimited file in one go.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvWriter {
    header_mode: HeaderMode,
    format: OutputFormat,
}

impl CsvWriter {
    pub fn new(header_mode: HeaderMode, format: OutputFormat) -> Self {
        Self {
            header_mode,
            format,
        }
    }

    /// Serializes `records` to `path` and returns the schema that was used.
    ///
    /// The data goes to a temporary file next to `path` first and is renamed
    /// into place, so on error the destination is left as it was. The
    /// destination directory is never created.
    pub fn write<P: AsRef<Path>>(&self, records: &[ElectionRecord], path: P) -> Result<Schema> {
        let path = path.as_ref();
        let rows: Vec<Row> = records.iter().map(ElectionRecord::to_row).collect();
        let schema = Schema::derive(&rows, self.header_mode).ok_or(ScrapeError::EmptyDatasetError)?;

        validate_output_directory(path)?;

        let mut temp = temp_file_for(path)?;
        {
            let mut writer = csv::WriterBuilder::new()
                .delimiter(self.format.delimiter())
                .from_writer(temp.as_file_mut());

            writer.write_record(schema.columns())?;
            for row in &rows {
                let dropped = row.keys().filter(|key| !schema.contains(key)).count();
                if dropped > 0 {
                    tracing::debug!(
                        "{} column(s) of {} are not in the header and were dropped",
                        dropped,
                        row.get(TOWN_NAME).unwrap_or("?")
                    );
                }
                writer.write_record(row.project(&schema))?;
            }
            writer.flush()?;
        }
        temp.as_file_mut().sync_all()?;

        temp.persist(path).map_err(|e| ScrapeError::IoError(e.error))?;

        tracing::debug!(
            "Wrote {} rows × {} columns to {}",
            rows.len(),
            schema.columns().len(),
            path.display()
        );
        Ok(schema)
    }
}
