use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use tracing::{debug, info, instrument, warn};

use super::record::{DescriptionRecord, COLUMNS};

const DELIMITER: u8 = b';';

/// The description history: every record in memory, mirrored by a
/// semicolon-delimited file on disk.
#[derive(Debug)]
pub struct History {
    path: PathBuf,
    records: Vec<DescriptionRecord>,
}

impl History {
    /// Empty history that will be written to `path` on the first append.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            records: Vec::new(),
        }
    }

    /// Read the whole history file. A missing file yields an empty history.
    ///
    /// Files that are not UTF-8 are decoded as ISO-8859-1. Files whose header
    /// differs from [`COLUMNS`] are rewritten once in the current layout so
    /// later appends line up with the header.
    #[instrument(level = "debug", skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!("history file missing, starting empty");
                return Ok(Self::empty(path));
            }
            Err(err) => {
                return Err(anyhow::Error::new(err)
                    .context(format!("failed to read {}", path.display())))
            }
        };

        let (text, utf8) = decode(&bytes);
        if text.trim().is_empty() {
            if !bytes.is_empty() {
                // `append` writes the header only into a zero-length file.
                debug!("history file blank, truncating");
                fs::write(&path, b"")
                    .with_context(|| format!("failed to truncate {}", path.display()))?;
            }
            return Ok(Self::empty(path));
        }

        let (records, canonical) = parse_records(&text)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        let history = Self { path, records };
        info!(rows = history.records.len(), "history loaded");

        if !utf8 || !canonical || !text.ends_with('\n') {
            warn!(utf8, canonical, "rewriting history file in current layout");
            history.rewrite()?;
        }
        Ok(history)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn records(&self) -> &[DescriptionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Append one row to the file, then to memory.
    ///
    /// The in-memory table only changes once the row is on disk.
    #[instrument(level = "debug", skip_all, fields(path = %self.path.display()))]
    pub fn append(&mut self, record: DescriptionRecord) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("failed to open {}", self.path.display()))?;
        let needs_header = file.metadata()?.len() == 0;

        let mut writer = csv::WriterBuilder::new()
            .delimiter(DELIMITER)
            .has_headers(needs_header)
            .from_writer(file);
        writer.serialize(&record)?;
        writer.flush()?;

        self.records.push(record);
        debug!(rows = self.records.len(), "history row appended");
        Ok(())
    }

    /// The whole table as a CSV document, header included.
    pub fn to_csv_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(DELIMITER)
            .from_writer(Vec::new());
        if self.records.is_empty() {
            writer.write_record(COLUMNS)?;
        }
        for record in &self.records {
            writer.serialize(record)?;
        }
        writer
            .into_inner()
            .map_err(|err| anyhow!("failed to flush csv buffer: {}", err.error()))
    }

    fn rewrite(&self) -> Result<()> {
        let bytes = self.to_csv_bytes()?;
        let tmp = self.path.with_extension("csv.tmp");
        fs::write(&tmp, bytes).with_context(|| format!("failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("failed to replace {}", self.path.display()))?;
        Ok(())
    }
}

/// Decode file bytes, falling back to ISO-8859-1. The flag is false on fallback.
fn decode(bytes: &[u8]) -> (String, bool) {
    match std::str::from_utf8(bytes) {
        Ok(text) => (text.strip_prefix('\u{feff}').unwrap_or(text).to_string(), true),
        Err(_) => (bytes.iter().map(|&b| char::from(b)).collect(), false),
    }
}

fn parse_records(text: &str) -> Result<(Vec<DescriptionRecord>, bool)> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(DELIMITER)
        .flexible(true)
        .from_reader(text.as_bytes());
    let canonical = reader.headers()?.iter().eq(COLUMNS.iter().copied());

    let mut records = Vec::new();
    for (idx, row) in reader.deserialize::<DescriptionRecord>().enumerate() {
        let record = row.with_context(|| format!("malformed history row {}", idx + 1))?;
        records.push(record);
    }
    Ok((records, canonical))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    fn record(title: &str, description: &str) -> DescriptionRecord {
        DescriptionRecord {
            image: format!("https://example.com/{title}.jpg"),
            title: title.into(),
            description: description.into(),
            description_quechua: Some(format!("{description} (qu)")),
            created_at: Some(Utc.with_ymd_and_hms(2024, 7, 16, 10, 30, 0).unwrap()),
        }
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempdir().unwrap();
        let history = History::load(dir.path().join("none.csv")).unwrap();
        assert!(history.is_empty());
    }

    #[test]
    fn append_then_reload_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("historial.csv");

        let mut history = History::load(&path).unwrap();
        history.append(record("Qhapaq Negro", "Danzantes con máscaras")).unwrap();
        history.append(record("Saqra", "Diablos; con cuernos")).unwrap();

        let reloaded = History::load(&path).unwrap();
        assert_eq!(reloaded.records(), history.records());
        assert_eq!(reloaded.len(), 2);
    }

    #[test]
    fn header_written_once() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("historial.csv");
        let mut history = History::empty(&path);
        history.append(record("a", "b")).unwrap();
        history.append(record("c", "d")).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.matches("imagen;descripcion").count(), 1);
        assert_eq!(text.lines().count(), 3);
    }

    #[test]
    fn legacy_latin1_file_is_migrated() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("legacy.csv");
        // "Título" and "Danza" in ISO-8859-1, three columns only.
        let mut bytes = b"imagen;descripcion;generated_description\n".to_vec();
        bytes.extend_from_slice(b"foto.jpg;T\xedtulo;Danza\n");
        fs::write(&path, bytes).unwrap();

        let history = History::load(&path).unwrap();
        assert_eq!(history.records()[0].title, "Título");
        assert_eq!(history.records()[0].description_quechua, None);

        let rewritten = fs::read_to_string(&path).unwrap();
        assert!(rewritten.starts_with(&COLUMNS.join(";")));
        assert!(rewritten.contains("Título"));
    }

    #[test]
    fn malformed_row_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.csv");
        fs::write(&path, "imagen;descripcion;generated_description;generated_description_quechua;fecha\nsolo\n").unwrap();

        let err = History::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("malformed history row 1"));
    }

    #[test]
    fn blank_file_gets_header_on_first_append() {
        let dir = tempdir().unwrap();
        for (name, contents) in [("newline.csv", "\n"), ("bom.csv", "\u{feff}"), ("spaces.csv", "  \r\n")] {
            let path = dir.path().join(name);
            fs::write(&path, contents).unwrap();

            let mut history = History::load(&path).unwrap();
            assert!(history.is_empty());
            history.append(record("uno", "primera")).unwrap();
            history.append(record("dos", "segunda")).unwrap();

            let reloaded = History::load(&path).unwrap();
            assert_eq!(reloaded.records(), history.records(), "{name}");
        }
    }

    #[test]
    fn utf8_bom_is_ignored() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bom.csv");
        let text = format!(
            "\u{feff}{}\nfoto.jpg;Saqra;Diablos;Supaykuna;\n",
            COLUMNS.join(";")
        );
        fs::write(&path, &text).unwrap();

        let history = History::load(&path).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history.records()[0].image, "foto.jpg");
        assert_eq!(history.records()[0].description_quechua.as_deref(), Some("Supaykuna"));
        // Header already canonical: the file is left alone.
        assert_eq!(fs::read_to_string(&path).unwrap(), text);
    }

    #[test]
    fn legacy_naive_timestamps_are_migrated() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fecha.csv");
        fs::write(
            &path,
            "imagen;descripcion;generated_description;fecha\n\
             a.jpg;T;D;2024-07-16 10:30:00\n\
             b.jpg;U;E;2024-07-16 10:31:02.250000\n",
        )
        .unwrap();

        let history = History::load(&path).unwrap();
        assert_eq!(
            history.records()[0].created_at,
            Some(Utc.with_ymd_and_hms(2024, 7, 16, 10, 30, 0).unwrap())
        );
        assert_eq!(
            history.records()[1].created_at.map(|t| t.timestamp_millis()),
            Some(Utc.with_ymd_and_hms(2024, 7, 16, 10, 31, 2).unwrap().timestamp_millis() + 250)
        );

        let rewritten = fs::read_to_string(&path).unwrap();
        assert!(rewritten.starts_with(&COLUMNS.join(";")));
        let reloaded = History::load(&path).unwrap();
        assert_eq!(reloaded.records(), history.records());
    }

    #[test]
    fn empty_table_exports_header() {
        let history = History::empty("unused.csv");
        let csv = String::from_utf8(history.to_csv_bytes().unwrap()).unwrap();
        assert_eq!(csv.trim_end(), COLUMNS.join(";"));
    }
}
