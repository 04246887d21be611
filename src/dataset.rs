//! Loading and normalization of the weekly top-charts dataset.
//!
//! Accepts a plain CSV or a zip archive containing one, parses rows into
//! [`ChartRow`] records, and memoizes loaded tables by source path.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{debug, warn};
use zip::ZipArchive;

/// Countries selectable for analysis. Matching against the dataset is
/// exact-string and case-sensitive.
pub const TARGET_COUNTRIES: [&str; 15] = [
    "Taiwan",
    "Hong Kong",
    "Japan",
    "South Korea",
    "Thailand",
    "Vietnam",
    "Philippines",
    "Singapore",
    "China",
    "United States",
    "Canada",
    "United Kingdom",
    "France",
    "Sweden",
    "Norway",
];

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} is not a readable zip archive: {source}", path.display())]
    Zip {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },
    #[error("no .csv entry found inside {}", path.display())]
    EmptyArchive { path: PathBuf },
    #[error("missing required column `{0}`")]
    MissingColumn(&'static str),
    #[error("row {row}: bad `{column}` value `{value}`")]
    InvalidValue {
        row: u64,
        column: &'static str,
        value: String,
    },
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

/// Content category, matching the dataset's `category` column labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
pub enum Category {
    Films,
    #[serde(rename = "TV")]
    Tv,
}

impl Category {
    /// The label used in the CSV `category` column.
    pub fn label(self) -> &'static str {
        match self {
            Category::Films => "Films",
            Category::Tv => "TV",
        }
    }

    fn from_label(label: &str) -> Option<Self> {
        match label {
            "Films" => Some(Category::Films),
            "TV" => Some(Category::Tv),
            _ => None,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One observed weekly chart entry.
#[derive(Debug, Clone)]
pub struct ChartRow {
    pub week: NaiveDate,
    /// `YYYY-MM-DD` display form of `week`.
    pub week_str: String,
    pub category: Category,
    pub show_title: String,
    /// Producing country (CSV `Country`).
    pub origin: String,
    /// Market where the title charted (CSV `country_name`).
    pub market: String,
    pub weekly_rank: u32,
    pub genre: Option<String>,
    /// Data-quality flag; `"OK"` marks a trusted genre label.
    pub match_flag: Option<String>,
    /// View-count snapshots aligned with [`Dataset::views_columns`]
    /// (most-recent-first). `None` means missing, never zero.
    pub views: Vec<Option<f64>>,
}

/// The fully loaded, immutable table.
#[derive(Debug)]
pub struct Dataset {
    pub rows: Vec<ChartRow>,
    /// Every header containing `"Views"`, ordered most-recent-first.
    /// Snapshot names embed dates, so descending name order is descending
    /// chronological order.
    pub views_columns: Vec<String>,
    pub has_genre: bool,
    pub has_match: bool,
    /// Rows dropped for an unrecognized `category` label.
    pub skipped_rows: usize,
}

/// A borrowed, category-filtered view of a [`Dataset`]. An empty view is
/// valid; downstream aggregations report "no data" rather than failing.
pub struct CategoryView<'a> {
    pub category: Category,
    pub rows: Vec<&'a ChartRow>,
    pub views_columns: &'a [String],
    pub has_genre: bool,
    pub has_match: bool,
}

impl Dataset {
    /// Parses a weekly charts table from a CSV file or a zip archive
    /// containing one.
    pub fn load(path: &Path) -> Result<Dataset, LoadError> {
        let bytes = read_source(path)?;
        let dataset = parse_table(&bytes)?;
        if dataset.skipped_rows > 0 {
            warn!(
                skipped = dataset.skipped_rows,
                "Rows with unrecognized category labels were dropped"
            );
        }
        debug!(
            rows = dataset.rows.len(),
            views_columns = dataset.views_columns.len(),
            "Dataset loaded"
        );
        Ok(dataset)
    }

    pub fn category(&self, category: Category) -> CategoryView<'_> {
        CategoryView {
            category,
            rows: self.rows.iter().filter(|r| r.category == category).collect(),
            views_columns: &self.views_columns,
            has_genre: self.has_genre,
            has_match: self.has_match,
        }
    }
}

impl CategoryView<'_> {
    /// Countries present in this view (as market or origin) that are also on
    /// the `allow` list, sorted alphabetically.
    pub fn selectable_countries(&self, allow: &[&str]) -> Vec<String> {
        let mut out: Vec<String> = allow
            .iter()
            .filter(|c| {
                self.rows
                    .iter()
                    .any(|r| r.market == **c || r.origin == **c)
            })
            .map(|c| c.to_string())
            .collect();
        out.sort();
        out
    }
}

/// Memoizes loaded datasets by canonical source path. Repeated loads of the
/// same file return the same `Arc` without re-parsing.
#[derive(Default)]
pub struct DatasetCache {
    inner: Mutex<HashMap<PathBuf, Arc<Dataset>>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&self, path: &Path) -> Result<Arc<Dataset>, LoadError> {
        let key = path.canonicalize().map_err(|e| LoadError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut cache = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(dataset) = cache.get(&key) {
            debug!(path = %key.display(), "Dataset served from cache");
            return Ok(dataset.clone());
        }

        let dataset = Arc::new(Dataset::load(path)?);
        cache.insert(key, dataset.clone());
        Ok(dataset)
    }
}

fn read_source(path: &Path) -> Result<Vec<u8>, LoadError> {
    let bytes = fs::read(path).map_err(|e| LoadError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    if path.extension().and_then(|e| e.to_str()) == Some("zip") {
        extract_first_csv(path, bytes)
    } else {
        Ok(bytes)
    }
}

fn extract_first_csv(path: &Path, bytes: Vec<u8>) -> Result<Vec<u8>, LoadError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(|e| LoadError::Zip {
        path: path.to_path_buf(),
        source: e,
    })?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(|e| LoadError::Zip {
            path: path.to_path_buf(),
            source: e,
        })?;
        if entry.is_file() && entry.name().ends_with(".csv") {
            let mut buf = Vec::new();
            entry.read_to_end(&mut buf).map_err(|e| LoadError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;
            return Ok(buf);
        }
    }

    Err(LoadError::EmptyArchive {
        path: path.to_path_buf(),
    })
}

struct Columns {
    week: usize,
    category: usize,
    title: usize,
    origin: usize,
    market: usize,
    rank: usize,
    genre: Option<usize>,
    match_flag: Option<usize>,
    /// `(header, index)` pairs, most-recent-first.
    views: Vec<(String, usize)>,
}

fn map_columns(headers: &csv::StringRecord) -> Result<Columns, LoadError> {
    let find = |name: &'static str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or(LoadError::MissingColumn(name))
    };

    let mut views: Vec<(String, usize)> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| h.contains("Views"))
        .map(|(i, h)| (h.to_string(), i))
        .collect();
    views.sort_by(|a, b| b.0.cmp(&a.0));

    Ok(Columns {
        week: find("week")?,
        category: find("category")?,
        title: find("show_title")?,
        origin: find("Country")?,
        market: find("country_name")?,
        rank: find("weekly_rank")?,
        genre: headers.iter().position(|h| h == "Genre"),
        match_flag: headers.iter().position(|h| h == "match"),
        views,
    })
}

fn parse_table(bytes: &[u8]) -> Result<Dataset, LoadError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(bytes);
    let headers = reader.headers()?.clone();
    let cols = map_columns(&headers)?;

    let mut rows = Vec::new();
    let mut skipped_rows = 0usize;

    for (i, record) in reader.records().enumerate() {
        let record = record?;
        let line = i as u64 + 2; // line 1 is the header

        let category = match Category::from_label(field(&record, cols.category)) {
            Some(c) => c,
            None => {
                skipped_rows += 1;
                continue;
            }
        };

        let week_raw = field(&record, cols.week);
        let week = NaiveDate::parse_from_str(week_raw, "%Y-%m-%d").map_err(|_| {
            LoadError::InvalidValue {
                row: line,
                column: "week",
                value: week_raw.to_string(),
            }
        })?;

        let rank_raw = field(&record, cols.rank);
        let weekly_rank: u32 = rank_raw.parse().ok().filter(|r| *r >= 1).ok_or_else(|| {
            LoadError::InvalidValue {
                row: line,
                column: "weekly_rank",
                value: rank_raw.to_string(),
            }
        })?;

        let views = cols
            .views
            .iter()
            .map(|(_, idx)| parse_views(field(&record, *idx)))
            .collect();

        rows.push(ChartRow {
            week,
            week_str: week.format("%Y-%m-%d").to_string(),
            category,
            show_title: field(&record, cols.title).to_string(),
            origin: field(&record, cols.origin).to_string(),
            market: field(&record, cols.market).to_string(),
            weekly_rank,
            genre: optional_field(&record, cols.genre),
            match_flag: optional_field(&record, cols.match_flag),
            views,
        });
    }

    Ok(Dataset {
        rows,
        views_columns: cols.views.into_iter().map(|(name, _)| name).collect(),
        has_genre: cols.genre.is_some(),
        has_match: cols.match_flag.is_some(),
        skipped_rows,
    })
}

fn field<'a>(record: &'a csv::StringRecord, idx: usize) -> &'a str {
    record.get(idx).unwrap_or("").trim()
}

fn optional_field(record: &csv::StringRecord, idx: Option<usize>) -> Option<String> {
    let value = field(record, idx?);
    (!value.is_empty()).then(|| value.to_string())
}

/// Coerces a view-count cell: thousands separators are stripped; anything
/// that still fails to parse is missing, not zero.
fn parse_views(raw: &str) -> Option<f64> {
    let cleaned = raw.replace(',', "");
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::io::Write;

    const BASIC: &str = "\
week,category,show_title,Country,country_name,weekly_rank,Genre,match,Views_20250601,Views_20251027
2025-10-06,Films,Alpha,South Korea,Japan,1,Drama,OK,\"900,000\",\"1,200,000\"
2025-10-06,TV,Beta,Japan,Taiwan,3,Anime,needs_review,,
2025-10-13,Films,Alpha,South Korea,Japan,2,Drama,OK,,n/a
";

    fn temp_path(name: &str) -> PathBuf {
        PathBuf::from(format!("{}/{}", env::temp_dir().display(), name))
    }

    #[test]
    fn test_parse_basic_table() {
        let ds = parse_table(BASIC.as_bytes()).unwrap();
        assert_eq!(ds.rows.len(), 3);
        assert_eq!(ds.skipped_rows, 0);
        assert!(ds.has_genre);
        assert!(ds.has_match);

        let row = &ds.rows[0];
        assert_eq!(row.week_str, "2025-10-06");
        assert_eq!(row.category, Category::Films);
        assert_eq!(row.show_title, "Alpha");
        assert_eq!(row.origin, "South Korea");
        assert_eq!(row.market, "Japan");
        assert_eq!(row.weekly_rank, 1);
        assert_eq!(row.genre.as_deref(), Some("Drama"));
        assert_eq!(row.match_flag.as_deref(), Some("OK"));
    }

    #[test]
    fn test_views_columns_most_recent_first() {
        let ds = parse_table(BASIC.as_bytes()).unwrap();
        assert_eq!(ds.views_columns, vec!["Views_20251027", "Views_20250601"]);
        // Row views are aligned with that ordering
        assert_eq!(ds.rows[0].views, vec![Some(1_200_000.0), Some(900_000.0)]);
    }

    #[test]
    fn test_views_failures_become_missing_not_zero() {
        let ds = parse_table(BASIC.as_bytes()).unwrap();
        assert_eq!(ds.rows[1].views, vec![None, None]);
        // "n/a" fails to parse even after separator stripping
        assert_eq!(ds.rows[2].views, vec![None, None]);
    }

    #[test]
    fn test_missing_required_column() {
        let csv = "week,category,show_title,Country,weekly_rank\n";
        let err = parse_table(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn("country_name")));
    }

    #[test]
    fn test_optional_columns_absent() {
        let csv = "\
week,category,show_title,Country,country_name,weekly_rank
2025-10-06,Films,Alpha,South Korea,Japan,1
";
        let ds = parse_table(csv.as_bytes()).unwrap();
        assert!(!ds.has_genre);
        assert!(!ds.has_match);
        assert!(ds.views_columns.is_empty());
        assert_eq!(ds.rows[0].genre, None);
    }

    #[test]
    fn test_bad_week_is_invalid_value() {
        let csv = "\
week,category,show_title,Country,country_name,weekly_rank
not-a-date,Films,Alpha,South Korea,Japan,1
";
        let err = parse_table(csv.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            LoadError::InvalidValue {
                row: 2,
                column: "week",
                ..
            }
        ));
    }

    #[test]
    fn test_rank_zero_is_invalid() {
        let csv = "\
week,category,show_title,Country,country_name,weekly_rank
2025-10-06,Films,Alpha,South Korea,Japan,0
";
        let err = parse_table(csv.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            LoadError::InvalidValue {
                column: "weekly_rank",
                ..
            }
        ));
    }

    #[test]
    fn test_unknown_category_rows_are_skipped() {
        let csv = "\
week,category,show_title,Country,country_name,weekly_rank
2025-10-06,Games,Alpha,South Korea,Japan,1
2025-10-06,Films,Beta,Japan,Taiwan,2
";
        let ds = parse_table(csv.as_bytes()).unwrap();
        assert_eq!(ds.rows.len(), 1);
        assert_eq!(ds.skipped_rows, 1);
    }

    #[test]
    fn test_category_filter() {
        let ds = parse_table(BASIC.as_bytes()).unwrap();
        let films = ds.category(Category::Films);
        assert_eq!(films.rows.len(), 2);
        let tv = ds.category(Category::Tv);
        assert_eq!(tv.rows.len(), 1);
        assert_eq!(tv.rows[0].show_title, "Beta");
    }

    #[test]
    fn test_selectable_countries() {
        let ds = parse_table(BASIC.as_bytes()).unwrap();
        let films = ds.category(Category::Films);
        let countries = films.selectable_countries(&TARGET_COUNTRIES);
        assert_eq!(countries, vec!["Japan", "South Korea"]);
    }

    #[test]
    fn test_cache_returns_same_arc() {
        let path = temp_path("chartflow_test_cache.csv");
        fs::write(&path, BASIC).unwrap();

        let cache = DatasetCache::new();
        let a = cache.load(&path).unwrap();
        let b = cache.load(&path).unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = Dataset::load(Path::new("/nonexistent/chartflow.csv")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn test_load_zip_archive() {
        use zip::CompressionMethod;
        use zip::write::SimpleFileOptions;

        let mut buf = Vec::new();
        {
            let mut writer = zip::ZipWriter::new(Cursor::new(&mut buf));
            let options =
                SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
            writer.start_file("weekly.csv", options).unwrap();
            writer.write_all(BASIC.as_bytes()).unwrap();
            writer.finish().unwrap();
        }

        let path = temp_path("chartflow_test_archive.zip");
        fs::write(&path, &buf).unwrap();

        let ds = Dataset::load(&path).unwrap();
        assert_eq!(ds.rows.len(), 3);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_zip_without_csv_entry() {
        use zip::write::SimpleFileOptions;

        let mut buf = Vec::new();
        {
            let mut writer = zip::ZipWriter::new(Cursor::new(&mut buf));
            writer
                .start_file("readme.txt", SimpleFileOptions::default())
                .unwrap();
            writer.write_all(b"nothing here").unwrap();
            writer.finish().unwrap();
        }

        let path = temp_path("chartflow_test_empty_archive.zip");
        fs::write(&path, &buf).unwrap();

        let err = Dataset::load(&path).unwrap_err();
        assert!(matches!(err, LoadError::EmptyArchive { .. }));

        fs::remove_file(&path).unwrap();
    }
}
