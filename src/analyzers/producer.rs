//! Producer-perspective aggregation: where a country's content travels,
//! plus the genre split and the per-title export-strength matrix.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;

use crate::analyzers::AnalysisError;
use crate::analyzers::types::{
    ExportTitleMetrics, GenreBucket, GenreCount, GenreSplit, MarketCount, MarketWeeks,
    ProducerReport, TitleReach, UntrustedTitle,
};
use crate::analyzers::utility::{distinct_count_by, log_scale, row_count_by, sort_desc};
use crate::analyzers::viewer::listings;
use crate::dataset::{CategoryView, ChartRow};

const TOP_TRAVELING: usize = 10;

/// Marks a row's genre label as trusted.
const TRUSTED_MATCH: &str = "OK";

/// Computes the full producer report for `country` as a producing country.
pub fn report(view: &CategoryView<'_>, country: &str) -> Result<ProducerReport, AnalysisError> {
    let produced = produced_rows(view, country)?;

    let overseas_rows: Vec<&ChartRow> = produced
        .iter()
        .copied()
        .filter(|r| r.market != country)
        .collect();

    let overseas = if overseas_rows.is_empty() {
        None
    } else {
        Some(market_counts(&overseas_rows))
    };

    let mut total_weeks = row_count_by(produced.iter().map(|r| r.market.as_str()));
    sort_desc(&mut total_weeks);

    Ok(ProducerReport {
        country: country.to_string(),
        category: view.category,
        traveling: traveling(&produced),
        coverage: market_counts(&produced),
        overseas,
        total_weeks: total_weeks
            .into_iter()
            .map(|(market, weeks)| MarketWeeks {
                market: market.to_string(),
                total_weeks: weeks,
            })
            .collect(),
        details: listings(produced.iter().map(|r| (&r.market, &r.show_title))),
    })
}

fn produced_rows<'a>(
    view: &CategoryView<'a>,
    country: &str,
) -> Result<Vec<&'a ChartRow>, AnalysisError> {
    let produced: Vec<&ChartRow> = view
        .rows
        .iter()
        .copied()
        .filter(|r| r.origin == country)
        .collect();

    if produced.is_empty() {
        return Err(AnalysisError::ProducerNotFound {
            country: country.to_string(),
        });
    }
    Ok(produced)
}

/// Titles ranked by how many distinct markets they charted in.
fn traveling(produced: &[&ChartRow]) -> Vec<TitleReach> {
    let mut counts = distinct_count_by(
        produced
            .iter()
            .map(|r| (r.show_title.as_str(), r.market.as_str())),
    );
    sort_desc(&mut counts);
    counts.truncate(TOP_TRAVELING);
    counts
        .into_iter()
        .map(|(show_title, market_count)| TitleReach {
            show_title: show_title.to_string(),
            market_count,
        })
        .collect()
}

fn market_counts(rows: &[&ChartRow]) -> Vec<MarketCount> {
    let mut counts = distinct_count_by(
        rows.iter()
            .map(|r| (r.market.as_str(), r.show_title.as_str())),
    );
    sort_desc(&mut counts);
    counts
        .into_iter()
        .map(|(market, unique_titles)| MarketCount {
            market: market.to_string(),
            unique_titles,
        })
        .collect()
}

/// Splits the produced titles into domestic-only vs. international buckets
/// and tallies genre frequencies within each.
///
/// A title is domestic-only iff the set of markets it charted in is exactly
/// `{country}`. Each title contributes one genre observation, taken from its
/// first-occurrence row; labels without `match == "OK"` are listed
/// individually instead of being counted.
pub fn genre_split(view: &CategoryView<'_>, country: &str) -> Result<GenreSplit, AnalysisError> {
    if !view.has_genre {
        return Err(AnalysisError::MissingColumn { column: "Genre" });
    }
    if !view.has_match {
        return Err(AnalysisError::MissingColumn { column: "match" });
    }

    let produced = produced_rows(view, country)?;

    let mut order: Vec<&str> = Vec::new();
    let mut markets: HashMap<&str, HashSet<&str>> = HashMap::new();
    let mut first_row: HashMap<&str, &ChartRow> = HashMap::new();

    for &r in &produced {
        let title = r.show_title.as_str();
        match markets.entry(title) {
            Entry::Vacant(e) => {
                order.push(title);
                first_row.insert(title, r);
                e.insert(HashSet::from([r.market.as_str()]));
            }
            Entry::Occupied(e) => {
                e.into_mut().insert(r.market.as_str());
            }
        }
    }

    let mut domestic = BucketBuilder::default();
    let mut international = BucketBuilder::default();

    for title in order {
        let set = &markets[title];
        let bucket = if set.len() == 1 && set.contains(country) {
            &mut domestic
        } else {
            &mut international
        };
        bucket.push(first_row[title]);
    }

    Ok(GenreSplit {
        domestic_only: domestic.finish(),
        international: international.finish(),
    })
}

#[derive(Default)]
struct BucketBuilder {
    titles: usize,
    genre_rows: Vec<String>,
    untrusted: Vec<UntrustedTitle>,
}

impl BucketBuilder {
    fn push(&mut self, row: &ChartRow) {
        self.titles += 1;
        match (&row.genre, row.match_flag.as_deref()) {
            (Some(genre), Some(TRUSTED_MATCH)) => self.genre_rows.push(genre.clone()),
            _ => self.untrusted.push(UntrustedTitle {
                show_title: row.show_title.clone(),
                genre: row.genre.clone(),
            }),
        }
    }

    fn finish(self) -> GenreBucket {
        let mut counts = row_count_by(self.genre_rows);
        sort_desc(&mut counts);
        GenreBucket {
            titles: self.titles,
            genres: counts
                .into_iter()
                .map(|(genre, titles)| GenreCount { genre, titles })
                .collect(),
            untrusted: self.untrusted,
        }
    }
}

/// Per-title export-strength metrics over the overseas rows: breadth
/// (markets), longevity (weeks), peak rank, and a view-count scale. An
/// empty result means no export data, which is not an error.
pub fn export_matrix(view: &CategoryView<'_>, country: &str) -> Vec<ExportTitleMetrics> {
    struct Acc<'a> {
        markets: HashSet<&'a str>,
        weeks: HashSet<NaiveDate>,
        best_rank: u32,
        rows: Vec<&'a ChartRow>,
    }

    let mut order: Vec<&str> = Vec::new();
    let mut acc: HashMap<&str, Acc<'_>> = HashMap::new();

    for r in view
        .rows
        .iter()
        .copied()
        .filter(|r| r.origin == country && r.market != country)
    {
        let title = r.show_title.as_str();
        let entry = match acc.entry(title) {
            Entry::Vacant(e) => {
                order.push(title);
                e.insert(Acc {
                    markets: HashSet::new(),
                    weeks: HashSet::new(),
                    best_rank: u32::MAX,
                    rows: Vec::new(),
                })
            }
            Entry::Occupied(e) => e.into_mut(),
        };
        entry.markets.insert(r.market.as_str());
        entry.weeks.insert(r.week);
        entry.best_rank = entry.best_rank.min(r.weekly_rank);
        entry.rows.push(r);
    }

    let mut out: Vec<ExportTitleMetrics> = order
        .into_iter()
        .map(|title| {
            let a = &acc[title];
            let views = final_views(&a.rows, view.views_columns.len());
            ExportTitleMetrics {
                show_title: title.to_string(),
                markets: a.markets.len(),
                weeks: a.weeks.len(),
                best_rank: a.best_rank,
                views,
                log_views: log_scale(views),
            }
        })
        .collect();

    out.sort_by(|a, b| b.markets.cmp(&a.markets));
    out
}

/// The first strictly-positive non-missing snapshot, scanning view columns
/// most-recent-first across the title's rows; 0 when every snapshot is
/// missing or non-positive.
fn final_views(rows: &[&ChartRow], columns: usize) -> f64 {
    for col in 0..columns {
        for row in rows {
            if let Some(v) = row.views.get(col).copied().flatten() {
                if v > 0.0 {
                    return v;
                }
            }
        }
    }
    0.0
}
