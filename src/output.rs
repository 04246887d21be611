//! Text-table and JSON rendering of report bundles.

use anyhow::Result;
use serde::Serialize;

use crate::analyzers::types::{
    ExportTitleMetrics, GenreBucket, GenreSplit, ProducerReport, ViewerReport,
};

/// Markets shown in the total-weeks chart view; the full table is still
/// carried in the report and in JSON output.
pub const TOP_MARKETS: usize = 20;

/// Prints any serializable value as pretty JSON to stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Prints an inline notice for a reported (non-fatal) condition.
pub fn notice(message: &str) {
    println!("note: {message}");
}

fn section(title: &str) {
    println!("\n== {title} ==");
}

fn count_table<'a, I>(key_header: &str, value_header: &str, rows: I)
where
    I: Iterator<Item = (&'a str, usize)> + Clone,
{
    let width = rows
        .clone()
        .map(|(k, _)| k.len())
        .chain(std::iter::once(key_header.len()))
        .max()
        .unwrap_or(0);
    println!("{key_header:<width$}  {value_header}");
    for (key, value) in rows {
        println!("{key:<width$}  {value}");
    }
}

pub fn print_viewer(report: &ViewerReport) {
    println!(
        "Market analysis: {} ({})",
        report.country, report.category
    );

    section("Source ranking (unique titles)");
    count_table(
        "Origin",
        "Unique titles",
        report
            .source_ranking
            .iter()
            .map(|e| (e.origin.as_str(), e.unique_titles)),
    );

    section("Rank-1 dominance");
    match &report.rank_one {
        None => notice("no rank-1 data"),
        Some(dominance) => {
            println!("Champion source: {}", dominance.champion);
            count_table(
                "Origin",
                "Weeks at #1",
                dominance
                    .entries
                    .iter()
                    .map(|e| (e.origin.as_str(), e.weeks_at_no1)),
            );
            for entry in &dominance.entries {
                println!("{}: {}", entry.origin, entry.champion_titles);
            }
        }
    }

    section("Domestic export");
    match &report.domestic_export {
        None => notice(&format!(
            "{} has no {} production in this dataset",
            report.country, report.category
        )),
        Some(export) => {
            count_table(
                "Market",
                "Titles",
                export
                    .markets
                    .iter()
                    .map(|e| (e.market.as_str(), e.unique_titles)),
            );
            for listing in &export.listings {
                println!("{}: {}", listing.country, listing.titles);
            }
        }
    }

    section("Top-charting titles");
    for entry in &report.top_titles {
        println!(
            "{} ({})  {} week(s)",
            entry.show_title, entry.origin, entry.weeks_on_chart
        );
    }

    section("Details");
    for listing in &report.details {
        println!("{}: {}", listing.country, listing.titles);
    }
}

pub fn print_producer(report: &ProducerReport) {
    println!(
        "Export analysis: {} ({})",
        report.country, report.category
    );

    section("Most-traveled titles");
    count_table(
        "Title",
        "Markets",
        report
            .traveling
            .iter()
            .map(|e| (e.show_title.as_str(), e.market_count)),
    );

    section("Coverage (all markets)");
    count_table(
        "Market",
        "Unique titles",
        report
            .coverage
            .iter()
            .map(|e| (e.market.as_str(), e.unique_titles)),
    );

    section("Overseas performance");
    match &report.overseas {
        None => notice("domestic-only: no overseas chart appearances"),
        Some(markets) => count_table(
            "Market",
            "Exported titles",
            markets.iter().map(|e| (e.market.as_str(), e.unique_titles)),
        ),
    }

    section("Total chart-weeks per market");
    count_table(
        "Market",
        "Total weeks",
        report
            .total_weeks
            .iter()
            .take(TOP_MARKETS)
            .map(|e| (e.market.as_str(), e.total_weeks)),
    );
    if report.total_weeks.len() > TOP_MARKETS {
        println!(
            "(showing top {TOP_MARKETS} of {} markets)",
            report.total_weeks.len()
        );
    }

    section("Details");
    for listing in &report.details {
        println!("{}: {}", listing.country, listing.titles);
    }
}

pub fn print_genre_split(split: &GenreSplit) {
    section("Genre split");
    print_genre_bucket("Domestic-only titles", &split.domestic_only);
    print_genre_bucket("International titles", &split.international);
}

fn print_genre_bucket(label: &str, bucket: &GenreBucket) {
    println!("{label}: {}", bucket.titles);
    count_table(
        "Genre",
        "Titles",
        bucket.genres.iter().map(|e| (e.genre.as_str(), e.titles)),
    );
    for title in &bucket.untrusted {
        println!(
            "unverified genre: {} ({})",
            title.show_title,
            title.genre.as_deref().unwrap_or("unknown")
        );
    }
}

pub fn print_export_matrix(matrix: &[ExportTitleMetrics]) {
    section("Export-strength matrix");
    if matrix.is_empty() {
        notice("no export data");
        return;
    }

    let width = matrix
        .iter()
        .map(|e| e.show_title.len())
        .chain(std::iter::once("Title".len()))
        .max()
        .unwrap_or(0);
    println!("{:<width$}  Markets  Weeks  Best rank  Views  log10(views+1)", "Title");
    for entry in matrix {
        println!(
            "{:<width$}  {:>7}  {:>5}  {:>9}  {:>5.0}  {:>14.2}",
            entry.show_title, entry.markets, entry.weeks, entry.best_rank, entry.views,
            entry.log_views
        );
    }
}
