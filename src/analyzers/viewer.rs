//! Viewer-perspective aggregation: which countries supply a market.

use std::collections::HashMap;

use crate::analyzers::AnalysisError;
use crate::analyzers::types::{
    DomesticExport, MarketCount, OriginCount, RankOneDominance, RankOneEntry, TitleListing,
    TitleWeeks, ViewerReport,
};
use crate::analyzers::utility::{
    distinct_count_by, distinct_values_by, join_titles, row_count_by, sort_desc,
};
use crate::dataset::{CategoryView, ChartRow};

const TOP_TITLES: usize = 10;

/// Computes the full viewer report for `country` as a consuming market.
///
/// Fails with [`AnalysisError::MarketNotFound`] when the country never
/// charted anything in this category; the caller reports that inline and
/// keeps the session going.
pub fn report(view: &CategoryView<'_>, country: &str) -> Result<ViewerReport, AnalysisError> {
    let market_rows: Vec<&ChartRow> = view
        .rows
        .iter()
        .copied()
        .filter(|r| r.market == country)
        .collect();

    if market_rows.is_empty() {
        return Err(AnalysisError::MarketNotFound {
            country: country.to_string(),
        });
    }

    let export_rows: Vec<&ChartRow> = view
        .rows
        .iter()
        .copied()
        .filter(|r| r.origin == country)
        .collect();

    Ok(ViewerReport {
        country: country.to_string(),
        category: view.category,
        source_ranking: source_ranking(&market_rows),
        rank_one: rank_one_dominance(&market_rows),
        domestic_export: domestic_export(&export_rows),
        top_titles: top_titles(&market_rows),
        details: listings(market_rows.iter().map(|r| (&r.origin, &r.show_title))),
    })
}

/// Origins ranked by distinct titles supplied to the market.
fn source_ranking(market_rows: &[&ChartRow]) -> Vec<OriginCount> {
    let mut counts = distinct_count_by(
        market_rows
            .iter()
            .map(|r| (r.origin.as_str(), r.show_title.as_str())),
    );
    sort_desc(&mut counts);
    counts
        .into_iter()
        .map(|(origin, unique_titles)| OriginCount {
            origin: origin.to_string(),
            unique_titles,
        })
        .collect()
}

/// Rank-1 occurrence counts per origin; `None` when nothing reached rank 1.
fn rank_one_dominance(market_rows: &[&ChartRow]) -> Option<RankOneDominance> {
    let rank1: Vec<&ChartRow> = market_rows
        .iter()
        .copied()
        .filter(|r| r.weekly_rank == 1)
        .collect();
    if rank1.is_empty() {
        return None;
    }

    let mut counts = row_count_by(rank1.iter().map(|r| r.origin.as_str()));
    sort_desc(&mut counts);

    let titles: HashMap<&str, String> = distinct_values_by(
        rank1
            .iter()
            .map(|r| (r.origin.as_str(), r.show_title.clone())),
    )
    .into_iter()
    .map(|(origin, list)| (origin, join_titles(&list)))
    .collect();

    let champion = counts[0].0.to_string();
    let entries = counts
        .into_iter()
        .map(|(origin, weeks_at_no1)| RankOneEntry {
            origin: origin.to_string(),
            weeks_at_no1,
            champion_titles: titles.get(origin).cloned().unwrap_or_default(),
        })
        .collect();

    Some(RankOneDominance { champion, entries })
}

/// Where the market's own productions charted; `None` when it produced
/// nothing in this category.
fn domestic_export(export_rows: &[&ChartRow]) -> Option<DomesticExport> {
    if export_rows.is_empty() {
        return None;
    }

    let mut counts = distinct_count_by(
        export_rows
            .iter()
            .map(|r| (r.market.as_str(), r.show_title.as_str())),
    );
    sort_desc(&mut counts);

    Some(DomesticExport {
        markets: counts
            .into_iter()
            .map(|(market, unique_titles)| MarketCount {
                market: market.to_string(),
                unique_titles,
            })
            .collect(),
        listings: listings(export_rows.iter().map(|r| (&r.market, &r.show_title))),
    })
}

/// Top `(title, origin)` pairs by row occurrences, read as weeks on chart.
fn top_titles(market_rows: &[&ChartRow]) -> Vec<TitleWeeks> {
    let mut counts = row_count_by(
        market_rows
            .iter()
            .map(|r| (r.show_title.as_str(), r.origin.as_str())),
    );
    sort_desc(&mut counts);
    counts.truncate(TOP_TITLES);
    counts
        .into_iter()
        .map(|((show_title, origin), weeks_on_chart)| TitleWeeks {
            show_title: show_title.to_string(),
            origin: origin.to_string(),
            weeks_on_chart,
        })
        .collect()
}

/// Distinct titles per country, joined for display.
pub(crate) fn listings<'a, I>(pairs: I) -> Vec<TitleListing>
where
    I: IntoIterator<Item = (&'a String, &'a String)>,
{
    distinct_values_by(pairs.into_iter().map(|(k, v)| (k.as_str(), v.clone())))
        .into_iter()
        .map(|(country, titles)| TitleListing {
            country: country.to_string(),
            titles: join_titles(&titles),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::test_rows::{films_view, row};

    #[test]
    fn test_japan_market_scenario() {
        // Market T = "Japan": two South Korean titles, one domestic, one
        // rank-1 week for South Korea.
        let rows = vec![
            row("A", "South Korea", "Japan", 1, "2025-10-06"),
            row("B", "South Korea", "Japan", 3, "2025-10-06"),
            row("C", "Japan", "Japan", 5, "2025-10-06"),
        ];
        let report = report(&films_view(&rows), "Japan").unwrap();

        assert_eq!(report.source_ranking.len(), 2);
        assert_eq!(report.source_ranking[0].origin, "South Korea");
        assert_eq!(report.source_ranking[0].unique_titles, 2);
        assert_eq!(report.source_ranking[1].origin, "Japan");
        assert_eq!(report.source_ranking[1].unique_titles, 1);

        let rank_one = report.rank_one.as_ref().unwrap();
        assert_eq!(rank_one.champion, "South Korea");
        assert_eq!(rank_one.entries.len(), 1);
        assert_eq!(rank_one.entries[0].weeks_at_no1, 1);
        assert_eq!(rank_one.entries[0].champion_titles, "A");

        let digest = report.digest();
        assert_eq!(digest.top_source.as_deref(), Some("South Korea"));
        assert_eq!(digest.champion_source.as_deref(), Some("South Korea"));
    }

    #[test]
    fn test_unknown_market_is_not_found() {
        let rows = vec![row("A", "South Korea", "Japan", 1, "2025-10-06")];
        let err = report(&films_view(&rows), "Norway").unwrap_err();
        assert_eq!(
            err,
            AnalysisError::MarketNotFound {
                country: "Norway".to_string()
            }
        );
    }

    #[test]
    fn test_no_rank_one_means_no_champion() {
        let rows = vec![row("A", "South Korea", "Japan", 2, "2025-10-06")];
        let report = report(&films_view(&rows), "Japan").unwrap();
        assert!(report.rank_one.is_none());
        assert!(report.digest().champion_source.is_none());
    }

    #[test]
    fn test_no_domestic_production() {
        let rows = vec![row("A", "South Korea", "Japan", 1, "2025-10-06")];
        let report = report(&films_view(&rows), "Japan").unwrap();
        assert!(report.domestic_export.is_none());
    }

    #[test]
    fn test_domestic_export_counts_distinct_titles() {
        let rows = vec![
            row("A", "South Korea", "Japan", 1, "2025-10-06"),
            row("C", "Japan", "Taiwan", 4, "2025-10-06"),
            row("C", "Japan", "Taiwan", 6, "2025-10-13"),
            row("D", "Japan", "Taiwan", 9, "2025-10-06"),
            row("C", "Japan", "Japan", 5, "2025-10-06"),
        ];
        let report = report(&films_view(&rows), "Japan").unwrap();
        let export = report.domestic_export.unwrap();

        assert_eq!(export.markets.len(), 2);
        assert_eq!(export.markets[0].market, "Taiwan");
        assert_eq!(export.markets[0].unique_titles, 2);
        assert_eq!(export.listings[0].titles, "C, D");
    }

    #[test]
    fn test_rank_one_counts_sum_to_rank_one_rows() {
        let rows = vec![
            row("A", "South Korea", "Japan", 1, "2025-10-06"),
            row("A", "South Korea", "Japan", 1, "2025-10-13"),
            row("C", "Japan", "Japan", 1, "2025-10-20"),
            row("B", "South Korea", "Japan", 2, "2025-10-20"),
        ];
        let report = report(&films_view(&rows), "Japan").unwrap();
        let rank_one = report.rank_one.unwrap();

        let total: usize = rank_one.entries.iter().map(|e| e.weeks_at_no1).sum();
        assert_eq!(total, 3);
        assert_eq!(rank_one.champion, "South Korea");
    }

    #[test]
    fn test_source_ranking_sum_bounded_by_distinct_titles() {
        // Title "A" is recorded under two producing countries, so the
        // per-origin sum exceeds neither bucket but the distinct-title total
        // stays smaller.
        let rows = vec![
            row("A", "South Korea", "Japan", 1, "2025-10-06"),
            row("A", "United States", "Japan", 2, "2025-10-06"),
            row("B", "South Korea", "Japan", 3, "2025-10-06"),
        ];
        let report = report(&films_view(&rows), "Japan").unwrap();

        let sum: usize = report.source_ranking.iter().map(|e| e.unique_titles).sum();
        let distinct_titles = 2;
        assert!(sum >= distinct_titles);
        assert_eq!(sum, 3); // one title double-counted across origins
    }

    #[test]
    fn test_top_titles_counts_weeks_and_caps_at_ten() {
        let mut rows = Vec::new();
        for week in ["2025-10-06", "2025-10-13", "2025-10-20"] {
            rows.push(row("A", "South Korea", "Japan", 1, week));
        }
        for i in 0..12 {
            rows.push(row(&format!("T{i}"), "Japan", "Japan", 5, "2025-10-06"));
        }
        let report = report(&films_view(&rows), "Japan").unwrap();

        assert_eq!(report.top_titles.len(), 10);
        assert_eq!(report.top_titles[0].show_title, "A");
        assert_eq!(report.top_titles[0].weeks_on_chart, 3);
    }

    #[test]
    fn test_idempotent() {
        let rows = vec![
            row("A", "South Korea", "Japan", 1, "2025-10-06"),
            row("B", "South Korea", "Japan", 3, "2025-10-06"),
            row("C", "Japan", "Japan", 5, "2025-10-06"),
        ];
        let view = films_view(&rows);
        let first = report(&view, "Japan").unwrap();
        let second = report(&view, "Japan").unwrap();

        assert_eq!(
            serde_json::to_value(&first).unwrap(),
            serde_json::to_value(&second).unwrap()
        );
    }
}
