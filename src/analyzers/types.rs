//! Derived-table types produced by the aggregators.
//!
//! Every table is a pure projection of the filtered row set, recomputed on
//! demand and serialized as-is for the presentation layer.

use crate::dataset::Category;
use serde::Serialize;

/// Distinct-title count for a producing country.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OriginCount {
    pub origin: String,
    pub unique_titles: usize,
}

/// Distinct-title count for a charting market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarketCount {
    pub market: String,
    pub unique_titles: usize,
}

/// Raw chart-week count for a market (not deduplicated by title).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarketWeeks {
    pub market: String,
    pub total_weeks: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankOneEntry {
    pub origin: String,
    pub weeks_at_no1: usize,
    /// Distinct titles that reached rank 1, joined for display.
    pub champion_titles: String,
}

/// Who dominated the top chart position in a market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankOneDominance {
    /// Origin with the most rank-1 weeks.
    pub champion: String,
    pub entries: Vec<RankOneEntry>,
}

/// Weeks-on-chart for one `(title, origin)` pair in a market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TitleWeeks {
    pub show_title: String,
    pub origin: String,
    pub weeks_on_chart: usize,
}

/// How many markets a produced title charted in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TitleReach {
    pub show_title: String,
    pub market_count: usize,
}

/// Distinct titles for one country, joined for display. `country` is an
/// origin in viewer listings and a market in producer listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TitleListing {
    pub country: String,
    pub titles: String,
}

/// Where the analyzed market's own productions charted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomesticExport {
    pub markets: Vec<MarketCount>,
    pub listings: Vec<TitleListing>,
}

/// Everything the viewer perspective derives for one market.
#[derive(Debug, Serialize)]
pub struct ViewerReport {
    pub country: String,
    pub category: Category,
    /// Origins ranked by distinct titles supplied to this market.
    pub source_ranking: Vec<OriginCount>,
    /// `None` when no row reached rank 1.
    pub rank_one: Option<RankOneDominance>,
    /// `None` when the country produced nothing in this category.
    pub domestic_export: Option<DomesticExport>,
    /// Top 10 `(title, origin)` pairs by weeks on chart.
    pub top_titles: Vec<TitleWeeks>,
    pub details: Vec<TitleListing>,
}

impl ViewerReport {
    pub fn digest(&self) -> ViewerDigest {
        ViewerDigest {
            top_source: self.source_ranking.first().map(|e| e.origin.clone()),
            champion_source: self.rank_one.as_ref().map(|r| r.champion.clone()),
        }
    }
}

/// Compact facts handed to the narrative summary prompt.
#[derive(Debug, Serialize)]
pub struct ViewerDigest {
    pub top_source: Option<String>,
    pub champion_source: Option<String>,
}

/// Everything the producer perspective derives for one origin country.
#[derive(Debug, Serialize)]
pub struct ProducerReport {
    pub country: String,
    pub category: Category,
    /// Top 10 titles by distinct markets reached.
    pub traveling: Vec<TitleReach>,
    /// Full footprint per market, domestic included.
    pub coverage: Vec<MarketCount>,
    /// Coverage excluding the domestic market; `None` means domestic-only.
    pub overseas: Option<Vec<MarketCount>>,
    /// Cumulative chart-weeks per market, full table (renderer caps display).
    pub total_weeks: Vec<MarketWeeks>,
    pub details: Vec<TitleListing>,
}

impl ProducerReport {
    pub fn digest(&self) -> ProducerDigest {
        ProducerDigest {
            top_title: self.traveling.first().map(|e| e.show_title.clone()),
            top_market: self.coverage.first().map(|e| e.market.clone()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProducerDigest {
    pub top_title: Option<String>,
    pub top_market: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenreCount {
    pub genre: String,
    pub titles: usize,
}

/// A title whose genre label is not trusted (`match != "OK"`), listed
/// individually instead of being counted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UntrustedTitle {
    pub show_title: String,
    pub genre: Option<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct GenreBucket {
    /// Distinct titles in this bucket.
    pub titles: usize,
    /// Genre frequencies over trusted labels, descending.
    pub genres: Vec<GenreCount>,
    pub untrusted: Vec<UntrustedTitle>,
}

/// Genre breakdown split into domestic-only vs. international titles.
/// The two buckets strictly partition the distinct produced titles.
#[derive(Debug, Serialize)]
pub struct GenreSplit {
    pub domestic_only: GenreBucket,
    pub international: GenreBucket,
}

/// Per-title export-strength metrics: breadth, longevity, peak rank, scale.
#[derive(Debug, Clone, Serialize)]
pub struct ExportTitleMetrics {
    pub show_title: String,
    /// Distinct overseas markets charted in.
    pub markets: usize,
    /// Distinct overseas chart weeks.
    pub weeks: usize,
    /// Best (minimum) weekly rank achieved overseas.
    pub best_rank: u32,
    /// Most recent positive view-count snapshot, 0 when none exists.
    pub views: f64,
    /// `log10(views + 1)`, the bounded chart-size metric.
    pub log_views: f64,
}
