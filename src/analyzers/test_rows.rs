//! Row-building helpers shared by the aggregator test modules.

use crate::dataset::{Category, CategoryView, ChartRow};
use chrono::NaiveDate;

pub fn row(title: &str, origin: &str, market: &str, rank: u32, week: &str) -> ChartRow {
    let week = NaiveDate::parse_from_str(week, "%Y-%m-%d").unwrap();
    ChartRow {
        week,
        week_str: week.format("%Y-%m-%d").to_string(),
        category: Category::Films,
        show_title: title.to_string(),
        origin: origin.to_string(),
        market: market.to_string(),
        weekly_rank: rank,
        genre: None,
        match_flag: None,
        views: Vec::new(),
    }
}

pub fn with_genre(mut row: ChartRow, genre: &str, flag: &str) -> ChartRow {
    row.genre = Some(genre.to_string());
    row.match_flag = Some(flag.to_string());
    row
}

pub fn with_views(mut row: ChartRow, views: &[Option<f64>]) -> ChartRow {
    row.views = views.to_vec();
    row
}

pub fn films_view(rows: &[ChartRow]) -> CategoryView<'_> {
    CategoryView {
        category: Category::Films,
        rows: rows.iter().collect(),
        views_columns: &[],
        has_genre: true,
        has_match: true,
    }
}

pub fn films_view_with_columns<'a>(
    rows: &'a [ChartRow],
    views_columns: &'a [String],
) -> CategoryView<'a> {
    CategoryView {
        views_columns,
        ..films_view(rows)
    }
}
