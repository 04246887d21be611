pub mod analyzers;
pub mod dataset;
pub mod output;
pub mod summarize;
