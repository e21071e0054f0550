pub mod price_metrics;
pub mod recommendation;
pub mod ticker_list;
