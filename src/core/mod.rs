pub mod budget;
pub mod client;
pub mod execute;
pub mod reporter;
pub mod stats_aggregator;
pub mod worker;
