//! End-to-end scenarios across catalog, builder, store, ranker and recommender.

mod fixtures;
mod pipeline;
mod ranking;
mod store_integrity;
