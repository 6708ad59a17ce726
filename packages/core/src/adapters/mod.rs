//! Adapters shipped with the dispatch core.

mod inline;
mod test_adapter;

pub use inline::InlineAdapter;
pub use test_adapter::TestAdapter;
