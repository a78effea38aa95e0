//! Lenient selectors for models and regions
//!
//! Unlike dimension ids, which fail hard on any bad token, model and region
//! names are matched leniently: unknown tokens are dropped.

mod models;
mod regions;

pub use models::ModelSelector;
pub use regions::RegionSelector;

/// Split on `delimiter`, trimming tokens and dropping blank ones
fn lenient_tokens<'a>(input: &'a str, delimiter: &'a str) -> impl Iterator<Item = &'a str> + 'a {
    input
        .split(delimiter)
        .map(str::trim)
        .filter(|t| !t.is_empty())
}
