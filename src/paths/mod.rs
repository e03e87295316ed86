//! Helpers for normalising resource paths handled by bundles.
//!
//! Every path that ends up in a bundle's production or debug list goes through these helpers,
//! except paths recognised by the generator registry which are passed through verbatim.

mod normalize;

pub use normalize::{as_dir_path, as_path, join_paths, normalize_path};
