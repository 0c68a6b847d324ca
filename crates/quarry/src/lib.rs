//! Quarry: typed, composable queries over pluggable row storage.
//!
//! This crate is the public face of the engine; everything lives in
//! `quarry-core` and is re-exported here unchanged.

pub use quarry_core::{
    Error, error, exec, expr, model, predicate, project, query, row, store, value,
};

pub mod prelude {
    pub use quarry_core::prelude::*;
}
