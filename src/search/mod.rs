pub mod bm25;
pub mod hybrid;
pub mod index;
pub mod query;
pub mod vector;

pub use index::{build_index_set, IndexSet, VectorModality};
pub use query::Modality;
