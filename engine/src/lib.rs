pub mod builder;
pub mod codec;
pub mod error;
pub mod index;
pub mod persist;
pub mod postings;
pub mod query;
pub mod rank;
pub mod search;
pub mod symbols;
pub mod text;

pub use builder::{IndexBuilder, RawDocument};
pub use error::{Result, SearchError};
pub use index::Index;
pub use persist::{IndexPaths, IndexStorage, MetaFile};
pub use postings::{PostingStore, Representation};
pub use search::{Hit, SearchHits, SearchMode, SearchOutcome, Searcher, TOP_K};
pub use symbols::{SymbolId, SymbolMode, SymbolTable};

pub type TermId = SymbolId;
pub type DocId = SymbolId;
/// 1-based token offset within a document.
pub type Position = u32;
