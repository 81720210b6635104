pub mod measure;
pub mod player;

pub use measure::Measure;
pub use player::{derive, EnrichedPlayerRecord, RawPlayerRecord};
