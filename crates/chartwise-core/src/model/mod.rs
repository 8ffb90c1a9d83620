pub mod catalog;
pub mod chart;
pub mod features;
pub mod resolved;

pub use catalog::{CatalogAlbum, CatalogArtist, CatalogSongInfo};
pub use chart::ChartRecord;
pub use features::{FeatureVector, SongFeatures};
pub use resolved::ResolvedMatch;
