pub mod asset;
pub mod bar;

pub use asset::{AssetType, Timeframe};
pub use bar::{Bar, RawBar, RawNumber, RawTimestamp, SortedBarSeries};
