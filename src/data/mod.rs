/// Data layer: core types, loading, filtering and aggregation.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader  │  parse file → Dataset (sorted by timestamp)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter  │  season / day type / category / time range → Dataset
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate │  means, category shares, pivots, box summaries
///   └───────────┘
/// ```

pub mod aggregate;
pub mod export;
pub mod filter;
pub mod loader;
pub mod model;
