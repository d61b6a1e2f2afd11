/// Data layer: core types, loading, filtering, aggregation and export.
///
/// Architecture:
/// ```text
///  .xlsx / .csv / .parquet / .json
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → header + raw cells
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ columns   │  resolve headers, derive Revenue → Dataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  FilterCriteria → FilteredView (row indices)
///   └──────────┘
///        │
///        ├──────────────────┐
///        ▼                  ▼
///   ┌───────────┐     ┌──────────┐
///   │ aggregate  │     │  export   │  FilteredView → CSV bytes
///   └───────────┘     └──────────┘
/// ```

pub mod aggregate;
pub mod columns;
pub mod error;
pub mod export;
pub mod filter;
pub mod loader;
pub mod model;
