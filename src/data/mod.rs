/// Data layer: core types, loading, filtering, summaries and export.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐     ┌────────────┐
///   │  loader   │◄────│   cache    │  path → Arc<MealTable>
///   └──────────┘     └────────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ MealTable  │  columns + rows of CellValue
///   └───────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  FilterSpec → FilteredTable (row indices)
///   └──────────┘
///        │
///        ├──────────────┐
///        ▼              ▼
///   ┌───────────┐  ┌──────────┐
///   │ aggregate  │  │  export   │
///   └───────────┘  └──────────┘
/// ```

pub mod aggregate;
pub mod artifacts;
pub mod cache;
pub mod export;
pub mod filter;
pub mod loader;
pub mod model;
