/// Data layer: core types, loading, normalization, and filtering.
///
/// Architecture:
/// ```text
///  share link          .csv / .json
///      │                    │
///      ▼                    │
///   ┌────────┐              │
///   │ ingest  │  download    │
///   └────────┘              │
///      │                    ▼
///      │              ┌──────────┐
///      └────────────► │  loader   │  text → RawTable
///                     └──────────┘
///                           │
///                           ▼
///                     ┌───────────┐
///                     │ normalize  │  [lon, lat] → AccidentDataset
///                     └───────────┘
///                           │
///                           ▼
///                     ┌──────────┐
///                     │  filter   │  category selections → visible indices
///                     └──────────┘
///                           │
///                           ▼
///                     ┌──────────┐
///                     │   view    │  marker cap, grid cells
///                     └──────────┘
/// ```

pub mod filter;
pub mod ingest;
pub mod loader;
pub mod model;
pub mod normalize;
pub mod view;
