/// Data layer: the cs file codec, column model and row filtering.
///
/// Architecture:
/// ```text
///  .cs file (structured .npy)
///        │
///        ▼
///   ┌──────────────────┐
///   │ loader / header   │  magic, version, dict literal → descr + shape
///   └──────────────────┘
///        │
///        ▼
///   ┌──────────────────┐
///   │ StructuredArray   │  Schema (fields, offsets, by-name index) + row bytes
///   └──────────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  range predicate on one column → new array → loader::save_file
///   └──────────┘
/// ```

pub mod dtype;
pub mod filter;
pub mod header;
pub mod loader;
pub mod model;
