/// Data layer: file parsing, grid inference and slicing.
///
/// Architecture:
/// ```text
///  admittance file (.dat)
///        │
///        ▼
///   ┌──────────┐
///   │  header   │  area, epsilon, frequency list, data start line
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  numeric block → RawTable
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │   grid    │  voltage axis + temperature axis from columns 0/1
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  slice    │  C–T / C–V / C–f curve by nearest match
///   └──────────┘
/// ```

pub mod grid;
pub mod header;
pub mod loader;
pub mod model;
pub mod slice;
