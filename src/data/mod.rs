//! Data layer: ENVI loading, reshaping and statistics.
//!
//! Architecture:
//! ```text
//!  <name> + <name>.hdr
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  parse header, decode samples → ImageCube + WavelengthIndex
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  reshape  │  flatten cube → SampleTable (wavelength, value)
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  stats    │  group by wavelength → BandSummary, histograms, KDE
//!   └──────────┘
//! ```

pub mod loader;
pub mod model;
pub mod reshape;
pub mod stats;
