//! Scale implementations and continuous-domain option layering for the
//! chart axis layer.

pub mod array;
pub mod band;
pub mod domain;
pub mod error;
pub mod linear;
pub mod normalized;
pub mod ordinal;

pub use band::{BandScale, BandScaleConfig};
pub use domain::ContinuousDomainOptions;
pub use error::CccScaleError;
pub use linear::{LinearScale, LinearScaleConfig};
pub use normalized::NormalizedScale;
pub use ordinal::OrdinalScale;
