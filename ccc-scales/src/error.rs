#[derive(Debug, PartialEq, thiserror::Error)]
pub enum CccScaleError {
    #[error("Empty domain")]
    EmptyDomain,

    #[error("Empty range")]
    EmptyRange,

    #[error("Fixed domain is inverted: min {min} > max {max}")]
    InvertedFixedDomain { min: f64, max: f64 },
}
