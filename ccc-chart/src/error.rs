use ccc_data::CccDataError;
use ccc_scales::CccScaleError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CccChartError {
    #[error("Required visual role `{0}` is unbound")]
    RoleUnbound(String),

    #[error("Visual role `{role}`: {reason}")]
    RoleConstraint { role: String, reason: String },

    #[error("Invalid option `{option}`: {reason}")]
    InvalidOption { option: String, reason: String },

    #[error("No data after filtering")]
    NoData,

    #[error("Chart build re-entered while a build is in progress")]
    ReentrantBuild,

    #[error("{stage} stage failed: {source}")]
    Stage {
        stage: &'static str,
        #[source]
        source: Box<CccChartError>,
    },

    #[error("Data error: {0}")]
    Data(#[from] CccDataError),

    #[error("Scale error: {0}")]
    Scale(#[from] CccScaleError),
}

impl CccChartError {
    /// Wraps the error with the pipeline stage that raised it. Already
    /// staged errors keep their original stage.
    pub fn in_stage(self, stage: &'static str) -> Self {
        match self {
            staged @ CccChartError::Stage { .. } => staged,
            other => CccChartError::Stage {
                stage,
                source: Box::new(other),
            },
        }
    }

    /// The empty-data condition; the application layer renders an
    /// empty-state message for this, never for configuration errors.
    pub fn is_no_data(&self) -> bool {
        match self {
            CccChartError::NoData => true,
            CccChartError::Stage { source, .. } => source.is_no_data(),
            _ => false,
        }
    }

    /// Whether the error comes from the chart specification rather
    /// than from the data.
    pub fn is_configuration(&self) -> bool {
        match self {
            CccChartError::RoleUnbound(_)
            | CccChartError::RoleConstraint { .. }
            | CccChartError::InvalidOption { .. }
            | CccChartError::Data(_)
            | CccChartError::Scale(_) => true,
            CccChartError::Stage { source, .. } => source.is_configuration(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_wrapping_preserves_classification() {
        let err = CccChartError::NoData.in_stage("grouping");
        assert!(err.is_no_data());
        assert!(!err.is_configuration());
        assert!(err.to_string().contains("grouping"));

        let err = CccChartError::RoleUnbound("value".to_string()).in_stage("roles");
        assert!(err.is_configuration());
        assert!(!err.is_no_data());
    }

    #[test]
    fn test_double_staging_keeps_first_stage() {
        let err = CccChartError::NoData
            .in_stage("grouping")
            .in_stage("layout");
        assert!(err.to_string().contains("grouping"));
    }
}
