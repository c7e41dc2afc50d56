//! Domain error types.
//!
//! Workbook, axis-table and configuration errors halt a run. Everything else
//! is an entity-level error that the batch turns into a skip.

/// Top-level error type for perfchart.
#[derive(Debug, thiserror::Error)]
pub enum PerfchartError {
    #[error("cannot open workbook {path}: {reason}")]
    Workbook { path: String, reason: String },

    #[error("no axis configuration sheet in {workbook} (required columns: {})", required.join(", "))]
    AxisConfigNotFound {
        workbook: String,
        required: Vec<String>,
    },

    #[error("failed to read sheet '{sheet}': {reason}")]
    SheetRead { sheet: String, reason: String },

    #[error("no matching sheet for '{entity}'")]
    NoMatchingSheet { entity: String },

    #[error("sheet '{sheet}' is missing columns: {}", missing.join(", "))]
    MissingColumns { sheet: String, missing: Vec<String> },

    #[error("sheet '{sheet}' has no valid rows")]
    NoValidRows { sheet: String },

    #[error("render failed for '{entity}': {reason}")]
    Render { entity: String, reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PerfchartError {
    /// Errors after which no chart can be produced at all.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PerfchartError::Workbook { .. }
                | PerfchartError::AxisConfigNotFound { .. }
                | PerfchartError::ConfigParse { .. }
                | PerfchartError::ConfigInvalid { .. }
        )
    }
}

impl From<&PerfchartError> for std::process::ExitCode {
    fn from(err: &PerfchartError) -> Self {
        let code: u8 = match err {
            PerfchartError::Io(_) => 1,
            PerfchartError::ConfigParse { .. } | PerfchartError::ConfigInvalid { .. } => 2,
            PerfchartError::Workbook { .. }
            | PerfchartError::AxisConfigNotFound { .. }
            | PerfchartError::SheetRead { .. } => 3,
            PerfchartError::NoMatchingSheet { .. }
            | PerfchartError::MissingColumns { .. }
            | PerfchartError::NoValidRows { .. } => 4,
            PerfchartError::Render { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_columns_message_lists_every_column() {
        let err = PerfchartError::MissingColumns {
            sheet: "平衡组合".into(),
            missing: vec!["总资产".into(), "总份额".into()],
        };
        assert_eq!(
            err.to_string(),
            "sheet '平衡组合' is missing columns: 总资产, 总份额"
        );
    }

    #[test]
    fn axis_config_not_found_lists_required_keys() {
        let err = PerfchartError::AxisConfigNotFound {
            workbook: "data.xlsx".into(),
            required: vec!["entity_name".into(), "left_min".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("data.xlsx"));
        assert!(msg.contains("entity_name, left_min"));
    }

    #[test]
    fn fatal_classification() {
        assert!(
            PerfchartError::Workbook {
                path: "x".into(),
                reason: "y".into()
            }
            .is_fatal()
        );
        assert!(
            !PerfchartError::NoMatchingSheet {
                entity: "A".into()
            }
            .is_fatal()
        );
        assert!(!PerfchartError::NoValidRows { sheet: "A".into() }.is_fatal());
    }
}
