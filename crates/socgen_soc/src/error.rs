//! Error types for board lookup and SoC assembly.

use socgen_config::ConfigError;
use socgen_cpu::CpuError;

/// Errors raised while selecting a board or assembling a SoC.
#[derive(Debug, thiserror::Error)]
pub enum SocError {
    /// The board name is not in the registry.
    #[error("unknown board '{name}', supported are: {}", available.join(", "))]
    UnknownBoard {
        /// The requested name.
        name: String,
        /// Every supported board name.
        available: Vec<String>,
    },

    /// A SoC parameter or feature request is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// CPU selection or its netlist build failed.
    #[error(transparent)]
    Cpu(#[from] CpuError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_board_lists_alternatives() {
        let err = SocError::UnknownBoard {
            name: "zedboard".to_string(),
            available: vec!["arty".to_string(), "ulx3s".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "unknown board 'zedboard', supported are: arty, ulx3s"
        );
    }

    #[test]
    fn config_error_is_transparent() {
        let err = SocError::from(ConfigError::MissingField("soc.board".to_string()));
        assert_eq!(err.to_string(), "missing required field: soc.board");
    }
}
