use thiserror::Error;

/// Why a layer spec could not produce a topology.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TopologyError {
    #[error("layer spec {spec:?} has {found} usable layer sizes, at least 2 are required")]
    TooFewLayers { spec: String, found: usize },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown visualization mode {0:?}, expected \"propagation\" or \"random\"")]
pub struct ModeParseError(pub String);
