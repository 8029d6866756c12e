use std::fmt;

use serde::Serialize;

use crate::errors::CastError;

/// Un récepteur de lecture découvert sur le réseau local.
///
/// Éphémère : un `Candidate` n'existe que le temps d'une fenêtre de
/// découverte, il n'est jamais persisté.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub host: String,
    pub port: u16,
    pub name: String,
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}:{})", self.name, self.host, self.port)
    }
}

/// Flux jouable produit par la résolution de source.
///
/// Produced once, immutable afterwards, consumed exactly once by dispatch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MediaSource {
    pub title: String,
    pub url: String,
}

/// Les trois étapes de la pipeline, dans l'ordre d'exécution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineStage {
    Source,
    Device,
    Dispatch,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Source => "source",
            PipelineStage::Device => "device",
            PipelineStage::Dispatch => "dispatch",
        };
        f.write_str(name)
    }
}

/// Résultat terminal d'une exécution de pipeline.
///
/// Exactly one is produced per run; there is no partial-success notion.
#[derive(Debug)]
pub enum PipelineResult {
    Success,
    Failure {
        stage: PipelineStage,
        error: CastError,
    },
}

impl PipelineResult {
    pub fn is_success(&self) -> bool {
        matches!(self, PipelineResult::Success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_display() {
        let candidate = Candidate {
            host: "10.0.0.5".to_string(),
            port: 7000,
            name: "TV".to_string(),
        };
        assert_eq!(candidate.to_string(), "TV (10.0.0.5:7000)");
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(PipelineStage::Source.to_string(), "source");
        assert_eq!(PipelineStage::Device.to_string(), "device");
        assert_eq!(PipelineStage::Dispatch.to_string(), "dispatch");
    }
}
