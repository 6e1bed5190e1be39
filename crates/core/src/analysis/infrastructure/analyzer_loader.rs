use std::path::PathBuf;

use thiserror::Error;

use crate::analysis::domain::face_analyzer::FaceAnalyzer;

use super::replay_face_analyzer::ReplayFaceAnalyzer;

/// Where an analyzer runs its inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionTarget {
    Accelerated,
    Cpu,
}

impl std::fmt::Display for ExecutionTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionTarget::Accelerated => write!(f, "accelerated"),
            ExecutionTarget::Cpu => write!(f, "cpu"),
        }
    }
}

/// Builds an analyzer for a given execution target.
pub trait AnalyzerFactory {
    fn name(&self) -> &str;

    fn create(
        &self,
        target: ExecutionTarget,
    ) -> Result<Box<dyn FaceAnalyzer>, Box<dyn std::error::Error>>;
}

#[derive(Error, Debug)]
#[error("face analyzer unavailable ({})", .attempts.join("; "))]
pub struct ModelUnavailable {
    /// One `"<target>: <reason>"` entry per failed attempt.
    pub attempts: Vec<String>,
}

/// A successfully loaded analyzer and the target it ended up on.
pub struct LoadedAnalyzer {
    pub analyzer: Box<dyn FaceAnalyzer>,
    pub target: ExecutionTarget,
}

/// Preferred targets in fallback order.
pub fn preferred_targets(cpu_only: bool) -> Vec<ExecutionTarget> {
    if cpu_only {
        vec![ExecutionTarget::Cpu]
    } else {
        vec![ExecutionTarget::Accelerated, ExecutionTarget::Cpu]
    }
}

/// Tries each target in order, falling back on failure.
///
/// A failure that still leaves a target to try is only a warning; the error
/// is returned only once every target has failed.
pub fn load(
    factory: &dyn AnalyzerFactory,
    targets: &[ExecutionTarget],
) -> Result<LoadedAnalyzer, ModelUnavailable> {
    let mut attempts = Vec::new();
    for (i, &target) in targets.iter().enumerate() {
        match factory.create(target) {
            Ok(analyzer) => {
                log::info!("Loaded {} analyzer ({target})", factory.name());
                return Ok(LoadedAnalyzer { analyzer, target });
            }
            Err(e) => {
                if i + 1 < targets.len() {
                    log::warn!("{} analyzer unavailable on {target} ({e}), falling back", factory.name());
                }
                attempts.push(format!("{target}: {e}"));
            }
        }
    }
    Err(ModelUnavailable { attempts })
}

/// Factory for [`ReplayFaceAnalyzer`]. Replay involves no inference, so
/// only the CPU target exists.
pub struct ReplayAnalyzerFactory {
    path: PathBuf,
}

impl ReplayAnalyzerFactory {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl AnalyzerFactory for ReplayAnalyzerFactory {
    fn name(&self) -> &str {
        "replay"
    }

    fn create(
        &self,
        target: ExecutionTarget,
    ) -> Result<Box<dyn FaceAnalyzer>, Box<dyn std::error::Error>> {
        match target {
            ExecutionTarget::Accelerated => Err("no hardware acceleration for replay".into()),
            ExecutionTarget::Cpu => Ok(Box::new(ReplayFaceAnalyzer::from_file(&self.path)?)),
        }
    }
}
