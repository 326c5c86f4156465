use std::path::Path;

use anyhow::{Context, Result};
#[cfg(any(feature = "openvino", feature = "cuda"))]
use ort::ep::{self, ExecutionProvider};
use ort::session::{
    builder::{GraphOptimizationLevel, SessionBuilder},
    Session,
};

/// File name of the YuNet release this crate decodes.
pub const DEFAULT_DETECTOR_MODEL: &str = "face_detection_yunet_2023mar.onnx";

pub fn session_builder() -> Result<SessionBuilder> {
    #[allow(unused_mut)]
    let mut builder =
        Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(ort::Error::<()>::from)?;

    #[cfg(feature = "openvino")]
    try_register(&mut builder, ep::OpenVINO::default(), "openvino")?;
    #[cfg(feature = "cuda")]
    try_register(&mut builder, ep::CUDA::default(), "cuda")?;

    Ok(builder)
}

/// Register `provider` when the linked runtime has it, otherwise fall back to CPU.
#[cfg(any(feature = "openvino", feature = "cuda"))]
fn try_register<E: ExecutionProvider>(
    builder: &mut SessionBuilder,
    provider: E,
    name: &str,
) -> Result<()> {
    if provider.is_available()? {
        provider.register(builder)?;
        log::debug!("registered {} execution provider", name);
    } else {
        log::warn!("{name} feature is enabled, onnx runtime not compiled with {name}");
    }
    Ok(())
}

pub fn detector_session(model_path: &Path) -> Result<Session> {
    if !model_path.exists() {
        anyhow::bail!("detector model not found at {}", model_path.display());
    }
    session_builder()?
        .commit_from_file(model_path)
        .with_context(|| format!("load detector model {}", model_path.display()))
}
