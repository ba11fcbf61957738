//! Feature assembly: observation + embedding → classifier input row.

use corrosion_core::{FeatureVector, RawObservation};

use crate::artifacts::ArtifactBundle;
use crate::error::PredictError;

/// Build the classifier row for one observation.
///
/// Column order: `[environment code, alloy code, scaled temperature,
/// concentration] ++ [PCA_1 .. PCA_15]`. Categories not seen during training
/// fail with [`PredictError::UnknownCategory`] instead of defaulting.
pub fn assemble(
    bundle: &ArtifactBundle,
    observation: &RawObservation,
    embedding: &[f32],
) -> Result<FeatureVector, PredictError> {
    let environment = bundle
        .env_encoder()
        .encode(observation.environment())
        .ok_or_else(|| PredictError::UnknownCategory {
            field: "environment",
            value: observation.environment().to_string(),
        })?;

    let alloy = bundle
        .uns_encoder()
        .encode(observation.alloy_code())
        .ok_or_else(|| PredictError::UnknownCategory {
            field: "alloy",
            value: observation.alloy_code().to_string(),
        })?;

    let temperature = bundle.temp_scaler().scale(observation.temperature());
    let concentration = observation.concentration() as f32;
    let reduced = bundle.pca().reduce(embedding)?;

    Ok(FeatureVector::from_parts(
        environment,
        alloy,
        temperature,
        concentration,
        reduced,
    ))
}
