//! Shared fixtures: small on-disk artifacts and a counting embedding backend.
//!
//! Fixture vocabulary:
//! - environments: `acetic acid` (0), `seawater` (1), `sulfuric acid` (2)
//! - alloys: `G10200` (0), `N06625` (1), `S31600` (2)
//! - temperature: standard-scaled with mean 50, scale 25
//! - two trees over classes 0..=3; seawater at 25 °C and 50 % lands on class 1

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use corrosion_core::{ArtifactPaths, REDUCED_DIMS};

use crate::embedding::{EmbeddingBackend, EmbeddingProvider};
use crate::error::PredictError;

pub const EMBED_DIM: usize = 8;

/// Deterministic byte-folding "model" that counts forward passes.
pub struct StubBackend {
    calls: Arc<AtomicUsize>,
}

impl EmbeddingBackend for StubBackend {
    fn embed(&mut self, text: &str) -> Result<Vec<f32>, PredictError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut v = vec![0.0f32; EMBED_DIM];
        for (i, b) in text.bytes().enumerate() {
            v[i % EMBED_DIM] += b as f32 / 1000.0;
        }
        Ok(v)
    }
}

/// Provider over [`StubBackend`], returning `(provider, forward_passes, loads)`.
pub fn stub_provider(capacity: usize) -> (EmbeddingProvider, Arc<AtomicUsize>, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let loads = Arc::new(AtomicUsize::new(0));
    let (c, l) = (Arc::clone(&calls), Arc::clone(&loads));
    let provider = EmbeddingProvider::new(capacity, move || {
        l.fetch_add(1, Ordering::SeqCst);
        Ok(StubBackend {
            calls: Arc::clone(&c),
        })
    });
    (provider, calls, loads)
}

/// Write all five JSON artifacts under `dir` using the default layout.
pub fn write_artifacts(dir: &Path) -> ArtifactPaths {
    let mut paths = ArtifactPaths::default();
    paths.model = "models/classifiers/rf_all_data.json".into();
    for p in [
        &mut paths.env_encoder,
        &mut paths.uns_encoder,
        &mut paths.temp_scaler,
        &mut paths.pca,
        &mut paths.model,
    ] {
        *p = dir.join(&*p);
    }

    write(
        &paths.env_encoder,
        serde_json::json!({
            "kind": "label",
            "classes": ["acetic acid", "seawater", "sulfuric acid"],
        }),
    );
    write(
        &paths.uns_encoder,
        serde_json::json!({
            "kind": "label",
            "classes": ["G10200", "N06625", "S31600"],
        }),
    );
    write(
        &paths.temp_scaler,
        serde_json::json!({"kind": "standard", "mean": [50.0], "scale": [25.0]}),
    );

    let components: Vec<Vec<f64>> = (0..REDUCED_DIMS)
        .map(|k| {
            let mut row = vec![0.0; EMBED_DIM];
            row[k % EMBED_DIM] = 1.0;
            row[(k + 3) % EMBED_DIM] = -0.5;
            row
        })
        .collect();
    write(
        &paths.pca,
        serde_json::json!({"mean": vec![0.1; EMBED_DIM], "components": components}),
    );

    // Tree 1: temperature (col 2) then concentration (col 3).
    // Tree 2: environment code (col 0).
    write(
        &paths.model,
        serde_json::json!({
            "n_features": 19,
            "classes": [0, 1, 2, 3],
            "trees": [
                {
                    "children_left": [1, 3, -1, -1, -1],
                    "children_right": [2, 4, -1, -1, -1],
                    "feature": [2, 3, -2, -2, -2],
                    "threshold": [0.0, 30.0, -2.0, -2.0, -2.0],
                    "value": [
                        [1.0, 1.0, 1.0, 1.0],
                        [1.0, 1.0, 0.0, 0.0],
                        [0.0, 0.0, 0.0, 1.0],
                        [1.0, 0.0, 0.0, 0.0],
                        [0.0, 1.0, 0.0, 0.0]
                    ]
                },
                {
                    "children_left": [1, -1, -1],
                    "children_right": [2, -1, -1],
                    "feature": [0, -2, -2],
                    "threshold": [1.5, -2.0, -2.0],
                    "value": [
                        [1.0, 1.0, 1.0, 1.0],
                        [0.0, 3.0, 1.0, 0.0],
                        [0.0, 0.0, 1.0, 3.0]
                    ]
                }
            ]
        }),
    );

    paths
}

fn write(path: &Path, value: serde_json::Value) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, value.to_string()).unwrap();
}
