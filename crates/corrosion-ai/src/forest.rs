//! Random-forest classifier evaluated from exported tree arrays.
//!
//! Each tree uses the flat array layout of a fitted decision tree: node `i`
//! is a leaf when `children_left[i] == -1`; otherwise samples with
//! `x[feature[i]] <= threshold[i]` go left. Leaf `value` rows hold class
//! counts (or fractions) and are normalised before averaging, so the
//! forest prediction is the argmax of the mean leaf distribution.

use corrosion_core::{FEATURE_WIDTH, FeatureVector};
use serde::Deserialize;

use crate::artifacts::Classifier;
use crate::error::PredictError;

const LEAF: i64 = -1;

#[derive(Debug, Clone, Deserialize)]
pub struct ForestClassifier {
    n_features: usize,
    /// Class label for each output column, in `value` order.
    classes: Vec<i64>,
    trees: Vec<DecisionTree>,
}

#[derive(Debug, Clone, Deserialize)]
struct DecisionTree {
    children_left: Vec<i64>,
    children_right: Vec<i64>,
    feature: Vec<i64>,
    threshold: Vec<f64>,
    value: Vec<Vec<f64>>,
}

impl ForestClassifier {
    pub fn validate(&self) -> Result<(), String> {
        if self.n_features != FEATURE_WIDTH {
            return Err(format!(
                "forest expects {} features, pipeline produces {FEATURE_WIDTH}",
                self.n_features
            ));
        }
        if self.classes.is_empty() {
            return Err("forest has no classes".into());
        }
        if self.trees.is_empty() {
            return Err("forest has no trees".into());
        }
        for (t, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features, self.classes.len())
                .map_err(|e| format!("tree {t}: {e}"))?;
        }
        Ok(())
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Mean class distribution over all trees.
    pub fn predict_proba(&self, features: &[f32]) -> Vec<f64> {
        let mut proba = vec![0.0f64; self.classes.len()];
        for tree in &self.trees {
            let leaf = &tree.value[tree.leaf_for(features)];
            let total: f64 = leaf.iter().sum();
            if total > 0.0 {
                for (p, &v) in proba.iter_mut().zip(leaf) {
                    *p += v / total;
                }
            }
        }
        let n = self.trees.len() as f64;
        for p in &mut proba {
            *p /= n;
        }
        proba
    }
}

impl Classifier for ForestClassifier {
    fn classify(&self, features: &FeatureVector) -> Result<i64, PredictError> {
        let proba = self.predict_proba(features.as_slice());
        // First maximum wins ties.
        let best = proba
            .iter()
            .enumerate()
            .fold(None::<(usize, f64)>, |best, (i, &p)| match best {
                Some((_, bp)) if bp >= p => best,
                _ => Some((i, p)),
            })
            .map(|(i, _)| i)
            .ok_or_else(|| PredictError::Inference("forest produced no classes".into()))?;
        Ok(self.classes[best])
    }
}

impl DecisionTree {
    fn node_count(&self) -> usize {
        self.children_left.len()
    }

    fn validate(&self, n_features: usize, n_classes: usize) -> Result<(), String> {
        let n = self.node_count();
        if n == 0 {
            return Err("empty tree".into());
        }
        if self.children_right.len() != n
            || self.feature.len() != n
            || self.threshold.len() != n
            || self.value.len() != n
        {
            return Err("node arrays differ in length".into());
        }
        for i in 0..n {
            if self.value[i].len() != n_classes {
                return Err(format!("node {i} has {} class values", self.value[i].len()));
            }
            let (left, right) = (self.children_left[i], self.children_right[i]);
            if left == LEAF {
                continue;
            }
            let in_range = |c: i64| c > i as i64 && (c as usize) < n;
            if !in_range(left) || !in_range(right) {
                return Err(format!("node {i} has out-of-range children"));
            }
            let f = self.feature[i];
            if f < 0 || f as usize >= n_features {
                return Err(format!("node {i} splits on feature {f}"));
            }
        }
        Ok(())
    }

    /// Walk from the root to a leaf. Children always have higher indices
    /// than their parent (checked in `validate`), so the walk terminates.
    fn leaf_for(&self, features: &[f32]) -> usize {
        let mut node = 0usize;
        while self.children_left[node] != LEAF {
            let x = f64::from(features[self.feature[node] as usize]);
            node = if x <= self.threshold[node] {
                self.children_left[node] as usize
            } else {
                self.children_right[node] as usize
            };
        }
        node
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corrosion_core::REDUCED_DIMS;

    fn stump(feature: i64, threshold: f64, left: [f64; 2], right: [f64; 2]) -> serde_json::Value {
        serde_json::json!({
            "children_left": [1, -1, -1],
            "children_right": [2, -1, -1],
            "feature": [feature, -2, -2],
            "threshold": [threshold, -2.0, -2.0],
            "value": [[1.0, 1.0], left, right],
        })
    }

    fn forest(trees: Vec<serde_json::Value>) -> ForestClassifier {
        serde_json::from_value(serde_json::json!({
            "n_features": 19,
            "classes": [0, 3],
            "trees": trees,
        }))
        .unwrap()
    }

    fn features_with_temp(temp: f32) -> FeatureVector {
        FeatureVector::from_parts(0.0, 0.0, temp, 10.0, [0.0; REDUCED_DIMS])
    }

    #[test]
    fn single_stump_routes_on_threshold() {
        let f = forest(vec![stump(2, 0.5, [4.0, 0.0], [0.0, 2.0])]);
        f.validate().unwrap();
        assert_eq!(f.classify(&features_with_temp(0.5)).unwrap(), 0);
        assert_eq!(f.classify(&features_with_temp(0.6)).unwrap(), 3);
    }

    #[test]
    fn votes_are_normalised_per_tree() {
        // Tree 1 is very confident by count but only carries one vote.
        let f = forest(vec![
            stump(2, 0.0, [100.0, 0.0], [100.0, 0.0]),
            stump(2, 0.0, [0.0, 3.0], [0.0, 3.0]),
            stump(2, 0.0, [1.0, 2.0], [1.0, 2.0]),
        ]);
        f.validate().unwrap();
        let proba = f.predict_proba(features_with_temp(1.0).as_slice());
        assert!((proba[0] - 4.0 / 9.0).abs() < 1e-9);
        assert_eq!(f.classify(&features_with_temp(1.0)).unwrap(), 3);
    }

    #[test]
    fn ties_pick_first_class() {
        let f = forest(vec![stump(2, 0.0, [1.0, 1.0], [1.0, 1.0])]);
        assert_eq!(f.classify(&features_with_temp(0.0)).unwrap(), 0);
    }

    #[test]
    fn rejects_wrong_feature_count() {
        let mut f = forest(vec![stump(2, 0.0, [1.0, 0.0], [0.0, 1.0])]);
        f.n_features = 18;
        assert!(f.validate().unwrap_err().contains("18 features"));
    }

    #[test]
    fn rejects_backward_children() {
        let f = forest(vec![serde_json::json!({
            "children_left": [1, 0],
            "children_right": [1, 0],
            "feature": [2, 2],
            "threshold": [0.0, 0.0],
            "value": [[1.0, 0.0], [1.0, 0.0]],
        })]);
        let err = f.validate().unwrap_err();
        assert!(err.contains("out-of-range"), "got {err}");
    }

    #[test]
    fn rejects_split_on_unknown_feature() {
        let f = forest(vec![stump(19, 0.0, [1.0, 0.0], [0.0, 1.0])]);
        assert!(f.validate().unwrap_err().contains("feature 19"));
    }
}
