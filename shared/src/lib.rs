use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumCount, EnumIter, EnumString};

/// Craft categories the classifier can output, in label-set order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    AsRefStr,
    EnumIter,
    EnumCount,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CraftClass {
    Pottery,
    Sculpture,
    Textile,
    Woodwork,
    Metalwork,
    Jewelry,
    Painting,
    Embroidery,
}

impl CraftClass {
    /// Every class in label-set order.
    pub fn all() -> Vec<CraftClass> {
        use strum::IntoEnumIterator;
        Self::iter().collect()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ClassPrediction {
    pub class: CraftClass,
    pub confidence: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ImageSummary {
    pub filename: String,
    /// Original decoded size formatted as `WxH`.
    pub dimensions: String,
    pub format: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PredictionResponse {
    pub success: bool,
    pub craft_name: CraftClass,
    pub confidence: f64,
    pub all_predictions: Vec<ClassPrediction>,
    pub image_info: ImageSummary,
    pub model_version: String,
    /// Seconds, rounded to milliseconds.
    pub processing_time: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ModelInfo {
    pub version: String,
    pub classes: Vec<CraftClass>,
    pub num_classes: usize,
    pub is_loaded: bool,
    #[serde(rename = "type")]
    pub model_type: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub model: ModelInfo,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::{EnumCount, IntoEnumIterator};

    #[test]
    fn label_set_order_and_names() {
        let names: Vec<String> = CraftClass::iter().map(|c| c.to_string()).collect();
        assert_eq!(
            names,
            vec![
                "pottery",
                "sculpture",
                "textile",
                "woodwork",
                "metalwork",
                "jewelry",
                "painting",
                "embroidery"
            ]
        );
        assert_eq!(CraftClass::COUNT, 8);
        assert_eq!(CraftClass::all().len(), CraftClass::COUNT);
    }

    #[test]
    fn serde_and_strum_agree_on_names() {
        for class in CraftClass::iter() {
            let json = serde_json::to_string(&class).unwrap();
            assert_eq!(json, format!("\"{}\"", class.as_ref()));
            assert_eq!(CraftClass::from_str(class.as_ref()).unwrap(), class);
        }
    }

    #[test]
    fn model_info_uses_type_key() {
        let info = ModelInfo {
            version: "1.0.0-placeholder".into(),
            classes: vec![CraftClass::Pottery],
            num_classes: 1,
            is_loaded: true,
            model_type: "placeholder".into(),
        };
        let value = serde_json::to_value(&info).unwrap();
        assert_eq!(value["type"], "placeholder");
        assert!(value.get("model_type").is_none());
    }
}
