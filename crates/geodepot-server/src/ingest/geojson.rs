//! GeoJSON upload parsing
//!
//! Turns a raw upload into the flat list of features the pipeline batches
//! over. Only structural problems are fatal here: the payload must be JSON
//! and must carry a `features` array. Whether an individual geometry is
//! actually valid is PostGIS's call at insert time.

use serde_json::Value;

use super::error::ImportError;

/// One feature lifted out of the uploaded collection
#[derive(Debug, Clone)]
pub struct ParsedFeature {
    /// Raw GeoJSON geometry; `None` when the feature had no geometry or an
    /// explicit `null`. Such features are never batched and count as errors.
    pub geometry: Option<Value>,
    /// Attribute map; defaults to an empty object.
    pub properties: Value,
}

impl ParsedFeature {
    pub fn has_geometry(&self) -> bool {
        self.geometry.is_some()
    }
}

/// The parsed upload
#[derive(Debug, Clone)]
pub struct ParsedCollection {
    pub features: Vec<ParsedFeature>,
}

impl ParsedCollection {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// Parse a raw upload into a feature collection
///
/// Fails with [`ImportError::Parse`] for non-JSON payloads and for JSON that
/// is not a feature collection (no `features` array).
pub fn parse_collection(raw: &[u8]) -> Result<ParsedCollection, ImportError> {
    let value: Value = serde_json::from_slice(raw)
        .map_err(|e| ImportError::Parse(format!("invalid JSON: {}", e)))?;

    let obj = value
        .as_object()
        .ok_or_else(|| ImportError::Parse("payload is not a JSON object".to_string()))?;

    let features = obj
        .get("features")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            ImportError::Parse("payload is not a feature collection (no \"features\" array)".to_string())
        })?;

    let features = features
        .iter()
        .map(|feature| {
            let geometry = match feature.get("geometry") {
                None | Some(Value::Null) => None,
                Some(geom) => Some(geom.clone()),
            };
            let properties = feature
                .get("properties")
                .filter(|props| !props.is_null())
                .cloned()
                .unwrap_or_else(|| Value::Object(Default::default()));

            ParsedFeature {
                geometry,
                properties,
            }
        })
        .collect();

    Ok(ParsedCollection { features })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn collection(features: Value) -> Vec<u8> {
        json!({"type": "FeatureCollection", "features": features})
            .to_string()
            .into_bytes()
    }

    #[test]
    fn test_parse_valid_collection() {
        let raw = collection(json!([
            {
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [10.0, 20.0]},
                "properties": {"name": "a"}
            },
            {
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [11.0, 21.0]},
                "properties": {"name": "b"}
            }
        ]));

        let parsed = parse_collection(&raw).unwrap();
        assert_eq!(parsed.len(), 2);
        assert!(parsed.features.iter().all(ParsedFeature::has_geometry));
        assert_eq!(parsed.features[0].properties["name"], "a");
    }

    #[test]
    fn test_parse_missing_geometry() {
        let raw = collection(json!([
            {"type": "Feature", "properties": {"name": "no-geom"}},
            {"type": "Feature", "geometry": null, "properties": {}},
            {
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [0.0, 0.0]},
                "properties": {}
            }
        ]));

        let parsed = parse_collection(&raw).unwrap();
        assert_eq!(parsed.len(), 3);
        assert!(!parsed.features[0].has_geometry());
        assert!(!parsed.features[1].has_geometry());
        assert!(parsed.features[2].has_geometry());
    }

    #[test]
    fn test_parse_null_properties_defaults_to_empty_object() {
        let raw = collection(json!([
            {
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [1.0, 2.0]},
                "properties": null
            }
        ]));

        let parsed = parse_collection(&raw).unwrap();
        assert!(parsed.features[0].properties.is_object());
    }

    #[test]
    fn test_parse_empty_collection() {
        let parsed = parse_collection(&collection(json!([]))).unwrap();
        assert!(parsed.is_empty());
    }

    #[test]
    fn test_parse_rejects_malformed_json() {
        let err = parse_collection(b"{not json").unwrap_err();
        assert!(matches!(err, ImportError::Parse(_)));
    }

    #[test]
    fn test_parse_rejects_non_object_payload() {
        let err = parse_collection(b"[1, 2, 3]").unwrap_err();
        assert!(matches!(err, ImportError::Parse(_)));
    }

    #[test]
    fn test_parse_rejects_non_collection() {
        let err = parse_collection(br#"{"type": "Feature"}"#).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("feature collection"), "{}", message);
    }
}
