//! Pest detection response handling
//!
//! The detection service answers in one of two shapes: a list of per-object
//! detections, or a bare count with a link to an annotated image or video.
//! [`RawDetectionResponse`] mirrors the wire format; it is resolved once into
//! [`DetectionResult`] and then normalized into the fields stored on an
//! analysis report.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::InfestationLevel;
use crate::types::MediaType;

/// Object storage bucket holding uploaded scans
pub const STORAGE_BUCKET: &str = "crop-scans";

/// Confidence assumed when the service reports only a count
pub const DEFAULT_CONFIDENCE: f64 = 0.85;

/// Pest name used when the service does not name the class
pub const DEFAULT_PEST: &str = "Fall Armyworm";

static STORAGE_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"crop-scans/(.+)$").expect("valid regex"));

/// One detected object. Unknown fields (bounding boxes, labels) are kept
/// verbatim so they can be stored alongside the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Detection service response as received
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawDetectionResponse {
    #[serde(default)]
    pub detections: Option<Vec<Detection>>,
    #[serde(default)]
    pub detections_count: Option<u32>,
    #[serde(default, rename = "type")]
    pub media_type: Option<String>,
    #[serde(default)]
    pub analyzed_image: Option<String>,
    #[serde(default)]
    pub analyzed_video: Option<String>,
}

/// The two response shapes of the detection service
#[derive(Debug, Clone, PartialEq)]
pub enum DetectionResult {
    /// Per-object detections, optionally with a separately reported count
    Detailed {
        detections: Vec<Detection>,
        reported_count: Option<u32>,
    },
    /// Only a count of detected objects
    Summary { count: u32 },
}

impl DetectionResult {
    /// Number of detected objects. A positive reported count takes precedence
    /// over the length of the detection list.
    pub fn count(&self) -> u32 {
        match self {
            DetectionResult::Detailed {
                detections,
                reported_count,
            } => reported_count
                .filter(|c| *c > 0)
                .unwrap_or(detections.len() as u32),
            DetectionResult::Summary { count } => *count,
        }
    }

    pub fn detections(&self) -> &[Detection] {
        match self {
            DetectionResult::Detailed { detections, .. } => detections,
            DetectionResult::Summary { .. } => &[],
        }
    }
}

impl RawDetectionResponse {
    /// Resolve into a tagged result. A non-empty detection list wins over a
    /// bare count.
    pub fn resolve(&self) -> DetectionResult {
        match &self.detections {
            Some(detections) if !detections.is_empty() => DetectionResult::Detailed {
                detections: detections.clone(),
                reported_count: self.detections_count,
            },
            _ => DetectionResult::Summary {
                count: self.detections_count.unwrap_or(0),
            },
        }
    }

    /// Media kind reported by the service, defaulting to image
    pub fn media_type(&self) -> MediaType {
        self.media_type
            .as_deref()
            .map(MediaType::from_label)
            .unwrap_or_default()
    }

    /// Link to the annotated media, if the service produced one
    pub fn analyzed_media(&self) -> Option<String> {
        self.analyzed_image
            .clone()
            .or_else(|| self.analyzed_video.clone())
            .filter(|url| !url.is_empty())
    }

    pub fn normalize(&self) -> NormalizedDetection {
        let result = self.resolve();
        let detections_count = result.count();
        let infestation_level = classify_detection_count(detections_count);

        let (confidence_score, pest_types) = if detections_count == 0 {
            (0.0, Vec::new())
        } else {
            match &result {
                DetectionResult::Detailed { detections, .. } => {
                    (mean_confidence(detections), distinct_pests(detections))
                }
                DetectionResult::Summary { .. } => {
                    (DEFAULT_CONFIDENCE, vec![DEFAULT_PEST.to_string()])
                }
            }
        };

        let bounding_boxes = serde_json::to_value(result.detections())
            .unwrap_or_else(|_| serde_json::Value::Array(Vec::new()));

        NormalizedDetection {
            infestation_level,
            confidence_score,
            pest_types,
            media_type: self.media_type(),
            analyzed_media: self.analyzed_media(),
            bounding_boxes,
            detections: result.detections().to_vec(),
            detections_count,
        }
    }
}

/// Fields derived from a detection response, ready to be stored
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedDetection {
    pub infestation_level: InfestationLevel,
    pub confidence_score: f64,
    pub pest_types: Vec<String>,
    pub media_type: MediaType,
    pub analyzed_media: Option<String>,
    pub bounding_boxes: serde_json::Value,
    pub detections: Vec<Detection>,
    pub detections_count: u32,
}

/// Map a detected object count to an infestation level
pub fn classify_detection_count(count: u32) -> InfestationLevel {
    match count {
        0 => InfestationLevel::None,
        1 => InfestationLevel::Low,
        2..=4 => InfestationLevel::Moderate,
        5..=9 => InfestationLevel::High,
        _ => InfestationLevel::Critical,
    }
}

/// Missing confidences count as zero
fn mean_confidence(detections: &[Detection]) -> f64 {
    if detections.is_empty() {
        return 0.0;
    }
    let total: f64 = detections.iter().map(|d| d.confidence.unwrap_or(0.0)).sum();
    total / detections.len() as f64
}

/// Distinct classes in first-seen order
fn distinct_pests(detections: &[Detection]) -> Vec<String> {
    let mut pests: Vec<String> = Vec::new();
    for detection in detections {
        let name = detection
            .class
            .as_deref()
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_PEST);
        if !pests.iter().any(|p| p == name) {
            pests.push(name.to_string());
        }
    }
    pests
}

/// MIME type and multipart file name used when forwarding media
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MediaFile {
    pub mime_type: &'static str,
    pub file_name: &'static str,
}

impl MediaFile {
    pub fn is_video(&self) -> bool {
        self.mime_type.starts_with("video/")
    }
}

/// Infer the MIME type from the extension of a storage key or file name.
/// Unknown extensions are sent as JPEG.
pub fn mime_type_for_path(path: &str) -> MediaFile {
    let ext = path
        .rsplit('.')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();

    let (mime_type, file_name) = match ext.as_str() {
        "mp4" => ("video/mp4", "video.mp4"),
        "avi" => ("video/x-msvideo", "video.avi"),
        "mov" => ("video/quicktime", "video.mov"),
        "webm" => ("video/webm", "video.webm"),
        "png" => ("image/png", "image.png"),
        "webp" => ("image/webp", "image.webp"),
        _ => ("image/jpeg", "file.jpg"),
    };

    MediaFile {
        mime_type,
        file_name,
    }
}

/// Recover the object key from a public storage URL
pub fn storage_key_from_url(url: &str) -> Option<&str> {
    STORAGE_KEY_RE
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Lower-cased extension of an uploaded file name, if it has one
pub fn file_extension(file_name: &str) -> Option<String> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> RawDetectionResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_classification_thresholds() {
        assert_eq!(classify_detection_count(0), InfestationLevel::None);
        assert_eq!(classify_detection_count(1), InfestationLevel::Low);
        assert_eq!(classify_detection_count(2), InfestationLevel::Moderate);
        assert_eq!(classify_detection_count(4), InfestationLevel::Moderate);
        assert_eq!(classify_detection_count(5), InfestationLevel::High);
        assert_eq!(classify_detection_count(9), InfestationLevel::High);
        assert_eq!(classify_detection_count(10), InfestationLevel::Critical);
        assert_eq!(classify_detection_count(250), InfestationLevel::Critical);
    }

    #[test]
    fn test_count_only_response() {
        let raw = parse(json!({
            "type": "image",
            "analyzed_image": "https://ai.example/out/abc.jpg",
            "detections_count": 7
        }));
        assert_eq!(raw.resolve(), DetectionResult::Summary { count: 7 });

        let normalized = raw.normalize();
        assert_eq!(normalized.infestation_level, InfestationLevel::High);
        assert_eq!(normalized.confidence_score, DEFAULT_CONFIDENCE);
        assert_eq!(normalized.pest_types, vec!["Fall Armyworm".to_string()]);
        assert_eq!(normalized.media_type, MediaType::Image);
        assert_eq!(
            normalized.analyzed_media.as_deref(),
            Some("https://ai.example/out/abc.jpg")
        );
        assert_eq!(normalized.bounding_boxes, json!([]));
    }

    #[test]
    fn test_detailed_response() {
        let raw = parse(json!({
            "detections": [
                {"class": "Fall Armyworm", "confidence": 0.9, "bbox": [1, 2, 3, 4]},
                {"class": "Aphid", "confidence": 0.7},
                {"class": "Fall Armyworm", "confidence": 0.8}
            ]
        }));
        let normalized = raw.normalize();
        assert_eq!(normalized.detections_count, 3);
        assert_eq!(normalized.infestation_level, InfestationLevel::Moderate);
        assert!((normalized.confidence_score - 0.8).abs() < 1e-9);
        assert_eq!(normalized.pest_types, vec!["Fall Armyworm", "Aphid"]);
        assert_eq!(normalized.bounding_boxes[0]["bbox"], json!([1, 2, 3, 4]));
    }

    #[test]
    fn test_missing_class_and_confidence() {
        let raw = parse(json!({"detections": [{"confidence": 0.6}, {"class": "Locust"}]}));
        let normalized = raw.normalize();
        assert_eq!(normalized.pest_types, vec!["Fall Armyworm", "Locust"]);
        assert!((normalized.confidence_score - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_empty_response_is_clean() {
        let normalized = parse(json!({})).normalize();
        assert_eq!(normalized.infestation_level, InfestationLevel::None);
        assert_eq!(normalized.confidence_score, 0.0);
        assert!(normalized.pest_types.is_empty());
        assert!(normalized.analyzed_media.is_none());
    }

    #[test]
    fn test_video_response() {
        let raw = parse(json!({
            "type": "video",
            "analyzed_video": "https://ai.example/out/clip.mp4",
            "detections_count": 12
        }));
        let normalized = raw.normalize();
        assert_eq!(normalized.media_type, MediaType::Video);
        assert_eq!(normalized.infestation_level, InfestationLevel::Critical);
    }

    #[test]
    fn test_mime_types() {
        assert_eq!(mime_type_for_path("a1b2.mp4").mime_type, "video/mp4");
        assert_eq!(mime_type_for_path("a1b2.AVI").mime_type, "video/x-msvideo");
        assert_eq!(mime_type_for_path("a1b2.mov").file_name, "video.mov");
        assert_eq!(mime_type_for_path("a1b2.webm").mime_type, "video/webm");
        assert_eq!(mime_type_for_path("a1b2.png").file_name, "image.png");
        assert_eq!(mime_type_for_path("a1b2.webp").mime_type, "image/webp");
        let jpeg = mime_type_for_path("a1b2.jpeg");
        assert_eq!(jpeg.mime_type, "image/jpeg");
        assert_eq!(jpeg.file_name, "file.jpg");
        assert_eq!(mime_type_for_path("noext").mime_type, "image/jpeg");
        assert!(mime_type_for_path("x.mp4").is_video());
    }

    #[test]
    fn test_storage_key_from_url() {
        let url = "https://store.example/storage/v1/object/public/crop-scans/1f0c.jpg";
        assert_eq!(storage_key_from_url(url), Some("1f0c.jpg"));
        assert_eq!(storage_key_from_url("https://elsewhere.example/1f0c.jpg"), None);
        assert_eq!(storage_key_from_url("crop-scans/"), None);
    }

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("leaf.JPG").as_deref(), Some("jpg"));
        assert_eq!(file_extension("clip.final.webm").as_deref(), Some("webm"));
        assert_eq!(file_extension("README"), None);
        assert_eq!(file_extension(".hidden"), None);
    }
}
