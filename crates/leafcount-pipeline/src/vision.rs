// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OCR provider contract and the Google Cloud Vision client.
//
// The client runs DOCUMENT_TEXT_DETECTION (dense text) rather than sparse
// TEXT_DETECTION. The first returned annotation is the full page text; the
// remaining ones are individual words with their bounding polygons.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use leafcount_core::config::AppConfig;
use leafcount_core::error::{LeafcountError, Result};
use leafcount_core::types::{BoundingBox, Vertex};

const DOCUMENT_TEXT_DETECTION: &str = "DOCUMENT_TEXT_DETECTION";

/// Text found on one page image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    /// The provider's full-page text, before normalization.
    pub full_text: String,
    /// Word-level detections, in provider order.
    pub words: Vec<BoundingBox>,
}

/// A document text-detection service.
#[async_trait]
pub trait OcrProvider: Send + Sync {
    /// Run text detection over raw image bytes.
    ///
    /// `Ok(None)` means the provider answered successfully but found no text.
    /// A non-success answer is [`LeafcountError::Provider`].
    async fn annotate(&self, image: &[u8], api_key: &str) -> Result<Option<Annotation>>;
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct AnnotateRequest {
    requests: Vec<AnnotateImageRequest>,
}

#[derive(Debug, Serialize)]
struct AnnotateImageRequest {
    image: ImageContent,
    features: Vec<Feature>,
}

#[derive(Debug, Serialize)]
struct ImageContent {
    content: String,
}

#[derive(Debug, Serialize)]
struct Feature {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Default, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<ImageResponse>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageResponse {
    #[serde(default)]
    text_annotations: Vec<EntityAnnotation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EntityAnnotation {
    #[serde(default)]
    description: String,
    #[serde(default)]
    bounding_poly: Option<BoundingPoly>,
}

#[derive(Debug, Default, Deserialize)]
struct BoundingPoly {
    #[serde(default)]
    vertices: Vec<WireVertex>,
}

#[derive(Debug, Default, Deserialize)]
struct WireVertex {
    #[serde(default)]
    x: i64,
    #[serde(default)]
    y: i64,
}

impl AnnotateRequest {
    fn document_text(image: &[u8]) -> Self {
        Self {
            requests: vec![AnnotateImageRequest {
                image: ImageContent {
                    content: base64::engine::general_purpose::STANDARD.encode(image),
                },
                features: vec![Feature {
                    kind: DOCUMENT_TEXT_DETECTION,
                }],
            }],
        }
    }
}

/// Turn a decoded response into an [`Annotation`].
///
/// Only the first response is read. Missing vertex coordinates are 0.
fn into_annotation(response: AnnotateResponse) -> Option<Annotation> {
    let first = response.responses.into_iter().next()?;
    let mut annotations = first.text_annotations.into_iter();
    let full = annotations.next()?;

    let words = annotations
        .map(|annotation| BoundingBox {
            text: annotation.description,
            vertices: annotation
                .bounding_poly
                .unwrap_or_default()
                .vertices
                .into_iter()
                .map(|v| Vertex { x: v.x, y: v.y })
                .collect(),
        })
        .collect();

    Some(Annotation {
        full_text: full.description,
        words,
    })
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Build the shared HTTP client with the configured request timeout.
pub fn build_http_client(config: &AppConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()
        .map_err(|e| LeafcountError::Http(format!("failed to build HTTP client: {e}")))
}

/// Google Cloud Vision `images:annotate` client.
///
/// Holds no credentials; the API key is passed in per call.
#[derive(Debug, Clone)]
pub struct VisionClient {
    http: reqwest::Client,
    endpoint: String,
}

impl VisionClient {
    pub fn new(http: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
        }
    }

    pub fn from_config(http: reqwest::Client, config: &AppConfig) -> Self {
        Self::new(http, config.vision_endpoint.clone())
    }
}

#[async_trait]
impl OcrProvider for VisionClient {
    #[instrument(skip_all, fields(bytes = image.len()))]
    async fn annotate(&self, image: &[u8], api_key: &str) -> Result<Option<Annotation>> {
        let request = AnnotateRequest::document_text(image);

        let response = self
            .http
            .post(&self.endpoint)
            .query(&[("key", api_key)])
            .json(&request)
            .send()
            .await
            .map_err(|e| request_error("Vision request failed", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LeafcountError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        let decoded: AnnotateResponse = response
            .json()
            .await
            .map_err(|e| request_error("invalid Vision response", e))?;

        let annotation = into_annotation(decoded);
        debug!(
            words = annotation.as_ref().map_or(0, |a| a.words.len()),
            "Vision annotation received"
        );
        Ok(annotation)
    }
}

/// The request URL carries the API key, so it never reaches the message.
fn request_error(context: &str, e: reqwest::Error) -> LeafcountError {
    LeafcountError::Http(format!("{context}: {}", e.without_url()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(json: &str) -> Option<Annotation> {
        into_annotation(serde_json::from_str(json).expect("valid response json"))
    }

    #[test]
    fn request_body_shape() {
        let body = serde_json::to_value(AnnotateRequest::document_text(b"abc")).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "requests": [{
                    "image": { "content": "YWJj" },
                    "features": [{ "type": "DOCUMENT_TEXT_DETECTION" }]
                }]
            })
        );
    }

    #[test]
    fn first_annotation_is_full_text() {
        let annotation = decode(
            r#"{"responses":[{"textAnnotations":[
                {"description":"Hello world\n"},
                {"description":"Hello","boundingPoly":{"vertices":[
                    {"x":1,"y":2},{"x":30,"y":2},{"x":30,"y":12},{"x":1,"y":12}]}},
                {"description":"world","boundingPoly":{"vertices":[
                    {"y":2},{"x":70},{},{"x":35,"y":12}]}}
            ]}]}"#,
        )
        .expect("annotation");

        assert_eq!(annotation.full_text, "Hello world\n");
        assert_eq!(annotation.words.len(), 2);
        assert_eq!(annotation.words[0].text, "Hello");
        assert_eq!(annotation.words[0].vertices[2], Vertex { x: 30, y: 12 });
        assert_eq!(
            annotation.words[1].vertices,
            vec![
                Vertex { x: 0, y: 2 },
                Vertex { x: 70, y: 0 },
                Vertex { x: 0, y: 0 },
                Vertex { x: 35, y: 12 },
            ]
        );
    }

    #[test]
    fn no_annotations_is_none() {
        assert!(decode(r#"{"responses":[{}]}"#).is_none());
        assert!(decode(r#"{"responses":[{"textAnnotations":[]}]}"#).is_none());
        assert!(decode(r#"{}"#).is_none());
    }

    #[test]
    fn full_text_only_has_no_words() {
        let annotation =
            decode(r#"{"responses":[{"textAnnotations":[{"description":"42"}]}]}"#)
                .expect("annotation");
        assert_eq!(annotation.full_text, "42");
        assert!(annotation.words.is_empty());
    }

    #[test]
    fn missing_polygon_yields_no_vertices() {
        let annotation = decode(
            r#"{"responses":[{"textAnnotations":[{"description":"a b"},{"description":"a"}]}]}"#,
        )
        .expect("annotation");
        assert!(annotation.words[0].vertices.is_empty());
    }

    #[tokio::test]
    async fn transport_failure_does_not_leak_api_key() {
        let client = VisionClient::new(
            reqwest::Client::new(),
            "http://127.0.0.1:1/v1/images:annotate",
        );

        let err = client
            .annotate(b"img", "SECRET-VISION-KEY")
            .await
            .expect_err("nothing listens on port 1");

        assert!(matches!(err, LeafcountError::Http(_)));
        let message = err.to_string();
        assert!(message.starts_with("HTTP error: Vision request failed"));
        assert!(!message.contains("SECRET-VISION-KEY"), "{message}");
    }
}
