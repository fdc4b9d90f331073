/// Domain models for the light curve pipeline
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{ApiResult, PipelineError};

/// Catalog target identifier, e.g. `123456789` or `TIC 123456789`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier(String);

impl Identifier {
    pub fn parse(raw: &str) -> ApiResult<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(PipelineError::InvalidInput(
                "identifier must not be empty".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Identifier with every non-digit character stripped
    pub fn digits(&self) -> String {
        self.0.chars().filter(|c| c.is_ascii_digit()).collect()
    }

    /// Name used against the catalog, `"{prefix} {identifier}"` unless already prefixed
    pub fn catalog_name(&self, prefix: &str) -> String {
        let already_prefixed = match (self.0.get(..prefix.len()), self.0.get(prefix.len()..)) {
            (Some(head), Some(rest)) => {
                head.eq_ignore_ascii_case(prefix)
                    && rest.chars().next().map_or(true, |c| !c.is_alphabetic())
            }
            _ => false,
        };

        if prefix.is_empty() || already_prefixed {
            self.0.clone()
        } else {
            format!("{} {}", prefix, self.0)
        }
    }
}

/// Numeric value that may or may not carry a physical unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Quantity {
    Bare(f64),
    WithUnit { value: f64, unit: String },
}

impl Quantity {
    /// Raw numeric value, unit discarded
    pub fn as_number(&self) -> f64 {
        match self {
            Quantity::Bare(v) => *v,
            Quantity::WithUnit { value, .. } => *value,
        }
    }
}

impl From<f64> for Quantity {
    fn from(value: f64) -> Self {
        Quantity::Bare(value)
    }
}

/// Single light curve observation; `flux` is `None` when the sample is missing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub time: f64,
    pub flux: Option<f64>,
}

impl Sample {
    pub fn new(time: f64, flux: Option<f64>) -> Self {
        Self {
            time,
            flux: flux.filter(|f| !f.is_nan()),
        }
    }
}

/// Provider product returned by a light curve search
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRef {
    pub id: String,
    pub mission: Option<String>,
    pub sector: Option<i64>,
    pub url: String,
}

/// One observation campaign ("sector") of a light curve
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub product_id: String,
    samples: Vec<Sample>,
}

impl Segment {
    /// Build a segment, rejecting timestamps that go backwards
    pub fn new(product_id: impl Into<String>, samples: Vec<Sample>) -> ApiResult<Self> {
        let product_id = product_id.into();
        if let Some(pos) = samples.windows(2).position(|w| w[1].time < w[0].time) {
            return Err(PipelineError::malformed(format!(
                "segment {} has decreasing timestamps at sample {}",
                product_id,
                pos + 1
            )));
        }
        Ok(Self {
            product_id,
            samples,
        })
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Light curve made of one or more segments.
///
/// Segments are concatenated in the order the provider returned them. The
/// merged series is NOT re-sorted by timestamp: callers that need strict
/// chronological order across segments must sort the samples themselves.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Series {
    samples: Vec<Sample>,
    segment_count: usize,
}

impl Series {
    pub fn concat(segments: Vec<Segment>) -> Self {
        let segment_count = segments.len();
        let samples = segments.into_iter().flat_map(|s| s.samples).collect();
        Self {
            samples,
            segment_count,
        }
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn segment_count(&self) -> usize {
        self.segment_count
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Flux values with missing samples skipped
    pub fn fluxes(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().filter_map(|s| s.flux)
    }

    /// (time, flux) points with missing samples skipped
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.samples
            .iter()
            .filter_map(|s| s.flux.map(|f| (s.time, f)))
    }
}

/// Summary statistics of a series
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Statistics {
    pub median_flux: f64,
    pub usable_samples: usize,
    pub missing_samples: usize,
}

/// Scalar metrics derived from statistics
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Metrics {
    pub tree_count: u64,
    pub tree_count_normalized: f64,
    pub habitability_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifeType {
    AdvancedLife,
    ComplexLife,
    MicrobialLife,
    NoKnownLife,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceType {
    ComplexResources,
    BasicResources,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanetType {
    RockyPlanet,
    GasGiant,
    Unknown,
}

/// Host star parameters supplied by the caller
#[derive(Debug, Clone, PartialEq)]
pub struct StellarParams {
    pub radius: Quantity,
    pub mass: Quantity,
}

/// Transit timing for a target
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EphemerisData {
    pub period: f64,
    pub epoch: f64,
}

/// Result of an ephemeris lookup; unavailability is a skip signal, not an error
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Ephemeris {
    Available(EphemerisData),
    Unavailable,
}

impl Ephemeris {
    pub fn data(&self) -> Option<EphemerisData> {
        match self {
            Ephemeris::Available(data) => Some(*data),
            Ephemeris::Unavailable => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
}

impl ImageFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
        }
    }
}

/// Encoded chart of a series
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedImage {
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
}

/// How segments are retrieved from the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchMode {
    /// First search result only
    Single,
    /// Every search result, concatenated in provider order
    #[default]
    All,
}

impl std::str::FromStr for FetchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" => Ok(FetchMode::Single),
            "all" => Ok(FetchMode::All),
            other => Err(format!("unknown fetch mode '{}'", other)),
        }
    }
}

/// Which tree count formula drives the metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scoring {
    #[default]
    Habitability,
    Amplitude,
}

/// Input to one pipeline run
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub identifier: Identifier,
    pub mode: FetchMode,
    pub scoring: Scoring,
    pub include_image: bool,
    pub stellar: Option<StellarParams>,
}

/// Pipeline output shared by every transport
#[derive(Debug, Clone, Serialize)]
pub struct LightCurveReport {
    pub identifier: String,
    pub amplitude: f64,
    pub tree_count: u64,
    pub tree_count_normalized: f64,
    pub habitability_score: f64,
    pub life_type: LifeType,
    pub resource_type: ResourceType,
    pub segments: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_format: Option<ImageFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub planet_type: Option<PlanetType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub epoch: Option<f64>,
}

/// Health check response
#[derive(Serialize)]
pub struct Health {
    pub status: &'static str,
    pub now: DateTime<Utc>,
}
