//! Wire types for the `/analyze` exchange
//!
//! Responses are first read into a permissive raw shape and then validated
//! against the request that produced them. Callers only ever see a fully
//! populated [`AnalysisResult`].

use super::image::EncodedImage;
use super::AnalysisError;
use crate::ballot::TwoBits;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Request body for `POST /analyze`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AnalysisRequest {
    pub message: TwoBits,
    pub include_eve: bool,
}

impl AnalysisRequest {
    pub fn new(message: TwoBits, include_eve: bool) -> Self {
        Self {
            message,
            include_eve,
        }
    }
}

/// Validated analysis response
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    pub message: TwoBits,
    pub include_eve: bool,
    pub bloch_sphere_img: EncodedImage,
    pub secure: ChannelReport,
    /// Present iff `include_eve`
    pub eve: Option<ChannelReport>,
    /// Basis label to amplitude text, e.g. `"11" -> "0.707 + 0.000j"`
    pub statevector: Option<BTreeMap<String, String>>,
    pub density_matrix: Option<DensityMatrices>,
}

impl AnalysisResult {
    /// Every image in the result, named for export
    pub fn images(&self) -> Vec<(&'static str, &EncodedImage)> {
        let mut images = vec![
            ("bloch-sphere", &self.bloch_sphere_img),
            ("secure-circuit", &self.secure.circuit_img),
            ("secure-histogram", &self.secure.histogram_img),
        ];
        if let Some(eve) = &self.eve {
            images.push(("eve-circuit", &eve.circuit_img));
            images.push(("eve-histogram", &eve.histogram_img));
        }
        images
    }

    /// Write every image into `dir` as `<prefix>-<name>.png`
    pub fn export(&self, dir: &Path, prefix: &str) -> std::io::Result<Vec<PathBuf>> {
        self.images()
            .into_iter()
            .map(|(name, image)| image.write_to(dir, &format!("{prefix}-{name}.png")))
            .collect()
    }
}

/// One simulated transmission channel
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelReport {
    pub circuit_img: EncodedImage,
    pub histogram_img: EncodedImage,
    pub counts: Counts,
}

impl ChannelReport {
    pub fn verdict(&self, expected: TwoBits) -> Verdict {
        if self.counts.decoded() == expected {
            Verdict::Registered
        } else {
            Verdict::ErrorDetected
        }
    }
}

/// Whether a channel delivered the vote intact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Registered,
    ErrorDetected,
}

impl Verdict {
    pub fn label(self) -> &'static str {
        match self {
            Verdict::Registered => "Vote Registered Correctly",
            Verdict::ErrorDetected => "Error Detected",
        }
    }
}

/// Measurement outcome of a channel
///
/// The service reports either the decoded bits directly or a shot histogram
/// keyed by outcome. Histogram keys may carry extra classical registers
/// separated by spaces (`"1 01"`); the decoded message is the last register.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Counts {
    decoded: TwoBits,
    shots: BTreeMap<TwoBits, u64>,
}

impl Counts {
    pub fn decoded(&self) -> TwoBits {
        self.decoded
    }

    /// Shots per decoded message; empty when the service sent bits only
    pub fn shots(&self) -> &BTreeMap<TwoBits, u64> {
        &self.shots
    }

    pub fn total_shots(&self) -> u64 {
        self.shots
            .values()
            .fold(0u64, |total, n| total.saturating_add(*n))
    }

    fn from_raw(raw: RawCounts) -> Result<Self, String> {
        match raw {
            RawCounts::Decoded(bits) => {
                let decoded = bits.trim().parse().map_err(|e| format!("{e}"))?;
                Ok(Self {
                    decoded,
                    shots: BTreeMap::new(),
                })
            }
            RawCounts::Histogram(histogram) => {
                let mut shots: BTreeMap<TwoBits, u64> = BTreeMap::new();
                for (outcome, n) in histogram {
                    let register = outcome
                        .split_whitespace()
                        .last()
                        .ok_or_else(|| "empty outcome key".to_string())?;
                    let bits: TwoBits = register.parse().map_err(|e| format!("{e}"))?;
                    let slot = shots.entry(bits).or_default();
                    *slot = slot
                        .checked_add(n)
                        .ok_or_else(|| "shot count overflow".to_string())?;
                }
                // Ascending scan with strict comparison keeps the smallest key on ties
                let mut best: Option<(TwoBits, u64)> = None;
                for (bits, n) in &shots {
                    if best.map_or(true, |(_, top)| *n > top) {
                        best = Some((*bits, *n));
                    }
                }
                let (decoded, _) = best.ok_or_else(|| "histogram has no outcomes".to_string())?;
                Ok(Self { decoded, shots })
            }
        }
    }
}

/// Density matrices before and after interception
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DensityMatrices {
    pub no_eve: Vec<Vec<f64>>,
    #[serde(default)]
    pub with_eve: Option<Vec<Vec<f64>>>,
}

// ============================================================================
// Raw wire shape
// ============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct RawAnalysisResult {
    message: Option<String>,
    include_eve: Option<bool>,
    bloch_sphere_img: Option<String>,
    secure: Option<RawChannel>,
    eve: Option<RawChannel>,
    statevector: Option<Value>,
    density_matrix: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct RawChannel {
    circuit_img: Option<String>,
    histogram_img: Option<String>,
    counts: Option<RawCounts>,
}

impl RawChannel {
    fn is_empty(&self) -> bool {
        self.circuit_img.is_none() && self.histogram_img.is_none() && self.counts.is_none()
    }

    fn validate(self, channel: &str) -> Result<ChannelReport, AnalysisError> {
        let image = |field: &str, value: Option<String>| -> Result<EncodedImage, AnalysisError> {
            let value = value.ok_or_else(|| {
                AnalysisError::malformed(format!("missing field `{channel}.{field}`"))
            })?;
            EncodedImage::parse(value)
                .map_err(|e| AnalysisError::malformed(format!("`{channel}.{field}`: {e}")))
        };
        let circuit_img = image("circuit_img", self.circuit_img)?;
        let histogram_img = image("histogram_img", self.histogram_img)?;
        let counts = self
            .counts
            .ok_or_else(|| AnalysisError::malformed(format!("missing field `{channel}.counts`")))?;
        let counts = Counts::from_raw(counts)
            .map_err(|e| AnalysisError::malformed(format!("`{channel}.counts`: {e}")))?;
        Ok(ChannelReport {
            circuit_img,
            histogram_img,
            counts,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawCounts {
    Decoded(String),
    Histogram(BTreeMap<String, u64>),
}

impl RawAnalysisResult {
    /// Check the raw body against the request that produced it
    pub(crate) fn validate(self, request: &AnalysisRequest) -> Result<AnalysisResult, AnalysisError> {
        let message: TwoBits = self
            .message
            .ok_or_else(|| AnalysisError::malformed("missing field `message`"))?
            .parse()
            .map_err(|e| AnalysisError::malformed(format!("`message`: {e}")))?;
        if message != request.message {
            return Err(AnalysisError::malformed(format!(
                "service echoed message {message} for request {}",
                request.message
            )));
        }

        let include_eve = self
            .include_eve
            .ok_or_else(|| AnalysisError::malformed("missing field `include_eve`"))?;
        if include_eve != request.include_eve {
            return Err(AnalysisError::malformed(format!(
                "service echoed include_eve={include_eve} for include_eve={}",
                request.include_eve
            )));
        }

        let bloch_sphere_img = EncodedImage::parse(
            self.bloch_sphere_img
                .ok_or_else(|| AnalysisError::malformed("missing field `bloch_sphere_img`"))?,
        )
        .map_err(|e| AnalysisError::malformed(format!("`bloch_sphere_img`: {e}")))?;

        let secure = self
            .secure
            .ok_or_else(|| AnalysisError::malformed("missing field `secure`"))?
            .validate("secure")?;

        // The service may send an all-null `eve` object instead of omitting it
        let eve = self.eve.filter(|eve| !eve.is_empty());
        let eve = match (include_eve, eve) {
            (true, Some(eve)) => Some(eve.validate("eve")?),
            (true, None) => {
                return Err(AnalysisError::malformed(
                    "include_eve was requested but the response has no `eve` results",
                ))
            }
            (false, Some(_)) => {
                return Err(AnalysisError::malformed(
                    "response carries `eve` results that were not requested",
                ))
            }
            (false, None) => None,
        };

        let statevector = self
            .statevector
            .and_then(|v| serde_json::from_value::<BTreeMap<String, String>>(v).ok());
        let density_matrix = self
            .density_matrix
            .and_then(|v| serde_json::from_value::<DensityMatrices>(v).ok());

        Ok(AnalysisResult {
            message,
            include_eve,
            bloch_sphere_img,
            secure,
            eve,
            statevector,
            density_matrix,
        })
    }
}

/// Decode and validate a success body
pub fn parse_success_body(
    body: &str,
    request: &AnalysisRequest,
) -> Result<AnalysisResult, AnalysisError> {
    let raw: RawAnalysisResult = serde_json::from_str(body)
        .map_err(|e| AnalysisError::malformed(format!("unreadable response body: {e}")))?;
    raw.validate(request)
}
