use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodRequest {
    pub food: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafeFoodRequest {
    pub food: String,
    pub avoid: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepsResponse {
    pub steps: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllergensResponse {
    #[serde(default)]
    pub allergens: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetStepRequest {
    pub step: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraStartRequest {
    pub recipe: String,
    pub steps: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepDetailsResponse {
    #[serde(default)]
    pub details: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyCautionResponse {
    #[serde(default)]
    pub caution: Option<String>,
    #[serde(default)]
    pub tip: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepImageResponse {
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsRequest {
    pub text: String,
    pub voice: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PushKind {
    StepCheck,
    Speech,
}

/// Envelope for every frame delivered on the live `/stream` connection.
///
/// `data` is left undecoded here: step-check payloads arrive either as a
/// structured object or as a (possibly code-fenced) JSON string, and speech
/// payloads as plain text, so the reconciler owns the decode chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushFrame {
    #[serde(rename = "type")]
    pub kind: PushKind,
    #[serde(default)]
    pub step: Option<String>,
    pub data: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckDetail {
    pub completed: bool,
    #[serde(default)]
    pub explanation: String,
}

/// Vision verdict for a single step. The backend guarantees
/// `completed == state.completed || action.completed`; the client trusts the
/// top-level flag and never recomputes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepCheck {
    pub completed: bool,
    pub state: CheckDetail,
    pub action: CheckDetail,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}
