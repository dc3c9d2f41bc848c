//! Provider input payloads for the identity-preserving and edit models

use serde::Serialize;

/// Identity-preserving portrait model
pub const INSTANT_ID_MODEL: &str =
    "zsxkib/instant-id:2e4785a4d80dadf580077b2244c8d7c05d8e3faac04a04c02d8e099dd2876789";

/// Instruction-following edit model
pub const PIX2PIX_MODEL: &str =
    "timothybrooks/instruct-pix2pix:30c1d0b916a6f8efce20493f5d61ee27491ab2a60437c13c588468b9810ec23f";

pub const THEME_NEGATIVE_PROMPT: &str = "(multiple people, crowd, group, background people, other people:1.8), (additional faces, extra people:1.8), (lowres, worst quality:1.2), (text:1.2), watermark, glitch, cross-eyed, ugly";

pub const HEADSHOT_NEGATIVE_PROMPT: &str = "(multiple people, crowd, group, background people, other people:1.8), (additional faces, extra people:1.8), (lowres, low quality, worst quality:1.2), (text:1.2), watermark, glitch, deformed, mutated, cross-eyed, ugly, disfigured";

pub const EDIT_NEGATIVE_PROMPT: &str = "blur, contrast changes, NSFW content, lighting changes, color shifts, style changes, deformed, distorted, hair changes, changes to facial features";

/// Exclusive upper bound for random portrait seeds
pub const SEED_RANGE: u32 = 1_000_000;

const EDIT_DIMENSION: u32 = 768;
const EDIT_SEED: u32 = 42;

/// Input for the identity-preserving portrait model
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct InstantIdInput {
    pub image: String,
    pub prompt: String,
    pub negative_prompt: String,
    pub sdxl_weights: String,
    pub face_detection_input_width: u32,
    pub face_detection_input_height: u32,
    pub scheduler: String,
    pub num_inference_steps: u32,
    pub guidance_scale: f64,
    pub ip_adapter_scale: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_lcm: Option<bool>,
    pub controlnet_conditioning_scale: f64,
    pub enhance_nonface_region: bool,
    pub output_format: String,
    pub output_quality: u32,
    pub seed: u32,
}

impl InstantIdInput {
    fn base(image: String, prompt: String, negative_prompt: &str, seed: u32) -> Self {
        Self {
            image,
            prompt,
            negative_prompt: negative_prompt.to_string(),
            sdxl_weights: "protovision-xl-high-fidel".to_string(),
            face_detection_input_width: 640,
            face_detection_input_height: 640,
            scheduler: "EulerDiscreteScheduler".to_string(),
            num_inference_steps: 30,
            guidance_scale: 5.0,
            ip_adapter_scale: 0.8,
            enable_lcm: None,
            controlnet_conditioning_scale: 0.8,
            enhance_nonface_region: true,
            output_format: "webp".to_string(),
            output_quality: 80,
            seed,
        }
    }

    /// Themed portrait request; only this variant enables LCM sampling
    pub fn themed(image: String, prompt: String, seed: u32) -> Self {
        Self {
            enable_lcm: Some(true),
            ..Self::base(image, prompt, THEME_NEGATIVE_PROMPT, seed)
        }
    }

    /// Professional headshot request
    pub fn headshot(image: String, prompt: String, seed: u32) -> Self {
        Self::base(image, prompt, HEADSHOT_NEGATIVE_PROMPT, seed)
    }
}

/// Input for the instruction-following edit model
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Pix2PixInput {
    pub image: String,
    pub prompt: String,
    pub negative_prompt: String,
    pub num_outputs: u32,
    pub num_inference_steps: u32,
    pub guidance_scale: f64,
    pub image_guidance_scale: f64,
    pub scheduler: String,
    pub width: u32,
    pub height: u32,
    pub seed: u32,
}

impl Pix2PixInput {
    pub fn new(image: String, prompt: String) -> Self {
        Self {
            image,
            prompt,
            negative_prompt: EDIT_NEGATIVE_PROMPT.to_string(),
            num_outputs: 1,
            num_inference_steps: 100,
            guidance_scale: 7.5,
            image_guidance_scale: 1.5,
            scheduler: "K_EULER_ANCESTRAL".to_string(),
            width: EDIT_DIMENSION,
            height: EDIT_DIMENSION,
            seed: EDIT_SEED,
        }
    }
}
