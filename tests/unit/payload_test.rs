//! Unit tests for provider payloads and prompts

use selfie_booth::generation::{
    payload::{InstantIdInput, Pix2PixInput, THEME_NEGATIVE_PROMPT},
    prompts,
};

#[test]
fn test_themed_payload_for_known_theme() {
    let prompt = prompts::themed_prompt("Knight", "photographic");
    let input = serde_json::to_value(InstantIdInput::themed(
        "data:image/jpeg;base64,QUJD".to_string(),
        prompt,
        1234,
    ))
    .unwrap();

    assert_eq!(
        input["prompt"],
        "solo portrait photo of the person, no other people, detailed background, solo knight wearing medieval knight armor, holding a sword and shield, empty castle background, torches on stone walls, medieval fantasy setting, photographic style, detailed environment, high detail background"
    );
    assert_eq!(input["negative_prompt"], THEME_NEGATIVE_PROMPT);
    assert_eq!(input["sdxl_weights"], "protovision-xl-high-fidel");
    assert_eq!(input["scheduler"], "EulerDiscreteScheduler");
    assert_eq!(input["num_inference_steps"], 30);
    assert_eq!(input["guidance_scale"], 5.0);
    assert_eq!(input["ip_adapter_scale"], 0.8);
    assert_eq!(input["controlnet_conditioning_scale"], 0.8);
    assert_eq!(input["face_detection_input_width"], 640);
    assert_eq!(input["output_format"], "webp");
    assert_eq!(input["output_quality"], 80);
    assert_eq!(input["seed"], 1234);
}

#[test]
fn test_edit_payload() {
    let input = serde_json::to_value(Pix2PixInput::new(
        "https://cdn.example/a.webp".to_string(),
        prompts::edit_instruction("  add sunglasses "),
    ))
    .unwrap();

    assert_eq!(
        input["prompt"],
        "Make a small change: add sunglasses while keeping everything else exactly the same"
    );
    assert_eq!(input["num_inference_steps"], 100);
    assert_eq!(input["guidance_scale"], 7.5);
    assert_eq!(input["image_guidance_scale"], 1.5);
    assert_eq!(input["scheduler"], "K_EULER_ANCESTRAL");
    assert_eq!(input["width"], 768);
    assert_eq!(input["height"], 768);
    assert_eq!(input["seed"], 42);
}

#[test]
fn test_custom_prompt() {
    assert_eq!(
        prompts::custom_prompt("surfing a giant wave"),
        "solo portrait photo of the person, no other people, detailed background, surfing a giant wave, detailed environment"
    );
}
