//! Prompt text for themed portraits, headshots and edits

/// Description used for themes without a dedicated entry
pub const DEFAULT_THEME_SUFFIX: &str =
    "solo character in detailed themed environment, empty background scene, dynamic composition";

pub const HEADSHOT_PROMPT: &str = "solo portrait headshot of the person, plain neutral background, sharp focus, cinematic lighting, professional business headshot, ultra-detailed";

const THEME_PROMPTS: &[(&str, &str)] = &[
    (
        "superhero",
        "solo superhero wearing a superhero costume, dynamic action pose, empty city skyline background, dramatic lighting, cape flowing in the wind, superhero atmosphere",
    ),
    (
        "knight",
        "solo knight wearing medieval knight armor, holding a sword and shield, empty castle background, torches on stone walls, medieval fantasy setting",
    ),
    (
        "cartoon princess/prince",
        "Animated cartoon style, royalty, castle background, illustrated cartoon, anime, cute, illustration, drawn features",
    ),
    (
        "minecraft/roblox/lego character",
        "Blocky, game-accurate style, cartoon, animated, playful colors",
    ),
];

/// Scene description for a theme, matched case-insensitively
pub fn theme_description(theme: &str) -> String {
    let key = theme.to_lowercase();
    THEME_PROMPTS
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, prompt)| prompt.to_string())
        .unwrap_or_else(|| format!("{}, {}", theme, DEFAULT_THEME_SUFFIX))
}

/// Full prompt for a themed transformation
pub fn themed_prompt(theme: &str, style: &str) -> String {
    format!(
        "solo portrait photo of the person, no other people, detailed background, {}, {} style, detailed environment, high detail background",
        theme_description(theme),
        style
    )
}

/// Prompt for a free-text scene supplied by the caller
pub fn custom_prompt(custom: &str) -> String {
    format!(
        "solo portrait photo of the person, no other people, detailed background, {}, detailed environment",
        custom
    )
}

/// Instruction sent to the edit model for a user's requested change
pub fn edit_instruction(instruction: &str) -> String {
    format!(
        "Make a small change: {} while keeping everything else exactly the same",
        instruction.trim()
    )
}
