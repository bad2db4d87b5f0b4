//! Prompt construction for profile mapping.
//!
//! The request is laid out for cache efficiency:
//! 1. System instruction and schema excerpt: identical for every call, cached
//! 2. Few-shot examples: identical for every call
//! 3. The actual `{userId, experience, answers}` turn: not cached

use palate_core::{Answers, ExperienceTier};
use serde::Serialize;

use crate::mapper::MappingRequest;
use crate::providers::ChatMessage;

/// System instruction demanding strict JSON output.
pub const SYSTEM_INSTRUCTION: &str = r#"
You convert a wine drinker's onboarding answers into a taste profile.

## Output Rules
1. Reply with ONE JSON object and nothing else: no markdown fences, no commentary
2. Use exactly the field names of the schema below; add no other keys
3. Every scalar marked unit is a number between 0 and 1 inclusive
4. Set "userId" and "wineKnowledge" to the values given in the request
5. Infer values from the answers; when the answers are silent, stay near 0.5
6. Only fill flavorMaps categories the answers give evidence for

## Calibration
- Structured reds (Cabernet, Syrah, Nebbiolo) imply tannin and body of 0.7 or more
- Complaints about sourness or sharpness imply acidity of 0.65 or less
- Named occasions belong in contextWeights with the matching occasion code
- flavorMaps values stay within 0.2 of the matching top-level value
"#;

/// Compact excerpt of the profile schema.
pub const SCHEMA_EXCERPT: &str = r#"
## Schema (unit = number in [0,1])
{
  "userId": string,
  "stablePalate": { "sweetness", "acidity", "tannin", "bitterness", "body", "alcoholWarmth": unit, "sparkleIntensity"?: unit },
  "aromaAffinities": [ { "family": aroma, "affinity": number in [-1,1] } ],
  "styleLevers": { "oak", "malolacticButter", "oxidative", "minerality", "fruitRipeness": unit },
  "contextWeights": [ { "occasion": occasion, "weights": { <stablePalate or styleLevers key>: unit } } ],
  "foodProfile"?: { "heatLevel": integer 0-5, "salt", "fat", "sauceSweetness", "sauceAcidity": unit, "cuisines": [string], "proteins": [string] },
  "preferences": { "novelty": unit, "budgetTier": "weeknight" | "weekend" | "celebration", "values"?: [string] },
  "dislikes": [string],
  "sparklingOverrides": { "drynessBand"?: dryness, "bubbleIntensity"?: unit },
  "wineKnowledge": "novice" | "intermediate" | "expert",
  "flavorMaps": { "red"?, "white"?, "sparkling"?: { "tannin"?, "acidity"?, "body"?, "oak"?, "fruitRipeness"?: unit, "topAromas"?: [aroma], "drynessBand"?: string, "bubbleIntensity"?: unit } }
}
aroma: red_fruit | black_fruit | citrus | stone_fruit | tropical | floral | herbal | pepper_spice | earth_mineral | oak_vanilla | savory_umami | nutty_oxidative
occasion: weeknight | steak_night | pizza_burger | seafood | spicy_food | celebration | date_night | brunch | aperitif | cheese_board
dryness: brut_nature | extra_brut | brut | extra_dry | dry | demi_sec | doux
"#;

/// A worked request/response pair shown to the model before the real turn.
pub struct FewShotExample {
    pub user_id: &'static str,
    pub experience: ExperienceTier,
    pub answers: &'static [(&'static str, &'static str)],
    /// Schema-valid profile the model should have produced
    pub profile: &'static str,
}

impl FewShotExample {
    pub fn answers(&self) -> Answers {
        self.answers
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }
}

pub const NOVICE_EXAMPLE: FewShotExample = FewShotExample {
    user_id: "example-novice",
    experience: ExperienceTier::Novice,
    answers: &[
        ("free_disliked", "Red wine feels bitter and dry to me"),
        ("free_enjoyed", "Sweet pink wines and prosecco"),
        ("occasions", "Brunch with friends, sometimes pizza night"),
        ("words", "fruity, light, bubbly"),
    ],
    profile: r#"{"userId":"example-novice","stablePalate":{"sweetness":0.7,"acidity":0.45,"tannin":0.2,"bitterness":0.2,"body":0.3,"alcoholWarmth":0.3,"sparkleIntensity":0.7},"aromaAffinities":[{"family":"red_fruit","affinity":0.7},{"family":"tropical","affinity":0.5},{"family":"oak_vanilla","affinity":-0.3}],"styleLevers":{"oak":0.15,"malolacticButter":0.2,"oxidative":0.1,"minerality":0.3,"fruitRipeness":0.75},"contextWeights":[{"occasion":"brunch","weights":{"sparkleIntensity":0.8,"sweetness":0.6}},{"occasion":"pizza_burger","weights":{"body":0.45}}],"preferences":{"novelty":0.4,"budgetTier":"weeknight"},"dislikes":["bitter reds","very dry wine"],"sparklingOverrides":{"drynessBand":"extra_dry","bubbleIntensity":0.7},"wineKnowledge":"novice","flavorMaps":{"red":{"tannin":0.25,"body":0.35,"oak":0.15,"fruitRipeness":0.75},"sparkling":{"bubbleIntensity":0.7,"drynessBand":"extra_dry","topAromas":["stone_fruit","floral"]}}}"#,
};

pub const EXPERT_EXAMPLE: FewShotExample = FewShotExample {
    user_id: "example-expert",
    experience: ExperienceTier::Expert,
    answers: &[
        ("free_disliked", "Overripe fruit bombs with heavy new oak"),
        ("free_enjoyed", "Northern Rhône Syrah, aged Barolo, Chablis premier cru"),
        ("occasions", "Grilled lamb and steak on weekends, oysters for celebrations"),
        ("words", "savory, structured, mineral"),
    ],
    profile: r#"{"userId":"example-expert","stablePalate":{"sweetness":0.1,"acidity":0.75,"tannin":0.8,"bitterness":0.45,"body":0.75,"alcoholWarmth":0.55,"sparkleIntensity":0.4},"aromaAffinities":[{"family":"earth_mineral","affinity":0.8},{"family":"pepper_spice","affinity":0.7},{"family":"savory_umami","affinity":0.6},{"family":"tropical","affinity":-0.5}],"styleLevers":{"oak":0.55,"malolacticButter":0.2,"oxidative":0.35,"minerality":0.8,"fruitRipeness":0.35},"contextWeights":[{"occasion":"steak_night","weights":{"tannin":0.85,"body":0.8}},{"occasion":"celebration","weights":{"sparkleIntensity":0.6}},{"occasion":"seafood","weights":{"acidity":0.85,"minerality":0.9}}],"foodProfile":{"heatLevel":1,"salt":0.6,"fat":0.7,"sauceSweetness":0.1,"sauceAcidity":0.4,"cuisines":["french","italian"],"proteins":["lamb","beef","oysters"]},"preferences":{"novelty":0.7,"budgetTier":"celebration","values":["low intervention"]},"dislikes":["overripe fruit","heavy new oak"],"sparklingOverrides":{"drynessBand":"brut_nature","bubbleIntensity":0.45},"wineKnowledge":"expert","flavorMaps":{"red":{"tannin":0.85,"acidity":0.65,"body":0.8,"oak":0.55,"topAromas":["black_fruit","pepper_spice","earth_mineral"]},"white":{"acidity":0.85,"body":0.6,"oak":0.4,"topAromas":["citrus","earth_mineral"]},"sparkling":{"acidity":0.8,"bubbleIntensity":0.45,"drynessBand":"brut_nature"}}}"#,
};

/// Few-shot examples in prompt order.
pub const FEW_SHOT_EXAMPLES: [&FewShotExample; 2] = [&NOVICE_EXAMPLE, &EXPERT_EXAMPLE];

/// The user turn payload.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UserTurn<'a> {
    user_id: &'a str,
    experience: ExperienceTier,
    answers: &'a Answers,
}

fn user_turn(
    user_id: &str,
    experience: ExperienceTier,
    answers: &Answers,
) -> Result<String, serde_json::Error> {
    serde_json::to_string(&UserTurn {
        user_id,
        experience,
        answers,
    })
}

/// Build the full message list for one mapping request.
pub fn build_messages(request: &MappingRequest) -> Result<Vec<ChatMessage>, serde_json::Error> {
    let mut messages = vec![ChatMessage::system(format!(
        "{}\n{}",
        SYSTEM_INSTRUCTION.trim(),
        SCHEMA_EXCERPT.trim_end()
    ))];

    for example in FEW_SHOT_EXAMPLES {
        messages.push(ChatMessage::user(user_turn(
            example.user_id,
            example.experience,
            &example.answers(),
        )?));
        messages.push(ChatMessage::assistant(example.profile));
    }

    messages.push(ChatMessage::user(user_turn(
        &request.user_id,
        request.experience,
        &request.answers,
    )?));

    Ok(messages)
}
