use serde::{Deserialize, Serialize};

use crate::genai::{extract_json_block, GenAiError, InlineImage, TextGenerator};

/// Parsed classifier output for a positive result. Absent numeric fields
/// default to 0; negative estimates are clamped when mapped into a food item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodAnalysis {
    #[serde(rename = "isFood")]
    pub is_food: bool,
    #[serde(rename = "foodName", default)]
    pub food_name: Option<String>,
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub carbohydrates: f64,
    #[serde(default)]
    pub fats: f64,
    #[serde(default)]
    pub sugar: f64,
    #[serde(default)]
    pub fiber: f64,
    #[serde(default)]
    pub sodium: f64,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Classification outcome. Anything the service returns that cannot be
/// parsed into a positive result is NotFood — the gateway fails closed and
/// never fabricates nutrient data.
#[derive(Debug)]
pub enum Verdict {
    Food(FoodAnalysis),
    NotFood { message: String },
}

const FALLBACK_MESSAGE: &str = "Unable to analyze the image";

/// Strict instruction: exactly one of two JSON shapes, nothing else.
pub fn classifier_prompt() -> String {
    concat!(
        "Analyze the attached image and decide whether it shows food. ",
        "Respond with EXACTLY ONE JSON object and no other text.\n",
        "If the image shows food, respond:\n",
        "{\"isFood\": true, \"foodName\": \"<name>\", \"calories\": <number>, ",
        "\"protein\": <grams>, \"carbohydrates\": <grams>, \"fats\": <grams>, ",
        "\"sugar\": <grams>, \"fiber\": <grams>, \"sodium\": <mg>, ",
        "\"category\": \"<protein|carbohydrate|vegetable|fruit|dairy|fat|beverage|snack>\", ",
        "\"confidence\": <0..1>, \"description\": \"<one sentence>\"}\n",
        "If it does not show food, respond:\n",
        "{\"isFood\": false, \"message\": \"<short reason>\"}\n",
        "Estimate nutrients for the visible portion. Do not wrap the JSON in ",
        "markdown fences or commentary."
    )
    .to_string()
}

/// Maps raw service text to a verdict. Extraction or parse failure is a
/// NotFood verdict, uniformly on every path.
pub fn interpret(raw: &str) -> Verdict {
    let Some(block) = extract_json_block(raw) else {
        return Verdict::NotFood {
            message: FALLBACK_MESSAGE.into(),
        };
    };
    let Ok(analysis) = serde_json::from_str::<FoodAnalysis>(block) else {
        return Verdict::NotFood {
            message: FALLBACK_MESSAGE.into(),
        };
    };
    if !analysis.is_food {
        let message = analysis
            .message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| "The image does not appear to contain food".into());
        return Verdict::NotFood { message };
    }
    Verdict::Food(analysis)
}

/// Sends the image to the text service and interprets the answer. Transport
/// and upstream failures surface as errors; ambiguous answers fail closed.
pub async fn classify_image(
    advisor: &dyn TextGenerator,
    image_base64: String,
    mime_type: String,
) -> Result<Verdict, GenAiError> {
    let raw = advisor
        .generate(
            &classifier_prompt(),
            Some(InlineImage {
                mime_type,
                data: image_base64,
            }),
        )
        .await?;
    Ok(interpret(&raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_result_with_all_fields() {
        let raw = r#"Sure! {"isFood": true, "foodName": "Grilled chicken", "calories": 231,
            "protein": 43.5, "carbohydrates": 0, "fats": 5,
            "sugar": 0, "fiber": 0, "sodium": 104,
            "category": "protein", "confidence": 0.93,
            "description": "A grilled chicken breast."}"#;
        match interpret(raw) {
            Verdict::Food(a) => {
                assert_eq!(a.food_name.as_deref(), Some("Grilled chicken"));
                assert_eq!(a.calories, 231.0);
                assert_eq!(a.confidence, Some(0.93));
            }
            Verdict::NotFood { .. } => panic!("expected food verdict"),
        }
    }

    #[test]
    fn absent_numeric_fields_default_to_zero() {
        let raw = r#"{"isFood": true, "foodName": "Mystery soup"}"#;
        match interpret(raw) {
            Verdict::Food(a) => {
                assert_eq!(a.calories, 0.0);
                assert_eq!(a.sodium, 0.0);
                assert!(a.category.is_none());
            }
            Verdict::NotFood { .. } => panic!("expected food verdict"),
        }
    }

    #[test]
    fn negative_verdict_carries_service_message() {
        let raw = r#"{"isFood": false, "message": "That is a bicycle"}"#;
        match interpret(raw) {
            Verdict::NotFood { message } => assert_eq!(message, "That is a bicycle"),
            Verdict::Food(_) => panic!("expected not-food verdict"),
        }
    }

    #[test]
    fn garbage_fails_closed() {
        for raw in [
            "I'm sorry, I can't help with that.",
            "{not json at all",
            r#"{"unexpected": "shape"}"#,
            "",
        ] {
            match interpret(raw) {
                Verdict::NotFood { message } => assert!(!message.is_empty()),
                Verdict::Food(_) => panic!("must fail closed for {raw:?}"),
            }
        }
    }

    #[test]
    fn json_inside_prose_is_extracted() {
        let raw = "Here's my analysis:\n```json\n{\"isFood\": false, \"message\": \"A laptop\"}\n```";
        match interpret(raw) {
            Verdict::NotFood { message } => assert_eq!(message, "A laptop"),
            Verdict::Food(_) => panic!("expected not-food verdict"),
        }
    }

    #[test]
    fn prompt_names_both_shapes() {
        let p = classifier_prompt();
        assert!(p.contains(r#""isFood": true"#));
        assert!(p.contains(r#""isFood": false"#));
        assert!(p.contains("EXACTLY ONE JSON object"));
    }
}
