//! Prompt generation for product description rewriting.

use serde_json::{json, Value};

use crate::models::Product;

/// System prompt for the description copywriter.
pub fn system_prompt(store_name: &str) -> String {
    format!(
        r#"You are a senior copywriter for {store_name}, an online beauty and cosmetics store.

## Your Mission

Rewrite the product description you are given so that it is clear, accurate and persuasive for shoppers.

## Rules

1. Use ONLY facts present in the product data. Do NOT invent ingredients, certifications or results.
2. Mention the brand and product name once, naturally.
3. If skin types or usage instructions are given, work them into the text.
4. Write in the same language as the original description. If it is empty, write in Persian.
5. Keep it between 80 and 200 words, in plain paragraphs.
6. Return ONLY the description text: no headings, no markdown, no quotes, no explanations."#
    )
}

/// User prompt with the product fields the model may draw on.
pub fn user_prompt(product: &Product) -> String {
    let mut lines = vec![
        format!("Name: {}", product.name),
        format!("Brand: {}", product.brand),
        format!("Category: {}", product.category),
    ];
    if !product.skin_types.is_empty() {
        lines.push(format!("Skin types: {}", product.skin_types.join(", ")));
    }
    if !product.ingredients.is_empty() {
        lines.push(format!("Ingredients: {}", product.ingredients.join(", ")));
    }
    if !product.usage.is_empty() {
        lines.push(format!("Usage: {}", product.usage));
    }
    lines.push(String::new());
    lines.push("Original description:".to_string());
    lines.push(product.description.clone());

    format!(
        "## Product\n\n{}\n\nWrite the improved description now.",
        lines.join("\n")
    )
}

/// Messages array for the Anthropic API.
pub fn build_messages(product: &Product) -> Value {
    json!([
        {
            "role": "user",
            "content": user_prompt(product)
        }
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_prompt_includes_optional_fields() {
        let product = Product {
            name: "Hydra Cream".into(),
            skin_types: vec!["dry".into(), "normal".into()],
            usage: "Apply twice daily".into(),
            ..Product::default()
        };
        let prompt = user_prompt(&product);

        assert!(prompt.contains("Name: Hydra Cream"));
        assert!(prompt.contains("Skin types: dry, normal"));
        assert!(prompt.contains("Usage: Apply twice daily"));
        assert!(!prompt.contains("Ingredients:"));
    }

    #[test]
    fn test_build_messages_shape() {
        let messages = build_messages(&Product::default());
        assert_eq!(messages[0]["role"], "user");
        assert!(messages[0]["content"].as_str().unwrap().contains("Brand: Unknown"));
    }

    #[test]
    fn test_system_prompt_names_store() {
        assert!(system_prompt("Livora").contains("Livora"));
    }
}
