//! Priced model catalog
//!
//! The list comes from the backend; when that fails the selector still
//! needs something to show, so a small fixed list is used instead.

use tracing::warn;

use crate::api::{ChatBackend, ModelPrice};

fn priced(model_id: &str, price_per_1m_tokens: i64) -> ModelPrice {
    ModelPrice {
        model_id: model_id.to_string(),
        price_per_1m_tokens,
        input_per_1m: None,
        output_per_1m: None,
    }
}

/// Models shown when the catalog endpoint is unreachable
pub fn fallback_models() -> Vec<ModelPrice> {
    vec![
        priced("google/gemini-2.0-flash-001", 21_000),
        priced("openai/gpt-4o-mini", 32_000),
        priced("openai/gpt-4o", 540_000),
        priced("anthropic/claude-sonnet-4", 770_000),
    ]
}

/// Fetch the priced model list, falling back to [`fallback_models`]
pub async fn load_models(backend: &dyn ChatBackend, token: &str) -> Vec<ModelPrice> {
    match backend.available_models(token).await {
        Ok(response) if !response.models.is_empty() => response.models,
        Ok(_) => fallback_models(),
        Err(e) => {
            warn!(error = %e, "Failed to load models, using fallback list");
            fallback_models()
        }
    }
}

/// Provider prefix of `provider/model-name`
pub fn provider(model_id: &str) -> &str {
    match model_id.split_once('/') {
        Some((provider, _)) if !provider.is_empty() => provider,
        _ => "other",
    }
}

/// `anthropic/claude-sonnet-4` -> `Claude Sonnet 4`
pub fn display_name(model_id: &str) -> String {
    let Some((_, name)) = model_id.split_once('/') else {
        return model_id.to_string();
    };
    name.split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Compact coin price: `540000` -> `540k`, `1500000` -> `1.5M`
pub fn format_price(price: i64) -> String {
    if price >= 1_000_000 {
        format!("{:.1}M", price as f64 / 1_000_000.0)
    } else if price >= 1_000 {
        format!("{:.0}k", price as f64 / 1_000.0)
    } else {
        price.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("anthropic/claude-sonnet-4"), "Claude Sonnet 4");
        assert_eq!(display_name("google/gemini-2.0-flash-001"), "Gemini 2.0 Flash 001");
        assert_eq!(display_name("local-model"), "local-model");
    }

    #[test]
    fn test_provider() {
        assert_eq!(provider("x-ai/grok-3"), "x-ai");
        assert_eq!(provider("plain"), "other");
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(540_000), "540k");
        assert_eq!(format_price(1_500_000), "1.5M");
        assert_eq!(format_price(999), "999");
    }

    #[tokio::test]
    async fn test_load_models_falls_back_on_error() {
        let backend = crate::testing::FakeBackend::new();
        let models = load_models(&backend, "token").await;
        assert_eq!(models, fallback_models());
        assert_eq!(backend.calls("available_models"), 1);
    }

    #[test]
    fn test_fallback_starts_with_default_model() {
        let models = fallback_models();
        assert_eq!(models[0].model_id, crate::models::DEFAULT_MODEL);
    }
}
