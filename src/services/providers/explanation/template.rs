use crate::{
    error::AppResult,
    models::{Film, UserQuery},
    services::providers::explanation::{format_percent, truncate_explanation, ExplanationProvider},
};

/// Deterministic, offline explanation provider
#[derive(Debug, Clone)]
pub struct TemplateExplainer {
    max_chars: usize,
}

impl TemplateExplainer {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }
}

#[async_trait::async_trait]
impl ExplanationProvider for TemplateExplainer {
    async fn explain(&self, _query: &UserQuery, film: &Film, final_score: f64) -> AppResult<String> {
        let text = format!(
            "{} correspond à tes envies (score {}). Il partage des thèmes proches de ta description et de l'ambiance recherchée, et il est aligné avec tes préférences de genre.",
            film.title,
            format_percent(final_score)
        );
        Ok(truncate_explanation(&text, self.max_chars))
    }

    fn name(&self) -> &'static str {
        "template"
    }
}
