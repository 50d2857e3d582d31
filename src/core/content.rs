use crate::models::{BusinessProfile, GeneratedContent, Locale, MatchResult, UnsupportedLocale};
use crate::services::language_model::DynTextGenerator;
use serde::Serialize;
use thiserror::Error;

pub const DEFAULT_WORD_BUDGET: usize = 120;
/// Upper bound on the rendered prompt, in characters
pub const MAX_PROMPT_CHARS: usize = 2000;
const MAX_PROMPT_SYNERGIES: usize = 5;
const MAX_NAME_CHARS: usize = 80;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContentError {
    #[error(transparent)]
    UnsupportedLocale(#[from] UnsupportedLocale),

    #[error("content generation unavailable: {0}")]
    Unavailable(String),
}

impl ContentError {
    /// Unavailability is transient; a bad locale is a caller error
    pub fn is_retryable(&self) -> bool {
        matches!(self, ContentError::Unavailable(_))
    }
}

/// Per-locale wording
///
/// Placeholders: `{source}`, `{candidate}`, `{source_sector}`,
/// `{candidate_sector}`, `{compatibility}`, `{synergies}`, `{words}`.
#[derive(Debug)]
pub struct LocaleTemplates {
    pub language: &'static str,
    /// System instruction for the language model
    pub instruction: &'static str,
    pub call_to_action: &'static str,
    /// Offline pitch used by the template generator
    pub pitch: &'static str,
    /// Stand-in for an empty synergy list
    pub no_synergies: &'static str,
}

static FR_TEMPLATES: LocaleTemplates = LocaleTemplates {
    language: "français",
    instruction: "Tu es rédacteur marketing pour une agence de visibilité locale. Rédige un argumentaire de partenariat en français, sur un ton professionnel et chaleureux, en {words} mots maximum. Réponds uniquement avec le texte de l'argumentaire.",
    call_to_action: "Contactez {candidate} dès aujourd'hui pour lancer votre partenariat local.",
    pitch: "{source} ({source_sector}) et {candidate} ({candidate_sector}) affichent une compatibilité de {compatibility} %. Points forts : {synergies}. Un partenariat permettrait de partager vos clientèles et d'accroître votre visibilité locale.",
    no_synergies: "des profils qui se complètent",
};

static EN_TEMPLATES: LocaleTemplates = LocaleTemplates {
    language: "English",
    instruction: "You are a copywriter for a local visibility agency. Write a partnership pitch in English, professional and warm in tone, in at most {words} words. Reply with the pitch text only.",
    call_to_action: "Contact {candidate} today to launch your local partnership.",
    pitch: "{source} ({source_sector}) and {candidate} ({candidate_sector}) show {compatibility}% compatibility. Strengths: {synergies}. A partnership would let you share customers and grow your local visibility.",
    no_synergies: "profiles that complement each other",
};

static ES_TEMPLATES: LocaleTemplates = LocaleTemplates {
    language: "español",
    instruction: "Eres redactor de marketing para una agencia de visibilidad local. Escribe una propuesta de colaboración en español, con un tono profesional y cercano, en un máximo de {words} palabras. Responde solo con el texto de la propuesta.",
    call_to_action: "Contacta hoy con {candidate} para lanzar vuestra colaboración local.",
    pitch: "{source} ({source_sector}) y {candidate} ({candidate_sector}) tienen una compatibilidad del {compatibility} %. Puntos fuertes: {synergies}. Una colaboración os permitiría compartir clientes y aumentar vuestra visibilidad local.",
    no_synergies: "perfiles que se complementan",
};

pub fn templates_for(locale: Locale) -> &'static LocaleTemplates {
    match locale {
        Locale::Fr => &FR_TEMPLATES,
        Locale::En => &EN_TEMPLATES,
        Locale::Es => &ES_TEMPLATES,
    }
}

/// Structured input for the language model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentPrompt {
    pub locale: Locale,
    pub source_name: String,
    pub source_sector: String,
    pub source_score: u8,
    pub candidate_name: String,
    pub candidate_sector: String,
    pub candidate_score: u8,
    pub compatibility: u8,
    pub synergies: Vec<String>,
    pub word_budget: usize,
}

impl ContentPrompt {
    pub fn build(
        matched: &MatchResult,
        source: &BusinessProfile,
        candidate: &BusinessProfile,
        locale: Locale,
        word_budget: usize,
    ) -> Self {
        Self {
            locale,
            source_name: truncate_chars(&source.name, MAX_NAME_CHARS),
            source_sector: truncate_chars(&source.sector, MAX_NAME_CHARS),
            source_score: source.overall_score(),
            candidate_name: truncate_chars(&candidate.name, MAX_NAME_CHARS),
            candidate_sector: truncate_chars(&candidate.sector, MAX_NAME_CHARS),
            candidate_score: candidate.overall_score(),
            compatibility: matched.compatibility,
            synergies: matched
                .synergies
                .iter()
                .take(MAX_PROMPT_SYNERGIES)
                .map(|s| truncate_chars(s, MAX_NAME_CHARS))
                .collect(),
            word_budget,
        }
    }

    pub fn templates(&self) -> &'static LocaleTemplates {
        templates_for(self.locale)
    }

    /// Fill a template with this prompt's values
    ///
    /// Single pass over the template; inserted values are never re-scanned,
    /// so braces inside business names come through verbatim.
    pub fn fill(&self, template: &str) -> String {
        let mut out = String::with_capacity(template.len() + 64);
        let mut rest = template;

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let tail = &rest[open..];
            let Some(close) = tail.find('}') else {
                rest = tail;
                break;
            };

            match self.placeholder(&tail[1..close]) {
                Some(value) => out.push_str(&value),
                None => out.push_str(&tail[..=close]),
            }
            rest = &tail[close + 1..];
        }

        out.push_str(rest);
        out
    }

    fn placeholder(&self, name: &str) -> Option<String> {
        let value = match name {
            "source" => self.source_name.clone(),
            "candidate" => self.candidate_name.clone(),
            "source_sector" => self.source_sector.clone(),
            "candidate_sector" => self.candidate_sector.clone(),
            "compatibility" => self.compatibility.to_string(),
            "words" => self.word_budget.to_string(),
            "synergies" if self.synergies.is_empty() => self.templates().no_synergies.to_string(),
            "synergies" => self.synergies.join("; "),
            _ => return None,
        };
        Some(value)
    }

    pub fn system_instruction(&self) -> String {
        self.fill(self.templates().instruction)
    }

    /// User message sent to the model, capped at [`MAX_PROMPT_CHARS`]
    pub fn render(&self) -> String {
        let mut out = format!(
            "Business A: {} | sector: {} | ILA score: {}/100\nBusiness B: {} | sector: {} | ILA score: {}/100\nCompatibility: {}%\nSynergies:\n",
            self.source_name,
            self.source_sector,
            self.source_score,
            self.candidate_name,
            self.candidate_sector,
            self.candidate_score,
            self.compatibility,
        );
        for synergy in &self.synergies {
            out.push_str("- ");
            out.push_str(synergy);
            out.push('\n');
        }
        out.push_str(&format!(
            "Language: {}. Maximum {} words.",
            self.templates().language,
            self.word_budget
        ));

        truncate_chars(&out, MAX_PROMPT_CHARS)
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Keep at most `budget` words, normalising whitespace
pub fn clamp_words(text: &str, budget: usize) -> String {
    text.split_whitespace()
        .take(budget)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Produces pitch text and a call to action for a match
#[derive(Clone)]
pub struct ContentGenerator {
    text: DynTextGenerator,
    word_budget: usize,
}

impl ContentGenerator {
    pub fn new(text: DynTextGenerator, word_budget: usize) -> Self {
        Self {
            text,
            word_budget: word_budget.max(1),
        }
    }

    pub fn provider_name(&self) -> &'static str {
        self.text.provider_name()
    }

    /// Generate content for `matched`
    ///
    /// Fails with [`ContentError::Unavailable`] when the text generator
    /// errors or returns nothing; no fallback text is substituted.
    pub async fn generate(
        &self,
        matched: &MatchResult,
        source: &BusinessProfile,
        candidate: &BusinessProfile,
        locale: Locale,
    ) -> Result<GeneratedContent, ContentError> {
        let prompt = ContentPrompt::build(matched, source, candidate, locale, self.word_budget);

        let raw = self
            .text
            .complete(&prompt)
            .await
            .map_err(|e| ContentError::Unavailable(e.to_string()))?;

        let pitch = clamp_words(&raw, self.word_budget);
        if pitch.is_empty() {
            return Err(ContentError::Unavailable(format!(
                "{} returned an empty pitch",
                self.text.provider_name()
            )));
        }

        Ok(GeneratedContent {
            pitch,
            call_to_action: prompt.fill(prompt.templates().call_to_action),
            locale,
            provider: self.text.provider_name().to_string(),
        })
    }

    /// Same as [`generate`](Self::generate) for a raw locale tag
    pub async fn generate_for_tag(
        &self,
        matched: &MatchResult,
        source: &BusinessProfile,
        candidate: &BusinessProfile,
        locale: &str,
    ) -> Result<GeneratedContent, ContentError> {
        let locale: Locale = locale.parse()?;
        self.generate(matched, source, candidate, locale).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scoring::score_from_metrics;
    use crate::models::{BusinessProfileInput, ScoreMetrics};
    use crate::services::language_model::{
        DisabledTextGenerator, TemplateTextGenerator, TextGenerationError, TextGenerator,
    };
    use async_trait::async_trait;
    use std::sync::Arc;

    struct EchoGenerator(&'static str);

    #[async_trait]
    impl TextGenerator for EchoGenerator {
        async fn complete(&self, _prompt: &ContentPrompt) -> Result<String, TextGenerationError> {
            Ok(self.0.to_string())
        }
        fn provider_name(&self) -> &'static str {
            "echo"
        }
    }

    fn business(name: &str, sector: &str, score: u8) -> BusinessProfile {
        BusinessProfile::register(
            BusinessProfileInput::new(name, sector, "Montréal"),
            score_from_metrics(ScoreMetrics::uniform(score), vec![]),
        )
    }

    fn fixture() -> (MatchResult, BusinessProfile, BusinessProfile) {
        let a = business("Chez Lou", "restaurant", 80);
        let b = business("Boutique Nova", "retail", 60);
        let m = MatchResult::computed(
            &a.id,
            &b.id,
            80,
            vec!["Complementary sectors: restaurant and retail".to_string()],
        );
        (m, a, b)
    }

    #[test]
    fn test_prompt_is_bounded() {
        let (mut m, mut a, b) = fixture();
        a.name = "x".repeat(500);
        m.synergies = (0..20).map(|i| format!("synergy {}", i)).collect();

        let prompt = ContentPrompt::build(&m, &a, &b, Locale::En, 120);

        assert_eq!(prompt.source_name.chars().count(), MAX_NAME_CHARS);
        assert_eq!(prompt.synergies.len(), MAX_PROMPT_SYNERGIES);
        assert!(prompt.render().chars().count() <= MAX_PROMPT_CHARS);
    }

    #[test]
    fn test_system_instruction_carries_word_budget() {
        let (m, a, b) = fixture();
        let prompt = ContentPrompt::build(&m, &a, &b, Locale::Fr, 90);
        assert!(prompt.system_instruction().contains("90 mots"));
    }

    #[test]
    fn test_fill_keeps_braces_in_names_verbatim() {
        let (m, mut a, mut b) = fixture();
        a.name = "Studio {candidate}".to_string();
        b.name = "Boutique {compatibility}".to_string();
        let prompt = ContentPrompt::build(&m, &a, &b, Locale::En, 120);

        let filled = prompt.fill("{source} meets {candidate} at {compatibility}%");

        assert_eq!(filled, "Studio {candidate} meets Boutique {compatibility} at 80%");
    }

    #[test]
    fn test_fill_leaves_unknown_and_unclosed_braces() {
        let (m, a, b) = fixture();
        let prompt = ContentPrompt::build(&m, &a, &b, Locale::En, 120);

        assert_eq!(prompt.fill("{other} {source} {open"), "{other} Chez Lou {open");
    }

    #[tokio::test]
    async fn test_template_content_with_braced_names() {
        let (m, mut a, mut b) = fixture();
        a.name = "Studio {candidate}".to_string();
        b.name = "Boutique {compatibility}".to_string();
        let generator = ContentGenerator::new(Arc::new(TemplateTextGenerator), 120);

        let content = generator.generate(&m, &a, &b, Locale::En).await.unwrap();

        assert!(content.pitch.starts_with("Studio {candidate} (restaurant) and Boutique {compatibility} (retail)"));
        assert_eq!(
            content.call_to_action,
            "Contact Boutique {compatibility} today to launch your local partnership."
        );
    }

    #[test]
    fn test_clamp_words() {
        assert_eq!(clamp_words("  one two\nthree four ", 3), "one two three");
        assert_eq!(clamp_words("", 3), "");
    }

    #[tokio::test]
    async fn test_generate_localized_call_to_action() {
        let (m, a, b) = fixture();
        let generator = ContentGenerator::new(Arc::new(EchoGenerator("Un partenariat gagnant.")), 120);

        let content = generator.generate(&m, &a, &b, Locale::Fr).await.unwrap();

        assert_eq!(content.pitch, "Un partenariat gagnant.");
        assert!(content.call_to_action.contains("Boutique Nova"));
        assert!(content.call_to_action.starts_with("Contactez"));
        assert_eq!(content.provider, "echo");
    }

    #[tokio::test]
    async fn test_pitch_trimmed_to_word_budget() {
        let (m, a, b) = fixture();
        let generator = ContentGenerator::new(Arc::new(EchoGenerator("a b c d e f g h")), 5);

        let content = generator.generate(&m, &a, &b, Locale::En).await.unwrap();
        assert_eq!(content.pitch.split_whitespace().count(), 5);
    }

    #[tokio::test]
    async fn test_unsupported_locale() {
        let (m, a, b) = fixture();
        let before = m.clone();
        let generator = ContentGenerator::new(Arc::new(TemplateTextGenerator), 120);

        let err = generator.generate_for_tag(&m, &a, &b, "de").await.unwrap_err();

        assert_eq!(err, ContentError::UnsupportedLocale(UnsupportedLocale("de".into())));
        assert!(!err.is_retryable());
        assert_eq!(m, before);
    }

    #[tokio::test]
    async fn test_disabled_generator_is_unavailable() {
        let (m, a, b) = fixture();
        let generator = ContentGenerator::new(Arc::new(DisabledTextGenerator), 120);

        let err = generator.generate(&m, &a, &b, Locale::En).await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_empty_output_is_unavailable() {
        let (m, a, b) = fixture();
        let generator = ContentGenerator::new(Arc::new(EchoGenerator("   ")), 120);

        let err = generator.generate(&m, &a, &b, Locale::Es).await.unwrap_err();
        assert!(matches!(err, ContentError::Unavailable(_)));
    }
}
