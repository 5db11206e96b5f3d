use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;
use validator::Validate;

use crate::error::{LabError, Result};

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(\w+)\}").expect("placeholder pattern is valid"));

pub const TEXT_CLASSIFICATION: &str = "text_classification";
pub const INFORMATION_EXTRACTION: &str = "information_extraction";
pub const MATHEMATICAL_REASONING: &str = "mathematical_reasoning";

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PromptTemplate {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub description: String,
    pub strategy: String,
    #[validate(length(min = 1))]
    pub template: String,
    pub expected_output: String,
    pub effectiveness_note: String,
    pub use_case: String,
}

impl PromptTemplate {
    /// Placeholder names in order of first appearance.
    pub fn variables(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for cap in PLACEHOLDER.captures_iter(&self.template) {
            let var = cap[1].to_string();
            if !seen.contains(&var) {
                seen.push(var);
            }
        }
        seen
    }

    pub fn render(&self, substitutions: &[(&str, &str)]) -> Result<String> {
        for var in self.variables() {
            if !substitutions.iter().any(|(key, _)| *key == var) {
                return Err(LabError::MissingPlaceholder {
                    template: self.name.clone(),
                    placeholder: var,
                });
            }
        }

        let rendered = PLACEHOLDER.replace_all(&self.template, |cap: &regex::Captures<'_>| {
            substitutions
                .iter()
                .find(|(key, _)| *key == &cap[1])
                .map(|(_, value)| (*value).to_string())
                .unwrap_or_default()
        });

        Ok(rendered.into_owned())
    }
}

/// Named prompt templates grouped by task category.
///
/// Seeded once at construction; there is no mutation API afterwards.
#[derive(Debug, Clone)]
pub struct PromptLibrary {
    templates: BTreeMap<String, BTreeMap<String, PromptTemplate>>,
}

impl PromptLibrary {
    pub fn new() -> Self {
        let mut library = Self {
            templates: BTreeMap::new(),
        };
        library.load_defaults();
        library
    }

    pub fn get(&self, category: &str, name: &str) -> Result<&PromptTemplate> {
        self.templates
            .get(category)
            .and_then(|group| group.get(name))
            .ok_or_else(|| LabError::TemplateNotFound {
                category: category.to_string(),
                name: name.to_string(),
            })
    }

    /// All templates of a category, empty when the category is unknown.
    pub fn category(&self, category: &str) -> Vec<(&str, &PromptTemplate)> {
        self.templates
            .get(category)
            .map(|group| group.iter().map(|(k, v)| (k.as_str(), v)).collect())
            .unwrap_or_default()
    }

    pub fn categories(&self) -> Vec<&str> {
        self.templates.keys().map(String::as_str).collect()
    }

    pub fn format(
        &self,
        category: &str,
        name: &str,
        substitutions: &[(&str, &str)],
    ) -> Result<String> {
        self.get(category, name)?.render(substitutions)
    }

    fn insert(&mut self, category: &str, key: &str, template: PromptTemplate) {
        self.templates
            .entry(category.to_string())
            .or_default()
            .insert(key.to_string(), template);
    }

    fn load_defaults(&mut self) {
        self.insert(
            TEXT_CLASSIFICATION,
            "sentiment_few_shot",
            PromptTemplate {
                name: "Duygu Analizi (Few-shot)".to_string(),
                description: "Müşteri yorumlarının duygu sınıflandırması için kullanılır".to_string(),
                strategy: "Few-shot Learning".to_string(),
                template: "Yorum: \"Bu ürün beklentimin altındaydı, hayal kırıklığına uğradım.\"\n\
Duygu: Olumsuz\n\
\n\
Yorum: \"Harika bir alışveriş deneyimiydi, herkese tavsiye ederim!\"\n\
Duygu: Olumlu\n\
\n\
Yorum: \"{text}\"\n\
Duygu:"
                    .to_string(),
                expected_output: "Tek kelime (Olumlu/Olumsuz/Nötr)".to_string(),
                effectiveness_note: "Genellikle %90+ doğruluk oranı sağlar".to_string(),
                use_case: "Büyük ölçekli duygu analizi".to_string(),
            },
        );

        self.insert(
            INFORMATION_EXTRACTION,
            "entity_extraction_structured",
            PromptTemplate {
                name: "Varlık Çıkarma (Yapılandırılmış)".to_string(),
                description: "Metinlerden kişi, yer, tarih bilgilerini çıkarır".to_string(),
                strategy: "Few-shot Learning".to_string(),
                template: "Metin: \"Mustafa Kemal Atatürk, 1881'de Selanik'te doğdu ve Türkiye Cumhuriyeti'nin kurucusudur.\"\n\
Kişiler: Mustafa Kemal Atatürk\n\
Yerleşim Yerleri: Selanik, Türkiye\n\
Tarihler: 1881\n\
\n\
Metin: \"{text}\"\n\
Kişiler:\n\
Yerleşim Yerleri:\n\
Tarihler:"
                    .to_string(),
                expected_output: "Yapılandırılmış liste formatı".to_string(),
                effectiveness_note: "Format tutarlılığı yüksek".to_string(),
                use_case: "Belge analizi, veri çıkarma".to_string(),
            },
        );

        self.insert(
            MATHEMATICAL_REASONING,
            "equation_systems_few_shot",
            PromptTemplate {
                name: "Denklem Sistemleri (Few-shot CoT)".to_string(),
                description: "İki bilinmeyenli denklem sistemlerini adım adım çözer".to_string(),
                strategy: "Few-shot Chain-of-Thought".to_string(),
                template: "Problem: Bir kasapta, 3 kilo kıyma ve 2 kilo sucuk alan bir müşteri toplam 90 TL ödüyor. Eğer 1 kilo kıyma, 1 kilo sucuktan 5 TL daha pahalı ise, 1 kilo kıyma ve 1 kilo sucuk fiyatı ayrı ayrı kaç TL'dir?\n\
\n\
Çözüm:\n\
1. Kıyma fiyatına 'k', sucuk fiyatına 's' diyelim.\n\
2. Problemin ilk cümlesinden denklemi kuralım: 3k + 2s = 90\n\
3. Problemin ikinci cümlesinden denklemi kuralım: k = s + 5\n\
4. İkinci denklemi ilk denklemde yerine koyalım: 3(s + 5) + 2s = 90\n\
5. Denklemi açalım: 3s + 15 + 2s = 90\n\
6. Benzer terimleri birleştirelim: 5s + 15 = 90\n\
7. 15'i diğer tarafa atalım: 5s = 90 - 15\n\
8. İşlemi yapalım: 5s = 75\n\
9. s'yi bulalım: s = 75 / 5 = 15\n\
10. Sucuğun fiyatı 15 TL'dir.\n\
11. Kıyma fiyatını bulmak için k = s + 5 denklemini kullanalım: k = 15 + 5 = 20\n\
12. Kıymanın fiyatı 20 TL'dir.\n\
\n\
Yanıt: 1 kilo kıyma: 20 TL, 1 kilo sucuk: 15 TL\n\
\n\
Problem: {problem}\n\
Çözüm:"
                    .to_string(),
                expected_output: "Adım adım çözüm ve nihai yanıt".to_string(),
                effectiveness_note: "Karmaşık problemlerde muhakeme yeteneğini artırır".to_string(),
                use_case: "Matematiksel soru çözümleri".to_string(),
            },
        );
    }
}

impl Default for PromptLibrary {
    fn default() -> Self {
        Self::new()
    }
}
