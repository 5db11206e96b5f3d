use prompt_lab_core::{PromptLibrary, ResponseScorer, Result, TestCase, TEXT_CLASSIFICATION};
use prompt_lab_metrics::LabelMatcher;
use std::sync::Arc;

use super::Task;

pub const TEXT_CLASSIFICATION_STRATEGIES: [&str; 3] = ["zero_shot", "one_shot", "few_shot"];

/// Three-way sentiment classification of short Turkish texts.
pub struct TextClassificationTask {
    library: Arc<PromptLibrary>,
    matcher: LabelMatcher,
}

impl TextClassificationTask {
    pub fn new(library: Arc<PromptLibrary>) -> Self {
        Self {
            library,
            matcher: LabelMatcher::sentiment(),
        }
    }

    pub fn extract_label(&self, response: &str) -> Option<&str> {
        self.matcher.extract_label(response)
    }
}

impl Task for TextClassificationTask {
    fn name(&self) -> &str {
        "Text Classification - Sentiment Analysis"
    }

    fn test_data(&self) -> Vec<TestCase> {
        vec![
            TestCase::new(
                "sentiment-weather",
                "Bugün hava çok güzel, dışarı çıkmak harika olurdu!",
            )
            .with_expected("Olumlu"),
            TestCase::new(
                "sentiment-traffic",
                "Trafik yüzünden işe geç kaldım, çok sinir bozucu.",
            )
            .with_expected("Olumsuz"),
            TestCase::new("sentiment-meeting", "Toplantı saat 10:00'da başlayacak.")
                .with_expected("Nötr"),
            TestCase::new(
                "sentiment-book",
                "Bu kitabı gerçekten çok sevdim, herkese tavsiye ederim.",
            )
            .with_expected("Olumlu"),
            TestCase::new(
                "sentiment-film",
                "Film beklentilerimin altında kaldı, hayal kırıklığına uğradım.",
            )
            .with_expected("Olumsuz"),
        ]
    }

    fn strategies(&self) -> &[&'static str] {
        &TEXT_CLASSIFICATION_STRATEGIES
    }

    fn generate_prompt(&self, strategy: &str, case: &TestCase) -> Result<String> {
        let text = case.input_text.as_str();
        match strategy {
            "zero_shot" => Ok(format!(
                "Bu metni 'Olumlu', 'Olumsuz' veya 'Nötr' olarak sınıflandır:\nMetin: '{text}'\nSınıf:"
            )),
            "one_shot" => Ok(format!(
                "Aşağıdaki örnekte olduğu gibi metnin duygu durumunu sınıflandır:\n\n\
                 Örnek:\n\
                 Metin: 'Hava harika, güneş parlıyor.'\n\
                 Duygu: Olumlu\n\n\
                 Şimdi sınıflandır:\n\
                 Metin: '{text}'\n\
                 Duygu:"
            )),
            "few_shot" => self
                .library
                .format(TEXT_CLASSIFICATION, "sentiment_few_shot", &[("text", text)]),
            other => Err(self.unsupported(other)),
        }
    }

    fn evaluate_response(&self, expected: &str, actual: &str) -> f64 {
        self.matcher.score(expected, actual)
    }
}
