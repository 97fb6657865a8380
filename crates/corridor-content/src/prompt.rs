use serde::Deserialize;

pub const TOPIC_PLACEHOLDER: &str = "{topic}";

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct PromptTemplate {
    #[serde(default = "default_text")]
    pub text: String,
    #[serde(default = "default_image_suffix")]
    pub image_suffix: String,
}

fn default_text() -> String {
    "Generate a phrase describing surroundings with {topic}".to_string()
}

fn default_image_suffix() -> String {
    " oil painting".to_string()
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            text: default_text(),
            image_suffix: default_image_suffix(),
        }
    }
}

impl PromptTemplate {
    /// Text prompt for `topic`; appended when the template has no placeholder.
    pub fn text_prompt(&self, topic: &str) -> String {
        if self.text.contains(TOPIC_PLACEHOLDER) {
            self.text.replace(TOPIC_PLACEHOLDER, topic)
        } else {
            format!("{} {}", self.text.trim_end(), topic)
        }
    }

    pub fn image_prompt(&self, phrase: &str) -> String {
        format!("{phrase}{}", self.image_suffix)
    }
}

/// Strip line breaks and periods from a generated phrase.
pub fn clean_phrase(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, '\n' | '\r' | '.'))
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_template_inserts_topic() {
        let t = PromptTemplate::default();
        assert_eq!(
            t.text_prompt("forest"),
            "Generate a phrase describing surroundings with forest"
        );
        assert_eq!(t.image_prompt("tall pines"), "tall pines oil painting");
    }

    #[test]
    fn template_without_placeholder_appends() {
        let t = PromptTemplate {
            text: "Describe ".into(),
            image_suffix: String::new(),
        };
        assert_eq!(t.text_prompt("ocean"), "Describe ocean");
    }

    #[test]
    fn clean_phrase_drops_breaks_and_periods() {
        assert_eq!(clean_phrase("\n\nA quiet lake. At dusk.\n"), "A quiet lake At dusk");
        assert_eq!(clean_phrase("   "), "");
    }
}
