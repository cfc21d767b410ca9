use std::{fmt, str::FromStr};

use crate::error::SummarizationError;

/// Chat models accepted by the summarization backend.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Model {
    Gpt4o,
    #[default]
    Gpt4oMini,
    O1,
    O3Mini,
}

pub struct ModelConfig {
    pub id: &'static str,
    pub display_name: &'static str,
    pub max_tokens: u32,
    /// Reasoning models take `max_completion_tokens` and reject `temperature`.
    pub reasoning: bool,
}

impl Model {
    pub const ALL: [Model; 4] = [Model::Gpt4o, Model::Gpt4oMini, Model::O1, Model::O3Mini];

    pub fn config(&self) -> ModelConfig {
        match self {
            Model::Gpt4o => ModelConfig {
                id: "gpt-4o",
                display_name: "GPT-4o",
                max_tokens: 4096,
                reasoning: false,
            },
            Model::Gpt4oMini => ModelConfig {
                id: "gpt-4o-mini",
                display_name: "GPT-4o-mini",
                max_tokens: 4096,
                reasoning: false,
            },
            Model::O1 => ModelConfig {
                id: "o1",
                display_name: "O1",
                max_tokens: 4096,
                reasoning: true,
            },
            Model::O3Mini => ModelConfig {
                id: "o3-mini",
                display_name: "O3-mini",
                max_tokens: 4096,
                reasoning: true,
            },
        }
    }

    pub fn id(&self) -> &'static str {
        self.config().id
    }

    pub fn name(&self) -> &'static str {
        self.config().display_name
    }
}

impl FromStr for Model {
    type Err = SummarizationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Model::ALL
            .into_iter()
            .find(|model| model.id() == wanted)
            .ok_or_else(|| SummarizationError::ModelUnavailable {
                model: s.to_string(),
            })
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_models() {
        assert_eq!("gpt-4o-mini".parse::<Model>().unwrap(), Model::Gpt4oMini);
        assert_eq!("O3-MINI".parse::<Model>().unwrap(), Model::O3Mini);
        assert_eq!(Model::default(), Model::Gpt4oMini);
    }

    #[test]
    fn test_unknown_model_is_unavailable() {
        let err = "gpt-2".parse::<Model>().unwrap_err();
        assert!(matches!(err, SummarizationError::ModelUnavailable { model } if model == "gpt-2"));
    }
}
