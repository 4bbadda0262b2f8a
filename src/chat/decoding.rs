//! Validated sampling parameters passed to the chat client.

use serde::{Deserialize, Serialize};

use super::error::InvalidDecodingConfig;

/// Sampling parameters for one chat-completions call. Builder methods mirror
/// `with_*` construction; `validate()` enforces each field's valid range
/// before a config is ever sent over the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecodingConfig {
    pub model: String,
    pub temperature: f32,
    #[serde(rename = "top_p")]
    pub top_p: f32,
    #[serde(rename = "max_tokens")]
    pub max_tokens: u32,
    #[serde(rename = "frequency_penalty")]
    pub frequency_penalty: f32,
    #[serde(rename = "presence_penalty")]
    pub presence_penalty: f32,
    #[serde(rename = "stop", skip_serializing_if = "Option::is_none")]
    pub stop_sequences: Option<Vec<String>>,
    pub logprobs: Option<bool>,
    #[serde(rename = "top_logprobs", skip_serializing_if = "Option::is_none")]
    pub top_logprobs: Option<u32>,
}

impl DecodingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = top_p;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_frequency_penalty(mut self, penalty: f32) -> Self {
        self.frequency_penalty = penalty;
        self
    }

    pub fn with_presence_penalty(mut self, penalty: f32) -> Self {
        self.presence_penalty = penalty;
        self
    }

    pub fn with_stop_sequences(mut self, stop: Vec<String>) -> Self {
        self.stop_sequences = Some(stop);
        self
    }

    pub fn with_logprobs(mut self, logprobs: bool) -> Self {
        self.logprobs = Some(logprobs);
        self
    }

    pub fn with_top_logprobs(mut self, top_logprobs: u32) -> Self {
        self.top_logprobs = Some(top_logprobs);
        self
    }

    /// Range-check every field.
    pub fn validate(&self) -> Result<(), InvalidDecodingConfig> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(InvalidDecodingConfig(
                "temperature must be in [0, 2]".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.top_p) {
            return Err(InvalidDecodingConfig("top_p must be in [0, 1]".to_string()));
        }
        if !(1..=8192).contains(&self.max_tokens) {
            return Err(InvalidDecodingConfig(
                "max_tokens must be in [1, 8192]".to_string(),
            ));
        }
        if !(-2.0..=2.0).contains(&self.frequency_penalty) {
            return Err(InvalidDecodingConfig(
                "frequency_penalty must be in [-2, 2]".to_string(),
            ));
        }
        if !(-2.0..=2.0).contains(&self.presence_penalty) {
            return Err(InvalidDecodingConfig(
                "presence_penalty must be in [-2, 2]".to_string(),
            ));
        }
        if let Some(top_logprobs) = self.top_logprobs {
            if top_logprobs > 20 {
                return Err(InvalidDecodingConfig(
                    "top_logprobs must be in [0, 20]".to_string(),
                ));
            }
        }
        Ok(())
    }
}

impl Default for DecodingConfig {
    fn default() -> Self {
        Self {
            model: "deepseek-chat".to_string(),
            temperature: 1.0,
            top_p: 1.0,
            max_tokens: 4096,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
            stop_sequences: None,
            logprobs: None,
            top_logprobs: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(DecodingConfig::default().validate().is_ok());
    }

    #[test]
    fn out_of_range_temperature_fails() {
        let config = DecodingConfig::new().with_temperature(2.5);
        assert!(config.validate().is_err());
    }

    #[test]
    fn out_of_range_max_tokens_fails() {
        let config = DecodingConfig::new().with_max_tokens(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn top_logprobs_above_twenty_fails() {
        let config = DecodingConfig::new().with_top_logprobs(21);
        assert!(config.validate().is_err());
    }

    #[test]
    fn builder_chains_every_field() {
        let config = DecodingConfig::new()
            .with_model("gpt-4")
            .with_temperature(0.5)
            .with_top_p(0.9)
            .with_max_tokens(2000)
            .with_stop_sequences(vec!["\n\n".to_string()]);
        assert_eq!(config.model, "gpt-4");
        assert_eq!(config.max_tokens, 2000);
        assert!(config.validate().is_ok());
    }
}
