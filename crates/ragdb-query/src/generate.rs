use async_trait::async_trait;
use tokio::process::Command;

use ragdb_core::config::GenerationSettings;
use ragdb_core::error::{Error, Result};
use ragdb_core::traits::GenerationProvider;

/// Runs a local model through its CLI: `<command> run <model> <prompt>`.
pub struct OllamaGenerator {
    command: String,
    model: String,
    name: String,
}

impl OllamaGenerator {
    pub fn new(command: impl Into<String>, model: impl Into<String>) -> Self {
        let command = command.into();
        let model = model.into();
        let name = format!("{command}:{model}");
        Self { command, model, name }
    }

    pub fn from_settings(settings: &GenerationSettings) -> Self {
        Self::new(&settings.command, &settings.model)
    }
}

#[async_trait]
impl GenerationProvider for OllamaGenerator {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        tracing::debug!("Running {} run {} ({} prompt chars)", self.command, self.model, prompt.chars().count());
        let output = Command::new(&self.command)
            .arg("run")
            .arg(&self.model)
            .arg(prompt)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| Error::generation(format!("failed to start {}: {e}", self.command)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::generation(format!("{} exited with {}: {}", self.command, output.status, stderr.trim())));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stdout_is_the_answer() {
        let generator = OllamaGenerator::new("echo", "mistral");
        let text = generator.generate("Context: x").await.expect("echo runs");
        assert_eq!(text, "run mistral Context: x");
    }

    #[tokio::test]
    async fn failing_command_is_a_generation_error() {
        let err = OllamaGenerator::new("false", "mistral").generate("p").await.expect_err("non-zero exit");
        assert!(matches!(err, Error::Generation { .. }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn missing_binary_is_a_generation_error() {
        let err = OllamaGenerator::new("ragdb-no-such-binary", "m").generate("p").await.expect_err("spawn fails");
        assert!(matches!(err, Error::Generation { .. }));
    }
}
