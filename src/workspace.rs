use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Local};

use crate::clipboard::Clipboard;
use crate::component::{Framework, SavedComponent};
use crate::extract::extract_code;
use crate::export::export_code;
use crate::gateway::AiGateway;
use crate::prompts::{build_generation_prompt, build_suggestion_prompt};
use crate::store::repository::ComponentRepository;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No code buffer yet.
    Idle,
    /// Waiting on the model.
    Generating,
    /// A code buffer is available.
    Ready,
}

/// Inputs and output of the component currently being worked on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkingState {
    pub prompt: String,
    pub framework: Framework,
    pub code: String,
    /// Enhanced prompt offered by the model, waiting to be used or dismissed.
    pub suggestion: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    #[error("Please describe your component first")]
    Validation,

    #[error("No component to save")]
    NothingToSave,

    #[error("No code to copy")]
    NothingToCopy,

    #[error("No code to download")]
    NothingToExport,

    #[error("No suggestion to use")]
    NoSuggestion,

    #[error("No saved component with id {0}")]
    NotFound(i64),

    #[error("Something went wrong while generating code")]
    Generation(#[source] anyhow::Error),

    #[error("Failed to generate suggestion")]
    Suggestion(#[source] anyhow::Error),

    #[error("Failed to update workspace")]
    Storage(#[source] anyhow::Error),

    #[error("Failed to copy")]
    Clipboard(#[source] anyhow::Error),

    #[error("Failed to download file")]
    Export(#[source] anyhow::Error),
}

impl WorkspaceError {
    /// Caller-side validation failures, as opposed to faults of a collaborator.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Validation
                | Self::NothingToSave
                | Self::NothingToCopy
                | Self::NothingToExport
                | Self::NoSuggestion
                | Self::NotFound(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, WorkspaceError>;

type Clock = Box<dyn Fn() -> DateTime<Local> + Send + Sync>;

/// One session over the user's workspace.
///
/// Owns the working state and the cached saved collection. The repository is
/// only reached through these operations, and every mutation rewrites the
/// whole collection. `&mut self` on the async operations keeps a second
/// generation from starting while one is in flight.
pub struct Workspace {
    repository: Arc<dyn ComponentRepository>,
    gateway: Arc<dyn AiGateway>,
    clock: Clock,
    saved: Vec<SavedComponent>,
    state: WorkingState,
    phase: Phase,
}

impl Workspace {
    pub async fn open(repository: Arc<dyn ComponentRepository>, gateway: Arc<dyn AiGateway>) -> Self {
        let saved = repository.load().await;
        tracing::info!(count = saved.len(), "opened workspace");
        Self {
            repository,
            gateway,
            clock: Box::new(Local::now),
            saved,
            state: WorkingState::default(),
            phase: Phase::Idle,
        }
    }

    #[cfg(test)]
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Local> + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn state(&self) -> &WorkingState {
        &self.state
    }

    /// Saved components, newest first.
    pub fn saved(&self) -> &[SavedComponent] {
        &self.saved
    }

    pub fn find(&self, id: i64) -> Option<&SavedComponent> {
        self.saved.iter().find(|c| c.id == id)
    }

    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.state.prompt = prompt.into();
    }

    pub fn set_framework(&mut self, framework: Framework) {
        self.state.framework = framework;
    }

    /// Editor update of the code buffer.
    pub fn set_code(&mut self, code: impl Into<String>) {
        self.state.code = code.into();
        if self.phase == Phase::Idle {
            self.phase = Phase::Ready;
        }
    }

    /// Ask the model for a component matching `description`.
    ///
    /// An empty description fails before any model call. On failure no
    /// partial result is kept and the previous code buffer, if any, stays.
    pub async fn generate(&mut self, description: &str, framework: Framework) -> Result<&str> {
        self.state.prompt = description.to_string();
        self.state.framework = framework;
        if description.trim().is_empty() {
            return Err(WorkspaceError::Validation);
        }

        let resting = self.resting_phase();
        self.phase = Phase::Generating;
        let prompt = build_generation_prompt(description, framework);

        match self.gateway.generate(&prompt).await {
            Ok(raw) => {
                self.state.code = extract_code(&raw);
                self.phase = Phase::Ready;
                tracing::info!(framework = %framework, code_len = self.state.code.len(), "component generated");
                Ok(&self.state.code)
            }
            Err(e) => {
                tracing::error!(error = %e, "code generation failed");
                self.phase = resting;
                Err(WorkspaceError::Generation(e))
            }
        }
    }

    /// Ask the model to enrich the current prompt. The result is held as a
    /// pending suggestion.
    pub async fn suggest(&mut self) -> Result<&str> {
        if self.state.prompt.trim().is_empty() {
            return Err(WorkspaceError::Validation);
        }

        let prompt = build_suggestion_prompt(&self.state.prompt);
        match self.gateway.generate(&prompt).await {
            Ok(text) => {
                let suggestion = self.state.suggestion.insert(text.trim().to_string());
                Ok(suggestion.as_str())
            }
            Err(e) => {
                tracing::error!(error = %e, "prompt suggestion failed");
                Err(WorkspaceError::Suggestion(e))
            }
        }
    }

    /// Replace the prompt with the pending suggestion.
    pub fn accept_suggestion(&mut self) -> Result<&str> {
        let suggestion = self.state.suggestion.take().ok_or(WorkspaceError::NoSuggestion)?;
        self.state.prompt = suggestion;
        Ok(&self.state.prompt)
    }

    pub fn dismiss_suggestion(&mut self) {
        self.state.suggestion = None;
    }

    /// Record the current component at the front of the saved collection.
    pub async fn save(&mut self) -> Result<&SavedComponent> {
        if self.state.code.trim().is_empty() {
            return Err(WorkspaceError::NothingToSave);
        }

        let created = (self.clock)();
        let mut id = created.timestamp_millis();
        if let Some(newest) = self.saved.first() {
            if id < newest.id {
                id = newest.id.saturating_add(1);
            }
        }

        let component = SavedComponent::new(id, &self.state.prompt, &self.state.code, self.state.framework, created);
        let mut updated = Vec::with_capacity(self.saved.len() + 1);
        updated.push(component);
        updated.extend(self.saved.iter().cloned());

        self.repository
            .save(&updated)
            .await
            .map_err(WorkspaceError::Storage)?;
        self.saved = updated;

        let saved = &self.saved[0];
        tracing::info!(id = saved.id, name = %saved.name, "component saved");
        Ok(saved)
    }

    /// Make a saved component the current one.
    pub fn load(&mut self, id: i64) -> Result<&WorkingState> {
        let component = self.find(id).ok_or(WorkspaceError::NotFound(id))?;
        let (prompt, code, framework) = (component.prompt.clone(), component.code.clone(), component.framework());

        self.state.prompt = prompt;
        self.state.code = code;
        self.state.framework = framework;
        self.phase = Phase::Ready;
        tracing::info!(id, "component loaded");
        Ok(&self.state)
    }

    /// Remove a saved component. The working state is left alone even when it
    /// was loaded from that component.
    pub async fn delete(&mut self, id: i64) -> Result<()> {
        if self.find(id).is_none() {
            return Err(WorkspaceError::NotFound(id));
        }

        let updated: Vec<SavedComponent> = self.saved.iter().filter(|c| c.id != id).cloned().collect();
        self.repository
            .save(&updated)
            .await
            .map_err(WorkspaceError::Storage)?;
        self.saved = updated;

        tracing::info!(id, remaining = self.saved.len(), "component deleted");
        Ok(())
    }

    pub async fn copy(&self, clipboard: &dyn Clipboard) -> Result<()> {
        if self.state.code.trim().is_empty() {
            return Err(WorkspaceError::NothingToCopy);
        }
        clipboard.copy(&self.state.code).await.map_err(|e| {
            tracing::error!(error = %e, "failed to copy code");
            WorkspaceError::Clipboard(e)
        })
    }

    pub async fn export(&self, dir: &Path) -> Result<PathBuf> {
        if self.state.code.trim().is_empty() {
            return Err(WorkspaceError::NothingToExport);
        }
        export_code(&self.state.code, dir).await.map_err(|e| {
            tracing::error!(error = %e, "failed to export code");
            WorkspaceError::Export(e)
        })
    }

    fn resting_phase(&self) -> Phase {
        if self.state.code.is_empty() { Phase::Idle } else { Phase::Ready }
    }
}
