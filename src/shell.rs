//! Interactive session: one line per command, driving a [`Workspace`].

use std::io::Write;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::clipboard::Clipboard;
use crate::component::{Framework, SavedComponent, UnknownFramework};
use crate::debounce::{Debouncer, EDITOR_QUIET_PERIOD};
use crate::editor::EditorFile;
use crate::preview::{DEFAULT_PREVIEW_PORT, PreviewServer, PreviewState};
use crate::workspace::{Phase, Workspace, WorkspaceError};

const HELP: &str = "\
Commands:
  framework [id]     show or pick the target framework
  prompt <text>      set the component description
  generate [text]    generate code (optionally setting the description)
  suggest            ask for an enhanced description
  use | dismiss      accept or drop the suggested description
  show               print the current code
  edit <file>        edit the code in your own editor through <file>
  save               save the current component to the workspace
  list               list saved components
  load <id>          open a saved component
  delete <id>        delete a saved component
  copy               copy the code to the clipboard
  export [dir]       write Ideafy-Component.html
  preview [port]     serve the code on localhost
  help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Framework(Option<Framework>),
    Prompt(String),
    Generate(Option<String>),
    Suggest,
    Use,
    Dismiss,
    Show,
    Edit(PathBuf),
    Save,
    List,
    Load(i64),
    Delete(i64),
    Copy,
    Export(Option<PathBuf>),
    Preview(Option<u16>),
    Help,
    Quit,
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("unknown command '{0}' (type 'help')")]
    Unknown(String),

    #[error("'{0}' needs an argument")]
    MissingArgument(&'static str),

    #[error("'{0}' is not a component id")]
    InvalidId(String),

    #[error("'{0}' is not a port number")]
    InvalidPort(String),

    #[error(transparent)]
    Framework(#[from] UnknownFramework),
}

fn parse_id(arg: &str) -> Result<i64, CommandError> {
    arg.parse().map_err(|_| CommandError::InvalidId(arg.to_string()))
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        let arg = (!rest.is_empty()).then(|| rest.to_string());
        let required = |name: &'static str| arg.clone().ok_or(CommandError::MissingArgument(name));

        let command = match word.to_ascii_lowercase().as_str() {
            "framework" | "fw" => Command::Framework(arg.as_deref().map(str::parse::<Framework>).transpose()?),
            "prompt" => Command::Prompt(rest.to_string()),
            "generate" | "gen" => Command::Generate(arg),
            "suggest" => Command::Suggest,
            "use" => Command::Use,
            "dismiss" => Command::Dismiss,
            "show" => Command::Show,
            "edit" => Command::Edit(PathBuf::from(required("edit")?)),
            "save" => Command::Save,
            "list" | "ls" => Command::List,
            "load" | "open" => Command::Load(parse_id(&required("load")?)?),
            "delete" | "rm" => Command::Delete(parse_id(&required("delete")?)?),
            "copy" => Command::Copy,
            "export" | "download" => Command::Export(arg.map(PathBuf::from)),
            "preview" => Command::Preview(
                arg.map(|p| p.parse().map_err(|_| CommandError::InvalidPort(p.clone())))
                    .transpose()?,
            ),
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(command)
    }
}

/// One-line listing entry for a saved component.
pub fn summary_line(component: &SavedComponent) -> String {
    format!(
        "{:<14} {:<24} {:<22} {}",
        component.id, component.framework, component.timestamp, component.name
    )
}

fn notify_ok(message: impl AsRef<str>) {
    println!("✔ {}", message.as_ref());
}

fn notify_err(err: &WorkspaceError) {
    if err.is_validation() {
        println!("! {err}");
    } else {
        println!("✘ {err}");
    }
}

pub struct Session {
    workspace: Workspace,
    clipboard: Arc<dyn Clipboard>,
    export_dir: PathBuf,
    preview: Option<PreviewServer>,
    editor: Option<EditorFile>,
    editor_tx: mpsc::UnboundedSender<()>,
    editor_rx: mpsc::UnboundedReceiver<()>,
    debouncer: Debouncer<String>,
    /// Editor buffers whose quiet period has elapsed, waiting to reach the workspace.
    commit_rx: mpsc::UnboundedReceiver<String>,
}

impl Session {
    pub fn new(workspace: Workspace, clipboard: Arc<dyn Clipboard>, export_dir: PathBuf) -> Self {
        let (editor_tx, editor_rx) = mpsc::unbounded_channel::<()>();
        let (commit_tx, commit_rx) = mpsc::unbounded_channel::<String>();
        let debouncer = Debouncer::new(EDITOR_QUIET_PERIOD, move |code: String| {
            let _ = commit_tx.send(code);
        });

        Self {
            workspace,
            clipboard,
            export_dir,
            preview: None,
            editor: None,
            editor_tx,
            editor_rx,
            debouncer,
            commit_rx,
        }
    }

    pub async fn run(workspace: Workspace, clipboard: Arc<dyn Clipboard>, export_dir: PathBuf) -> Result<()> {
        let mut session = Session::new(workspace, clipboard, export_dir);

        println!("Ideafy: describe a component and generate it. Type 'help' for commands.");
        println!(
            "{} saved component(s) in your workspace. Framework: {}",
            session.workspace.saved().len(),
            session.workspace.state().framework.label()
        );
        show_prompt();

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else { break };
                    if line.trim().is_empty() {
                        show_prompt();
                        continue;
                    }
                    match line.parse::<Command>() {
                        Ok(Command::Quit) => break,
                        Ok(command) => session.handle(command).await,
                        Err(e) => println!("✘ {e}"),
                    }
                    show_prompt();
                }
                Some(()) = session.editor_rx.recv() => session.editor_changed().await,
                Some(code) = session.commit_rx.recv() => session.apply_commit(code).await,
            }
        }

        session.discard_pending();
        if let Some(preview) = session.preview.take() {
            preview.stop();
        }
        Ok(())
    }

    async fn apply_commit(&mut self, code: String) {
        self.workspace.set_code(code);
        self.refresh_preview().await;
        tracing::debug!("editor change committed");
    }

    /// Bring every outstanding editor change into the workspace now.
    async fn commit_pending(&mut self) {
        self.debouncer.flush();
        let mut committed = false;
        while let Ok(code) = self.commit_rx.try_recv() {
            self.workspace.set_code(code);
            committed = true;
        }
        if committed {
            self.refresh_preview().await;
            tracing::debug!("pending editor change committed");
        }
    }

    /// Drop outstanding editor changes, including ones already past the quiet period.
    fn discard_pending(&mut self) {
        self.debouncer.cancel();
        while self.commit_rx.try_recv().is_ok() {}
    }

    async fn handle(&mut self, command: Command) {
        let result = match command {
            Command::Framework(None) => {
                for fw in Framework::ALL {
                    let marker = if fw == self.workspace.state().framework { "*" } else { " " };
                    println!("{marker} {:<24} {}", fw.id(), fw.label());
                }
                Ok(())
            }
            Command::Framework(Some(fw)) => {
                self.workspace.set_framework(fw);
                notify_ok(format!("Framework set to {}", fw.label()));
                Ok(())
            }
            Command::Prompt(text) => {
                self.workspace.set_prompt(text);
                Ok(())
            }
            Command::Generate(text) => self.generate(text).await,
            Command::Suggest => {
                println!("Enhancing prompt...");
                self.workspace.suggest().await.map(|s| {
                    println!("AI-Enhanced Prompt:\n  {s}\n('use' to accept, 'dismiss' to drop)");
                })
            }
            Command::Use => self.workspace.accept_suggestion().map(|_| notify_ok("Prompt updated!")),
            Command::Dismiss => {
                self.workspace.dismiss_suggestion();
                Ok(())
            }
            Command::Show => {
                match self.workspace.phase() {
                    Phase::Idle => println!("Your code will appear here. Describe your component and generate it."),
                    _ => println!("{}", self.workspace.state().code),
                }
                Ok(())
            }
            Command::Edit(path) => {
                self.commit_pending().await;
                match EditorFile::open(&path, &self.workspace.state().code, self.editor_tx.clone()) {
                    Ok(editor) => {
                        if editor.contents() != self.workspace.state().code {
                            self.workspace.set_code(editor.contents());
                            self.refresh_preview().await;
                        }
                        notify_ok(format!("Editing {}; changes are picked up automatically", editor.path().display()));
                        self.editor = Some(editor);
                    }
                    Err(e) => println!("✘ Failed to open editor file: {e:#}"),
                }
                Ok(())
            }
            Command::Save => {
                self.commit_pending().await;
                self.workspace.save().await.map(|c| notify_ok(format!("Component saved! (id {})", c.id)))
            }
            Command::List => {
                let saved = self.workspace.saved();
                if saved.is_empty() {
                    println!("No components yet. Generate and save components to see them here.");
                } else {
                    println!("{} component(s) in your workspace", saved.len());
                    for component in saved {
                        println!("{}", summary_line(component));
                    }
                }
                Ok(())
            }
            Command::Load(id) => {
                self.discard_pending();
                let loaded = self.workspace.load(id).map(|_| ());
                if loaded.is_ok() {
                    notify_ok("Component loaded!");
                    self.sync_views().await;
                }
                loaded
            }
            Command::Delete(id) => self.workspace.delete(id).await.map(|_| notify_ok("Component deleted")),
            Command::Copy => {
                self.commit_pending().await;
                self.workspace
                    .copy(self.clipboard.as_ref())
                    .await
                    .map(|_| notify_ok("Code copied to clipboard"))
            }
            Command::Export(dir) => {
                self.commit_pending().await;
                let dir = dir.unwrap_or_else(|| self.export_dir.clone());
                self.workspace
                    .export(&dir)
                    .await
                    .map(|path| notify_ok(format!("File downloaded: {}", path.display())))
            }
            Command::Preview(port) => {
                self.open_preview(port.unwrap_or(DEFAULT_PREVIEW_PORT)).await;
                Ok(())
            }
            Command::Help => {
                println!("{HELP}");
                Ok(())
            }
            Command::Quit => Ok(()),
        };

        if let Err(e) = result {
            notify_err(&e);
        }
    }

    async fn generate(&mut self, text: Option<String>) -> Result<(), WorkspaceError> {
        self.commit_pending().await;
        let description = text.unwrap_or_else(|| self.workspace.state().prompt.clone());
        let framework = self.workspace.state().framework;
        if !description.trim().is_empty() {
            println!("Generating component...");
        }
        self.workspace.generate(&description, framework).await?;
        notify_ok("Component ready ('show', 'save', 'preview', 'export', 'copy')");
        self.sync_views().await;
        Ok(())
    }

    async fn editor_changed(&mut self) {
        let Some(editor) = self.editor.as_mut() else { return };
        match editor.read_change().await {
            Ok(Some(code)) => self.debouncer.push(code),
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "failed to read editor file"),
        }
    }

    async fn open_preview(&mut self, port: u16) {
        if let Some(preview) = &self.preview {
            println!("Preview already running at {}", preview.url());
            return;
        }
        let state = PreviewState::new(self.workspace.state().code.clone());
        match PreviewServer::spawn(port, state).await {
            Ok(server) => {
                notify_ok(format!("Live preview at {}", server.url()));
                self.preview = Some(server);
            }
            Err(e) => println!("✘ Failed to start preview: {e:#}"),
        }
    }

    async fn refresh_preview(&self) {
        if let Some(preview) = &self.preview {
            preview.state.update(&self.workspace.state().code).await;
        }
    }

    /// Push a new code buffer out to the editor file and the preview.
    async fn sync_views(&mut self) {
        self.refresh_preview().await;
        let code = self.workspace.state().code.clone();
        if let Some(editor) = self.editor.as_mut() {
            if let Err(e) = editor.sync(&code).await {
                tracing::warn!(error = %e, "failed to update editor file");
            }
        }
    }
}

fn show_prompt() {
    print!("ideafy> ");
    let _ = std::io::stdout().flush();
}
