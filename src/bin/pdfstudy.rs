//! CLI binary for edgequake-pdfstudy.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `AssistantConfig`, keeps one `Session`, and prints answers.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_pdfstudy::{
    resolve_input, AssistantConfig, Dispatcher, Notice, Outcome, QuickAction, Session, StudyError,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

/// A steady-ticking spinner on stderr, or `None` when progress is off.
fn spinner(enabled: bool, prefix: &'static str, msg: String) -> Option<ProgressBar> {
    if !enabled {
        return None;
    }
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS),
    );
    bar.set_prefix(prefix);
    bar.set_message(msg);
    bar.enable_steady_tick(Duration::from_millis(80));
    Some(bar)
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Flashcards from a local file
  pdfstudy apuntes.pdf --action flashcards

  # Ask a question (typed text wins over --action)
  pdfstudy apuntes.pdf --ask "¿Qué es la fotosíntesis?"

  # Study a PDF from a URL interactively
  pdfstudy https://example.org/tema1.pdf --interactive

  # Dump the extracted text (no API key needed)
  pdfstudy --print-text apuntes.pdf

  # JSON answer record
  pdfstudy apuntes.pdf --action summary --json > resumen.json

QUICK ACTIONS:
  summary      Structured summary with the 5 most important points
  key-ideas    The 10 most important ideas, one line each
  flashcards   5 flashcards: 'Concepto: ... | Definición: ...'

INTERACTIVE COMMANDS:
  :summary  :key-ideas  :flashcards   run a quick action
  :open <path|url>                    study another document
  :key <api key>                      set the Google API key
  :info                               show the current document
  :help                               list commands
  :quit                               leave
  anything else                       ask a question about the document

ENVIRONMENT VARIABLES:
  GOOGLE_API_KEY            Google AI Studio API key
  PDFSTUDY_MODEL            Override model ID (default gemini-2.5-flash)
  PDFSTUDY_ENDPOINT         Override the Gemini REST base URL
  RUST_LOG                  Override log filter (e.g. edgequake_pdfstudy=debug)

SETUP:
  1. Get a key at https://aistudio.google.com/apikey
  2. export GOOGLE_API_KEY=...
  3. pdfstudy apuntes.pdf --interactive
"#;

/// Study PDF documents with a Gemini tutor that only reads the document.
#[derive(Parser, Debug)]
#[command(
    name = "pdfstudy",
    version,
    about = "Ask questions about a PDF and get answers grounded in its text",
    long_about = "Extract the text of a PDF (local file or URL) and ask Google Gemini for \
summaries, key ideas, flashcards or free-form answers. The model is instructed to use only \
the document's text; every request is a single, self-contained call.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL.
    input: Option<String>,

    /// Quick action to run on the document.
    #[arg(short, long, env = "PDFSTUDY_ACTION", value_enum)]
    action: Option<ActionArg>,

    /// Free-form question; takes precedence over --action.
    #[arg(long)]
    ask: Option<String>,

    /// Read requests from stdin until :quit or end of input.
    #[arg(short, long)]
    interactive: bool,

    /// Google AI Studio API key.
    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Gemini model ID (e.g. gemini-2.5-flash, gemini-2.5-pro).
    #[arg(long, env = "PDFSTUDY_MODEL")]
    model: Option<String>,

    /// Gemini REST base URL.
    #[arg(long, env = "PDFSTUDY_ENDPOINT")]
    endpoint: Option<String>,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "PDFSTUDY_TEMPERATURE", default_value_t = 0.3)]
    temperature: f32,

    /// Max LLM output tokens per answer (provider default when unset).
    #[arg(long, env = "PDFSTUDY_MAX_TOKENS")]
    max_tokens: Option<u32>,

    /// LLM call timeout in seconds.
    #[arg(long, env = "PDFSTUDY_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "PDFSTUDY_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Refuse documents longer than this many characters (0 disables).
    #[arg(long, env = "PDFSTUDY_MAX_DOCUMENT_CHARS", default_value_t = 3_500_000)]
    max_document_chars: usize,

    /// Keep up to this many earlier documents cached for `:open` (0 = only the current one).
    #[arg(long, env = "PDFSTUDY_CACHE_CAPACITY", default_value_t = 0)]
    cache_capacity: usize,

    /// Text file with a custom prompt; must contain {documento} and {peticion}.
    #[arg(long, env = "PDFSTUDY_PROMPT_TEMPLATE")]
    prompt_template: Option<PathBuf>,

    /// Print the extracted text and exit (no model call).
    #[arg(long)]
    print_text: bool,

    /// Output the answer record as JSON instead of plain text.
    #[arg(long, env = "PDFSTUDY_JSON")]
    json: bool,

    /// Disable spinners.
    #[arg(long, env = "PDFSTUDY_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDFSTUDY_VERBOSE")]
    verbose: bool,

    /// Suppress all output except answers and errors.
    #[arg(short, long, env = "PDFSTUDY_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ActionArg {
    Summary,
    KeyIdeas,
    Flashcards,
}

impl From<ActionArg> for QuickAction {
    fn from(v: ActionArg) -> Self {
        match v {
            ActionArg::Summary => QuickAction::Summary,
            ActionArg::KeyIdeas => QuickAction::KeyIdeas,
            ActionArg::Flashcards => QuickAction::Flashcards,
        }
    }
}

/// Everything the command loop needs, borrowed from `main`.
struct App {
    config: AssistantConfig,
    session: Session,
    dispatcher: Dispatcher,
    json: bool,
    quiet: bool,
    show_progress: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Spinners provide the feedback that matters; keep INFO logs from
    // tearing through them.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    if cli.input.is_none() && !cli.interactive {
        anyhow::bail!("No input document. Pass a PDF path or URL, or use --interactive.");
    }
    if cli.input.is_some() && !cli.interactive && !cli.print_text
        && cli.action.is_none() && cli.ask.is_none()
    {
        anyhow::bail!("Nothing to ask. Pass --action, --ask or --interactive.");
    }

    // ── Build config ─────────────────────────────────────────────────────
    let config = build_config(&cli).await?;
    let mut session = Session::new(&config);
    if let Some(ref key) = cli.api_key {
        session.set_credential(key.clone());
    }
    let dispatcher = Dispatcher::new(&config).context("Failed to create model client")?;

    let mut app = App {
        config,
        session,
        dispatcher,
        json: cli.json,
        quiet: cli.quiet,
        show_progress,
    };

    if let Some(ref input) = cli.input {
        if let Err(e) = app.open(input).await {
            if !cli.interactive {
                return Err(e);
            }
            report_open_error(&e);
        }
    }

    // ── Print-text mode ──────────────────────────────────────────────────
    if cli.print_text {
        let document = app
            .session
            .document()
            .context("No document to print")?;
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(document.text().as_bytes())
            .context("Failed to write to stdout")?;
        return Ok(ExitCode::SUCCESS);
    }

    if cli.interactive {
        app.repl().await?;
        return Ok(ExitCode::SUCCESS);
    }

    // ── One-shot mode ────────────────────────────────────────────────────
    let outcome = app
        .ask(cli.action.map(QuickAction::from), cli.ask.as_deref())
        .await;
    app.print_outcome(&outcome)?;

    Ok(match outcome {
        Outcome::Answered(_) => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    })
}

impl App {
    /// Resolve `input` and make it the session's document.
    async fn open(&mut self, input: &str) -> Result<()> {
        let bar = spinner(self.show_progress, "Reading", input.to_string());

        let upload = resolve_input(input, self.config.download_timeout_secs).await;
        // extraction is CPU-bound and synchronous
        let result = upload
            .map_err(anyhow::Error::from)
            .and_then(|upload| {
                tokio::task::block_in_place(|| self.session.upload(upload))
                    .map(|doc| (doc.name.clone(), doc.page_count(), doc.char_count(), doc.is_empty()))
                    .map_err(anyhow::Error::from)
            });

        if let Some(bar) = bar {
            bar.finish_and_clear();
        }

        let (name, pages, chars, empty) =
            result.with_context(|| format!("Failed to open '{}'", input))?;

        if !self.quiet {
            eprintln!(
                "{} {}  {}  {}",
                green("✔"),
                bold(&name),
                dim(&format!("{pages} pages")),
                dim(&format!("{chars} chars")),
            );
            if empty {
                eprintln!("{} {}", cyan("⚠"), Notice::EmptyDocument);
            }
        }
        Ok(())
    }

    /// Run one cycle with a spinner while the model works.
    async fn ask(&self, canned: Option<QuickAction>, freeform: Option<&str>) -> Outcome {
        let label = match (freeform, canned) {
            (Some(q), _) if !q.trim().is_empty() => "question".to_string(),
            (_, Some(action)) => action.label().to_lowercase(),
            _ => String::new(),
        };
        let ready = self.session.document().is_some() && self.session.credential().is_some();
        let bar = spinner(
            self.show_progress && ready && !label.is_empty(),
            "Thinking",
            format!("{} with {}", label, self.config.model),
        );

        let outcome = self.dispatcher.dispatch(&self.session, canned, freeform).await;

        if let Some(bar) = bar {
            bar.finish_and_clear();
        }
        outcome
    }

    fn print_outcome(&self, outcome: &Outcome) -> Result<()> {
        if self.json {
            let json =
                serde_json::to_string_pretty(outcome).context("Failed to serialise outcome")?;
            println!("{json}");
            return Ok(());
        }

        match outcome {
            Outcome::Idle => {}
            Outcome::Answered(answer) => {
                for warning in &answer.warnings {
                    eprintln!("{} {}", cyan("⚠"), warning);
                }
                write_response(&mut io::stdout().lock(), &answer.response)?;
                if !self.quiet {
                    eprintln!("{}", dim(&format!("{}ms", answer.duration_ms)));
                }
            }
            Outcome::Notice(notice) => {
                eprintln!("{} {}", red("✗"), notice);
            }
        }
        Ok(())
    }

    /// Line-oriented study loop over stdin.
    async fn repl(&mut self) -> Result<()> {
        if !self.quiet {
            eprintln!(
                "{} {}",
                cyan("◆"),
                bold("Type a question, or :help for commands.")
            );
            if self.session.credential().is_none() {
                eprintln!("{} {}", cyan("⚠"), Notice::MissingCredential);
            }
        }

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            if !self.quiet {
                eprint!("{} ", cyan("›"));
                io::stderr().flush().ok();
            }
            let Some(line) = lines.next_line().await.context("Failed to read stdin")? else {
                break;
            };

            match Command::parse(&line) {
                Command::Empty => continue,
                Command::Quit => break,
                Command::Help => eprintln!("{}", AFTER_HELP_COMMANDS),
                Command::Info => self.print_info(),
                Command::Key(key) => {
                    self.session.set_credential(key);
                    if self.session.credential().is_some() {
                        eprintln!("{} API key set", green("✔"));
                    } else {
                        eprintln!("{} API key cleared", cyan("⚠"));
                    }
                }
                Command::Open(input) => {
                    if let Err(e) = self.open(&input).await {
                        report_open_error(&e);
                    }
                }
                Command::Action(action) => {
                    let outcome = self.ask(Some(action), None).await;
                    self.print_outcome(&outcome)?;
                }
                Command::Ask(text) => {
                    let outcome = self.ask(None, Some(&text)).await;
                    self.print_outcome(&outcome)?;
                }
                Command::Unknown(cmd) => {
                    eprintln!("{} unknown command ':{}' (try :help)", red("✗"), cmd);
                }
            }
        }
        Ok(())
    }

    fn print_info(&self) {
        match self.session.document() {
            Some(doc) => {
                eprintln!("Document:   {}", doc.name);
                eprintln!("Identity:   {}", doc.id);
                eprintln!("Pages:      {}", doc.page_count());
                eprintln!("Characters: {}", doc.char_count());
                if !doc.empty_pages().is_empty() {
                    eprintln!("No text on: {:?}", doc.empty_pages());
                }
            }
            None => eprintln!("{}", Notice::NoDocument),
        }
        eprintln!("Model:      {}", self.config.model);
        eprintln!(
            "API key:    {}",
            if self.session.credential().is_some() { "set" } else { "missing" }
        );
    }
}

/// Write a response followed by exactly one trailing newline.
fn write_response(out: &mut impl Write, response: &str) -> Result<()> {
    out.write_all(response.as_bytes())
        .context("Failed to write to stdout")?;
    if !response.ends_with('\n') {
        out.write_all(b"\n").context("Failed to write to stdout")?;
    }
    out.flush().context("Failed to write to stdout")
}

/// Show a failed upload as its notice, with the underlying error dimmed.
fn report_open_error(e: &anyhow::Error) {
    match e.downcast_ref::<StudyError>() {
        Some(err) => {
            eprintln!("{} {}", red("✗"), Notice::from_upload_error(err));
            eprintln!("{}", dim(&err.to_string()));
        }
        None => eprintln!("{} {:#}", red("✗"), e),
    }
}

const AFTER_HELP_COMMANDS: &str = "\
  :summary  :key-ideas  :flashcards   run a quick action
  :open <path|url>                    study another document
  :key <api key>                      set the Google API key
  :info                               show the current document
  :quit                               leave
  anything else                       ask a question about the document";

/// One line of interactive input.
#[derive(Debug, PartialEq)]
enum Command {
    Empty,
    Quit,
    Help,
    Info,
    Key(String),
    Open(String),
    Action(QuickAction),
    Ask(String),
    Unknown(String),
}

impl Command {
    fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Command::Empty;
        }
        let Some(rest) = trimmed.strip_prefix(':') else {
            return Command::Ask(line.trim_end_matches(['\r', '\n']).to_string());
        };
        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };
        match name {
            "q" | "quit" | "exit" => Command::Quit,
            "h" | "help" => Command::Help,
            "info" => Command::Info,
            "key" => Command::Key(arg.to_string()),
            "open" if !arg.is_empty() => Command::Open(arg.to_string()),
            "ideas" => Command::Action(QuickAction::KeyIdeas),
            other => match QuickAction::from_id(other) {
                Some(action) => Command::Action(action),
                None => Command::Unknown(other.to_string()),
            },
        }
    }
}

/// Map CLI args to `AssistantConfig`.
async fn build_config(cli: &Cli) -> Result<AssistantConfig> {
    let mut builder = AssistantConfig::builder()
        .temperature(cli.temperature)
        .api_timeout_secs(cli.api_timeout)
        .download_timeout_secs(cli.download_timeout)
        .cache_capacity(cli.cache_capacity)
        .max_document_chars((cli.max_document_chars > 0).then_some(cli.max_document_chars));

    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref endpoint) = cli.endpoint {
        builder = builder.endpoint(endpoint.clone());
    }
    if let Some(n) = cli.max_tokens {
        builder = builder.max_output_tokens(n);
    }
    if let Some(ref path) = cli.prompt_template {
        let template = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read prompt template from {:?}", path))?;
        builder = builder.prompt_template(template);
    }

    builder.build().context("Invalid configuration")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_a_question() {
        assert_eq!(
            Command::parse("¿Qué es un mamífero?\n"),
            Command::Ask("¿Qué es un mamífero?".into())
        );
    }

    #[test]
    fn quick_action_commands() {
        assert_eq!(Command::parse(":flashcards"), Command::Action(QuickAction::Flashcards));
        assert_eq!(Command::parse(":key-ideas"), Command::Action(QuickAction::KeyIdeas));
        assert_eq!(Command::parse(":ideas"), Command::Action(QuickAction::KeyIdeas));
        assert_eq!(Command::parse(" :summary "), Command::Action(QuickAction::Summary));
    }

    #[test]
    fn commands_with_arguments() {
        assert_eq!(Command::parse(":open  tema 2.pdf"), Command::Open("tema 2.pdf".into()));
        assert_eq!(Command::parse(":key abc"), Command::Key("abc".into()));
        assert_eq!(Command::parse(":key"), Command::Key(String::new()));
        assert_eq!(Command::parse(":open"), Command::Unknown("open".into()));
    }

    #[test]
    fn quit_and_blank() {
        assert_eq!(Command::parse(":q"), Command::Quit);
        assert_eq!(Command::parse("   "), Command::Empty);
    }

    /// Accepts `limit` bytes, then fails every write.
    struct FullPipe {
        written: Vec<u8>,
        limit: usize,
    }

    impl Write for FullPipe {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.written.len() + buf.len() > self.limit {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"));
            }
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn response_gets_one_trailing_newline() {
        let mut out = Vec::new();
        write_response(&mut out, "Concepto: Gato").unwrap();
        write_response(&mut out, "Concepto: Perro\n").unwrap();
        assert_eq!(out, b"Concepto: Gato\nConcepto: Perro\n");
    }

    #[test]
    fn failed_trailing_newline_is_an_error() {
        let mut out = FullPipe {
            written: Vec::new(),
            limit: 4,
        };
        let err = write_response(&mut out, "Gato").unwrap_err();
        assert_eq!(out.written, b"Gato");
        assert!(err.to_string().contains("stdout"), "got {err:#}");
    }

    #[test]
    fn cli_parses_one_shot() {
        let cli = Cli::try_parse_from([
            "pdfstudy",
            "apuntes.pdf",
            "--action",
            "key-ideas",
            "--max-document-chars",
            "0",
        ])
        .unwrap();
        assert!(matches!(cli.action, Some(ActionArg::KeyIdeas)));
        assert_eq!(cli.max_document_chars, 0);
    }
}
