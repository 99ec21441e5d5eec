use crate::{
    config::{ModelConfig, BASE_URL_ENV, MODEL_ENV},
    core::AnswerGenerator,
    Agent, AgentError,
};
use clap::{Arg, Command};
use std::{io::Write, time::Duration};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[cfg(unix)]
type InterruptStream = tokio::signal::unix::Signal;
#[cfg(windows)]
type InterruptStream = tokio::signal::windows::CtrlC;

/// Token budget for every question
pub const MAX_TOKENS: u32 = 1000;
pub const PROMPT: &str = "Your question: ";

/// Why an interactive session stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// Empty line, `exit` or `quit`
    UserExit,
    /// Ctrl-C while waiting for a question
    Interrupted,
    /// Input stream closed
    EndOfInput,
}

/// Empty input and `exit` / `quit` in any case end the session
pub fn is_exit_command(input: &str) -> bool {
    let input = input.trim();
    input.is_empty() || input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit")
}

/// Ctrl-C listener registered once per session, so an interrupt that lands
/// while no read or request is pending is still delivered on the next wait.
struct Interrupts(Option<InterruptStream>);

impl Interrupts {
    fn listen() -> Self {
        #[cfg(unix)]
        let stream = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt());
        #[cfg(windows)]
        let stream = tokio::signal::windows::ctrl_c();

        match stream {
            Ok(stream) => Self(Some(stream)),
            Err(err) => {
                warn!("Ctrl-C handling unavailable: {}", err);
                Self(None)
            }
        }
    }

    /// Resolves on the next interrupt; never resolves without a listener
    async fn recv(&mut self) {
        if let Some(stream) = self.0.as_mut() {
            if stream.recv().await.is_some() {
                return;
            }
            self.0 = None;
        }
        std::future::pending::<()>().await
    }
}

/// Interactive question/answer loop over any [`AnswerGenerator`]
pub struct Session<G> {
    generator: G,
    max_tokens: u32,
}

impl<G: AnswerGenerator> Session<G> {
    pub fn new(generator: G) -> Self {
        Self {
            generator,
            max_tokens: MAX_TOKENS,
        }
    }

    pub fn into_inner(self) -> G {
        self.generator
    }

    /// Read questions from `input` until the user leaves, printing answers
    /// to `output`. A failed question is reported and the loop keeps going.
    pub async fn run<R, W>(&self, mut input: R, output: &mut W) -> std::io::Result<SessionEnd>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        writeln!(
            output,
            "Welcome! Ask me questions (type 'exit' or 'quit' to stop).\n"
        )?;
        writeln!(
            output,
            "I can search the web for current information to answer your questions.\n"
        )?;

        let mut interrupts = Interrupts::listen();
        let mut buf = Vec::new();

        loop {
            write!(output, "{}", PROMPT)?;
            output.flush()?;

            buf.clear();
            let read = tokio::select! {
                read = input.read_until(b'\n', &mut buf) => read?,
                () = interrupts.recv() => {
                    writeln!(output, "\n\nGoodbye!")?;
                    return Ok(SessionEnd::Interrupted);
                }
            };

            if read == 0 {
                writeln!(output, "\n\nGoodbye!")?;
                return Ok(SessionEnd::EndOfInput);
            }

            // Undecodable bytes must not end the session
            let line = String::from_utf8_lossy(&buf);
            let question = line.trim();
            if is_exit_command(question) {
                writeln!(output, "Goodbye!")?;
                return Ok(SessionEnd::UserExit);
            }

            let outcome = tokio::select! {
                result = self.generator.generate(question, self.max_tokens) => result,
                () = interrupts.recv() => Err(AgentError::Interrupted),
            };

            match outcome {
                Ok(answer) => {
                    debug!(
                        iterations = answer.iterations,
                        tool_calls = answer.tool_call_count(),
                        "question answered"
                    );
                    debug!("{}", answer.replay());
                    writeln!(output, "\nAnswer: {}", answer.text)?;
                    writeln!(
                        output,
                        "(Response time: {:.2}s)\n",
                        answer.elapsed_seconds()
                    )?;
                }
                Err(err) => {
                    debug!(code = err.error_code(), "question failed");
                    writeln!(output, "\nError: {}\n", err)?;
                }
            }
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Startup overrides taken from the command line
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub timeout: Option<Duration>,
}

/// Build the agent from `lookup` and `options`, then run the session.
/// Configuration errors are returned before anything is written to `output`.
pub async fn run_with<F, R, W>(
    lookup: F,
    options: RunOptions,
    input: R,
    output: &mut W,
) -> Result<SessionEnd, Box<dyn std::error::Error>>
where
    F: Fn(&str) -> Option<String>,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut config = ModelConfig::from_lookup(lookup)?;
    if let Some(model) = options.model {
        config.model = model;
    }
    if let Some(base_url) = options.base_url {
        config.base_url = base_url;
    }

    let mut agent = Agent::with_web_search(config);
    if let Some(timeout) = options.timeout {
        agent = agent.with_timeout(timeout);
    }

    info!("Using model: {}", agent.model());
    info!("Base URL: {}", agent.base_url());

    let end = Session::new(agent).run(input, output).await?;
    info!("Session ended: {:?}", end);
    Ok(end)
}

/// CLI entry point
pub async fn run() -> Result<SessionEnd, Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();
    init_tracing();

    let matches = Command::new("web-search-agent")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Ask questions; the model may search the web to answer them")
        .arg(
            Arg::new("model")
                .short('m')
                .long("model")
                .value_name("MODEL")
                .env(MODEL_ENV)
                .help("Model id to request from the provider"),
        )
        .arg(
            Arg::new("base-url")
                .short('u')
                .long("base-url")
                .value_name("URL")
                .env(BASE_URL_ENV)
                .help("OpenAI-compatible base URL of the provider"),
        )
        .arg(
            Arg::new("timeout")
                .short('t')
                .long("timeout")
                .value_name("SECONDS")
                .value_parser(clap::value_parser!(u64))
                .help("Per-request timeout in seconds (no limit by default)"),
        )
        .get_matches();

    let options = RunOptions {
        model: matches.get_one::<String>("model").cloned(),
        base_url: matches.get_one::<String>("base-url").cloned(),
        timeout: matches.get_one::<u64>("timeout").map(|s| Duration::from_secs(*s)),
    };

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    run_with(|key| std::env::var(key).ok(), options, stdin, &mut stdout).await
}
