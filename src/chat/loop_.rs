use super::assistant::{Assistant, Submission, CREDENTIAL_GUIDANCE};
use super::error::{AssistantError, ErrorKind};
use crate::config::{credential_from_env, Config, RevealConfig};
use crate::observability;
use crate::presenter::render::render_markdown;
use crate::presenter::terminal::InterruptGate;
use crate::presenter::{
    play, Notice, Prompter, Reveal, RevealOutcome, Screen, TerminalPrompter, TerminalScreen,
};
use crate::providers::{ConfiguredFactory, GenerationOptions};
use crate::session::SessionOptions;
use anyhow::Result;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const HELP: &str = "Commands:
  /reset    start a fresh session with the same API key
  /key      forget the API key and enter a new one
  /history  show this session's conversation again
  /help     show this help
  /quit     leave (also /exit)
Other input starting with / is rejected as an unknown command.
Start a message with // to send it with a single leading /.";

/// In-chat commands. Anything not starting with `/`, or starting with `//`,
/// is a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    Quit,
    Reset,
    Key,
    History,
    Help,
    Unknown(&'a str),
}

impl<'a> Command<'a> {
    pub fn parse(line: &'a str) -> Option<Self> {
        let line = line.trim();
        if !line.starts_with('/') || line.starts_with("//") {
            return None;
        }
        let name = line.split_whitespace().next().unwrap_or(line);
        Some(match name {
            "/quit" | "/exit" => Self::Quit,
            "/reset" => Self::Reset,
            "/key" => Self::Key,
            "/history" => Self::History,
            "/help" => Self::Help,
            other => Self::Unknown(other),
        })
    }
}

/// Wire config into an [`Assistant`] and run the chat on the terminal.
pub async fn run(config: Config) -> Result<()> {
    let observer = observability::create_observer(&config.observability);
    let factory = Arc::new(ConfiguredFactory::from_config(&config.provider));
    let options = SessionOptions {
        model: config.provider.resolved_model(),
        generation: GenerationOptions {
            temperature: config.provider.temperature,
            max_output_tokens: config.provider.max_output_tokens,
        },
        verify_on_start: config.session.verify_on_start,
    };

    tracing::info!(
        provider = %config.provider.name,
        model = %options.model,
        config = %config.config_path.display(),
        "Starting health assistant"
    );

    let mut assistant = Assistant::new(factory, options, observer);
    let interrupts = config
        .reveal
        .interruptible
        .then(InterruptGate::install);

    let mut prompter = TerminalPrompter::stdin();
    let mut screen = TerminalScreen::stdout();

    drive(
        &mut assistant,
        &mut prompter,
        &mut screen,
        &config.reveal,
        interrupts.as_ref(),
        credential_from_env(),
    )
    .await?;

    Ok(())
}

/// The interactive loop over any prompter/screen pair.
///
/// Prompts for a credential until a session exists, then reads one message at
/// a time: dispatch, wait for the full reply, reveal it, repeat. Returns when
/// the user quits or input ends.
pub async fn drive<P, S>(
    assistant: &mut Assistant,
    prompter: &mut P,
    screen: &mut S,
    reveal: &RevealConfig,
    interrupts: Option<&InterruptGate>,
    initial_credential: Option<String>,
) -> io::Result<()>
where
    P: Prompter + ?Sized,
    S: Screen + ?Sized,
{
    screen.banner()?;
    let mut pending = initial_credential;
    let mut guided = false;

    loop {
        if assistant.session().is_none() {
            let raw = match pending.take() {
                Some(raw) => raw,
                None => {
                    if !guided {
                        screen.notice(Notice::Warning, CREDENTIAL_GUIDANCE)?;
                        guided = true;
                    }
                    match prompter.read_credential()? {
                        Some(raw) => raw,
                        None => break,
                    }
                }
            };
            match assistant.connect(&raw).await {
                Ok(()) => screen.notice(
                    Notice::Success,
                    "Session started. Describe your symptoms to begin.",
                )?,
                Err(e) => report(screen, &e)?,
            }
            continue;
        }

        let Some(line) = prompter.read_message()? else {
            break;
        };

        match Command::parse(&line) {
            Some(Command::Quit) => break,
            Some(Command::Reset) => match assistant.initialize().await {
                Ok(()) => screen.notice(Notice::Success, "Started a fresh session.")?,
                Err(e) => report(screen, &e)?,
            },
            Some(Command::Key) => {
                assistant.clear_credential();
                screen.notice(Notice::Info, "API key cleared.")?;
                guided = false;
            }
            Some(Command::History) => {
                if assistant.transcript().is_empty() {
                    screen.notice(Notice::Info, "No messages yet.")?;
                }
                for turn in assistant.transcript().turns() {
                    screen.render_turn(turn)?;
                }
            }
            Some(Command::Help) => screen.notice(Notice::Info, HELP)?,
            Some(Command::Unknown(name)) => screen.notice(
                Notice::Warning,
                &format!("Unknown command {name}. Type /help for the list."),
            )?,
            None => exchange(assistant, screen, reveal, interrupts, message_text(&line)).await?,
        }
    }

    assistant.end_session();
    Ok(())
}

/// `//text` is sent as `/text`; everything else as typed.
fn message_text(line: &str) -> &str {
    let trimmed = line.trim_start();
    if trimmed.starts_with("//") {
        &trimmed[1..]
    } else {
        line
    }
}

async fn exchange<S: Screen + ?Sized>(
    assistant: &mut Assistant,
    screen: &mut S,
    reveal: &RevealConfig,
    interrupts: Option<&InterruptGate>,
    line: &str,
) -> io::Result<()> {
    let busy = !line.trim().is_empty();
    if busy {
        screen.thinking()?;
    }
    let result = assistant.submit(line).await;
    if busy {
        screen.clear_thinking()?;
    }

    match result {
        Ok(Submission::Ignored) => Ok(()),
        Ok(Submission::Replied(reply)) => present_reply(screen, reveal, interrupts, &reply).await,
        Err(e) => report(screen, &e),
    }
}

async fn present_reply<S: Screen + ?Sized>(
    screen: &mut S,
    config: &RevealConfig,
    interrupts: Option<&InterruptGate>,
    reply: &str,
) -> io::Result<()> {
    screen.begin_reply()?;
    let spans = render_markdown(reply);

    if !config.enabled {
        let mut reveal = Reveal::new(&spans, Duration::ZERO);
        screen.start()?;
        return screen.finish(reveal.drain());
    }

    let reveal = Reveal::new(&spans, Duration::from_millis(config.char_delay_ms));
    let cancel = interrupts.map_or_else(CancellationToken::new, InterruptGate::arm);
    let outcome = play(reveal, screen, &cancel).await;
    if let Some(gate) = interrupts {
        gate.disarm();
    }
    if outcome? == RevealOutcome::Skipped {
        tracing::debug!("Reveal skipped");
    }
    Ok(())
}

fn report<S: Screen + ?Sized>(screen: &mut S, error: &AssistantError) -> io::Result<()> {
    match error.kind() {
        ErrorKind::Configuration => screen.notice(Notice::Warning, &error.to_string()),
        ErrorKind::Initialization => {
            screen.notice(
                Notice::Error,
                &format!("Error initializing the AI model: {error}"),
            )?;
            screen.notice(Notice::Info, "Re-enter your API key to try again.")
        }
        ErrorKind::Dispatch => {
            let message = match error {
                AssistantError::NoSession => {
                    "Chat session not initialized. Please check your API key.".to_string()
                }
                other => format!("An error occurred: {other}"),
            };
            screen.notice(Notice::Error, &message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_not_a_command() {
        assert_eq!(Command::parse("I have a headache"), None);
        assert_eq!(Command::parse(""), None);
    }

    #[test]
    fn commands_parse_with_surrounding_whitespace() {
        assert_eq!(Command::parse("  /quit "), Some(Command::Quit));
        assert_eq!(Command::parse("/exit"), Some(Command::Quit));
        assert_eq!(Command::parse("/reset"), Some(Command::Reset));
        assert_eq!(Command::parse("/key"), Some(Command::Key));
        assert_eq!(Command::parse("/history"), Some(Command::History));
        assert_eq!(Command::parse("/help me"), Some(Command::Help));
    }

    #[test]
    fn double_slash_escapes_a_message() {
        assert_eq!(Command::parse("//quit is a word"), None);
        assert_eq!(message_text("  //quit is a word"), "/quit is a word");
        assert_eq!(message_text(" plain text "), " plain text ");
    }

    #[test]
    fn help_explains_slash_handling() {
        assert!(HELP.contains("unknown command"));
        assert!(HELP.contains("//"));
    }

    #[test]
    fn unknown_commands_keep_their_name() {
        assert_eq!(Command::parse("/dance now"), Some(Command::Unknown("/dance")));
    }
}
