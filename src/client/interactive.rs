use color_eyre::eyre::{Context, OptionExt, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};

use crate::client::app::{AppPhase, ClientApp};
use crate::client::login::PendingLogin;
use crate::models::{PlaylistConcept, ResolvedTrack, SavedPlaylist};

pub const PROMPT_SUGGESTIONS: [&str; 5] = [
    "Upbeat songs for a morning workout",
    "Chill indie tracks for studying",
    "Nostalgic 90s hits for a road trip",
    "Relaxing jazz for a quiet evening",
    "Energetic electronic music for coding",
];

const HELP: &str = "Commands: :save  :new  :logout  :quit  :help";

/// What `login` needs to build the authorize URL
#[derive(Debug, Clone)]
pub struct LoginSettings {
    pub client_id: String,
    pub redirect_uri: String,
}

#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Save,
    New,
    Logout,
    Quit,
    Help,
    Prompt(&'a str),
}

fn parse_command(line: &str) -> Command<'_> {
    match line.trim() {
        ":save" | ":s" => Command::Save,
        ":new" | ":n" => Command::New,
        ":logout" => Command::Logout,
        ":quit" | ":q" | ":exit" => Command::Quit,
        ":help" | ":h" | "?" => Command::Help,
        other => Command::Prompt(other),
    }
}

/// A bare number picks one of the suggestions
fn expand_suggestion(prompt: &str) -> &str {
    prompt
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| PROMPT_SUGGESTIONS.get(i).copied())
        .unwrap_or(prompt)
}

async fn read_line<R: AsyncBufRead + Unpin>(lines: &mut Lines<R>) -> Result<Option<String>> {
    lines.next_line().await.wrap_err("Failed to read from stdin")
}

/// Walk the user through the authorization-code flow on the terminal.
pub async fn login<R: AsyncBufRead + Unpin>(
    app: &mut ClientApp,
    settings: &LoginSettings,
    lines: &mut Lines<R>,
) -> Result<()> {
    let pending = PendingLogin::new(&settings.client_id, &settings.redirect_uri);
    tracing::debug!("Waiting for redirect with state {}", pending.state());

    println!("Open this URL in your browser and approve access:\n");
    println!("  {}\n", pending.auth_url);
    println!("Then paste the URL you were redirected to:");

    let redirect = read_line(lines)
        .await?
        .ok_or_eyre("No redirect URL given")?;
    let code = pending.code_from_redirect(&redirect)?;

    app.authenticate(&code, &pending.redirect_uri).await?;
    println!("Connected to Spotify.");
    Ok(())
}

pub fn print_concept(concept: &PlaylistConcept, tracks: &[ResolvedTrack]) {
    println!("\n{}", concept.title);
    println!("{}\n", concept.description);
    for (index, track) in tracks.iter().enumerate() {
        if track.is_found() {
            println!("{:>3}. {} - {}", index + 1, track.name, track.artist);
        } else {
            println!("{:>3}. {} (not found on Spotify)", index + 1, track.id);
        }
    }
    let found = tracks.iter().filter(|t| t.is_found()).count();
    println!("\n{}/{} tracks found", found, tracks.len());
}

pub fn print_saved(saved: &SavedPlaylist) {
    println!(
        "Saved {} tracks to {}",
        saved.tracks_added, saved.playlist_url
    );
}

fn print_message(app: &ClientApp) {
    if let Some(message) = app.message() {
        println!("{}", message);
    }
}

/// Message to show after a command. In `Auth` the login branch of the
/// loop shows it instead.
fn outcome_message<'a>(phase: &AppPhase, message: Option<&'a str>) -> Option<&'a str> {
    match phase {
        AppPhase::Auth => None,
        _ => message,
    }
}

fn print_suggestions() {
    println!("Describe a mood, vibe or activity, or pick a suggestion:");
    for (index, suggestion) in PROMPT_SUGGESTIONS.iter().enumerate() {
        println!("  {}. {}", index + 1, suggestion);
    }
}

/// Line-driven loop over the whole client state machine
pub async fn run<R: AsyncBufRead + Unpin>(
    app: &mut ClientApp,
    settings: Option<&LoginSettings>,
    lines: &mut Lines<R>,
) -> Result<()> {
    app.restore_session().await?;
    println!("{}", HELP);

    loop {
        if *app.phase() == AppPhase::Auth {
            print_message(app);
            let settings = settings
                .ok_or_eyre("Not logged in and no Spotify client id configured")?;
            if let Err(e) = login(app, settings, lines).await {
                println!("Login failed: {:#}", e);
                println!("Press enter to try again, or :quit");
                match read_line(lines).await? {
                    Some(line) if parse_command(&line) == Command::Quit => return Ok(()),
                    Some(_) => continue,
                    None => return Ok(()),
                }
            }
            print_suggestions();
        }

        let Some(line) = read_line(lines).await? else {
            return Ok(());
        };

        match parse_command(&line) {
            Command::Quit => return Ok(()),
            Command::Help => println!("{}", HELP),
            Command::Logout => {
                app.disconnect()?;
                println!("Disconnected from Spotify.");
            }
            Command::New => {
                app.new_playlist();
                print_suggestions();
            }
            Command::Save if app.saved().is_some() => {
                if let Some(saved) = app.saved() {
                    println!("Already saved to {}", saved.playlist_url);
                }
            }
            Command::Save => match app.save_to_spotify().await {
                Ok(saved) => {
                    print_saved(&saved);
                    print_message(app);
                }
                Err(e) => {
                    tracing::debug!("Save failed: {:#}", e);
                    if *app.phase() != AppPhase::Auth {
                        match app.message() {
                            Some(message) => println!("{}", message),
                            None => println!("{}", e),
                        }
                    }
                }
            },
            Command::Prompt(prompt) => {
                if matches!(app.phase(), AppPhase::Result { .. }) {
                    app.new_playlist();
                }
                let prompt = expand_suggestion(prompt);
                if !prompt.is_empty() {
                    println!("Generating a playlist for \"{}\"...", prompt);
                }
                app.submit_prompt(prompt).await?;

                match app.phase() {
                    AppPhase::Result { concept, tracks } => {
                        print_concept(concept, tracks);
                        println!("\n:save to add it to Spotify, :new to start over");
                    }
                    phase => {
                        if let Some(message) = outcome_message(phase, app.message()) {
                            println!("{}", message);
                        }
                    }
                }
            }
        }
    }
}
