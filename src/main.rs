mod client;
mod config;
mod http_server;
mod llm;
mod logging;
mod models;
mod ports;
mod services;
mod spotify_rs;
#[cfg(test)]
mod test_utils;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::{
    Result,
    eyre::{Context, OptionExt, bail},
};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::{
    client::{
        app::{AppPhase, ClientApp},
        interactive::{self, LoginSettings},
        proxy_client::HttpPlaylistProxy,
    },
    config::Config,
    http_server::{
        app::{DEFAULT_ALLOWED_ORIGINS, HttpServerConfig},
        state::{AuthProxyState, GenerationProxyState},
    },
    llm::{LlmProvider, build_llm_client},
    ports::spotify::SpotifyClient,
    services::{
        playlist_generation::PlaylistGenerator,
        session::SessionStore,
        spotify::{
            account::SpotifyAccountService,
            client::{SpotifyApiAdapter, SpotifyApiCredentials},
        },
    },
};

const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:8888/callback";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The config file to use
    #[arg(short, long, env = "TUNESMITH_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Log filter, e.g. `info` or `tunesmith=debug,tower_http=info`
    /// (default: info for the proxies, warn for the client)
    #[arg(long, global = true, env = "LOG_LEVEL")]
    log_level: Option<String>,

    /// OTLP gRPC endpoint to export traces to
    #[arg(long, global = true, env = "OTLP_ENDPOINT")]
    otlp_endpoint: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Debug)]
struct ServerArgs {
    /// The port to run the server on
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// Origins allowed by CORS, comma separated. `*` allows any origin
    #[arg(long, env = "ALLOWED_ORIGINS", value_delimiter = ',', default_values = DEFAULT_ALLOWED_ORIGINS)]
    allowed_origins: Vec<String>,
}

#[derive(clap::Args, Debug)]
struct SpotifyServerArgs {
    #[arg(long, env = "SPOTIFY_CLIENT_ID")]
    spotify_client_id: Option<String>,

    #[arg(long, env = "SPOTIFY_CLIENT_SECRET", hide_env_values = true)]
    spotify_client_secret: Option<String>,

    /// Used when a token request doesn't carry its own redirect_uri
    #[arg(long, env = "SPOTIFY_REDIRECT_URI")]
    spotify_redirect_uri: Option<String>,
}

#[derive(clap::Args, Debug)]
struct LlmArgs {
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: Option<String>,

    /// Overrides the provider from the config file
    #[arg(long, value_enum)]
    provider: Option<LlmProvider>,

    /// Overrides the model from the config file
    #[arg(long)]
    model: Option<String>,
}

#[derive(clap::Args, Debug)]
struct LoginArgs {
    #[arg(long, env = "SPOTIFY_CLIENT_ID")]
    spotify_client_id: Option<String>,

    #[arg(long, env = "SPOTIFY_REDIRECT_URI")]
    spotify_redirect_uri: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run both proxies on one port
    Serve {
        #[command(flatten)]
        server: ServerArgs,
        #[command(flatten)]
        spotify: SpotifyServerArgs,
        #[command(flatten)]
        llm: LlmArgs,
    },
    /// Run the Spotify token exchange proxy
    AuthProxy {
        #[command(flatten)]
        server: ServerArgs,
        #[command(flatten)]
        spotify: SpotifyServerArgs,
    },
    /// Run the playlist generation proxy
    GenerateProxy {
        #[command(flatten)]
        server: ServerArgs,
        #[command(flatten)]
        llm: LlmArgs,
    },
    /// Connect a Spotify account
    Login {
        #[command(flatten)]
        login: LoginArgs,
    },
    /// Forget the cached Spotify session
    Logout,
    /// Generate a playlist for a single prompt
    Generate {
        /// What the playlist should be about
        #[arg(short, long)]
        prompt: String,

        /// Save the playlist to Spotify as well
        #[arg(short, long)]
        save: bool,
    },
    /// Interactive playlist session
    Interactive {
        #[command(flatten)]
        login: LoginArgs,
    },
    #[command(subcommand)]
    Config(ConfigCommands),
}

impl Commands {
    fn default_log_level(&self) -> &'static str {
        match self {
            Commands::Serve { .. } | Commands::AuthProxy { .. } | Commands::GenerateProxy { .. } => {
                "info"
            }
            _ => "warn",
        }
    }
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Create a default config file, if it doesn't exist
    CreateDefault,
    /// Print the path to the config file
    Path,
}

fn auth_state(spotify: SpotifyServerArgs, config: &Config) -> Result<Arc<AuthProxyState>> {
    let credentials =
        SpotifyApiCredentials::from_parts(spotify.spotify_client_id, spotify.spotify_client_secret);
    if credentials.is_none() {
        log::warn!("SPOTIFY_CLIENT_ID or SPOTIFY_CLIENT_SECRET not set, token requests will fail");
    }

    Ok(Arc::new(AuthProxyState {
        accounts: Arc::new(SpotifyAccountService::new(config.spotify.timeout()?)),
        spotify_credentials: credentials,
        default_redirect_uri: spotify
            .spotify_redirect_uri
            .or_else(|| config.spotify.redirect_uri.clone()),
    }))
}

fn generation_state(llm: LlmArgs, config: &Config) -> Result<Arc<GenerationProxyState>> {
    let mut llm_config = config.llm.clone();
    if let Some(provider) = llm.provider {
        llm_config.provider = provider;
    }
    if llm.model.is_some() {
        llm_config.model = llm.model;
    }

    let client = build_llm_client(&llm_config, llm.openai_api_key)
        .wrap_err("Failed to set up the language model")?;
    log::info!("Using {:?} for playlist generation", llm_config.provider);

    Ok(Arc::new(GenerationProxyState {
        generator: PlaylistGenerator::new(client, llm_config.temperature, llm_config.max_tokens),
    }))
}

fn client_app(config: &Config) -> Result<ClientApp> {
    let proxy = HttpPlaylistProxy::new(
        &config.proxy.auth_url,
        &config.proxy.generate_url,
        config.proxy.timeout()?,
    )?;
    let spotify_timeout = config.spotify.timeout()?;
    let sessions = SessionStore::new(config.session_path()?);
    log::debug!("Using session file {}", sessions.path().display());

    ClientApp::new(
        Arc::new(proxy),
        Box::new(move |access_token: &str| -> Arc<dyn SpotifyClient> {
            Arc::new(SpotifyApiAdapter::new(access_token.to_string(), spotify_timeout))
        }),
        sessions,
        config.spotify.resolve_concurrency,
    )
}

fn login_settings(login: LoginArgs, config: &Config) -> Option<LoginSettings> {
    let client_id = login
        .spotify_client_id
        .or_else(|| config.spotify.client_id.clone())
        .filter(|id| !id.is_empty())?;
    let redirect_uri = login
        .spotify_redirect_uri
        .or_else(|| config.spotify.redirect_uri.clone())
        .unwrap_or_else(|| DEFAULT_REDIRECT_URI.to_string());

    Some(LoginSettings {
        client_id,
        redirect_uri,
    })
}

async fn run(args: Args) -> Result<()> {
    log::debug!("Loading configuration");
    let config = {
        if let Some(config) = args.config {
            Config::from_file(&config)
        } else {
            Config::load()
        }
    }
    .wrap_err("Failed to load tunesmith config")?;

    match args.command {
        Commands::Serve {
            server,
            spotify,
            llm,
        } => {
            http_server::app::start(HttpServerConfig {
                port: server.port.unwrap_or(3000),
                allowed_origins: server.allowed_origins,
                auth: Some(auth_state(spotify, &config)?),
                generation: Some(generation_state(llm, &config)?),
            })
            .await?;
        }
        Commands::AuthProxy { server, spotify } => {
            http_server::app::start(HttpServerConfig {
                port: server.port.unwrap_or(3000),
                allowed_origins: server.allowed_origins,
                auth: Some(auth_state(spotify, &config)?),
                generation: None,
            })
            .await?;
        }
        Commands::GenerateProxy { server, llm } => {
            http_server::app::start(HttpServerConfig {
                port: server.port.unwrap_or(5001),
                allowed_origins: server.allowed_origins,
                auth: None,
                generation: Some(generation_state(llm, &config)?),
            })
            .await?;
        }
        Commands::Login { login } => {
            let settings = login_settings(login, &config)
                .ok_or_eyre("SPOTIFY_CLIENT_ID is required to log in")?;
            let mut app = client_app(&config)?;
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            interactive::login(&mut app, &settings, &mut lines).await?;
        }
        Commands::Logout => {
            let mut app = client_app(&config)?;
            app.disconnect()?;
            println!("Disconnected from Spotify.");
        }
        Commands::Generate { prompt, save } => {
            let mut app = client_app(&config)?;
            app.restore_session().await?;
            if !app.is_authenticated() {
                bail!("Not logged in, run `tunesmith login` first");
            }

            app.submit_prompt(&prompt).await?;
            let AppPhase::Result { concept, tracks } = app.phase() else {
                println!("{}", app.message().unwrap_or_default());
                return Ok(());
            };
            interactive::print_concept(concept, tracks);

            if save {
                let saved = app.save_to_spotify().await?;
                interactive::print_saved(&saved);
                if let Some(message) = app.message() {
                    println!("{}", message);
                }
            }
        }
        Commands::Interactive { login } => {
            let settings = login_settings(login, &config);
            let mut app = client_app(&config)?;
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            interactive::run(&mut app, settings.as_ref(), &mut lines).await?;
        }
        Commands::Config(config_commands) => match config_commands {
            ConfigCommands::CreateDefault => {
                log::debug!("Creating default config");
                let path = Config::create_default()?;
                println!("{}", path.display());
            }
            ConfigCommands::Path => match Config::config_path() {
                Some(path) => println!("{}", path.display()),
                None => println!("No default config path found"),
            },
        },
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    let log_level = args
        .log_level
        .clone()
        .unwrap_or_else(|| args.command.default_log_level().to_string());
    let tracer_provider =
        logging::init_tracing("tunesmith", args.otlp_endpoint.as_deref(), &log_level)?;

    let result = run(args).await;
    logging::shutdown_tracing(tracer_provider);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_allowed_origins_are_comma_separated() {
        let args = Args::try_parse_from([
            "tunesmith",
            "generate-proxy",
            "--allowed-origins",
            "http://a.test,http://b.test",
        ])
        .unwrap();
        let Commands::GenerateProxy { server, .. } = args.command else {
            panic!("wrong command");
        };
        assert_eq!(server.allowed_origins, vec!["http://a.test", "http://b.test"]);
    }

    #[test]
    fn test_login_settings_fall_back_to_config() {
        let mut config = Config::default();
        let args = LoginArgs {
            spotify_client_id: None,
            spotify_redirect_uri: None,
        };
        assert!(login_settings(args, &config).is_none());

        config.spotify.client_id = Some("client-id".into());
        let settings = login_settings(
            LoginArgs {
                spotify_client_id: None,
                spotify_redirect_uri: None,
            },
            &config,
        )
        .unwrap();
        assert_eq!(settings.client_id, "client-id");
        assert_eq!(settings.redirect_uri, DEFAULT_REDIRECT_URI);
    }
}
