pub mod generate_playlist;
pub mod health;
pub mod spotify_auth;
