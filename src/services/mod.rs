pub mod playlist_generation;
pub mod playlist_save;
pub mod session;
pub mod spotify;
pub mod track_resolution;
