pub mod twitch;
pub mod youtube;

pub use twitch::TwitchEndpoint;
pub use youtube::YoutubeEndpoint;
