// Paw Voice Engine — intent resolution runtime
// Pattern classification for instant device actions, a streaming generative
// fallback for everything else, and a total parser between the backend's
// free text and the action executors.

pub mod classifier;
pub mod config;
pub mod context;
pub mod dispatcher;
pub mod executors;
pub mod http;
pub mod parser;
pub mod providers;
pub mod sessions;
