pub mod config;
pub mod db;
pub mod dedupe;
pub mod entities;
pub mod error;
pub mod merge;
pub mod models;
pub mod movies;
pub mod poster;
pub mod posters;
pub mod reconciler;
pub mod seeds;
pub mod slug;
pub mod store;
pub mod timeparse;
pub mod tmdb;
