pub mod auth;
pub mod home_feed;
pub mod mail;
pub mod movie_views;
pub mod providers;
pub mod recommendations;
