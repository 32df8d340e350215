pub mod auth;
pub mod decks;
pub mod items;
pub mod quizzes;
pub mod users;
