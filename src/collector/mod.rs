//! Vacancy collection from hh.ru.

pub mod hh;

pub use hh::HeadHunterClient;
