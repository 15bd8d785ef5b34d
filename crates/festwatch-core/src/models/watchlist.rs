//! Watchlist model

use serde::{Deserialize, Serialize};

/// A per-user set of film identifiers.
///
/// Membership is what matters; insertion order is kept only so listings stay
/// stable. Identifiers are appended once, blank identifiers are dropped, and
/// equality ignores order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Watchlist {
    films: Vec<String>,
}

impl Watchlist {
    #[must_use]
    pub const fn new() -> Self {
        Self { films: Vec::new() }
    }

    /// Build a watchlist from raw ids, trimming and de-duplicating them.
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut watchlist = Self::new();
        for id in ids {
            watchlist.insert(id.as_ref());
        }
        watchlist
    }

    pub fn contains(&self, film_id: &str) -> bool {
        let film_id = film_id.trim();
        self.films.iter().any(|film| film == film_id)
    }

    /// Append a film id. Returns `false` when it was already present or blank.
    pub fn insert(&mut self, film_id: &str) -> bool {
        let film_id = film_id.trim();
        if film_id.is_empty() || self.contains(film_id) {
            return false;
        }
        self.films.push(film_id.to_string());
        true
    }

    /// Remove a film id. Returns `false` when it was not a member.
    pub fn remove(&mut self, film_id: &str) -> bool {
        let film_id = film_id.trim();
        let before = self.films.len();
        self.films.retain(|film| film != film_id);
        self.films.len() != before
    }

    /// Union of both lists: this list's order first, then the other's new ids.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let mut merged = self.clone();
        for film in &other.films {
            merged.insert(film);
        }
        merged
    }

    pub fn len(&self) -> usize {
        self.films.len()
    }

    pub fn is_empty(&self) -> bool {
        self.films.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.films.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.films
    }
}

impl PartialEq for Watchlist {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|film| other.contains(film))
    }
}

impl Eq for Watchlist {}

impl From<Vec<String>> for Watchlist {
    fn from(value: Vec<String>) -> Self {
        Self::from_ids(value)
    }
}

impl From<Watchlist> for Vec<String> {
    fn from(value: Watchlist) -> Self {
        value.films
    }
}

impl<S: AsRef<str>> FromIterator<S> for Watchlist {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self::from_ids(iter)
    }
}
