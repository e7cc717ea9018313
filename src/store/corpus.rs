use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::{
    error::{AppError, AppResult},
    models::{MovieId, MovieRecord, MovieSummary},
};

/// Immutable set of recommendable movies and their feature vectors
///
/// Built once at startup and shared read-only. Vectors are stored row-major
/// in a single buffer of `len() * dimension()` values.
#[derive(Debug)]
pub struct Corpus {
    records: Vec<MovieRecord>,
    vectors: Vec<f32>,
    dimension: usize,
    /// Title to first corpus position carrying it
    title_index: HashMap<String, MovieId>,
}

impl Corpus {
    /// Loads the movie records and feature matrix from two JSON files
    pub fn load(movies_path: impl AsRef<Path>, vectors_path: impl AsRef<Path>) -> AppResult<Self> {
        let records: Vec<MovieRecord> = read_json(movies_path.as_ref())?;
        let vectors: Vec<Vec<f32>> = read_json(vectors_path.as_ref())?;

        let corpus = Self::from_parts(records, vectors)?;

        tracing::info!(
            movies = corpus.len(),
            dimension = corpus.dimension(),
            distinct_titles = corpus.title_index.len(),
            "Loaded movie corpus"
        );

        Ok(corpus)
    }

    /// Builds a corpus from aligned records and vector rows
    pub fn from_parts(records: Vec<MovieRecord>, rows: Vec<Vec<f32>>) -> AppResult<Self> {
        if records.len() != rows.len() {
            return Err(AppError::CorpusLoad(format!(
                "{} movie records but {} feature vectors",
                records.len(),
                rows.len()
            )));
        }

        let dimension = match rows.first() {
            Some(row) if !row.is_empty() => row.len(),
            Some(_) => {
                return Err(AppError::CorpusLoad(
                    "feature vectors must have at least one dimension".to_string(),
                ))
            }
            None => return Err(AppError::CorpusLoad("corpus is empty".to_string())),
        };

        let mut vectors = Vec::with_capacity(rows.len() * dimension);
        for (row_idx, row) in rows.into_iter().enumerate() {
            if row.len() != dimension {
                return Err(AppError::CorpusLoad(format!(
                    "vector {} has dimension {}, expected {}",
                    row_idx,
                    row.len(),
                    dimension
                )));
            }
            if let Some(col) = row.iter().position(|value| !value.is_finite()) {
                return Err(AppError::CorpusLoad(format!(
                    "vector {} has a non-finite value at column {}",
                    row_idx, col
                )));
            }
            vectors.extend(row);
        }

        let mut title_index = HashMap::with_capacity(records.len());
        for (id, record) in records.iter().enumerate() {
            // Duplicate titles exist in the source data; the earliest one wins
            title_index.entry(record.title.clone()).or_insert(id);
        }

        Ok(Self {
            records,
            vectors,
            dimension,
            title_index,
        })
    }

    /// Number of movies (N)
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Length of every feature vector (D)
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn contains(&self, id: MovieId) -> bool {
        id < self.len()
    }

    pub fn movie(&self, id: MovieId) -> Option<&MovieRecord> {
        self.records.get(id)
    }

    pub fn title(&self, id: MovieId) -> Option<&str> {
        self.records.get(id).map(|record| record.title.as_str())
    }

    pub fn vector(&self, id: MovieId) -> Option<&[f32]> {
        if !self.contains(id) {
            return None;
        }
        let start = id * self.dimension;
        Some(&self.vectors[start..start + self.dimension])
    }

    /// All feature vectors in corpus order
    pub fn vectors(&self) -> impl Iterator<Item = &[f32]> {
        self.vectors.chunks_exact(self.dimension)
    }

    /// Resolves an exact title to its identifier
    pub fn lookup_by_title(&self, title: &str) -> AppResult<MovieId> {
        self.title_index
            .get(title)
            .copied()
            .ok_or_else(|| AppError::NotFound(format!("No movie titled \"{}\"", title)))
    }

    /// Titles for the selection list, optionally filtered by a
    /// case-insensitive substring
    pub fn search_titles(&self, query: &str) -> Vec<MovieSummary> {
        let needle = query.trim().to_lowercase();

        self.records
            .iter()
            .enumerate()
            .filter(|(_, record)| {
                needle.is_empty() || record.title.to_lowercase().contains(&needle)
            })
            .map(|(id, record)| MovieSummary {
                id,
                title: record.title.clone(),
            })
            .collect()
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> AppResult<T> {
    let raw = fs::read_to_string(path).map_err(|e| {
        AppError::CorpusLoad(format!("failed to read {}: {}", path.display(), e))
    })?;

    serde_json::from_str(&raw)
        .map_err(|e| AppError::CorpusLoad(format!("failed to parse {}: {}", path.display(), e)))
}
