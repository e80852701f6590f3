//! Retrievers: a collection plus fixed search options.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::RetrievalConfig;
use crate::documents::Document;
use crate::store::{Collection, StoreError};

/// Errors from retriever construction and retrieval.
#[derive(Error, Debug)]
pub enum RetrieverError {
    #[error(
        "search_type of {0} not allowed. Valid values are: ('similarity', 'similarity_score_threshold', 'mmr')"
    )]
    InvalidSearchType(String),

    #[error("score_threshold is required with a search_type of similarity_score_threshold")]
    MissingScoreThreshold,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for retriever operations.
pub type RetrieverResult<T> = Result<T, RetrieverError>;

/// How a retriever ranks documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchType {
    /// Top `k` by cosine similarity.
    #[default]
    Similarity,
    /// Maximal marginal relevance over the top `fetch_k`.
    Mmr,
    /// Top `k` with similarity at or above `score_threshold`.
    SimilarityScoreThreshold,
}

impl SearchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Similarity => "similarity",
            Self::Mmr => "mmr",
            Self::SimilarityScoreThreshold => "similarity_score_threshold",
        }
    }
}

impl FromStr for SearchType {
    type Err = RetrieverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "similarity" => Ok(Self::Similarity),
            "mmr" => Ok(Self::Mmr),
            "similarity_score_threshold" => Ok(Self::SimilarityScoreThreshold),
            other => Err(RetrieverError::InvalidSearchType(other.to_string())),
        }
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Search parameters applied on every retrieval.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOptions {
    pub search_type: SearchType,
    /// Number of documents to return.
    pub k: usize,
    /// Candidates fetched before MMR re-ranking.
    pub fetch_k: usize,
    /// MMR trade-off between relevance (1.0) and diversity (0.0).
    pub lambda_mult: f32,
    /// Minimum cosine similarity for `SimilarityScoreThreshold`.
    pub score_threshold: Option<f32>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            search_type: SearchType::Similarity,
            k: 5,
            fetch_k: 20,
            lambda_mult: 0.5,
            score_threshold: None,
        }
    }
}

impl SearchOptions {
    /// Options from the `[retrieval]` settings.
    pub fn from_config(config: &RetrievalConfig) -> RetrieverResult<Self> {
        let options = Self {
            search_type: config.search_type.parse()?,
            k: config.k,
            fetch_k: config.fetch_k,
            lambda_mult: config.lambda_mult,
            score_threshold: config.score_threshold,
        };
        options.validate()?;
        Ok(options)
    }

    #[must_use]
    pub fn with_search_type(mut self, search_type: SearchType) -> Self {
        self.search_type = search_type;
        self
    }

    #[must_use]
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    #[must_use]
    pub fn with_score_threshold(mut self, threshold: f32) -> Self {
        self.score_threshold = Some(threshold);
        self
    }

    /// Check that the options are usable together.
    pub fn validate(&self) -> RetrieverResult<()> {
        if self.search_type == SearchType::SimilarityScoreThreshold
            && self.score_threshold.is_none()
        {
            return Err(RetrieverError::MissingScoreThreshold);
        }
        Ok(())
    }
}

/// Fetches context documents for a query from one collection.
#[derive(Debug, Clone)]
pub struct Retriever {
    collection: Collection,
    options: SearchOptions,
}

impl Retriever {
    pub fn new(collection: Collection, options: SearchOptions) -> Self {
        Self {
            collection,
            options,
        }
    }

    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    /// Documents relevant to `query`, most relevant first.
    pub async fn retrieve(&self, query: &str) -> RetrieverResult<Vec<Document>> {
        let SearchOptions {
            search_type,
            k,
            fetch_k,
            lambda_mult,
            score_threshold,
        } = self.options;

        let documents = match search_type {
            SearchType::Similarity => self.collection.similarity_search(query, k).await?,
            SearchType::Mmr => {
                self.collection
                    .max_marginal_relevance_search(query, k, fetch_k, lambda_mult)
                    .await?
            }
            SearchType::SimilarityScoreThreshold => {
                let threshold = score_threshold.ok_or(RetrieverError::MissingScoreThreshold)?;
                self.collection
                    .similarity_search_with_score(query, k)
                    .await?
                    .into_iter()
                    .filter(|(_, score)| *score >= threshold)
                    .map(|(document, _)| document)
                    .collect()
            }
        };

        tracing::debug!(
            target: "qa",
            "retrieved {} documents from '{}' ({search_type}, k={k})",
            documents.len(),
            self.collection.name()
        );

        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search_type() {
        assert_eq!("similarity".parse::<SearchType>().unwrap(), SearchType::Similarity);
        assert_eq!("mmr".parse::<SearchType>().unwrap(), SearchType::Mmr);
        assert_eq!(
            "similarity_score_threshold".parse::<SearchType>().unwrap(),
            SearchType::SimilarityScoreThreshold
        );
    }

    #[test]
    fn test_invalid_search_type() {
        let err = "fuzzy".parse::<SearchType>().unwrap_err();
        assert!(matches!(err, RetrieverError::InvalidSearchType(ref s) if s == "fuzzy"));
        assert!(err.to_string().starts_with("search_type of fuzzy not allowed"));

        // Case matters
        assert!("MMR".parse::<SearchType>().is_err());
    }

    #[test]
    fn test_display_roundtrips() {
        for search_type in [
            SearchType::Similarity,
            SearchType::Mmr,
            SearchType::SimilarityScoreThreshold,
        ] {
            assert_eq!(search_type.to_string().parse::<SearchType>().unwrap(), search_type);
        }
    }

    #[test]
    fn test_default_options() {
        let options = SearchOptions::default();
        assert_eq!(options.search_type, SearchType::Similarity);
        assert_eq!(options.k, 5);
        assert_eq!(options.fetch_k, 20);
        assert_eq!(options.lambda_mult, 0.5);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_threshold_required() {
        let options = SearchOptions::default().with_search_type(SearchType::SimilarityScoreThreshold);
        assert!(matches!(options.validate(), Err(RetrieverError::MissingScoreThreshold)));
        assert!(options.with_score_threshold(0.8).validate().is_ok());
    }

    #[test]
    fn test_from_config() {
        let config = RetrievalConfig {
            search_type: "mmr".to_string(),
            k: 3,
            ..Default::default()
        };
        let options = SearchOptions::from_config(&config).unwrap();
        assert_eq!(options.search_type, SearchType::Mmr);
        assert_eq!(options.k, 3);

        let bad = RetrievalConfig {
            search_type: "nearest".to_string(),
            ..Default::default()
        };
        assert!(SearchOptions::from_config(&bad).is_err());
    }
}
