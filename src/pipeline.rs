//! End-to-end run: events → codes → interactions → model → recommendations.
//!
//! Line parsing and aggregation run on a dedicated rayon pool. Item code
//! assignment runs on the calling thread over the parsed records in input
//! order, so the same input always yields the same code table regardless of
//! the thread count.

use std::io::BufRead;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use log::{debug, info};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};

use crate::aggregate::{InteractionAggregator, InteractionSet};
use crate::codec::{Classified, CodedRecord, DiscardReason, IdentifierCodec, ItemCodeTable, UserId};
use crate::config::AffinityConfig;
use crate::error::{AffinityError, Result};
use crate::model::{AlsTrainer, Model, Trainer};
use crate::record::{FlatRecord, JsonlLines, PathExtractor};
use crate::recommend::{Recommendation, Recommender};

/// Counters collected while ingesting events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestStats {
    /// Non-blank lines read.
    pub lines_read: usize,
    /// Records that were coded and aggregated.
    pub records_kept: usize,
    /// Lines that were not valid JSON.
    pub discarded_unparseable: usize,
    /// Records missing a configured field.
    pub discarded_missing_field: usize,
    /// Records whose user key is not an integer.
    pub discarded_invalid_user: usize,
}

impl IngestStats {
    /// Total number of discarded records.
    pub fn discarded(&self) -> usize {
        self.discarded_unparseable + self.discarded_missing_field + self.discarded_invalid_user
    }

    fn record_discard(&mut self, reason: &DiscardReason) {
        match reason {
            DiscardReason::Unparseable { .. } => self.discarded_unparseable += 1,
            DiscardReason::MissingField { .. } => self.discarded_missing_field += 1,
            DiscardReason::InvalidUserKey { .. } => self.discarded_invalid_user += 1,
        }
    }
}

/// Output of the parsing and aggregation passes.
#[derive(Debug, Clone)]
pub struct Ingested {
    /// Item catalog; complete and read-only from here on.
    pub codes: ItemCodeTable,
    pub interactions: InteractionSet,
    pub stats: IngestStats,
}

/// An ingested data set together with the model trained on it.
pub struct TrainedPipeline<M: Model> {
    pub ingested: Ingested,
    pub model: M,
    thread_pool: Arc<ThreadPool>,
}

impl<M: Model> TrainedPipeline<M> {
    /// Top-`n` recommendations for one user.
    pub fn recommend(&self, user_id: UserId, n: usize) -> Result<Recommendation> {
        self.thread_pool
            .install(|| self.recommender().recommend(user_id, n))
    }

    /// Top-`n` recommendations for each user, in the order given.
    pub fn recommend_all(&self, user_ids: &[UserId], n: usize) -> Result<Vec<Recommendation>> {
        self.thread_pool
            .install(|| self.recommender().recommend_all(user_ids, n))
    }

    fn recommender(&self) -> Recommender<'_, M> {
        Recommender::new(
            &self.model,
            &self.ingested.interactions,
            &self.ingested.codes,
        )
    }
}

/// Wires extraction, coding, aggregation and training together.
pub struct Pipeline {
    config: AffinityConfig,
    extractor: PathExtractor,
    aggregator: InteractionAggregator,
    thread_pool: Arc<ThreadPool>,
}

impl Pipeline {
    /// Create a pipeline from a validated configuration.
    pub fn new(config: AffinityConfig) -> Result<Self> {
        config.validate()?;

        let app_name = config.execution.app_name.clone();
        let thread_pool = ThreadPoolBuilder::new()
            .num_threads(config.execution.threads())
            .thread_name(move |i| format!("{app_name}-{i}"))
            .build()
            .map_err(|e| AffinityError::internal(format!("Failed to create thread pool: {e}")))?;

        Ok(Pipeline {
            extractor: PathExtractor::new(config.source.fields.clone()),
            aggregator: InteractionAggregator::new(config.execution.num_partitions),
            thread_pool: Arc::new(thread_pool),
            config,
        })
    }

    /// The configuration this pipeline was built from.
    pub fn config(&self) -> &AffinityConfig {
        &self.config
    }

    /// Ingest the event log named in the configuration.
    pub fn ingest_configured_source(&self) -> Result<Ingested> {
        let path = self.config.source.file_path.as_ref().ok_or_else(|| {
            AffinityError::invalid_config("no input file: set source.file_path or pass --input")
        })?;
        self.ingest_file(path)
    }

    /// Ingest a JSONL file.
    pub fn ingest_file<P: AsRef<Path>>(&self, path: P) -> Result<Ingested> {
        info!("Reading events from {}", path.as_ref().display());
        let lines = JsonlLines::open(path)?.collect::<Result<Vec<Vec<u8>>>>()?;
        self.ingest_raw_lines(lines)
    }

    /// Ingest JSONL from any buffered reader.
    pub fn ingest_reader<R: BufRead>(&self, reader: R) -> Result<Ingested> {
        let lines = JsonlLines::new(reader).collect::<Result<Vec<Vec<u8>>>>()?;
        self.ingest_raw_lines(lines)
    }

    /// Parse, code and aggregate a batch of JSON lines.
    pub fn ingest_lines(&self, lines: Vec<String>) -> Result<Ingested> {
        self.ingest_raw_lines(lines.into_iter().map(String::into_bytes).collect())
    }

    /// Parse, code and aggregate a batch of undecoded JSON lines.
    ///
    /// A line that is not valid UTF-8 is discarded as unparseable.
    pub fn ingest_raw_lines(&self, lines: Vec<Vec<u8>>) -> Result<Ingested> {
        let start = Instant::now();

        let parsed: Vec<Result<FlatRecord>> = self.thread_pool.install(|| {
            lines
                .par_iter()
                .map(|line| self.extractor.flatten_slice(line))
                .collect()
        });

        let mut stats = IngestStats {
            lines_read: lines.len(),
            ..IngestStats::default()
        };
        let mut codec = IdentifierCodec::new();
        let mut coded: Vec<CodedRecord> = Vec::with_capacity(parsed.len());

        for (index, flattened) in parsed.into_iter().enumerate() {
            match codec.classify(flattened)? {
                Classified::Kept(record) => coded.push(record),
                Classified::Discarded(reason) => {
                    debug!("Discarding record {}: {reason}", index + 1);
                    stats.record_discard(&reason);
                }
            }
        }
        stats.records_kept = coded.len();
        let codes = codec.into_table();

        let interactions = self
            .thread_pool
            .install(|| self.aggregator.aggregate(&coded));

        info!(
            "Ingested {} lines in {} ms: {} kept, {} discarded, {} items, {} interactions",
            stats.lines_read,
            start.elapsed().as_millis(),
            stats.records_kept,
            stats.discarded(),
            codes.len(),
            interactions.len()
        );

        Ok(Ingested {
            codes,
            interactions,
            stats,
        })
    }

    /// Train a model on ingested data with any trainer.
    pub fn train<T: Trainer>(&self, trainer: &T, ingested: &Ingested) -> Result<T::Model> {
        let triples = ingested.interactions.to_triples();
        self.thread_pool.install(|| trainer.train(&triples))
    }

    /// Train the configured ALS model and bundle it with the data.
    pub fn fit(&self, ingested: Ingested) -> Result<TrainedPipeline<crate::model::AlsModel>> {
        let trainer = AlsTrainer::new(self.config.als.clone());
        let model = self.train(&trainer, &ingested)?;
        info!(
            "Trained model in {} ms, final rmse {:.4}",
            model.training_stats().training_time_ms,
            model.training_stats().final_training_loss
        );

        Ok(TrainedPipeline {
            ingested,
            model,
            thread_pool: Arc::clone(&self.thread_pool),
        })
    }

    /// Ingest the configured source and train on it.
    pub fn run(&self) -> Result<TrainedPipeline<crate::model::AlsModel>> {
        let ingested = self.ingest_configured_source()?;
        self.fit(ingested)
    }
}
