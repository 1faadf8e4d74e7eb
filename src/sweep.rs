use indicatif::{ParallelProgressIterator, ProgressBar};
use rayon::prelude::*;
use rerun::RecordingStream;

use crate::algorithms::AlgorithmRegistry;
use crate::compatibility::{is_compatible_with, Rule, RULES};
use crate::config::SweepConfig;
use crate::data_loader::FrameSource;
use crate::error::{BenchError, Result};
use crate::frame_buffer::{Frame, FrameBuffer};
use crate::metrics::{CombinationResult, FrameMetrics, SkippedCombination, SweepReport};
use crate::stages::{DescriptionStage, DetectionStage, MatchingStage};
use crate::visualization::log_match_pair;

/// Runs every detector × descriptor combination of a config over an image
/// source.
///
/// Each combination starts from an empty frame buffer and a fresh result,
/// so combinations never see each other's frames or numbers.
pub struct Sweep<'a, S: FrameSource + ?Sized> {
    config: &'a SweepConfig,
    registry: &'a AlgorithmRegistry,
    source: &'a S,
    rules: &'a [Rule],
    recording: Option<&'a RecordingStream>,
}

impl<'a, S: FrameSource + ?Sized> Sweep<'a, S> {
    pub fn new(config: &'a SweepConfig, registry: &'a AlgorithmRegistry, source: &'a S) -> Self {
        Sweep {
            config,
            registry,
            source,
            rules: RULES,
            recording: None,
        }
    }

    pub fn with_rules(mut self, rules: &'a [Rule]) -> Self {
        self.rules = rules;
        self
    }

    /// Match pairs are logged here when `visualize` is set.
    pub fn with_recording(mut self, recording: Option<&'a RecordingStream>) -> Self {
        self.recording = recording;
        self
    }

    /// Every pairing in declaration order, detector-major.
    pub fn combinations(&self) -> Vec<(&'a str, &'a str)> {
        let config = self.config;
        config
            .detector_ids
            .iter()
            .flat_map(|det| {
                config
                    .descriptor_ids
                    .iter()
                    .map(move |desc| (det.as_str(), desc.as_str()))
            })
            .collect()
    }

    /// Resolves every identifier and checks the config before any image is
    /// loaded.
    pub fn validate(&self) -> Result<()> {
        self.config.validate()?;
        if self.source.is_empty() {
            return Err(BenchError::EmptySource);
        }
        for id in &self.config.detector_ids {
            self.registry.detector(id)?;
        }
        for id in &self.config.descriptor_ids {
            let extractor = self.registry.descriptor(id)?;
            self.config
                .distance_norm
                .resolve(id, extractor.output_type())?;
        }
        self.registry.matcher(self.config.matcher_strategy)?;
        Ok(())
    }

    pub fn run(&self) -> Result<SweepReport> {
        self.run_with(|_| {})
    }

    /// Like [`Sweep::run`], handing each finished combination to `sink` in
    /// enumeration order.
    pub fn run_with(&self, mut sink: impl FnMut(&CombinationResult)) -> Result<SweepReport> {
        self.validate()?;

        let mut planned = Vec::new();
        let mut skipped = Vec::new();
        for (det, desc) in self.combinations() {
            if is_compatible_with(self.rules, det, desc) {
                planned.push((det, desc));
            } else {
                log::info!("{} not compatible with {}, skipping", desc, det);
                skipped.push(SkippedCombination {
                    detector: det.to_string(),
                    descriptor: desc.to_string(),
                });
            }
        }

        let results = if self.config.parallel {
            let results = self.run_parallel(&planned)?;
            results.iter().for_each(&mut sink);
            results
        } else {
            let progress = ProgressBar::new(planned.len() as u64);
            let mut buffer = FrameBuffer::new(self.config.buffer_capacity)?;
            let mut results = Vec::with_capacity(planned.len());
            for (det, desc) in planned {
                let result = self.run_combination(&mut buffer, det, desc)?;
                sink(&result);
                results.push(result);
                progress.inc(1);
            }
            progress.finish_and_clear();
            results
        };
        Ok(SweepReport::new(results, skipped))
    }

    fn run_parallel(&self, planned: &[(&str, &str)]) -> Result<Vec<CombinationResult>> {
        planned
            .par_iter()
            .progress_count(planned.len() as u64)
            .map(|(det, desc)| {
                let mut buffer = FrameBuffer::new(self.config.buffer_capacity)?;
                self.run_combination(&mut buffer, det, desc)
            })
            .collect()
    }

    /// Runs one pairing over the whole image source. The buffer is cleared
    /// first.
    pub fn run_combination(
        &self,
        buffer: &mut FrameBuffer,
        detector_id: &str,
        descriptor_id: &str,
    ) -> Result<CombinationResult> {
        log::info!("Detector: {}; Descriptor: {}", detector_id, descriptor_id);
        buffer.clear();

        let detection =
            DetectionStage::resolve(self.registry, detector_id, self.config.keypoint_filter())?;
        let description = DescriptionStage::resolve(self.registry, descriptor_id)?;
        let norm = self
            .config
            .distance_norm
            .resolve(descriptor_id, description.extractor().output_type())?;
        let matching = MatchingStage::new(
            self.registry.matcher(self.config.matcher_strategy)?,
            norm,
            self.config.selection,
        );
        let topic = format!("matches/{}_{}", detector_id, descriptor_id);

        let mut result = CombinationResult::new(detector_id, descriptor_id);
        for position in 0..self.source.len() {
            let image = self.source.load(position)?;
            buffer.push(Frame::new(position, image));
            log::debug!("#1 : LOAD IMAGE {} INTO BUFFER {} done", position, buffer.len());

            let detected = detection.run(buffer.latest_mut()?);
            let described = description.run(buffer.latest_mut()?)?;
            let matched = matching.run(buffer)?;

            if let (true, Some(recording), Some(_)) = (self.config.visualize, self.recording, matched) {
                let (previous, current) = buffer.latest_pair()?;
                if let Err(e) = log_match_pair(recording, &topic, previous, current) {
                    log::warn!("{}", e);
                }
            }
            result.record(FrameMetrics::from_outcomes(position, detected, described, matched));
        }
        Ok(result)
    }
}
