use anyhow::{ensure, Result};
use burn::data::dataset::Dataset;
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::data::generator::SampleStream;
use crate::domain::sample::DrivingSample;
use crate::domain::traits::SampleSource;

/// A fixed set of decoded samples held in memory.
pub struct SampleSet {
    samples: Vec<DrivingSample>,
}

impl SampleSet {
    pub fn new(samples: Vec<DrivingSample>) -> Self { Self { samples } }

    /// Pull exactly `count` samples from a generator
    pub fn materialize(stream: &mut SampleStream, count: usize) -> Result<Self> {
        Ok(Self::new(stream.take_samples(count)?))
    }

    pub fn sample_count(&self) -> usize { self.samples.len() }
}

impl Dataset<DrivingSample> for SampleSet {
    fn get(&self, index: usize) -> Option<DrivingSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

/// Replays one materialised SampleSet pass after pass.
///
/// A batch never straddles two passes, so with `samples_per_epoch`
/// equal to the set size every epoch sees each sample exactly once.
pub struct InMemorySource {
    set:      SampleSet,
    order:    Vec<usize>,
    position: usize,
    shuffle:  bool,
    rng:      StdRng,
    label:    String,
}

impl InMemorySource {
    pub fn new(set: SampleSet, shuffle: bool, seed: u64) -> Result<Self> {
        ensure!(set.sample_count() > 0, "in-memory sample set is empty");

        let mut source = Self {
            order: (0..set.sample_count()).collect(),
            label: format!("in-memory:{}", set.sample_count()),
            set,
            position: 0,
            shuffle,
            rng: StdRng::seed_from_u64(seed),
        };
        source.start_pass();
        Ok(source)
    }

    /// Load `count` samples from a generator and wrap them
    pub fn from_stream(stream: &mut SampleStream, count: usize, shuffle: bool, seed: u64) -> Result<Self> {
        tracing::info!("Loading {} samples into memory from {}", count, stream.name());
        Self::new(SampleSet::materialize(stream, count)?, shuffle, seed)
    }

    fn start_pass(&mut self) {
        self.position = 0;
        if self.shuffle {
            self.order.shuffle(&mut self.rng);
        }
    }
}

impl SampleSource for InMemorySource {
    fn next_batch(&mut self, batch_size: usize) -> Result<Vec<DrivingSample>> {
        if self.position >= self.order.len() {
            self.start_pass();
        }

        let end = (self.position + batch_size).min(self.order.len());
        let batch = self.order[self.position..end]
            .iter()
            .filter_map(|&i| self.set.get(i))
            .collect();
        self.position = end;
        Ok(batch)
    }

    fn name(&self) -> &str {
        &self.label
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sample::IMAGE_LEN;

    fn set_of(angles: &[f32]) -> SampleSet {
        SampleSet::new(
            angles
                .iter()
                .map(|&a| DrivingSample::new(vec![0.0; IMAGE_LEN], a).unwrap())
                .collect(),
        )
    }

    #[test]
    fn test_batches_stop_at_pass_boundary() {
        let mut src = InMemorySource::new(set_of(&[0.1, 0.2, 0.3, 0.4, 0.5]), false, 0).unwrap();
        assert_eq!(src.next_batch(2).unwrap().len(), 2);
        assert_eq!(src.next_batch(2).unwrap().len(), 2);
        // Last batch of the pass is short
        assert_eq!(src.next_batch(2).unwrap().len(), 1);
        // Next pass starts over
        let first = src.next_batch(2).unwrap();
        assert_eq!(first[0].angle, 0.1);
    }

    #[test]
    fn test_every_pass_replays_same_set() {
        let mut src = InMemorySource::new(set_of(&[0.1, 0.2, 0.3, 0.4]), true, 7).unwrap();
        for _ in 0..3 {
            let mut angles: Vec<f32> = src.next_batch(4).unwrap().iter().map(|s| s.angle).collect();
            angles.sort_by(|a, b| a.partial_cmp(b).unwrap());
            assert_eq!(angles, vec![0.1, 0.2, 0.3, 0.4]);
        }
    }

    #[test]
    fn test_empty_set_is_rejected() {
        assert!(InMemorySource::new(set_of(&[]), true, 0).is_err());
    }

    #[test]
    fn test_dataset_trait() {
        let set = set_of(&[0.5, -0.5]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.get(1).unwrap().angle, -0.5);
        assert!(set.get(2).is_none());
    }
}
