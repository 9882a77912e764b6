//! Learning-rate schedule preview
//!
//! Linear warmup, cosine decay down to `min_lr`, then flat. Computed from
//! the record alone so a run's schedule can be inspected before launching it.

use std::f64::consts::PI;

use serde::Serialize;

use crate::record::TrainConfig;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LrSchedule {
    pub learning_rate: f64,
    pub min_lr: f64,
    pub warmup_iters: u64,
    pub lr_decay_iters: u64,
    pub max_iters: u64,
    pub decay_lr: bool,
}

/// One sampled point of the schedule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LrPoint {
    pub iter: u64,
    pub lr: f64,
}

impl LrSchedule {
    pub fn from_config(config: &TrainConfig) -> Self {
        Self {
            learning_rate: config.learning_rate,
            min_lr: config.min_lr,
            warmup_iters: config.warmup_iters,
            lr_decay_iters: config.lr_decay_iters,
            max_iters: config.max_iters,
            decay_lr: config.decay_lr,
        }
    }

    /// Learning rate used at iteration `iter`.
    #[allow(clippy::cast_precision_loss)]
    pub fn lr_at(&self, iter: u64) -> f64 {
        if !self.decay_lr {
            return self.learning_rate;
        }
        if iter < self.warmup_iters {
            return self.learning_rate * (iter + 1) as f64 / (self.warmup_iters + 1) as f64;
        }
        if iter > self.lr_decay_iters {
            return self.min_lr;
        }
        let span = self.lr_decay_iters.saturating_sub(self.warmup_iters);
        if span == 0 {
            return self.learning_rate;
        }
        let ratio = (iter - self.warmup_iters) as f64 / span as f64;
        let coeff = 0.5 * (1.0 + (PI * ratio).cos());
        self.min_lr + coeff * (self.learning_rate - self.min_lr)
    }

    /// Samples every `every` iterations from 0, always including `max_iters`.
    pub fn preview(&self, every: u64) -> Vec<LrPoint> {
        let step = usize::try_from(every.max(1)).unwrap_or(usize::MAX);
        let mut points: Vec<LrPoint> = (0..=self.max_iters)
            .step_by(step)
            .map(|iter| LrPoint {
                iter,
                lr: self.lr_at(iter),
            })
            .collect();
        if points.last().map(|p| p.iter) != Some(self.max_iters) {
            points.push(LrPoint {
                iter: self.max_iters,
                lr: self.lr_at(self.max_iters),
            });
        }
        points
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule() -> LrSchedule {
        LrSchedule {
            learning_rate: 1e-3,
            min_lr: 1e-4,
            warmup_iters: 100,
            lr_decay_iters: 5000,
            max_iters: 5000,
            decay_lr: true,
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn test_warmup_ramp() {
        let s = schedule();
        assert!(close(s.lr_at(0), 1e-3 / 101.0));
        assert!(close(s.lr_at(99), 1e-3 * 100.0 / 101.0));
        assert!(s.lr_at(10) < s.lr_at(50));
    }

    #[test]
    fn test_peak_and_tail() {
        let s = schedule();
        assert!(close(s.lr_at(100), 1e-3));
        assert!(close(s.lr_at(5000), 1e-4));
        assert!(close(s.lr_at(6000), 1e-4));
        // halfway through the decay the cosine sits at the midpoint
        assert!(close(s.lr_at(2550), 5.5e-4));
    }

    #[test]
    fn test_decay_disabled() {
        let s = LrSchedule {
            decay_lr: false,
            ..schedule()
        };
        assert_eq!(s.lr_at(0), 1e-3);
        assert_eq!(s.lr_at(4999), 1e-3);
    }

    #[test]
    fn test_preview_includes_last_iter() {
        let points = schedule().preview(1500);
        let iters: Vec<_> = points.iter().map(|p| p.iter).collect();
        assert_eq!(iters, vec![0, 1500, 3000, 4500, 5000]);
        assert_eq!(schedule().preview(0).len(), 5001);
    }
}
