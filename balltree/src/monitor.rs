/*
* Licensed to Elasticsearch B.V. under one or more contributor
* license agreements. See the NOTICE file distributed with
* this work for additional information regarding copyright
* ownership. Elasticsearch B.V. licenses this file to you under
* the Apache License, Version 2.0 (the "License"); you may
* not use this file except in compliance with the License.
* You may obtain a copy of the License at
*
*  http://www.apache.org/licenses/LICENSE-2.0
*
* Unless required by applicable law or agreed to in writing,
* software distributed under the License is distributed on an
* "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
* KIND, either express or implied.  See the License for the
* specific language governing permissions and limitations
* under the License.
*/

//! Capabilities handed to long running builds and bulk queries: a way to ask them to stop, and a
//! place for them to report how far along they are. Neither changes any result.

use log::info;
use pbr::ProgressBar;
use std::io::Stdout;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Polled once per tree level while building, and once per query.
pub trait CancelCheck: Sync {
    /// If the caller wants the work abandoned
    fn must_cancel(&self) -> bool;
}

/// Never asks for cancellation
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverCancel;

impl CancelCheck for NeverCancel {
    #[inline]
    fn must_cancel(&self) -> bool {
        false
    }
}

/// A flag that another thread can raise.
#[derive(Debug, Default)]
pub struct CancelFlag {
    flag: AtomicBool,
}

impl CancelFlag {
    /// A lowered flag
    pub fn new() -> CancelFlag {
        CancelFlag::default()
    }

    /// Raises the flag, the next poll fails with `Cancelled`
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Lowers the flag again
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

impl CancelCheck for CancelFlag {
    #[inline]
    fn must_cancel(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Where a build or a bulk query is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// A tree level finished splitting
    TreeLevel {
        /// The level that just finished, the root is level 0
        level: usize,
        /// Depth of the tree being built
        depth: usize,
    },
    /// Some queries of a batch are done
    Queries {
        /// Finished so far
        done: usize,
        /// Size of the batch
        total: usize,
    },
}

impl Progress {
    fn counts(&self) -> (u64, u64) {
        match *self {
            Progress::TreeLevel { level, depth } => ((level + 1) as u64, depth as u64),
            Progress::Queries { done, total } => (done as u64, total as u64),
        }
    }
}

/// Receives progress reports along with the time elapsed since the work began.
pub trait ProgressSink: Sync {
    /// Called from worker threads, possibly concurrently
    fn report(&self, progress: Progress, elapsed: Duration);
}

/// Drops every report
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    #[inline]
    fn report(&self, _progress: Progress, _elapsed: Duration) {}
}

/// Writes every report to the log at info level
#[derive(Debug, Clone, Copy, Default)]
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn report(&self, progress: Progress, elapsed: Duration) {
        match progress {
            Progress::TreeLevel { level, depth } => info!(
                "finished level {} of {} after {:.3}s",
                level + 1,
                depth,
                elapsed.as_secs_f32()
            ),
            Progress::Queries { done, total } => info!(
                "finished {} of {} queries after {:.3}s",
                done,
                total,
                elapsed.as_secs_f32()
            ),
        }
    }
}

/// Draws a progress bar on stdout.
#[derive(Default)]
pub struct BarProgress {
    bar: Mutex<Option<ProgressBar<Stdout>>>,
}

impl BarProgress {
    /// No bar is drawn until the first report arrives
    pub fn new() -> BarProgress {
        BarProgress::default()
    }
}

impl ProgressSink for BarProgress {
    fn report(&self, progress: Progress, _elapsed: Duration) {
        let (done, total) = progress.counts();
        let mut bar = self.bar.lock().unwrap_or_else(PoisonError::into_inner);
        if bar.as_ref().map_or(true, |pb| pb.total != total) {
            let mut pb = ProgressBar::new(total);
            pb.format("╢▌▌░╟");
            *bar = Some(pb);
        }
        if let Some(pb) = bar.as_mut() {
            pb.set(done);
            if done >= total {
                pb.finish();
                *bar = None;
            }
        }
    }
}
