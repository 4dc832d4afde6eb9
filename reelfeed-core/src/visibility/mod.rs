//! Visibility Tracker.
//!
//! The rendering layer owns the actual geometry; it reports intersection
//! samples per element and this module turns them into focus edges. One
//! observer exists per element, and every subscription hands back a
//! [`VisibilitySubscription`] whose drop (or `unsubscribe`) releases it.
//!
//! ```text
//! NotObserved --subscribe--> Observed/NotFocused <--> Observed/Focused
//!      ^                              |                       |
//!      +-----------unsubscribe--------+-----------------------+
//! ```

use std::{
    fmt,
    sync::{
        Arc, Weak,
        atomic::{AtomicU64, Ordering},
    },
};

use dashmap::DashMap;
use tracing::{debug, trace};

use crate::{config::VisibilityConfig, error::ConfigError};

/// Opaque handle for a rendered region, assigned by the UI layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "element#{}", self.0)
    }
}

/// A Focused/NotFocused edge for one element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FocusChange {
    pub element: ElementId,
    pub focused: bool,
    pub ratio: f32,
    /// Number of report thresholds the sample reached.
    pub band: usize,
}

pub type FocusCallback = Arc<dyn Fn(FocusChange) + Send + Sync>;

struct Observer {
    generation: u64,
    focused: bool,
    band: usize,
    last_ratio: Option<f32>,
    on_change: FocusCallback,
}

struct TrackerInner {
    config: VisibilityConfig,
    observers: DashMap<ElementId, Observer>,
    generations: AtomicU64,
}

impl TrackerInner {
    fn release(&self, element: ElementId, generation: u64) -> bool {
        let removed = self
            .observers
            .remove_if(&element, |_, obs| obs.generation == generation)
            .is_some();
        if removed {
            trace!("visibility observer released: {}", element);
        }
        removed
    }
}

/// Registry of per-element observers. Clones share state.
#[derive(Clone)]
pub struct VisibilityTracker {
    inner: Arc<TrackerInner>,
}

impl fmt::Debug for VisibilityTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VisibilityTracker")
            .field("config", &self.inner.config)
            .field("observers", &self.inner.observers.len())
            .finish()
    }
}

impl VisibilityTracker {
    pub fn new(config: VisibilityConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut config = config;
        config.report_thresholds.sort_by(f32::total_cmp);
        config.report_thresholds.dedup();

        Ok(Self {
            inner: Arc::new(TrackerInner {
                config,
                observers: DashMap::new(),
                generations: AtomicU64::new(0),
            }),
        })
    }

    pub fn focus_threshold(&self) -> f32 {
        self.inner.config.focus_threshold
    }

    /// Start observing `element`. An existing observer for the same element
    /// is replaced, so there is never more than one. A replaced observer
    /// that was focused is told it lost focus first.
    pub fn subscribe<F>(
        &self,
        element: ElementId,
        on_change: F,
    ) -> VisibilitySubscription
    where
        F: Fn(FocusChange) + Send + Sync + 'static,
    {
        let generation = self.inner.generations.fetch_add(1, Ordering::Relaxed);
        let observer = Observer {
            generation,
            focused: false,
            band: 0,
            last_ratio: None,
            on_change: Arc::new(on_change),
        };
        if let Some(displaced) = self.inner.observers.insert(element, observer)
        {
            debug!("visibility observer replaced: {}", element);
            if displaced.focused {
                (displaced.on_change)(FocusChange {
                    element,
                    focused: false,
                    ratio: displaced.last_ratio.unwrap_or(0.0),
                    band: displaced.band,
                });
            }
        }

        VisibilitySubscription {
            tracker: Arc::downgrade(&self.inner),
            element,
            generation,
            active: true,
        }
    }

    /// Feed one intersection sample. Returns the focus edge it caused, if
    /// any, after the observer's callback has run. Samples for elements
    /// that are not observed are ignored.
    pub fn report(
        &self,
        element: ElementId,
        ratio: f32,
        is_intersecting: bool,
    ) -> Option<FocusChange> {
        let ratio = if ratio.is_finite() {
            ratio.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let config = &self.inner.config;
        let focused = is_intersecting && ratio >= config.focus_threshold;
        let band = if is_intersecting {
            config
                .report_thresholds
                .iter()
                .take_while(|t| ratio >= **t)
                .count()
        } else {
            0
        };

        let (change, callback) = {
            let mut observer = self.inner.observers.get_mut(&element)?;
            observer.last_ratio = Some(ratio);
            observer.band = band;
            if observer.focused == focused {
                return None;
            }
            observer.focused = focused;
            let change = FocusChange {
                element,
                focused,
                ratio,
                band,
            };
            (change, Arc::clone(&observer.on_change))
        };

        trace!(
            "{} focus -> {} (ratio {:.2}, band {})",
            element, focused, ratio, band
        );
        callback(change);
        Some(change)
    }

    pub fn is_focused(&self, element: ElementId) -> bool {
        self.inner
            .observers
            .get(&element)
            .is_some_and(|obs| obs.focused)
    }

    /// Highest report band reached by the last sample, if observed.
    pub fn band(&self, element: ElementId) -> Option<usize> {
        self.inner.observers.get(&element).map(|obs| obs.band)
    }

    pub fn last_ratio(&self, element: ElementId) -> Option<f32> {
        self.inner.observers.get(&element)?.last_ratio
    }

    pub fn is_observed(&self, element: ElementId) -> bool {
        self.inner.observers.contains_key(&element)
    }

    pub fn observer_count(&self) -> usize {
        self.inner.observers.len()
    }
}

/// Cleanup handle for one observer. Dropping it releases the observer.
#[must_use = "dropping the subscription releases the observer immediately"]
pub struct VisibilitySubscription {
    tracker: Weak<TrackerInner>,
    element: ElementId,
    generation: u64,
    active: bool,
}

impl fmt::Debug for VisibilitySubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VisibilitySubscription")
            .field("element", &self.element)
            .field("generation", &self.generation)
            .field("active", &self.active)
            .finish()
    }
}

impl VisibilitySubscription {
    pub fn element(&self) -> ElementId {
        self.element
    }

    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if !std::mem::take(&mut self.active) {
            return;
        }
        if let Some(tracker) = self.tracker.upgrade() {
            tracker.release(self.element, self.generation);
        }
    }
}

impl Drop for VisibilitySubscription {
    fn drop(&mut self) {
        self.release();
    }
}
