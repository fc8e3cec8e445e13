//! Structured notifications emitted while planning and running an operation.
//!
//! The crate never writes messages on its own. Callers hand an [`EventSink`]
//! to the operations and decide what to do with each [`GridEvent`]:
//! [`TracingSink`] forwards them to `tracing`, [`RecordingSink`] keeps them
//! for later inspection.
//!
//! [`EventSink`]: ./trait.EventSink.html
//! [`GridEvent`]: ./enum.GridEvent.html
//! [`TracingSink`]: ./struct.TracingSink.html
//! [`RecordingSink`]: ./struct.RecordingSink.html

use crate::config::Operation;
use std::sync::Mutex;

/// Something worth reporting about an operation.
#[derive(Debug, Clone, PartialEq)]
pub enum GridEvent {
    /// The operation about to be planned.
    Operation(Operation),
    /// An axis will change its extent.
    AxisChanged {
        /// axis index
        axis: usize,
        /// number of voxels in the input
        old_size: usize,
        /// first input voxel index kept (negative when padding)
        lower: i64,
        /// last input voxel index kept (may lie past the input when padding)
        upper: i64,
        /// number of voxels in the output
        new_size: usize,
    },
    /// Crop or pad bounds equal the input extent on every considered axis.
    NoAxesChanged,
    /// The crop mask has no set voxel.
    EmptyMask,
    /// The output grid was taken from a template image.
    TemplateApplied {
        /// template name, as recorded in the output comments
        name: String,
    },
    /// Oversampling factors chosen for regridding.
    OversampleSelected {
        /// per spatial axis factor
        factors: [usize; 3],
        /// whether the factors were derived from the voxel spacing ratio
        auto: bool,
    },
    /// An explicit oversampling request was dropped for nearest neighbour
    /// interpolation.
    OversampleIgnoredForNearest,
}

/// Receiver of operation events.
pub trait EventSink: Send + Sync {
    /// Handle one event.
    fn emit(&self, event: &GridEvent);
}

/// Event sink forwarding everything to the `tracing` subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &GridEvent) {
        match event {
            GridEvent::Operation(op) => tracing::info!(operation = %op, "operation: {}", op),
            GridEvent::AxisChanged {
                axis,
                old_size,
                lower,
                upper,
                new_size,
            } => tracing::info!(
                axis = *axis,
                old_size = *old_size,
                lower = *lower,
                upper = *upper,
                new_size = *new_size,
                "changing axis {} extent from 0:{} (n={}) to {}:{} (n={})",
                axis,
                *old_size as i64 - 1,
                old_size,
                lower,
                upper,
                new_size
            ),
            GridEvent::NoAxesChanged => tracing::warn!("no axes were changed"),
            GridEvent::EmptyMask => tracing::error!("mask image is empty"),
            GridEvent::TemplateApplied { name } => {
                tracing::info!(template = %name, "regridding to template image")
            }
            GridEvent::OversampleSelected { factors, auto } => tracing::debug!(
                auto = *auto,
                "oversampling factors {:?}",
                factors
            ),
            GridEvent::OversampleIgnoredForNearest => {
                tracing::warn!("oversampling is disabled for nearest neighbour interpolation")
            }
        }
    }
}

/// Event sink which drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: &GridEvent) {}
}

/// Event sink keeping a copy of every event, in order of emission.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<GridEvent>>,
}

impl RecordingSink {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the events received so far.
    pub fn events(&self) -> Vec<GridEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Whether an event equal to `event` was received.
    pub fn contains(&self, event: &GridEvent) -> bool {
        self.events().iter().any(|e| e == event)
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: &GridEvent) {
        let mut events = match self.events.lock() {
            Ok(events) => events,
            Err(poisoned) => poisoned.into_inner(),
        };
        events.push(event.clone());
    }
}
