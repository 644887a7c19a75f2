//! Configuration event queue
//!
//! The developer panel describes every change it wants as a [`ConfigEvent`].
//! Events are pushed while frame N draws its GUI and become visible after
//! [`EventQueue::swap`] at the start of frame N+1, so scene parameters never
//! change halfway through a frame.
//!
//! # Example
//!
//! ```ignore
//! // In the panel
//! ctx.events.push(ConfigEvent::SetPixelSize(8));
//!
//! // Next frame, in Game::update
//! for event in ctx.events.iter() {
//!     if let Err(e) = params.apply(event) {
//!         log::warn!("Rejected {event:?}: {e}");
//!     }
//! }
//! ```

use std::collections::VecDeque;

use glam::Vec3;

use crate::renderer::{Projection, SkyParams, WaterParams};

/// A single requested configuration change.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum ConfigEvent {
    // -------------------------------------------------------------------------
    // Pixelation
    // -------------------------------------------------------------------------
    SetPixelSize(u32),
    SetNormalEdgeStrength(f32),
    SetDepthEdgeStrength(f32),
    /// Toggle pixel-grid alignment of the camera
    SetPixelAlignedPanning(bool),

    // -------------------------------------------------------------------------
    // Palette
    // -------------------------------------------------------------------------
    SetPaletteEnabled(bool),
    SetPaletteOpacity(f32),
    /// Replace one palette entry
    SetPaletteColor {
        index: usize,
        color: Vec3,
    },
    PushPaletteColor(Vec3),
    RemovePaletteColor(usize),
    /// Restore the default palette
    ResetPalette,

    // -------------------------------------------------------------------------
    // Environment
    // -------------------------------------------------------------------------
    SetSky(SkyParams),
    SetWater(WaterParams),

    // -------------------------------------------------------------------------
    // Camera
    // -------------------------------------------------------------------------
    SetProjection(Projection),
    SetAutoPan(bool),
    SetOrthoZoom(f32),
}

/// Double-buffered event queue for frame-consistent event processing.
///
/// Events pushed during frame N are available for reading during frame N+1.
#[derive(Debug)]
pub struct EventQueue {
    /// Events being written this frame
    pending: VecDeque<ConfigEvent>,
    /// Events from previous frame, ready for processing
    processing: VecDeque<ConfigEvent>,
}

impl EventQueue {
    const DEFAULT_CAPACITY: usize = 16;

    /// Create a new event queue with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pending: VecDeque::with_capacity(capacity),
            processing: VecDeque::with_capacity(capacity),
        }
    }

    /// Push an event to be processed next frame.
    #[inline]
    pub fn push(&mut self, event: ConfigEvent) {
        self.pending.push_back(event);
    }

    /// Swap the pending and processing queues.
    ///
    /// Call this once per frame, before the update step. Unprocessed events
    /// of the previous frame are dropped.
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.pending, &mut self.processing);
        self.pending.clear();
    }

    /// Iterate over events from the previous frame.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &ConfigEvent> {
        self.processing.iter()
    }

    /// Drain all events from the previous frame.
    #[inline]
    pub fn drain(&mut self) -> impl Iterator<Item = ConfigEvent> + '_ {
        self.processing.drain(..)
    }

    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.processing.is_empty()
    }

    /// Get the number of events ready for processing.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.processing.len()
    }

    /// Get the number of events pending for next frame.
    #[must_use]
    #[inline]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Clear all events (both pending and processing).
    pub fn clear(&mut self) {
        self.pending.clear();
        self.processing.clear();
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_queue_push_and_swap() {
        let mut queue = EventQueue::new();

        queue.push(ConfigEvent::SetPixelSize(8));
        assert!(queue.is_empty(), "Events should not be visible before swap");

        queue.swap();
        assert_eq!(queue.len(), 1);
        let events: Vec<_> = queue.iter().collect();
        assert_eq!(events[0], &ConfigEvent::SetPixelSize(8));
    }

    #[test]
    fn test_event_queue_double_buffer_isolation() {
        let mut queue = EventQueue::new();

        // Frame 1
        queue.push(ConfigEvent::SetPaletteEnabled(false));
        queue.swap();

        // Frame 2: the GUI pushes while frame 1's events are processed
        queue.push(ConfigEvent::SetPaletteEnabled(true));
        let events: Vec<_> = queue.iter().cloned().collect();
        assert_eq!(events, vec![ConfigEvent::SetPaletteEnabled(false)]);

        // Frame 3
        queue.swap();
        let events: Vec<_> = queue.iter().cloned().collect();
        assert_eq!(events, vec![ConfigEvent::SetPaletteEnabled(true)]);
    }

    #[test]
    fn test_event_queue_preserves_order() {
        let mut queue = EventQueue::new();
        queue.push(ConfigEvent::SetPixelSize(2));
        queue.push(ConfigEvent::SetPixelSize(3));
        queue.swap();

        let events: Vec<_> = queue.drain().collect();
        assert_eq!(
            events,
            vec![ConfigEvent::SetPixelSize(2), ConfigEvent::SetPixelSize(3)]
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn test_event_queue_clear() {
        let mut queue = EventQueue::new();

        queue.push(ConfigEvent::ResetPalette);
        queue.swap();
        queue.push(ConfigEvent::SetAutoPan(true));

        queue.clear();

        assert!(queue.is_empty());
        assert_eq!(queue.pending_count(), 0);
    }

    #[test]
    fn test_swap_drops_stale_events() {
        let mut queue = EventQueue::new();
        queue.push(ConfigEvent::SetAutoPan(true));
        queue.swap();
        queue.swap();
        assert!(queue.is_empty());
    }
}
