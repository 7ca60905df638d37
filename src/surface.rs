//! Registered surfaces
//!
//! Fragments name surfaces by opaque handle. A surface must be registered
//! before input for it is processed; input for unknown handles is dropped by
//! the normalizer.

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::protocol::SurfaceId;
use crate::scale::ScaleContext;

/// What the normalizer knows about one surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceInfo {
    pub id: SurfaceId,
    /// Logical size
    pub width: i32,
    pub height: i32,
    pub scale: ScaleContext,
}

impl SurfaceInfo {
    pub fn new(id: SurfaceId, width: i32, height: i32, scale: ScaleContext) -> Self {
        Self {
            id,
            width,
            height,
            scale,
        }
    }

    /// Whether a logical point lies inside the surface.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.width && y >= 0 && y < self.height
    }
}

/// Surface handle lookup table.
#[derive(Debug, Default)]
pub struct SurfaceRegistry {
    surfaces: HashMap<SurfaceId, SurfaceInfo>,
}

impl SurfaceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a surface.
    pub fn register(&mut self, info: SurfaceInfo) -> Option<SurfaceInfo> {
        debug!(
            "registered {} ({}x{}, scale {:.3}/{})",
            info.id,
            info.width,
            info.height,
            info.scale.effective_scale(),
            info.scale.output_scale()
        );
        self.surfaces.insert(info.id, info)
    }

    pub fn unregister(&mut self, id: SurfaceId) -> Option<SurfaceInfo> {
        let removed = self.surfaces.remove(&id);
        if removed.is_some() {
            debug!("unregistered {}", id);
        }
        removed
    }

    /// Swap in a new scale for a surface that moved to another output.
    /// Returns false if the surface is unknown.
    pub fn update_scale(&mut self, id: SurfaceId, scale: ScaleContext) -> bool {
        match self.surfaces.get_mut(&id) {
            Some(info) => {
                info.scale = scale;
                true
            }
            None => false,
        }
    }

    pub fn resize(&mut self, id: SurfaceId, width: i32, height: i32) -> bool {
        match self.surfaces.get_mut(&id) {
            Some(info) => {
                info.width = width;
                info.height = height;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: SurfaceId) -> Option<&SurfaceInfo> {
        self.surfaces.get(&id)
    }

    pub fn contains(&self, id: SurfaceId) -> bool {
        self.surfaces.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_unregister() {
        let mut registry = SurfaceRegistry::new();
        let id = SurfaceId(3);
        assert!(registry
            .register(SurfaceInfo::new(id, 640, 480, ScaleContext::default()))
            .is_none());
        assert!(registry.contains(id));
        assert_eq!(registry.len(), 1);

        assert!(registry.unregister(id).is_some());
        assert!(registry.unregister(id).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_scale_is_replaced_wholesale() {
        let mut registry = SurfaceRegistry::new();
        let id = SurfaceId(4);
        registry.register(SurfaceInfo::new(id, 100, 100, ScaleContext::default()));
        assert!(registry.update_scale(id, ScaleContext::integer(2)));
        assert_eq!(registry.get(id).unwrap().scale, ScaleContext::integer(2));
        assert!(!registry.update_scale(SurfaceId(5), ScaleContext::integer(2)));
    }

    #[test]
    fn test_bounds() {
        let info = SurfaceInfo::new(SurfaceId(1), 10, 5, ScaleContext::default());
        assert!(info.contains(0, 0));
        assert!(info.contains(9, 4));
        assert!(!info.contains(10, 4));
        assert!(!info.contains(-1, 0));
    }
}
