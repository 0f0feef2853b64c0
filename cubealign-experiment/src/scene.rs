//! In-memory scene used when no engine is attached.

use crate::collab::{DieHandle, ObjectFactory, PoseSource, TargetHandle};
use cubealign_core::Pose;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    pub pose: Pose,
    pub scale: f64,
    pub active: bool,
}

/// Counters of factory requests, for inspecting a finished session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SceneStats {
    pub dies_created: u32,
    pub dies_destroyed: u32,
    pub targets_created: u32,
    pub targets_destroyed: u32,
    pub die_placements: u32,
    pub die_deactivations: u32,
}

#[derive(Debug, Clone)]
pub struct MemoryScene {
    next_id: u32,
    dies: HashMap<DieHandle, SceneObject>,
    targets: HashMap<TargetHandle, SceneObject>,
    head: Option<Pose>,
    has_die_prefab: bool,
    has_target_prefab: bool,
    stats: SceneStats,
}

impl Default for MemoryScene {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryScene {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            dies: HashMap::new(),
            targets: HashMap::new(),
            head: None,
            has_die_prefab: true,
            has_target_prefab: true,
            stats: SceneStats::default(),
        }
    }

    /// Scene whose die cannot be created.
    pub fn without_die_prefab() -> Self {
        Self {
            has_die_prefab: false,
            ..Self::new()
        }
    }

    /// Scene whose targets cannot be created.
    pub fn without_target_prefab() -> Self {
        Self {
            has_target_prefab: false,
            ..Self::new()
        }
    }

    pub fn set_head_pose(&mut self, pose: Option<Pose>) {
        self.head = pose;
    }

    /// Hand tracking moved the die.
    pub fn move_die(&mut self, die: DieHandle, pose: Pose) {
        if let Some(object) = self.dies.get_mut(&die) {
            object.pose = pose;
        }
    }

    pub fn die(&self, die: DieHandle) -> Option<&SceneObject> {
        self.dies.get(&die)
    }

    pub fn target(&self, target: TargetHandle) -> Option<&SceneObject> {
        self.targets.get(&target)
    }

    pub fn live_targets(&self) -> usize {
        self.targets.len()
    }

    pub fn stats(&self) -> SceneStats {
        self.stats
    }

    fn allocate(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

impl ObjectFactory for MemoryScene {
    fn create_die(&mut self) -> Option<DieHandle> {
        if !self.has_die_prefab {
            return None;
        }
        let handle = DieHandle(self.allocate());
        self.dies.insert(
            handle,
            SceneObject {
                pose: Pose::identity(),
                scale: 1.0,
                active: true,
            },
        );
        self.stats.dies_created += 1;
        Some(handle)
    }

    fn destroy_die(&mut self, die: DieHandle) {
        if self.dies.remove(&die).is_some() {
            self.stats.dies_destroyed += 1;
        }
    }

    fn create_target(&mut self, pose: Pose, scale: f64) -> Option<TargetHandle> {
        if !self.has_target_prefab {
            return None;
        }
        let handle = TargetHandle(self.allocate());
        self.targets.insert(
            handle,
            SceneObject {
                pose,
                scale,
                active: true,
            },
        );
        self.stats.targets_created += 1;
        Some(handle)
    }

    fn destroy_target(&mut self, target: TargetHandle) {
        if self.targets.remove(&target).is_some() {
            self.stats.targets_destroyed += 1;
        }
    }

    fn place_die(&mut self, die: DieHandle, pose: Pose, scale: f64) {
        if let Some(object) = self.dies.get_mut(&die) {
            object.pose = pose;
            object.scale = scale;
            self.stats.die_placements += 1;
        }
    }

    fn set_die_active(&mut self, die: DieHandle, active: bool) {
        if let Some(object) = self.dies.get_mut(&die) {
            if object.active && !active {
                self.stats.die_deactivations += 1;
            }
            object.active = active;
        }
    }
}

impl PoseSource for MemoryScene {
    fn die_pose(&self, die: DieHandle) -> Option<Pose> {
        self.dies.get(&die).map(|o| o.pose)
    }

    fn target_pose(&self, target: TargetHandle) -> Option<Pose> {
        self.targets.get(&target).map(|o| o.pose)
    }

    fn head_pose(&self) -> Option<Pose> {
        self.head
    }
}
