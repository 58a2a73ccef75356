//! 简单的有序角色表

use std::collections::BTreeMap;

use super::{Scene, Target, TargetId};

/// 按 id 有序保存角色的场景
#[derive(Debug, Clone)]
pub struct SceneGraph {
    stage_name: String,
    targets: BTreeMap<TargetId, Target>,
    next_id: u64,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::with_stage_name("Stage")
    }

    pub fn with_stage_name(stage_name: impl Into<String>) -> Self {
        Self {
            stage_name: stage_name.into(),
            targets: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// 分配新 id 并创建角色
    pub fn spawn(&mut self, name: impl Into<String>) -> TargetId {
        let id = TargetId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.targets.insert(id, Target::new(id, name));
        id
    }

    /// 插入现成的角色（同 id 会被替换）
    pub fn insert(&mut self, target: Target) -> TargetId {
        let id = target.id;
        self.next_id = self.next_id.max(id.0.saturating_add(1));
        self.targets.insert(id, target);
        id
    }

    /// 删除角色，对应的刚体会在下一次步进时被清理
    pub fn remove(&mut self, id: TargetId) -> Option<Target> {
        self.targets.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene for SceneGraph {
    fn target(&self, id: TargetId) -> Option<&Target> {
        self.targets.get(&id)
    }

    fn target_mut(&mut self, id: TargetId) -> Option<&mut Target> {
        self.targets.get_mut(&id)
    }

    fn target_ids(&self) -> Vec<TargetId> {
        self.targets.keys().copied().collect()
    }

    fn stage_name(&self) -> &str {
        &self.stage_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_after_insert_skips_used_ids() {
        let mut graph = SceneGraph::new();
        graph.insert(Target::new(TargetId(7), "cat"));
        let id = graph.spawn("dog");
        assert_eq!(id, TargetId(8));
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn test_insert_max_id() {
        let mut graph = SceneGraph::new();
        let id = graph.insert(Target::new(TargetId(u64::MAX), "edge"));
        assert_eq!(id, TargetId(u64::MAX));
        assert_eq!(graph.target(id).map(|t| t.name.as_str()), Some("edge"));
        assert_eq!(graph.len(), 1);
    }
}
