use std::collections::BTreeMap;

use thiserror::Error;

use crate::{
    app::options::OptionsError,
    render::{canvas::Canvas, elements::ElementContainer},
};

#[derive(Debug, Error)]
pub enum CloudError {
    #[error("word cloud needs at least one target surface")]
    NoTarget,
    #[error("no target registered under id {0:?}")]
    UnknownTarget(String),
    #[error("more than one {0} target given")]
    DuplicateTarget(&'static str),
    #[error(transparent)]
    Options(#[from] OptionsError),
    #[error("word cloud task has shut down")]
    Closed,
}

/// A single output surface.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Canvas(Canvas),
    Container(ElementContainer),
}

impl Target {
    fn kind(&self) -> &'static str {
        match self {
            Self::Canvas(_) => "canvas",
            Self::Container(_) => "container",
        }
    }
}

/// Named surfaces a caller can refer to by id when building a cloud.
#[derive(Debug, Default)]
pub struct TargetRegistry {
    targets: BTreeMap<String, Target>,
}

impl TargetRegistry {
    pub fn insert(&mut self, id: impl Into<String>, target: Target) {
        self.targets.insert(id.into(), target);
    }

    pub fn take(&mut self, id: &str) -> Result<Target, CloudError> {
        self.targets
            .remove(id)
            .ok_or_else(|| CloudError::UnknownTarget(id.to_string()))
    }

}

/// Raster canvas and element container a run paints into. The canvas, when
/// present, is the primary surface and decides the grid extent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TargetSet {
    pub canvas: Option<Canvas>,
    pub container: Option<ElementContainer>,
}

impl TargetSet {
    pub fn new(targets: impl IntoIterator<Item = Target>) -> Result<Self, CloudError> {
        let mut set = Self::default();
        for target in targets {
            let kind = target.kind();
            match target {
                Target::Canvas(canvas) if set.canvas.is_none() => set.canvas = Some(canvas),
                Target::Container(container) if set.container.is_none() => {
                    set.container = Some(container);
                }
                _ => return Err(CloudError::DuplicateTarget(kind)),
            }
        }
        if set.canvas.is_none() && set.container.is_none() {
            return Err(CloudError::NoTarget);
        }
        Ok(set)
    }

    /// Resolves every id against `registry`; any unknown id fails the whole set.
    pub fn resolve(registry: &mut TargetRegistry, ids: &[&str]) -> Result<Self, CloudError> {
        let targets = ids
            .iter()
            .map(|id| registry.take(id))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(targets)
    }

    pub fn surface_size(&self) -> (u32, u32) {
        match (&self.canvas, &self.container) {
            (Some(canvas), _) => (canvas.width(), canvas.height()),
            (None, Some(container)) => (container.width, container.height),
            (None, None) => (0, 0),
        }
    }

    /// Resizes every surface; canvas contents are discarded.
    pub fn resize(&mut self, width: u32, height: u32) {
        if let Some(canvas) = &mut self.canvas {
            canvas.resize(width, height);
        }
        if let Some(container) = &mut self.container {
            container.width = width;
            container.height = height;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_target_list_is_rejected() {
        assert!(matches!(TargetSet::new([]), Err(CloudError::NoTarget)));
    }

    #[test]
    fn canvas_decides_surface_size() {
        let set = TargetSet::new([
            Target::Container(ElementContainer::new(300, 200)),
            Target::Canvas(Canvas::new(100, 50)),
        ])
        .expect("targets");
        assert_eq!(set.surface_size(), (100, 50));
    }

    #[test]
    fn container_alone_provides_size() {
        let set = TargetSet::new([Target::Container(ElementContainer::new(300, 200))])
            .expect("targets");
        assert_eq!(set.surface_size(), (300, 200));
    }

    #[test]
    fn two_canvases_are_rejected() {
        let err = TargetSet::new([
            Target::Canvas(Canvas::new(1, 1)),
            Target::Canvas(Canvas::new(1, 1)),
        ])
        .expect_err("duplicate");
        assert!(matches!(err, CloudError::DuplicateTarget("canvas")));
    }

    #[test]
    fn unknown_id_fails_loudly() {
        let mut registry = TargetRegistry::default();
        registry.insert("cloud", Target::Canvas(Canvas::new(10, 10)));
        let err = TargetSet::resolve(&mut registry, &["cloud", "missing"]).expect_err("unknown");
        assert!(matches!(err, CloudError::UnknownTarget(id) if id == "missing"));
    }

    #[test]
    fn resolve_takes_targets_out_of_registry() {
        let mut registry = TargetRegistry::default();
        registry.insert("cloud", Target::Canvas(Canvas::new(10, 10)));
        registry.insert("words", Target::Container(ElementContainer::new(10, 10)));
        let set = TargetSet::resolve(&mut registry, &["cloud", "words"]).expect("resolve");
        assert!(set.canvas.is_some() && set.container.is_some());
        assert!(matches!(registry.take("cloud"), Err(CloudError::UnknownTarget(_))));
    }

    #[test]
    fn resize_clears_canvas_and_updates_container() {
        let mut set = TargetSet::new([
            Target::Canvas(Canvas::new(4, 4)),
            Target::Container(ElementContainer::new(4, 4)),
        ])
        .expect("targets");
        set.resize(8, 6);
        assert_eq!(set.surface_size(), (8, 6));
        assert_eq!(set.container.as_ref().map(|c| (c.width, c.height)), Some((8, 6)));
    }
}
