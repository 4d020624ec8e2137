/// Named mesh registry with an active-mesh cursor
use log::{info, warn};
use std::collections::BTreeMap;
use std::ops::Bound;

use crate::error::SceneError;
use crate::mat4::Mat4;
use crate::mesh::Mesh;
use crate::transform::Transform;

/// Meshes keyed by name, iterated in lexicographic order.
///
/// While the scene is non-empty exactly one mesh is active; an empty scene has
/// no active mesh.
#[derive(Debug, Default)]
pub struct Scene {
    meshes: BTreeMap<String, Mesh>,
    active: Option<String>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `mesh` under `name`. The first mesh added to an empty scene
    /// becomes active.
    ///
    /// A name that is already taken keeps its mesh; the new one is dropped,
    /// releasing its device buffers.
    pub fn add(&mut self, name: impl Into<String>, mesh: Mesh) -> Result<(), SceneError> {
        let name = name.into();
        if self.meshes.contains_key(&name) {
            warn!("mesh '{}' already exists, discarding the new one", name);
            return Err(SceneError::DuplicateName(name));
        }
        if self.active.is_none() {
            self.active = Some(name.clone());
        }
        info!("added mesh '{}'", name);
        self.meshes.insert(name, mesh);
        Ok(())
    }

    /// Drop the named mesh. Removing the active mesh activates the next one
    /// in order, wrapping to the first.
    pub fn remove(&mut self, name: &str) -> Result<(), SceneError> {
        if self.meshes.remove(name).is_none() {
            return Err(SceneError::NotFound(name.to_string()));
        }
        info!("removed mesh '{}'", name);

        if self.active.as_deref() == Some(name) {
            self.active = self
                .meshes
                .range::<str, _>((Bound::Excluded(name), Bound::Unbounded))
                .next()
                .or_else(|| self.meshes.iter().next())
                .map(|(key, _)| key.clone());
            match &self.active {
                Some(next) => warn!("active mesh '{}' removed, '{}' is now active", name, next),
                None => warn!("active mesh '{}' removed, scene is empty", name),
            }
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        info!("cleared {} meshes", self.meshes.len());
        self.meshes.clear();
        self.active = None;
    }

    /// Draw every mesh in name order.
    pub fn draw(&self, view: &Transform, projection: &Mat4) -> Result<(), SceneError> {
        for mesh in self.meshes.values() {
            mesh.draw(view, projection)?;
        }
        Ok(())
    }

    pub fn has_mesh(&self, name: &str) -> bool {
        self.meshes.contains_key(name)
    }

    pub fn get_mesh(&self, name: &str) -> Result<&Mesh, SceneError> {
        self.meshes
            .get(name)
            .ok_or_else(|| SceneError::NotFound(name.to_string()))
    }

    pub fn get_mesh_mut(&mut self, name: &str) -> Result<&mut Mesh, SceneError> {
        self.meshes
            .get_mut(name)
            .ok_or_else(|| SceneError::NotFound(name.to_string()))
    }

    pub fn set_active_mesh(&mut self, name: &str) -> Result<(), SceneError> {
        if !self.meshes.contains_key(name) {
            return Err(SceneError::NotFound(name.to_string()));
        }
        self.active = Some(name.to_string());
        Ok(())
    }

    pub fn active_name(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn active_mesh(&self) -> Result<&Mesh, SceneError> {
        let name = self.active.as_deref().ok_or(SceneError::Empty)?;
        self.get_mesh(name)
    }

    pub fn active_mesh_mut(&mut self) -> Result<&mut Mesh, SceneError> {
        let name = self.active.clone().ok_or(SceneError::Empty)?;
        self.get_mesh_mut(&name)
    }

    /// Advance the cursor, wrapping past the last mesh to the first.
    pub fn activate_next_mesh(&mut self) -> Result<&str, SceneError> {
        let current = self.active.as_deref().ok_or(SceneError::Empty)?;
        let next = self
            .meshes
            .range::<str, _>((Bound::Excluded(current), Bound::Unbounded))
            .next()
            .or_else(|| self.meshes.iter().next())
            .map(|(key, _)| key.clone())
            .ok_or(SceneError::Empty)?;
        Ok(self.active.insert(next).as_str())
    }

    /// Step the cursor back, wrapping past the first mesh to the last.
    pub fn activate_previous_mesh(&mut self) -> Result<&str, SceneError> {
        let current = self.active.as_deref().ok_or(SceneError::Empty)?;
        let previous = self
            .meshes
            .range::<str, _>((Bound::Unbounded, Bound::Excluded(current)))
            .next_back()
            .or_else(|| self.meshes.iter().next_back())
            .map(|(key, _)| key.clone())
            .ok_or(SceneError::Empty)?;
        Ok(self.active.insert(previous).as_str())
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.meshes.keys().map(String::as_str)
    }
}
