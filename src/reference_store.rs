use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::NormalizedFrame;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("template {0} not found")]
    NotFound(u64),
}

/// Secuencia ejemplar de una seña, creada una vez y de solo lectura.
/// Registro plano sin referencias internas, serializable a JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceTemplate {
    pub id: u64,
    pub name: Option<String>,
    pub frames: Vec<NormalizedFrame>,
}

/// Colección con clave de plantillas de referencia; la fuente de datos
/// del matcher. Muchos lectores, escritor ocasional (autoría de señas).
pub struct ReferenceStore {
    templates: Vec<ReferenceTemplate>,
    next_id: u64,
}

impl ReferenceStore {
    pub fn new() -> Self {
        Self {
            templates: Vec::new(),
            next_id: 0,
        }
    }

    /// Da de alta una plantilla con id nuevo y devuelve el id asignado
    pub fn create(&mut self, name: Option<String>, frames: Vec<NormalizedFrame>) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.templates.push(ReferenceTemplate { id, name, frames });
        id
    }

    pub fn all(&self) -> &[ReferenceTemplate] {
        &self.templates
    }

    pub fn get(&self, id: u64) -> Option<&ReferenceTemplate> {
        self.templates.iter().find(|t| t.id == id)
    }

    pub fn delete(&mut self, id: u64) -> Result<(), StoreError> {
        let idx = self
            .templates
            .iter()
            .position(|t| t.id == id)
            .ok_or(StoreError::NotFound(id))?;
        self.templates.remove(idx);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Escribe cada plantilla como un JSON independiente en `dir`
    pub fn save_to_dir(&self, dir: impl AsRef<Path>) -> Result<(), StoreError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        for template in &self.templates {
            let path = dir.join(format!("sign_{:05}.json", template.id));
            let json = serde_json::to_string_pretty(template)?;
            fs::write(path, json)?;
        }

        Ok(())
    }

    /// Carga todas las plantillas `.json` de un directorio.
    /// El contador de ids continúa después del máximo encontrado.
    pub fn load_from_dir(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let mut templates = Vec::new();

        for entry in fs::read_dir(dir.as_ref())? {
            let path = entry?.path();
            let is_json = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("json"))
                .unwrap_or(false);
            if !is_json {
                continue;
            }

            let content = fs::read_to_string(&path)?;
            let template: ReferenceTemplate = serde_json::from_str(&content)?;
            templates.push(template);
        }

        // Orden estable por id para que el ranking sea reproducible
        templates.sort_by_key(|t| t.id);
        let next_id = templates.iter().map(|t| t.id + 1).max().unwrap_or(0);

        Ok(Self { templates, next_id })
    }
}

impl Default for ReferenceStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Landmark, LandmarkMap, NormalizedFrame, Side, Transform};

    fn sample_frames() -> Vec<NormalizedFrame> {
        (0..3)
            .map(|i| {
                let mut map = LandmarkMap::new();
                map.insert("wrist".to_string(), Landmark::new(i as f32 * 0.1, 0.5, 0.9));
                NormalizedFrame {
                    id: i,
                    timestamp: i as f64 / 24.0,
                    side: Side::Left,
                    landmarks: map,
                    transform: Transform::default(),
                }
            })
            .collect()
    }

    #[test]
    fn test_create_assigns_increasing_ids() {
        let mut store = ReferenceStore::new();
        let a = store.create(Some("hola".to_string()), sample_frames());
        let b = store.create(Some("gracias".to_string()), sample_frames());
        assert_ne!(a, b);
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(a).unwrap().name.as_deref(), Some("hola"));
    }

    #[test]
    fn test_delete_missing_is_error() {
        let mut store = ReferenceStore::new();
        let id = store.create(None, sample_frames());
        assert!(store.delete(id).is_ok());
        assert!(matches!(store.delete(id), Err(StoreError::NotFound(_))));
        assert!(store.is_empty());
    }

    #[test]
    fn test_save_and_load_dir() {
        let dir = std::env::temp_dir().join("signoscopio_store_test");
        let _ = fs::remove_dir_all(&dir);

        let mut store = ReferenceStore::new();
        let id = store.create(Some("hola".to_string()), sample_frames());
        store.save_to_dir(&dir).unwrap();

        let loaded = ReferenceStore::load_from_dir(&dir).unwrap();
        assert_eq!(loaded.len(), 1);
        let template = loaded.get(id).unwrap();
        assert_eq!(template.name.as_deref(), Some("hola"));
        assert_eq!(template.frames.len(), 3);

        // los ids nuevos continúan después de los persistidos
        let mut loaded = loaded;
        let next = loaded.create(None, sample_frames());
        assert!(next > id);

        let _ = fs::remove_dir_all(&dir);
    }
}
