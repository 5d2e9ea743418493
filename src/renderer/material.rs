//! Materials
//!
//! The dispatcher talks to materials through [`RenderMaterial`]: a shader
//! instance, an opaque update fingerprint, a dirty flag, a uniform setup step
//! and a finalize step that may refuse to draw.

use std::any::Any;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicU32, Ordering};

use glam::Vec4;

use crate::errors::{MosaicError, Result};
use crate::program::{UniformWriter, semantics};
use crate::shader::{CapabilityRegistry, MaterialFeatures, ShaderClassId, ShaderInstance};
use crate::utils::{Edit, Tracked};

/// Material collaborator of the draw dispatcher.
pub trait RenderMaterial: Any + Send + Sync + std::fmt::Debug {
    fn shader(&self) -> &ShaderInstance;

    fn shader_mut(&mut self) -> &mut ShaderInstance;

    /// Features that change the assembled source.
    fn features(&self) -> MaterialFeatures {
        MaterialFeatures::empty()
    }

    /// Opaque string that changes whenever a uniform-affecting property
    /// changes.
    fn update_fingerprint(&mut self) -> &str;

    /// Whether uniforms must be uploaded regardless of the fingerprint.
    fn is_dirty(&self) -> bool {
        false
    }

    /// Uploads per-material uniforms. Returns true if the material should
    /// stay dirty and be uploaded again on its next draw.
    fn set_uniforms(&mut self, writer: &mut UniformWriter<'_>) -> bool;

    /// Last check before the draw call. An error (usually
    /// [`MosaicError::MaterialSetup`]) skips the draw; setup is retried on the
    /// next draw.
    fn finalize(&mut self) -> Result<()> {
        Ok(())
    }

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

static NEXT_MATERIAL_ID: AtomicU32 = AtomicU32::new(1);

/// Uniform-affecting parameters of a [`StandardMaterial`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialParams {
    pub base_color: Vec4,
    /// `Kd`
    pub diffuse: Vec4,
    /// `Ks`
    pub specular: Vec4,
    pub shininess: f32,
    /// Hint for the caller that sorts meshes into the transparent list.
    pub transparent: bool,
}

impl Default for MaterialParams {
    fn default() -> Self {
        Self {
            base_color: Vec4::ONE,
            diffuse: Vec4::ONE,
            specular: Vec4::new(0.5, 0.5, 0.5, 1.0),
            shininess: 32.0,
            transparent: false,
        }
    }
}

/// Diffuse texture slot. Creation and upload happen outside the core; the
/// material only tracks whether the texture can be sampled yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureSlot {
    pub ready: bool,
}

/// Material for the built-in `decal`, `lambert` and `phong` classes.
#[derive(Debug)]
pub struct StandardMaterial {
    id: u32,
    shader: ShaderInstance,
    params: Tracked<MaterialParams>,
    texture: Option<TextureSlot>,
    texture_epoch: u64,
    fingerprint: String,
    fingerprint_version: Option<u64>,
    uploaded_version: Option<u64>,
}

impl StandardMaterial {
    pub fn new(registry: &CapabilityRegistry, class: ShaderClassId) -> Result<Self> {
        Ok(Self {
            id: NEXT_MATERIAL_ID.fetch_add(1, Ordering::Relaxed),
            shader: ShaderInstance::new(registry, class)?,
            params: Tracked::new(MaterialParams::default()),
            texture: None,
            texture_epoch: 0,
            fingerprint: String::new(),
            fingerprint_version: None,
            uploaded_version: None,
        })
    }

    #[must_use]
    pub fn with_params(mut self, params: MaterialParams) -> Self {
        self.params.set(params);
        self
    }

    #[must_use]
    pub fn id(&self) -> u32 {
        self.id
    }

    #[must_use]
    pub fn params(&self) -> &MaterialParams {
        self.params.get()
    }

    /// Mutable access. The fingerprint changes when the guard drops with
    /// different values.
    pub fn params_mut(&mut self) -> Edit<'_, MaterialParams> {
        self.params.edit()
    }

    /// Attaches a diffuse texture slot, not yet ready to sample.
    pub fn set_texture(&mut self, slot: Option<TextureSlot>) {
        self.texture = slot;
        self.texture_epoch += 1;
    }

    pub fn set_texture_ready(&mut self, ready: bool) {
        if let Some(slot) = &mut self.texture {
            slot.ready = ready;
        }
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.params.revision().wrapping_add(self.texture_epoch)
    }
}

impl RenderMaterial for StandardMaterial {
    fn shader(&self) -> &ShaderInstance {
        &self.shader
    }

    fn shader_mut(&mut self) -> &mut ShaderInstance {
        &mut self.shader
    }

    fn features(&self) -> MaterialFeatures {
        if self.texture.is_some() {
            MaterialFeatures::USE_MAP
        } else {
            MaterialFeatures::empty()
        }
    }

    fn update_fingerprint(&mut self) -> &str {
        let version = self.version();
        if self.fingerprint_version != Some(version) {
            self.fingerprint.clear();
            let _ = write!(self.fingerprint, "{}:{}:{version}", self.shader.class().name(), self.id);
            self.fingerprint_version = Some(version);
        }
        &self.fingerprint
    }

    fn is_dirty(&self) -> bool {
        self.uploaded_version != Some(self.version())
    }

    fn set_uniforms(&mut self, writer: &mut UniformWriter<'_>) -> bool {
        let p = *self.params.get();
        writer.set(semantics::MATERIAL_BASE_COLOR, p.base_color);
        writer.set(semantics::DIFFUSE_COLOR, p.diffuse);
        writer.set(semantics::SPECULAR_COLOR, p.specular);
        writer.set(semantics::SHININESS, p.shininess);

        if writer.failed() > 0 {
            return true;
        }
        self.uploaded_version = Some(self.version());
        false
    }

    fn finalize(&mut self) -> Result<()> {
        match self.texture {
            Some(TextureSlot { ready: false }) => Err(MosaicError::MaterialSetup(format!(
                "material {}: diffuse texture not ready",
                self.id
            ))),
            _ => Ok(()),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
