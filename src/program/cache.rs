//! Program Cache
//!
//! Owns the device and every linked program. Programs are addressed through
//! [`ProgramId`] slot-map handles and deduplicated by an xxh3-128 hash of
//! their assembled source, so materials that assemble to the same text share
//! one GL program.
//!
//! # Uniform-write suppression
//!
//! Vector and matrix uniforms have no cheap "did it change" test, so
//! suppression keys on program activation instead of value equality:
//!
//! - [`activate`](ProgramCache::activate) bumps a single global usage counter
//!   whenever the bound program changes, and stamps the program with it.
//! - A non-forced [`set_uniform`](ProgramCache::set_uniform) writes only if the
//!   location was not written since that stamp.
//!
//! A uniform is therefore written at least once per period in which its
//! program stays bound, and never more than once unless forced.

use rustc_hash::FxHashMap;
use slotmap::SlotMap;
use smallvec::SmallVec;
use xxhash_rust::xxh3::Xxh3;

use super::binder::{LightSlot, ProgramBinder};
use super::uniform::UniformLocation;
use super::writer::UniformTarget;
use super::ProgramId;
use crate::errors::{MosaicError, Result};
use crate::gpu::{GraphicsDevice, RawProgram, RawShader, ShaderKind, UniformValue};
use crate::shader::{
    AssembledSource, AssemblyContext, AssemblyInputs, GlslDialect, ShaderClassId, ShaderTable, VertexAttributes,
};
use crate::utils::interner::{self, Symbol};

/// Outcome of a uniform upload request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformWrite {
    /// The value was sent to the device.
    Written,
    /// Already written during the current activation period.
    Suppressed,
    /// The program has no uniform bound under this semantic.
    Absent,
}

/// Running counters, read by the dispatcher to build per-pass stats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgramStats {
    pub programs_linked: u64,
    pub activations: u64,
    pub uniform_writes: u64,
    pub uniform_suppressed: u64,
}

/// A linked program and everything resolved for it after link.
#[derive(Debug)]
pub struct CompiledProgram {
    raw: RawProgram,
    source: AssembledSource,
    hash: u128,
    uniforms: FxHashMap<Symbol, UniformLocation>,
    attributes: SmallVec<[(VertexAttributes, u32); 5]>,
    constants: SmallVec<[(Symbol, UniformValue); 4]>,
    light_slots: SmallVec<[LightSlot; 4]>,
    usage_generation: u64,
    ref_count: u32,
    /// Class revisions whose Prepare stage already ran on this program.
    prepared_for: SmallVec<[(ShaderClassId, u64); 2]>,
}

impl CompiledProgram {
    #[must_use]
    pub fn raw(&self) -> RawProgram {
        self.raw
    }

    #[must_use]
    pub fn source(&self) -> &AssembledSource {
        &self.source
    }

    #[must_use]
    pub fn source_hash(&self) -> u128 {
        self.hash
    }

    /// Global usage counter value at the time this program last became active.
    #[must_use]
    pub fn usage_generation(&self) -> u64 {
        self.usage_generation
    }

    /// Vertex attribute slots the program consumes.
    #[must_use]
    pub fn attributes(&self) -> &[(VertexAttributes, u32)] {
        &self.attributes
    }

    #[must_use]
    pub fn light_slots(&self) -> &[LightSlot] {
        &self.light_slots
    }

    #[must_use]
    pub fn uniform(&self, semantic: Symbol) -> Option<&UniformLocation> {
        self.uniforms.get(&semantic)
    }

    #[must_use]
    pub fn has_uniform(&self, semantic: &str) -> bool {
        interner::get(semantic).is_some_and(|s| self.uniforms.contains_key(&s))
    }

    #[must_use]
    pub fn ref_count(&self) -> u32 {
        self.ref_count
    }

    /// Whether the Prepare stage of `class` at `revision` ran on this program.
    #[must_use]
    pub fn is_prepared_for(&self, class: ShaderClassId, revision: u64) -> bool {
        self.prepared_for.contains(&(class, revision))
    }
}

fn source_hash(vertex: &str, fragment: &str) -> u128 {
    let mut hasher = Xxh3::new();
    hasher.update(vertex.as_bytes());
    hasher.update(&[0]);
    hasher.update(fragment.as_bytes());
    hasher.digest128()
}

/// Owner of the device and all linked programs.
pub struct ProgramCache<D: GraphicsDevice> {
    device: D,
    dialect: GlslDialect,
    programs: SlotMap<ProgramId, CompiledProgram>,
    by_source: FxHashMap<u128, ProgramId>,
    active: Option<ProgramId>,
    usage_counter: u64,
    stats: ProgramStats,
    log_source: bool,
}

impl<D: GraphicsDevice> ProgramCache<D> {
    pub fn new(device: D, dialect: GlslDialect) -> Self {
        Self {
            device,
            dialect,
            programs: SlotMap::with_key(),
            by_source: FxHashMap::default(),
            active: None,
            usage_counter: 0,
            stats: ProgramStats::default(),
            log_source: false,
        }
    }

    /// Logs the full assembled text of every newly linked program at trace level.
    pub fn set_log_source(&mut self, enabled: bool) {
        self.log_source = enabled;
    }

    #[must_use]
    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    #[must_use]
    pub fn dialect(&self) -> &GlslDialect {
        &self.dialect
    }

    #[must_use]
    pub fn get(&self, id: ProgramId) -> Option<&CompiledProgram> {
        self.programs.get(id)
    }

    #[must_use]
    pub fn active(&self) -> Option<ProgramId> {
        self.active
    }

    #[must_use]
    pub fn stats(&self) -> ProgramStats {
        self.stats
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.programs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    /// Compiles both stages and links them, or returns the existing program
    /// for identical source (adding a reference).
    ///
    /// Failures are logged with the driver diagnostic and the offending
    /// source. Callers treat them as fatal for the owning material.
    pub fn compile_and_link(&mut self, vertex: &str, fragment: &str) -> Result<ProgramId> {
        self.link_or_reuse(vertex, fragment)
    }

    /// [`compile_and_link`](Self::compile_and_link) followed by the Prepare
    /// stage of `table`. A reused program is prepared too when `table`'s
    /// class revision has not run its Prepare fragments on it yet.
    pub fn build(
        &mut self,
        source: &AssembledSource,
        table: &ShaderTable,
        inputs: AssemblyInputs,
    ) -> Result<ProgramId> {
        let id = self.link_or_reuse(&source.vertex, &source.fragment)?;
        if let Err(e) = self.prepare(id, table, inputs) {
            self.release(id);
            return Err(e);
        }
        Ok(id)
    }

    fn link_or_reuse(&mut self, vertex: &str, fragment: &str) -> Result<ProgramId> {
        let hash = source_hash(vertex, fragment);
        if let Some(&id) = self.by_source.get(&hash)
            && let Some(program) = self.programs.get_mut(id)
        {
            program.ref_count += 1;
            log::trace!("Reusing program {id:?} ({} owners)", program.ref_count);
            return Ok(id);
        }

        let vs = self.compile_stage(ShaderKind::Vertex, vertex)?;
        let fs = match self.compile_stage(ShaderKind::Fragment, fragment) {
            Ok(fs) => fs,
            Err(e) => {
                self.device.delete_shader(vs);
                return Err(e);
            }
        };

        let linked = self.device.link_program(vs, fs);
        self.device.delete_shader(vs);
        self.device.delete_shader(fs);
        let raw = linked.map_err(|info_log| {
            log::error!(
                "Program link failed: {info_log}\n--- vertex ---\n{vertex}\n--- fragment ---\n{fragment}"
            );
            MosaicError::ProgramLink { log: info_log }
        })?;

        let id = self.programs.insert(CompiledProgram {
            raw,
            source: AssembledSource {
                vertex: vertex.to_owned(),
                fragment: fragment.to_owned(),
            },
            hash,
            uniforms: FxHashMap::default(),
            attributes: SmallVec::new(),
            constants: SmallVec::new(),
            light_slots: SmallVec::new(),
            usage_generation: 0,
            ref_count: 1,
            prepared_for: SmallVec::new(),
        });
        self.by_source.insert(hash, id);
        self.stats.programs_linked += 1;

        log::debug!("Linked program {id:?} (source hash {hash:032x})");
        if self.log_source {
            log::trace!("--- vertex {id:?} ---\n{vertex}\n--- fragment {id:?} ---\n{fragment}");
        }
        Ok(id)
    }

    fn compile_stage(&mut self, kind: ShaderKind, source: &str) -> Result<RawShader> {
        self.device.compile_shader(kind, source).map_err(|info_log| {
            log::error!("{kind:?} shader compile failed: {info_log}\n{source}");
            MosaicError::ShaderCompile {
                stage: kind,
                log: info_log,
                shader_source: source.to_owned(),
            }
        })
    }

    /// Runs the class base Prepare fragment and every capability Prepare
    /// fragment in list order, recording the locations they bind.
    ///
    /// Runs once per class revision. When identical source is shared by several
    /// classes, each class's bindings are merged into the program; a semantic
    /// already bound keeps its first location.
    pub fn prepare(&mut self, id: ProgramId, table: &ShaderTable, inputs: AssemblyInputs) -> Result<()> {
        let program = self.programs.get(id).ok_or(MosaicError::UnknownProgram(id))?;
        if program.is_prepared_for(table.class(), table.revision()) {
            return Ok(());
        }
        let raw = program.raw;

        let ctx = AssemblyContext {
            dialect: &self.dialect,
            attributes: inputs.attributes | VertexAttributes::POSITION,
            light_count: inputs.light_count,
            camera_present: inputs.camera_present,
            features: inputs.features,
        };
        let mut binder = ProgramBinder::new(&mut self.device, id, raw, ctx);
        if let Some(base) = table.base().prepare() {
            base.run(&mut binder);
        }
        for fragment in table.prepare() {
            fragment.run(&mut binder);
        }

        let ProgramBinder {
            uniforms,
            attributes,
            constants,
            light_slots,
            ..
        } = binder;

        let program = self.programs.get_mut(id).ok_or(MosaicError::UnknownProgram(id))?;
        log::debug!(
            "Prepared program {id:?} for '{}': {} uniforms, {} attributes, {} light slots",
            table.class().name(),
            uniforms.len(),
            attributes.len(),
            light_slots.len()
        );
        for (semantic, location) in uniforms {
            program.uniforms.entry(semantic).or_insert(location);
        }
        for attribute in attributes {
            if !program.attributes.iter().any(|(a, _)| *a == attribute.0) {
                program.attributes.push(attribute);
            }
        }
        for constant in constants {
            if !program.constants.iter().any(|(s, _)| *s == constant.0) {
                program.constants.push(constant);
            }
        }
        for slot in light_slots {
            if !program.light_slots.contains(&slot) {
                program.light_slots.push(slot);
            }
        }
        program.prepared_for.push((table.class(), table.revision()));
        Ok(())
    }

    /// Makes `id` the active program. Binding the already active program is
    /// free and leaves its usage generation unchanged.
    ///
    /// Returns whether a GPU bind was issued.
    pub fn activate(&mut self, id: ProgramId) -> Result<bool> {
        if self.active == Some(id) {
            return Ok(false);
        }
        let program = self.programs.get_mut(id).ok_or(MosaicError::UnknownProgram(id))?;
        self.device.use_program(program.raw);
        self.usage_counter += 1;
        program.usage_generation = self.usage_counter;
        self.active = Some(id);
        self.stats.activations += 1;
        Ok(true)
    }

    /// Uploads `value` to the uniform bound under `semantic` on `program`.
    ///
    /// `program` must be the active program; anything else is a usage error,
    /// logged and returned without touching the GPU.
    pub fn set_uniform(
        &mut self,
        program: ProgramId,
        semantic: Symbol,
        value: &UniformValue,
        force: bool,
    ) -> Result<UniformWrite> {
        let Some(active) = self.active else {
            log::error!(
                "uniform '{}' written with no active program",
                interner::resolve(semantic)
            );
            return Err(MosaicError::NoActiveProgram);
        };
        let compiled = self
            .programs
            .get_mut(program)
            .ok_or(MosaicError::UnknownProgram(program))?;
        let Some(location) = compiled.uniforms.get_mut(&semantic) else {
            return Ok(UniformWrite::Absent);
        };
        if location.program != active {
            log::error!(
                "uniform '{}' of program {:?} written while {active:?} is active",
                interner::resolve(semantic),
                location.program
            );
            return Err(MosaicError::UniformMismatch {
                location_program: location.program,
                active_program: Some(active),
            });
        }

        let generation = compiled.usage_generation;
        if location.needs_write(generation, force) {
            self.device.write_uniform(location.raw, value);
            if !force {
                location.mark_written(generation);
            }
            self.stats.uniform_writes += 1;
            Ok(UniformWrite::Written)
        } else {
            log::trace!(
                "uniform '{}' already written at generation {generation}",
                interner::resolve(semantic)
            );
            self.stats.uniform_suppressed += 1;
            Ok(UniformWrite::Suppressed)
        }
    }

    /// Convenience over [`set_uniform`](Self::set_uniform) taking the semantic
    /// by name. Unknown names are [`UniformWrite::Absent`].
    pub fn set_uniform_named(
        &mut self,
        program: ProgramId,
        semantic: &str,
        value: impl Into<UniformValue>,
        force: bool,
    ) -> Result<UniformWrite> {
        match interner::get(semantic) {
            Some(sym) => self.set_uniform(program, sym, &value.into(), force),
            None => Ok(UniformWrite::Absent),
        }
    }

    /// Writes the program's registered constants under suppression.
    pub fn apply_constants(&mut self, id: ProgramId) -> Result<()> {
        let constants = self
            .programs
            .get(id)
            .ok_or(MosaicError::UnknownProgram(id))?
            .constants
            .clone();
        for (semantic, value) in &constants {
            self.set_uniform(id, *semantic, value, false)?;
        }
        Ok(())
    }

    /// Drops one reference; the GL program is deleted with the last one.
    pub fn release(&mut self, id: ProgramId) {
        let Some(program) = self.programs.get_mut(id) else {
            return;
        };
        program.ref_count = program.ref_count.saturating_sub(1);
        if program.ref_count > 0 {
            return;
        }
        if let Some(program) = self.programs.remove(id) {
            self.by_source.remove(&program.hash);
            self.device.delete_program(program.raw);
            if self.active == Some(id) {
                self.active = None;
            }
            log::debug!("Deleted program {id:?}");
        }
    }
}

impl<D: GraphicsDevice> UniformTarget for ProgramCache<D> {
    fn write_uniform(
        &mut self,
        program: ProgramId,
        semantic: Symbol,
        value: &UniformValue,
        force: bool,
    ) -> Result<UniformWrite> {
        self.set_uniform(program, semantic, value, force)
    }

    fn has_uniform(&self, program: ProgramId, semantic: Symbol) -> bool {
        self.programs
            .get(program)
            .is_some_and(|p| p.uniforms.contains_key(&semantic))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::HeadlessDevice;
    use crate::shader::{GlApiVersion, Precision};

    const VS: &str = "attribute vec3 aVertex_position;\nuniform mat4 worldMatrix;\nvoid main(void) {\n}\n";
    const FS: &str = "precision mediump float;\nuniform vec4 tint;\nvoid main(void) {\n}\n";

    fn cache() -> ProgramCache<HeadlessDevice> {
        ProgramCache::new(
            HeadlessDevice::new(GlApiVersion::Gles2),
            GlslDialect::resolve(GlApiVersion::Gles2, Precision::Mediump),
        )
    }

    #[test]
    fn identical_source_is_linked_once() {
        let mut cache = cache();
        let a = cache.compile_and_link(VS, FS).unwrap();
        let b = cache.compile_and_link(VS, FS).unwrap();

        assert_eq!(a, b);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(a).unwrap().ref_count(), 2);
        assert_eq!(cache.stats().programs_linked, 1);

        cache.release(a);
        assert_eq!(cache.device().live_programs(), 1);
        cache.release(b);
        assert_eq!(cache.device().live_programs(), 0);
        assert!(cache.is_empty());
    }

    #[test]
    fn activation_bumps_generation_only_on_change() {
        let mut cache = cache();
        let a = cache.compile_and_link(VS, FS).unwrap();
        let b = cache.compile_and_link(VS, "precision mediump float;\nvoid main(void) {\n}\n").unwrap();

        assert!(cache.activate(a).unwrap());
        let g1 = cache.get(a).unwrap().usage_generation();
        assert!(!cache.activate(a).unwrap());
        assert_eq!(cache.get(a).unwrap().usage_generation(), g1);

        assert!(cache.activate(b).unwrap());
        assert!(cache.activate(a).unwrap());
        assert!(cache.get(a).unwrap().usage_generation() > g1);
        assert_eq!(cache.device().program_binds(), 3);
    }

    #[test]
    fn compile_failure_reports_stage_and_source() {
        let mut cache = cache();
        cache.device_mut().fail_compile_when("tint");

        let err = cache.compile_and_link(VS, FS).unwrap_err();
        match err {
            MosaicError::ShaderCompile { stage, shader_source, .. } => {
                assert_eq!(stage, ShaderKind::Fragment);
                assert_eq!(shader_source, FS);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(cache.is_empty());
    }

    #[test]
    fn write_without_active_program_is_rejected() {
        let mut cache = cache();
        let a = cache.compile_and_link(VS, FS).unwrap();
        let sym = interner::intern("TINT_NO_ACTIVE");
        assert!(matches!(
            cache.set_uniform(a, sym, &UniformValue::Float(1.0), false),
            Err(MosaicError::NoActiveProgram)
        ));
    }
}
