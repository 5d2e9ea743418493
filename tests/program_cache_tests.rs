//! Program Cache Tests
//!
//! Tests for:
//! - Uniform-write suppression keyed on activation periods
//! - Forced writes
//! - Writes against a non-active program
//! - Source dedupe, reference counting and release
//! - Compile / link failure reporting

use mosaic::gpu::GpuCall;
use mosaic::program::{UniformWrite, semantics};
use mosaic::shader::{
    AssemblyInputs, Capability, CapabilityRegistry, ClassBase, GlApiVersion, GlslDialect, Precision, ShaderAssembler,
    ShaderInstance, register_builtin_classes,
};
use mosaic::{GraphicsDevice, HeadlessDevice, MosaicError, ProgramCache, ProgramId};

struct Fixture {
    cache: ProgramCache<HeadlessDevice>,
    decal: ShaderInstance,
    lambert: ShaderInstance,
}

fn fixture(device: HeadlessDevice) -> Fixture {
    let mut registry = CapabilityRegistry::new();
    let classes = register_builtin_classes(&mut registry).unwrap();
    let dialect = GlslDialect::resolve(device.api_version(), Precision::Mediump);
    Fixture {
        cache: ProgramCache::new(device, dialect),
        decal: ShaderInstance::new(&registry, classes.decal).unwrap(),
        lambert: ShaderInstance::new(&registry, classes.lambert).unwrap(),
    }
}

fn build(cache: &mut ProgramCache<HeadlessDevice>, instance: &ShaderInstance) -> ProgramId {
    let assembler = ShaderAssembler::new(*cache.dialect());
    let inputs = AssemblyInputs {
        light_count: 1,
        ..AssemblyInputs::default()
    };
    let source = instance.assemble(&assembler, inputs);
    cache.build(&source, instance.table(), inputs).unwrap()
}

// ============================================================================
// Suppression
// ============================================================================

#[test]
fn second_unforced_write_in_same_activation_is_suppressed() {
    let mut f = fixture(HeadlessDevice::default());
    let program = build(&mut f.cache, &f.decal);
    f.cache.activate(program).unwrap();

    let first = f.cache.set_uniform_named(program, semantics::OPACITY, 0.5_f32, false).unwrap();
    let second = f.cache.set_uniform_named(program, semantics::OPACITY, 0.25_f32, false).unwrap();

    assert_eq!(first, UniformWrite::Written);
    assert_eq!(second, UniformWrite::Suppressed);
    assert_eq!(f.cache.device().uniform_writes("opacity"), 1);
    assert_eq!(f.cache.stats().uniform_suppressed, 1);
}

#[test]
fn forced_writes_always_reach_the_device() {
    let mut f = fixture(HeadlessDevice::default());
    let program = build(&mut f.cache, &f.decal);
    f.cache.activate(program).unwrap();

    for _ in 0..3 {
        let write = f.cache.set_uniform_named(program, semantics::OPACITY, 1.0_f32, true).unwrap();
        assert_eq!(write, UniformWrite::Written);
    }
    assert_eq!(f.cache.device().uniform_writes("opacity"), 3);
}

#[test]
fn reactivation_reopens_suppressed_uniforms() {
    let mut f = fixture(HeadlessDevice::default());
    let decal = build(&mut f.cache, &f.decal);
    let lambert = build(&mut f.cache, &f.lambert);

    f.cache.activate(decal).unwrap();
    f.cache.set_uniform_named(decal, semantics::OPACITY, 0.5_f32, false).unwrap();
    f.cache.activate(lambert).unwrap();
    f.cache.activate(decal).unwrap();
    let write = f.cache.set_uniform_named(decal, semantics::OPACITY, 0.5_f32, false).unwrap();

    assert_eq!(write, UniformWrite::Written);
    assert_eq!(f.cache.device().uniform_writes("opacity"), 2);
}

#[test]
fn forced_write_does_not_consume_the_period() {
    let mut f = fixture(HeadlessDevice::default());
    let program = build(&mut f.cache, &f.decal);
    f.cache.activate(program).unwrap();

    f.cache.set_uniform_named(program, semantics::OPACITY, 1.0_f32, true).unwrap();
    let write = f.cache.set_uniform_named(program, semantics::OPACITY, 1.0_f32, false).unwrap();

    assert_eq!(write, UniformWrite::Written);
}

#[test]
fn unbound_semantic_is_absent() {
    let mut f = fixture(HeadlessDevice::default());
    let program = build(&mut f.cache, &f.decal);
    f.cache.activate(program).unwrap();

    let write = f.cache.set_uniform_named(program, semantics::SHININESS, 8.0_f32, false).unwrap();
    assert_eq!(write, UniformWrite::Absent);
}

// ============================================================================
// Usage errors
// ============================================================================

#[test]
fn write_to_inactive_program_is_a_mismatch() {
    let mut f = fixture(HeadlessDevice::default());
    let decal = build(&mut f.cache, &f.decal);
    let lambert = build(&mut f.cache, &f.lambert);
    f.cache.activate(decal).unwrap();

    let err = f
        .cache
        .set_uniform_named(lambert, semantics::OPACITY, 1.0_f32, true)
        .unwrap_err();

    assert!(matches!(
        err,
        MosaicError::UniformMismatch { location_program, active_program }
            if location_program == lambert && active_program == Some(decal)
    ));
    assert_eq!(f.cache.device().uniform_writes("opacity"), 0);
}

// ============================================================================
// Dedupe & lifetime
// ============================================================================

#[test]
fn equal_source_shares_one_program_until_last_release() {
    let mut f = fixture(HeadlessDevice::default());
    let a = build(&mut f.cache, &f.decal);
    let b = build(&mut f.cache, &f.decal);

    assert_eq!(a, b);
    assert_eq!(f.cache.stats().programs_linked, 1);
    assert_eq!(f.cache.get(a).unwrap().ref_count(), 2);

    f.cache.release(a);
    assert_eq!(f.cache.device().live_programs(), 1);

    f.cache.release(b);
    assert!(f.cache.get(a).is_none());
    assert_eq!(f.cache.device().live_programs(), 0);
    assert_eq!(f.cache.device().count(|c| matches!(c, GpuCall::DeleteProgram(_))), 1);
}

#[test]
fn shared_source_runs_prepare_of_every_class() {
    let mut registry = CapabilityRegistry::new();
    let classes = register_builtin_classes(&mut registry).unwrap();
    let outlined = registry
        .derive_class("decal_outlined", classes.decal, ClassBase::new())
        .unwrap();
    let alias = Capability::new("OutlineAlpha").prepare(|binder| {
        binder.bind_uniform("OUTLINE_ALPHA", "opacity");
    });
    registry.register(outlined, &alias).unwrap();

    let decal = ShaderInstance::new(&registry, classes.decal).unwrap();
    let outline = ShaderInstance::new(&registry, outlined).unwrap();
    let device = HeadlessDevice::default();
    let dialect = GlslDialect::resolve(device.api_version(), Precision::Mediump);
    let mut cache = ProgramCache::new(device, dialect);

    let a = build(&mut cache, &decal);
    assert!(!cache.get(a).unwrap().has_uniform("OUTLINE_ALPHA"));
    let b = build(&mut cache, &outline);

    assert_eq!(a, b);
    assert_eq!(cache.stats().programs_linked, 1);
    let program = cache.get(a).unwrap();
    assert!(program.has_uniform("OUTLINE_ALPHA"));
    assert!(program.has_uniform(semantics::OPACITY));
    assert!(program.is_prepared_for(classes.decal, decal.table().revision()));
    assert!(program.is_prepared_for(outlined, outline.table().revision()));
}

#[test]
fn link_failure_is_reported_and_nothing_is_cached() {
    let mut device = HeadlessDevice::new(GlApiVersion::Gles2);
    device.fail_link_when("materialBaseColor");
    let mut f = fixture(device);

    let assembler = ShaderAssembler::new(*f.cache.dialect());
    let source = f.decal.assemble(&assembler, AssemblyInputs::default());
    let err = f
        .cache
        .build(&source, f.decal.table(), AssemblyInputs::default())
        .unwrap_err();

    assert!(matches!(err, MosaicError::ProgramLink { .. }));
    assert!(f.cache.is_empty());
}
