//! Built-in capabilities and shader classes.
//!
//! | Class     | Parent  | Capabilities |
//! |-----------|---------|--------------|
//! | `decal`   | -       | `Decal` |
//! | `lambert` | `decal` | `Decal`, `Lambert` |
//! | `phong`   | `decal` | `Decal`, `Phong` |
//!
//! All classes share [`root_base`], which declares the position stream, the
//! world matrix and the opacity uniform, and seeds `rt0`.
//!
//! Lighting runs in mesh-local space: the dispatcher uploads light positions
//! and the view position through the mesh's inverse world matrix, so normals
//! and positions are passed through untransformed.

use std::fmt::Write as _;

use super::capability::{Capability, ClassBase};
use super::context::{AssemblyContext, MaterialFeatures, VertexAttributes};
use super::registry::{CapabilityRegistry, ShaderClassId};
use crate::errors::Result;
use crate::gpu::UniformValue;
use crate::program::semantics;

pub const DECAL_CLASS: &str = "decal";
pub const LAMBERT_CLASS: &str = "lambert";
pub const PHONG_CLASS: &str = "phong";

/// Ids of the classes created by [`register_builtin_classes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuiltinClasses {
    pub decal: ShaderClassId,
    pub lambert: ShaderClassId,
    pub phong: ShaderClassId,
}

/// Defines `decal`, `lambert` and `phong` on `registry`.
pub fn register_builtin_classes(registry: &mut CapabilityRegistry) -> Result<BuiltinClasses> {
    let decal_cap = decal();

    let decal_class = registry.define_class(DECAL_CLASS, root_base());
    registry.register(decal_class, &decal_cap)?;

    let lambert_class = registry.derive_class(LAMBERT_CLASS, decal_class, ClassBase::new())?;
    registry.register(lambert_class, &lambert())?;

    let phong_class = registry.derive_class(PHONG_CLASS, decal_class, ClassBase::new())?;
    registry.register(phong_class, &phong())?;

    Ok(BuiltinClasses {
        decal: decal_class,
        lambert: lambert_class,
        phong: phong_class,
    })
}

/// Fragments every built-in class starts from.
#[must_use]
pub fn root_base() -> ClassBase {
    ClassBase::new()
        .vertex_define(|ctx| {
            let mut s = format!("{} vec3 aVertex_position;\n", ctx.vin());
            if ctx.has(VertexAttributes::NORMAL) {
                let _ = writeln!(s, "{} vec3 aVertex_normal;", ctx.vin());
                let _ = writeln!(s, "{} vec3 v_normal;", ctx.vout());
            }
            let _ = writeln!(s, "{} vec4 position;", ctx.vout());
            s.push_str("uniform mat4 worldMatrix;\n");
            s
        })
        .vertex_transform(|ctx| {
            let mut s = String::from("  position = vec4(aVertex_position, 1.0);\n");
            if ctx.camera_present {
                s.push_str("  gl_Position = projectionAndViewMatrix * worldMatrix * position;\n");
            } else {
                s.push_str("  gl_Position = worldMatrix * position;\n");
            }
            if ctx.has(VertexAttributes::NORMAL) {
                s.push_str("  v_normal = aVertex_normal;\n");
            }
            s
        })
        .fragment_define(|ctx| {
            let mut s = format!("{} vec4 position;\n", ctx.fin());
            if ctx.has(VertexAttributes::NORMAL) {
                let _ = writeln!(s, "{} vec3 v_normal;", ctx.fin());
            }
            s.push_str("uniform float opacity;\n");
            s
        })
        .fragment_shade(|_| "  rt0 = vec4(1.0, 1.0, 1.0, opacity);\n".to_owned())
        .prepare(|binder| {
            binder.bind_attribute(VertexAttributes::POSITION);
            binder.bind_attribute(VertexAttributes::NORMAL);
            binder.bind_uniform(semantics::WORLD, "worldMatrix");
            binder.bind_uniform(semantics::OPACITY, "opacity");
            if binder.context().camera_present {
                binder.bind_uniform(semantics::PROJECTION_VIEW, "projectionAndViewMatrix");
            }
        })
}

/// Vertex color, texture coordinates, diffuse texture, base color and alpha
/// discard.
#[must_use]
pub fn decal() -> Capability {
    Capability::new("Decal")
        .vertex_define(|ctx| {
            let mut s = String::new();
            if ctx.has(VertexAttributes::COLOR) {
                let _ = writeln!(s, "{} vec4 aVertex_color;", ctx.vin());
                let _ = writeln!(s, "{} vec4 color;", ctx.vout());
            }
            if ctx.has(VertexAttributes::TEXCOORD) {
                let _ = writeln!(s, "{} vec2 aVertex_texcoord;", ctx.vin());
                let _ = writeln!(s, "{} vec2 texcoord;", ctx.vout());
            }
            s
        })
        .vertex_transform(|ctx| {
            let mut s = String::new();
            if ctx.has(VertexAttributes::COLOR) {
                s.push_str("  color = aVertex_color;\n");
            }
            if ctx.has(VertexAttributes::TEXCOORD) {
                s.push_str("  texcoord = aVertex_texcoord;\n");
            }
            s
        })
        .fragment_define(|ctx| {
            let mut s = String::new();
            if ctx.has(VertexAttributes::COLOR) {
                let _ = writeln!(s, "{} vec4 color;", ctx.fin());
            }
            if ctx.has(VertexAttributes::TEXCOORD) {
                let _ = writeln!(s, "{} vec2 texcoord;", ctx.fin());
            }
            if samples_texture(ctx) {
                s.push_str("uniform sampler2D uTexture;\n");
            }
            s.push_str("uniform vec4 materialBaseColor;\n");
            s
        })
        .fragment_shade(|ctx| {
            let mut s = String::new();
            if ctx.has(VertexAttributes::COLOR) {
                s.push_str("  rt0 *= color;\n");
            }
            s.push_str("  rt0 *= materialBaseColor;\n");
            if samples_texture(ctx) {
                let _ = writeln!(s, "  rt0 *= {}(uTexture, texcoord);", ctx.texture_fn());
            }
            s.push_str("  if (rt0.a < 0.05) {\n    discard;\n  }\n");
            s
        })
        .prepare(|binder| {
            binder.bind_attribute(VertexAttributes::COLOR);
            binder.bind_attribute(VertexAttributes::TEXCOORD);
            binder.bind_uniform(semantics::MATERIAL_BASE_COLOR, "materialBaseColor");
            if samples_texture(binder.context()) {
                binder.bind_uniform(semantics::DIFFUSE_TEXTURE, "uTexture");
                binder.constant(semantics::DIFFUSE_TEXTURE, UniformValue::Int(0));
            }
        })
}

/// Per-light diffuse term.
#[must_use]
pub fn lambert() -> Capability {
    Capability::new("Lambert")
        .fragment_define(|ctx| {
            let mut s = String::from("uniform vec4 Kd;\n");
            s.push_str(&light_uniforms(ctx));
            s
        })
        .fragment_shade(|ctx| shade_lights(ctx, false))
        .prepare(|binder| {
            binder.bind_uniform(semantics::DIFFUSE_COLOR, "Kd");
            binder.bind_light_slots("lightPosition", "lightDiffuse");
        })
}

/// Per-light diffuse and specular terms.
#[must_use]
pub fn phong() -> Capability {
    Capability::new("Phong")
        .fragment_define(|ctx| {
            let mut s = String::from(
                "uniform vec4 Kd;\nuniform vec4 Ks;\nuniform float shininess;\nuniform vec3 viewPosition;\n",
            );
            s.push_str(&light_uniforms(ctx));
            s
        })
        .fragment_shade(|ctx| shade_lights(ctx, true))
        .prepare(|binder| {
            binder.bind_uniform(semantics::DIFFUSE_COLOR, "Kd");
            binder.bind_uniform(semantics::SPECULAR_COLOR, "Ks");
            binder.bind_uniform(semantics::SHININESS, "shininess");
            binder.bind_uniform(semantics::VIEW_POSITION, "viewPosition");
            binder.bind_light_slots("lightPosition", "lightDiffuse");
        })
}

fn samples_texture(ctx: &AssemblyContext<'_>) -> bool {
    ctx.has(VertexAttributes::TEXCOORD) && ctx.uses(MaterialFeatures::USE_MAP)
}

fn light_uniforms(ctx: &AssemblyContext<'_>) -> String {
    if ctx.light_count == 0 {
        return String::new();
    }
    format!(
        "uniform vec4 lightPosition[{n}];\nuniform vec4 lightDiffuse[{n}];\n",
        n = ctx.light_count
    )
}

// lightPosition[i].w is 1.0 for point lights and 0.0 for directional ones.
fn shade_lights(ctx: &AssemblyContext<'_>, specular: bool) -> String {
    let mut s = String::from("  vec4 surfaceColor = rt0;\n  rt0 = vec4(0.0, 0.0, 0.0, surfaceColor.a);\n");
    if ctx.has(VertexAttributes::NORMAL) {
        s.push_str("  vec3 normal = normalize(v_normal);\n");
    } else {
        s.push_str("  vec3 normal = vec3(0.0, 0.0, 1.0);\n");
    }
    if specular {
        s.push_str("  vec3 viewDirection = normalize(viewPosition - position.xyz);\n");
    }
    for i in 0..ctx.light_count {
        s.push_str("  {\n");
        let _ = writeln!(
            s,
            "    vec3 light = normalize(lightPosition[{i}].xyz - position.xyz * lightPosition[{i}].w);"
        );
        s.push_str("    float diffuse = max(dot(light, normal), 0.0);\n");
        let _ = writeln!(
            s,
            "    rt0.rgb += Kd.rgb * lightDiffuse[{i}].rgb * diffuse * surfaceColor.rgb;"
        );
        if specular {
            s.push_str("    vec3 reflected = reflect(-light, normal);\n");
            s.push_str("    float specular = pow(max(dot(reflected, viewDirection), 0.0), shininess);\n");
            let _ = writeln!(s, "    rt0.rgb += Ks.rgb * lightDiffuse[{i}].rgb * specular;");
        }
        s.push_str("  }\n");
    }
    s
}
