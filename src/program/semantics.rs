//! Uniform semantic names.
//!
//! Prepare fragments bind GLSL uniforms under these names; the dispatcher and
//! materials address uniforms by semantic, never by GLSL identifier.

/// Mesh world matrix.
pub const WORLD: &str = "WORLD";
/// View * world.
pub const MODELVIEW: &str = "MODELVIEW";
/// Projection * view * world.
pub const MODELVIEWPROJECTION: &str = "MODELVIEWPROJECTION";
/// Projection * view, declared by the assembler when a camera is present.
pub const PROJECTION_VIEW: &str = "PROJECTIONVIEW";
/// Inverse transpose of the world matrix (mat3).
pub const NORMAL_MATRIX: &str = "NORMALMATRIX";
/// Accumulated mesh opacity times pass opacity.
pub const OPACITY: &str = "OPACITY";
/// Camera position in mesh-local space.
pub const VIEW_POSITION: &str = "VIEWPOSITION";

pub const MATERIAL_BASE_COLOR: &str = "MATERIALBASECOLOR";
pub const DIFFUSE_COLOR: &str = "KD";
pub const SPECULAR_COLOR: &str = "KS";
pub const SHININESS: &str = "SHININESS";
/// Diffuse texture sampler.
pub const DIFFUSE_TEXTURE: &str = "TEXTURE";

pub const ALL: [&str; 12] = [
    WORLD,
    MODELVIEW,
    MODELVIEWPROJECTION,
    PROJECTION_VIEW,
    NORMAL_MATRIX,
    OPACITY,
    VIEW_POSITION,
    MATERIAL_BASE_COLOR,
    DIFFUSE_COLOR,
    SPECULAR_COLOR,
    SHININESS,
    DIFFUSE_TEXTURE,
];

/// Semantic of the position uniform of light slot `i`.
#[must_use]
pub fn light_position(i: usize) -> String {
    format!("LIGHTPOSITION_{i}")
}

/// Semantic of the color uniform of light slot `i`.
#[must_use]
pub fn light_color(i: usize) -> String {
    format!("LIGHTDIFFUSE_{i}")
}
