//! Error Types
//!
//! This module defines the error types used throughout the engine.
//!
//! # Overview
//!
//! The main error type [`MosaicError`] covers every failure mode of the core:
//! - Shader compilation and program link failures
//! - Uniform writes against a program that is not the active one
//! - Material setup failures reported by the material collaborator
//! - Settings parsing errors
//!
//! None of these abort a frame. The draw dispatcher logs them and recovers at
//! draw-call granularity, so a broken material renders nothing while the rest
//! of the scene still draws.
//!
//! # Usage
//!
//! ```rust,ignore
//! use mosaic::errors::{MosaicError, Result};
//!
//! fn compile() -> Result<()> {
//!     // Operations that may fail return Result
//!     Ok(())
//! }
//! ```

use thiserror::Error;

use crate::gpu::ShaderKind;
use crate::program::ProgramId;

/// The main error type for the Mosaic engine.
#[derive(Error, Debug)]
pub enum MosaicError {
    // ========================================================================
    // Shader & Program Errors
    // ========================================================================
    /// A shader stage failed to compile. Carries the driver diagnostic and the
    /// offending source text.
    #[error("Failed to compile {stage:?} shader: {log}")]
    ShaderCompile {
        /// Which stage failed
        stage: ShaderKind,
        /// Driver info log
        log: String,
        /// The assembled source that was rejected
        shader_source: String,
    },

    /// Both stages compiled but the program failed to link.
    #[error("Failed to link program: {log}")]
    ProgramLink {
        /// Driver info log
        log: String,
    },

    /// The program id is not (or no longer) present in the program cache.
    #[error("Unknown program: {0:?}")]
    UnknownProgram(ProgramId),

    // ========================================================================
    // Uniform Errors
    // ========================================================================
    /// A uniform write targeted a location owned by a program that is not the
    /// currently active program.
    #[error(
        "Uniform location belongs to program {location_program:?} but the active program is {active_program:?}"
    )]
    UniformMismatch {
        /// Program that owns the location
        location_program: ProgramId,
        /// Program bound at the time of the write
        active_program: Option<ProgramId>,
    },

    /// A uniform write was attempted while no program is active.
    #[error("No program is active")]
    NoActiveProgram,

    // ========================================================================
    // Composition & Material Errors
    // ========================================================================
    /// No shader class with this name has been defined in the registry.
    #[error("Unknown shader class: {0}")]
    UnknownShaderClass(String),

    /// The material's finalize step reported that it cannot draw yet.
    #[error("Material setup failed: {0}")]
    MaterialSetup(String),

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Renderer settings could not be parsed.
    #[error("Settings parse error: {0}")]
    Settings(#[from] serde_json::Error),
}

/// Alias for `Result<T, MosaicError>`.
pub type Result<T> = std::result::Result<T, MosaicError>;
