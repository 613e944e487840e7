//! Typed expression graphs compiled to WGSL.
//!
//! A graph is built from pure combinator functions in [`node`], compiled once
//! into a WGSL module by [`wgsl`], and fed its uniforms each frame through a
//! [`crate::UniformSet`]. The [`eval`] interpreter runs the same graph on
//! the CPU.
//!
//! # Example
//!
//! ```
//! use reveal_gallery::shader_graph::*;
//!
//! // Fade the image in with the reveal uniform.
//! let color = texture(uv());
//! let faded = mix(vec4([color.rgb(), float(0.0)]), color, uniform(Uniform::Reveal));
//! let program = compile_program(&faded, &position_local()).unwrap();
//! assert!(program.source.contains("fn fs_main"));
//! ```

pub mod eval;
pub mod node;
mod types;
pub mod wgsl;

pub use eval::{EvalInputs, TextureSampler, evaluate};
pub use node::*;
pub use types::{Value, ValueType};
pub use wgsl::{CompiledProgram, FRAGMENT_ENTRY, Stage, VERTEX_ENTRY, compile_program};

use crate::error::RevealResult;

/// A material described by a color graph and a vertex position graph.
pub trait ShaderGraph {
    /// Fragment output, RGBA.
    fn color_node(&self) -> &Expr;

    /// Vertex output, the new local position.
    fn position_node(&self) -> &Expr;

    /// Compile both outputs into one WGSL module.
    fn compile(&self) -> RevealResult<CompiledProgram> {
        compile_program(self.color_node(), self.position_node())
    }
}
