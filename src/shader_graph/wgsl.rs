//! WGSL code generation for shader graphs.
//!
//! Every non-leaf node becomes one `let` binding, emitted children first, so a
//! node shared by several consumers is computed once. Literals, uniforms and
//! builtins are inlined at their use sites.

use std::collections::HashMap;

use super::node::{BinaryOp, Builtin, Expr, Node, UnaryOp, Uniform, infer_all};
use super::types::ValueType;
use crate::error::{RevealError, RevealResult};
use crate::rotation::ROTATION3D_Y_WGSL;

pub const VERTEX_ENTRY: &str = "vs_main";
pub const FRAGMENT_ENTRY: &str = "fs_main";

const PRELUDE: &str = "struct PlaneUniforms {
    view_proj: mat4x4f,
    model: mat4x4f,
    reveal: f32,
    enter_progress: f32,
    exit_progress: f32,
    is_blurred: f32,
}

@group(0) @binding(0) var<uniform> u: PlaneUniforms;
@group(1) @binding(0) var image_tex: texture_2d<f32>;
@group(1) @binding(1) var image_samp: sampler;

struct VertexInput {
    @location(0) position: vec3f,
    @location(1) normal: vec3f,
    @location(2) uv: vec2f,
}

struct VertexOutput {
    @builtin(position) clip_position: vec4f,
    @location(0) uv: vec2f,
}
";

const HASH_BLUR_WGSL: &str = "fn hash_rand(co: vec2f) -> f32 {
    return fract(sin(dot(co, vec2f(12.9898, 78.233))) * 43758.5453);
}

fn hash_blur(uv: vec2f, radius: f32, samples: u32) -> vec4f {
    var acc = vec4f(0.0);
    let count = f32(samples);
    for (var i = 0u; i < samples; i = i + 1u) {
        let fi = f32(i);
        let angle = fi / count * 6.283185307179586;
        let jitter = hash_rand(vec2f(fi, uv.x + uv.y)) + radius;
        let offset = vec2f(cos(angle), sin(angle)) * jitter * radius;
        acc = acc + textureSampleLevel(image_tex, image_samp, uv + offset, 0.0);
    }
    return acc / count;
}
";

/// Pipeline stage a graph output is compiled into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Vertex,
    Fragment,
}

impl Stage {
    fn name(self) -> &'static str {
        match self {
            Stage::Vertex => "vertex",
            Stage::Fragment => "fragment",
        }
    }
}

/// A complete WGSL module produced from a color and a position graph.
#[derive(Clone, Debug)]
pub struct CompiledProgram {
    /// WGSL source with `vs_main` and `fs_main` entry points.
    pub source: String,
    /// FNV-1a hash of `source`, used to share pipelines between planes.
    pub fingerprint: u64,
}

/// Compile the two graph outputs of a plane into a single WGSL module.
pub fn compile_program(color: &Expr, position: &Expr) -> RevealResult<CompiledProgram> {
    let vertex = emit_function(position, Stage::Vertex, ValueType::Vec3, "p")?;
    let fragment = emit_function(color, Stage::Fragment, ValueType::Vec4, "c")?;

    let mut source = String::from(PRELUDE);
    if vertex.uses_rotation || fragment.uses_rotation {
        source.push('\n');
        source.push_str(ROTATION3D_Y_WGSL);
    }
    if vertex.uses_blur || fragment.uses_blur {
        source.push('\n');
        source.push_str(HASH_BLUR_WGSL);
    }

    source.push_str(&format!(
        "\n@vertex\nfn {VERTEX_ENTRY}(in: VertexInput) -> VertexOutput {{\n    let position_local = in.position;\n    let uv = in.uv;\n"
    ));
    push_lines(&mut source, &vertex.lines);
    source.push_str(&format!(
        "    var out: VertexOutput;\n    out.clip_position = u.view_proj * u.model * vec4f({}, 1.0);\n    out.uv = in.uv;\n    return out;\n}}\n",
        vertex.result
    ));

    source.push_str(&format!(
        "\n@fragment\nfn {FRAGMENT_ENTRY}(in: VertexOutput) -> @location(0) vec4f {{\n    let uv = in.uv;\n"
    ));
    push_lines(&mut source, &fragment.lines);
    source.push_str(&format!("    return {};\n}}\n", fragment.result));

    let fingerprint = fnv1a64(source.as_bytes());

    Ok(CompiledProgram {
        source,
        fingerprint,
    })
}

const FNV_OFFSET: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

/// 64-bit FNV-1a; the same source gives the same key on every build.
fn fnv1a64(bytes: &[u8]) -> u64 {
    let mut h = FNV_OFFSET;
    for &b in bytes {
        h ^= b as u64;
        h = h.wrapping_mul(FNV_PRIME);
    }
    h
}

fn push_lines(source: &mut String, lines: &[String]) {
    for line in lines {
        source.push_str("    ");
        source.push_str(line);
        source.push('\n');
    }
}

struct EmittedFunction {
    lines: Vec<String>,
    result: String,
    uses_blur: bool,
    uses_rotation: bool,
}

fn emit_function(
    root: &Expr,
    stage: Stage,
    expected: ValueType,
    prefix: &str,
) -> RevealResult<EmittedFunction> {
    let types = infer_all(root)?;
    let root_ty = types[&root.id()];
    if root_ty != expected {
        return Err(RevealError::graph(format!(
            "{} output must be {}, got {}",
            stage.name(),
            expected.wgsl(),
            root_ty.wgsl()
        )));
    }

    let mut emitter = Emitter {
        stage,
        prefix,
        types,
        names: HashMap::new(),
        lines: Vec::new(),
        uses_blur: false,
        uses_rotation: false,
    };

    let mut failure = None;
    root.visit_post_order(&mut |expr: &Expr| {
        if failure.is_some() || expr.is_leaf() {
            return;
        }
        if let Err(err) = emitter.bind(expr) {
            failure = Some(err);
        }
    });
    if let Some(err) = failure {
        return Err(err);
    }

    let result = emitter.reference(root)?;
    Ok(EmittedFunction {
        lines: emitter.lines,
        result,
        uses_blur: emitter.uses_blur,
        uses_rotation: emitter.uses_rotation,
    })
}

struct Emitter<'a> {
    stage: Stage,
    prefix: &'a str,
    types: HashMap<*const Node, ValueType>,
    names: HashMap<*const Node, String>,
    lines: Vec<String>,
    uses_blur: bool,
    uses_rotation: bool,
}

impl Emitter<'_> {
    fn bind(&mut self, expr: &Expr) -> RevealResult<()> {
        let text = self.expression(expr)?;
        let name = format!("{}{}", self.prefix, self.names.len());
        self.lines.push(format!("let {name} = {text};"));
        self.names.insert(expr.id(), name);
        Ok(())
    }

    /// Text that refers to an already-emitted node.
    fn reference(&self, expr: &Expr) -> RevealResult<String> {
        if let Some(name) = self.names.get(&expr.id()) {
            return Ok(name.clone());
        }
        match expr.node() {
            Node::Float(v) => float_literal(*v),
            Node::Uniform(Uniform::IsBlurred) => Ok("(u.is_blurred > 0.5)".to_string()),
            Node::Uniform(slot) => Ok(format!("u.{}", slot.field())),
            Node::Builtin(builtin) => {
                if *builtin == Builtin::PositionLocal && self.stage == Stage::Fragment {
                    return Err(RevealError::Stage {
                        input: builtin.name(),
                        stage: self.stage.name(),
                    });
                }
                Ok(builtin.name().to_string())
            }
            _ => Err(RevealError::graph("node referenced before it was emitted")),
        }
    }

    fn ty(&self, expr: &Expr) -> ValueType {
        self.types[&expr.id()]
    }

    /// Reference to `expr`, splatted to `target` when it is a scalar.
    fn splat(&self, expr: &Expr, target: ValueType) -> RevealResult<String> {
        let text = self.reference(expr)?;
        if self.ty(expr) == ValueType::F32 && target.is_vector() {
            Ok(format!("{}({text})", target.wgsl()))
        } else {
            Ok(text)
        }
    }

    /// Reference with bare literals pinned to `f32`, for builtins that would
    /// otherwise see only abstract arguments.
    fn concrete(&self, expr: &Expr) -> RevealResult<String> {
        let text = self.reference(expr)?;
        if matches!(expr.node(), Node::Float(_)) {
            Ok(format!("f32({text})"))
        } else {
            Ok(text)
        }
    }

    fn expression(&mut self, expr: &Expr) -> RevealResult<String> {
        let text = match expr.node() {
            Node::Float(_) | Node::Uniform(_) | Node::Builtin(_) => self.reference(expr)?,
            Node::Unary(op, a) => {
                let a = self.reference(a)?;
                match op {
                    UnaryOp::Neg => format!("-({a})"),
                    UnaryOp::Abs => format!("abs({a})"),
                    UnaryOp::Sin => format!("sin({a})"),
                    UnaryOp::Cos => format!("cos({a})"),
                    UnaryOp::Fract => format!("fract({a})"),
                    UnaryOp::OneMinus => format!("(1.0 - {a})"),
                }
            }
            Node::Binary(op, a, b) => {
                let result_ty = self.ty(expr);
                match op {
                    BinaryOp::Min | BinaryOp::Max => {
                        let name = if *op == BinaryOp::Min { "min" } else { "max" };
                        let a = self.splat(a, result_ty)?;
                        let b = self.splat(b, result_ty)?;
                        format!("{name}({a}, {b})")
                    }
                    BinaryOp::Dot => {
                        format!("dot({}, {})", self.reference(a)?, self.reference(b)?)
                    }
                    _ => {
                        let symbol = match op {
                            BinaryOp::Add => "+",
                            BinaryOp::Sub => "-",
                            BinaryOp::Mul => "*",
                            BinaryOp::Div => "/",
                            BinaryOp::Greater => ">",
                            BinaryOp::Less => "<",
                            BinaryOp::Min | BinaryOp::Max | BinaryOp::Dot => unreachable!(),
                        };
                        format!(
                            "({} {symbol} {})",
                            self.reference(a)?,
                            self.reference(b)?
                        )
                    }
                }
            }
            Node::Length(a) => format!("length({})", self.reference(a)?),
            Node::Mix(a, b, t) => {
                let result_ty = self.ty(expr);
                format!(
                    "mix({}, {}, {})",
                    self.reference(a)?,
                    self.reference(b)?,
                    self.splat(t, result_ty)?
                )
            }
            Node::Smoothstep(e0, e1, x) => format!(
                "smoothstep({}, {}, {})",
                self.reference(e0)?,
                self.reference(e1)?,
                self.reference(x)?
            ),
            Node::Select {
                cond,
                accept,
                reject,
            } => format!(
                "select({}, {}, {})",
                self.concrete(reject)?,
                self.concrete(accept)?,
                self.reference(cond)?
            ),
            Node::Construct(ty, args) => {
                let args = args
                    .iter()
                    .map(|arg| self.reference(arg))
                    .collect::<RevealResult<Vec<_>>>()?;
                format!("{}({})", ty.wgsl(), args.join(", "))
            }
            Node::Swizzle(a, pattern) => format!("{}.{pattern}", self.reference(a)?),
            Node::Texture(uv) => format!(
                "textureSampleLevel(image_tex, image_samp, {}, 0.0)",
                self.reference(uv)?
            ),
            Node::HashBlur {
                uv,
                radius,
                samples,
            } => {
                self.uses_blur = true;
                format!(
                    "hash_blur({}, {}, {samples}u)",
                    self.reference(uv)?,
                    float_literal(*radius)?
                )
            }
            Node::RotationY(angle) => {
                self.uses_rotation = true;
                format!("rotation3d_y({})", self.reference(angle)?)
            }
        };
        Ok(text)
    }
}

/// Formats an `f32` as a WGSL float literal.
pub fn float_literal(value: f32) -> RevealResult<String> {
    if !value.is_finite() {
        return Err(RevealError::graph(format!(
            "cannot emit non-finite constant {value}"
        )));
    }
    let text = if value.fract() == 0.0 && value.abs() < 1.0e9 {
        format!("{value:.1}")
    } else {
        format!("{value:?}")
    };
    if value.is_sign_negative() && value != 0.0 {
        Ok(format!("({text})"))
    } else {
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader_graph::node::*;

    fn trivial_position() -> Expr {
        position_local()
    }

    #[test]
    fn literals_always_carry_a_decimal_point() {
        assert_eq!(float_literal(96.0).unwrap(), "96.0");
        assert_eq!(float_literal(0.06).unwrap(), "0.06");
        assert_eq!(float_literal(-1.5).unwrap(), "(-1.5)");
        assert_eq!(float_literal(0.0).unwrap(), "0.0");
        assert!(float_literal(f32::NAN).is_err());
    }

    #[test]
    fn shared_nodes_become_single_bindings() {
        let cover = mul(uv(), 0.5);
        let color = vec4([cover.x(), cover.y(), float(0.0), float(1.0)]);
        let program = compile_program(&color, &trivial_position()).unwrap();
        assert_eq!(program.source.matches("(uv * 0.5)").count(), 1);
    }

    #[test]
    fn position_local_is_rejected_in_fragment_stage() {
        let color = vec4([position_local(), float(1.0)]);
        let err = compile_program(&color, &trivial_position()).unwrap_err();
        assert!(matches!(err, RevealError::Stage { .. }));
    }

    #[test]
    fn output_types_are_checked() {
        let err = compile_program(&uv(), &trivial_position()).unwrap_err();
        assert!(err.to_string().contains("fragment output"));
    }

    #[test]
    fn helpers_are_only_emitted_when_used() {
        let plain = compile_program(&texture(uv()), &trivial_position()).unwrap();
        assert!(!plain.source.contains("fn hash_blur"));
        assert!(!plain.source.contains("fn rotation3d_y"));

        let rotated = mul(rotation3d_y(uniform(Uniform::EnterProgress)), position_local());
        let fancy = compile_program(&hash_blur(uv(), 0.06, 96), &rotated).unwrap();
        assert!(fancy.source.contains("fn hash_blur"));
        assert!(fancy.source.contains("hash_blur(uv, 0.06, 96u)"));
        assert!(fancy.source.contains("rotation3d_y(u.enter_progress)"));
    }

    #[test]
    fn scalar_min_max_operands_are_splatted() {
        let color = vec4([max(uv(), 0.0), float(0.0), float(1.0)]);
        let program = compile_program(&color, &trivial_position()).unwrap();
        assert!(program.source.contains("max(uv, vec2f(0.0))"));
    }

    #[test]
    fn select_literals_are_concrete() {
        let flag = select(uniform(Uniform::IsBlurred), 0.1, 0.0001);
        let color = vec4([uv(), flag, float(1.0)]);
        let program = compile_program(&color, &trivial_position()).unwrap();
        assert!(program.source.contains("select(f32(0.0001), f32(0.1), (u.is_blurred > 0.5))"));
    }

    #[test]
    fn fnv1a_matches_reference_values() {
        assert_eq!(fnv1a64(b""), 0xcbf29ce484222325);
        assert_eq!(fnv1a64(b"a"), 0xaf63dc4c8601ec8c);
    }

    #[test]
    fn fingerprint_tracks_source() {
        let a = compile_program(&texture(uv()), &trivial_position()).unwrap();
        let b = compile_program(&texture(uv()), &trivial_position()).unwrap();
        let c = compile_program(&texture(mul(uv(), 2.0)), &trivial_position()).unwrap();
        assert_eq!(a.fingerprint, b.fingerprint);
        assert_ne!(a.fingerprint, c.fingerprint);
    }
}
