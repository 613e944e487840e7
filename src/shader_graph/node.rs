//! Expression nodes and the combinators that build them.
//!
//! Nodes are immutable and reference counted, so a sub-expression such as the
//! cover UV can feed several consumers without being rebuilt. Types are not
//! checked while building; [`Expr::value_type`] infers them and reports a
//! [`RevealError::Graph`] on the first mismatch.

use std::collections::HashMap;
use std::rc::Rc;

use super::types::ValueType;
use crate::error::{RevealError, RevealResult};

/// Per-plane uniform scalars readable from a graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Uniform {
    /// Mask growth, 0 hidden to 1 fully shown.
    Reveal,
    /// Entry translation/rotation progress.
    EnterProgress,
    /// Scroll-driven exit progress.
    ExitProgress,
    /// Blur toggle, read as a boolean.
    IsBlurred,
}

impl Uniform {
    pub const ALL: [Uniform; 4] = [
        Uniform::Reveal,
        Uniform::EnterProgress,
        Uniform::ExitProgress,
        Uniform::IsBlurred,
    ];

    /// Field name inside the WGSL uniform block.
    pub fn field(self) -> &'static str {
        match self {
            Uniform::Reveal => "reveal",
            Uniform::EnterProgress => "enter_progress",
            Uniform::ExitProgress => "exit_progress",
            Uniform::IsBlurred => "is_blurred",
        }
    }

    pub fn ty(self) -> ValueType {
        match self {
            Uniform::IsBlurred => ValueType::Bool,
            _ => ValueType::F32,
        }
    }
}

/// Per-invocation inputs supplied by the pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Builtin {
    /// Interpolated texture coordinate of the plane.
    Uv,
    /// Vertex position in the plane's local space. Vertex stage only.
    PositionLocal,
}

impl Builtin {
    pub fn name(self) -> &'static str {
        match self {
            Builtin::Uv => "uv",
            Builtin::PositionLocal => "position_local",
        }
    }

    pub fn ty(self) -> ValueType {
        match self {
            Builtin::Uv => ValueType::Vec2,
            Builtin::PositionLocal => ValueType::Vec3,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Abs,
    Sin,
    Cos,
    Fract,
    OneMinus,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Min,
    Max,
    Dot,
    Greater,
    Less,
}

#[derive(Debug)]
pub enum Node {
    Float(f32),
    Uniform(Uniform),
    Builtin(Builtin),
    Unary(UnaryOp, Expr),
    Binary(BinaryOp, Expr, Expr),
    Length(Expr),
    Mix(Expr, Expr, Expr),
    Smoothstep(Expr, Expr, Expr),
    Select {
        cond: Expr,
        accept: Expr,
        reject: Expr,
    },
    Construct(ValueType, Vec<Expr>),
    Swizzle(Expr, &'static str),
    /// Sample of the plane's bound image.
    Texture(Expr),
    /// Stochastic ring blur of the bound image around `uv`.
    HashBlur {
        uv: Expr,
        radius: f32,
        samples: u32,
    },
    RotationY(Expr),
}

/// Handle to a node in a shader graph.
#[derive(Clone, Debug)]
pub struct Expr(Rc<Node>);

impl Expr {
    fn new(node: Node) -> Self {
        Self(Rc::new(node))
    }

    pub fn node(&self) -> &Node {
        &self.0
    }

    /// Identity of the underlying node, stable for the lifetime of the graph.
    pub(crate) fn id(&self) -> *const Node {
        Rc::as_ptr(&self.0)
    }

    pub fn x(&self) -> Expr {
        self.swizzle("x")
    }

    pub fn y(&self) -> Expr {
        self.swizzle("y")
    }

    pub fn z(&self) -> Expr {
        self.swizzle("z")
    }

    pub fn rgb(&self) -> Expr {
        self.swizzle("rgb")
    }

    pub fn swizzle(&self, pattern: &'static str) -> Expr {
        Expr::new(Node::Swizzle(self.clone(), pattern))
    }

    /// Infer the type of this expression, checking every node beneath it.
    pub fn value_type(&self) -> RevealResult<ValueType> {
        infer(self, &mut HashMap::new())
    }

    /// Visit every distinct node beneath (and including) this one, children first.
    pub(crate) fn visit_post_order(&self, visit: &mut impl FnMut(&Expr)) {
        fn walk(expr: &Expr, seen: &mut Vec<*const Node>, visit: &mut impl FnMut(&Expr)) {
            if seen.contains(&expr.id()) {
                return;
            }
            for child in expr.children() {
                walk(child, seen, visit);
            }
            seen.push(expr.id());
            visit(expr);
        }
        walk(self, &mut Vec::new(), visit);
    }

    pub(crate) fn children(&self) -> Vec<&Expr> {
        match self.node() {
            Node::Float(_) | Node::Uniform(_) | Node::Builtin(_) => Vec::new(),
            Node::Unary(_, a) | Node::Length(a) | Node::Swizzle(a, _) => vec![a],
            Node::Texture(uv) | Node::HashBlur { uv, .. } => vec![uv],
            Node::RotationY(angle) => vec![angle],
            Node::Binary(_, a, b) => vec![a, b],
            Node::Mix(a, b, c) | Node::Smoothstep(a, b, c) => vec![a, b, c],
            Node::Select {
                cond,
                accept,
                reject,
            } => vec![cond, accept, reject],
            Node::Construct(_, args) => args.iter().collect(),
        }
    }

    pub(crate) fn is_leaf(&self) -> bool {
        matches!(
            self.node(),
            Node::Float(_) | Node::Uniform(_) | Node::Builtin(_)
        )
    }
}

impl From<f32> for Expr {
    fn from(value: f32) -> Self {
        float(value)
    }
}

impl From<&Expr> for Expr {
    fn from(value: &Expr) -> Self {
        value.clone()
    }
}

// ============================================================================
// Combinators
// ============================================================================

pub fn float(value: f32) -> Expr {
    Expr::new(Node::Float(value))
}

pub fn uniform(slot: Uniform) -> Expr {
    Expr::new(Node::Uniform(slot))
}

pub fn uv() -> Expr {
    Expr::new(Node::Builtin(Builtin::Uv))
}

pub fn position_local() -> Expr {
    Expr::new(Node::Builtin(Builtin::PositionLocal))
}

fn unary(op: UnaryOp, a: impl Into<Expr>) -> Expr {
    Expr::new(Node::Unary(op, a.into()))
}

fn binary(op: BinaryOp, a: impl Into<Expr>, b: impl Into<Expr>) -> Expr {
    Expr::new(Node::Binary(op, a.into(), b.into()))
}

pub fn neg(a: impl Into<Expr>) -> Expr {
    unary(UnaryOp::Neg, a)
}

pub fn abs(a: impl Into<Expr>) -> Expr {
    unary(UnaryOp::Abs, a)
}

pub fn sin(a: impl Into<Expr>) -> Expr {
    unary(UnaryOp::Sin, a)
}

pub fn cos(a: impl Into<Expr>) -> Expr {
    unary(UnaryOp::Cos, a)
}

pub fn fract(a: impl Into<Expr>) -> Expr {
    unary(UnaryOp::Fract, a)
}

/// `1 - a`
pub fn one_minus(a: impl Into<Expr>) -> Expr {
    unary(UnaryOp::OneMinus, a)
}

pub fn add(a: impl Into<Expr>, b: impl Into<Expr>) -> Expr {
    binary(BinaryOp::Add, a, b)
}

pub fn sub(a: impl Into<Expr>, b: impl Into<Expr>) -> Expr {
    binary(BinaryOp::Sub, a, b)
}

pub fn mul(a: impl Into<Expr>, b: impl Into<Expr>) -> Expr {
    binary(BinaryOp::Mul, a, b)
}

pub fn div(a: impl Into<Expr>, b: impl Into<Expr>) -> Expr {
    binary(BinaryOp::Div, a, b)
}

/// Component-wise minimum. A scalar operand is splatted against a vector.
pub fn min(a: impl Into<Expr>, b: impl Into<Expr>) -> Expr {
    binary(BinaryOp::Min, a, b)
}

/// Component-wise maximum. A scalar operand is splatted against a vector.
pub fn max(a: impl Into<Expr>, b: impl Into<Expr>) -> Expr {
    binary(BinaryOp::Max, a, b)
}

pub fn dot(a: impl Into<Expr>, b: impl Into<Expr>) -> Expr {
    binary(BinaryOp::Dot, a, b)
}

pub fn greater_than(a: impl Into<Expr>, b: impl Into<Expr>) -> Expr {
    binary(BinaryOp::Greater, a, b)
}

pub fn less_than(a: impl Into<Expr>, b: impl Into<Expr>) -> Expr {
    binary(BinaryOp::Less, a, b)
}

pub fn length(a: impl Into<Expr>) -> Expr {
    Expr::new(Node::Length(a.into()))
}

/// Linear blend `a * (1 - t) + b * t`.
pub fn mix(a: impl Into<Expr>, b: impl Into<Expr>, t: impl Into<Expr>) -> Expr {
    Expr::new(Node::Mix(a.into(), b.into(), t.into()))
}

pub fn smoothstep(edge0: impl Into<Expr>, edge1: impl Into<Expr>, x: impl Into<Expr>) -> Expr {
    Expr::new(Node::Smoothstep(edge0.into(), edge1.into(), x.into()))
}

/// Data-parallel choice between two already-computed branches.
pub fn select(cond: impl Into<Expr>, accept: impl Into<Expr>, reject: impl Into<Expr>) -> Expr {
    Expr::new(Node::Select {
        cond: cond.into(),
        accept: accept.into(),
        reject: reject.into(),
    })
}

pub fn vec2(x: impl Into<Expr>, y: impl Into<Expr>) -> Expr {
    Expr::new(Node::Construct(ValueType::Vec2, vec![x.into(), y.into()]))
}

pub fn vec3(x: impl Into<Expr>, y: impl Into<Expr>, z: impl Into<Expr>) -> Expr {
    Expr::new(Node::Construct(
        ValueType::Vec3,
        vec![x.into(), y.into(), z.into()],
    ))
}

/// Builds a vec4 from any mix of scalars and vectors totalling four lanes.
pub fn vec4(parts: impl IntoIterator<Item = Expr>) -> Expr {
    Expr::new(Node::Construct(ValueType::Vec4, parts.into_iter().collect()))
}

/// Builds a 3x3 matrix from three column vectors.
pub fn mat3(c0: impl Into<Expr>, c1: impl Into<Expr>, c2: impl Into<Expr>) -> Expr {
    Expr::new(Node::Construct(
        ValueType::Mat3,
        vec![c0.into(), c1.into(), c2.into()],
    ))
}

pub fn texture(uv: impl Into<Expr>) -> Expr {
    Expr::new(Node::Texture(uv.into()))
}

pub fn hash_blur(uv: impl Into<Expr>, radius: f32, samples: u32) -> Expr {
    Expr::new(Node::HashBlur {
        uv: uv.into(),
        radius,
        samples,
    })
}

/// Rotation matrix about Y, see [`crate::rotation::rotation3d_y`].
pub fn rotation3d_y(angle: impl Into<Expr>) -> Expr {
    Expr::new(Node::RotationY(angle.into()))
}

// ============================================================================
// Type inference
// ============================================================================

fn mismatch(what: &str, types: &[ValueType]) -> RevealError {
    RevealError::graph(format!("{what} does not accept operands {types:?}"))
}

fn is_float_like(ty: ValueType) -> bool {
    ty.lanes().is_some()
}

/// Result type of a component-wise op, allowing a scalar to broadcast.
fn broadcast(what: &str, a: ValueType, b: ValueType) -> RevealResult<ValueType> {
    match (a, b) {
        _ if a == b && is_float_like(a) => Ok(a),
        (ValueType::F32, v) | (v, ValueType::F32) if v.is_vector() => Ok(v),
        _ => Err(mismatch(what, &[a, b])),
    }
}

/// Infers every node type beneath `expr`, keyed by node identity.
pub(crate) fn infer_all(expr: &Expr) -> RevealResult<HashMap<*const Node, ValueType>> {
    let mut cache = HashMap::new();
    infer(expr, &mut cache)?;
    Ok(cache)
}

fn infer(expr: &Expr, cache: &mut HashMap<*const Node, ValueType>) -> RevealResult<ValueType> {
    if let Some(ty) = cache.get(&expr.id()) {
        return Ok(*ty);
    }

    let ty = match expr.node() {
        Node::Float(_) => ValueType::F32,
        Node::Uniform(slot) => slot.ty(),
        Node::Builtin(builtin) => builtin.ty(),
        Node::Unary(op, a) => {
            let a = infer(a, cache)?;
            if !is_float_like(a) {
                return Err(mismatch(&format!("{op:?}"), &[a]));
            }
            a
        }
        Node::Binary(op, a, b) => {
            let a = infer(a, cache)?;
            let b = infer(b, cache)?;
            match op {
                BinaryOp::Mul => match (a, b) {
                    (ValueType::Mat3, ValueType::Vec3) | (ValueType::Vec3, ValueType::Mat3) => {
                        ValueType::Vec3
                    }
                    (ValueType::Mat3, ValueType::Mat3) => ValueType::Mat3,
                    _ => broadcast("Mul", a, b)?,
                },
                BinaryOp::Add | BinaryOp::Sub | BinaryOp::Div | BinaryOp::Min | BinaryOp::Max => {
                    broadcast(&format!("{op:?}"), a, b)?
                }
                BinaryOp::Dot => {
                    if a != b || !a.is_vector() {
                        return Err(mismatch("Dot", &[a, b]));
                    }
                    ValueType::F32
                }
                BinaryOp::Greater | BinaryOp::Less => {
                    if a != ValueType::F32 || b != ValueType::F32 {
                        return Err(mismatch(&format!("{op:?}"), &[a, b]));
                    }
                    ValueType::Bool
                }
            }
        }
        Node::Length(a) => {
            let a = infer(a, cache)?;
            if !is_float_like(a) {
                return Err(mismatch("Length", &[a]));
            }
            ValueType::F32
        }
        Node::Mix(a, b, t) => {
            let a = infer(a, cache)?;
            let b = infer(b, cache)?;
            let t = infer(t, cache)?;
            if a != b || !is_float_like(a) || !(t == a || t == ValueType::F32) {
                return Err(mismatch("Mix", &[a, b, t]));
            }
            a
        }
        Node::Smoothstep(e0, e1, x) => {
            let types = [infer(e0, cache)?, infer(e1, cache)?, infer(x, cache)?];
            if types.iter().any(|t| *t != ValueType::F32) {
                return Err(mismatch("Smoothstep", &types));
            }
            ValueType::F32
        }
        Node::Select {
            cond,
            accept,
            reject,
        } => {
            let c = infer(cond, cache)?;
            let a = infer(accept, cache)?;
            let r = infer(reject, cache)?;
            if c != ValueType::Bool || a != r {
                return Err(mismatch("Select", &[c, a, r]));
            }
            a
        }
        Node::Construct(target, args) => {
            let types = args
                .iter()
                .map(|arg| infer(arg, cache))
                .collect::<RevealResult<Vec<_>>>()?;
            check_construct(*target, &types)?;
            *target
        }
        Node::Swizzle(a, pattern) => {
            let a = infer(a, cache)?;
            swizzle_type(a, pattern)?
        }
        Node::Texture(uv) | Node::HashBlur { uv, .. } => {
            let uv = infer(uv, cache)?;
            if uv != ValueType::Vec2 {
                return Err(mismatch("Texture", &[uv]));
            }
            ValueType::Vec4
        }
        Node::RotationY(angle) => {
            let angle = infer(angle, cache)?;
            if angle != ValueType::F32 {
                return Err(mismatch("RotationY", &[angle]));
            }
            ValueType::Mat3
        }
    };

    cache.insert(expr.id(), ty);
    Ok(ty)
}

fn check_construct(target: ValueType, args: &[ValueType]) -> RevealResult<()> {
    if target == ValueType::Mat3 {
        if args.len() == 3 && args.iter().all(|t| *t == ValueType::Vec3) {
            return Ok(());
        }
        return Err(mismatch("mat3 constructor", args));
    }

    let want = target
        .lanes()
        .ok_or_else(|| RevealError::graph(format!("cannot construct {target:?}")))?;
    let mut have = 0;
    for ty in args {
        have += ty.lanes().ok_or_else(|| mismatch("vector constructor", args))?;
    }
    let splat = args.len() == 1 && args[0] == ValueType::F32;
    if have == want || splat {
        Ok(())
    } else {
        Err(RevealError::graph(format!(
            "{} needs {want} lanes, got {have} from {args:?}",
            target.wgsl()
        )))
    }
}

/// Maps a swizzle letter to its lane index.
pub(crate) fn swizzle_lane(c: char) -> Option<usize> {
    match c {
        'x' | 'r' => Some(0),
        'y' | 'g' => Some(1),
        'z' | 'b' => Some(2),
        'w' | 'a' => Some(3),
        _ => None,
    }
}

fn swizzle_type(source: ValueType, pattern: &str) -> RevealResult<ValueType> {
    let lanes = source
        .lanes()
        .filter(|_| source.is_vector())
        .ok_or_else(|| RevealError::graph(format!("cannot swizzle {source:?}")))?;
    for c in pattern.chars() {
        match swizzle_lane(c) {
            Some(lane) if lane < lanes => {}
            _ => {
                return Err(RevealError::graph(format!(
                    "swizzle .{pattern} out of range for {}",
                    source.wgsl()
                )));
            }
        }
    }
    ValueType::vector(pattern.len())
        .ok_or_else(|| RevealError::graph(format!("invalid swizzle .{pattern}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars_broadcast_against_vectors() {
        let e = mul(uv(), 0.5);
        assert_eq!(e.value_type().unwrap(), ValueType::Vec2);
        let e = sub(1.0, position_local());
        assert_eq!(e.value_type().unwrap(), ValueType::Vec3);
    }

    #[test]
    fn mismatched_vectors_are_rejected() {
        let e = add(uv(), position_local());
        let err = e.value_type().unwrap_err();
        assert!(err.to_string().contains("Add"));
    }

    #[test]
    fn matrix_times_vector_is_vector() {
        let e = mul(rotation3d_y(0.5), position_local());
        assert_eq!(e.value_type().unwrap(), ValueType::Vec3);
    }

    #[test]
    fn select_requires_bool_condition() {
        let bad = select(uniform(Uniform::Reveal), 1.0, 0.0);
        assert!(bad.value_type().is_err());
        let good = select(uniform(Uniform::IsBlurred), 1.0, 0.0);
        assert_eq!(good.value_type().unwrap(), ValueType::F32);
    }

    #[test]
    fn vec4_counts_lanes_across_parts() {
        let color = texture(uv());
        let ok = vec4([color.rgb(), float(0.0)]);
        assert_eq!(ok.value_type().unwrap(), ValueType::Vec4);
        let short = vec4([color.rgb()]);
        assert!(short.value_type().is_err());
    }

    #[test]
    fn swizzles_are_range_checked() {
        assert_eq!(uv().x().value_type().unwrap(), ValueType::F32);
        assert!(uv().z().value_type().is_err());
        assert!(float(1.0).x().value_type().is_err());
    }

    #[test]
    fn shared_nodes_are_visited_once() {
        let shared = mul(uv(), 2.0);
        let root = add(shared.x(), shared.y());
        let mut count = 0;
        root.visit_post_order(&mut |e: &Expr| {
            if e.id() == shared.id() {
                count += 1;
            }
        });
        assert_eq!(count, 1);
    }
}
