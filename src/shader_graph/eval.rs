//! CPU interpreter for shader graphs.
//!
//! Mirrors the WGSL backend node for node, so graph behaviour can be checked
//! without a device and the scene can answer geometric queries.

use std::collections::HashMap;

use glam::{Mat3, Vec2, Vec3, Vec4};

use super::node::{BinaryOp, Builtin, Expr, Node, UnaryOp, swizzle_lane};
use super::types::{Value, ValueType};
use crate::error::{RevealError, RevealResult};
use crate::rotation::rotation3d_y;
use crate::uniforms::UniformSet;

/// Something the evaluator can sample like the plane's bound image.
pub trait TextureSampler {
    /// Linear RGBA at `uv`, addressing clamped to the edges.
    fn sample(&self, uv: Vec2) -> Vec4;
}

/// Per-invocation inputs for [`evaluate`].
pub struct EvalInputs<'a> {
    pub uv: Vec2,
    pub position_local: Vec3,
    pub uniforms: &'a UniformSet,
    pub texture: &'a dyn TextureSampler,
}

/// Evaluate `expr` for one invocation.
pub fn evaluate(expr: &Expr, inputs: &EvalInputs) -> RevealResult<Value> {
    let mut memo = HashMap::new();
    eval(expr, inputs, &mut memo)
}

fn eval(
    expr: &Expr,
    inputs: &EvalInputs,
    memo: &mut HashMap<*const Node, Value>,
) -> RevealResult<Value> {
    if let Some(value) = memo.get(&expr.id()) {
        return Ok(*value);
    }

    let value = match expr.node() {
        Node::Float(v) => Value::F32(*v),
        Node::Uniform(slot) => match slot.ty() {
            ValueType::Bool => Value::Bool(inputs.uniforms.get(*slot) > 0.5),
            _ => Value::F32(inputs.uniforms.get(*slot)),
        },
        Node::Builtin(Builtin::Uv) => Value::Vec2(inputs.uv),
        Node::Builtin(Builtin::PositionLocal) => Value::Vec3(inputs.position_local),
        Node::Unary(op, a) => {
            let a = eval(a, inputs, memo)?;
            map_lanes(&a, |x| match op {
                UnaryOp::Neg => -x,
                UnaryOp::Abs => x.abs(),
                UnaryOp::Sin => x.sin(),
                UnaryOp::Cos => x.cos(),
                UnaryOp::Fract => x - x.floor(),
                UnaryOp::OneMinus => 1.0 - x,
            })?
        }
        Node::Binary(op, a, b) => {
            let a = eval(a, inputs, memo)?;
            let b = eval(b, inputs, memo)?;
            binary(*op, a, b)?
        }
        Node::Length(a) => {
            let (lanes, len) = float_lanes(&eval(a, inputs, memo)?)?;
            Value::F32(lanes[..len].iter().map(|x| x * x).sum::<f32>().sqrt())
        }
        Node::Mix(a, b, t) => {
            let a = eval(a, inputs, memo)?;
            let b = eval(b, inputs, memo)?;
            let t = eval(t, inputs, memo)?;
            let (a, len) = float_lanes(&a)?;
            let (b, _) = float_lanes(&b)?;
            let (t, t_len) = float_lanes(&t)?;
            let mut out = [0.0; 4];
            for i in 0..len {
                let t = if t_len == 1 { t[0] } else { t[i] };
                out[i] = a[i] * (1.0 - t) + b[i] * t;
            }
            Value::from_lanes(out, len)?
        }
        Node::Smoothstep(e0, e1, x) => {
            let e0 = eval(e0, inputs, memo)?.as_f32()?;
            let e1 = eval(e1, inputs, memo)?.as_f32()?;
            let x = eval(x, inputs, memo)?.as_f32()?;
            Value::F32(smoothstep(e0, e1, x))
        }
        Node::Select {
            cond,
            accept,
            reject,
        } => {
            // Both branches are evaluated, as on the device.
            let cond = eval(cond, inputs, memo)?.as_bool()?;
            let accept = eval(accept, inputs, memo)?;
            let reject = eval(reject, inputs, memo)?;
            if cond { accept } else { reject }
        }
        Node::Construct(ValueType::Mat3, args) => {
            let cols = args
                .iter()
                .map(|arg| eval(arg, inputs, memo)?.as_vec3())
                .collect::<RevealResult<Vec<_>>>()?;
            match cols.as_slice() {
                [c0, c1, c2] => Value::Mat3(Mat3::from_cols(*c0, *c1, *c2)),
                _ => return Err(RevealError::graph("mat3 needs three columns")),
            }
        }
        Node::Construct(ty, args) => {
            let want = ty
                .lanes()
                .ok_or_else(|| RevealError::graph(format!("cannot construct {ty:?}")))?;
            let mut out = Vec::with_capacity(4);
            for arg in args {
                let (lanes, len) = float_lanes(&eval(arg, inputs, memo)?)?;
                out.extend_from_slice(&lanes[..len]);
            }
            if out.len() == 1 {
                out.resize(want, out[0]);
            }
            if out.len() != want {
                return Err(RevealError::graph(format!(
                    "{} needs {want} lanes, got {}",
                    ty.wgsl(),
                    out.len()
                )));
            }
            let mut lanes = [0.0; 4];
            lanes[..want].copy_from_slice(&out);
            Value::from_lanes(lanes, want)?
        }
        Node::Swizzle(a, pattern) => {
            let (lanes, len) = float_lanes(&eval(a, inputs, memo)?)?;
            if pattern.is_empty() || pattern.len() > 4 {
                return Err(RevealError::graph(format!("invalid swizzle .{pattern}")));
            }
            let mut out = [0.0; 4];
            for (i, c) in pattern.chars().enumerate() {
                let lane = swizzle_lane(c)
                    .filter(|lane| *lane < len)
                    .ok_or_else(|| RevealError::graph(format!("invalid swizzle .{pattern}")))?;
                out[i] = lanes[lane];
            }
            Value::from_lanes(out, pattern.len())?
        }
        Node::Texture(uv) => {
            let uv = eval(uv, inputs, memo)?.as_vec2()?;
            Value::Vec4(inputs.texture.sample(uv))
        }
        Node::HashBlur {
            uv,
            radius,
            samples,
        } => {
            let uv = eval(uv, inputs, memo)?.as_vec2()?;
            Value::Vec4(hash_blur(inputs.texture, uv, *radius, *samples))
        }
        Node::RotationY(angle) => Value::Mat3(rotation3d_y(eval(angle, inputs, memo)?.as_f32()?)),
    };

    memo.insert(expr.id(), value);
    Ok(value)
}

fn float_lanes(value: &Value) -> RevealResult<([f32; 4], usize)> {
    value
        .lanes()
        .ok_or_else(|| RevealError::graph(format!("expected a float value, got {:?}", value.ty())))
}

fn map_lanes(value: &Value, f: impl Fn(f32) -> f32) -> RevealResult<Value> {
    let (mut lanes, len) = float_lanes(value)?;
    for lane in lanes.iter_mut().take(len) {
        *lane = f(*lane);
    }
    Value::from_lanes(lanes, len)
}

fn binary(op: BinaryOp, a: Value, b: Value) -> RevealResult<Value> {
    match (op, a, b) {
        (BinaryOp::Mul, Value::Mat3(m), Value::Vec3(v)) => return Ok(Value::Vec3(m * v)),
        // Row vector times matrix.
        (BinaryOp::Mul, Value::Vec3(v), Value::Mat3(m)) => {
            return Ok(Value::Vec3(m.transpose() * v));
        }
        (BinaryOp::Mul, Value::Mat3(a), Value::Mat3(b)) => return Ok(Value::Mat3(a * b)),
        (BinaryOp::Greater, Value::F32(a), Value::F32(b)) => return Ok(Value::Bool(a > b)),
        (BinaryOp::Less, Value::F32(a), Value::F32(b)) => return Ok(Value::Bool(a < b)),
        _ => {}
    }

    let (a, a_len) = float_lanes(&a)?;
    let (b, b_len) = float_lanes(&b)?;

    if op == BinaryOp::Dot {
        if a_len != b_len {
            return Err(RevealError::graph("dot of mismatched vectors"));
        }
        return Ok(Value::F32((0..a_len).map(|i| a[i] * b[i]).sum()));
    }

    let len = a_len.max(b_len);
    if a_len != b_len && a_len != 1 && b_len != 1 {
        return Err(RevealError::graph(format!(
            "{op:?} of mismatched widths {a_len} and {b_len}"
        )));
    }
    let lane = |v: &[f32; 4], n: usize, i: usize| if n == 1 { v[0] } else { v[i] };

    let mut out = [0.0; 4];
    for (i, slot) in out.iter_mut().enumerate().take(len) {
        let x = lane(&a, a_len, i);
        let y = lane(&b, b_len, i);
        *slot = match op {
            BinaryOp::Add => x + y,
            BinaryOp::Sub => x - y,
            BinaryOp::Mul => x * y,
            BinaryOp::Div => x / y,
            BinaryOp::Min => x.min(y),
            BinaryOp::Max => x.max(y),
            BinaryOp::Dot | BinaryOp::Greater | BinaryOp::Less => {
                return Err(RevealError::graph(format!("{op:?} is not component-wise")));
            }
        };
    }
    Value::from_lanes(out, len)
}

/// Hermite step matching WGSL `smoothstep`.
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

fn hash_rand(co: Vec2) -> f32 {
    let v = (co.dot(Vec2::new(12.9898, 78.233))).sin() * 43758.5453;
    v - v.floor()
}

fn hash_blur(texture: &dyn TextureSampler, uv: Vec2, radius: f32, samples: u32) -> Vec4 {
    if samples == 0 {
        return Vec4::ZERO;
    }
    let count = samples as f32;
    let mut acc = Vec4::ZERO;
    for i in 0..samples {
        let fi = i as f32;
        let angle = fi / count * std::f32::consts::TAU;
        let jitter = hash_rand(Vec2::new(fi, uv.x + uv.y)) + radius;
        let offset = Vec2::new(angle.cos(), angle.sin()) * jitter * radius;
        acc += texture.sample(uv + offset);
    }
    acc / count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader_graph::node::*;
    use crate::shader_graph::node::rotation3d_y;
    use super::{hash_blur, smoothstep};

    struct Gradient;

    impl TextureSampler for Gradient {
        fn sample(&self, uv: Vec2) -> Vec4 {
            let uv = uv.clamp(Vec2::ZERO, Vec2::ONE);
            Vec4::new(uv.x, uv.y, 0.0, 1.0)
        }
    }

    struct Flat(Vec4);

    impl TextureSampler for Flat {
        fn sample(&self, _uv: Vec2) -> Vec4 {
            self.0
        }
    }

    fn run(expr: &Expr, uv: Vec2, uniforms: &UniformSet) -> Value {
        let inputs = EvalInputs {
            uv,
            position_local: Vec3::new(1.0, 2.0, 3.0),
            uniforms,
            texture: &Gradient,
        };
        evaluate(expr, &inputs).unwrap()
    }

    fn try_run(expr: &Expr) -> RevealResult<Value> {
        let uniforms = UniformSet::default();
        let inputs = EvalInputs {
            uv: Vec2::new(0.25, 0.5),
            position_local: Vec3::ZERO,
            uniforms: &uniforms,
            texture: &Gradient,
        };
        evaluate(expr, &inputs)
    }

    #[test]
    fn swizzles_longer_than_a_vec4_are_errors() {
        let wide = vec4([uv(), uv()]);
        assert!(matches!(try_run(&wide.swizzle("xyzwx")), Err(RevealError::Graph(_))));
        assert!(matches!(try_run(&uv().swizzle("")), Err(RevealError::Graph(_))));
        assert_eq!(try_run(&uv().swizzle("yx")).unwrap(), Value::Vec2(Vec2::new(0.5, 0.25)));
    }

    #[test]
    fn arithmetic_broadcasts_scalars() {
        let uniforms = UniformSet::default();
        let v = run(&add(mul(uv(), 2.0), 1.0), Vec2::new(0.25, 0.5), &uniforms);
        assert_eq!(v, Value::Vec2(Vec2::new(1.5, 2.0)));
    }

    #[test]
    fn uniforms_are_read_from_the_set() {
        let uniforms = UniformSet::default().with(crate::shader_graph::Uniform::Reveal, 0.75);
        let v = run(&uniform(crate::shader_graph::Uniform::Reveal), Vec2::ZERO, &uniforms);
        assert_eq!(v, Value::F32(0.75));
        let flag = run(&uniform(crate::shader_graph::Uniform::IsBlurred), Vec2::ZERO, &uniforms);
        assert_eq!(flag, Value::Bool(false));
    }

    #[test]
    fn texture_samples_at_the_given_uv() {
        let uniforms = UniformSet::default();
        let v = run(&texture(uv()), Vec2::new(0.2, 0.8), &uniforms);
        assert_eq!(v, Value::Vec4(Vec4::new(0.2, 0.8, 0.0, 1.0)));
    }

    #[test]
    fn rotation_matches_free_function() {
        let uniforms = UniformSet::default();
        let expr = mul(rotation3d_y(0.5), position_local());
        let v = run(&expr, Vec2::ZERO, &uniforms);
        let expected = crate::rotation::rotation3d_y(0.5) * Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(v, Value::Vec3(expected));
    }

    #[test]
    fn smoothstep_hits_its_edges() {
        assert_eq!(smoothstep(0.0, 1.0, -1.0), 0.0);
        assert_eq!(smoothstep(0.0, 1.0, 2.0), 1.0);
        assert!((smoothstep(0.0, 1.0, 0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn blur_of_flat_image_is_flat() {
        let color = Vec4::new(0.3, 0.6, 0.9, 1.0);
        let blurred = hash_blur(&Flat(color), Vec2::splat(0.5), 0.06, 96);
        assert!((blurred - color).length() < 1e-5);
    }

    #[test]
    fn select_picks_branch_by_flag() {
        let expr = select(uniform(crate::shader_graph::Uniform::IsBlurred), 1.0, 2.0);
        let sharp = UniformSet::new(false);
        let blurred = UniformSet::new(true);
        assert_eq!(run(&expr, Vec2::ZERO, &sharp), Value::F32(2.0));
        assert_eq!(run(&expr, Vec2::ZERO, &blurred), Value::F32(1.0));
    }
}
