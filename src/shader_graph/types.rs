use glam::{Mat3, Vec2, Vec3, Vec4};

use crate::error::{RevealError, RevealResult};

/// Type of a shader graph node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueType {
    F32,
    Bool,
    Vec2,
    Vec3,
    Vec4,
    Mat3,
}

impl ValueType {
    /// Returns the WGSL type name for this value type.
    pub fn wgsl(self) -> &'static str {
        match self {
            ValueType::F32 => "f32",
            ValueType::Bool => "bool",
            ValueType::Vec2 => "vec2f",
            ValueType::Vec3 => "vec3f",
            ValueType::Vec4 => "vec4f",
            ValueType::Mat3 => "mat3x3f",
        }
    }

    /// Number of float lanes for scalars and vectors, `None` otherwise.
    pub fn lanes(self) -> Option<usize> {
        match self {
            ValueType::F32 => Some(1),
            ValueType::Vec2 => Some(2),
            ValueType::Vec3 => Some(3),
            ValueType::Vec4 => Some(4),
            ValueType::Bool | ValueType::Mat3 => None,
        }
    }

    pub fn is_vector(self) -> bool {
        matches!(self, ValueType::Vec2 | ValueType::Vec3 | ValueType::Vec4)
    }

    pub(crate) fn vector(lanes: usize) -> Option<ValueType> {
        match lanes {
            1 => Some(ValueType::F32),
            2 => Some(ValueType::Vec2),
            3 => Some(ValueType::Vec3),
            4 => Some(ValueType::Vec4),
            _ => None,
        }
    }
}

/// A concrete value produced by the CPU evaluator.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Value {
    F32(f32),
    Bool(bool),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat3(Mat3),
}

impl Value {
    pub fn ty(&self) -> ValueType {
        match self {
            Value::F32(_) => ValueType::F32,
            Value::Bool(_) => ValueType::Bool,
            Value::Vec2(_) => ValueType::Vec2,
            Value::Vec3(_) => ValueType::Vec3,
            Value::Vec4(_) => ValueType::Vec4,
            Value::Mat3(_) => ValueType::Mat3,
        }
    }

    /// Splits a scalar or vector into float lanes.
    pub(crate) fn lanes(&self) -> Option<([f32; 4], usize)> {
        match *self {
            Value::F32(v) => Some(([v, 0.0, 0.0, 0.0], 1)),
            Value::Vec2(v) => Some(([v.x, v.y, 0.0, 0.0], 2)),
            Value::Vec3(v) => Some(([v.x, v.y, v.z, 0.0], 3)),
            Value::Vec4(v) => Some((v.to_array(), 4)),
            Value::Bool(_) | Value::Mat3(_) => None,
        }
    }

    pub(crate) fn from_lanes(lanes: [f32; 4], len: usize) -> RevealResult<Value> {
        match len {
            1 => Ok(Value::F32(lanes[0])),
            2 => Ok(Value::Vec2(Vec2::new(lanes[0], lanes[1]))),
            3 => Ok(Value::Vec3(Vec3::new(lanes[0], lanes[1], lanes[2]))),
            4 => Ok(Value::Vec4(Vec4::from_array(lanes))),
            n => Err(RevealError::graph(format!("no vector type with {n} lanes"))),
        }
    }

    pub fn as_f32(&self) -> RevealResult<f32> {
        match self {
            Value::F32(v) => Ok(*v),
            other => Err(RevealError::graph(format!(
                "expected f32, got {:?}",
                other.ty()
            ))),
        }
    }

    pub fn as_bool(&self) -> RevealResult<bool> {
        match self {
            Value::Bool(v) => Ok(*v),
            other => Err(RevealError::graph(format!(
                "expected bool, got {:?}",
                other.ty()
            ))),
        }
    }

    pub fn as_vec2(&self) -> RevealResult<Vec2> {
        match self {
            Value::Vec2(v) => Ok(*v),
            other => Err(RevealError::graph(format!(
                "expected vec2f, got {:?}",
                other.ty()
            ))),
        }
    }

    pub fn as_vec3(&self) -> RevealResult<Vec3> {
        match self {
            Value::Vec3(v) => Ok(*v),
            other => Err(RevealError::graph(format!(
                "expected vec3f, got {:?}",
                other.ty()
            ))),
        }
    }

    pub fn as_vec4(&self) -> RevealResult<Vec4> {
        match self {
            Value::Vec4(v) => Ok(*v),
            other => Err(RevealError::graph(format!(
                "expected vec4f, got {:?}",
                other.ty()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lanes_round_trip_through_value() {
        let v = Value::Vec3(Vec3::new(1.0, 2.0, 3.0));
        let (lanes, len) = v.lanes().unwrap();
        assert_eq!(len, 3);
        assert_eq!(Value::from_lanes(lanes, len).unwrap(), v);
    }

    #[test]
    fn bool_and_matrix_have_no_lanes() {
        assert!(Value::Bool(true).lanes().is_none());
        assert!(Value::Mat3(Mat3::IDENTITY).lanes().is_none());
        assert_eq!(ValueType::Mat3.lanes(), None);
    }

    #[test]
    fn accessors_reject_wrong_types() {
        assert!(Value::F32(1.0).as_vec2().is_err());
        assert!(Value::Bool(true).as_f32().is_err());
        assert_eq!(Value::F32(0.5).as_f32().unwrap(), 0.5);
    }
}
