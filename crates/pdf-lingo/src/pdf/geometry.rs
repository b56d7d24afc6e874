//! Boxes and affine matrices

use lopdf::Object;
use serde::{Deserialize, Serialize};

use super::number;

/// Axis-aligned box in top-left-origin page coordinates (y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl BoundingBox {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    pub fn center(&self) -> (f32, f32) {
        ((self.x0 + self.x1) / 2.0, (self.y0 + self.y1) / 2.0)
    }

    /// Smallest box containing both
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// Point containment with a margin on every side
    pub fn contains(&self, x: f32, y: f32, margin: f32) -> bool {
        x >= self.x0 - margin && x <= self.x1 + margin && y >= self.y0 - margin && y <= self.y1 + margin
    }

    /// Length of the shared x-range (negative when disjoint)
    pub fn horizontal_overlap(&self, other: &BoundingBox) -> f32 {
        self.x1.min(other.x1) - self.x0.max(other.x0)
    }
}

/// PDF transformation matrix `[a b c d e f]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub fn translate(tx: f32, ty: f32) -> Self {
        Matrix {
            e: tx,
            f: ty,
            ..Self::IDENTITY
        }
    }

    /// Six numeric operands, as used by `cm` and `Tm`
    pub fn from_operands(operands: &[Object]) -> Option<Self> {
        if operands.len() < 6 {
            return None;
        }
        Some(Matrix {
            a: number(&operands[0])?,
            b: number(&operands[1])?,
            c: number(&operands[2])?,
            d: number(&operands[3])?,
            e: number(&operands[4])?,
            f: number(&operands[5])?,
        })
    }

    /// `self × other` (apply `self` first, then `other`)
    pub fn multiply(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            x * self.a + y * self.c + self.e,
            x * self.b + y * self.d + self.f,
        )
    }

    /// Length of the transformed unit y-vector
    pub fn vertical_scale(&self) -> f32 {
        (self.c * self.c + self.d * self.d).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matrix_compose() {
        let scale = Matrix {
            a: 2.0,
            d: 2.0,
            ..Matrix::IDENTITY
        };
        let moved = Matrix::translate(10.0, 20.0).multiply(&scale);
        assert_eq!(moved.apply(0.0, 0.0), (20.0, 40.0));
        assert_eq!(moved.apply(1.0, 1.0), (22.0, 42.0));
        assert_eq!(moved.vertical_scale(), 2.0);
    }

    #[test]
    fn test_matrix_from_operands() {
        let ops = vec![
            Object::Integer(1),
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(1),
            Object::Integer(72),
            Object::Integer(700),
        ];
        let m = Matrix::from_operands(&ops).unwrap();
        assert_eq!(m.apply(0.0, 0.0), (72.0, 700.0));
        assert!(Matrix::from_operands(&ops[..4]).is_none());
    }

    #[test]
    fn test_bbox_helpers() {
        let a = BoundingBox::new(10.0, 10.0, 50.0, 20.0);
        let b = BoundingBox::new(40.0, 25.0, 90.0, 35.0);
        assert_eq!(a.horizontal_overlap(&b), 10.0);
        assert_eq!(a.union(&b), BoundingBox::new(10.0, 10.0, 90.0, 35.0));
        assert!(a.contains(30.0, 15.0, 0.0));
        assert!(!a.contains(30.0, 22.0, 1.0));
        assert!(a.contains(30.0, 20.5, 1.0));

        let flipped = BoundingBox::new(5.0, 9.0, 1.0, 3.0);
        assert_eq!(flipped.height(), 6.0);
        assert_eq!(flipped.width(), 4.0);
    }
}
