use serde::{Deserialize, Serialize};

use super::ty::Type;

/// A compile-time constant.
///
/// `Char` is stored as its UTF-16 code unit, matching the JVM's unsigned
/// 16-bit `char`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Null,
    Bool(bool),
    Byte(i8),
    Short(i16),
    Char(u16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Str(String),
    /// A `T.class` constant.
    Class(Type),
}

impl Literal {
    /// The static type of this constant.
    pub fn ty(&self) -> Type {
        match self {
            Literal::Null => Type::object(),
            Literal::Bool(_) => Type::Bool,
            Literal::Byte(_) => Type::Byte,
            Literal::Short(_) => Type::Short,
            Literal::Char(_) => Type::Char,
            Literal::Int(_) => Type::Int,
            Literal::Long(_) => Type::Long,
            Literal::Float(_) => Type::Float,
            Literal::Double(_) => Type::Double,
            Literal::Str(_) => Type::string(),
            Literal::Class(_) => Type::Ref("java.lang.Class".to_string()),
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Literal::Byte(_)
                | Literal::Short(_)
                | Literal::Char(_)
                | Literal::Int(_)
                | Literal::Long(_)
                | Literal::Float(_)
                | Literal::Double(_)
        )
    }

    /// The value as an `i32` switch/index key, if it is an `Int` constant.
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Literal::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Convert to `int` with JVM semantics: integral sources truncate to
    /// the low 32 bits (`l2i`), floating sources truncate toward zero and
    /// saturate (`f2i`/`d2i`, NaN becomes 0).
    fn jvm_to_int(&self) -> Option<i32> {
        Some(match self {
            Literal::Byte(v) => i32::from(*v),
            Literal::Short(v) => i32::from(*v),
            Literal::Char(v) => i32::from(*v),
            Literal::Int(v) => *v,
            Literal::Long(v) => *v as i32,
            Literal::Float(v) => *v as i32,
            Literal::Double(v) => *v as i32,
            _ => return None,
        })
    }

    /// Convert to `long` with JVM semantics (`i2l`, `f2l`, `d2l`).
    fn jvm_to_long(&self) -> Option<i64> {
        Some(match self {
            Literal::Byte(v) => i64::from(*v),
            Literal::Short(v) => i64::from(*v),
            Literal::Char(v) => i64::from(*v),
            Literal::Int(v) => i64::from(*v),
            Literal::Long(v) => *v,
            Literal::Float(v) => *v as i64,
            Literal::Double(v) => *v as i64,
            _ => return None,
        })
    }

    /// Widest floating view of a numeric constant.
    fn jvm_to_double(&self) -> Option<f64> {
        Some(match self {
            Literal::Byte(v) => f64::from(*v),
            Literal::Short(v) => f64::from(*v),
            Literal::Char(v) => f64::from(*v),
            Literal::Int(v) => f64::from(*v),
            Literal::Long(v) => *v as f64,
            Literal::Float(v) => f64::from(*v),
            Literal::Double(v) => *v,
            _ => return None,
        })
    }

    /// Constant-fold a cast of this literal to `to`, with JVM-exact
    /// conversion semantics.
    ///
    /// Integral narrowing keeps the low bits (`i2b`/`i2s`/`i2c`), so
    /// `(byte) 300 == 44` and `(char) -1 == 65535`. Floating-to-integral
    /// truncates toward zero. Non-numeric sources and non-primitive
    /// targets are not folded.
    pub fn cast_to(&self, to: &Type) -> Option<Literal> {
        if !self.is_numeric() {
            return None;
        }
        Some(match to {
            Type::Bool => Literal::Bool(self.jvm_to_int()? != 0),
            Type::Byte => Literal::Byte(self.jvm_to_int()? as i8),
            Type::Short => Literal::Short(self.jvm_to_int()? as i16),
            Type::Char => Literal::Char(self.jvm_to_int()? as u16),
            Type::Int => Literal::Int(self.jvm_to_int()?),
            Type::Long => Literal::Long(self.jvm_to_long()?),
            Type::Float => Literal::Float(self.jvm_to_double()? as f32),
            Type::Double => Literal::Double(self.jvm_to_double()?),
            Type::Void | Type::Ref(_) | Type::Array(_) | Type::Unresolved => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Integral narrowing keeps the low bits.
    #[test]
    fn narrowing_truncates_bits() {
        assert_eq!(
            Literal::Int(300).cast_to(&Type::Byte),
            Some(Literal::Byte(44))
        );
        assert_eq!(
            Literal::Int(-1).cast_to(&Type::Short),
            Some(Literal::Short(-1))
        );
        assert_eq!(
            Literal::Int(-1).cast_to(&Type::Char),
            Some(Literal::Char(65535))
        );
        assert_eq!(
            Literal::Long(0x1_0000_0001).cast_to(&Type::Int),
            Some(Literal::Int(1))
        );
    }

    /// Floating-to-integral truncates toward zero and saturates.
    #[test]
    fn float_to_int_truncates_toward_zero() {
        assert_eq!(Literal::Double(3.9).cast_to(&Type::Int), Some(Literal::Int(3)));
        assert_eq!(
            Literal::Double(-3.9).cast_to(&Type::Int),
            Some(Literal::Int(-3))
        );
        assert_eq!(
            Literal::Double(f64::NAN).cast_to(&Type::Int),
            Some(Literal::Int(0))
        );
        assert_eq!(
            Literal::Double(1e300).cast_to(&Type::Int),
            Some(Literal::Int(i32::MAX))
        );
    }

    /// Widening to floating types follows IEEE rounding.
    #[test]
    fn widening_to_float() {
        assert_eq!(
            Literal::Int(7).cast_to(&Type::Double),
            Some(Literal::Double(7.0))
        );
        assert_eq!(
            Literal::Long(1 << 40).cast_to(&Type::Float),
            Some(Literal::Float((1u64 << 40) as f32))
        );
    }

    /// Char participates as its unsigned 16-bit value.
    #[test]
    fn char_is_unsigned() {
        assert_eq!(
            Literal::Char(65535).cast_to(&Type::Int),
            Some(Literal::Int(65535))
        );
    }

    /// Non-numeric sources and reference targets never fold.
    #[test]
    fn unfoldable_cases() {
        assert_eq!(Literal::Str("x".into()).cast_to(&Type::Int), None);
        assert_eq!(Literal::Null.cast_to(&Type::Int), None);
        assert_eq!(Literal::Int(1).cast_to(&Type::object()), None);
    }
}
