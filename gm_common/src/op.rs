//! Operator boilerplate for single-field newtypes.

/// Implements the standard arithmetic traits for a newtype wrapping a numeric
/// field, forwarding to the inner value. The trait being implemented must be
/// in scope at the call site.
///
/// * `op!(binary T, Add, add)` — `T op T -> T`
/// * `op!(inplace T, AddAssign, add_assign)` — `T op= T`
/// * `op!(unary T, Neg, neg)` — `op T -> T`
#[macro_export]
macro_rules! op {
    (binary $t:ty, $trait:ident, $method:ident) => {
        impl $trait for $t {
            type Output = Self;

            fn $method(self, rhs: Self) -> Self::Output {
                Self(self.0.$method(rhs.0))
            }
        }
    };
    (inplace $t:ty, $trait:ident, $method:ident) => {
        impl $trait for $t {
            fn $method(&mut self, rhs: Self) {
                self.0.$method(rhs.0);
            }
        }
    };
    (unary $t:ty, $trait:ident, $method:ident) => {
        impl $trait for $t {
            type Output = Self;

            fn $method(self) -> Self::Output {
                Self(self.0.$method())
            }
        }
    };
}
