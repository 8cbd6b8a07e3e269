//! The fixed `math.*` function table.

use std::fmt;

use crate::context::Context;

/// Upper bound on the number of draws a single `die_roll` call performs.
pub const MAX_DIE_ROLLS: u32 = 4096;

/// Built-in Molang math functions.
///
/// Trigonometric inputs are in degrees, matching Bedrock content, while
/// [`MathFunction::Atan2`] returns radians.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MathFunction {
    Random,
    RandomInteger,
    DieRoll,
    DieRollInteger,
    Sin,
    Cos,
    Atan2,
    Abs,
    Clamp,
    Lerp,
    HermiteBlend,
    Floor,
    Ceil,
    Round,
    Trunc,
    Mod,
    Pow,
    Sqrt,
    Exp,
    Ln,
    Min,
    Max,
}

impl MathFunction {
    /// Every function, in the order they are documented.
    pub const ALL: [Self; 22] = [
        Self::Random,
        Self::RandomInteger,
        Self::DieRoll,
        Self::DieRollInteger,
        Self::Sin,
        Self::Cos,
        Self::Atan2,
        Self::Abs,
        Self::Clamp,
        Self::Lerp,
        Self::HermiteBlend,
        Self::Floor,
        Self::Ceil,
        Self::Round,
        Self::Trunc,
        Self::Mod,
        Self::Pow,
        Self::Sqrt,
        Self::Exp,
        Self::Ln,
        Self::Min,
        Self::Max,
    ];

    /// Looks up a function by its fully qualified name, ignoring case.
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        Self::ALL.into_iter().find(|f| f.name() == lower)
    }

    /// Fully qualified lowercase name, e.g. `math.die_roll`.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Random => "math.random",
            Self::RandomInteger => "math.random_integer",
            Self::DieRoll => "math.die_roll",
            Self::DieRollInteger => "math.die_roll_integer",
            Self::Sin => "math.sin",
            Self::Cos => "math.cos",
            Self::Atan2 => "math.atan2",
            Self::Abs => "math.abs",
            Self::Clamp => "math.clamp",
            Self::Lerp => "math.lerp",
            Self::HermiteBlend => "math.hermite_blend",
            Self::Floor => "math.floor",
            Self::Ceil => "math.ceil",
            Self::Round => "math.round",
            Self::Trunc => "math.trunc",
            Self::Mod => "math.mod",
            Self::Pow => "math.pow",
            Self::Sqrt => "math.sqrt",
            Self::Exp => "math.exp",
            Self::Ln => "math.ln",
            Self::Min => "math.min",
            Self::Max => "math.max",
        }
    }

    /// Number of arguments the function takes.
    pub const fn arity(self) -> usize {
        match self {
            Self::Sin
            | Self::Cos
            | Self::Abs
            | Self::HermiteBlend
            | Self::Floor
            | Self::Ceil
            | Self::Round
            | Self::Trunc
            | Self::Sqrt
            | Self::Exp
            | Self::Ln => 1,
            Self::Random
            | Self::RandomInteger
            | Self::Atan2
            | Self::Mod
            | Self::Pow
            | Self::Min
            | Self::Max => 2,
            Self::DieRoll | Self::DieRollInteger | Self::Clamp | Self::Lerp => 3,
        }
    }

    /// Applies the function to already evaluated arguments.
    ///
    /// `args` must hold exactly [`arity`](Self::arity) values; the parser
    /// guarantees this for every call node it builds.
    pub fn apply(self, args: &[f32], ctx: &mut Context) -> f32 {
        let arg = |i: usize| args.get(i).copied().unwrap_or(0.0);
        match self {
            Self::Random => ctx.random_range(arg(0), arg(1)),
            Self::RandomInteger => ctx.random_integer(arg(0), arg(1)),
            Self::DieRoll => {
                let (lo, hi) = (arg(1), arg(2));
                (0..roll_count(arg(0))).fold(0.0, |acc, _| acc + ctx.random_range(lo, hi))
            }
            Self::DieRollInteger => {
                let (lo, hi) = (arg(1), arg(2));
                (0..roll_count(arg(0))).fold(0.0, |acc, _| acc + ctx.random_integer(lo, hi))
            }
            Self::Sin => arg(0).to_radians().sin(),
            Self::Cos => arg(0).to_radians().cos(),
            Self::Atan2 => arg(0).atan2(arg(1)),
            Self::Abs => arg(0).abs(),
            Self::Clamp => {
                let (value, lo, hi) = (arg(0), arg(1), arg(2));
                value.max(lo).min(hi)
            }
            Self::Lerp => {
                let (a, b, t) = (arg(0), arg(1), arg(2));
                a + (b - a) * t
            }
            Self::HermiteBlend => {
                let t = arg(0);
                t * t * 2.0f32.mul_add(-t, 3.0)
            }
            Self::Floor => arg(0).floor(),
            Self::Ceil => arg(0).ceil(),
            Self::Round => arg(0).round(),
            Self::Trunc => arg(0).trunc(),
            Self::Mod => {
                let divisor = arg(1);
                if divisor == 0.0 {
                    0.0
                } else {
                    arg(0) % divisor
                }
            }
            Self::Pow => arg(0).powf(arg(1)),
            Self::Sqrt => arg(0).sqrt(),
            Self::Exp => arg(0).exp(),
            Self::Ln => arg(0).ln(),
            Self::Min => arg(0).min(arg(1)),
            Self::Max => arg(0).max(arg(1)),
        }
    }
}

fn roll_count(n: f32) -> u32 {
    if n.is_nan() || n <= 0.0 {
        return 0;
    }
    (n as u32).min(MAX_DIE_ROLLS)
}

impl fmt::Display for MathFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
