use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

/// Final grade level. 1 is the best passing grade, 5 is a fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Grade {
    VeryGood,
    Good,
    Satisfactory,
    Sufficient,
    Insufficient,
}

impl Grade {
    pub const fn value(self) -> u8 {
        match self {
            Self::VeryGood => 1,
            Self::Good => 2,
            Self::Satisfactory => 3,
            Self::Sufficient => 4,
            Self::Insufficient => 5,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::VeryGood => "Very Good",
            Self::Good => "Good",
            Self::Satisfactory => "Satisfactory",
            Self::Sufficient => "Sufficient",
            Self::Insufficient => "Insufficient",
        }
    }

    pub const fn is_fail(self) -> bool {
        matches!(self, Self::Insufficient)
    }
}

/// One scale band: the minimum (rounded) ratio required for a grade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradeBand {
    pub grade: Grade,
    pub minimum: Decimal,
}

/// Ordered percentage thresholds mapping an achieved/maximum ratio to a
/// grade, with grade 5 as the implicit catch-all.
///
/// The ratio is rounded half-up to two decimal places before comparison so
/// that students sitting exactly on a cutoff are never pushed below it by
/// binary floating-point representation (0.745 counts as 0.75).
#[derive(Debug, Clone, PartialEq)]
pub struct GradeScale {
    bands: Vec<GradeBand>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScaleError {
    #[error("maximum points must be strictly positive (got {0})")]
    NonPositiveMaximum(f64),
    #[error("achieved points must be a finite number (got {0})")]
    NonFinitePoints(f64),
    #[error("scale thresholds must strictly decrease from grade 1 to grade 4")]
    UnorderedThresholds,
}

impl GradeScale {
    /// Builds a scale from bands ordered grade 1 downward; thresholds must
    /// strictly decrease.
    pub fn new(bands: Vec<GradeBand>) -> Result<Self, ScaleError> {
        for pair in bands.windows(2) {
            if pair[1].minimum >= pair[0].minimum || pair[1].grade <= pair[0].grade {
                return Err(ScaleError::UnorderedThresholds);
            }
        }
        Ok(Self { bands })
    }

    pub fn bands(&self) -> &[GradeBand] {
        &self.bands
    }

    /// Maps achieved points against a maximum to a grade. Achieved points
    /// above the maximum (bonus) saturate at grade 1.
    pub fn grade(&self, achieved: f64, maximum: f64) -> Result<Grade, ScaleError> {
        if maximum <= 0.0 {
            return Err(ScaleError::NonPositiveMaximum(maximum));
        }
        if !achieved.is_finite() {
            return Err(ScaleError::NonFinitePoints(achieved));
        }

        let ratio = rounded_ratio(achieved, maximum)?;
        for band in &self.bands {
            if ratio >= band.minimum {
                return Ok(band.grade);
            }
        }
        Ok(Grade::Insufficient)
    }
}

impl Default for GradeScale {
    /// The department-wide default: 87.5% / 75% / 62.5% / 50%.
    fn default() -> Self {
        Self {
            bands: vec![
                GradeBand {
                    grade: Grade::VeryGood,
                    minimum: Decimal::new(875, 3),
                },
                GradeBand {
                    grade: Grade::Good,
                    minimum: Decimal::new(75, 2),
                },
                GradeBand {
                    grade: Grade::Satisfactory,
                    minimum: Decimal::new(625, 3),
                },
                GradeBand {
                    grade: Grade::Sufficient,
                    minimum: Decimal::new(50, 2),
                },
            ],
        }
    }
}

fn rounded_ratio(achieved: f64, maximum: f64) -> Result<Decimal, ScaleError> {
    let achieved =
        Decimal::from_f64(achieved).ok_or(ScaleError::NonFinitePoints(achieved))?;
    let maximum = Decimal::from_f64(maximum).ok_or(ScaleError::NonPositiveMaximum(0.0))?;
    Ok((achieved / maximum).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}
