//! Model parameters
//!
//! [`ModelParameters`] is an immutable value holding the initial populations,
//! the birth rate, the four transition rates and the sampling [`TimeSpan`].
//!
//! Rates are supplied as **percent per day** and stored as fractions: the
//! division by 100 happens once, in [`ParametersBuilder::build`], and nowhere
//! else. Any real rate is accepted, including zero and negative values.
//!
//! # Example
//!
//! ```rust
//! use zombie_rs::models::ModelParameters;
//!
//! let params = ModelParameters::builder()
//!     .initial_living(1000.0)
//!     .transmission_percent(5.0)
//!     .build();
//!
//! assert_eq!(params.transmission_rate(), 0.05);
//! assert_eq!(params.time_span().len(), 1000);
//! ```

use crate::error::ValidationError;

// =================================================================================================
// Defaults
// =================================================================================================

pub const DEFAULT_INITIAL_LIVING: f64 = 500.0;
pub const DEFAULT_INITIAL_INFECTED: f64 = 0.0;
pub const DEFAULT_INITIAL_DEAD: f64 = 0.0;
/// Births per day
pub const DEFAULT_BIRTH_RATE: f64 = 0.0;
/// Percent per day
pub const DEFAULT_NATURAL_DEATH_PERCENT: f64 = 1.0;
/// Percent per day
pub const DEFAULT_TRANSMISSION_PERCENT: f64 = 95.0;
/// Percent per day
pub const DEFAULT_RESURRECTION_PERCENT: f64 = 1.0;
/// Percent per day
pub const DEFAULT_DESTRUCTION_PERCENT: f64 = 1.0;

pub const DEFAULT_TIME_START: f64 = 0.0;
/// Days from outbreak
pub const DEFAULT_TIME_END: f64 = 5.0;
pub const DEFAULT_TIME_SAMPLES: usize = 1000;
/// Upper bound on generated sample counts
pub const MAX_TIME_SAMPLES: usize = 1_000_000;

// =================================================================================================
// Time Span
// =================================================================================================

/// Strictly increasing sample times (at least two)
///
/// Owned by value: every default is built fresh, so two parameter sets never
/// alias the same buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSpan {
    points: Vec<f64>,
}

impl TimeSpan {
    /// Validate and wrap explicit sample times
    pub fn new(points: Vec<f64>) -> Result<Self, ValidationError> {
        if points.len() < 2 {
            return Err(ValidationError::InvalidTimeSpan(format!(
                "need at least 2 sample points, got {}",
                points.len()
            )));
        }
        if let Some(i) = points.iter().position(|t| !t.is_finite()) {
            return Err(ValidationError::InvalidTimeSpan(format!(
                "sample {i} is not finite: {}",
                points[i]
            )));
        }
        if let Some(i) = points.windows(2).position(|w| w[1] <= w[0]) {
            return Err(ValidationError::InvalidTimeSpan(format!(
                "samples must be strictly increasing, got {} then {} at index {}",
                points[i],
                points[i + 1],
                i + 1
            )));
        }
        Ok(Self { points })
    }

    /// `samples` evenly spaced points over `[start, end]`, both ends included
    ///
    /// The last point is exactly `end`. At most [`MAX_TIME_SAMPLES`] points.
    pub fn linspace(start: f64, end: f64, samples: usize) -> Result<Self, ValidationError> {
        if samples < 2 {
            return Err(ValidationError::InvalidTimeSpan(format!(
                "need at least 2 sample points, got {samples}"
            )));
        }
        if samples > MAX_TIME_SAMPLES {
            return Err(ValidationError::InvalidTimeSpan(format!(
                "at most {MAX_TIME_SAMPLES} sample points, got {samples}"
            )));
        }
        Self::new(evenly_spaced(start, end, samples))
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false: a time span holds at least two points
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn start(&self) -> f64 {
        self.points[0]
    }

    pub fn end(&self) -> f64 {
        self.points[self.points.len() - 1]
    }

    pub fn iter(&self) -> impl Iterator<Item = &f64> {
        self.points.iter()
    }

}

impl Default for TimeSpan {
    fn default() -> Self {
        Self {
            points: evenly_spaced(DEFAULT_TIME_START, DEFAULT_TIME_END, DEFAULT_TIME_SAMPLES),
        }
    }
}

/// `samples ≥ 2` points from `start` to exactly `end`
fn evenly_spaced(start: f64, end: f64, samples: usize) -> Vec<f64> {
    let step = (end - start) / (samples - 1) as f64;
    let mut points: Vec<f64> = (0..samples).map(|i| start + i as f64 * step).collect();
    points[samples - 1] = end;
    points
}

// =================================================================================================
// Rates
// =================================================================================================

/// Transition rates as fractions per day
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rates {
    /// δ: living → dead
    pub natural_death: f64,
    /// β: living → zombie on contact
    pub transmission: f64,
    /// ζ: dead → zombie
    pub resurrection: f64,
    /// α: zombie destroyed on contact
    pub destruction: f64,
}

// =================================================================================================
// Model Parameters
// =================================================================================================

/// Immutable configuration of one simulation run
#[derive(Debug, Clone, PartialEq)]
pub struct ModelParameters {
    time_span: TimeSpan,
    initial_living: f64,
    initial_infected: f64,
    initial_dead: f64,
    birth_rate: f64,
    rates: Rates,
}

impl ModelParameters {
    /// Builder seeded with the defaults
    pub fn builder() -> ParametersBuilder {
        ParametersBuilder::default()
    }

    /// Defaults merged with string key/value overrides
    ///
    /// String-typed front end for form or command-line input. Recognised keys:
    ///
    /// | key | meaning |
    /// |-----|---------|
    /// | `initial_population` | initial living |
    /// | `initial_zombie_population` | initial zombies |
    /// | `initial_death_population` | initial dead |
    /// | `birth_rate` | births per day |
    /// | `natural_death_percent` | % per day |
    /// | `transmission_percent` | % per day |
    /// | `resurrect_percent` | % per day |
    /// | `destroy_percent` | % per day |
    /// | `days` | end of the time span |
    /// | `samples` | number of sample points |
    ///
    /// Missing keys keep their defaults. Later duplicates win.
    ///
    /// # Errors
    ///
    /// [`ValidationError::UnknownField`] for an unrecognised key,
    /// [`ValidationError::NotANumber`] for a value that does not parse to a
    /// finite number, [`ValidationError::InvalidTimeSpan`] if `days`/`samples`
    /// describe an unusable span.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut builder = Self::builder();
        let mut days = DEFAULT_TIME_END;
        let mut samples = DEFAULT_TIME_SAMPLES;
        let mut custom_span = false;

        for (key, value) in pairs {
            let key = key.as_ref().trim();
            let value = value.as_ref().trim();

            match key {
                "initial_population" => builder = builder.initial_living(parse_number(key, value)?),
                "initial_zombie_population" => {
                    builder = builder.initial_infected(parse_number(key, value)?)
                }
                "initial_death_population" => {
                    builder = builder.initial_dead(parse_number(key, value)?)
                }
                "birth_rate" => builder = builder.birth_rate(parse_number(key, value)?),
                "natural_death_percent" => {
                    builder = builder.natural_death_percent(parse_number(key, value)?)
                }
                "transmission_percent" => {
                    builder = builder.transmission_percent(parse_number(key, value)?)
                }
                "resurrect_percent" => {
                    builder = builder.resurrection_percent(parse_number(key, value)?)
                }
                "destroy_percent" => {
                    builder = builder.destruction_percent(parse_number(key, value)?)
                }
                "days" => {
                    days = parse_number(key, value)?;
                    custom_span = true;
                }
                "samples" => {
                    samples = value.parse::<usize>().map_err(|_| ValidationError::NotANumber {
                        field: key.to_string(),
                        value: value.to_string(),
                    })?;
                    custom_span = true;
                }
                other => return Err(ValidationError::UnknownField(other.to_string())),
            }
        }

        if custom_span {
            builder = builder.time_span(TimeSpan::linspace(DEFAULT_TIME_START, days, samples)?);
        }

        Ok(builder.build())
    }

    pub fn time_span(&self) -> &TimeSpan {
        &self.time_span
    }

    pub fn initial_living(&self) -> f64 {
        self.initial_living
    }

    pub fn initial_infected(&self) -> f64 {
        self.initial_infected
    }

    pub fn initial_dead(&self) -> f64 {
        self.initial_dead
    }

    pub fn birth_rate(&self) -> f64 {
        self.birth_rate
    }

    /// All four transition rates (fractions)
    pub fn rates(&self) -> Rates {
        self.rates
    }

    pub fn natural_death_rate(&self) -> f64 {
        self.rates.natural_death
    }

    pub fn transmission_rate(&self) -> f64 {
        self.rates.transmission
    }

    pub fn resurrection_rate(&self) -> f64 {
        self.rates.resurrection
    }

    pub fn destruction_rate(&self) -> f64 {
        self.rates.destruction
    }

    /// Human-readable two-line description of every input
    ///
    /// Rates are shown back in percent. Numbers use the shortest
    /// round-trip representation, so `500` prints as `500.0`, and very
    /// small or large values use a signed two-digit exponent (`1e-05`,
    /// `1e+16`).
    pub fn summary_label(&self) -> String {
        format!(
            "init po: {}, init zombie: {}, init death: {}, {} daily birth\n\
             death pct. {}%, trans pct. {}%, resur pct. {}%, destroy pct. {}%.",
            label_number(self.initial_living),
            label_number(self.initial_infected),
            label_number(self.initial_dead),
            label_number(self.birth_rate),
            label_number(self.rates.natural_death * 100.0),
            label_number(self.rates.transmission * 100.0),
            label_number(self.rates.resurrection * 100.0),
            label_number(self.rates.destruction * 100.0),
        )
    }
}

impl Default for ModelParameters {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Shortest round-trip form, exponent written as `e-05` / `e+16`
fn label_number(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }

    let shortest = format!("{value:?}");
    match shortest.split_once('e') {
        Some((mantissa, exponent)) => match exponent.parse::<i32>() {
            Ok(exponent) => {
                let sign = if exponent < 0 { '-' } else { '+' };
                format!("{mantissa}e{sign}{:02}", exponent.abs())
            }
            Err(_) => shortest,
        },
        None => shortest,
    }
}

fn parse_number(field: &str, value: &str) -> Result<f64, ValidationError> {
    match value.parse::<f64>() {
        Ok(number) if number.is_finite() => Ok(number),
        _ => Err(ValidationError::NotANumber {
            field: field.to_string(),
            value: value.to_string(),
        }),
    }
}

// =================================================================================================
// Builder
// =================================================================================================

/// Collects raw inputs (rates in percent) before freezing them
#[derive(Debug, Clone)]
pub struct ParametersBuilder {
    time_span: Option<TimeSpan>,
    initial_living: f64,
    initial_infected: f64,
    initial_dead: f64,
    birth_rate: f64,
    natural_death_percent: f64,
    transmission_percent: f64,
    resurrection_percent: f64,
    destruction_percent: f64,
}

impl Default for ParametersBuilder {
    fn default() -> Self {
        Self {
            time_span: None,
            initial_living: DEFAULT_INITIAL_LIVING,
            initial_infected: DEFAULT_INITIAL_INFECTED,
            initial_dead: DEFAULT_INITIAL_DEAD,
            birth_rate: DEFAULT_BIRTH_RATE,
            natural_death_percent: DEFAULT_NATURAL_DEATH_PERCENT,
            transmission_percent: DEFAULT_TRANSMISSION_PERCENT,
            resurrection_percent: DEFAULT_RESURRECTION_PERCENT,
            destruction_percent: DEFAULT_DESTRUCTION_PERCENT,
        }
    }
}

impl ParametersBuilder {
    pub fn time_span(mut self, time_span: TimeSpan) -> Self {
        self.time_span = Some(time_span);
        self
    }

    pub fn initial_living(mut self, value: f64) -> Self {
        self.initial_living = value;
        self
    }

    pub fn initial_infected(mut self, value: f64) -> Self {
        self.initial_infected = value;
        self
    }

    pub fn initial_dead(mut self, value: f64) -> Self {
        self.initial_dead = value;
        self
    }

    /// Births per day (absolute, not a percentage)
    pub fn birth_rate(mut self, value: f64) -> Self {
        self.birth_rate = value;
        self
    }

    pub fn natural_death_percent(mut self, percent: f64) -> Self {
        self.natural_death_percent = percent;
        self
    }

    pub fn transmission_percent(mut self, percent: f64) -> Self {
        self.transmission_percent = percent;
        self
    }

    pub fn resurrection_percent(mut self, percent: f64) -> Self {
        self.resurrection_percent = percent;
        self
    }

    pub fn destruction_percent(mut self, percent: f64) -> Self {
        self.destruction_percent = percent;
        self
    }

    /// Freeze the inputs, converting percentages to fractions
    pub fn build(self) -> ModelParameters {
        ModelParameters {
            time_span: self.time_span.unwrap_or_default(),
            initial_living: self.initial_living,
            initial_infected: self.initial_infected,
            initial_dead: self.initial_dead,
            birth_rate: self.birth_rate,
            rates: Rates {
                natural_death: self.natural_death_percent / 100.0,
                transmission: self.transmission_percent / 100.0,
                resurrection: self.resurrection_percent / 100.0,
                destruction: self.destruction_percent / 100.0,
            },
        }
    }
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = ModelParameters::default();

        assert_eq!(params.initial_living(), 500.0);
        assert_eq!(params.initial_infected(), 0.0);
        assert_eq!(params.initial_dead(), 0.0);
        assert_eq!(params.birth_rate(), 0.0);
        assert_eq!(params.natural_death_rate(), 0.01);
        assert_eq!(params.transmission_rate(), 0.95);
        assert_eq!(params.resurrection_rate(), 0.01);
        assert_eq!(params.destruction_rate(), 0.01);

        let span = params.time_span();
        assert_eq!(span.len(), 1000);
        assert_eq!(span.start(), 0.0);
        assert_eq!(span.end(), 5.0);
    }

    #[test]
    fn test_default_time_span_is_evenly_spaced() {
        let span = TimeSpan::default();
        let step = 5.0 / 999.0;

        for (i, t) in span.iter().enumerate() {
            assert!((t - i as f64 * step).abs() < 1e-12);
        }
        assert_eq!(span, TimeSpan::linspace(0.0, 5.0, 1000).unwrap());
    }

    #[test]
    fn test_defaults_are_independent_values() {
        let a = ModelParameters::default();
        let b = ModelParameters::default();

        assert_eq!(a, b);
        assert_ne!(a.time_span().as_slice().as_ptr(), b.time_span().as_slice().as_ptr());
    }

    #[test]
    fn test_percent_converted_once() {
        let params = ModelParameters::builder()
            .natural_death_percent(5.0)
            .transmission_percent(50.0)
            .resurrection_percent(0.5)
            .destruction_percent(200.0)
            .build();

        assert_eq!(params.natural_death_rate(), 0.05);
        assert_eq!(params.transmission_rate(), 0.5);
        assert_eq!(params.resurrection_rate(), 0.005);
        assert_eq!(params.destruction_rate(), 2.0);
    }

    #[test]
    fn test_negative_and_zero_rates_accepted() {
        let params = ModelParameters::builder()
            .birth_rate(-3.0)
            .transmission_percent(0.0)
            .destruction_percent(-10.0)
            .build();

        assert_eq!(params.birth_rate(), -3.0);
        assert_eq!(params.transmission_rate(), 0.0);
        assert_eq!(params.destruction_rate(), -0.1);
    }

    #[test]
    fn test_time_span_validation() {
        assert!(TimeSpan::new(vec![0.0, 1.0]).is_ok());
        assert!(matches!(
            TimeSpan::new(vec![0.0]),
            Err(ValidationError::InvalidTimeSpan(_))
        ));
        assert!(TimeSpan::new(vec![0.0, 1.0, 1.0]).is_err());
        assert!(TimeSpan::new(vec![0.0, 2.0, 1.0]).is_err());
        assert!(TimeSpan::new(vec![0.0, f64::NAN]).is_err());
        assert!(TimeSpan::linspace(0.0, 1.0, 1).is_err());
        assert!(TimeSpan::linspace(1.0, 0.0, 10).is_err());
        assert!(TimeSpan::linspace(0.0, 1.0, MAX_TIME_SAMPLES).is_ok());
        assert!(matches!(
            TimeSpan::linspace(0.0, 1.0, MAX_TIME_SAMPLES + 1),
            Err(ValidationError::InvalidTimeSpan(_))
        ));
    }

    #[test]
    fn test_summary_label_defaults() {
        let label = ModelParameters::default().summary_label();

        assert_eq!(
            label,
            "init po: 500.0, init zombie: 0.0, init death: 0.0, 0.0 daily birth\n\
             death pct. 1.0%, trans pct. 95.0%, resur pct. 1.0%, destroy pct. 1.0%."
        );
    }

    #[test]
    fn test_label_number_formats() {
        assert_eq!(label_number(500.0), "500.0");
        assert_eq!(label_number(0.95), "0.95");
        assert_eq!(label_number(-3.0), "-3.0");
        assert_eq!(label_number(1e-5), "1e-05");
        assert_eq!(label_number(1.5e-7), "1.5e-07");
        assert_eq!(label_number(1e16), "1e+16");
        assert_eq!(label_number(2.5e123), "2.5e+123");
        assert_eq!(label_number(f64::INFINITY), "inf");
        assert_eq!(label_number(f64::NAN), "nan");
    }

    #[test]
    fn test_summary_label_exponents() {
        let label = ModelParameters::builder()
            .initial_infected(1e-5)
            .birth_rate(1e16)
            .build()
            .summary_label();

        assert!(label.contains("init zombie: 1e-05,"), "{label}");
        assert!(label.contains(", 1e+16 daily birth"), "{label}");
    }

    #[test]
    fn test_summary_label_is_pure() {
        let params = ModelParameters::builder().initial_infected(3.0).birth_rate(2.5).build();
        assert_eq!(params.summary_label(), params.summary_label());
        assert!(params.summary_label().contains("init zombie: 3.0"));
        assert!(params.summary_label().contains("2.5 daily birth"));
    }

    #[test]
    fn test_from_pairs_overrides() {
        let params = ModelParameters::from_pairs([
            ("initial_population", "1000"),
            ("transmission_percent", " 5 "),
            ("days", "10"),
            ("samples", "11"),
        ])
        .unwrap();

        assert_eq!(params.initial_living(), 1000.0);
        assert_eq!(params.transmission_rate(), 0.05);
        assert_eq!(params.natural_death_rate(), 0.01);
        assert_eq!(params.time_span().len(), 11);
        assert_eq!(params.time_span().end(), 10.0);
    }

    #[test]
    fn test_from_pairs_empty_is_default() {
        let params = ModelParameters::from_pairs(Vec::<(String, String)>::new()).unwrap();
        assert_eq!(params, ModelParameters::default());
    }

    #[test]
    fn test_from_pairs_rejects_bad_input() {
        assert_eq!(
            ModelParameters::from_pairs([("birth_rate", "lots")]),
            Err(ValidationError::NotANumber {
                field: "birth_rate".to_string(),
                value: "lots".to_string()
            })
        );
        assert!(matches!(
            ModelParameters::from_pairs([("birth_rate", "inf")]),
            Err(ValidationError::NotANumber { .. })
        ));
        assert_eq!(
            ModelParameters::from_pairs([("zombie_speed", "3")]),
            Err(ValidationError::UnknownField("zombie_speed".to_string()))
        );
        assert!(matches!(
            ModelParameters::from_pairs([("samples", "1")]),
            Err(ValidationError::InvalidTimeSpan(_))
        ));
        assert!(matches!(
            ModelParameters::from_pairs([("samples", "100000000000")]),
            Err(ValidationError::InvalidTimeSpan(_))
        ));
    }
}
