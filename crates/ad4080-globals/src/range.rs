use std::fmt::Write;

/// One segment of a numeric range.
#[derive(Debug, Clone, PartialEq)]
pub enum RangeItem {
    /// min, max (both inclusive), step and the unit scale of one step.
    Step(f64, f64, f64, f64),
    /// A single permitted value.
    Value(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Range {
    pub items: Vec<RangeItem>,
}

impl Range {
    pub fn step(min: f64, max: f64, step: f64, scale: f64) -> Self {
        Self {
            items: vec![RangeItem::Step(min, max, step, scale)],
        }
    }

    pub fn values(values: &[f64]) -> Self {
        Self {
            items: values.iter().map(|v| RangeItem::Value(*v)).collect(),
        }
    }

    pub fn min(&self) -> Option<f64> {
        self.items
            .iter()
            .map(|item| match item {
                RangeItem::Step(min, _, _, scale) => min * scale,
                RangeItem::Value(v) => *v,
            })
            .reduce(f64::min)
    }

    pub fn max(&self) -> Option<f64> {
        self.items
            .iter()
            .map(|item| match item {
                RangeItem::Step(_, max, _, scale) => max * scale,
                RangeItem::Value(v) => *v,
            })
            .reduce(f64::max)
    }

    /// Saturates `value` to the outer bounds of the range.
    pub fn clamp(&self, value: f64) -> f64 {
        match (self.min(), self.max()) {
            (Some(min), Some(max)) => value.clamp(min, max),
            _ => value,
        }
    }

    /// IIO `_available` rendering: `[min step max]` for stepped segments,
    /// space separated values otherwise.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        for (i, item) in self.items.iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            let _ = match item {
                RangeItem::Step(min, max, step, scale) => write!(
                    out,
                    "[{} {} {}]",
                    min * scale,
                    step * scale,
                    max * scale
                ),
                RangeItem::Value(v) => write!(out, "{v}"),
            };
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_saturates_at_both_ends() {
        let range = Range::step(-2048.0, 2047.0, 1.0, 2.0);
        assert_eq!(range.clamp(1e9), 4094.0);
        assert_eq!(range.clamp(-1e9), -4096.0);
        assert_eq!(range.clamp(10.0), 10.0);
    }

    #[test]
    fn describe_stepped_and_discrete() {
        assert_eq!(Range::step(1.0, 16384.0, 1.0, 1.0).describe(), "[1 1 16384]");
        assert_eq!(Range::values(&[40000000.0]).describe(), "40000000");
    }
}
