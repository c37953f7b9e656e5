//! Text placement on chart axes.
//!
//! Locations use the familiar `"<vertical> <horizontal>"` strings
//! (`"lower right"`, `"upper left"`, `"center"`), resolved to fractions of
//! the plotting area.

use crate::error::{Error, Result};
use plotters::prelude::SeriesLabelPosition;
use plotters::style::text_anchor::{HPos, Pos, VPos};

const EDGE: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vertical {
    Lower,
    Center,
    Upper,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Horizontal {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextLocation {
    pub vertical: Vertical,
    pub horizontal: Horizontal,
}

impl TextLocation {
    pub const LOWER_RIGHT: Self = Self::new(Vertical::Lower, Horizontal::Right);
    pub const LOWER_LEFT: Self = Self::new(Vertical::Lower, Horizontal::Left);
    pub const UPPER_LEFT: Self = Self::new(Vertical::Upper, Horizontal::Left);

    pub const fn new(vertical: Vertical, horizontal: Horizontal) -> Self {
        Self {
            vertical,
            horizontal,
        }
    }

    /// Parses `"lower right"`, `"upper center"`, `"center"`, `"right"`, ...
    ///
    /// # Errors
    /// [`Error::Config`] for anything else.
    pub fn parse(s: &str) -> Result<Self> {
        let unknown = || Error::Config(format!("unknown location '{}'; choose e.g. 'lower right'", s));
        let words: Vec<&str> = s.split_whitespace().collect();
        let (v, h) = match words.as_slice() {
            [single] => ("center", *single),
            [v, h] => (*v, *h),
            _ => return Err(unknown()),
        };
        let vertical = match v {
            "lower" => Vertical::Lower,
            "center" => Vertical::Center,
            "upper" => Vertical::Upper,
            _ => return Err(unknown()),
        };
        let horizontal = match h {
            "left" => Horizontal::Left,
            "center" => Horizontal::Center,
            "right" => Horizontal::Right,
            _ => return Err(unknown()),
        };
        Ok(Self::new(vertical, horizontal))
    }

    /// Position as fractions `(x, y)` of the axes, measured from the lower
    /// left corner.
    pub fn fraction(&self) -> (f64, f64) {
        let x = match self.horizontal {
            Horizontal::Left => EDGE,
            Horizontal::Center => 0.5,
            Horizontal::Right => 1.0 - EDGE,
        };
        let y = match self.vertical {
            Vertical::Lower => EDGE,
            Vertical::Center => 0.5,
            Vertical::Upper => 1.0 - EDGE,
        };
        (x, y)
    }

    /// The location in data coordinates for the given axis ranges.
    pub fn data_point(&self, x_range: (f64, f64), y_range: (f64, f64)) -> (f64, f64) {
        let (fx, fy) = self.fraction();
        (
            x_range.0 + fx * (x_range.1 - x_range.0),
            y_range.0 + fy * (y_range.1 - y_range.0),
        )
    }

    /// Text anchor, so text grows away from the nearest edges.
    pub fn anchor(&self) -> Pos {
        let h = match self.horizontal {
            Horizontal::Left => HPos::Left,
            Horizontal::Center => HPos::Center,
            Horizontal::Right => HPos::Right,
        };
        let v = match self.vertical {
            Vertical::Lower => VPos::Bottom,
            Vertical::Center => VPos::Center,
            Vertical::Upper => VPos::Top,
        };
        Pos::new(h, v)
    }

    pub fn legend_position(&self) -> SeriesLabelPosition {
        use Horizontal as H;
        use Vertical as V;
        match (self.vertical, self.horizontal) {
            (V::Upper, H::Left) => SeriesLabelPosition::UpperLeft,
            (V::Upper, H::Center) => SeriesLabelPosition::UpperMiddle,
            (V::Upper, H::Right) => SeriesLabelPosition::UpperRight,
            (V::Center, H::Left) => SeriesLabelPosition::MiddleLeft,
            (V::Center, H::Center) => SeriesLabelPosition::MiddleMiddle,
            (V::Center, H::Right) => SeriesLabelPosition::MiddleRight,
            (V::Lower, H::Left) => SeriesLabelPosition::LowerLeft,
            (V::Lower, H::Center) => SeriesLabelPosition::LowerMiddle,
            (V::Lower, H::Right) => SeriesLabelPosition::LowerRight,
        }
    }
}

/// Text drawn on top of a chart.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoration {
    pub annotations: Vec<(TextLocation, String)>,
    pub legend: TextLocation,
}

impl Default for Decoration {
    fn default() -> Self {
        Self {
            annotations: Vec::new(),
            legend: TextLocation::UPPER_LEFT,
        }
    }
}

impl Decoration {
    /// Adds the `z=..., a=...` annotation.
    pub fn with_redshift(mut self, redshift: f64, scale_factor: f64, at: TextLocation) -> Self {
        self.annotations.push((at, redshift_text(redshift, scale_factor)));
        self
    }

    pub fn with_comment(mut self, comment: &str, at: TextLocation) -> Self {
        self.annotations.push((at, comment.to_string()));
        self
    }

    pub fn with_legend(mut self, at: TextLocation) -> Self {
        self.legend = at;
        self
    }
}

pub fn redshift_text(redshift: f64, scale_factor: f64) -> String {
    format!("z={:.3}, a={:.3}", redshift, scale_factor)
}
