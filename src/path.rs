//! Polyline motion paths.
//!
//! A [`PathSpline`] is an ordered run of 3-D points with a derived arclength
//! cache, evaluated as a centripetal Catmull-Rom curve: the cubic through
//! four control points is parametrized by the fourth root of the squared
//! point spacing (`|Δp|^0.25`), which keeps motion smooth where points are
//! unevenly spaced. Motion-control code maps a normalized progress value to
//! a position; a denser polyline can be produced up front with
//! [`PathSpline::catmull_rom`] / [`PathSpline::catmull_rom_closed`].
//!
//! The polynomial coefficients for the last four control points queried are
//! cached on the instance and reused while consecutive queries stay inside
//! the same span. The cache never leaves the instance, so independent paths
//! can be evaluated from different threads.

use glam::Vec3;

use crate::errors::{Result, RimeError};

/// Knot spacings this small would zero the centripetal parametrization
/// (coincident control points); they are widened to a uniform step instead.
const MIN_KNOT_SPACING: f32 = 1e-4;

/// Cubic coefficients for one four-point span, all three axes at once.
#[derive(Debug, Clone, Copy, PartialEq)]
struct SpanCoefficients {
    c0: Vec3,
    c1: Vec3,
    c2: Vec3,
    c3: Vec3,
}

impl SpanCoefficients {
    /// Derives the centripetal Catmull-Rom coefficients for `p0..p3`.
    fn derive(p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3) -> Self {
        let knot = |a: Vec3, b: Vec3| -> f32 {
            let dt = a.distance_squared(b).powf(0.25);
            if dt < MIN_KNOT_SPACING { 1.0 } else { dt }
        };
        let dt0 = knot(p0, p1);
        let dt1 = knot(p1, p2);
        let dt2 = knot(p2, p3);

        let t1 = ((p1 - p0) / dt0 - (p2 - p0) / (dt0 + dt1) + (p2 - p1) / dt1) * dt1;
        let t2 = ((p2 - p1) / dt1 - (p3 - p1) / (dt1 + dt2) + (p3 - p2) / dt2) * dt1;

        Self {
            c0: p1,
            c1: t1,
            c2: -3.0 * p1 + 3.0 * p2 - 2.0 * t1 - t2,
            c3: 2.0 * p1 - 2.0 * p2 + t1 + t2,
        }
    }

    fn eval(&self, t: f32) -> Vec3 {
        self.c0 + self.c1 * t + self.c2 * (t * t) + self.c3 * (t * t * t)
    }
}

/// One-shot evaluation without touching any cache.
fn catmull_rom_point(p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3, t: f32) -> Vec3 {
    SpanCoefficients::derive(p0, p1, p2, p3).eval(t)
}

#[derive(Debug, Clone, Default)]
struct SpanCache {
    key: [Vec3; 4],
    coefficients: Option<SpanCoefficients>,
}

impl SpanCache {
    fn evaluate(&mut self, p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3, t: f32) -> Vec3 {
        let key = [p0, p1, p2, p3];
        let coefficients = match self.coefficients {
            Some(c) if self.key == key => c,
            _ => {
                let c = SpanCoefficients::derive(p0, p1, p2, p3);
                self.key = key;
                self.coefficients = Some(c);
                c
            }
        };
        coefficients.eval(t)
    }

    fn invalidate(&mut self) {
        self.coefficients = None;
    }
}

/// An ordered polyline evaluated as a centripetal Catmull-Rom spline.
#[derive(Debug, Clone, Default)]
pub struct PathSpline {
    points: Vec<Vec3>,
    /// Total arclength; `None` until [`update_distance`](Self::update_distance)
    /// has run since the last structural edit.
    full_length: Option<f32>,
    segment_lengths: Vec<f32>,
    cache: SpanCache,
}

impl PathSpline {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_points(points: Vec<Vec3>) -> Self {
        Self {
            points,
            ..Self::default()
        }
    }

    // ------------------------------------------------------------------
    // Structural mutators — each invalidates the derived caches.
    // ------------------------------------------------------------------

    pub fn push(&mut self, point: Vec3) {
        self.points.push(point);
        self.invalidate();
    }

    pub fn remove_at(&mut self, index: usize) -> Result<Vec3> {
        if index >= self.points.len() {
            return Err(RimeError::OutOfRange {
                context: "path point removal".into(),
                index,
            });
        }
        let point = self.points.remove(index);
        self.invalidate();
        Ok(point)
    }

    pub fn reverse(&mut self) {
        self.points.reverse();
        self.invalidate();
    }

    pub fn clear(&mut self) {
        self.points.clear();
        self.invalidate();
    }

    fn invalidate(&mut self) {
        self.full_length = None;
        self.segment_lengths.clear();
        self.cache.invalidate();
    }

    // ------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[must_use]
    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    /// Number of straight segments between consecutive points.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        if self.points.len() < 2 {
            0
        } else {
            self.points.len() - 1
        }
    }

    // ------------------------------------------------------------------
    // Arclength caches
    // ------------------------------------------------------------------

    /// Recomputes the per-segment lengths and the total arclength as the
    /// sum of consecutive-point Euclidean distances.
    pub fn update_distance(&mut self) -> f32 {
        self.segment_lengths.clear();
        let mut total = 0.0;
        for pair in self.points.windows(2) {
            let length = pair[0].distance(pair[1]);
            self.segment_lengths.push(length);
            total += length;
        }
        self.full_length = Some(total);
        total
    }

    /// Total arclength, rebuilt lazily after a structural edit.
    pub fn full_length(&mut self) -> f32 {
        match self.full_length {
            Some(length) => length,
            None => self.update_distance(),
        }
    }

    /// Per-segment lengths, rebuilt lazily after a structural edit.
    pub fn segment_lengths(&mut self) -> &[f32] {
        if self.full_length.is_none() {
            self.update_distance();
        }
        &self.segment_lengths
    }

    // ------------------------------------------------------------------
    // Curve evaluation
    // ------------------------------------------------------------------

    /// Evaluates the open curve over the whole polyline.
    ///
    /// `progress` outside `[0, 1)` wraps (paths are looped by their
    /// motion-control consumers); `evaluate(0.0)` returns the first control
    /// point. Boundary spans borrow a mirrored extension point
    /// (`2·p₀ − p₁`) instead of duplicating the end point, which keeps the
    /// start of the curve from curling.
    pub fn evaluate(&mut self, progress: f32) -> Result<Vec3> {
        let segments = self.segment_count();
        self.evaluate_range(progress, 0, segments)
    }

    /// Evaluates the open curve across segments `start..end` (`end` is an
    /// exclusive segment index, at most [`segment_count`](Self::segment_count)).
    pub fn evaluate_range(&mut self, progress: f32, start: usize, end: usize) -> Result<Vec3> {
        if self.points.len() < 2 {
            return Err(RimeError::InsufficientPoints {
                count: self.points.len(),
            });
        }
        if start >= end || end > self.segment_count() {
            return Err(RimeError::OutOfRange {
                context: "path segment range".into(),
                index: end,
            });
        }
        // Length caches are part of the motion contract; rebuild lazily on
        // the first query after an edit.
        if self.full_length.is_none() {
            self.update_distance();
        }

        let span = (end - start) as f32;
        let t = span * wrap_progress(progress) + start as f32;
        let ti = (t as usize).min(end - 1);
        let tw = t - ti as f32;

        let last = self.points.len() - 1;
        let p1 = self.points[ti];
        let p2 = self.points[ti + 1];
        let p0 = if ti == 0 {
            2.0 * self.points[0] - self.points[1]
        } else {
            self.points[ti - 1]
        };
        let p3 = if ti + 2 > last {
            2.0 * self.points[last] - self.points[last - 1]
        } else {
            self.points[ti + 2]
        };

        Ok(self.cache.evaluate(p0, p1, p2, p3, tw))
    }

    /// Evaluates the closed curve: control points wrap around the polyline
    /// and progress `1.0` meets progress `0.0` at the first point.
    pub fn evaluate_closed(&mut self, progress: f32) -> Result<Vec3> {
        let count = self.points.len();
        if count < 2 {
            return Err(RimeError::InsufficientPoints { count });
        }
        if self.full_length.is_none() {
            self.update_distance();
        }

        let t = count as f32 * wrap_progress(progress);
        let ti = (t as usize).min(count - 1);
        let tw = t - ti as f32;

        let at = |i: usize| self.points[i % count];
        let p0 = at(ti + count - 1);
        let p1 = at(ti);
        let p2 = at(ti + 1);
        let p3 = at(ti + 2);

        Ok(self.cache.evaluate(p0, p1, p2, p3, tw))
    }

    // ------------------------------------------------------------------
    // Resampling
    // ------------------------------------------------------------------

    /// Produces a denser polyline by evaluating the open curve `steps`
    /// times per segment. The first and last control points are mirrored
    /// outward to avoid end-curl. Fewer than two points (or zero steps)
    /// return the polyline unchanged.
    #[must_use]
    pub fn catmull_rom(&self, steps: u32) -> PathSpline {
        self.resample(steps, false)
    }

    /// Closed variant: the support points wrap instead of being mirrored,
    /// and the result loops back to the first point.
    #[must_use]
    pub fn catmull_rom_closed(&self, steps: u32) -> PathSpline {
        self.resample(steps, true)
    }

    fn resample(&self, steps: u32, closed: bool) -> PathSpline {
        if self.points.len() < 2 || steps == 0 {
            return PathSpline::from_points(self.points.clone());
        }

        let count = self.points.len();
        let mut support = Vec::with_capacity(count + 3);
        if closed {
            support.push(self.points[count - 1]);
        } else {
            support.push(2.0 * self.points[0] - self.points[1]);
        }
        support.extend_from_slice(&self.points);
        if closed {
            support.push(self.points[0]);
            support.push(self.points[1]);
        } else {
            support.push(2.0 * self.points[count - 1] - self.points[count - 2]);
        }

        let mut resampled = Vec::with_capacity((support.len() - 3) * steps as usize + 1);
        for i in 1..support.len() - 2 {
            let is_last = i + 1 == support.len() - 2;
            let end = steps + u32::from(is_last);
            for t in 0..end {
                resampled.push(catmull_rom_point(
                    support[i - 1],
                    support[i],
                    support[i + 1],
                    support[i + 2],
                    t as f32 / steps as f32,
                ));
            }
        }

        PathSpline::from_points(resampled)
    }
}

/// Wraps progress into `[0, 1)`.
fn wrap_progress(progress: f32) -> f32 {
    let wrapped = progress - progress.floor();
    if wrapped.is_finite() { wrapped } else { 0.0 }
}
