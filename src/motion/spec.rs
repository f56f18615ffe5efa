use crate::foundation::core::Canvas;
use crate::foundation::error::{KenBurnsError, KenBurnsResult};

/// Start/end camera trajectory.
///
/// Scales are zoom factors (`>= 1.0`, the crop window is `1/scale` of the image). `x`/`y` are the
/// crop window center as a fraction of the image width/height in `[0, 1]`.
///
/// Deserialization fills missing fields from [`MotionSpec::default`], so a partial `motion`
/// object such as `{"end_scale": 1.5}` is accepted.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MotionSpec {
    pub start_scale: f64,
    pub end_scale: f64,
    pub start_x: f64,
    pub end_x: f64,
    pub start_y: f64,
    pub end_y: f64,
}

impl Default for MotionSpec {
    fn default() -> Self {
        Self {
            start_scale: 1.0,
            end_scale: 1.3,
            start_x: 0.5,
            end_x: 0.5,
            start_y: 0.5,
            end_y: 0.5,
        }
    }
}

/// Camera parameters at one point along a [`MotionSpec`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraState {
    pub scale: f64,
    pub cx: f64,
    pub cy: f64,
}

impl MotionSpec {
    /// Camera state at already-eased `progress` in `[0, 1]`.
    pub fn evaluate(&self, progress: f64) -> CameraState {
        CameraState {
            scale: lerp(self.start_scale, self.end_scale, progress),
            cx: lerp(self.start_x, self.end_x, progress),
            cy: lerp(self.start_y, self.end_y, progress),
        }
    }

    pub fn start(&self) -> CameraState {
        self.evaluate(0.0)
    }

    pub fn end(&self) -> CameraState {
        self.evaluate(1.0)
    }

    /// Check field ranges independent of any image.
    pub fn validate(&self) -> KenBurnsResult<()> {
        let fields = [
            ("start_scale", self.start_scale),
            ("end_scale", self.end_scale),
            ("start_x", self.start_x),
            ("end_x", self.end_x),
            ("start_y", self.start_y),
            ("end_y", self.end_y),
        ];
        for (name, v) in fields {
            if !v.is_finite() {
                return Err(KenBurnsError::invalid_input(format!(
                    "motion.{name} must be finite, got {v}"
                )));
            }
        }
        for (name, v) in &fields[..2] {
            if *v < 1.0 {
                return Err(KenBurnsError::invalid_input(format!(
                    "motion.{name} must be >= 1.0 (up-scaling is not supported), got {v}"
                )));
            }
        }
        for (name, v) in &fields[2..] {
            if !(0.0..=1.0).contains(v) {
                return Err(KenBurnsError::invalid_input(format!(
                    "motion.{name} must be within [0, 1], got {v}"
                )));
            }
        }
        Ok(())
    }

    /// Validate fields and make sure every crop window along the trajectory is at least 1×1 on
    /// `canvas`.
    ///
    /// Scale is linear in progress, so the extremes are the endpoints.
    pub fn validate_for(&self, canvas: Canvas) -> KenBurnsResult<()> {
        self.validate()?;
        let max_scale = self.start_scale.max(self.end_scale);
        let limit = f64::from(canvas.width.min(canvas.height));
        if max_scale > limit {
            return Err(KenBurnsError::degenerate_geometry(format!(
                "scale {max_scale} on a {}x{} image leaves a crop window under 1x1 px (max scale {limit})",
                canvas.width, canvas.height
            )));
        }
        Ok(())
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluate_hits_endpoints() {
        let m = MotionSpec {
            start_scale: 1.0,
            end_scale: 2.0,
            start_x: 0.2,
            end_x: 0.8,
            start_y: 0.1,
            end_y: 0.9,
        };
        assert_eq!(
            m.start(),
            CameraState {
                scale: 1.0,
                cx: 0.2,
                cy: 0.1
            }
        );
        assert_eq!(
            m.end(),
            CameraState {
                scale: 2.0,
                cx: 0.8,
                cy: 0.9
            }
        );
        let mid = m.evaluate(0.5);
        assert!((mid.scale - 1.5).abs() < 1e-12);
        assert!((mid.cx - 0.5).abs() < 1e-12);
    }

    #[test]
    fn partial_json_uses_defaults() {
        let m: MotionSpec = serde_json::from_str(r#"{"end_scale": 1.8, "end_x": 0.1}"#).unwrap();
        assert_eq!(m.start_scale, 1.0);
        assert_eq!(m.end_scale, 1.8);
        assert_eq!(m.end_x, 0.1);
        assert_eq!(m.start_y, 0.5);
    }

    #[test]
    fn validate_rejects_bad_fields() {
        let ok = MotionSpec::default();
        ok.validate().unwrap();

        let upscale = MotionSpec {
            start_scale: 0.9,
            ..ok
        };
        assert!(matches!(
            upscale.validate(),
            Err(KenBurnsError::InvalidInput(_))
        ));

        let off_image = MotionSpec { end_x: 1.2, ..ok };
        assert!(off_image.validate().is_err());

        let nan = MotionSpec {
            start_y: f64::NAN,
            ..ok
        };
        assert!(nan.validate().is_err());
    }

    #[test]
    fn validate_for_rejects_sub_pixel_windows() {
        let canvas = Canvas {
            width: 8,
            height: 4,
        };
        let fine = MotionSpec {
            end_scale: 4.0,
            ..MotionSpec::default()
        };
        fine.validate_for(canvas).unwrap();

        let too_deep = MotionSpec {
            end_scale: 4.5,
            ..MotionSpec::default()
        };
        assert!(matches!(
            too_deep.validate_for(canvas),
            Err(KenBurnsError::DegenerateGeometry(_))
        ));
    }
}
