//! Named, pre-tuned camera trajectories.

use crate::motion::spec::MotionSpec;

/// Name used when no preset is requested or the requested one is unknown.
pub const DEFAULT_PRESET: &str = "zoom_in";

/// A named motion with a short human description.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct Preset {
    pub name: &'static str,
    pub description: &'static str,
    pub motion: MotionSpec,
}

const fn motion(
    start_scale: f64,
    end_scale: f64,
    start_x: f64,
    end_x: f64,
    start_y: f64,
    end_y: f64,
) -> MotionSpec {
    MotionSpec {
        start_scale,
        end_scale,
        start_x,
        end_x,
        start_y,
        end_y,
    }
}

static PRESETS: [Preset; 12] = [
    Preset {
        name: "zoom_in",
        description: "Slowly zoom into center",
        motion: motion(1.0, 1.3, 0.5, 0.5, 0.5, 0.5),
    },
    Preset {
        name: "zoom_out",
        description: "Slowly zoom out from center",
        motion: motion(1.3, 1.0, 0.5, 0.5, 0.5, 0.5),
    },
    Preset {
        name: "pan_left",
        description: "Pan from right to left",
        motion: motion(1.2, 1.2, 0.7, 0.3, 0.5, 0.5),
    },
    Preset {
        name: "pan_right",
        description: "Pan from left to right",
        motion: motion(1.2, 1.2, 0.3, 0.7, 0.5, 0.5),
    },
    Preset {
        name: "pan_up",
        description: "Pan from bottom to top",
        motion: motion(1.2, 1.2, 0.5, 0.5, 0.7, 0.3),
    },
    Preset {
        name: "pan_down",
        description: "Pan from top to bottom",
        motion: motion(1.2, 1.2, 0.5, 0.5, 0.3, 0.7),
    },
    Preset {
        name: "zoom_pan_tl",
        description: "Zoom into top-left corner",
        motion: motion(1.0, 1.4, 0.5, 0.3, 0.5, 0.3),
    },
    Preset {
        name: "zoom_pan_tr",
        description: "Zoom into top-right corner",
        motion: motion(1.0, 1.4, 0.5, 0.7, 0.5, 0.3),
    },
    Preset {
        name: "zoom_pan_bl",
        description: "Zoom into bottom-left corner",
        motion: motion(1.0, 1.4, 0.5, 0.3, 0.5, 0.7),
    },
    Preset {
        name: "zoom_pan_br",
        description: "Zoom into bottom-right corner",
        motion: motion(1.0, 1.4, 0.5, 0.7, 0.5, 0.7),
    },
    Preset {
        name: "dramatic_zoom",
        description: "Dramatic 2x zoom in",
        motion: motion(1.0, 2.0, 0.5, 0.5, 0.5, 0.5),
    },
    Preset {
        name: "slow_drift",
        description: "Subtle slow drift effect",
        motion: motion(1.1, 1.15, 0.45, 0.55, 0.48, 0.52),
    },
];

/// All presets in catalog order.
pub fn all() -> &'static [Preset] {
    &PRESETS
}

/// Exact-name lookup.
pub fn get(name: &str) -> Option<&'static Preset> {
    PRESETS.iter().find(|p| p.name == name)
}

/// Motion for `name`, falling back to [`DEFAULT_PRESET`] for unknown names.
pub fn lookup(name: &str) -> MotionSpec {
    get(name).unwrap_or(&PRESETS[0]).motion
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_names_are_unique() {
        let mut names: Vec<_> = all().iter().map(|p| p.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), all().len());
    }

    #[test]
    fn every_preset_validates() {
        for p in all() {
            p.motion.validate().unwrap();
            assert!(!p.description.is_empty());
        }
    }

    #[test]
    fn unknown_name_falls_back_to_zoom_in() {
        assert_eq!(lookup("does_not_exist"), lookup(DEFAULT_PRESET));
        assert_eq!(get(DEFAULT_PRESET).unwrap().name, PRESETS[0].name);
        assert!(get("does_not_exist").is_none());
    }

    #[test]
    fn known_values() {
        let zoom_in = lookup("zoom_in");
        assert_eq!((zoom_in.start_scale, zoom_in.end_scale), (1.0, 1.3));
        let dramatic = lookup("dramatic_zoom");
        assert_eq!(dramatic.end_scale, 2.0);
        let pan_left = lookup("pan_left");
        assert!(pan_left.start_x > pan_left.end_x);
    }
}
