/// A known restriction on pairing a detector family with a descriptor family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// The descriptor needs the named detector's own keypoint metadata
    /// (orientation, scale) and works with no other detector.
    OnlyWith {
        descriptor: &'static str,
        detector: &'static str,
    },
    /// The detector's keypoints violate a requirement of the descriptor.
    Never {
        descriptor: &'static str,
        detector: &'static str,
    },
}

impl Rule {
    /// `None` if the rule does not mention the descriptor (or, for `Never`,
    /// the pair). Otherwise whether the rule allows the pairing: an `OnlyWith`
    /// rule answers `Some(true)` for its own detector and `Some(false)` for
    /// any other, a `Never` rule always answers `Some(false)`.
    fn verdict(&self, detector_id: &str, descriptor_id: &str) -> Option<bool> {
        match *self {
            Rule::OnlyWith {
                descriptor,
                detector,
            } if descriptor == descriptor_id => Some(detector == detector_id),
            Rule::Never {
                descriptor,
                detector,
            } if descriptor == descriptor_id && detector == detector_id => Some(false),
            _ => None,
        }
    }
}

pub const RULES: &[Rule] = &[
    Rule::OnlyWith {
        descriptor: "AKAZE",
        detector: "AKAZE",
    },
    // SIFT keypoints are too small-scale for the ORB patch.
    Rule::Never {
        descriptor: "ORB",
        detector: "SIFT",
    },
];

pub fn is_compatible(detector_id: &str, descriptor_id: &str) -> bool {
    is_compatible_with(RULES, detector_id, descriptor_id)
}

/// Same as [`is_compatible`] against a caller supplied rule table.
pub fn is_compatible_with(rules: &[Rule], detector_id: &str, descriptor_id: &str) -> bool {
    rules
        .iter()
        .filter_map(|r| r.verdict(detector_id, descriptor_id))
        .all(|ok| ok)
}
