use crate::report::types::Priority;

/// Changes larger than this are always High.
pub const HIGH_CHANGE_THRESHOLD: usize = 200;
/// Changes smaller than this are Low unless a label escalates them.
pub const LOW_CHANGE_THRESHOLD: usize = 50;
/// Labels (case-insensitive) that escalate a change to High.
pub const ESCALATION_LABELS: &[&str] = &["critical", "urgent", "hotfix"];

/// Derive the testing priority from change size and labels.
///
/// Size is checked first, then label escalation, then the low-size band.
pub fn classify<S: AsRef<str>>(lines_changed: usize, labels: &[S]) -> Priority {
    if lines_changed > HIGH_CHANGE_THRESHOLD {
        return Priority::High;
    }

    let escalated = labels.iter().any(|label| {
        ESCALATION_LABELS
            .iter()
            .any(|e| label.as_ref().eq_ignore_ascii_case(e))
    });
    if escalated {
        Priority::High
    } else if lines_changed < LOW_CHANGE_THRESHOLD {
        Priority::Low
    } else {
        Priority::Medium
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_LABELS: &[&str] = &[];

    #[test]
    fn test_large_change_is_high_regardless_of_labels() {
        assert_eq!(classify(201, NO_LABELS), Priority::High);
        assert_eq!(classify(5000, &["docs", "chore"]), Priority::High);
    }

    #[test]
    fn test_small_change_is_low() {
        assert_eq!(classify(0, NO_LABELS), Priority::Low);
        assert_eq!(classify(49, &["enhancement"]), Priority::Low);
    }

    #[test]
    fn test_middle_band_is_medium() {
        assert_eq!(classify(50, NO_LABELS), Priority::Medium);
        assert_eq!(classify(200, NO_LABELS), Priority::Medium);
    }

    #[test]
    fn test_escalation_labels_case_insensitive() {
        assert_eq!(classify(120, &["HotFix"]), Priority::High);
        assert_eq!(classify(3, &["URGENT"]), Priority::High);
        assert_eq!(classify(120, &["critical-path"]), Priority::Medium);
    }

    #[test]
    fn test_owned_label_strings() {
        let labels = vec!["Critical".to_string()];
        assert_eq!(classify(60, &labels), Priority::High);
    }
}
