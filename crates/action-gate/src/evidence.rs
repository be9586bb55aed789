//! Signal evaluation over a raw observation. Pure; no page access.

use chrono::Utc;

use crate::conditions::{ExpectSpec, UrlMatcher};
use crate::types::{Observation, PageObservation, SignalSnapshot};

pub fn evaluate(spec: &ExpectSpec, destination: &UrlMatcher, page: &PageObservation) -> SignalSnapshot {
    let compose_cleared = match &page.compose_text {
        None => true,
        Some(text) => text.trim().chars().count() <= spec.cleared_max_chars,
    };
    let no_residual = !page.regions.iter().any(|region| {
        region.rect.exceeds(spec.residual.min_width, spec.residual.min_height)
            && region.trimmed_len() > spec.residual.max_chars
    });
    SignalSnapshot {
        on_destination: destination.is_match(&page.url),
        compose_cleared,
        submit_gone: !page.submit_visible && !page.labelled_control_visible,
        no_residual,
    }
}

pub fn record(attempt: u32, page: &PageObservation, signals: SignalSnapshot) -> Observation {
    Observation {
        attempt,
        url: page.url.clone(),
        held: signals.held_count(),
        signals,
        observed_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conditions::UrlPattern;
    use action_primitives::{EditableRegion, Rect};

    fn spec() -> ExpectSpec {
        ExpectSpec::new(UrlPattern::Contains("/feed".into()))
    }

    fn settled_page() -> PageObservation {
        PageObservation {
            url: "https://www.linkedin.com/feed/".into(),
            compose_text: None,
            submit_visible: false,
            labelled_control_visible: false,
            regions: vec![EditableRegion {
                rect: Rect::new(0.0, 0.0, 500.0, 40.0),
                text: "Start a post".into(),
            }],
        }
    }

    fn signals(page: &PageObservation) -> SignalSnapshot {
        let spec = spec();
        let matcher = spec.destination.compile().unwrap();
        evaluate(&spec, &matcher, page)
    }

    #[test]
    fn all_four_hold_on_settled_page() {
        assert!(signals(&settled_page()).all_hold());
    }

    #[test]
    fn each_single_failure_invalidates_observation() {
        let mut off_page = settled_page();
        off_page.url = "https://www.linkedin.com/login".into();

        let mut still_composed = settled_page();
        still_composed.compose_text = Some("Spring launch is live".into());

        let mut button_left = settled_page();
        button_left.labelled_control_visible = true;

        let mut residual = settled_page();
        residual.regions.push(EditableRegion {
            rect: Rect::new(0.0, 0.0, 600.0, 200.0),
            text: "x".repeat(51),
        });

        for page in [off_page, still_composed, button_left, residual] {
            let snapshot = signals(&page);
            assert_eq!(snapshot.held_count(), 3, "{page:?}");
            assert!(!snapshot.all_hold());
        }
    }

    #[test]
    fn short_leftovers_count_as_cleared() {
        let mut page = settled_page();
        page.compose_text = Some("  \u{200b} ".into());
        page.regions[0].text = "y".repeat(50);
        let snapshot = signals(&page);
        assert!(snapshot.compose_cleared);
        assert!(snapshot.no_residual);
    }
}
